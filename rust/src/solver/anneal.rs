//! Simulated annealing with single-flip Metropolis sweeps.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::config::SolverConfig;
use crate::qubo::{Adjacency, QuboModel};
use crate::{log_debug, log_reads};

use super::{validate, Deadline, SampleSet, Sampler, SolverError};

/// Independent annealing reads, optionally run in parallel.
///
/// Read `r` draws from ChaCha stream `r` of the configured seed, so a fixed
/// seed reproduces the same sample set regardless of thread scheduling.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedAnnealingSampler;

/// Inverse temperatures `(hot, cold)` scaled to the model.
///
/// Hot: the largest possible flip is accepted with probability 1/2.
/// Cold: the smallest nonzero coefficient is accepted with probability 1/100.
pub fn default_beta_range(adjacency: &Adjacency) -> (f64, f64) {
    let max_flip = adjacency.max_flip_magnitude();
    let Some(min_coef) = adjacency.min_coefficient_magnitude() else {
        return (0.1, 1.0);
    };
    let hot = std::f64::consts::LN_2 / max_flip;
    let cold = 100f64.ln() / min_coef;
    (hot, cold.max(hot))
}

/// Geometric interpolation from `hot` to `cold` over `sweeps` steps.
pub fn geometric_betas(hot: f64, cold: f64, sweeps: u32) -> Vec<f64> {
    match sweeps {
        0 => Vec::new(),
        1 => vec![cold],
        _ => {
            let ratio = cold / hot;
            let last = f64::from(sweeps - 1);
            (0..sweeps)
                .map(|k| hot * ratio.powf(f64::from(k) / last))
                .collect()
        }
    }
}

fn anneal_read(
    model: &QuboModel,
    adjacency: &Adjacency,
    betas: &[f64],
    seed: u64,
    read: u32,
    deadline: &Deadline,
) -> Result<(Vec<u8>, f64), SolverError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(u64::from(read));

    let n = adjacency.len();
    let mut bits: Vec<u8> = (0..n).map(|_| u8::from(rng.gen_bool(0.5))).collect();
    let mut fields = adjacency.local_fields(&bits);

    for &beta in betas {
        deadline.check()?;
        for i in 0..n {
            let delta = if bits[i] == 0 { fields[i] } else { -fields[i] };
            let accept = delta <= 0.0 || rng.gen::<f64>() < (-beta * delta).exp();
            if !accept {
                continue;
            }
            bits[i] ^= 1;
            let sign = if bits[i] == 1 { 1.0 } else { -1.0 };
            for &(j, value) in &adjacency.neighbors[i] {
                fields[j] += sign * value;
            }
        }
    }
    // The last sweep may itself overrun the budget.
    deadline.check()?;

    let energy = model.energy(&bits);
    Ok((bits, energy))
}

impl Sampler for SimulatedAnnealingSampler {
    fn name(&self) -> &'static str {
        "simulated-annealing"
    }

    fn sample(&self, model: &QuboModel, config: &SolverConfig) -> Result<SampleSet, SolverError> {
        validate(config)?;
        let adjacency = model.adjacency();
        let (hot, cold) = config
            .beta_range
            .unwrap_or_else(|| default_beta_range(&adjacency));
        let betas = geometric_betas(hot, cold, config.num_sweeps);
        let seed = config.seed.unwrap_or_else(rand::random);
        log_debug!(
            config.verbosity,
            "annealing {} variables: beta {} -> {}, {} sweeps, seed {}",
            adjacency.len(),
            hot,
            cold,
            betas.len(),
            seed
        );

        let deadline = Deadline::start(config.timeout_ms);
        let run = |read: u32| {
            let result = anneal_read(model, &adjacency, &betas, seed, read, &deadline);
            if let Ok((_, energy)) = &result {
                log_reads!(config.verbosity, "read {} finished at energy {}", read, energy);
            }
            result
        };

        let reads: Vec<(Vec<u8>, f64)> = if config.parallel {
            (0..config.num_reads)
                .into_par_iter()
                .map(run)
                .collect::<Result<_, _>>()?
        } else {
            (0..config.num_reads).map(run).collect::<Result<_, _>>()?
        };

        Ok(SampleSet::from_reads(reads))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two-variable one-hot with a preference for variable 1.
    fn one_hot_model() -> QuboModel {
        let mut model = QuboModel::new(2);
        model.add_offset(4.0);
        model.add_linear(0, -4.0);
        model.add_linear(1, -4.5);
        model.add_quadratic(0, 1, 8.0);
        model
    }

    fn config(seed: u64) -> SolverConfig {
        SolverConfig {
            num_reads: 16,
            num_sweeps: 200,
            seed: Some(seed),
            ..Default::default()
        }
    }

    #[test]
    fn test_geometric_betas() {
        assert!(geometric_betas(0.1, 1.0, 0).is_empty());
        assert_eq!(geometric_betas(0.1, 1.0, 1), vec![1.0]);

        let betas = geometric_betas(0.1, 10.0, 3);
        assert_eq!(betas.len(), 3);
        assert!((betas[0] - 0.1).abs() < 1e-12);
        assert!((betas[1] - 1.0).abs() < 1e-12);
        assert!((betas[2] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_default_beta_range_scales_with_model() {
        let adjacency = one_hot_model().adjacency();
        let (hot, cold) = default_beta_range(&adjacency);
        assert!(hot > 0.0 && hot < cold);
        assert!((hot - std::f64::consts::LN_2 / 12.5).abs() < 1e-12);
        assert!((cold - 100f64.ln() / 4.0).abs() < 1e-12);

        assert_eq!(default_beta_range(&QuboModel::new(3).adjacency()), (0.1, 1.0));
    }

    #[test]
    fn test_finds_ground_state() {
        let best = SimulatedAnnealingSampler
            .sample(&one_hot_model(), &config(7))
            .unwrap()
            .into_lowest()
            .unwrap();
        assert_eq!(best.bits, vec![0, 1]);
        assert!((best.energy - -0.5).abs() < 1e-12);
    }

    #[test]
    fn test_same_seed_same_samples() {
        let model = one_hot_model();
        let a = SimulatedAnnealingSampler.sample(&model, &config(42)).unwrap();
        let b = SimulatedAnnealingSampler.sample(&model, &config(42)).unwrap();
        assert_eq!(a, b);

        let sequential = SolverConfig {
            parallel: false,
            ..config(42)
        };
        let c = SimulatedAnnealingSampler.sample(&model, &sequential).unwrap();
        assert_eq!(a, c);
        assert_eq!(a.num_reads(), 16);
    }

    #[test]
    fn test_energy_matches_model() {
        let model = one_hot_model();
        let set = SimulatedAnnealingSampler.sample(&model, &config(3)).unwrap();
        for sample in set.iter() {
            assert_eq!(sample.energy, model.energy(&sample.bits));
        }
    }

    #[test]
    fn test_overrun_after_last_sweep_is_timeout() {
        let model = one_hot_model();
        let adjacency = model.adjacency();
        let deadline = Deadline::start(Some(0));
        std::thread::sleep(std::time::Duration::from_millis(2));

        // No sweeps left to check the deadline.
        let result = anneal_read(&model, &adjacency, &[], 1, 0, &deadline);
        assert!(matches!(result, Err(SolverError::Timeout { budget_ms: 0, .. })));

        let unbounded = Deadline::start(None);
        assert!(anneal_read(&model, &adjacency, &[1.0], 1, 0, &unbounded).is_ok());
    }

    #[test]
    fn test_timeout_abandons_reads() {
        // Large enough that the budget runs out long before the reads finish.
        let n = 400;
        let mut model = QuboModel::new(n);
        for a in 0..n as u32 {
            model.add_linear(a, -1.0);
            for b in (a + 1)..n as u32 {
                model.add_quadratic(a, b, 0.5);
            }
        }
        let config = SolverConfig {
            num_reads: 64,
            num_sweeps: 100_000,
            seed: Some(1),
            timeout_ms: Some(20),
            ..Default::default()
        };
        let result = SimulatedAnnealingSampler.sample(&model, &config);
        assert!(matches!(result, Err(SolverError::Timeout { budget_ms: 20, .. })));
    }
}
