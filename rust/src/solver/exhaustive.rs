//! Brute-force ground state search for tiny models.

use crate::config::SolverConfig;
use crate::log_debug;
use crate::qubo::QuboModel;

use super::{validate, Deadline, SampleSet, Sampler, SolverError};

/// Upper bound on variables the exhaustive sampler accepts (2^24 states).
pub const MAX_EXHAUSTIVE_VARIABLES: usize = 24;

const DEADLINE_CHECK_INTERVAL: u64 = 1 << 12;

/// Visits every assignment in Gray-code order, flipping one bit per step.
///
/// Returns a single sample: the first minimum-energy assignment visited.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExhaustiveSampler;

impl Sampler for ExhaustiveSampler {
    fn name(&self) -> &'static str {
        "exhaustive"
    }

    fn sample(&self, model: &QuboModel, config: &SolverConfig) -> Result<SampleSet, SolverError> {
        validate(config)?;
        let n = model.num_variables();
        if n > MAX_EXHAUSTIVE_VARIABLES {
            return Err(SolverError::TooLarge {
                variables: n,
                max: MAX_EXHAUSTIVE_VARIABLES,
            });
        }

        let adjacency = model.adjacency();
        let deadline = Deadline::start(config.timeout_ms);

        let mut bits = vec![0u8; n];
        let mut fields = adjacency.linear.clone();
        let mut energy = model.offset();
        let mut best_bits = bits.clone();
        let mut best_energy = energy;

        for step in 1u64..(1u64 << n) {
            if step % DEADLINE_CHECK_INTERVAL == 0 {
                deadline.check()?;
            }
            let i = step.trailing_zeros() as usize;
            let delta = if bits[i] == 0 { fields[i] } else { -fields[i] };
            bits[i] ^= 1;
            energy += delta;
            let sign = if bits[i] == 1 { 1.0 } else { -1.0 };
            for &(j, value) in &adjacency.neighbors[i] {
                fields[j] += sign * value;
            }
            // Running sums drift; only a clear improvement replaces the incumbent.
            if energy < best_energy - 1e-9 {
                best_energy = energy;
                best_bits.copy_from_slice(&bits);
            }
        }

        let exact = model.energy(&best_bits);
        log_debug!(
            config.verbosity,
            "exhaustive search over {} variables: ground energy {}",
            n,
            exact
        );
        Ok(SampleSet::from_reads([(best_bits, exact)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::SimulatedAnnealingSampler;

    fn frustrated_model() -> QuboModel {
        let mut model = QuboModel::new(5);
        let linear = [-1.0, 2.0, -3.0, 0.5, -0.5];
        for (a, value) in linear.iter().enumerate() {
            model.add_linear(a as u32, *value);
        }
        model.add_quadratic(0, 1, -2.0);
        model.add_quadratic(1, 2, 1.5);
        model.add_quadratic(2, 3, -1.0);
        model.add_quadratic(3, 4, 2.0);
        model.add_quadratic(0, 4, 1.0);
        model
    }

    fn brute_force_minimum(model: &QuboModel) -> f64 {
        let n = model.num_variables();
        (0u32..(1 << n))
            .map(|mask| {
                let bits: Vec<u8> = (0..n).map(|i| ((mask >> i) & 1) as u8).collect();
                model.energy(&bits)
            })
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn test_finds_global_minimum() {
        let model = frustrated_model();
        let set = ExhaustiveSampler.sample(&model, &SolverConfig::default()).unwrap();
        assert_eq!(set.len(), 1);
        let best = set.into_lowest().unwrap();
        assert_eq!(best.energy, brute_force_minimum(&model));
        assert_eq!(best.energy, model.energy(&best.bits));
    }

    #[test]
    fn test_agrees_with_annealing() {
        let model = frustrated_model();
        let exact = ExhaustiveSampler
            .sample(&model, &SolverConfig::default())
            .unwrap()
            .into_lowest()
            .unwrap();
        let config = SolverConfig {
            num_reads: 20,
            num_sweeps: 500,
            seed: Some(11),
            ..Default::default()
        };
        let annealed = SimulatedAnnealingSampler
            .sample(&model, &config)
            .unwrap()
            .into_lowest()
            .unwrap();
        assert!((exact.energy - annealed.energy).abs() < 1e-9);
    }

    #[test]
    fn test_offset_only_model() {
        let mut model = QuboModel::new(0);
        model.add_offset(2.5);
        let best = ExhaustiveSampler
            .sample(&model, &SolverConfig::default())
            .unwrap()
            .into_lowest()
            .unwrap();
        assert!(best.bits.is_empty());
        assert_eq!(best.energy, 2.5);
    }

    #[test]
    fn test_rejects_large_models() {
        let model = QuboModel::new(MAX_EXHAUSTIVE_VARIABLES + 1);
        assert_eq!(
            ExhaustiveSampler.sample(&model, &SolverConfig::default()),
            Err(SolverError::TooLarge {
                variables: MAX_EXHAUSTIVE_VARIABLES + 1,
                max: MAX_EXHAUSTIVE_VARIABLES
            })
        );
    }
}
