//! Sampling strategies over a [`QuboModel`].
//!
//! Every strategy implements [`Sampler`]: take a model and a run budget, return
//! a population of samples. Callers only ever see the lowest-energy one via
//! [`solve`], so strategies can be swapped without touching the builder or the
//! decoder.

mod anneal;
mod exhaustive;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::config::SolverConfig;
use crate::qubo::QuboModel;
use crate::{log_reads, log_summary};

pub use anneal::{default_beta_range, geometric_betas, SimulatedAnnealingSampler};
pub use exhaustive::{ExhaustiveSampler, MAX_EXHAUSTIVE_VARIABLES};

/// Errors that can occur while sampling.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Solver exceeded its {budget_ms} ms budget after {elapsed_ms} ms")]
    Timeout { budget_ms: u64, elapsed_ms: u64 },
    #[error("Invalid solver configuration: {0}")]
    InvalidConfig(String),
    #[error("Model has {variables} variables; exhaustive search supports at most {max}")]
    TooLarge { variables: usize, max: usize },
}

/// One distinct bit assignment found by a sampler.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleResult {
    pub bits: Vec<u8>,
    pub energy: f64,
    /// Reads that ended in this exact assignment.
    pub num_occurrences: u32,
}

/// Deduplicated samples in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSet {
    samples: Vec<SampleResult>,
}

impl SampleSet {
    /// Collapse raw reads, counting repeats. Order of first appearance is kept.
    pub fn from_reads(reads: impl IntoIterator<Item = (Vec<u8>, f64)>) -> Self {
        let mut samples: Vec<SampleResult> = Vec::new();
        let mut position: FxHashMap<Vec<u8>, usize> = FxHashMap::default();
        for (bits, energy) in reads {
            if let Some(&at) = position.get(&bits) {
                samples[at].num_occurrences += 1;
                continue;
            }
            position.insert(bits.clone(), samples.len());
            samples.push(SampleResult {
                bits,
                energy,
                num_occurrences: 1,
            });
        }
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SampleResult> {
        self.samples.iter()
    }

    /// Total reads represented, duplicates included.
    pub fn num_reads(&self) -> u32 {
        self.samples.iter().map(|s| s.num_occurrences).sum()
    }

    /// Lowest energy sample; the earliest one wins ties.
    pub fn lowest(&self) -> Option<&SampleResult> {
        self.samples.iter().fold(None, |best: Option<&SampleResult>, s| match best {
            Some(b) if b.energy <= s.energy => Some(b),
            _ => Some(s),
        })
    }

    pub fn into_lowest(self) -> Option<SampleResult> {
        let index = self
            .samples
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, s)| match best {
                Some((_, e)) if e <= s.energy => best,
                _ => Some((i, s.energy)),
            })?
            .0;
        self.samples.into_iter().nth(index)
    }
}

/// A solving strategy.
pub trait Sampler: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run the configured budget against `model`.
    fn sample(&self, model: &QuboModel, config: &SolverConfig) -> Result<SampleSet, SolverError>;
}

/// Wall-clock budget shared by all reads of one sampling call.
///
/// The first read to notice the deadline has passed flags cancellation; every
/// other read sees the flag on its next check and stops.
#[derive(Debug)]
pub struct Deadline {
    started: Instant,
    budget: Option<Duration>,
    cancelled: AtomicBool,
}

impl Deadline {
    pub fn start(timeout_ms: Option<u64>) -> Self {
        Self {
            started: Instant::now(),
            budget: timeout_ms.map(Duration::from_millis),
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn check(&self) -> Result<(), SolverError> {
        let Some(budget) = self.budget else {
            return Ok(());
        };
        let elapsed = self.started.elapsed();
        if self.cancelled.load(Ordering::Relaxed) || elapsed > budget {
            self.cancelled.store(true, Ordering::Relaxed);
            return Err(SolverError::Timeout {
                budget_ms: budget.as_millis() as u64,
                elapsed_ms: elapsed.as_millis() as u64,
            });
        }
        Ok(())
    }
}

fn validate(config: &SolverConfig) -> Result<(), SolverError> {
    if config.num_reads == 0 {
        return Err(SolverError::InvalidConfig("num_reads must be positive".to_string()));
    }
    if config.num_sweeps == 0 {
        return Err(SolverError::InvalidConfig("num_sweeps must be positive".to_string()));
    }
    if let Some((hot, cold)) = config.beta_range {
        if !(hot.is_finite() && cold.is_finite() && hot > 0.0 && cold > 0.0) {
            return Err(SolverError::InvalidConfig(format!(
                "beta range must be positive and finite, got ({}, {})",
                hot, cold
            )));
        }
    }
    Ok(())
}

/// Pick a strategy for the model size.
pub fn sampler_for(model: &QuboModel, config: &SolverConfig) -> Box<dyn Sampler> {
    let n = model.num_variables();
    if n <= config.exhaustive_threshold as usize && n <= MAX_EXHAUSTIVE_VARIABLES {
        Box::new(ExhaustiveSampler)
    } else {
        Box::new(SimulatedAnnealingSampler)
    }
}

/// Run `sampler` and return the lowest-energy sample.
pub fn solve(
    model: &QuboModel,
    sampler: &dyn Sampler,
    config: &SolverConfig,
) -> Result<SampleResult, SolverError> {
    validate(config)?;
    let started = Instant::now();
    let set = sampler.sample(model, config)?;

    for (i, sample) in set.iter().enumerate() {
        log_reads!(
            config.verbosity,
            "sample {}: energy {} (x{})",
            i,
            sample.energy,
            sample.num_occurrences
        );
    }

    let distinct = set.len();
    let reads = set.num_reads();
    let best = set.into_lowest().ok_or_else(|| {
        SolverError::InvalidConfig(format!("{} returned no samples", sampler.name()))
    })?;
    log_summary!(
        config.verbosity,
        "{}: {} reads, {} distinct, best energy {} in {:?}",
        sampler.name(),
        reads,
        distinct,
        best.energy,
        started.elapsed()
    );
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSampler(Vec<(Vec<u8>, f64)>);

    impl Sampler for FixedSampler {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn sample(&self, _: &QuboModel, _: &SolverConfig) -> Result<SampleSet, SolverError> {
            Ok(SampleSet::from_reads(self.0.clone()))
        }
    }

    #[test]
    fn test_duplicates_counted_in_first_seen_order() {
        let set = SampleSet::from_reads(vec![
            (vec![1, 0], 2.0),
            (vec![0, 1], 1.0),
            (vec![1, 0], 2.0),
        ]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.num_reads(), 3);
        let first = set.iter().next().unwrap();
        assert_eq!(first.bits, vec![1, 0]);
        assert_eq!(first.num_occurrences, 2);
    }

    #[test]
    fn test_lowest_breaks_ties_by_first_seen() {
        let set = SampleSet::from_reads(vec![
            (vec![0, 0], 3.0),
            (vec![1, 0], 1.0),
            (vec![0, 1], 1.0),
        ]);
        assert_eq!(set.lowest().unwrap().bits, vec![1, 0]);
        assert_eq!(set.into_lowest().unwrap().bits, vec![1, 0]);
        assert_eq!(SampleSet::default().lowest(), None);
    }

    #[test]
    fn test_solve_returns_lowest() {
        let sampler = FixedSampler(vec![(vec![1], 5.0), (vec![0], -1.0)]);
        let best = solve(&QuboModel::new(1), &sampler, &SolverConfig::default()).unwrap();
        assert_eq!(best.bits, vec![0]);
        assert_eq!(best.energy, -1.0);
    }

    #[test]
    fn test_invalid_budget_rejected() {
        let sampler = FixedSampler(vec![(vec![0], 0.0)]);
        let config = SolverConfig {
            num_reads: 0,
            ..Default::default()
        };
        assert!(matches!(
            solve(&QuboModel::new(1), &sampler, &config),
            Err(SolverError::InvalidConfig(_))
        ));

        let config = SolverConfig {
            beta_range: Some((0.0, 1.0)),
            ..Default::default()
        };
        assert!(solve(&QuboModel::new(1), &sampler, &config).is_err());
    }

    #[test]
    fn test_empty_population_is_an_error() {
        let sampler = FixedSampler(vec![]);
        assert!(solve(&QuboModel::new(1), &sampler, &SolverConfig::default()).is_err());
    }

    #[test]
    fn test_sampler_selection_by_size() {
        let config = SolverConfig {
            exhaustive_threshold: 4,
            ..Default::default()
        };
        assert_eq!(sampler_for(&QuboModel::new(4), &config).name(), "exhaustive");
        assert_eq!(sampler_for(&QuboModel::new(5), &config).name(), "simulated-annealing");

        let config = SolverConfig {
            exhaustive_threshold: 0,
            ..Default::default()
        };
        assert_eq!(sampler_for(&QuboModel::new(1), &config).name(), "simulated-annealing");
    }

    #[test]
    fn test_deadline() {
        assert!(Deadline::start(None).check().is_ok());
        assert!(Deadline::start(Some(60_000)).check().is_ok());

        let expired = Deadline::start(Some(0));
        std::thread::sleep(Duration::from_millis(2));
        assert!(matches!(expired.check(), Err(SolverError::Timeout { budget_ms: 0, .. })));
        // Stays cancelled.
        assert!(expired.check().is_err());
    }
}
