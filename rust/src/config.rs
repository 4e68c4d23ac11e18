//! Configuration types for QUBO construction and sampling.

use chrono::NaiveDateTime;
use pyo3::prelude::*;

/// Problem shape and objective/penalty weights.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct ProblemConfig {
    /// Number of time slots on every timeline.
    #[pyo3(get, set)]
    pub num_slots: u32,
    /// Persons with their own timeline. Empty means a single shared timeline.
    #[pyo3(get, set)]
    pub persons: Vec<String>,
    /// Cost of placing two tasks of different categories back to back.
    #[pyo3(get, set)]
    pub switch_cost: f64,
    /// Per category pair costs `(a, b, cost)`; order of `a` and `b` is ignored.
    #[pyo3(get, set)]
    pub switch_cost_overrides: Vec<(String, String, f64)>,
    /// Fixed penalty weight. `None` derives one from the objective.
    #[pyo3(get, set)]
    pub penalty_weight: Option<f64>,
    /// Wall-clock start of slot 0, for displaying times.
    #[pyo3(get, set)]
    pub horizon_start: Option<NaiveDateTime>,
    #[pyo3(get, set)]
    pub slot_minutes: u32,
}

impl Default for ProblemConfig {
    fn default() -> Self {
        Self {
            num_slots: 5,
            persons: Vec::new(),
            switch_cost: 1.0,
            switch_cost_overrides: Vec::new(),
            penalty_weight: None,
            horizon_start: None,
            slot_minutes: 60,
        }
    }
}

#[pymethods]
impl ProblemConfig {
    #[new]
    #[pyo3(signature = (
        num_slots=None,
        persons=None,
        switch_cost=None,
        switch_cost_overrides=None,
        penalty_weight=None,
        horizon_start=None,
        slot_minutes=None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        num_slots: Option<u32>,
        persons: Option<Vec<String>>,
        switch_cost: Option<f64>,
        switch_cost_overrides: Option<Vec<(String, String, f64)>>,
        penalty_weight: Option<f64>,
        horizon_start: Option<NaiveDateTime>,
        slot_minutes: Option<u32>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            num_slots: num_slots.unwrap_or(defaults.num_slots),
            persons: persons.unwrap_or(defaults.persons),
            switch_cost: switch_cost.unwrap_or(defaults.switch_cost),
            switch_cost_overrides: switch_cost_overrides
                .unwrap_or(defaults.switch_cost_overrides),
            penalty_weight,
            horizon_start,
            slot_minutes: slot_minutes.unwrap_or(defaults.slot_minutes),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "ProblemConfig(num_slots={}, persons={:?}, switch_cost={}, penalty_weight={:?})",
            self.num_slots, self.persons, self.switch_cost, self.penalty_weight
        )
    }
}

/// Sampler run budget and selection.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct SolverConfig {
    /// Independent annealing trials.
    #[pyo3(get, set)]
    pub num_reads: u32,
    /// Full variable sweeps per read.
    #[pyo3(get, set)]
    pub num_sweeps: u32,
    /// RNG seed; `None` draws a fresh one per call.
    #[pyo3(get, set)]
    pub seed: Option<u64>,
    /// Inverse temperature `(hot, cold)`; `None` derives it from the model.
    #[pyo3(get, set)]
    pub beta_range: Option<(f64, f64)>,
    /// Wall-clock budget for the whole sampling call.
    #[pyo3(get, set)]
    pub timeout_ms: Option<u64>,
    /// Run reads on the rayon thread pool.
    #[pyo3(get, set)]
    pub parallel: bool,
    /// Models with at most this many variables are solved exhaustively (0 disables).
    #[pyo3(get, set)]
    pub exhaustive_threshold: u32,
    /// Verbosity level: 0=silent, 1=summary, 2=reads, 3=debug.
    #[pyo3(get, set)]
    pub verbosity: u8,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            num_reads: 100,
            num_sweeps: 1000,
            seed: None,
            beta_range: None,
            timeout_ms: None,
            parallel: true,
            exhaustive_threshold: 16,
            verbosity: 0,
        }
    }
}

#[pymethods]
impl SolverConfig {
    #[new]
    #[pyo3(signature = (
        num_reads=None,
        num_sweeps=None,
        seed=None,
        beta_range=None,
        timeout_ms=None,
        parallel=None,
        exhaustive_threshold=None,
        verbosity=None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        num_reads: Option<u32>,
        num_sweeps: Option<u32>,
        seed: Option<u64>,
        beta_range: Option<(f64, f64)>,
        timeout_ms: Option<u64>,
        parallel: Option<bool>,
        exhaustive_threshold: Option<u32>,
        verbosity: Option<u8>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            num_reads: num_reads.unwrap_or(defaults.num_reads),
            num_sweeps: num_sweeps.unwrap_or(defaults.num_sweeps),
            seed,
            beta_range,
            timeout_ms,
            parallel: parallel.unwrap_or(defaults.parallel),
            exhaustive_threshold: exhaustive_threshold.unwrap_or(defaults.exhaustive_threshold),
            verbosity: verbosity.unwrap_or(defaults.verbosity),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "SolverConfig(num_reads={}, num_sweeps={}, seed={:?}, timeout_ms={:?})",
            self.num_reads, self.num_sweeps, self.seed, self.timeout_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_config_defaults() {
        let config = ProblemConfig::default();
        assert!(config.persons.is_empty());
        assert_eq!(config.penalty_weight, None);

        let config = ProblemConfig::new(Some(8), None, None, None, None, None, Some(30));
        assert_eq!(config.num_slots, 8);
        assert_eq!(config.slot_minutes, 30);
        assert_eq!(config.switch_cost, ProblemConfig::default().switch_cost);
        assert!(config.persons.is_empty());
    }

    #[test]
    fn test_constructor_keeps_defaults_for_missing_values() {
        let config =
            SolverConfig::new(Some(7), None, Some(42), None, None, Some(false), None, None);
        assert_eq!(config.num_reads, 7);
        assert_eq!(config.num_sweeps, SolverConfig::default().num_sweeps);
        assert_eq!(config.seed, Some(42));
        assert!(!config.parallel);
    }
}
