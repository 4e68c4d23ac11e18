//! Crate-level error taxonomy surfaced to callers.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::decode::Violation;
use crate::qubo::BuildError;
use crate::solver::SolverError;

fn describe(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur while producing a schedule.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// Malformed, empty, or impossible-by-construction input. Not retryable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// More task-units than slot capacity; detected before solving.
    #[error(
        "Infeasible problem: tasks need {required} slot-units but only {capacity} are available"
    )]
    InfeasibleProblem { required: u64, capacity: u64 },
    /// Sampling ran past its budget. Retry with fewer reads or sweeps.
    #[error("Solver timed out: {elapsed_ms} ms elapsed, budget {budget_ms} ms")]
    SolverTimeout { budget_ms: u64, elapsed_ms: u64 },
    /// The best sample is infeasible. Raise the penalty weight or drop tasks.
    #[error(
        "Best sample violates constraints (energy {energy}, penalty weight {penalty_weight}): {}",
        describe(.violations)
    )]
    ConstraintViolation {
        violations: Vec<Violation>,
        energy: f64,
        penalty_weight: f64,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<CatalogError> for ScheduleError {
    fn from(err: CatalogError) -> Self {
        ScheduleError::InvalidInput(err.to_string())
    }
}

impl From<BuildError> for ScheduleError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::InvalidInput(message) => ScheduleError::InvalidInput(message),
            BuildError::InfeasibleProblem { required, capacity } => {
                ScheduleError::InfeasibleProblem { required, capacity }
            }
        }
    }
}

impl From<SolverError> for ScheduleError {
    fn from(err: SolverError) -> Self {
        match err {
            SolverError::Timeout {
                budget_ms,
                elapsed_ms,
            } => ScheduleError::SolverTimeout {
                budget_ms,
                elapsed_ms,
            },
            other => ScheduleError::InvalidConfig(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_errors_convert() {
        let err: ScheduleError = BuildError::InfeasibleProblem {
            required: 4,
            capacity: 3,
        }
        .into();
        assert_eq!(
            err,
            ScheduleError::InfeasibleProblem {
                required: 4,
                capacity: 3
            }
        );

        let err: ScheduleError = SolverError::Timeout {
            budget_ms: 10,
            elapsed_ms: 12,
        }
        .into();
        assert!(matches!(err, ScheduleError::SolverTimeout { budget_ms: 10, .. }));

        let err: ScheduleError = SolverError::TooLarge {
            variables: 30,
            max: 24,
        }
        .into();
        assert!(matches!(err, ScheduleError::InvalidConfig(_)));

        let err: ScheduleError = CatalogError::Empty.into();
        assert_eq!(err, ScheduleError::InvalidInput("task catalog is empty".to_string()));
    }

    #[test]
    fn test_constraint_violation_message() {
        let err = ScheduleError::ConstraintViolation {
            violations: vec![
                Violation::Unassigned {
                    task_id: "a".to_string(),
                },
                Violation::MultiplyAssigned {
                    task_id: "b".to_string(),
                    count: 2,
                },
            ],
            energy: 4.0,
            penalty_weight: 3.0,
        };
        assert_eq!(
            err.to_string(),
            "Best sample violates constraints (energy 4, penalty weight 3): \
             task \"a\" has no slot; task \"b\" assigned 2 times (excess 1)"
        );
    }
}
