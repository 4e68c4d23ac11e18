//! Context-switch-aware task scheduling over a QUBO model.
//!
//! A request flows through four stages:
//! 1. [`qubo::build_qubo`] turns a validated [`TaskCatalog`] into a penalized QUBO
//! 2. a [`solver::Sampler`] searches for low-energy bit assignments
//! 3. [`decode::decode`] maps the best assignment back to placements and checks
//!    every hard constraint
//! 4. [`assemble::assemble`] orders placements into a [`Schedule`]
//!
//! [`pipeline`] wires the stages together. The same API is exported to Python
//! as the `rust` extension module.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::exceptions::{PyRuntimeError, PyTimeoutError, PyValueError};
use pyo3::prelude::*;
use std::collections::HashMap;

pub mod assemble;
pub mod catalog;
mod config;
pub mod decode;
mod error;
pub mod interner;
pub mod logging;
mod models;
pub mod pipeline;
pub mod qubo;
pub mod solver;

pub use catalog::{parse_catalog, CatalogDocument, CatalogError, TaskCatalog};
pub use config::{ProblemConfig, SolverConfig};
pub use error::ScheduleError;
pub use models::{Schedule, ScheduleEntry, Task, SINGLE_TIMELINE};
pub use pipeline::{schedule_from_sample, solve_schedule, solve_schedule_with, solve_tasks};

fn to_py_err(err: ScheduleError) -> PyErr {
    match err {
        ScheduleError::InvalidInput(_)
        | ScheduleError::InfeasibleProblem { .. }
        | ScheduleError::InvalidConfig(_) => PyValueError::new_err(err.to_string()),
        ScheduleError::SolverTimeout { .. } => PyTimeoutError::new_err(err.to_string()),
        ScheduleError::ConstraintViolation { .. } => PyRuntimeError::new_err(err.to_string()),
    }
}

/// Parse the sectioned text catalog.
///
/// # Returns
/// * `(tasks, problem_config, solver_config)` with values from `[config]` and
///   `[people]` layered over the defaults
///
/// # Raises
/// * ValueError on the first malformed line
#[pyfunction]
#[pyo3(name = "parse_catalog")]
fn py_parse_catalog(text: &str) -> PyResult<(Vec<Task>, ProblemConfig, SolverConfig)> {
    let doc = parse_catalog(text).map_err(|e| to_py_err(e.into()))?;
    Ok((doc.tasks, doc.problem, doc.solver))
}

/// Build the QUBO model without solving it and report its shape.
///
/// # Returns
/// * Dict with `variables`, `interactions`, `penalty_weight`, `objective_mass`, `offset`
///
/// # Raises
/// * ValueError for invalid input or a structurally infeasible problem
#[pyfunction]
#[pyo3(signature = (tasks, problem_config=None))]
fn build_qubo_summary(
    tasks: Vec<Task>,
    problem_config: Option<ProblemConfig>,
) -> PyResult<HashMap<String, f64>> {
    let config = problem_config.unwrap_or_default();
    let catalog = TaskCatalog::new(tasks, &config.persons).map_err(|e| to_py_err(e.into()))?;
    let problem = qubo::build_qubo(&catalog, &config, logging::VERBOSITY_SILENT)
        .map_err(|e| to_py_err(e.into()))?;

    Ok(HashMap::from([
        ("variables".to_string(), problem.model.num_variables() as f64),
        ("interactions".to_string(), problem.model.num_interactions() as f64),
        ("penalty_weight".to_string(), problem.penalty_weight),
        ("objective_mass".to_string(), problem.objective_mass),
        ("offset".to_string(), problem.model.offset()),
    ]))
}

/// Build, sample, decode and validate in one call.
///
/// # Arguments
/// * `tasks` - Task records
/// * `problem_config` - Slots, persons, switch costs, penalty weight
/// * `solver_config` - Reads, sweeps, seed, timeout
///
/// # Returns
/// * A feasible Schedule ordered by slot
///
/// # Raises
/// * ValueError for invalid input or a structurally infeasible problem
/// * TimeoutError if sampling exceeds `solver_config.timeout_ms`
/// * RuntimeError if the best sample breaks a hard constraint
#[pyfunction]
#[pyo3(name = "solve_schedule", signature = (tasks, problem_config=None, solver_config=None))]
fn py_solve_schedule(
    py: Python<'_>,
    tasks: Vec<Task>,
    problem_config: Option<ProblemConfig>,
    solver_config: Option<SolverConfig>,
) -> PyResult<Schedule> {
    let problem_config = problem_config.unwrap_or_default();
    let solver_config = solver_config.unwrap_or_default();
    py.allow_threads(|| solve_tasks(tasks, &problem_config, &solver_config))
        .map_err(to_py_err)
}

/// The qa_sched.rust Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Core data types
    m.add_class::<Task>()?;
    m.add_class::<ScheduleEntry>()?;
    m.add_class::<Schedule>()?;

    // Config types
    m.add_class::<ProblemConfig>()?;
    m.add_class::<SolverConfig>()?;

    // Pipeline
    m.add_function(wrap_pyfunction!(py_parse_catalog, m)?)?;
    m.add_function(wrap_pyfunction!(build_qubo_summary, m)?)?;
    m.add_function(wrap_pyfunction!(py_solve_schedule, m)?)?;

    Ok(())
}

