//! One solve request end to end: build, sample, decode, validate, assemble.

use crate::assemble::assemble;
use crate::catalog::TaskCatalog;
use crate::config::{ProblemConfig, SolverConfig};
use crate::decode::decode;
use crate::error::ScheduleError;
use crate::log_summary;
use crate::models::{Schedule, Task};
use crate::qubo::{build_qubo, QuboProblem};
use crate::solver::{sampler_for, solve, SampleResult, Sampler};

/// Decode and validate a sample without failing on infeasibility.
///
/// The returned schedule carries `feasible == false` and the violations when a
/// constraint is broken.
pub fn schedule_from_sample(
    problem: &QuboProblem,
    catalog: &TaskCatalog,
    config: &ProblemConfig,
    sample: &SampleResult,
) -> Schedule {
    let decoded = decode(problem, catalog, sample);
    assemble(&decoded, catalog, config, sample.energy, problem.penalty_weight)
}

/// Solve with the sampler chosen for the model size.
pub fn solve_schedule(
    catalog: &TaskCatalog,
    problem_config: &ProblemConfig,
    solver_config: &SolverConfig,
) -> Result<Schedule, ScheduleError> {
    let problem = build_qubo(catalog, problem_config, solver_config.verbosity)?;
    let sampler = sampler_for(&problem.model, solver_config);
    run(&problem, catalog, problem_config, solver_config, sampler.as_ref())
}

/// Solve with an explicit sampler.
pub fn solve_schedule_with(
    catalog: &TaskCatalog,
    problem_config: &ProblemConfig,
    solver_config: &SolverConfig,
    sampler: &dyn Sampler,
) -> Result<Schedule, ScheduleError> {
    let problem = build_qubo(catalog, problem_config, solver_config.verbosity)?;
    run(&problem, catalog, problem_config, solver_config, sampler)
}

/// Validate raw task records against `problem_config.persons` and solve.
pub fn solve_tasks(
    tasks: Vec<Task>,
    problem_config: &ProblemConfig,
    solver_config: &SolverConfig,
) -> Result<Schedule, ScheduleError> {
    let catalog = TaskCatalog::new(tasks, &problem_config.persons)?;
    solve_schedule(&catalog, problem_config, solver_config)
}

fn run(
    problem: &QuboProblem,
    catalog: &TaskCatalog,
    problem_config: &ProblemConfig,
    solver_config: &SolverConfig,
    sampler: &dyn Sampler,
) -> Result<Schedule, ScheduleError> {
    let verbosity = solver_config.verbosity;
    let best = solve(&problem.model, sampler, solver_config)?;

    let decoded = decode(problem, catalog, &best);
    if !decoded.is_feasible() {
        log_summary!(
            verbosity,
            "best sample (energy {}) is infeasible: {} violations",
            best.energy,
            decoded.violations.len()
        );
        return Err(ScheduleError::ConstraintViolation {
            violations: decoded.violations,
            energy: best.energy,
            penalty_weight: problem.penalty_weight,
        });
    }

    let schedule = assemble(&decoded, catalog, problem_config, best.energy, problem.penalty_weight);
    log_summary!(
        verbosity,
        "schedule: {} entries, switch cost {}, energy {}",
        schedule.entries.len(),
        schedule.total_cost,
        schedule.energy
    );
    Ok(schedule)
}
