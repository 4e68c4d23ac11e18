//! Translation of a task catalog into a penalized QUBO model.
//!
//! Energy = context-switch objective + λ·(assignment violations) + λ·(capacity
//! violations). The objective only ever adds non-negative terms, so any
//! feasible assignment has energy equal to its true switch cost.

use chrono::Duration;
use thiserror::Error;

use crate::catalog::{CatalogError, TaskCatalog};
use crate::config::ProblemConfig;
use crate::log_debug;
use crate::log_summary;

use super::model::{QuboModel, VarId};
use super::switch_cost::SwitchCosts;
use super::variables::VariableIndex;

/// Errors raised before any solving starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error(
        "Infeasible problem: tasks need {required} slot-units but only {capacity} are available"
    )]
    InfeasibleProblem { required: u64, capacity: u64 },
}

impl From<CatalogError> for BuildError {
    fn from(err: CatalogError) -> Self {
        BuildError::InvalidInput(err.to_string())
    }
}

/// A built model together with everything needed to interpret its bits.
#[derive(Debug, Clone)]
pub struct QuboProblem {
    pub model: QuboModel,
    pub variables: VariableIndex,
    pub switch_costs: SwitchCosts,
    /// λ applied to every constraint term.
    pub penalty_weight: f64,
    /// Sum of all objective coefficients written to the model.
    pub objective_mass: f64,
    pub num_slots: u32,
}

/// Smallest penalty weight the builder derives for an objective.
///
/// All objective coefficients are non-negative, so a feasible optimum costs at
/// most `objective_mass` while any violated assignment costs at least λ.
/// Adding one keeps the inequality strict.
pub fn derive_penalty_weight(objective_mass: f64) -> f64 {
    objective_mass + 1.0
}

/// Build the QUBO model for one request.
///
/// # Errors
/// * `InvalidInput` - zero slots, a task longer than the horizon, a horizon
///   whose end time overflows, a bad switch cost or penalty weight, or a task
///   with no admissible start
/// * `InfeasibleProblem` - task durations exceed slot capacity
pub fn build_qubo(
    catalog: &TaskCatalog,
    config: &ProblemConfig,
    verbosity: u8,
) -> Result<QuboProblem, BuildError> {
    let num_slots = config.num_slots;
    if catalog.is_empty() {
        return Err(BuildError::InvalidInput("task catalog is empty".to_string()));
    }
    if num_slots == 0 {
        return Err(BuildError::InvalidInput("number of slots must be positive".to_string()));
    }

    let required = catalog.total_duration();
    let capacity = u64::from(num_slots) * u64::from(catalog.num_timelines());
    if required > capacity {
        return Err(BuildError::InfeasibleProblem { required, capacity });
    }

    // Capacity can suffice across persons while a task still overflows each timeline.
    if let Some(task) = catalog.tasks().iter().find(|t| t.duration > num_slots) {
        return Err(BuildError::InvalidInput(format!(
            "task {:?} needs {} slots but only {} exist",
            task.id, task.duration, num_slots
        )));
    }
    check_horizon(config)?;

    let switch_costs =
        SwitchCosts::from_config(config, catalog).map_err(BuildError::InvalidInput)?;

    let variables = VariableIndex::build(catalog, num_slots).map_err(|task_index| {
        let task = catalog.task(task_index);
        BuildError::InvalidInput(format!(
            "task {:?} has no eligible slot window (duration {}, window {:?}..={:?}, {} slots)",
            task.id, task.duration, task.earliest_slot, task.latest_slot, num_slots
        ))
    })?;

    let mut model = QuboModel::new(variables.len());
    let objective_mass =
        add_switch_objective(&mut model, catalog, &variables, &switch_costs, num_slots);
    log_debug!(
        verbosity,
        "switch objective: {} terms, mass {}",
        model.num_interactions(),
        objective_mass
    );

    let penalty_weight = match config.penalty_weight {
        Some(weight) => {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(BuildError::InvalidInput(format!(
                    "penalty weight must be positive and finite, got {}",
                    weight
                )));
            }
            if weight <= objective_mass {
                log_summary!(
                    verbosity,
                    "warning: penalty weight {} does not exceed objective mass {}; \
                     the best sample may be infeasible",
                    weight,
                    objective_mass
                );
            }
            weight
        }
        None => derive_penalty_weight(objective_mass),
    };

    add_assignment_penalty(&mut model, catalog, &variables, penalty_weight);
    add_capacity_penalty(&mut model, catalog, &variables, penalty_weight, num_slots);

    log_summary!(
        verbosity,
        "QUBO: {} tasks, {} timelines, {} slots -> {} variables, {} interactions, λ={}",
        catalog.len(),
        catalog.num_timelines(),
        num_slots,
        model.num_variables(),
        model.num_interactions(),
        penalty_weight
    );

    Ok(QuboProblem {
        model,
        variables,
        switch_costs,
        penalty_weight,
        objective_mass,
        num_slots,
    })
}

/// The end of the last slot must be a representable wall-clock time.
fn check_horizon(config: &ProblemConfig) -> Result<(), BuildError> {
    let Some(origin) = config.horizon_start else {
        return Ok(());
    };
    let minutes = i64::from(config.num_slots) * i64::from(config.slot_minutes);
    Duration::try_minutes(minutes)
        .and_then(|span| origin.checked_add_signed(span))
        .map(|_| ())
        .ok_or_else(|| {
            BuildError::InvalidInput(format!(
                "{} slots of {} minutes from {} run past the representable time range",
                config.num_slots, config.slot_minutes, origin
            ))
        })
}

#[inline]
fn cell(timeline: u32, slot: u32, num_slots: u32) -> usize {
    (timeline * num_slots + slot) as usize
}

/// Add a switch cost for every pair where one task starts right where another
/// ends on the same timeline. Returns the total cost written.
fn add_switch_objective(
    model: &mut QuboModel,
    catalog: &TaskCatalog,
    variables: &VariableIndex,
    costs: &SwitchCosts,
    num_slots: u32,
) -> f64 {
    let mut starting_at: Vec<Vec<VarId>> =
        vec![Vec::new(); (catalog.num_timelines() * num_slots) as usize];
    for (id, var) in variables.iter() {
        starting_at[cell(var.timeline, var.start, num_slots)].push(id);
    }

    let mut mass = 0.0;
    for (id, var) in variables.iter() {
        let end = var.start + catalog.task(var.task as usize).duration;
        if end >= num_slots {
            continue;
        }
        let from = catalog.category(var.task as usize);
        for &next_id in &starting_at[cell(var.timeline, end, num_slots)] {
            let Some(next) = variables.get(next_id) else {
                continue;
            };
            if next.task == var.task {
                continue;
            }
            let cost = costs.between(from, catalog.category(next.task as usize));
            if cost > 0.0 {
                model.add_quadratic(id, next_id, cost);
                mass += cost;
            }
        }
    }
    mass
}

/// `λ·(1 − Σ x)²` per task: `−λ` per variable, `+2λ` per pair, `+λ` offset.
fn add_assignment_penalty(
    model: &mut QuboModel,
    catalog: &TaskCatalog,
    variables: &VariableIndex,
    lambda: f64,
) {
    for task in 0..catalog.len() {
        let own = variables.for_task(task);
        for (i, &a) in own.iter().enumerate() {
            model.add_linear(a, -lambda);
            for &b in &own[i + 1..] {
                model.add_quadratic(a, b, 2.0 * lambda);
            }
        }
        model.add_offset(lambda);
    }
}

/// `λ·x_a·x_b` for every pair of different tasks covering the same slot of a
/// timeline, once per shared slot.
fn add_capacity_penalty(
    model: &mut QuboModel,
    catalog: &TaskCatalog,
    variables: &VariableIndex,
    lambda: f64,
    num_slots: u32,
) {
    let mut covering: Vec<Vec<VarId>> =
        vec![Vec::new(); (catalog.num_timelines() * num_slots) as usize];
    for (id, var) in variables.iter() {
        let duration = catalog.task(var.task as usize).duration;
        for slot in var.start..var.start + duration {
            covering[cell(var.timeline, slot, num_slots)].push(id);
        }
    }

    for occupants in &covering {
        for (i, &a) in occupants.iter().enumerate() {
            let Some(task_a) = variables.get(a).map(|v| v.task) else {
                continue;
            };
            for &b in &occupants[i + 1..] {
                if variables.get(b).map(|v| v.task) != Some(task_a) {
                    model.add_quadratic(a, b, lambda);
                }
            }
        }
    }
}
