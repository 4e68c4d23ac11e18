//! Decoding a sample back into task placements and checking hard constraints.
//!
//! The cost reported to callers is recomputed here from the placements, never
//! taken from the sample energy.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::catalog::TaskCatalog;
use crate::interner::SymbolId;
use crate::qubo::{QuboProblem, SwitchCosts};
use crate::solver::SampleResult;

/// A task placed on a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Catalog index.
    pub task: u32,
    pub timeline: SymbolId,
    pub start: u32,
}

/// A broken hard constraint, with enough detail to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The task was not placed anywhere.
    Unassigned { task_id: String },
    /// The task was placed `count` times.
    MultiplyAssigned { task_id: String, count: usize },
    /// More than one task covers the slot. `person` is `None` on a single timeline.
    CapacityExceeded {
        person: Option<String>,
        slot: u32,
        occupants: Vec<String>,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Unassigned { task_id } => write!(f, "task {:?} has no slot", task_id),
            Violation::MultiplyAssigned { task_id, count } => {
                write!(f, "task {:?} assigned {} times (excess {})", task_id, count, count - 1)
            }
            Violation::CapacityExceeded {
                person,
                slot,
                occupants,
            } => {
                match person {
                    Some(person) => write!(f, "{} at slot {}", person, slot)?,
                    None => write!(f, "slot {}", slot)?,
                }
                write!(
                    f,
                    " holds {} tasks (excess {}): {}",
                    occupants.len(),
                    occupants.len() - 1,
                    occupants.join(", ")
                )
            }
        }
    }
}

/// Placements read from one sample, with the recomputed cost and any violations.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSchedule {
    /// In variable order (task, then timeline, then start).
    pub placements: Vec<Placement>,
    pub true_cost: f64,
    pub violations: Vec<Violation>,
}

impl DecodedSchedule {
    pub fn is_feasible(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Map set bits to placements, recompute the switch cost, and validate.
///
/// Never repairs: a broken sample decodes to an infeasible schedule.
pub fn decode(
    problem: &QuboProblem,
    catalog: &TaskCatalog,
    sample: &SampleResult,
) -> DecodedSchedule {
    let placements: Vec<Placement> = sample
        .bits
        .iter()
        .enumerate()
        .filter(|(_, bit)| **bit != 0)
        .filter_map(|(id, _)| problem.variables.get(id as u32))
        .map(|var| Placement {
            task: var.task,
            timeline: var.timeline,
            start: var.start,
        })
        .collect();

    let true_cost = context_switch_cost(&placements, catalog, &problem.switch_costs);
    let violations = validate(&placements, catalog, problem.num_slots);
    DecodedSchedule {
        placements,
        true_cost,
        violations,
    }
}

/// Sum of switch costs between back-to-back tasks on each timeline.
///
/// Two placements are back to back when the second starts on the slot right
/// after the first one's last slot.
pub fn context_switch_cost(
    placements: &[Placement],
    catalog: &TaskCatalog,
    costs: &SwitchCosts,
) -> f64 {
    let mut by_timeline: FxHashMap<SymbolId, Vec<&Placement>> = FxHashMap::default();
    for placement in placements {
        by_timeline.entry(placement.timeline).or_default().push(placement);
    }

    let mut timelines: Vec<_> = by_timeline.into_iter().collect();
    timelines.sort_unstable_by_key(|(timeline, _)| *timeline);

    let mut total = 0.0;
    for (_, mut row) in timelines {
        row.sort_unstable_by_key(|p| (p.start, p.task));
        for pair in row.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            let prev_end = prev.start + catalog.task(prev.task as usize).duration;
            if next.start == prev_end {
                total += costs.between(
                    catalog.category(prev.task as usize),
                    catalog.category(next.task as usize),
                );
            }
        }
    }
    total
}

fn validate(placements: &[Placement], catalog: &TaskCatalog, num_slots: u32) -> Vec<Violation> {
    let mut violations = Vec::new();

    let mut counts = vec![0usize; catalog.len()];
    for placement in placements {
        counts[placement.task as usize] += 1;
    }
    for (task, &count) in counts.iter().enumerate() {
        let task_id = catalog.task(task).id.clone();
        match count {
            1 => {}
            0 => violations.push(Violation::Unassigned { task_id }),
            _ => violations.push(Violation::MultiplyAssigned { task_id, count }),
        }
    }

    let timelines = catalog.num_timelines();
    let mut occupants: Vec<Vec<u32>> = vec![Vec::new(); (timelines * num_slots) as usize];
    for placement in placements {
        let duration = catalog.task(placement.task as usize).duration;
        for slot in placement.start..(placement.start + duration).min(num_slots) {
            occupants[(placement.timeline * num_slots + slot) as usize].push(placement.task);
        }
    }
    for (cell, tasks) in occupants.iter().enumerate() {
        if tasks.len() <= 1 {
            continue;
        }
        let timeline = cell as u32 / num_slots;
        violations.push(Violation::CapacityExceeded {
            person: catalog.person_name(timeline).map(str::to_string),
            slot: cell as u32 % num_slots,
            occupants: tasks
                .iter()
                .map(|&t| catalog.task(t as usize).id.clone())
                .collect(),
        });
    }

    violations
}
