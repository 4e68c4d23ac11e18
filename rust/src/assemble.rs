//! Turning decoded placements into the caller-facing [`Schedule`].

use chrono::{Duration, NaiveDateTime};

use crate::catalog::TaskCatalog;
use crate::config::ProblemConfig;
use crate::decode::DecodedSchedule;
use crate::models::{Schedule, ScheduleEntry};

fn slot_time(start: NaiveDateTime, slot: u32, slot_minutes: u32) -> Option<NaiveDateTime> {
    Duration::try_minutes(i64::from(slot) * i64::from(slot_minutes))
        .and_then(|offset| start.checked_add_signed(offset))
}

/// Order placements by slot, then timeline, then task id, and attach cost,
/// feasibility and diagnostics.
pub fn assemble(
    decoded: &DecodedSchedule,
    catalog: &TaskCatalog,
    config: &ProblemConfig,
    energy: f64,
    penalty_weight: f64,
) -> Schedule {
    let mut placements = decoded.placements.clone();
    placements.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(a.timeline.cmp(&b.timeline))
            .then_with(|| catalog.task(a.task as usize).id.cmp(&catalog.task(b.task as usize).id))
    });

    let entries = placements
        .iter()
        .map(|p| {
            let task = catalog.task(p.task as usize);
            // Times past the representable range are left unset.
            let times = config.horizon_start.and_then(|origin| {
                Some((
                    slot_time(origin, p.start, config.slot_minutes)?,
                    slot_time(origin, p.start + task.duration, config.slot_minutes)?,
                ))
            });
            ScheduleEntry {
                slot: p.start,
                task_id: task.id.clone(),
                category: task.category.clone(),
                duration: task.duration,
                person: catalog.person_name(p.timeline).map(str::to_string),
                start_time: times.map(|(start, _)| start),
                end_time: times.map(|(_, end)| end),
            }
        })
        .collect();

    Schedule {
        entries,
        total_cost: decoded.true_cost,
        feasible: decoded.is_feasible(),
        energy,
        penalty_weight,
        num_slots: config.num_slots,
        persons: catalog.persons().to_vec(),
        violations: decoded.violations.iter().map(|v| v.to_string()).collect(),
    }
}
