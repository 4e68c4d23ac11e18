//! Core data types exchanged with callers: task records in, schedules out.

use chrono::NaiveDateTime;
use pyo3::prelude::*;
use std::collections::HashMap;

// Note: We use std HashMap here for PyO3 interface compatibility

/// Timeline key used by [`Schedule::timeline`] when no persons are configured.
pub const SINGLE_TIMELINE: &str = "timeline";

/// A task to be placed on the timeline.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    #[pyo3(get, set)]
    pub id: String,
    /// Number of consecutive slots the task occupies.
    #[pyo3(get, set)]
    pub duration: u32,
    /// Category tag; adjacent tasks with different tags incur a switch cost.
    #[pyo3(get, set)]
    pub category: String,
    /// Eligible persons, e.g. `"alice|bob"`, `"*|!carol"`. `None` means anyone.
    #[pyo3(get, set)]
    pub assignees: Option<String>,
    /// First slot the task may occupy (inclusive).
    #[pyo3(get, set)]
    pub earliest_slot: Option<u32>,
    /// Last slot the task may occupy (inclusive).
    #[pyo3(get, set)]
    pub latest_slot: Option<u32>,
}

impl Task {
    /// A task with no assignee or window restrictions.
    pub fn simple(id: &str, category: &str, duration: u32) -> Self {
        Self {
            id: id.to_string(),
            duration,
            category: category.to_string(),
            assignees: None,
            earliest_slot: None,
            latest_slot: None,
        }
    }
}

#[pymethods]
impl Task {
    #[new]
    #[pyo3(signature = (
        id,
        category,
        duration=1,
        assignees=None,
        earliest_slot=None,
        latest_slot=None
    ))]
    fn new(
        id: String,
        category: String,
        duration: u32,
        assignees: Option<String>,
        earliest_slot: Option<u32>,
        latest_slot: Option<u32>,
    ) -> Self {
        Self {
            id,
            duration,
            category,
            assignees,
            earliest_slot,
            latest_slot,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Task(id={:?}, category={:?}, duration={}, assignees={:?})",
            self.id, self.category, self.duration, self.assignees
        )
    }
}

/// One placed task in a finished schedule.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleEntry {
    /// First slot occupied.
    #[pyo3(get, set)]
    pub slot: u32,
    #[pyo3(get, set)]
    pub task_id: String,
    #[pyo3(get, set)]
    pub category: String,
    #[pyo3(get, set)]
    pub duration: u32,
    /// `None` on a single timeline.
    #[pyo3(get, set)]
    pub person: Option<String>,
    #[pyo3(get, set)]
    pub start_time: Option<NaiveDateTime>,
    #[pyo3(get, set)]
    pub end_time: Option<NaiveDateTime>,
}

impl ScheduleEntry {
    /// Exclusive end slot.
    pub fn end_slot(&self) -> u32 {
        self.slot + self.duration
    }
}

#[pymethods]
impl ScheduleEntry {
    fn __repr__(&self) -> String {
        format!(
            "ScheduleEntry(slot={}, task_id={:?}, person={:?})",
            self.slot, self.task_id, self.person
        )
    }
}

/// Final artifact of a solve request.
#[pyclass]
#[derive(Clone, Debug, Default)]
pub struct Schedule {
    /// Entries ordered by slot, then person, then task id.
    #[pyo3(get)]
    pub entries: Vec<ScheduleEntry>,
    /// Context-switch cost recomputed from the entries.
    #[pyo3(get)]
    pub total_cost: f64,
    #[pyo3(get)]
    pub feasible: bool,
    /// Energy of the winning sample under the QUBO model (penalties included).
    #[pyo3(get)]
    pub energy: f64,
    #[pyo3(get)]
    pub penalty_weight: f64,
    #[pyo3(get)]
    pub num_slots: u32,
    /// Configured persons; empty on a single timeline.
    #[pyo3(get)]
    pub persons: Vec<String>,
    /// Human-readable constraint violations; empty when feasible.
    #[pyo3(get)]
    pub violations: Vec<String>,
}

#[pymethods]
impl Schedule {
    /// Per-person slot rows: the occupying task id on every slot it covers.
    pub fn timeline(&self) -> HashMap<String, Vec<Option<String>>> {
        let mut rows: HashMap<String, Vec<Option<String>>> = HashMap::new();
        if self.persons.is_empty() {
            rows.insert(SINGLE_TIMELINE.to_string(), vec![None; self.num_slots as usize]);
        }
        for person in &self.persons {
            rows.insert(person.clone(), vec![None; self.num_slots as usize]);
        }

        for entry in &self.entries {
            let key = entry.person.as_deref().unwrap_or(SINGLE_TIMELINE);
            let Some(row) = rows.get_mut(key) else {
                continue;
            };
            for slot in entry.slot..entry.end_slot().min(self.num_slots) {
                row[slot as usize] = Some(entry.task_id.clone());
            }
        }
        rows
    }

    /// Slot of a task's first entry, if scheduled.
    pub fn slot_of(&self, task_id: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.task_id == task_id)
            .map(|e| e.slot)
    }

    fn __len__(&self) -> usize {
        self.entries.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "Schedule(entries={}, total_cost={}, feasible={})",
            self.entries.len(),
            self.total_cost,
            self.feasible
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(slot: u32, task_id: &str, duration: u32, person: Option<&str>) -> ScheduleEntry {
        ScheduleEntry {
            slot,
            task_id: task_id.to_string(),
            category: "x".to_string(),
            duration,
            person: person.map(str::to_string),
            start_time: None,
            end_time: None,
        }
    }

    #[test]
    fn test_single_timeline_rows() {
        let schedule = Schedule {
            entries: vec![entry(0, "a", 2, None), entry(3, "b", 1, None)],
            feasible: true,
            num_slots: 4,
            ..Default::default()
        };

        let rows = schedule.timeline();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[SINGLE_TIMELINE],
            vec![
                Some("a".to_string()),
                Some("a".to_string()),
                None,
                Some("b".to_string())
            ]
        );
        assert_eq!(schedule.slot_of("b"), Some(3));
        assert_eq!(schedule.slot_of("zzz"), None);
    }

    #[test]
    fn test_per_person_rows_include_idle_persons() {
        let schedule = Schedule {
            entries: vec![entry(1, "a", 1, Some("alice"))],
            num_slots: 2,
            persons: vec!["alice".to_string(), "bob".to_string()],
            ..Default::default()
        };

        let rows = schedule.timeline();
        assert_eq!(rows["alice"], vec![None, Some("a".to_string())]);
        assert_eq!(rows["bob"], vec![None, None]);
    }
}
