//! Decision variable layout: which `(task, timeline, start)` triples exist.

use rustc_hash::FxHashMap;

use crate::catalog::TaskCatalog;
use crate::interner::SymbolId;

use super::model::VarId;

/// `x[task][timeline][start] = 1`: the task occupies `start .. start + duration`
/// on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variable {
    pub task: u32,
    pub timeline: SymbolId,
    pub start: u32,
}

/// Dense numbering of admissible variables.
///
/// Only variables that respect eligibility, the task's slot window and the
/// horizon are materialized; everything else is fixed to zero by omission.
#[derive(Debug, Clone)]
pub struct VariableIndex {
    variables: Vec<Variable>,
    by_task: Vec<Vec<VarId>>,
    lookup: FxHashMap<Variable, VarId>,
}

/// Inclusive range of admissible start slots, `None` if the task cannot fit.
pub fn start_range(
    duration: u32,
    earliest: Option<u32>,
    latest: Option<u32>,
    num_slots: u32,
) -> Option<(u32, u32)> {
    if num_slots == 0 || duration == 0 {
        return None;
    }
    let last_slot = latest.unwrap_or(num_slots - 1).min(num_slots - 1);
    let first = earliest.unwrap_or(0);
    // Last slot the task may start on so that it still ends on `last_slot`.
    let last_start = (last_slot + 1).checked_sub(duration)?;
    (first <= last_start).then_some((first, last_start))
}

impl VariableIndex {
    /// Enumerate admissible variables in task, timeline, start order.
    ///
    /// Returns the index of the first task with no admissible variable as the
    /// error.
    pub fn build(catalog: &TaskCatalog, num_slots: u32) -> Result<Self, usize> {
        let mut variables = Vec::new();
        let mut by_task = Vec::with_capacity(catalog.len());
        let mut lookup = FxHashMap::default();

        for (task_index, task) in catalog.tasks().iter().enumerate() {
            let range = start_range(task.duration, task.earliest_slot, task.latest_slot, num_slots);
            let Some((first, last)) = range else {
                return Err(task_index);
            };

            let mut own = Vec::new();
            for &timeline in catalog.eligible_timelines(task_index) {
                for start in first..=last {
                    let variable = Variable {
                        task: task_index as u32,
                        timeline,
                        start,
                    };
                    let id = variables.len() as VarId;
                    variables.push(variable);
                    lookup.insert(variable, id);
                    own.push(id);
                }
            }
            if own.is_empty() {
                return Err(task_index);
            }
            by_task.push(own);
        }

        Ok(Self {
            variables,
            by_task,
            lookup,
        })
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn get(&self, id: VarId) -> Option<Variable> {
        self.variables.get(id as usize).copied()
    }

    pub fn id_of(&self, variable: &Variable) -> Option<VarId> {
        self.lookup.get(variable).copied()
    }

    /// Variables belonging to a task.
    pub fn for_task(&self, task: usize) -> &[VarId] {
        &self.by_task[task]
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, Variable)> + '_ {
        self.variables
            .iter()
            .enumerate()
            .map(|(id, v)| (id as VarId, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;

    #[test]
    fn test_start_range() {
        assert_eq!(start_range(1, None, None, 3), Some((0, 2)));
        assert_eq!(start_range(2, None, None, 3), Some((0, 1)));
        assert_eq!(start_range(3, None, None, 3), Some((0, 0)));
        assert_eq!(start_range(4, None, None, 3), None);
        assert_eq!(start_range(2, Some(1), Some(3), 10), Some((1, 2)));
        assert_eq!(start_range(2, Some(2), Some(2), 10), None);
        // A window past the horizon is clipped to it.
        assert_eq!(start_range(1, Some(1), Some(50), 3), Some((1, 2)));
        assert_eq!(start_range(1, Some(5), None, 3), None);
        assert_eq!(start_range(1, None, None, 0), None);
    }

    #[test]
    fn test_single_timeline_layout() {
        let tasks = vec![Task::simple("a", "x", 1), Task::simple("b", "x", 2)];
        let catalog = TaskCatalog::new(tasks, &[]).unwrap();
        let index = VariableIndex::build(&catalog, 3).unwrap();

        // a: starts 0,1,2 ; b: starts 0,1
        assert_eq!(index.len(), 5);
        assert_eq!(index.for_task(0), &[0, 1, 2]);
        assert_eq!(index.for_task(1), &[3, 4]);
        assert_eq!(
            index.get(4),
            Some(Variable {
                task: 1,
                timeline: 0,
                start: 1
            })
        );
        assert_eq!(index.id_of(&Variable { task: 0, timeline: 0, start: 2 }), Some(2));
        assert_eq!(index.id_of(&Variable { task: 1, timeline: 0, start: 2 }), None);
    }

    #[test]
    fn test_eligibility_limits_timelines() {
        let mut restricted = Task::simple("a", "x", 1);
        restricted.assignees = Some("bob".to_string());
        let tasks = vec![restricted, Task::simple("b", "y", 1)];
        let persons = vec!["alice".to_string(), "bob".to_string()];
        let catalog = TaskCatalog::new(tasks, &persons).unwrap();
        let index = VariableIndex::build(&catalog, 2).unwrap();

        assert!(index.for_task(0).iter().all(|&id| index.get(id).unwrap().timeline == 1));
        assert_eq!(index.for_task(0).len(), 2);
        assert_eq!(index.for_task(1).len(), 4);
    }

    #[test]
    fn test_task_without_window_reported() {
        let mut late = Task::simple("late", "x", 2);
        late.earliest_slot = Some(2);
        let tasks = vec![Task::simple("a", "x", 1), late];
        let catalog = TaskCatalog::new(tasks, &[]).unwrap();

        assert_eq!(VariableIndex::build(&catalog, 3).unwrap_err(), 1);
    }
}
