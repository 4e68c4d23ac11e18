//! Task catalog: validated task records plus the sectioned text format.
//!
//! A catalog is built once per request. Validation happens here, before any
//! QUBO construction, so malformed records never reach the builder.
//!
//! Text format:
//!
//! ```text
//! [tasks]
//! id,category,duration,assignees,earliest,latest
//! login-test,testing,1
//! api-review,review,2,alice|bob
//! [people]
//! alice
//! bob
//! [config]
//! slots=6
//! ```
//!
//! Task lines before the first section marker are read as tasks. Markers may
//! also be written `#tasks`, `#people`, `#config`; config lines may use
//! `key,value`; only the first field of a people line is the name.

use std::collections::HashSet;

use thiserror::Error;

use crate::config::{ProblemConfig, SolverConfig};
use crate::interner::{Interner, SymbolId};
use crate::models::Task;

/// Errors raised while loading or validating task records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("task catalog is empty")]
    Empty,
    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },
    #[error("task {task_id:?}: {message}")]
    InvalidTask { task_id: String, message: String },
    #[error("duplicate task id {0:?}")]
    DuplicateTask(String),
    #[error("invalid person list: {0}")]
    InvalidPerson(String),
}

/// Validated, immutable set of tasks with interned categories and resolved
/// person eligibility.
#[derive(Debug, Clone)]
pub struct TaskCatalog {
    tasks: Vec<Task>,
    categories: Vec<SymbolId>,
    category_names: Interner,
    persons: Interner,
    /// Eligible timeline ids per task, ascending. `[0]` on a single timeline.
    eligible: Vec<Vec<SymbolId>>,
}

impl TaskCatalog {
    /// Validate `tasks` against the configured `persons`.
    ///
    /// An empty `persons` list means a single shared timeline; tasks may then
    /// only use `"*"` (or nothing) as their assignee spec.
    pub fn new(tasks: Vec<Task>, persons: &[String]) -> Result<Self, CatalogError> {
        if tasks.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut person_ids = Interner::with_capacity(persons.len());
        for person in persons {
            let name = person.trim();
            if name.is_empty() {
                return Err(CatalogError::InvalidPerson("empty person name".to_string()));
            }
            if person_ids.intern_unique(name).is_err() {
                return Err(CatalogError::InvalidPerson(format!(
                    "duplicate person {:?}",
                    name
                )));
            }
        }

        let mut seen_ids: HashSet<&str> = HashSet::with_capacity(tasks.len());
        let mut category_names = Interner::default();
        let mut categories = Vec::with_capacity(tasks.len());
        let mut eligible = Vec::with_capacity(tasks.len());

        for task in &tasks {
            validate_task(task)?;
            if !seen_ids.insert(task.id.as_str()) {
                return Err(CatalogError::DuplicateTask(task.id.clone()));
            }
            categories.push(category_names.intern(&task.category));
            eligible.push(resolve_eligibility(task, &person_ids)?);
        }

        Ok(Self {
            tasks,
            categories,
            category_names,
            persons: person_ids,
            eligible,
        })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, index: usize) -> &Task {
        &self.tasks[index]
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Interned category of the task at `index`.
    #[inline]
    pub fn category(&self, index: usize) -> SymbolId {
        self.categories[index]
    }

    pub fn category_names(&self) -> &Interner {
        &self.category_names
    }

    /// Timeline ids the task at `index` may be placed on.
    pub fn eligible_timelines(&self, index: usize) -> &[SymbolId] {
        &self.eligible[index]
    }

    /// Number of timelines: configured persons, or 1 for a single timeline.
    pub fn num_timelines(&self) -> u32 {
        self.persons.len().max(1) as u32
    }

    /// Configured persons in declaration order; empty on a single timeline.
    pub fn persons(&self) -> &[String] {
        self.persons.symbols()
    }

    /// Person name for a timeline id, `None` on a single timeline.
    pub fn person_name(&self, timeline: SymbolId) -> Option<&str> {
        self.persons.resolve(timeline)
    }

    /// Sum of task durations in slot-units.
    pub fn total_duration(&self) -> u64 {
        self.tasks.iter().map(|t| u64::from(t.duration)).sum()
    }
}

fn validate_task(task: &Task) -> Result<(), CatalogError> {
    let invalid = |message: &str| CatalogError::InvalidTask {
        task_id: task.id.clone(),
        message: message.to_string(),
    };

    if task.id.trim().is_empty() {
        return Err(invalid("task id is empty"));
    }
    if task.category.trim().is_empty() {
        return Err(invalid("category is empty"));
    }
    if task.duration == 0 {
        return Err(invalid("duration must be at least one slot"));
    }
    if let (Some(earliest), Some(latest)) = (task.earliest_slot, task.latest_slot) {
        if earliest > latest {
            return Err(invalid(&format!(
                "earliest slot {} is after latest slot {}",
                earliest, latest
            )));
        }
    }
    Ok(())
}

fn resolve_eligibility(task: &Task, persons: &Interner) -> Result<Vec<SymbolId>, CatalogError> {
    let spec = task.assignees.as_deref().map(str::trim).unwrap_or("*");

    if persons.is_empty() {
        if spec.is_empty() || spec == "*" {
            return Ok(vec![0]);
        }
        return Err(CatalogError::InvalidTask {
            task_id: task.id.clone(),
            message: format!("assignees {:?} given but no persons are configured", spec),
        });
    }

    let mut ids = Vec::new();
    for name in expand_assignee_spec(spec, persons.symbols()) {
        match persons.get(&name) {
            Some(id) => ids.push(id),
            None => {
                return Err(CatalogError::InvalidTask {
                    task_id: task.id.clone(),
                    message: format!("unknown assignee {:?}", name),
                })
            }
        }
    }
    if ids.is_empty() {
        return Err(CatalogError::InvalidTask {
            task_id: task.id.clone(),
            message: format!("assignee spec {:?} selects nobody", spec),
        });
    }
    ids.sort_unstable();
    Ok(ids)
}

/// Expand an assignee spec to candidate person names.
///
/// Supports:
/// - "*" or "" -> all persons in declaration order
/// - "alice|bob" -> split by | (preserves order)
/// - "!alice" -> all persons except alice
/// - "*|!alice|!bob" -> all persons except alice and bob
/// - "alice|bob|!bob" -> alice
///
/// Names that are not configured persons are returned as-is so the caller
/// can report them.
pub fn expand_assignee_spec(spec: &str, persons: &[String]) -> Vec<String> {
    let mut inclusions: Vec<&str> = Vec::new();
    let mut exclusions: HashSet<&str> = HashSet::new();
    for part in spec.split('|').map(str::trim) {
        if let Some(excluded) = part.strip_prefix('!') {
            exclusions.insert(excluded.trim());
        } else if !part.is_empty() {
            inclusions.push(part);
        }
    }

    let mut result: Vec<String> = Vec::new();
    if inclusions.is_empty() {
        result.extend(persons.iter().cloned());
    } else {
        for inclusion in inclusions {
            if inclusion == "*" {
                result.extend(persons.iter().cloned());
            } else {
                result.push(inclusion.to_string());
            }
        }
    }

    let mut seen = HashSet::new();
    result.retain(|name| seen.insert(name.clone()) && !exclusions.contains(name.as_str()));
    result
}

/// Parsed catalog text: raw tasks plus any configuration found in `[config]`
/// and `[people]`, layered over the defaults.
#[derive(Debug, Clone, Default)]
pub struct CatalogDocument {
    pub tasks: Vec<Task>,
    pub problem: ProblemConfig,
    pub solver: SolverConfig,
}

impl CatalogDocument {
    /// Validate the parsed tasks against the parsed persons.
    pub fn catalog(&self) -> Result<TaskCatalog, CatalogError> {
        TaskCatalog::new(self.tasks.clone(), &self.problem.persons)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Tasks,
    People,
    Config,
}

fn section_marker(line: &str) -> Option<Section> {
    let lower = line.to_ascii_lowercase();
    let lower = lower.trim();
    match lower {
        "[tasks]" | "#tasks" => Some(Section::Tasks),
        "[people]" | "#people" | "[persons]" => Some(Section::People),
        "[config]" | "#config" => Some(Section::Config),
        _ => None,
    }
}

/// Parse the sectioned text catalog.
///
/// Blank lines and `#` comments are skipped. Every malformed line is reported
/// with its 1-based line number.
pub fn parse_catalog(text: &str) -> Result<CatalogDocument, CatalogError> {
    let mut doc = CatalogDocument::default();
    let mut section = Section::Tasks;
    let mut first_task_line = true;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(next) = section_marker(line) {
            section = next;
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        match section {
            Section::Tasks => {
                let is_first = std::mem::replace(&mut first_task_line, false);
                if is_first && is_task_header(line) {
                    continue;
                }
                doc.tasks.push(parse_task_line(line, line_no)?);
            }
            Section::People => {
                // Only the first field names the person; the rest is free-form.
                let name = line.split(',').next().unwrap_or("").trim();
                if !name.is_empty() {
                    doc.problem.persons.push(name.to_string());
                }
            }
            Section::Config => apply_config_line(&mut doc, line, line_no)?,
        }
    }

    Ok(doc)
}

fn is_task_header(line: &str) -> bool {
    let first = line.split(',').next().unwrap_or("").trim();
    matches!(first.to_ascii_lowercase().as_str(), "id" | "task" | "タスク名")
}

fn malformed(line: usize, message: impl Into<String>) -> CatalogError {
    CatalogError::Malformed {
        line,
        message: message.into(),
    }
}

fn parse_optional<T: std::str::FromStr>(
    field: Option<&str>,
    name: &str,
    line: usize,
) -> Result<Option<T>, CatalogError> {
    match field {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| malformed(line, format!("invalid {} {:?}", name, value))),
    }
}

fn required<T>(parsed: Option<T>, key: &str, line: usize) -> Result<T, CatalogError> {
    parsed.ok_or_else(|| malformed(line, format!("missing value for {}", key)))
}

fn parse_task_line(line: &str, line_no: usize) -> Result<Task, CatalogError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 2 {
        return Err(malformed(
            line_no,
            "expected 'id,category[,duration[,assignees[,earliest[,latest]]]]'",
        ));
    }
    if fields.len() > 6 {
        return Err(malformed(line_no, format!("expected at most 6 fields, got {}", fields.len())));
    }
    if fields[0].is_empty() {
        return Err(malformed(line_no, "task id is empty"));
    }
    if fields[1].is_empty() {
        return Err(malformed(line_no, "task category is empty"));
    }

    let duration = parse_optional::<u32>(fields.get(2).copied(), "duration", line_no)?.unwrap_or(1);
    let assignees = fields
        .get(3)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    Ok(Task {
        id: fields[0].to_string(),
        duration,
        category: fields[1].to_string(),
        assignees,
        earliest_slot: parse_optional(fields.get(4).copied(), "earliest slot", line_no)?,
        latest_slot: parse_optional(fields.get(5).copied(), "latest slot", line_no)?,
    })
}

fn apply_config_line(
    doc: &mut CatalogDocument,
    line: &str,
    line_no: usize,
) -> Result<(), CatalogError> {
    let (key, value) = match line.split_once('=') {
        Some(pair) => pair,
        // Spreadsheet exports write `key,value[,...]`.
        None => match line.split_once(',') {
            Some((key, rest)) => (key, rest.split(',').next().unwrap_or("")),
            None => return Err(malformed(line_no, "expected 'key=value' or 'key,value'")),
        },
    };
    let key = key.trim().to_ascii_lowercase();
    let value = Some(value.trim());

    let key = key.as_str();
    match key {
        "slots" | "num_slots" => {
            doc.problem.num_slots = required(parse_optional(value, key, line_no)?, key, line_no)?
        }
        "reads" | "num_reads" => {
            doc.solver.num_reads = required(parse_optional(value, key, line_no)?, key, line_no)?
        }
        "sweeps" | "num_sweeps" => {
            doc.solver.num_sweeps = required(parse_optional(value, key, line_no)?, key, line_no)?
        }
        "seed" => doc.solver.seed = parse_optional(value, key, line_no)?,
        "timeout_ms" => doc.solver.timeout_ms = parse_optional(value, key, line_no)?,
        "penalty" | "penalty_weight" => {
            doc.problem.penalty_weight = parse_optional(value, key, line_no)?
        }
        "switch_cost" => {
            doc.problem.switch_cost = required(parse_optional(value, key, line_no)?, key, line_no)?
        }
        "slot_minutes" => {
            doc.problem.slot_minutes = required(parse_optional(value, key, line_no)?, key, line_no)?
        }
        _ => return Err(malformed(line_no, format!("unknown config key {:?}", key))),
    }
    Ok(())
}
