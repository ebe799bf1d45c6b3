//! Analysis reconciler
//!
//! Turns the reasoning engine's loosely structured JSON into an
//! [`AnalysisResult`] that always satisfies the product invariants:
//!
//! - every original task sits in exactly one priority bucket
//! - every original task has a breakdown with at least one step
//! - every step lasts between 2 and 20 minutes
//! - the next action names an original task
//!
//! The engine output is read field by field from a [`serde_json::Value`]
//! instead of being deserialized into the result type, so that missing keys,
//! wrong types, unknown tasks and omitted tasks are repaired rather than
//! rejected. Only a completely unparseable document is an error.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{
    AnalysisResult, DEFAULT_MINUTES, NextAction, Priorities, Priority, Step, TaskBreakdown, clamp_minutes,
};
use crate::error::AnalyzeError;

/// Maps names the engine used back to the canonical original task text
struct TaskIndex<'a> {
    exact: HashSet<&'a str>,
    folded: HashMap<String, &'a str>,
}

impl<'a> TaskIndex<'a> {
    fn new(tasks: &'a [String]) -> Self {
        let mut exact = HashSet::new();
        let mut folded = HashMap::new();
        for task in tasks {
            exact.insert(task.as_str());
            folded.entry(task.to_lowercase()).or_insert(task.as_str());
        }
        Self { exact, folded }
    }

    fn is_exact(&self, name: &str) -> bool {
        self.exact.contains(name)
    }

    /// Exact match first, then a case-insensitive match on the trimmed name
    fn resolve(&self, name: &str) -> Option<&'a str> {
        if let Some(task) = self.exact.get(name) {
            return Some(*task);
        }
        let folded = name.trim().to_lowercase();
        self.folded.get(&folded).copied()
    }
}

/// Parse raw engine text and reconcile it against the original tasks
pub fn reconcile_str(raw: &str, tasks: &[String]) -> Result<AnalysisResult, AnalyzeError> {
    debug!(raw_len = raw.len(), task_count = tasks.len(), "reconcile_str: called");
    if tasks.is_empty() {
        return Err(AnalyzeError::EmptyInput);
    }
    let value: Value = serde_json::from_str(raw)?;
    reconcile(&value, tasks)
}

/// Reconcile an already-parsed engine response against the original tasks
///
/// Fails only when `tasks` is empty.
pub fn reconcile(raw: &Value, tasks: &[String]) -> Result<AnalysisResult, AnalyzeError> {
    debug!(task_count = tasks.len(), "reconcile: called");
    if tasks.is_empty() {
        return Err(AnalyzeError::EmptyInput);
    }

    let index = TaskIndex::new(tasks);
    let priorities = extract_priorities(raw, &index, tasks);
    let breakdown = extract_breakdowns(raw, &index, tasks);
    let next_action = resolve_next_action(raw, &index, &priorities, &breakdown, tasks);

    debug!(
        must = priorities.must.len(),
        should = priorities.should.len(),
        optional = priorities.optional.len(),
        next_task = %next_action.task,
        "reconcile: done"
    );

    Ok(AnalysisResult {
        priorities,
        breakdown,
        next_action,
    })
}

/// Read the three buckets, dropping unknown and repeated tasks, then append
/// every uncategorized task to `optional` in original order
fn extract_priorities(raw: &Value, index: &TaskIndex<'_>, tasks: &[String]) -> Priorities {
    let section = raw.get("priorities");
    let mut priorities = Priorities::default();
    let mut placed: HashSet<&str> = HashSet::new();

    for priority in Priority::ALL {
        let Some(entries) = section.and_then(|s| s.get(priority.key())).and_then(Value::as_array) else {
            debug!(%priority, "extract_priorities: bucket missing or not a list");
            continue;
        };

        for entry in entries {
            let Some(name) = entry.as_str() else {
                warn!(%priority, ?entry, "Ignoring non-string bucket entry");
                continue;
            };
            let Some(task) = index.resolve(name) else {
                warn!(%priority, name, "Ignoring unknown task in priorities");
                continue;
            };
            if placed.insert(task) {
                priorities.bucket_mut(priority).push(task.to_string());
            } else {
                warn!(%priority, task, "Task assigned to more than one bucket, keeping the first");
            }
        }
    }

    for task in tasks {
        if !placed.contains(task.as_str()) {
            warn!(task = %task, "Task missing from priorities, defaulting to optional");
            priorities.optional.push(task.clone());
        }
    }

    priorities
}

/// Read per-task steps, falling back to the default breakdown for any task
/// the engine skipped or gave no usable steps
///
/// Keys naming a task verbatim are taken first; case-folded keys only fill
/// tasks that are still missing afterwards.
fn extract_breakdowns(raw: &Value, index: &TaskIndex<'_>, tasks: &[String]) -> BTreeMap<String, TaskBreakdown> {
    let mut breakdowns = BTreeMap::new();

    if let Some(entries) = raw.get("breakdown").and_then(Value::as_object) {
        let (exact, folded): (Vec<_>, Vec<_>) = entries.iter().partition(|(name, _)| index.is_exact(name));

        for (name, entry) in exact.into_iter().chain(folded) {
            let Some(task) = index.resolve(name) else {
                warn!(name = %name, "Ignoring breakdown for unknown task");
                continue;
            };
            if breakdowns.contains_key(task) {
                warn!(task, name = %name, "Duplicate breakdown for task, keeping the closest match");
                continue;
            }

            let steps: Vec<Step> = entry
                .get("steps")
                .and_then(Value::as_array)
                .map(|steps| {
                    steps
                        .iter()
                        .enumerate()
                        .filter_map(|(i, step)| parse_step(task, i, step))
                        .collect()
                })
                .unwrap_or_default();

            let breakdown = if steps.is_empty() {
                warn!(task, "No usable steps for task, using default breakdown");
                TaskBreakdown::default_for(task)
            } else {
                TaskBreakdown { steps }
            };
            breakdowns.insert(task.to_string(), breakdown);
        }
    } else {
        debug!("extract_breakdowns: breakdown missing or not an object");
    }

    for task in tasks {
        if !breakdowns.contains_key(task) {
            warn!(task = %task, "Task missing from breakdown, using default breakdown");
            breakdowns.insert(task.clone(), TaskBreakdown::default_for(task));
        }
    }

    breakdowns
}

/// A step needs a non-empty description; minutes are coerced and clamped
fn parse_step(task: &str, position: usize, value: &Value) -> Option<Step> {
    let description = value.get("step").and_then(Value::as_str).map(str::trim).unwrap_or("");
    if description.is_empty() {
        warn!(task, step = position, "Dropping step without a description");
        return None;
    }
    Some(Step::new(description, parse_minutes(value.get("minutes"))))
}

/// Numbers (and numeric strings) are truncated and clamped; anything else is the default
fn parse_minutes(value: Option<&Value>) -> u32 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(minutes) => {
            let clamped = clamp_minutes(minutes);
            if clamped as f64 != minutes {
                debug!(minutes, clamped, "parse_minutes: adjusted");
            }
            clamped
        }
        None => {
            debug!(?value, "parse_minutes: not numeric, using default");
            DEFAULT_MINUTES
        }
    }
}

/// Use the engine's next action when it names a known task and a step,
/// otherwise take the first step of the highest-priority task
fn resolve_next_action(
    raw: &Value,
    index: &TaskIndex<'_>,
    priorities: &Priorities,
    breakdowns: &BTreeMap<String, TaskBreakdown>,
    tasks: &[String],
) -> NextAction {
    let section = raw.get("next_action").or_else(|| raw.get("nextAction"));
    let field = |key: &str| {
        section
            .and_then(|s| s.get(key))
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or("")
    };
    let task = field("task");
    let step = field("step");

    if !task.is_empty() && !step.is_empty() {
        if let Some(canonical) = index.resolve(task) {
            debug!(task = canonical, "resolve_next_action: using supplied next action");
            return NextAction {
                task: canonical.to_string(),
                step: step.to_string(),
                minutes: parse_minutes(section.and_then(|s| s.get("minutes"))),
            };
        }
        warn!(task, "Next action names an unknown task, deriving instead");
    } else {
        debug!("resolve_next_action: no usable next action, deriving");
    }

    // Coverage repair guarantees a non-empty bucket; tasks is non-empty here
    let top = priorities.top_task().unwrap_or(tasks[0].as_str());
    let first = match breakdowns.get(top).and_then(TaskBreakdown::first_step) {
        Some(step) => step.clone(),
        None => TaskBreakdown::default_for(top).steps.remove(0),
    };

    NextAction {
        task: top.to_string(),
        step: first.description,
        minutes: first.minutes,
    }
}
