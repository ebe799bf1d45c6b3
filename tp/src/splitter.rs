//! Task splitter
//!
//! Turns free-form user text into an ordered list of unique task strings.
//! Handles one-task-per-line input (with or without bullet/numbering
//! markers) and single-line comma separated input.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::AnalyzeError;

/// Default upper bound on the number of tasks accepted per analysis
pub const DEFAULT_MAX_TASKS: usize = 50;

/// A leading list marker that may be stripped from a line
struct MarkerRule {
    name: &'static str,
    pattern: Regex,
}

/// Marker rules, tried in order. At most one marker is stripped per line.
static MARKER_RULES: LazyLock<Vec<MarkerRule>> = LazyLock::new(|| {
    [
        // "- task", "* task", "• task"
        ("bullet", r"^[-*•]\s+"),
        // "1. task", "12) task"
        ("numbered", r"^\d+[.)]\s+"),
        // "(a) task", "(3) task"
        ("parenthesized", r"^\([a-zA-Z0-9]+\)\s+"),
    ]
    .into_iter()
    .map(|(name, pattern)| MarkerRule {
        name,
        pattern: Regex::new(pattern).expect("marker patterns are valid literals"),
    })
    .collect()
});

/// Strip a single leading bullet/numbering marker from an already-trimmed line
fn strip_marker(line: &str) -> &str {
    for rule in MARKER_RULES.iter() {
        if let Some(m) = rule.pattern.find(line) {
            debug!(rule = rule.name, "strip_marker: matched");
            return &line[m.end()..];
        }
    }
    line
}

/// Split raw text into an ordered sequence of unique tasks
///
/// Never fails: empty or whitespace-only input yields an empty list.
/// Duplicates are detected case-insensitively and the first-seen casing wins.
pub fn split(input: &str) -> Vec<String> {
    debug!(input_len = input.len(), "split: called");
    let text = input.trim();
    if text.is_empty() {
        debug!("split: empty input");
        return Vec::new();
    }

    let mut tasks: Vec<String> = text
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| strip_marker(line).trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    // A single line holding several comma separated tasks
    if tasks.len() == 1 && tasks[0].contains(',') {
        let pieces: Vec<String> = tasks[0]
            .split(',')
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect();
        if pieces.len() > 1 {
            debug!(count = pieces.len(), "split: using comma separated pieces");
            tasks = pieces;
        }
    }

    let tasks = dedup_case_insensitive(tasks);
    debug!(count = tasks.len(), "split: done");
    tasks
}

/// Remove case-insensitive duplicates, keeping the first occurrence
fn dedup_case_insensitive(tasks: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tasks
        .into_iter()
        .filter(|task| seen.insert(task.to_lowercase()))
        .collect()
}

/// Reject task lists longer than `max_tasks`
pub fn validate_count(tasks: &[String], max_tasks: usize) -> Result<(), AnalyzeError> {
    debug!(count = tasks.len(), max_tasks, "validate_count: called");
    if tasks.len() > max_tasks {
        return Err(AnalyzeError::CountExceeded {
            count: tasks.len(),
            max: max_tasks,
        });
    }
    Ok(())
}
