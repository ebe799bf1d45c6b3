//! Analysis result types
//!
//! These serialize to the wire shape the frontend consumes:
//! `{priorities: {must, should, optional}, breakdown: {task: {steps: [{step, minutes}]}}, next_action: {task, step, minutes}}`

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Priority;

/// Shortest allowed step, in minutes
pub const MIN_STEP_MINUTES: u32 = 2;

/// Longest allowed step, in minutes
pub const MAX_STEP_MINUTES: u32 = 20;

/// Minutes assumed when the engine gives none
pub const DEFAULT_MINUTES: u32 = 5;

/// Truncate toward zero and saturate into `[MIN_STEP_MINUTES, MAX_STEP_MINUTES]`
pub fn clamp_minutes(value: f64) -> u32 {
    if value.is_nan() {
        return DEFAULT_MINUTES;
    }
    value.trunc().clamp(MIN_STEP_MINUTES as f64, MAX_STEP_MINUTES as f64) as u32
}

/// Tasks grouped into the three priority buckets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Priorities {
    pub must: Vec<String>,
    pub should: Vec<String>,
    pub optional: Vec<String>,
}

impl Priorities {
    /// Tasks in a bucket, in listed order
    pub fn bucket(&self, priority: Priority) -> &[String] {
        match priority {
            Priority::Must => &self.must,
            Priority::Should => &self.should,
            Priority::Optional => &self.optional,
        }
    }

    pub fn bucket_mut(&mut self, priority: Priority) -> &mut Vec<String> {
        match priority {
            Priority::Must => &mut self.must,
            Priority::Should => &mut self.should,
            Priority::Optional => &mut self.optional,
        }
    }

    /// The bucket a task was placed in, if any
    pub fn priority_of(&self, task: &str) -> Option<Priority> {
        Priority::ALL
            .into_iter()
            .find(|p| self.bucket(*p).iter().any(|t| t == task))
    }

    /// First-listed task of the highest non-empty bucket
    pub fn top_task(&self) -> Option<&str> {
        Priority::ALL
            .into_iter()
            .find_map(|p| self.bucket(p).first())
            .map(String::as_str)
    }

    /// Total number of entries across all buckets
    pub fn len(&self) -> usize {
        self.must.len() + self.should.len() + self.optional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One small timed action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    #[serde(rename = "step")]
    pub description: String,
    pub minutes: u32,
}

impl Step {
    pub fn new(description: impl Into<String>, minutes: u32) -> Self {
        Self {
            description: description.into(),
            minutes,
        }
    }
}

/// Ordered micro-steps for a single task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskBreakdown {
    pub steps: Vec<Step>,
}

impl TaskBreakdown {
    /// Two-step fallback used when the engine gives no usable steps
    pub fn default_for(task: &str) -> Self {
        Self {
            steps: vec![
                Step::new(format!("Start working on {}", task), 5),
                Step::new(format!("Complete {}", task), 15),
            ],
        }
    }

    pub fn first_step(&self) -> Option<&Step> {
        self.steps.first()
    }

    /// Sum of all step durations
    pub fn total_minutes(&self) -> u32 {
        self.steps.iter().map(|s| s.minutes).sum()
    }
}

/// The single recommended first move
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextAction {
    pub task: String,
    pub step: String,
    pub minutes: u32,
}

/// Fully reconciled analysis of one task list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub priorities: Priorities,
    pub breakdown: BTreeMap<String, TaskBreakdown>,
    pub next_action: NextAction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_minutes() {
        assert_eq!(clamp_minutes(1.0), 2);
        assert_eq!(clamp_minutes(-7.0), 2);
        assert_eq!(clamp_minutes(25.0), 20);
        assert_eq!(clamp_minutes(7.9), 7);
        assert_eq!(clamp_minutes(2.0), 2);
        assert_eq!(clamp_minutes(20.0), 20);
        assert_eq!(clamp_minutes(1e300), 20);
        assert_eq!(clamp_minutes(f64::NAN), DEFAULT_MINUTES);
    }

    #[test]
    fn test_default_breakdown() {
        let breakdown = TaskBreakdown::default_for("Task 2");
        assert_eq!(
            breakdown.steps,
            vec![Step::new("Start working on Task 2", 5), Step::new("Complete Task 2", 15)]
        );
        assert_eq!(breakdown.total_minutes(), 20);
    }

    #[test]
    fn test_top_task_follows_bucket_order() {
        let mut priorities = Priorities::default();
        assert_eq!(priorities.top_task(), None);

        priorities.optional.push("Later".to_string());
        assert_eq!(priorities.top_task(), Some("Later"));

        priorities.should.push("Soon".to_string());
        assert_eq!(priorities.top_task(), Some("Soon"));

        priorities.must.push("Now".to_string());
        priorities.must.push("Also now".to_string());
        assert_eq!(priorities.top_task(), Some("Now"));
        assert_eq!(priorities.len(), 4);
        assert_eq!(priorities.priority_of("Soon"), Some(Priority::Should));
        assert_eq!(priorities.priority_of("Missing"), None);
    }

    #[test]
    fn test_result_wire_shape() {
        let mut breakdown = BTreeMap::new();
        breakdown.insert(
            "Write report".to_string(),
            TaskBreakdown {
                steps: vec![Step::new("Open document", 2)],
            },
        );
        let result = AnalysisResult {
            priorities: Priorities {
                must: vec!["Write report".to_string()],
                should: vec![],
                optional: vec![],
            },
            breakdown,
            next_action: NextAction {
                task: "Write report".to_string(),
                step: "Open document".to_string(),
                minutes: 2,
            },
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["priorities"]["must"][0], "Write report");
        assert_eq!(json["breakdown"]["Write report"]["steps"][0]["step"], "Open document");
        assert_eq!(json["breakdown"]["Write report"]["steps"][0]["minutes"], 2);
        assert_eq!(json["next_action"]["task"], "Write report");
        assert_eq!(json["next_action"]["minutes"], 2);
    }
}
