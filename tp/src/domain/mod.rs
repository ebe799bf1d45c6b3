//! Domain types for the prioritizer
//!
//! Request-scoped value objects: priority buckets, timed steps, per-task
//! breakdowns, the recommended next action and the aggregate result.
//! Nothing here is persisted or shared between requests.

mod analysis;
mod priority;

pub use analysis::{
    AnalysisResult, DEFAULT_MINUTES, MAX_STEP_MINUTES, MIN_STEP_MINUTES, NextAction, Priorities, Step, TaskBreakdown,
    clamp_minutes,
};
pub use priority::Priority;
