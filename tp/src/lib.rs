//! ToDo Prioritizer - task splitting and analysis reconciliation
//!
//! Turns a free-form to-do list into a prioritized plan: every task gets a
//! must/should/optional priority, a breakdown into 2-20 minute steps, and the
//! whole list gets one recommended next action.
//!
//! # Core Concepts
//!
//! - **Splitting**: raw text becomes an ordered, case-insensitively unique task list
//! - **Reasoning engine**: an LLM proposes priorities and breakdowns as JSON
//! - **Reconciliation**: whatever the engine returns is repaired into a result
//!   that covers every task exactly once with clamped step durations
//!
//! # Modules
//!
//! - [`splitter`] - Task splitter and count validation
//! - [`reconcile`] - Repairs engine output into a valid [`AnalysisResult`]
//! - [`domain`] - Priorities, steps, breakdowns and results
//! - [`analyzer`] - Split → prompt → LLM → reconcile pipeline
//! - [`llm`] - LLM client trait and OpenAI implementation
//! - [`prompts`] - Prompt templates
//! - [`server`] - HTTP API
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod llm;
pub mod prompts;
pub mod reconcile;
pub mod server;
pub mod splitter;

// Re-export commonly used types
pub use analyzer::{Analyzer, AnalyzerConfig};
pub use config::{Config, LlmConfig};
pub use domain::{AnalysisResult, NextAction, Priorities, Priority, Step, TaskBreakdown};
pub use error::AnalyzeError;
pub use llm::{LlmClient, LlmError, create_client};
pub use reconcile::{reconcile, reconcile_str};
pub use splitter::{split, validate_count};
