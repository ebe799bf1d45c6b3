//! Analysis error types

use thiserror::Error;

use crate::llm::LlmError;

/// Errors that can stop an analysis request
///
/// Malformed-but-parseable engine output is never an error; the reconciler
/// repairs it. Only the cases below reach the caller.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("No valid tasks found in input. Please provide at least one task.")]
    EmptyInput,

    #[error("Too many tasks ({count}). Maximum {max} tasks allowed.")]
    CountExceeded { count: usize, max: usize },

    #[error("Reasoning engine returned unparseable output: {0}")]
    UpstreamParse(#[from] serde_json::Error),

    #[error("Reasoning engine call failed: {0}")]
    UpstreamUnavailable(#[from] LlmError),

    #[error("API key is not configured. Please set the {0} environment variable.")]
    MissingCredential(String),

    #[error("Failed to render prompt: {0}")]
    Prompt(String),
}

impl AnalyzeError {
    /// Whether the caller should treat this as a bad request rather than a server fault
    pub fn is_user_error(&self) -> bool {
        matches!(self, AnalyzeError::EmptyInput | AnalyzeError::CountExceeded { .. })
    }

    /// Whether the failure points at missing or rejected credentials
    pub fn is_credential_error(&self) -> bool {
        match self {
            AnalyzeError::MissingCredential(_) => true,
            AnalyzeError::UpstreamUnavailable(e) => e.is_auth_error(),
            _ => false,
        }
    }
}
