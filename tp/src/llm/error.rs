//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during LLM operations
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("API key not found. Set the {0} environment variable.")]
    MissingApiKey(String),
}

impl LlmError {
    /// Transient failures the client retries with backoff
    ///
    /// Rate limits are not retried in-client; they surface to the caller
    /// with the provider's `retry-after` hint.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::ApiError { status, .. } => matches!(status, 408 | 500 | 502 | 503 | 504),
            LlmError::Network(_) | LlmError::Timeout(_) => true,
            LlmError::RateLimited { .. } | LlmError::InvalidResponse(_) | LlmError::MissingApiKey(_) => false,
        }
    }

    /// Check if the provider rejected or never received credentials
    pub fn is_auth_error(&self) -> bool {
        match self {
            LlmError::MissingApiKey(_) => true,
            LlmError::ApiError { status, .. } => matches!(status, 401 | 403),
            _ => false,
        }
    }
}
