//! Error types for video generation runs.

use std::time::Duration;

/// Maximum length of a response body carried inside an error message.
const MAX_ERROR_BODY_LEN: usize = 500;

/// Errors that can occur while submitting, polling or downloading a job.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Endpoint or API key missing, or an override could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// API key rejected by the service.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Delay suggested by the `Retry-After` header.
        retry_after: Option<Duration>,
    },

    /// Parameters rejected (size, duration, prompt, reference image).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Prompt or reference image blocked by moderation.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Response did not have the expected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Polling exceeded the configured timeout.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error (reading the reference image, writing the video).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RunnerError {
    /// Returns true if the service refused the request itself, as opposed to
    /// a transport or local failure.
    pub fn is_remote_rejection(&self) -> bool {
        matches!(
            self,
            Self::Auth(_)
                | Self::Api { .. }
                | Self::RateLimited { .. }
                | Self::InvalidRequest(_)
                | Self::ContentBlocked(_)
        )
    }
}

/// Result type alias for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;

/// Reads the `Retry-After` header as whole seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Collapses whitespace and truncates a response body so it can be shown
/// in a log line.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_ERROR_BODY_LEN {
        return collapsed;
    }
    let truncated: String = collapsed.chars().take(MAX_ERROR_BODY_LEN).collect();
    format!("{truncated}...")
}
