//! Golemio feed error types.

/// Errors that can occur when fetching from the telemetry feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid or missing access token
    #[error("unauthorized: check GOLEMIO_API_KEY")]
    Unauthorized,

    /// Requested trip does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// API returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// Configured base URL cannot be used to build request URLs
    #[error("invalid URL: {message}")]
    InvalidUrl { message: String },

    /// Local mock data could not be loaded
    #[error("mock data error: {message}")]
    MockData { message: String },
}
