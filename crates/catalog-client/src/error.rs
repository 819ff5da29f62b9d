//! Typed errors for catalog API operations.
//!
//! The client maps every non-success HTTP status onto one of these variants;
//! the layers above it just propagate with `?` and treat the failure as fatal
//! for the asset being worked on.

use std::time::Duration;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Failure modes when talking to the catalog.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a usable response (DNS, TLS, connect, read)
    #[error("transport failure: {0}")]
    Http(#[from] reqwest::Error),

    /// Failure raised inside the retry middleware stack
    #[error("request middleware failure: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    /// 404: no asset at the requested qualified name
    #[error("asset not found: {0}")]
    NotFound(String),

    /// 401: the API token was missing or rejected
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// 403: the token is valid but lacks access
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// 409: concurrent mutation of the same qualified name
    #[error("conflict: {0}")]
    Conflict(String),

    /// 429: the server asked us to slow down
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Parsed `Retry-After` value, when the server sent one
        retry_after: Option<Duration>,
        /// Server-side request id, for support tickets
        request_id: Option<String>,
    },

    /// 5xx, or any status with no more specific mapping
    #[error("server error {status}: {message}")]
    ServerError {
        status: u16,
        message: String,
        /// Server-side request id, for support tickets
        request_id: Option<String>,
    },

    /// A success response whose body did not parse as the expected shape
    #[error("unexpected response body: {0}")]
    InvalidResponse(String),

    /// A request that cannot be built from the given inputs
    #[error("validation failed: {0}")]
    Validation(String),

    /// JSON encode/decode failure
    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Client configuration rejected before any request was sent
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Only rate limiting and genuine 5xx responses qualify; a 4xx that fell
    /// through to [`ClientError::ServerError`] does not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::RateLimited { .. } => true,
            ClientError::ServerError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Server-assigned request id, when the failure carried one.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            ClientError::RateLimited { request_id, .. }
            | ClientError::ServerError { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }
}
