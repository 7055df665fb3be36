use shared::error::ApiError;
use thiserror::Error;

/// Everything a client operation can fail with. Remote failures carry the
/// backend's `{message, code?, time?}` payload; the crate itself never logs
/// or retries; surfacing the error is the caller's job.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Caught locally, before any network call.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Non-2xx response from a service.
    #[error("{error}")]
    Api { status: u16, error: ApiError },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A 2xx response whose body did not match the expected shape.
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// The normalized error shape presentation layers render.
    pub fn api_error(&self) -> ApiError {
        match self {
            ClientError::Api { error, .. } => error.clone(),
            other => ApiError::new(other.to_string()),
        }
    }
}
