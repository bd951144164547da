use thiserror::Error;

/// Failure at the content provider boundary. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Request to content provider failed: {0}")]
    Transport(String),

    #[error("Content provider timed out after {0}s")]
    Timeout(u64),

    #[error("Content provider returned HTTP {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Content provider returned no text")]
    EmptyResponse,
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GenerationError::MalformedResponse(e.to_string())
        } else {
            GenerationError::Transport(e.to_string())
        }
    }
}
