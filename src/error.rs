use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkqueueError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("failed to marshal payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request went out but its acknowledgement could not be read, so the
    /// backend may or may not have accepted the event.
    #[error("failed to confirm ack: {0}")]
    AckRead(#[source] reqwest::Error),

    #[error("error on publisher: HTTP {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("configuration error: {0}")]
    Configuration(String),
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to create request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("failed on publisher: {0}")]
    Network(#[source] reqwest::Error),

    #[error("failed on publisher: timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("failed on publisher: request cancelled")]
    Cancelled,
}

impl WorkqueueError {
    /// Whether repeating the same publish could reasonably succeed.
    ///
    /// The producer never retries on its own; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkqueueError::Transport(TransportError::Network(_))
            | WorkqueueError::Transport(TransportError::Timeout { .. }) => true,
            WorkqueueError::Backend { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkqueueError::Transport(TransportError::Cancelled))
    }
}

pub type Result<T> = std::result::Result<T, WorkqueueError>;
