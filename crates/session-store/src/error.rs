//! Error types for session operations

/// Errors from session store operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(String),

    #[error("session attribute {key} could not be (de)serialized: {reason}")]
    Serialization { key: String, reason: String },

    #[error("operation not supported by this session store: {0}")]
    Unsupported(&'static str),
}

impl SessionError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::NotFound(_))
    }
}

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
