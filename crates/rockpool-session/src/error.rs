//! Error types for session store operations.

/// Error type for session store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No live session exists for the given identifier.
    #[error("Session not found: {0}")]
    NotFound(String),

    /// The store configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The store has been destroyed and no longer accepts operations.
    #[error("Session store has been destroyed")]
    Destroyed,
}

/// Result type for session store operations.
pub type Result<T> = std::result::Result<T, Error>;
