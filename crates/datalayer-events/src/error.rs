//! Error types for event manager operations.

use thiserror::Error;

/// Errors that can occur in event manager operations.
#[derive(Debug, Error)]
pub enum EventError {
    /// `initialize` was called twice without an intervening `reset`.
    #[error("event manager is already initialized")]
    AlreadyInitialized,
}

/// Result type alias for event manager operations.
pub type Result<T> = std::result::Result<T, EventError>;
