//! Error types for the composition root.

use thiserror::Error;

/// Errors that can occur on the data layer's lifecycle surface.
#[derive(Debug, Error)]
pub enum DataLayerError {
    /// `initialize` was called twice without an intervening `reset`.
    #[error("data layer is already initialized")]
    AlreadyInitialized,

    /// An integration was added after initialization.
    #[error("adding integration \"{0}\" after initialization is not allowed")]
    IntegrationAfterInitialize(String),

    /// Error from the event core.
    #[error("event manager error: {0}")]
    Event(#[from] datalayer_events::EventError),
}

/// Result type alias for data layer operations.
pub type Result<T> = std::result::Result<T, DataLayerError>;
