//! Composition root for the datalayer system.
//!
//! [`DataLayer`] wires the event core to registered integrations: it owns
//! the shared store and early-call queue, runs the initialize/reset
//! lifecycle, and subscribes each integration's `track_event` to the event
//! stream.

pub mod error;
pub mod layer;

pub use error::{DataLayerError, Result};
pub use layer::DataLayer;
