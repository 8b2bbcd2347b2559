//! Core data model for the datalayer system.
//!
//! This crate provides the fundamental types shared across the workspace:
//! the [`Store`] (the mutable nested state tree plus its event sequence),
//! [`Event`] records, and dot-path resolution over JSON trees.

pub mod event;
pub mod path;
pub mod store;

pub use event::Event;
pub use store::{AppendHook, EventSequence, Snapshot, Store};
