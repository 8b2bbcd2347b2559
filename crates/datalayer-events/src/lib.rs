//! Event distribution and change detection for the datalayer.
//!
//! This crate is the system's core: it lets independently registered
//! listeners react to application events and to mutations of the shared
//! [`Store`](datalayer_models::Store) without the application knowing who
//! is listening.
//!
//! # Key concepts
//!
//! - **[`EventManager`]**: the facade owning the lifecycle: replay of
//!   early registrations and events at `initialize`, synchronous dispatch
//!   of live event appends, and the polling change-detection ticker.
//! - **[`ListenerRegistry`]**: callback classes (`event`, `change`, ...)
//!   mapped to ordered listener records, optionally scoped to a dot-path.
//! - **[`CallQueue`]**: registrations recorded before the manager exists,
//!   replayed in order at `initialize`.
//! - **[`ChangeDetector`]**: snapshot-diff polling over the store; change
//!   listeners fail in isolation, event listeners do not.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use datalayer_events::{EventManager, ListenerArgs};
//! use datalayer_models::Event;
//!
//! # #[tokio::main] async fn main() {
//! let mut manager = EventManager::default();
//! manager.initialize().unwrap();
//!
//! // React to a specific dot-path changing.
//! manager.on("change:user.returning", Arc::new(|args| {
//!     if let ListenerArgs::Change { new_value, previous_value } = args {
//!         println!("user.returning: {:?} -> {:?}", previous_value, new_value);
//!     }
//! }));
//!
//! manager.store().set("user.returning", true);
//! manager.push_event(Event::new().with("action", "Added Product"));
//! # }
//! ```

pub mod config;
pub mod detector;
pub mod dispatcher;
pub mod error;
pub mod manager;
pub mod queue;
pub mod registry;

pub use config::ManagerConfig;
pub use detector::{ChangeDetector, ErrorCallback, CHANGE_CLASS};
pub use dispatcher::EVENT_CLASS;
pub use error::{EventError, Result};
pub use manager::EventManager;
pub use queue::{CallQueue, QueueHook};
pub use registry::{Handler, ListenerArgs, ListenerCall, ListenerRecord, ListenerRegistry};
