//! Listener registry: callback classes mapped to ordered listener records.
//!
//! A listener is registered under a class name (`event`, `change`, or any
//! application-defined class), optionally scoped to a dot-path key with the
//! `"<class>:<dotPath>"` form. Records are kept in registration order and
//! are never de-duplicated.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::debug;

use datalayer_models::Event;

/// Arguments passed to a listener when it fires.
#[derive(Debug, Clone)]
pub enum ListenerArgs {
    /// An event-class firing; carries an independent copy of the event.
    Event(Event),
    /// A key-scoped change firing; carries the values at the scoped path.
    Change {
        /// Value at the path in the new snapshot.
        new_value: Option<Value>,
        /// Value at the path in the previous snapshot.
        previous_value: Option<Value>,
    },
    /// An unscoped change firing; no arguments.
    None,
}

/// A listener callback.
pub type Handler = Arc<dyn Fn(ListenerArgs) + Send + Sync>;

/// A single registered listener.
#[derive(Clone)]
pub struct ListenerRecord {
    /// Dot-path scope; `None` registers class-wide.
    pub key: Option<String>,
    /// The callback itself.
    pub handler: Handler,
}

/// A registration call, the typed form of the `[verb, target, handler]`
/// tuples accepted by the early-call queue.
#[derive(Clone)]
pub struct ListenerCall {
    /// `"on"` or `"off"`; any other verb is ignored.
    pub verb: String,
    /// `"<class>"` or `"<class>:<dotPath>"`.
    pub target: String,
    /// The callback to register or remove.
    pub handler: Handler,
}

impl ListenerCall {
    /// A registration call.
    pub fn on(target: impl Into<String>, handler: Handler) -> Self {
        Self {
            verb: "on".to_string(),
            target: target.into(),
            handler,
        }
    }

    /// A removal call. Removes by handler identity.
    pub fn off(target: impl Into<String>, handler: Handler) -> Self {
        Self {
            verb: "off".to_string(),
            target: target.into(),
            handler,
        }
    }
}

/// Registry of listeners grouped by callback class.
#[derive(Default)]
pub struct ListenerRegistry {
    callbacks: RwLock<HashMap<String, Vec<ListenerRecord>>>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener under `"<class>"` or `"<class>:<dotPath>"`.
    ///
    /// Repeated registration of the same handler yields multiple
    /// independent invocations.
    pub fn on(&self, class_and_key: &str, handler: Handler) {
        let (class, key) = split_target(class_and_key);
        if let Ok(mut callbacks) = self.callbacks.write() {
            callbacks
                .entry(class.to_string())
                .or_default()
                .push(ListenerRecord { key, handler });
        }
    }

    /// Removes listeners under `"<class>"` or `"<class>:<dotPath>"`.
    ///
    /// With a handler, only records holding that exact callback (pointer
    /// identity) are removed; without one, every record for the class/key
    /// is removed.
    pub fn off(&self, class_and_key: &str, handler: Option<&Handler>) {
        let (class, key) = split_target(class_and_key);
        if let Ok(mut callbacks) = self.callbacks.write() {
            if let Some(records) = callbacks.get_mut(class) {
                records.retain(|record| {
                    if record.key != key {
                        return true;
                    }
                    match handler {
                        Some(handler) => !Arc::ptr_eq(&record.handler, handler),
                        None => false,
                    }
                });
            }
        }
    }

    /// Applies a registration call. Unknown verbs are ignored silently.
    pub fn add_callback(&self, call: &ListenerCall) {
        match call.verb.as_str() {
            "on" => self.on(&call.target, Arc::clone(&call.handler)),
            "off" => self.off(&call.target, Some(&call.handler)),
            other => debug!(verb = other, "ignoring malformed listener call"),
        }
    }

    /// A point-in-time copy of the records for a class, in registration
    /// order. Dispatch iterates this copy so the registry can be mutated
    /// while listeners run.
    pub fn listeners(&self, class: &str) -> Vec<ListenerRecord> {
        self.callbacks
            .read()
            .ok()
            .and_then(|callbacks| callbacks.get(class).cloned())
            .unwrap_or_default()
    }

    /// Number of listeners registered for a class.
    pub fn count(&self, class: &str) -> usize {
        self.callbacks
            .read()
            .ok()
            .and_then(|callbacks| callbacks.get(class).map(|records| records.len()))
            .unwrap_or(0)
    }

    /// Removes every listener of every class.
    pub fn clear(&self) {
        if let Ok(mut callbacks) = self.callbacks.write() {
            callbacks.clear();
        }
    }
}

fn split_target(target: &str) -> (&str, Option<String>) {
    match target.split_once(':') {
        Some((class, key)) if !key.is_empty() => (class, Some(key.to_string())),
        Some((class, _)) => (class, None),
        None => (target, None),
    }
}
