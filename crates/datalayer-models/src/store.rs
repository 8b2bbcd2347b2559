//! The shared state store: a mutable JSON tree plus the observed event
//! sequence.
//!
//! The store is handed out as `Arc<Store>` so the host application,
//! integrations, and the manager's change ticker can all read and mutate
//! the same state. Events live in a dedicated [`EventSequence`] rather than
//! inside the value tree, so snapshots exclude them by construction.

use std::sync::{Arc, Mutex, RwLock};

use serde_json::{Map, Value};

use crate::event::Event;
use crate::path;

/// A structural copy of the store's value tree, events excluded. Used as
/// the change-detection baseline.
pub type Snapshot = Map<String, Value>;

/// Hook run by the event sequence on each appended event, before the event
/// is stored.
pub type AppendHook = Arc<dyn Fn(&mut Event) + Send + Sync>;

/// Ordered, append-only event sequence with an installable append hook.
///
/// Append is an explicit method instead of a raw collection push: when the
/// manager is live it installs a hook here, and every appended event is fed
/// through dispatch before it is stored. With no hook installed appends are
/// plain stores.
#[derive(Default)]
pub struct EventSequence {
    entries: Mutex<Vec<Event>>,
    hook: RwLock<Option<AppendHook>>,
}

impl EventSequence {
    /// Creates an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    fn from_events(events: Vec<Event>) -> Self {
        Self {
            entries: Mutex::new(events),
            hook: RwLock::new(None),
        }
    }

    /// Appends an event, running the installed hook first.
    ///
    /// No internal lock is held while the hook runs, so a hook (or a
    /// listener it dispatches to) may freely append further events or read
    /// the store.
    pub fn push(&self, mut event: Event) {
        let hook = self
            .hook
            .read()
            .ok()
            .and_then(|hook| hook.as_ref().map(Arc::clone));
        if let Some(hook) = hook {
            hook(&mut event);
        }
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(event);
        }
    }

    /// Installs the append hook. Subsequent appends run through it.
    pub fn install_hook(&self, hook: AppendHook) {
        if let Ok(mut slot) = self.hook.write() {
            *slot = Some(hook);
        }
    }

    /// Removes the append hook; appends return to plain stores.
    pub fn clear_hook(&self) {
        if let Ok(mut slot) = self.hook.write() {
            *slot = None;
        }
    }

    /// Runs `f` over every stored event, outside the sequence lock.
    ///
    /// The entries are taken out, processed in order, and restored ahead of
    /// anything appended while `f` ran, so replayed events keep their
    /// original positions.
    pub fn replay<F: FnMut(&mut Event)>(&self, mut f: F) {
        let mut taken = match self.entries.lock() {
            Ok(mut entries) => std::mem::take(&mut *entries),
            Err(_) => return,
        };
        for event in taken.iter_mut() {
            f(event);
        }
        if let Ok(mut entries) = self.entries.lock() {
            let appended = std::mem::take(&mut *entries);
            *entries = taken;
            entries.extend(appended);
        }
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// True when no events are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A copy of all stored events, in append order.
    pub fn to_vec(&self) -> Vec<Event> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

/// The shared nested mapping representing application state.
#[derive(Default)]
pub struct Store {
    data: RwLock<Map<String, Value>>,
    events: EventSequence,
}

impl Store {
    /// Creates an empty store with an empty event sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from an existing JSON value, the shape handed over by
    /// the host page.
    ///
    /// An `events` key holding an array is absorbed into the event
    /// sequence; a malformed or missing `events` key is silently replaced
    /// by an empty sequence. Non-object input yields an empty store.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut map) => {
                let events = match map.remove("events") {
                    Some(Value::Array(items)) => {
                        items.into_iter().map(Event::from_value).collect()
                    }
                    _ => Vec::new(),
                };
                Self {
                    data: RwLock::new(map),
                    events: EventSequence::from_events(events),
                }
            }
            _ => Self::new(),
        }
    }

    /// Resolves a dot-path against the value tree.
    pub fn get(&self, path: &str) -> Option<Value> {
        let data = self.data.read().ok()?;
        path::resolve_in(&data, path)
    }

    /// Sets the value at a dot-path, creating intermediate objects.
    pub fn set(&self, path: &str, value: impl Into<Value>) {
        if let Ok(mut data) = self.data.write() {
            path::set_in(&mut data, path, value.into());
        }
    }

    /// Removes and returns the value at a dot-path.
    pub fn delete(&self, path: &str) -> Option<Value> {
        let mut data = self.data.write().ok()?;
        path::delete_in(&mut data, path)
    }

    /// Takes a structural copy of the value tree. Events are not part of
    /// the tree and are therefore excluded.
    pub fn snapshot(&self) -> Snapshot {
        self.data.read().map(|data| data.clone()).unwrap_or_default()
    }

    /// The store's event sequence.
    pub fn events(&self) -> &EventSequence {
        &self.events
    }

    /// Appends an event to the sequence.
    pub fn push_event(&self, event: Event) {
        self.events.push(event);
    }
}
