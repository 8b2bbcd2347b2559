//! Polling change detection over store snapshots.
//!
//! The store is an arbitrarily-shaped tree mutated directly by external
//! code, so there is no mutation hook to observe. Instead the detector
//! snapshots the tree on a fixed tick and compares it structurally against
//! the snapshot taken when listeners were last notified.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, trace};

use datalayer_models::{path, Snapshot, Store};

use crate::registry::{Handler, ListenerArgs, ListenerRegistry};

/// The callback class that receives change notifications.
pub const CHANGE_CLASS: &str = "change";

/// Callback receiving the message of a failed change listener.
pub type ErrorCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Snapshot-diff change detector.
///
/// Holds the last *reported* snapshot as its baseline: a tick that finds no
/// difference leaves the baseline untouched, so a later real change is
/// still detected against the state listeners last saw.
pub struct ChangeDetector {
    previous: Mutex<Snapshot>,
    error_callback: RwLock<Option<ErrorCallback>>,
}

impl ChangeDetector {
    /// Creates a detector with the given baseline snapshot.
    pub fn new(baseline: Snapshot) -> Self {
        Self {
            previous: Mutex::new(baseline),
            error_callback: RwLock::new(None),
        }
    }

    /// Installs the pluggable callback for change-listener failures.
    /// Without one, failures are swallowed.
    pub fn set_error_callback(&self, callback: ErrorCallback) {
        if let Ok(mut slot) = self.error_callback.write() {
            *slot = Some(callback);
        }
    }

    /// One detection round: snapshot, compare, fire, rebaseline.
    ///
    /// Skips all work while no change-class listener is registered.
    pub fn check(&self, store: &Store, registry: &ListenerRegistry) {
        if registry.count(CHANGE_CLASS) == 0 {
            return;
        }

        let current = store.snapshot();
        let previous = match self.previous.lock() {
            Ok(previous) => previous.clone(),
            Err(_) => return,
        };
        if current == previous {
            return;
        }

        trace!("store changed, firing change listeners");
        self.fire_change(registry, &previous, &current);

        if let Ok(mut baseline) = self.previous.lock() {
            *baseline = current;
        }
    }

    /// Fires every change-class listener for one detection round.
    ///
    /// Scoped listeners fire only when their path's resolved value differs
    /// between the snapshots, and receive `(new, previous)`. Unscoped
    /// listeners fire unconditionally with no arguments.
    fn fire_change(&self, registry: &ListenerRegistry, previous: &Snapshot, current: &Snapshot) {
        for record in registry.listeners(CHANGE_CLASS) {
            let args = match &record.key {
                Some(key) => {
                    let previous_value = path::resolve_in(previous, key);
                    let new_value = path::resolve_in(current, key);
                    if new_value == previous_value {
                        continue;
                    }
                    ListenerArgs::Change {
                        new_value,
                        previous_value,
                    }
                }
                None => ListenerArgs::None,
            };
            self.invoke(&record.handler, args);
        }
    }

    /// Invokes one listener, isolating panics so siblings still run and
    /// nothing propagates out of the tick.
    fn invoke(&self, handler: &Handler, args: ListenerArgs) {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| handler(args))) {
            let message = panic_message(payload.as_ref());
            debug!(error = %message, "change listener failed");
            let callback = self
                .error_callback
                .read()
                .ok()
                .and_then(|slot| slot.as_ref().map(Arc::clone));
            if let Some(callback) = callback {
                callback(&message);
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "change listener panicked".to_string()
    }
}
