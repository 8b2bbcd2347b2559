//! The early-call queue.
//!
//! Host pages register listeners before the manager exists by appending
//! registration calls to this queue. At initialization the manager replays
//! every recorded call into the registry and installs a forwarding hook so
//! later appends register immediately while still being recorded.

use std::sync::{Arc, Mutex, RwLock};

use crate::registry::ListenerCall;

/// Hook run by the queue on each appended call.
pub type QueueHook = Arc<dyn Fn(&ListenerCall) + Send + Sync>;

/// Ordered queue of registration calls with an installable forwarding hook.
#[derive(Default)]
pub struct CallQueue {
    entries: Mutex<Vec<ListenerCall>>,
    hook: RwLock<Option<QueueHook>>,
}

impl CallQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a call, running the installed hook first.
    pub fn push(&self, call: ListenerCall) {
        let hook = self
            .hook
            .read()
            .ok()
            .and_then(|hook| hook.as_ref().map(Arc::clone));
        if let Some(hook) = hook {
            hook(&call);
        }
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(call);
        }
    }

    /// Installs the forwarding hook. Subsequent appends run through it.
    pub fn install_hook(&self, hook: QueueHook) {
        if let Ok(mut slot) = self.hook.write() {
            *slot = Some(hook);
        }
    }

    /// Removes the forwarding hook; appends return to plain records.
    pub fn clear_hook(&self) {
        if let Ok(mut slot) = self.hook.write() {
            *slot = None;
        }
    }

    /// A copy of every recorded call, in append order.
    pub fn entries(&self) -> Vec<ListenerCall> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Number of recorded calls.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// True when no calls are recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
