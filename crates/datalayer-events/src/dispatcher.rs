//! Synchronous event dispatch.

use chrono::Utc;
use tracing::trace;

use datalayer_models::{Event, EventSequence};

use crate::registry::{ListenerArgs, ListenerRegistry};

/// The callback class that receives event notifications.
pub const EVENT_CLASS: &str = "event";

/// Fires a single event to every event-class listener.
///
/// Sets the event's `time`, invokes each listener in registration order
/// with an independent copy of the event (key scoping does not apply to
/// events), then marks the event fired. Listener panics are not caught and
/// unwind to the caller that appended the event.
pub fn fire_event(registry: &ListenerRegistry, event: &mut Event) {
    event.time = Some(Utc::now().timestamp_millis());

    let records = registry.listeners(EVENT_CLASS);
    trace!(listeners = records.len(), "firing event");
    for record in records {
        (record.handler)(ListenerArgs::Event(event.clone()));
    }

    event.has_fired = true;
}

/// Fires every stored event that has not yet been dispatched, in sequence
/// order.
///
/// Used once at initialization to catch up on events appended before any
/// listener could observe them.
pub fn fire_unfired_events(registry: &ListenerRegistry, events: &EventSequence) {
    events.replay(|event| {
        if !event.has_fired {
            fire_event(registry, event);
        }
    });
}
