//! An in-memory integration that records everything it receives.
//!
//! Stands in for a vendor integration in tests of the wiring between the
//! data layer and its plugins.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use datalayer_models::Event;

use crate::traits::Integration;

/// Integration that keeps every tracked event in memory.
pub struct RecordingIntegration {
    name: String,
    loaded: AtomicBool,
    events: Mutex<Vec<Event>>,
    pages: AtomicUsize,
    resets: AtomicUsize,
}

impl RecordingIntegration {
    /// Creates a recorder with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            loaded: AtomicBool::new(false),
            events: Mutex::new(Vec::new()),
            pages: AtomicUsize::new(0),
            resets: AtomicUsize::new(0),
        }
    }

    /// Copies of every event tracked so far, in delivery order.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Number of page views tracked.
    pub fn pages(&self) -> usize {
        self.pages.load(Ordering::SeqCst)
    }

    /// Number of times `reset` was called.
    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl Integration for RecordingIntegration {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&self) {
        self.loaded.store(true, Ordering::SeqCst);
    }

    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    fn track_event(&self, event: &Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }

    fn track_page(&self) {
        self.pages.fetch_add(1, Ordering::SeqCst);
    }

    fn reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
        self.loaded.store(false, Ordering::SeqCst);
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_initialize_marks_loaded() {
        let integration = RecordingIntegration::new("recorder");
        assert!(!integration.is_loaded());

        integration.initialize();
        assert!(integration.is_loaded());
    }

    #[test]
    fn test_track_event_records_copies() {
        let integration = RecordingIntegration::new("recorder");
        integration.track_event(&Event::new().with("action", "Click"));

        let events = integration.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].get("action"), Some(&json!("Click")));
    }

    #[test]
    fn test_track_page_counts() {
        let integration = RecordingIntegration::new("recorder");
        integration.track_page();
        integration.track_page();
        assert_eq!(integration.pages(), 2);
    }

    #[test]
    fn test_reset_clears_state() {
        let integration = RecordingIntegration::new("recorder");
        integration.initialize();
        integration.track_event(&Event::new());

        integration.reset();

        assert!(!integration.is_loaded());
        assert!(integration.events().is_empty());
        assert_eq!(integration.resets(), 1);
    }
}
