//! The integration contract.
//!
//! An integration is a vendor-facing plugin that reacts to data-layer
//! events. Integrations are registered with the composition root before
//! initialization and receive every dispatched event through
//! `track_event`, addressed only through this trait.

use datalayer_models::Event;

/// A third-party integration reacting to data-layer events.
///
/// # Example
///
/// ```
/// use datalayer_integrations::Integration;
/// use datalayer_models::Event;
///
/// struct ConsoleIntegration;
///
/// impl Integration for ConsoleIntegration {
///     fn name(&self) -> &str {
///         "console"
///     }
///
///     fn initialize(&self) {}
///
///     fn is_loaded(&self) -> bool {
///         true
///     }
///
///     fn track_event(&self, event: &Event) {
///         println!("tracked: {:?}", event.name());
///     }
/// }
/// ```
pub trait Integration: Send + Sync {
    /// Unique integration name, used for registry lookups.
    fn name(&self) -> &str;

    /// Called once when the data layer initializes, before any event is
    /// delivered.
    fn initialize(&self);

    /// True once the integration's vendor assets are ready.
    fn is_loaded(&self) -> bool;

    /// Receives one dispatched event.
    fn track_event(&self, event: &Event);

    /// Records a page view.
    fn track_page(&self) {}

    /// Clears integration state when the data layer resets.
    fn reset(&self) {}
}
