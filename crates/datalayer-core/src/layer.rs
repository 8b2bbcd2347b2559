//! The data layer composition root.
//!
//! Owns the store, the early-call queue, the event manager, and the set of
//! registered integrations, and runs the lifecycle that ties them
//! together: integrations register before `initialize`, get wired in as
//! event-class listeners, and from then on receive every dispatched event.

use std::sync::Arc;

use tracing::{debug, info};

use datalayer_events::{
    CallQueue, EventManager, ListenerArgs, ManagerConfig, EVENT_CLASS,
};
use datalayer_integrations::{Integration, IntegrationRegistry};
use datalayer_models::{Event, Store};

use crate::error::{DataLayerError, Result};

/// The data layer: shared state, event distribution, and integrations.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use datalayer_core::DataLayer;
/// use datalayer_integrations::RecordingIntegration;
/// use datalayer_models::Event;
///
/// # #[tokio::main] async fn main() {
/// let mut layer = DataLayer::new();
/// layer
///     .add_integration(Arc::new(RecordingIntegration::new("recorder")))
///     .unwrap();
/// layer.initialize().unwrap();
///
/// layer.store().push_event(Event::new().with("action", "Added Product"));
/// # }
/// ```
pub struct DataLayer {
    store: Arc<Store>,
    queue: Arc<CallQueue>,
    manager: EventManager,
    integrations: IntegrationRegistry,
    initialized: bool,
}

impl DataLayer {
    /// Creates a data layer over a fresh empty store and queue.
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    /// Creates a data layer with an explicit event manager configuration.
    pub fn with_config(config: ManagerConfig) -> Self {
        Self::from_parts(Arc::new(Store::new()), Arc::new(CallQueue::new()), config)
    }

    /// Binds a data layer to existing page state: a store (possibly holding
    /// early events) and a queue of early registration calls.
    pub fn from_parts(store: Arc<Store>, queue: Arc<CallQueue>, config: ManagerConfig) -> Self {
        let manager = EventManager::with_config(Arc::clone(&store), Arc::clone(&queue), config);
        Self {
            store,
            queue,
            manager,
            integrations: IntegrationRegistry::new(),
            initialized: false,
        }
    }

    /// Registers an integration. Only allowed before `initialize`.
    pub fn add_integration(&mut self, integration: Arc<dyn Integration>) -> Result<()> {
        if self.initialized {
            return Err(DataLayerError::IntegrationAfterInitialize(
                integration.name().to_string(),
            ));
        }
        debug!(integration = integration.name(), "registering integration");
        self.integrations.register(integration);
        Ok(())
    }

    /// Gets a registered integration by name.
    pub fn get_integration(&self, name: &str) -> Option<Arc<dyn Integration>> {
        self.integrations.get(name)
    }

    /// Initializes the data layer.
    ///
    /// Initializes every integration and subscribes its `track_event` as an
    /// event-class listener, then initializes the event manager. Events
    /// appended before this call replay into the integrations too.
    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Err(DataLayerError::AlreadyInitialized);
        }

        info!(
            integrations = self.integrations.len(),
            "initializing data layer"
        );

        for integration in self.integrations.all() {
            integration.initialize();

            let target = Arc::clone(&integration);
            self.manager.on(
                EVENT_CLASS,
                Arc::new(move |args| {
                    if let ListenerArgs::Event(event) = args {
                        target.track_event(&event);
                    }
                }),
            );
        }

        self.manager.initialize()?;
        self.initialized = true;

        Ok(())
    }

    /// Resets the data layer: stops the event manager, resets and drops
    /// every integration, and re-arms `initialize`.
    pub fn reset(&mut self) {
        info!("resetting data layer");

        self.manager.reset();
        for integration in self.integrations.all() {
            integration.reset();
        }
        self.integrations.clear();
        self.initialized = false;
    }

    /// True between a successful `initialize` and the next `reset`.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Appends an event to the store's sequence.
    pub fn push_event(&self, event: Event) {
        self.store.push_event(event);
    }

    /// The shared store, for host code and integrations to read and mutate.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// The early-call queue, for host code to append registrations.
    pub fn queue(&self) -> &Arc<CallQueue> {
        &self.queue
    }

    /// The underlying event manager.
    pub fn event_manager(&self) -> &EventManager {
        &self.manager
    }
}

impl Default for DataLayer {
    fn default() -> Self {
        Self::new()
    }
}
