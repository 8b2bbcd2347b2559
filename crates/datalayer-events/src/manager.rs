//! The event manager facade.
//!
//! Composition root for the event core: owns the listener registry and
//! change detector, binds to a caller-supplied store and early-call queue,
//! and drives the lifecycle: replay, live interception, and the
//! change-detection ticker.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

use datalayer_models::{Event, Store};

use crate::config::ManagerConfig;
use crate::detector::{ChangeDetector, ErrorCallback};
use crate::dispatcher;
use crate::error::{EventError, Result};
use crate::queue::CallQueue;
use crate::registry::{Handler, ListenerCall, ListenerRegistry};

/// Manages event dispatch and change detection over a shared store.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use datalayer_events::{EventManager, ListenerArgs};
/// use datalayer_models::Event;
///
/// # #[tokio::main] async fn main() {
/// let mut manager = EventManager::default();
/// manager.initialize().unwrap();
///
/// manager.on("event", Arc::new(|args| {
///     if let ListenerArgs::Event(event) = args {
///         println!("fired: {:?}", event.name());
///     }
/// }));
///
/// manager.push_event(Event::new().with("name", "Viewed Page"));
/// # }
/// ```
pub struct EventManager {
    store: Arc<Store>,
    queue: Arc<CallQueue>,
    registry: Arc<ListenerRegistry>,
    detector: Arc<ChangeDetector>,
    config: ManagerConfig,
    ticker: Option<JoinHandle<()>>,
    shutdown_tx: Option<watch::Sender<bool>>,
    initialized: bool,
}

impl EventManager {
    /// Binds a manager to a caller-supplied store and early-call queue.
    ///
    /// The change-detection baseline is the store's state at this moment.
    pub fn new(store: Arc<Store>, queue: Arc<CallQueue>) -> Self {
        Self::with_config(store, queue, ManagerConfig::default())
    }

    /// Binds a manager with an explicit configuration.
    pub fn with_config(store: Arc<Store>, queue: Arc<CallQueue>, config: ManagerConfig) -> Self {
        let detector = Arc::new(ChangeDetector::new(store.snapshot()));
        Self {
            store,
            queue,
            registry: Arc::new(ListenerRegistry::new()),
            detector,
            config,
            ticker: None,
            shutdown_tx: None,
            initialized: false,
        }
    }

    /// Starts the manager.
    ///
    /// In order: replays every queued registration call; routes subsequent
    /// queue appends straight into the registry; fires events appended
    /// before initialization; routes subsequent event appends through
    /// synchronous dispatch; starts the change-detection ticker.
    ///
    /// Returns [`EventError::AlreadyInitialized`] when called twice without
    /// an intervening [`reset`](Self::reset). Must be called within a tokio
    /// runtime.
    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Err(EventError::AlreadyInitialized);
        }

        info!(
            queued_calls = self.queue.len(),
            stored_events = self.store.events().len(),
            "initializing event manager"
        );

        // Registrations queued before the manager existed.
        for call in self.queue.entries() {
            self.registry.add_callback(&call);
        }
        let registry = Arc::clone(&self.registry);
        self.queue
            .install_hook(Arc::new(move |call| registry.add_callback(call)));

        // Events appended before the manager existed.
        dispatcher::fire_unfired_events(&self.registry, self.store.events());
        let registry = Arc::clone(&self.registry);
        self.store.events().install_hook(Arc::new(move |event| {
            dispatcher::fire_event(&registry, event);
        }));

        self.spawn_ticker();
        self.initialized = true;

        Ok(())
    }

    /// Stops the manager: halts the ticker, restores plain appends on the
    /// queue and event sequence, and clears every registered listener.
    /// [`initialize`](Self::initialize) may be called again afterwards.
    pub fn reset(&mut self) {
        info!("resetting event manager");

        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(true);
        }
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }

        self.store.events().clear_hook();
        self.queue.clear_hook();
        self.registry.clear();
        self.initialized = false;
    }

    fn spawn_ticker(&mut self) {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let store = Arc::clone(&self.store);
        let registry = Arc::clone(&self.registry);
        let detector = Arc::clone(&self.detector);
        let poll_interval = self.config.poll_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = interval(poll_interval);
            // The first tick of `interval` completes immediately; consume
            // it so the first check happens one full period from now.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        detector.check(&store, &registry);
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            debug!("change ticker received shutdown signal");
                            break;
                        }
                    }
                }
            }
        });

        self.ticker = Some(handle);
        self.shutdown_tx = Some(shutdown_tx);
    }

    /// Registers a listener under `"<class>"` or `"<class>:<dotPath>"`.
    pub fn on(&self, class_and_key: &str, handler: Handler) {
        self.registry.on(class_and_key, handler);
    }

    /// Removes listeners; see
    /// [`ListenerRegistry::off`](crate::registry::ListenerRegistry::off).
    pub fn off(&self, class_and_key: &str, handler: Option<&Handler>) {
        self.registry.off(class_and_key, handler);
    }

    /// Applies a registration call; unknown verbs are ignored.
    pub fn add_callback(&self, call: &ListenerCall) {
        self.registry.add_callback(call);
    }

    /// Appends an event to the store's sequence. After initialization this
    /// dispatches synchronously before storing.
    pub fn push_event(&self, event: Event) {
        self.store.push_event(event);
    }

    /// Installs the pluggable callback for change-listener failures.
    pub fn set_error_callback(&self, callback: ErrorCallback) {
        self.detector.set_error_callback(callback);
    }

    /// True between a successful `initialize` and the next `reset`.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The bound store.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// The bound early-call queue.
    pub fn queue(&self) -> &Arc<CallQueue> {
        &self.queue
    }

    /// The manager's configuration.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }
}

impl Default for EventManager {
    /// A manager over a fresh empty store and queue.
    fn default() -> Self {
        Self::new(Arc::new(Store::new()), Arc::new(CallQueue::new()))
    }
}

impl Drop for EventManager {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

// Keep the facade's own tests focused on lifecycle and replay; dispatch
// and detection details are covered in their modules.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ListenerArgs;
    use chrono::Utc;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn counting_handler() -> (Handler, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let handler: Handler = Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (handler, count)
    }

    fn event_recorder() -> (Handler, Arc<Mutex<Vec<Event>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: Handler = Arc::new(move |args| {
            if let ListenerArgs::Event(event) = args {
                sink.lock().unwrap().push(event);
            }
        });
        (handler, seen)
    }

    #[tokio::test]
    async fn test_double_initialize_fails() {
        let mut manager = EventManager::default();

        assert!(manager.initialize().is_ok());
        assert!(matches!(
            manager.initialize(),
            Err(EventError::AlreadyInitialized)
        ));
    }

    #[tokio::test]
    async fn test_initialize_after_reset_succeeds() {
        let mut manager = EventManager::default();

        manager.initialize().unwrap();
        manager.reset();
        assert!(manager.initialize().is_ok());
    }

    #[tokio::test]
    async fn test_event_gets_time_and_has_fired() {
        let mut manager = EventManager::default();
        manager.initialize().unwrap();

        let before = Utc::now().timestamp_millis();
        manager.push_event(Event::new().with("action", "Added Product"));

        let events = manager.store().events().to_vec();
        assert_eq!(events.len(), 1);
        assert!(events[0].time.unwrap() >= before);
        assert!(events[0].has_fired);
    }

    #[tokio::test]
    async fn test_event_pushed_before_initialize_is_replayed() {
        let mut manager = EventManager::default();
        let (handler, seen) = event_recorder();

        manager.on("event", handler);
        manager.push_event(Event::new().with("action", "Added Product"));
        assert!(seen.lock().unwrap().is_empty());

        manager.initialize().unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].get("action"), Some(&json!("Added Product")));
    }

    #[tokio::test]
    async fn test_early_registration_and_early_event_replay_once() {
        let mut manager = EventManager::default();
        let (handler, seen) = event_recorder();

        manager
            .queue()
            .push(ListenerCall::on("event", handler));
        manager.push_event(Event::new().with("action", "Added Product"));

        manager.initialize().unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].get("action"), Some(&json!("Added Product")));
    }

    #[tokio::test]
    async fn test_queue_appends_after_initialize_register_immediately() {
        let mut manager = EventManager::default();
        manager.initialize().unwrap();

        let (handler, seen) = event_recorder();
        manager.queue().push(ListenerCall::on("event", handler));

        manager.push_event(Event::new().with("category", "Ecommerce"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].get("category"), Some(&json!("Ecommerce")));
    }

    #[tokio::test]
    async fn test_dispatch_is_synchronous_and_ordered() {
        let mut manager = EventManager::default();
        manager.initialize().unwrap();

        let order = Arc::new(Mutex::new(Vec::new()));
        for label in ["L1", "L2"] {
            let order = Arc::clone(&order);
            manager.on("event", Arc::new(move |_| order.lock().unwrap().push(label)));
        }

        manager.push_event(Event::new());
        // Listeners ran before push_event returned.
        assert_eq!(*order.lock().unwrap(), vec!["L1", "L2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_fires_within_one_period() {
        let mut manager = EventManager::default();
        manager.initialize().unwrap();

        let (handler, count) = counting_handler();
        manager.on("change", handler);

        manager.store().set("test2", "test2");
        tokio::time::sleep(Duration::from_millis(101)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reverted_mutation_never_fires() {
        // The baseline is taken at construction, so seed the store first.
        let store = Arc::new(Store::new());
        store.set("test", "test");
        let mut manager = EventManager::new(store, Arc::new(CallQueue::new()));
        manager.initialize().unwrap();

        let (handler, count) = counting_handler();
        manager.on("change", handler);

        // Mutate and revert within one polling window.
        manager.store().set("test", "changed");
        tokio::time::sleep(Duration::from_millis(50)).await;
        manager.store().set("test", "test");

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_fires_exactly_once_per_mutation() {
        let mut manager = EventManager::default();
        manager.initialize().unwrap();

        let (handler, count) = counting_handler();
        manager.on("change", handler);

        manager.store().set("test2", "test2");
        tokio::time::sleep(Duration::from_millis(500)).await;

        // Later ticks compare against the rebaselined snapshot.
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_append_does_not_trigger_change() {
        let mut manager = EventManager::default();
        manager.initialize().unwrap();

        let (handler, count) = counting_handler();
        manager.on("change", handler);

        manager.push_event(Event::new().with("name", "Test Event"));
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_stops_change_detection() {
        let mut manager = EventManager::default();
        manager.initialize().unwrap();

        let (handler, count) = counting_handler();
        manager.on("change", handler);
        manager.reset();

        manager.store().set("test2", "test2");
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reset_restores_plain_append() {
        let mut manager = EventManager::default();
        let (handler, seen) = event_recorder();
        manager.queue().push(ListenerCall::on("event", handler));

        manager.initialize().unwrap();
        manager.reset();

        // Not dispatched, but stored.
        manager.push_event(Event::new().with("n", 1));
        assert_eq!(seen.lock().unwrap().len(), 0);
        assert_eq!(manager.store().events().len(), 1);
        assert!(!manager.store().events().to_vec()[0].has_fired);
    }

    #[tokio::test]
    async fn test_full_lifecycle_behaves_like_fresh_manager() {
        let mut manager = EventManager::default();
        let (handler, seen) = event_recorder();
        manager.queue().push(ListenerCall::on("event", handler));

        manager.initialize().unwrap();
        manager.push_event(Event::new().with("n", 1));
        manager.reset();
        manager.initialize().unwrap();

        // The queued registration was replayed once into the cleared
        // registry: exactly one more invocation per new event.
        manager.push_event(Event::new().with("n", 2));

        let ns: Vec<_> = seen
            .lock()
            .unwrap()
            .iter()
            .map(|event| event.get("n").cloned().unwrap())
            .collect();
        assert_eq!(ns, vec![json!(1), json!(2)]);
    }

    #[tokio::test]
    async fn test_event_listener_panic_propagates_to_pusher() {
        let mut manager = EventManager::default();
        manager.initialize().unwrap();

        manager.on("event", Arc::new(|_| panic!("broken integration")));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            manager.push_event(Event::new());
        }));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_binds_existing_store_state() {
        let store = Arc::new(Store::from_value(json!({
            "user": {"returning": false},
            "events": [{"name": "Early Event"}]
        })));
        let queue = Arc::new(CallQueue::new());

        let mut manager = EventManager::new(Arc::clone(&store), queue);
        let (handler, seen) = event_recorder();
        manager.on("event", handler);
        manager.initialize().unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].name(), Some("Early Event"));
        assert!(store.events().to_vec()[0].has_fired);
    }
}
