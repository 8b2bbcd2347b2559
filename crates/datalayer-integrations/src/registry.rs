//! Integration registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::traits::Integration;

/// Registry of integrations by name.
///
/// Integrations are stored as `Arc<dyn Integration>` so the composition
/// root can hand them to listener closures and keep its own reference.
#[derive(Default)]
pub struct IntegrationRegistry {
    integrations: HashMap<String, Arc<dyn Integration>>,
    order: Vec<String>,
}

impl IntegrationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an integration under its own name. A later registration
    /// with the same name replaces the earlier one.
    pub fn register(&mut self, integration: Arc<dyn Integration>) {
        let name = integration.name().to_string();
        if self.integrations.insert(name.clone(), integration).is_none() {
            self.order.push(name);
        }
    }

    /// Gets an integration by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Integration>> {
        self.integrations.get(name).cloned()
    }

    /// All integrations, in registration order.
    pub fn all(&self) -> Vec<Arc<dyn Integration>> {
        self.order
            .iter()
            .filter_map(|name| self.integrations.get(name).cloned())
            .collect()
    }

    /// All registered names, in registration order.
    pub fn list(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Number of registered integrations.
    pub fn len(&self) -> usize {
        self.integrations.len()
    }

    /// True when no integrations are registered.
    pub fn is_empty(&self) -> bool {
        self.integrations.is_empty()
    }

    /// Removes every integration.
    pub fn clear(&mut self) {
        self.integrations.clear();
        self.order.clear();
    }
}
