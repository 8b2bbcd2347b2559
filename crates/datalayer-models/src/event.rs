//! Event records appended to the store's event sequence.
//!
//! Events are open mappings: applications attach whatever fields describe
//! the occurrence (`action`, `category`, ...). The manager owns two more
//! fields, `time` and `hasFired`, which it sets when the event is
//! dispatched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A discrete occurrence broadcast once to interested listeners.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Event {
    /// Milliseconds since epoch, assigned at fire time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,

    /// False until the event has been dispatched, then permanently true.
    #[serde(rename = "hasFired", default, skip_serializing_if = "is_false")]
    pub has_fired: bool,

    /// Application-defined fields.
    #[serde(flatten)]
    fields: Map<String, Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Event {
    /// Creates an empty event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field assignment.
    ///
    /// ```
    /// use datalayer_models::Event;
    ///
    /// let event = Event::new()
    ///     .with("action", "Added Product")
    ///     .with("category", "Ecommerce");
    /// assert_eq!(event.get("action").and_then(|v| v.as_str()), Some("Added Product"));
    /// ```
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Builds an event from an arbitrary JSON value.
    ///
    /// Objects are absorbed field by field; `time` and `hasFired` keys are
    /// recognized as the manager-owned fields. Any other value yields an
    /// empty event.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut map) => {
                let time = map.remove("time").and_then(|v| v.as_i64());
                let has_fired = map
                    .remove("hasFired")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                Self {
                    time,
                    has_fired,
                    fields: map,
                }
            }
            _ => Self::new(),
        }
    }

    /// Returns the event as a JSON value, manager-owned fields included.
    pub fn to_value(&self) -> Value {
        let mut map = self.fields.clone();
        if let Some(time) = self.time {
            map.insert("time".to_string(), Value::from(time));
        }
        if self.has_fired {
            map.insert("hasFired".to_string(), Value::Bool(true));
        }
        Value::Object(map)
    }

    /// Gets an application-defined field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Sets an application-defined field.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// The event's `name` field, when present.
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    /// All application-defined fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_event_is_unfired() {
        let event = Event::new();
        assert_eq!(event.time, None);
        assert!(!event.has_fired);
        assert!(event.fields().is_empty());
    }

    #[test]
    fn test_builder_fields() {
        let event = Event::new()
            .with("action", "Added Product")
            .with("quantity", 2);

        assert_eq!(event.get("action"), Some(&json!("Added Product")));
        assert_eq!(event.get("quantity"), Some(&json!(2)));
        assert_eq!(event.get("missing"), None);
    }

    #[test]
    fn test_from_value_object() {
        let event = Event::from_value(json!({
            "name": "Viewed Page",
            "time": 1000,
            "hasFired": true
        }));

        assert_eq!(event.name(), Some("Viewed Page"));
        assert_eq!(event.time, Some(1000));
        assert!(event.has_fired);
        // Manager-owned keys are lifted out of the open mapping.
        assert_eq!(event.get("time"), None);
        assert_eq!(event.get("hasFired"), None);
    }

    #[test]
    fn test_from_value_non_object() {
        let event = Event::from_value(json!("not an object"));
        assert!(event.fields().is_empty());
        assert!(!event.has_fired);
    }

    #[test]
    fn test_serialization_is_flat() {
        let mut event = Event::new().with("action", "Click");
        event.time = Some(42);
        event.has_fired = true;

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({"action": "Click", "time": 42, "hasFired": true})
        );
    }

    #[test]
    fn test_unfired_event_omits_manager_fields() {
        let event = Event::new().with("action", "Click");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value, json!({"action": "Click"}));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut event = Event::new().with("category", "Ecommerce");
        event.time = Some(1234567890);
        event.has_fired = true;

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        assert_eq!(event, deserialized);
    }

    #[test]
    fn test_to_value_matches_serde() {
        let mut event = Event::new().with("action", "Click");
        event.time = Some(7);

        assert_eq!(event.to_value(), serde_json::to_value(&event).unwrap());
    }
}
