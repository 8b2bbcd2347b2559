//! Dot-path access into JSON value trees.
//!
//! Paths address nested values with `.`-separated segments, e.g.
//! `user.returning` or `listing.items.0.id`. Numeric segments index into
//! arrays. The trailing segment `length` is a virtual path resolving to an
//! array's element count.

use serde_json::{Map, Value};

/// Resolves a dot-path against a value tree.
///
/// Returns a copy of the addressed value, or `None` when any segment is
/// missing. `length` as the final segment on an array resolves to the
/// array's length.
pub fn resolve(root: &Value, path: &str) -> Option<Value> {
    let mut current = root;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        match current {
            Value::Object(map) => {
                current = map.get(segment)?;
            }
            Value::Array(items) => {
                if segment == "length" && segments.peek().is_none() {
                    return Some(Value::from(items.len() as u64));
                }
                let index: usize = segment.parse().ok()?;
                current = items.get(index)?;
            }
            _ => return None,
        }
    }

    Some(current.clone())
}

/// Resolves a dot-path against a top-level mapping.
pub fn resolve_in(map: &Map<String, Value>, path: &str) -> Option<Value> {
    match path.split_once('.') {
        None => map.get(path).cloned(),
        Some((head, rest)) => resolve(map.get(head)?, rest),
    }
}

/// Sets the value at a dot-path, creating intermediate objects as needed.
///
/// Non-object intermediates (other than arrays indexed by a numeric
/// segment) are replaced with objects. Array writes only land on existing
/// indices or one past the end.
pub fn set(root: &mut Value, path: &str, value: Value) {
    match path.split_once('.') {
        None => match root {
            Value::Array(items) => {
                if let Ok(index) = path.parse::<usize>() {
                    if index < items.len() {
                        items[index] = value;
                    } else if index == items.len() {
                        items.push(value);
                    }
                }
            }
            _ => {
                as_object_mut(root).insert(path.to_string(), value);
            }
        },
        Some((head, rest)) => match root {
            Value::Array(items) => {
                if let Some(child) = head
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get_mut(index))
                {
                    set(child, rest, value);
                }
            }
            _ => {
                let child = as_object_mut(root)
                    .entry(head.to_string())
                    .or_insert(Value::Null);
                set(child, rest, value);
            }
        },
    }
}

/// Sets a dot-path inside a top-level mapping.
pub fn set_in(map: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            map.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = map.entry(head.to_string()).or_insert(Value::Null);
            set(child, rest, value);
        }
    }
}

/// Removes and returns the value at a dot-path. Only object members can be
/// removed; addressing into arrays or scalars returns `None`.
pub fn delete(root: &mut Value, path: &str) -> Option<Value> {
    match path.split_once('.') {
        None => root.as_object_mut()?.remove(path),
        Some((head, rest)) => delete(root.as_object_mut()?.get_mut(head)?, rest),
    }
}

/// Removes a dot-path from a top-level mapping.
pub fn delete_in(map: &mut Map<String, Value>, path: &str) -> Option<Value> {
    match path.split_once('.') {
        None => map.remove(path),
        Some((head, rest)) => delete(map.get_mut(head)?, rest),
    }
}

fn as_object_mut(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}
