//! Per-instance keyed data
//!
//! Values live in memory as JSON. A `data-<key>` attribute present on the
//! element seeds the store: the first access that finds it moves the value
//! into memory and removes the attribute, so a later write always wins
//! over markup. The attribute-backed accessors skip the memory tier and
//! read or write the attribute directly.

use std::collections::HashMap;

use kiln_dom::{DOMStringMap, DomError, NodeRef};
use serde_json::Value;

#[derive(Debug, Default, Clone)]
pub struct DataStore {
    values: HashMap<String, Value>,
}

/// Attribute text as a value: JSON when it parses, else a plain string
fn parse_attribute(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Value as attribute text: strings verbatim, everything else as JSON
fn format_attribute(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move a pending `data-<key>` attribute into memory
    fn migrate(&mut self, node: &NodeRef, key: &str) {
        let attr = DOMStringMap::to_attribute_name(key);
        let Some(text) = node.get_attribute(&attr) else {
            return;
        };
        self.values.insert(key.to_string(), parse_attribute(&text));
        if let Err(err) = node.remove_attribute(&attr) {
            tracing::warn!("Failed to consume {}: {}", attr, err);
        }
        tracing::trace!("Migrated {} into the data store", attr);
    }

    pub fn get(&mut self, node: &NodeRef, key: &str) -> Option<Value> {
        self.migrate(node, key);
        self.values.get(key).cloned()
    }

    /// Store `value`, discarding any pending `data-<key>` seed
    pub fn set(&mut self, node: &NodeRef, key: &str, value: Value) {
        let attr = DOMStringMap::to_attribute_name(key);
        if let Err(err) = node.remove_attribute(&attr) {
            tracing::warn!("Failed to discard {}: {}", attr, err);
        }
        self.values.insert(key.to_string(), value);
    }

    pub fn has(&mut self, node: &NodeRef, key: &str) -> bool {
        self.migrate(node, key);
        self.values.contains_key(key)
    }

    /// Take the value out, seeded or not
    pub fn remove(&mut self, node: &NodeRef, key: &str) -> Option<Value> {
        self.migrate(node, key);
        self.values.remove(key)
    }

    /// Read `data-<key>` without consuming it
    pub fn get_attribute(node: &NodeRef, key: &str) -> Option<Value> {
        node.get_attribute(&DOMStringMap::to_attribute_name(key))
            .map(|text| parse_attribute(&text))
    }

    /// Write `data-<key>` on the element, leaving memory untouched
    pub fn set_attribute(node: &NodeRef, key: &str, value: &Value) -> Result<(), DomError> {
        node.set_attribute(&DOMStringMap::to_attribute_name(key), &format_attribute(value))
    }
}
