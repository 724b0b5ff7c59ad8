//! DOMStringMap (dataset)
//!
//! Naming rules between camelCase dataset keys and `data-*` attributes,
//! plus a snapshot map of an element's data attributes.

use std::collections::BTreeMap;

use crate::Attribute;

/// Snapshot of an element's `data-*` attributes keyed by camelCase name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DOMStringMap {
    data: BTreeMap<String, String>,
}

impl DOMStringMap {
    /// Build from an element's attributes
    pub fn from_attributes(attrs: &[Attribute]) -> Self {
        let data = attrs.iter()
            .filter_map(|attr| {
                Self::key_for_attribute(&attr.name).map(|key| (key, attr.value.clone()))
            })
            .collect();
        Self { data }
    }

    /// Get value by camelCase key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(|s| s.as_str())
    }

    /// Check if key exists
    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(|s| s.as_str())
    }

    /// `userId` -> `data-user-id`
    pub fn to_attribute_name(key: &str) -> String {
        format!("data-{}", to_kebab_case(key))
    }

    /// `data-user-id` -> `userId`, None for non-data attributes
    pub fn key_for_attribute(name: &str) -> Option<String> {
        name.strip_prefix("data-")
            .filter(|rest| !rest.is_empty())
            .map(to_camel_case)
    }
}

/// Convert kebab-case to camelCase
pub fn to_camel_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = false;

    for c in s.chars() {
        if c == '-' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }

    result
}

/// Convert camelCase to kebab-case
pub fn to_kebab_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);

    for c in s.chars() {
        if c.is_ascii_uppercase() {
            result.push('-');
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }

    result
}
