//! DOM Node
//!
//! Nodes live in the [`DomTree`](crate::DomTree) arena and refer to each
//! other through [`NodeId`]s.

use crate::custom_elements::CustomElementState;
use crate::events::Listener;
use crate::{ElementInternals, NodeId, ShadowRoot};

/// DOM Node - Core structure
#[derive(Debug)]
pub struct Node {
    /// Parent node (None if detached or root)
    pub(crate) parent: Option<NodeId>,
    /// Child nodes in tree order
    pub(crate) children: Vec<NodeId>,
    /// Event listeners registered on this node
    pub(crate) listeners: Vec<Listener>,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    pub(crate) fn new(data: NodeData) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
            data,
        }
    }

    /// Parent node
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in tree order
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Get shadow root data if this is a shadow root
    #[inline]
    pub fn as_shadow_root(&self) -> Option<&ShadowRoot> {
        match &self.data {
            NodeData::ShadowRoot(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn as_shadow_root_mut(&mut self) -> Option<&mut ShadowRoot> {
        match &mut self.data {
            NodeData::ShadowRoot(s) => Some(s),
            _ => None,
        }
    }
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    /// Document root
    Document,
    /// Element
    Element(ElementData),
    /// Text content
    Text(String),
    /// Comment
    Comment(String),
    /// Document fragment; inserting it moves its children
    Fragment,
    /// Shadow root attached to a host element
    ShadowRoot(ShadowRoot),
}

/// Element-specific data
#[derive(Debug)]
pub struct ElementData {
    /// Lowercase local name
    pub(crate) tag: String,
    /// Attributes in insertion order
    pub(crate) attrs: Vec<Attribute>,
    /// Attached shadow root
    pub(crate) shadow_root: Option<NodeId>,
    /// Role, ARIA and custom states
    pub(crate) internals: ElementInternals,
    /// `value` property, falls back to the attribute when unset
    pub(crate) value: Option<String>,
    /// Custom element definition and reactions once upgraded
    pub(crate) custom: Option<CustomElementState>,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            shadow_root: None,
            internals: ElementInternals::new(),
            value: None,
            custom: None,
        }
    }

    /// Tag name (lowercase)
    pub fn tag_name(&self) -> &str {
        &self.tag
    }

    /// Get an attribute value
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    /// Check attribute presence
    pub fn has_attr(&self, name: &str) -> bool {
        self.get_attr(name).is_some()
    }

    /// Set an attribute, returning the previous value
    pub fn set_attr(&mut self, name: &str, value: &str) -> Option<String> {
        for attr in self.attrs.iter_mut() {
            if attr.name.eq_ignore_ascii_case(name) {
                return Some(std::mem::replace(&mut attr.value, value.to_string()));
            }
        }
        self.attrs.push(Attribute {
            name: name.to_ascii_lowercase(),
            value: value.to_string(),
        });
        None
    }

    /// Remove an attribute, returning its value
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|a| a.name.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(pos).value)
    }

    /// Attributes in insertion order
    pub fn attributes(&self) -> &[Attribute] {
        &self.attrs
    }

    /// Attached shadow root
    pub fn shadow_root(&self) -> Option<NodeId> {
        self.shadow_root
    }

    pub fn internals(&self) -> &ElementInternals {
        &self.internals
    }

    pub fn internals_mut(&mut self) -> &mut ElementInternals {
        &mut self.internals
    }

    /// Whether a custom element definition has been applied
    pub fn is_custom(&self) -> bool {
        self.custom.is_some()
    }

    /// Observed attribute check for the applied definition
    pub(crate) fn observes(&self, name: &str) -> bool {
        self.custom.as_ref()
            .map(|c| c.definition.observes(name))
            .unwrap_or(false)
    }
}

/// Attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}
