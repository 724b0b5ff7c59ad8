//! Host helpers
//!
//! [`Host`] is the element-side surface handed to every component hook:
//! classes, attributes, inline style, text and markup, neighbour insertion,
//! events, an element factory and the keyed data store. Setters mirror
//! infallible DOM setters: failures are logged and the element keeps its
//! last good state.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use kiln_dom::{
    CustomStateSet, DOMTokenList, Document, DomError, Event, EventInit, ListenerId, NodeRef,
    WeakNodeRef,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::data_store::DataStore;
use crate::states::CustomStates;

fn warn_on_error(action: &str, result: Result<(), DomError>) {
    if let Err(err) = result {
        tracing::warn!("{} failed: {}", action, err);
    }
}

/// Content accepted by the insertion helpers
#[derive(Debug, Clone)]
pub enum Content {
    Text(String),
    Nodes(Vec<NodeRef>),
    /// Markup parsed into fresh nodes
    Html(String),
}

impl Content {
    pub fn html(markup: impl Into<String>) -> Self {
        Content::Html(markup.into())
    }

    fn into_nodes(self, doc: &Document) -> Vec<NodeRef> {
        match self {
            Content::Text(text) => vec![doc.create_text_node(&text)],
            Content::Nodes(nodes) => nodes,
            Content::Html(markup) => kiln_html::parse_fragment(doc, &markup),
        }
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<NodeRef> for Content {
    fn from(node: NodeRef) -> Self {
        Content::Nodes(vec![node])
    }
}

impl From<Vec<NodeRef>> for Content {
    fn from(nodes: Vec<NodeRef>) -> Self {
        Content::Nodes(nodes)
    }
}

/// Description of an element for [`Host::create_element`]
#[derive(Debug, Clone)]
pub struct ElementSpec {
    pub tag: String,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
    /// Written as `data-*` attributes
    pub data: Vec<(String, Value)>,
    pub child: Option<Content>,
}

impl ElementSpec {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            classes: Vec::new(),
            attributes: Vec::new(),
            data: Vec::new(),
            child: None,
        }
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.extend(class.split_whitespace().map(str::to_string));
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn data(mut self, key: &str, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => self.data.push((key.to_string(), value)),
            Err(err) => tracing::warn!("Skipping data {}: {}", key, err),
        }
        self
    }

    pub fn child(mut self, content: impl Into<Content>) -> Self {
        self.child = Some(content.into());
        self
    }
}

/// Element handle given to component hooks
#[derive(Clone)]
pub struct Host {
    node: NodeRef,
    data: Rc<RefCell<DataStore>>,
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host").field("node", &self.node).finish_non_exhaustive()
    }
}

impl Host {
    pub(crate) fn new(node: NodeRef, data: Rc<RefCell<DataStore>>) -> Self {
        Self { node, data }
    }

    /// Host over any element with its own data store
    pub fn for_node(node: NodeRef) -> Self {
        Self::new(node, Rc::default())
    }

    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    /// Handle that does not keep the document alive
    pub fn downgrade(&self) -> WeakHost {
        WeakHost { node: self.node.downgrade(), data: Rc::clone(&self.data) }
    }

    pub fn document(&self) -> &Document {
        self.node.document()
    }

    pub fn shadow_root(&self) -> Option<NodeRef> {
        self.node.shadow_root()
    }

    /// Where rendering goes: the shadow root when present, else the element
    pub fn container(&self) -> NodeRef {
        self.shadow_root().unwrap_or_else(|| self.node.clone())
    }

    // ------------------------------------------------------------------
    // Classes
    // ------------------------------------------------------------------

    fn update_classes(&self, f: impl FnOnce(&mut DOMTokenList) -> bool) -> bool {
        let mut list = self.node.class_list();
        let changed = f(&mut list);
        if changed {
            warn_on_error("class update", self.node.set_class_list(&list));
        }
        changed
    }

    pub fn add_class(&self, classes: &[&str]) -> &Self {
        self.update_classes(|list| list.add(classes));
        self
    }

    pub fn remove_class(&self, classes: &[&str]) -> &Self {
        self.update_classes(|list| list.remove(classes));
        self
    }

    /// Returns whether the class is present afterwards
    pub fn toggle_class(&self, class: &str, force: Option<bool>) -> bool {
        self.update_classes(|list| {
            let before = list.contains(class);
            list.toggle(class, force) != before
        });
        self.has_class(class)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.node.class_list().contains(class)
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    pub fn attr(&self, name: &str) -> Option<String> {
        self.node.get_attribute(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.node.has_attribute(name)
    }

    pub fn set_attr(&self, name: &str, value: &str) -> &Self {
        warn_on_error("set attribute", self.node.set_attribute(name, value));
        self
    }

    pub fn remove_attr(&self, name: &str) -> &Self {
        warn_on_error("remove attribute", self.node.remove_attribute(name).map(|_| ()));
        self
    }

    /// Returns whether the attribute is present afterwards
    pub fn toggle_attr(&self, name: &str, force: Option<bool>) -> bool {
        match self.node.toggle_attribute(name, force) {
            Ok(present) => present,
            Err(err) => {
                tracing::warn!("toggle attribute failed: {}", err);
                self.has_attr(name)
            }
        }
    }

    // ------------------------------------------------------------------
    // Style, text, markup, value
    // ------------------------------------------------------------------

    pub fn css(&self, property: &str) -> Option<String> {
        self.node.style().get_property_value(property).map(str::to_string)
    }

    /// Set an inline style property; an empty value removes it
    pub fn set_css(&self, property: &str, value: &str) -> &Self {
        let mut style = self.node.style();
        if value.is_empty() {
            style.remove_property(property);
        } else {
            style.set_property(property, value);
        }
        warn_on_error("set style", self.node.set_style(&style));
        self
    }

    pub fn text(&self) -> String {
        self.node.text_content()
    }

    pub fn set_text(&self, text: &str) -> &Self {
        warn_on_error("set text", self.node.set_text_content(text));
        self
    }

    pub fn html(&self) -> String {
        kiln_html::inner_html(&self.node)
    }

    pub fn set_html(&self, markup: &str) -> &Self {
        warn_on_error("set html", kiln_html::set_inner_html(&self.node, markup));
        self
    }

    pub fn value(&self) -> Option<String> {
        self.node.value()
    }

    pub fn set_value(&self, value: &str) -> &Self {
        warn_on_error("set value", self.node.set_value(value));
        self
    }

    // ------------------------------------------------------------------
    // Insertion
    // ------------------------------------------------------------------

    /// Append as last children
    pub fn append(&self, content: impl Into<Content>) -> &Self {
        for node in content.into().into_nodes(self.document()) {
            warn_on_error("append", self.node.append_child(&node));
        }
        self
    }

    /// Insert as first children, keeping their order
    pub fn prepend(&self, content: impl Into<Content>) -> &Self {
        let first = self.node.first_child();
        for node in content.into().into_nodes(self.document()) {
            warn_on_error("prepend", self.node.insert_before(&node, first.as_ref()));
        }
        self
    }

    /// Insert as preceding siblings
    pub fn before(&self, content: impl Into<Content>) -> &Self {
        let Some(parent) = self.node.parent() else {
            tracing::warn!("before: element has no parent");
            return self;
        };
        for node in content.into().into_nodes(self.document()) {
            warn_on_error("before", parent.insert_before(&node, Some(&self.node)));
        }
        self
    }

    /// Insert as following siblings
    pub fn after(&self, content: impl Into<Content>) -> &Self {
        let Some(parent) = self.node.parent() else {
            tracing::warn!("after: element has no parent");
            return self;
        };
        let next = self.node.next_sibling();
        for node in content.into().into_nodes(self.document()) {
            warn_on_error("after", parent.insert_before(&node, next.as_ref()));
        }
        self
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn on(&self, event_type: &str, handler: impl Fn(&mut Event) + 'static) -> ListenerId {
        self.node.add_event_listener(event_type, handler)
    }

    /// Remove every listener for `event_type`
    pub fn off(&self, event_type: &str) -> usize {
        self.node.remove_event_listeners(event_type)
    }

    pub fn off_listener(&self, listener: ListenerId) -> bool {
        self.node.remove_event_listener(listener)
    }

    /// Dispatch a bubbling, composed custom event carrying `detail`.
    ///
    /// Returns false when a listener prevented the default.
    pub fn trigger(&self, event_type: &str, detail: Value) -> bool {
        let mut event = Event::with_init(event_type, EventInit {
            bubbles: true,
            cancelable: true,
            composed: true,
            detail,
        });
        self.node.dispatch_event(&mut event)
    }

    // ------------------------------------------------------------------
    // Element factory
    // ------------------------------------------------------------------

    pub fn create_element(&self, spec: ElementSpec) -> NodeRef {
        let doc = self.document();
        let element = doc.create_element(&spec.tag);

        if !spec.classes.is_empty() {
            let classes: Vec<&str> = spec.classes.iter().map(String::as_str).collect();
            let mut list = DOMTokenList::default();
            list.add(&classes);
            warn_on_error("set classes", element.set_class_list(&list));
        }
        for (name, value) in &spec.attributes {
            warn_on_error("set attribute", element.set_attribute(name, value));
        }
        for (key, value) in &spec.data {
            warn_on_error("set data", DataStore::set_attribute(&element, key, value));
        }
        if let Some(child) = spec.child {
            for node in child.into_nodes(doc) {
                warn_on_error("append child", element.append_child(&node));
            }
        }
        element
    }

    pub fn span(&self, classes: &str, child: impl Into<Content>) -> NodeRef {
        self.create_element(ElementSpec::new("span").class(classes).child(child))
    }

    pub fn div(&self, classes: &str, child: impl Into<Content>) -> NodeRef {
        self.create_element(ElementSpec::new("div").class(classes).child(child))
    }

    /// `<slot>`, named when `name` is given
    pub fn slot(&self, name: Option<&str>) -> NodeRef {
        let spec = match name {
            Some(name) => ElementSpec::new("slot").attr("name", name),
            None => ElementSpec::new("slot"),
        };
        self.create_element(spec)
    }

    // ------------------------------------------------------------------
    // Data
    // ------------------------------------------------------------------

    /// Read a value, consuming a pending `data-<key>` attribute
    pub fn data_get(&self, key: &str) -> Option<Value> {
        self.data.borrow_mut().get(&self.node, key)
    }

    /// Typed read; None when missing or of another shape
    pub fn data_get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        serde_json::from_value(self.data_get(key)?).ok()
    }

    pub fn data_set(&self, key: &str, value: impl Serialize) -> &Self {
        match serde_json::to_value(value) {
            Ok(value) => self.data.borrow_mut().set(&self.node, key, value),
            Err(err) => tracing::warn!("data_set {} failed: {}", key, err),
        }
        self
    }

    pub fn data_has(&self, key: &str) -> bool {
        self.data.borrow_mut().has(&self.node, key)
    }

    pub fn data_remove(&self, key: &str) -> Option<Value> {
        self.data.borrow_mut().remove(&self.node, key)
    }

    /// Read `data-<key>` directly, leaving it in place
    pub fn data_attr_get(&self, key: &str) -> Option<Value> {
        DataStore::get_attribute(&self.node, key)
    }

    /// Write `data-<key>` directly
    pub fn data_attr_set(&self, key: &str, value: impl Serialize) -> &Self {
        match serde_json::to_value(value) {
            Ok(value) => warn_on_error("data attribute", DataStore::set_attribute(&self.node, key, &value)),
            Err(err) => tracing::warn!("data_attr_set {} failed: {}", key, err),
        }
        self
    }
}

/// Non-owning [`Host`].
///
/// The document owns every component through its element, so a component
/// that keeps a strong [`Host`] or [`NodeRef`] keeps its own document
/// alive. Components store this (and [`WeakNodeRef`]) instead.
#[derive(Clone)]
pub struct WeakHost {
    node: WeakNodeRef,
    data: Rc<RefCell<DataStore>>,
}

impl fmt::Debug for WeakHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakHost").field("node", &self.node).finish_non_exhaustive()
    }
}

impl WeakHost {
    /// The host, while its document is alive
    pub fn upgrade(&self) -> Option<Host> {
        Some(Host::new(self.node.upgrade()?, Rc::clone(&self.data)))
    }
}

impl CustomStates for Host {
    fn with_states<R>(&self, f: impl FnOnce(&mut CustomStateSet) -> R) -> R {
        self.node.with_custom_states(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    fn host() -> Host {
        let doc = Document::new();
        let el = doc.create_element("div");
        doc.body().append_child(&el).unwrap();
        Host::for_node(el)
    }

    #[test]
    fn test_classes() {
        let host = host();
        host.add_class(&["a", "b"]).remove_class(&["a"]);
        assert!(host.has_class("b"));
        assert!(!host.has_class("a"));
        assert!(host.toggle_class("c", None));
        assert!(!host.toggle_class("c", None));
        assert!(host.toggle_class("b", Some(true)));
        assert_eq!(host.attr("class").as_deref(), Some("b"));
    }

    #[test]
    fn test_attributes_and_style() {
        let host = host();
        host.set_attr("title", "x").set_css("color", "red").set_css("width", "2px");
        assert_eq!(host.attr("title").as_deref(), Some("x"));
        assert_eq!(host.css("color").as_deref(), Some("red"));

        host.set_css("color", "");
        assert_eq!(host.attr("style").as_deref(), Some("width: 2px;"));
        assert!(host.toggle_attr("disabled", None));
        host.remove_attr("title");
        assert!(!host.has_attr("title"));
    }

    #[test]
    fn test_text_html_value() {
        let host = host();
        host.set_html("<b>bold</b> text");
        assert_eq!(host.text(), "bold text");
        assert_eq!(host.html(), "<b>bold</b> text");

        host.set_text("plain");
        assert_eq!(host.html(), "plain");

        assert_eq!(host.value(), None);
        host.set_value("42");
        assert_eq!(host.value().as_deref(), Some("42"));
    }

    #[test]
    fn test_insertion() {
        let host = host();
        host.append("b").prepend("a").append(Content::html("<i>c</i>"));
        assert_eq!(host.html(), "ab<i>c</i>");

        host.before("<").after(">");
        let parent = host.node().parent().unwrap();
        assert_eq!(parent.text_content(), "<abc>");
    }

    #[test]
    fn test_prepend_keeps_order() {
        let host = host();
        host.append("z");
        host.prepend(Content::html("<i>x</i><i>y</i>"));
        assert_eq!(host.html(), "<i>x</i><i>y</i>z");
    }

    #[test]
    fn test_trigger_bubbles_to_document() {
        let host = host();
        let seen = Rc::new(Cell::new(0));
        let s = Rc::clone(&seen);
        host.document().root().add_event_listener("select", move |e| {
            if e.detail["id"] == 3 {
                s.set(s.get() + 1);
            }
        });
        assert!(host.trigger("select", json!({ "id": 3 })));
        assert_eq!(seen.get(), 1);

        host.on("select", |e| e.prevent_default());
        assert!(!host.trigger("select", json!({ "id": 3 })));
        assert_eq!(host.off("select"), 1);
        assert!(host.trigger("select", Value::Null));
    }

    #[test]
    fn test_create_element() {
        let host = host();
        let el = host.create_element(
            ElementSpec::new("button")
                .class("primary large")
                .attr("type", "button")
                .data("itemId", 7)
                .child("Go"),
        );
        assert_eq!(
            kiln_html::outer_html(&el),
            "<button class=\"primary large\" type=\"button\" data-item-id=\"7\">Go</button>"
        );

        let slot = host.slot(Some("icon"));
        assert_eq!(slot.get_attribute("name").as_deref(), Some("icon"));
        assert_eq!(host.span("label", "hi").text_content(), "hi");
        assert_eq!(host.div("", Content::Nodes(Vec::new())).children().len(), 0);
    }

    #[test]
    fn test_data_paths() {
        let host = host();
        host.set_attr("data-count", "3");
        assert!(host.data_has("count"));
        assert!(!host.has_attr("data-count"));
        assert_eq!(host.data_get_as::<u32>("count"), Some(3));

        host.data_set("tags", vec!["a", "b"]);
        assert_eq!(host.data_get("tags"), Some(json!(["a", "b"])));
        assert_eq!(host.data_remove("tags"), Some(json!(["a", "b"])));

        host.data_attr_set("mode", "compact");
        assert_eq!(host.data_attr_get("mode"), Some(json!("compact")));
        assert!(host.has_attr("data-mode"));
    }

    #[test]
    fn test_weak_host_shares_data_and_releases_document() {
        let weak = {
            let host = host();
            host.data_set("mode", "compact");
            let weak = host.downgrade();

            let upgraded = weak.upgrade().unwrap();
            assert_eq!(upgraded.node(), host.node());
            assert_eq!(upgraded.data_get("mode"), Some(json!("compact")));
            weak
        };
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_states_through_host() {
        let host = host();
        host.add_state("open");
        assert!(host.node().has_state("open"));
    }
}
