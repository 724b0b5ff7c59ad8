//! Document - High-level document API
//!
//! [`Document`] is a shared handle over the tree and the custom element
//! registry. Every mutation that can wake a custom element goes through
//! here: the tree is updated under a short borrow, the affected reactions
//! are collected, the borrow is released, and only then are the reactions
//! invoked.

use std::any::TypeId;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::custom_elements::CustomElementState;
use crate::events::Listener;
use crate::{
    Attribute, CssStyleDeclaration, CustomElementDefinition, CustomElementReactions,
    CustomElementRegistry, CustomStateSet, DOMStringMap, DOMTokenList, DomError, DomTree, ElementInternals, Event,
    EventHandler, ListenerId, NodeData, NodeId, ShadowRootMode, StyleSheet,
};

struct DocumentInner {
    tree: RefCell<DomTree>,
    registry: RefCell<CustomElementRegistry>,
    next_listener: Cell<u64>,
    html: NodeId,
    head: NodeId,
    body: NodeId,
}

/// HTML Document handle (cheap to clone)
#[derive(Clone)]
pub struct Document {
    inner: Rc<DocumentInner>,
}

/// Deferred custom element reaction
enum Reaction {
    Upgrade(NodeId),
    Connected(Rc<dyn CustomElementReactions>),
    Disconnected(Rc<dyn CustomElementReactions>),
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.inner.tree.borrow().len())
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Create a document with `<html><head></head><body></body></html>`
    pub fn new() -> Self {
        let mut tree = DomTree::new();

        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        // Freshly created nodes; these inserts cannot fail
        let _ = tree.insert(tree.root(), html, None);
        let _ = tree.insert(html, head, None);
        let _ = tree.insert(html, body, None);

        Self {
            inner: Rc::new(DocumentInner {
                tree: RefCell::new(tree),
                registry: RefCell::new(CustomElementRegistry::new()),
                next_listener: Cell::new(1),
                html,
                head,
                body,
            }),
        }
    }

    /// Whether two handles refer to the same document
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn node_ref(&self, id: NodeId) -> NodeRef {
        NodeRef { doc: self.clone(), id }
    }

    /// Handle for an existing node
    pub fn node(&self, id: NodeId) -> Option<NodeRef> {
        self.inner.tree.borrow().get(id).map(|_| self.node_ref(id))
    }

    /// Document node
    pub fn root(&self) -> NodeRef {
        self.node_ref(NodeId::ROOT)
    }

    /// `<html>` element
    pub fn document_element(&self) -> NodeRef {
        self.node_ref(self.inner.html)
    }

    /// `<head>` element
    pub fn head(&self) -> NodeRef {
        self.node_ref(self.inner.head)
    }

    /// `<body>` element
    pub fn body(&self) -> NodeRef {
        self.node_ref(self.inner.body)
    }

    /// Read access to the tree
    pub fn with_tree<R>(&self, f: impl FnOnce(&DomTree) -> R) -> R {
        f(&self.inner.tree.borrow())
    }

    /// Create an element, upgrading it when its tag is defined
    pub fn create_element(&self, tag: &str) -> NodeRef {
        let node = self.create_plain_element(tag);
        self.upgrade(node.id);
        node
    }

    /// Create an element without upgrading it; see [`Document::upgrade`]
    pub fn create_plain_element(&self, tag: &str) -> NodeRef {
        let id = self.inner.tree.borrow_mut().create_element(tag);
        self.node_ref(id)
    }

    pub fn create_text_node(&self, text: &str) -> NodeRef {
        let id = self.inner.tree.borrow_mut().create_text(text);
        self.node_ref(id)
    }

    pub fn create_comment(&self, text: &str) -> NodeRef {
        let id = self.inner.tree.borrow_mut().create_comment(text);
        self.node_ref(id)
    }

    pub fn create_document_fragment(&self) -> NodeRef {
        let id = self.inner.tree.borrow_mut().create_fragment();
        self.node_ref(id)
    }

    /// Deep-copy a subtree of another tree into this document (not upgraded)
    pub fn import_subtree(&self, source: &DomTree, source_id: NodeId) -> Option<NodeRef> {
        let id = self.inner.tree.borrow_mut().import_subtree(source, source_id)?;
        Some(self.node_ref(id))
    }

    /// Register a definition; connected elements with that tag are upgraded
    pub fn define(&self, definition: CustomElementDefinition) -> Result<(), DomError> {
        let name = self.inner.registry.borrow_mut().define(definition)?.name.clone();
        tracing::debug!("Defined custom element <{}>", name);

        let candidates: Vec<NodeId> = {
            let tree = self.inner.tree.borrow();
            tree.shadow_including_descendants(NodeId::ROOT)
                .into_iter()
                .filter(|&id| tree.element(id).map(|e| e.tag == name && !e.is_custom()).unwrap_or(false))
                .collect()
        };
        for id in candidates {
            self.upgrade(id);
        }
        Ok(())
    }

    /// Registration guard: define once, silently ignore repeats.
    ///
    /// Returns true when the definition was registered by this call.
    pub fn define_once(&self, definition: CustomElementDefinition) -> bool {
        if self.is_defined(&definition.name) {
            tracing::trace!("<{}> already defined, skipping", definition.name);
            return false;
        }
        match self.define(definition) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("Custom element registration failed: {}", err);
                false
            }
        }
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.inner.registry.borrow().is_defined(name)
    }

    pub fn definition(&self, name: &str) -> Option<Rc<CustomElementDefinition>> {
        self.inner.registry.borrow().get(name)
    }

    /// Tag a type was defined under, see [`CustomElementDefinition::with_type`]
    pub fn custom_element_name(&self, element_type: TypeId) -> Option<String> {
        self.inner.registry.borrow().get_name(element_type)
    }

    /// Upgrade an element to its custom element definition.
    ///
    /// Runs the constructor, reports present observed attributes, then
    /// `connected` if the element is in the document. Returns false when
    /// the element is already upgraded or its tag is not defined.
    pub fn upgrade(&self, id: NodeId) -> bool {
        let definition = {
            let tree = self.inner.tree.borrow();
            let Some(elem) = tree.element(id) else {
                return false;
            };
            if elem.is_custom() {
                return false;
            }
            match self.inner.registry.borrow().get(&elem.tag) {
                Some(def) => def,
                None => return false,
            }
        };

        let node = self.node_ref(id);
        let reactions = definition.construct(&node);

        let (observed, connected) = {
            let mut tree = self.inner.tree.borrow_mut();
            let connected = tree.is_connected(id);
            let Some(elem) = tree.element_mut(id) else {
                return false;
            };
            elem.custom = Some(CustomElementState {
                definition: Rc::clone(&definition),
                reactions: Rc::clone(&reactions),
            });
            let observed: Vec<Attribute> = elem.attrs.iter()
                .filter(|a| definition.observes(&a.name))
                .cloned()
                .collect();
            (observed, connected)
        };
        tracing::trace!("Upgraded <{}> {:?}", definition.name, id);

        for attr in observed {
            reactions.attribute_changed(&attr.name, None, Some(&attr.value));
        }
        if connected {
            reactions.connected();
        }
        true
    }

    /// Reactions collected for nodes that just became connected
    fn connect_reactions(&self, tree: &DomTree, roots: &[NodeId]) -> Vec<Reaction> {
        let registry = self.inner.registry.borrow();
        roots.iter()
            .flat_map(|&root| tree.shadow_including_descendants(root))
            .filter_map(|id| {
                let elem = tree.element(id)?;
                match &elem.custom {
                    Some(custom) => Some(Reaction::Connected(Rc::clone(&custom.reactions))),
                    None if registry.is_defined(&elem.tag) => Some(Reaction::Upgrade(id)),
                    None => None,
                }
            })
            .collect()
    }

    fn disconnect_reactions(tree: &DomTree, root: NodeId) -> Vec<Reaction> {
        tree.shadow_including_descendants(root)
            .into_iter()
            .filter_map(|id| tree.element(id)?.custom.as_ref())
            .map(|custom| Reaction::Disconnected(Rc::clone(&custom.reactions)))
            .collect()
    }

    fn run_reactions(&self, reactions: Vec<Reaction>) {
        for reaction in reactions {
            match reaction {
                Reaction::Upgrade(id) => {
                    self.upgrade(id);
                }
                Reaction::Connected(r) => r.connected(),
                Reaction::Disconnected(r) => r.disconnected(),
            }
        }
    }

    fn insert(&self, parent: NodeId, child: NodeId, before: Option<NodeId>) -> Result<(), DomError> {
        let reactions = {
            let mut tree = self.inner.tree.borrow_mut();
            let is_fragment = matches!(tree.get(child).map(|n| &n.data), Some(NodeData::Fragment));
            let mut reactions = if !is_fragment && tree.is_connected(child) {
                Self::disconnect_reactions(&tree, child)
            } else {
                Vec::new()
            };
            let inserted = tree.insert(parent, child, before)?;
            if tree.is_connected(parent) {
                reactions.extend(self.connect_reactions(&tree, &inserted));
            }
            reactions
        };
        self.run_reactions(reactions);
        Ok(())
    }

    fn remove(&self, id: NodeId) {
        let reactions = {
            let mut tree = self.inner.tree.borrow_mut();
            let reactions = if tree.is_connected(id) {
                Self::disconnect_reactions(&tree, id)
            } else {
                Vec::new()
            };
            tree.detach(id);
            reactions
        };
        self.run_reactions(reactions);
    }

    fn set_attribute(&self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let notify = {
            let mut tree = self.inner.tree.borrow_mut();
            if tree.get(id).is_none() {
                return Err(DomError::MissingNode(id));
            }
            let elem = tree.element_mut(id).ok_or(DomError::NotAnElement(id))?;
            let old = elem.set_attr(name, value);
            elem.observes(name)
                .then(|| elem.custom.as_ref().map(|c| (Rc::clone(&c.reactions), old)))
                .flatten()
        };
        if let Some((reactions, old)) = notify {
            reactions.attribute_changed(&name.to_ascii_lowercase(), old.as_deref(), Some(value));
        }
        Ok(())
    }

    fn remove_attribute(&self, id: NodeId, name: &str) -> Result<bool, DomError> {
        let notify = {
            let mut tree = self.inner.tree.borrow_mut();
            if tree.get(id).is_none() {
                return Err(DomError::MissingNode(id));
            }
            let elem = tree.element_mut(id).ok_or(DomError::NotAnElement(id))?;
            let Some(old) = elem.remove_attr(name) else {
                return Ok(false);
            };
            elem.observes(name)
                .then(|| elem.custom.as_ref().map(|c| (Rc::clone(&c.reactions), old)))
                .flatten()
        };
        if let Some((reactions, old)) = notify {
            reactions.attribute_changed(&name.to_ascii_lowercase(), Some(&old), None);
        }
        Ok(true)
    }

    fn add_listener(&self, id: NodeId, event_type: &str, handler: EventHandler) -> ListenerId {
        let listener_id = ListenerId(self.inner.next_listener.get());
        self.inner.next_listener.set(listener_id.0 + 1);
        if let Some(node) = self.inner.tree.borrow_mut().get_mut(id) {
            node.listeners.push(Listener {
                id: listener_id,
                event_type: event_type.to_string(),
                handler,
            });
        }
        listener_id
    }

    /// Propagation path: target, then ancestors when bubbling.
    /// Shadow roots are crossed only by composed events.
    fn event_path(tree: &DomTree, target: NodeId, event: &Event) -> Vec<NodeId> {
        let mut path = vec![target];
        if !event.bubbles {
            return path;
        }
        let mut current = target;
        loop {
            let next = match tree.get(current).map(|n| &n.data) {
                Some(NodeData::ShadowRoot(shadow)) if event.composed => Some(shadow.host),
                Some(NodeData::ShadowRoot(_)) => None,
                Some(_) => tree.parent(current),
                None => None,
            };
            match next {
                Some(id) => {
                    path.push(id);
                    current = id;
                }
                None => return path,
            }
        }
    }

    fn dispatch(&self, target: NodeId, event: &mut Event) -> bool {
        event.target = Some(target);
        let path = Self::event_path(&self.inner.tree.borrow(), target, event);

        for node in path {
            let handlers: Vec<EventHandler> = {
                let tree = self.inner.tree.borrow();
                let Some(n) = tree.get(node) else {
                    continue;
                };
                n.listeners.iter()
                    .filter(|l| l.event_type == event.event_type)
                    .map(|l| Rc::clone(&l.handler))
                    .collect()
            };
            event.current_target = Some(node);
            for handler in handlers {
                handler(&mut *event);
            }
            if event.is_propagation_stopped() {
                break;
            }
        }
        event.current_target = None;
        !event.is_default_prevented()
    }
}

/// Handle to a node of a [`Document`]
#[derive(Clone)]
pub struct NodeRef {
    doc: Document,
    id: NodeId,
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.doc.ptr_eq(&other.doc)
    }
}

impl Eq for NodeRef {}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.tag_name();
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("tag", &tag)
            .finish()
    }
}

/// Non-owning node handle, for holders that must not keep the document alive
#[derive(Clone)]
pub struct WeakNodeRef {
    doc: Weak<DocumentInner>,
    id: NodeId,
}

impl fmt::Debug for WeakNodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakNodeRef").field("id", &self.id).finish()
    }
}

impl WeakNodeRef {
    pub fn upgrade(&self) -> Option<NodeRef> {
        let inner = self.doc.upgrade()?;
        Some(NodeRef { doc: Document { inner }, id: self.id })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl NodeRef {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn downgrade(&self) -> WeakNodeRef {
        WeakNodeRef { doc: Rc::downgrade(&self.doc.inner), id: self.id }
    }

    fn tree(&self) -> std::cell::Ref<'_, DomTree> {
        self.doc.inner.tree.borrow()
    }

    fn wrap(&self, id: NodeId) -> NodeRef {
        self.doc.node_ref(id)
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    pub fn is_element(&self) -> bool {
        self.tree().element(self.id).is_some()
    }

    pub fn is_text(&self) -> bool {
        matches!(self.tree().get(self.id).map(|n| &n.data), Some(NodeData::Text(_)))
    }

    pub fn is_shadow_root(&self) -> bool {
        self.tree().shadow_root(self.id).is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.tree().is_connected(self.id)
    }

    /// Lowercase tag name for elements
    pub fn tag_name(&self) -> Option<String> {
        self.tree().element(self.id).map(|e| e.tag.clone())
    }

    pub fn parent(&self) -> Option<NodeRef> {
        let parent = self.tree().parent(self.id)?;
        Some(self.wrap(parent))
    }

    pub fn children(&self) -> Vec<NodeRef> {
        let ids = self.tree().children(self.id).to_vec();
        ids.into_iter().map(|id| self.wrap(id)).collect()
    }

    pub fn first_child(&self) -> Option<NodeRef> {
        let first = self.tree().children(self.id).first().copied()?;
        Some(self.wrap(first))
    }

    fn sibling(&self, offset: isize) -> Option<NodeRef> {
        let sibling = {
            let tree = self.tree();
            let parent = tree.parent(self.id)?;
            let siblings = tree.children(parent);
            let pos = siblings.iter().position(|&c| c == self.id)?;
            let target = pos.checked_add_signed(offset)?;
            siblings.get(target).copied()?
        };
        Some(self.wrap(sibling))
    }

    pub fn next_sibling(&self) -> Option<NodeRef> {
        self.sibling(1)
    }

    pub fn previous_sibling(&self) -> Option<NodeRef> {
        self.sibling(-1)
    }

    pub fn append_child(&self, child: &NodeRef) -> Result<(), DomError> {
        self.doc.insert(self.id, child.id, None)
    }

    /// Insert before `reference` (append when None)
    pub fn insert_before(&self, child: &NodeRef, reference: Option<&NodeRef>) -> Result<(), DomError> {
        self.doc.insert(self.id, child.id, reference.map(|r| r.id))
    }

    pub fn prepend_child(&self, child: &NodeRef) -> Result<(), DomError> {
        let first = self.first_child();
        self.insert_before(child, first.as_ref())
    }

    /// Detach from the parent
    pub fn remove(&self) {
        self.doc.remove(self.id);
    }

    /// Remove every child, then append `nodes`
    pub fn replace_children(&self, nodes: &[NodeRef]) -> Result<(), DomError> {
        for child in self.children() {
            child.remove();
        }
        for node in nodes {
            self.append_child(node)?;
        }
        Ok(())
    }

    /// Light-tree descendants matching a compound selector
    pub fn query(&self, selector: &str) -> Option<NodeRef> {
        let found = self.tree().query(self.id, selector)?;
        Some(self.wrap(found))
    }

    pub fn query_all(&self, selector: &str) -> Vec<NodeRef> {
        let ids = self.tree().query_all(self.id, selector);
        ids.into_iter().map(|id| self.wrap(id)).collect()
    }

    pub fn matches(&self, selector: &str) -> bool {
        self.tree().matches(self.id, selector)
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.tree().element(self.id)?.get_attr(name).map(str::to_string)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.tree().element(self.id).map(|e| e.has_attr(name)).unwrap_or(false)
    }

    pub fn attributes(&self) -> Vec<Attribute> {
        self.tree().element(self.id).map(|e| e.attrs.clone()).unwrap_or_default()
    }

    pub fn set_attribute(&self, name: &str, value: &str) -> Result<(), DomError> {
        self.doc.set_attribute(self.id, name, value)
    }

    /// Returns whether the attribute existed
    pub fn remove_attribute(&self, name: &str) -> Result<bool, DomError> {
        self.doc.remove_attribute(self.id, name)
    }

    /// Toggle a boolean attribute, returns whether it is present afterwards
    pub fn toggle_attribute(&self, name: &str, force: Option<bool>) -> Result<bool, DomError> {
        let present = self.has_attribute(name);
        let wanted = force.unwrap_or(!present);
        if wanted && !present {
            self.set_attribute(name, "")?;
        } else if !wanted && present {
            self.remove_attribute(name)?;
        }
        Ok(wanted)
    }

    pub fn class_list(&self) -> DOMTokenList {
        DOMTokenList::parse(&self.get_attribute("class").unwrap_or_default())
    }

    /// Write a class list back to the `class` attribute
    pub fn set_class_list(&self, list: &DOMTokenList) -> Result<(), DomError> {
        if list.is_empty() && !self.has_attribute("class") {
            return Ok(());
        }
        self.set_attribute("class", &list.value())
    }

    pub fn style(&self) -> CssStyleDeclaration {
        CssStyleDeclaration::parse(&self.get_attribute("style").unwrap_or_default())
    }

    /// Write inline style back; an empty declaration removes the attribute
    pub fn set_style(&self, style: &CssStyleDeclaration) -> Result<(), DomError> {
        if style.is_empty() {
            self.remove_attribute("style").map(|_| ())
        } else {
            self.set_attribute("style", &style.css_text())
        }
    }

    pub fn dataset(&self) -> DOMStringMap {
        self.tree().element(self.id)
            .map(|e| DOMStringMap::from_attributes(&e.attrs))
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------

    pub fn text_content(&self) -> String {
        self.tree().text_content(self.id)
    }

    /// Replace children with a single text node (or update text data)
    pub fn set_text_content(&self, text: &str) -> Result<(), DomError> {
        if self.doc.inner.tree.borrow_mut().set_character_data(self.id, text) {
            return Ok(());
        }
        let children: Vec<NodeRef> = if text.is_empty() {
            Vec::new()
        } else {
            vec![self.doc.create_text_node(text)]
        };
        self.replace_children(&children)
    }

    /// `value` property; falls back to the `value` attribute
    pub fn value(&self) -> Option<String> {
        let tree = self.tree();
        let elem = tree.element(self.id)?;
        elem.value.clone().or_else(|| elem.get_attr("value").map(str::to_string))
    }

    pub fn set_value(&self, value: &str) -> Result<(), DomError> {
        let mut tree = self.doc.inner.tree.borrow_mut();
        let elem = tree.element_mut(self.id).ok_or(DomError::NotAnElement(self.id))?;
        elem.value = Some(value.to_string());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Shadow DOM
    // ------------------------------------------------------------------

    pub fn attach_shadow(&self, mode: ShadowRootMode) -> Result<NodeRef, DomError> {
        let root = self.doc.inner.tree.borrow_mut().attach_shadow(self.id, mode)?;
        Ok(self.wrap(root))
    }

    pub fn shadow_root(&self) -> Option<NodeRef> {
        let root = self.tree().element(self.id)?.shadow_root?;
        Some(self.wrap(root))
    }

    /// Host element when this node is a shadow root
    pub fn host(&self) -> Option<NodeRef> {
        let host = self.tree().shadow_root(self.id)?.host;
        Some(self.wrap(host))
    }

    pub fn adopted_style_sheets(&self) -> Vec<StyleSheet> {
        self.tree().shadow_root(self.id)
            .map(|s| s.adopted_style_sheets().to_vec())
            .unwrap_or_default()
    }

    pub fn set_adopted_style_sheets(&self, sheets: Vec<StyleSheet>) -> Result<(), DomError> {
        let mut tree = self.doc.inner.tree.borrow_mut();
        let shadow = tree.shadow_root_mut(self.id).ok_or(DomError::HierarchyRequest {
            parent: self.id,
            child: self.id,
        })?;
        shadow.set_adopted_style_sheets(sheets);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Custom elements
    // ------------------------------------------------------------------

    /// Read or mutate the element's internals (role, ARIA, custom states)
    pub fn with_internals<R>(&self, f: impl FnOnce(&mut ElementInternals) -> R) -> Option<R> {
        let mut tree = self.doc.inner.tree.borrow_mut();
        tree.element_mut(self.id).map(|e| f(&mut e.internals))
    }

    /// Mutate the element's custom state set; non-elements get a scratch set
    pub fn with_custom_states<R>(&self, f: impl FnOnce(&mut CustomStateSet) -> R) -> R {
        let mut tree = self.doc.inner.tree.borrow_mut();
        match tree.element_mut(self.id) {
            Some(elem) => f(elem.internals.states_mut()),
            None => f(&mut CustomStateSet::new()),
        }
    }

    /// Reactions object of an upgraded custom element
    pub fn custom_element(&self) -> Option<Rc<dyn CustomElementReactions>> {
        let tree = self.tree();
        let custom = tree.element(self.id)?.custom.as_ref()?;
        Some(Rc::clone(&custom.reactions))
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn add_event_listener(&self, event_type: &str, handler: impl Fn(&mut Event) + 'static) -> ListenerId {
        self.doc.add_listener(self.id, event_type, Rc::new(handler))
    }

    pub fn remove_event_listener(&self, listener: ListenerId) -> bool {
        let mut tree = self.doc.inner.tree.borrow_mut();
        let Some(node) = tree.get_mut(self.id) else {
            return false;
        };
        let before = node.listeners.len();
        node.listeners.retain(|l| l.id != listener);
        node.listeners.len() != before
    }

    /// Remove every listener for an event type, returns how many were removed
    pub fn remove_event_listeners(&self, event_type: &str) -> usize {
        let mut tree = self.doc.inner.tree.borrow_mut();
        let Some(node) = tree.get_mut(self.id) else {
            return 0;
        };
        let before = node.listeners.len();
        node.listeners.retain(|l| l.event_type != event_type);
        before - node.listeners.len()
    }

    /// Dispatch an event; false when a listener prevented the default
    pub fn dispatch_event(&self, event: &mut Event) -> bool {
        self.doc.dispatch(self.id, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        log: RefCell<Vec<String>>,
    }

    impl CustomElementReactions for Recorder {
        fn connected(&self) {
            self.log.borrow_mut().push("connected".into());
        }

        fn disconnected(&self) {
            self.log.borrow_mut().push("disconnected".into());
        }

        fn attribute_changed(&self, name: &str, old: Option<&str>, new: Option<&str>) {
            self.log.borrow_mut().push(format!("{name}:{old:?}->{new:?}"));
        }
    }

    fn define_recorder(doc: &Document, recorder: &Rc<Recorder>) {
        let recorder = Rc::clone(recorder);
        doc.define(CustomElementDefinition::new(
            "x-rec",
            vec!["title".to_string()],
            Rc::new(move |_: &NodeRef| Rc::clone(&recorder) as Rc<dyn CustomElementReactions>),
        ))
        .unwrap();
    }

    #[test]
    fn test_document_structure() {
        let doc = Document::new();
        assert_eq!(doc.body().tag_name().as_deref(), Some("body"));
        assert!(doc.body().is_connected());
        assert_eq!(doc.body().parent(), Some(doc.document_element()));
    }

    #[test]
    fn test_reactions_order() {
        let doc = Document::new();
        let recorder = Rc::new(Recorder::default());
        define_recorder(&doc, &recorder);

        let el = doc.create_element("x-rec");
        el.set_attribute("title", "a").unwrap();
        el.set_attribute("other", "ignored").unwrap();
        doc.body().append_child(&el).unwrap();
        el.remove_attribute("title").unwrap();
        el.remove();

        assert_eq!(
            *recorder.log.borrow(),
            vec![
                "title:None->Some(\"a\")",
                "connected",
                "title:Some(\"a\")->None",
                "disconnected",
            ]
        );
    }

    #[test]
    fn test_define_upgrades_connected_elements() {
        let doc = Document::new();
        let el = doc.create_element("x-rec");
        el.set_attribute("title", "seed").unwrap();
        doc.body().append_child(&el).unwrap();
        assert!(el.custom_element().is_none());

        let recorder = Rc::new(Recorder::default());
        define_recorder(&doc, &recorder);

        assert!(el.custom_element().is_some());
        assert_eq!(
            *recorder.log.borrow(),
            vec!["title:None->Some(\"seed\")", "connected"]
        );
    }

    #[test]
    fn test_define_once_ignores_repeats() {
        let doc = Document::new();
        let make = || CustomElementDefinition::new(
            "x-once",
            Vec::new(),
            Rc::new(|_: &NodeRef| Rc::new(Recorder::default()) as Rc<dyn CustomElementReactions>),
        );
        assert!(doc.define_once(make()));
        assert!(!doc.define_once(make()));
        assert!(doc.define(make()).is_err());
    }

    #[test]
    fn test_event_bubbling_and_shadow_boundary() {
        let doc = Document::new();
        let host = doc.create_element("div");
        doc.body().append_child(&host).unwrap();
        let shadow = host.attach_shadow(ShadowRootMode::Open).unwrap();
        let inner = doc.create_element("button");
        shadow.append_child(&inner).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        doc.body().add_event_listener("ping", move |e| sink.borrow_mut().push(e.detail.clone()));

        let mut contained = Event::with_init("ping", crate::EventInit {
            bubbles: true,
            detail: serde_json::json!("contained"),
            ..Default::default()
        });
        inner.dispatch_event(&mut contained);
        assert!(seen.borrow().is_empty());

        let mut composed = Event::with_init("ping", crate::EventInit {
            bubbles: true,
            composed: true,
            detail: serde_json::json!("composed"),
            ..Default::default()
        });
        inner.dispatch_event(&mut composed);
        assert_eq!(*seen.borrow(), vec![serde_json::json!("composed")]);
    }

    #[test]
    fn test_listener_removal() {
        let doc = Document::new();
        let el = doc.create_element("div");
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let id = el.add_event_listener("click", move |_| c.set(c.get() + 1));

        el.dispatch_event(&mut Event::new("click"));
        assert!(el.remove_event_listener(id));
        assert!(!el.remove_event_listener(id));
        el.dispatch_event(&mut Event::new("click"));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_text_and_toggle() {
        let doc = Document::new();
        let el = doc.create_element("p");
        el.set_text_content("hello").unwrap();
        assert_eq!(el.text_content(), "hello");
        el.set_text_content("").unwrap();
        assert!(el.children().is_empty());

        assert!(el.toggle_attribute("hidden", None).unwrap());
        assert!(el.has_attribute("hidden"));
        assert!(!el.toggle_attribute("hidden", None).unwrap());
    }
}
