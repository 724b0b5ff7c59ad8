//! Kiln DOM - Document Object Model
//!
//! Headless, arena-based DOM used by the Kiln element engine.
//! Mutations go through [`Document`] / [`NodeRef`] so custom element
//! reactions run after the tree borrow is released.

mod node;
mod tree;
mod document;
mod classlist;
mod dataset;
mod style;
mod shadow;
mod custom_elements;
mod events;

pub use node::{Node, NodeData, ElementData, Attribute};
pub use tree::DomTree;
pub use document::{Document, NodeRef, WeakNodeRef};
pub use classlist::DOMTokenList;
pub use dataset::{DOMStringMap, to_camel_case, to_kebab_case};
pub use style::CssStyleDeclaration;
pub use shadow::{ShadowRoot, ShadowRootMode, StyleSheet};
pub use custom_elements::{
    CustomElementRegistry, CustomElementDefinition, CustomElementReactions,
    ElementConstructor, ElementInternals, CustomStateSet, AriaMap,
};
pub use events::{Event, EventInit, ListenerId, EventHandler};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Document node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// DOM errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Invalid custom element name: {0}")]
    InvalidName(String),

    #[error("Custom element already defined: {0}")]
    AlreadyDefined(String),

    #[error("Element type already defined as {0}")]
    TypeAlreadyDefined(String),

    #[error("Node {0:?} does not exist")]
    MissingNode(NodeId),

    #[error("Node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("Element {0:?} already hosts a shadow root")]
    ShadowRootExists(NodeId),

    #[error("Cannot insert {child:?} into {parent:?}")]
    HierarchyRequest { parent: NodeId, child: NodeId },
}
