//! Kiln HTML
//!
//! HTML fragment parsing built on html5ever, reusable templates and
//! inner/outer HTML serialization for the Kiln DOM.

mod parser;
mod serializer;
mod template;

pub use parser::HtmlParser;
pub use serializer::HtmlSerializer;
pub use template::Template;

use kiln_dom::{Document, DomError, NodeRef};

/// Parse markup into detached nodes of `doc`
pub fn parse_fragment(doc: &Document, html: &str) -> Vec<NodeRef> {
    HtmlParser::new().parse_fragment(doc, html)
}

/// Serialized children of a node
pub fn inner_html(node: &NodeRef) -> String {
    node.document().with_tree(|tree| HtmlSerializer::new().serialize_inner(tree, node.id()))
}

/// Serialized node including itself
pub fn outer_html(node: &NodeRef) -> String {
    node.document().with_tree(|tree| HtmlSerializer::new().serialize_outer(tree, node.id()))
}

/// Replace the children of `node` with parsed markup
pub fn set_inner_html(node: &NodeRef, html: &str) -> Result<(), DomError> {
    let nodes = parse_fragment(node.document(), html);
    node.replace_children(&nodes)
}
