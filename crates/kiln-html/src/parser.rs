//! HTML5 Parser implementation
//!
//! Parses with html5ever into an RcDom, then converts the head and body
//! content into a detached fragment of a kiln [`DomTree`].

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use kiln_dom::{Document, DomTree, NodeId, NodeRef};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

/// HTML5 fragment parser
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlParser;

impl HtmlParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse markup into a fresh tree.
    ///
    /// Returns the tree and the fragment holding the parsed nodes. Markup
    /// html5ever hoists into `<head>` (such as a leading `<style>`) comes
    /// first, followed by the body content.
    pub fn parse_tree(&self, html: &str) -> (DomTree, NodeId) {
        let dom = parse_document(RcDom::default(), Default::default()).one(html);

        let mut tree = DomTree::new();
        let fragment = tree.create_fragment();

        for section in content_sections(&dom.document) {
            for child in section.children.borrow().iter() {
                convert_node(child, &mut tree, fragment);
            }
        }

        tracing::trace!("Parsed fragment into {} nodes", tree.len());
        (tree, fragment)
    }

    /// Parse markup into detached nodes of `doc`, upgrading custom elements
    pub fn parse_fragment(&self, doc: &Document, html: &str) -> Vec<NodeRef> {
        let (tree, fragment) = self.parse_tree(html);
        tree.children(fragment)
            .iter()
            .filter_map(|&child| import_and_upgrade(doc, &tree, child))
            .collect()
    }
}

/// `<head>` and `<body>` of the parsed document
fn content_sections(document: &Handle) -> Vec<Handle> {
    let children = document.children.borrow();
    let Some(html) = children.iter().find(|c| is_element(c, "html")) else {
        return Vec::new();
    };
    html.children
        .borrow()
        .iter()
        .filter(|c| is_element(c, "head") || is_element(c, "body"))
        .cloned()
        .collect()
}

fn is_element(handle: &Handle, tag: &str) -> bool {
    matches!(&handle.data, RcNodeData::Element { name, .. } if name.local.as_ref() == tag)
}

/// Convert an RcDom node (and its subtree) under `parent`
fn convert_node(handle: &Handle, tree: &mut DomTree, parent: NodeId) {
    let id = match &handle.data {
        RcNodeData::Text { contents } => tree.create_text(&contents.borrow()),
        RcNodeData::Comment { contents } => tree.create_comment(contents),
        RcNodeData::Element { name, attrs, template_contents, .. } => {
            let id = tree.create_element(&name.local);
            if let Some(elem) = tree.element_mut(id) {
                for attr in attrs.borrow().iter() {
                    elem.set_attr(&attr.name.local, &attr.value);
                }
            }
            // <template> content lives in a separate document fragment
            if let Some(contents) = template_contents.borrow().as_ref() {
                for child in contents.children.borrow().iter() {
                    convert_node(child, tree, id);
                }
            }
            for child in handle.children.borrow().iter() {
                convert_node(child, tree, id);
            }
            id
        }
        RcNodeData::Document
        | RcNodeData::Doctype { .. }
        | RcNodeData::ProcessingInstruction { .. } => return,
    };
    if let Err(err) = tree.insert(parent, id, None) {
        tracing::warn!("Dropping parsed node: {}", err);
    }
}

/// Copy a subtree into `doc`, then upgrade its custom elements in tree order
pub(crate) fn import_and_upgrade(doc: &Document, source: &DomTree, id: NodeId) -> Option<NodeRef> {
    let node = doc.import_subtree(source, id)?;
    let elements: Vec<NodeId> = doc.with_tree(|tree| {
        tree.shadow_including_descendants(node.id())
            .into_iter()
            .filter(|&d| tree.element(d).is_some())
            .collect()
    });
    for element in elements {
        doc.upgrade(element);
    }
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tree_keeps_order() {
        let (tree, fragment) = HtmlParser::new().parse_tree("<style>p{}</style><p class=\"a\">Hi</p>");
        let children = tree.children(fragment);
        assert_eq!(children.len(), 2);
        assert_eq!(tree.element(children[0]).unwrap().tag_name(), "style");
        assert_eq!(tree.element(children[1]).unwrap().get_attr("class"), Some("a"));
        assert_eq!(tree.text_content(children[1]), "Hi");
    }

    #[test]
    fn test_parse_text_only() {
        let (tree, fragment) = HtmlParser::new().parse_tree("just text");
        assert_eq!(tree.text_content(fragment), "just text");
    }

    #[test]
    fn test_parse_empty() {
        let (tree, fragment) = HtmlParser::new().parse_tree("");
        assert!(tree.children(fragment).is_empty());
    }

    #[test]
    fn test_template_contents_become_children() {
        let (tree, fragment) = HtmlParser::new().parse_tree("<template><b>x</b></template>");
        let template = tree.children(fragment)[0];
        assert_eq!(tree.children(template).len(), 1);
    }

    #[test]
    fn test_parse_fragment_is_detached() {
        let doc = Document::new();
        let nodes = HtmlParser::new().parse_fragment(&doc, "<i>a</i><b>b</b>");
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|n| n.parent().is_none() && !n.is_connected()));
    }
}
