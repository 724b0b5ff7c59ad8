//! Template fragments
//!
//! A [`Template`] parses its markup once into a private tree. Every
//! [`Template::instantiate`] call imports an independent copy into a
//! document, so instances never share nodes.

use std::fmt;
use std::rc::Rc;

use kiln_dom::{Document, DomTree, NodeId, NodeRef};

use crate::parser::{HtmlParser, import_and_upgrade};
use crate::serializer::HtmlSerializer;

/// Parsed, reusable HTML fragment (cheap to clone)
#[derive(Clone)]
pub struct Template {
    tree: Rc<DomTree>,
    content: NodeId,
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("nodes", &self.tree.len())
            .finish_non_exhaustive()
    }
}

impl Template {
    pub fn parse(html: &str) -> Self {
        let (tree, content) = HtmlParser::new().parse_tree(html);
        Self { tree: Rc::new(tree), content }
    }

    /// Whether the template holds no nodes
    pub fn is_empty(&self) -> bool {
        self.tree.children(self.content).is_empty()
    }

    /// Deep copy of the content as a detached fragment of `doc`.
    ///
    /// Custom elements inside the copy are upgraded.
    pub fn instantiate(&self, doc: &Document) -> NodeRef {
        match import_and_upgrade(doc, &self.tree, self.content) {
            Some(fragment) => fragment,
            None => doc.create_document_fragment(),
        }
    }

    /// Serialized content
    pub fn inner_html(&self) -> String {
        HtmlSerializer::new().serialize_inner(&self.tree, self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instances_are_independent() {
        let template = Template::parse("<div class=\"label\">Hi</div>");
        let doc = Document::new();

        let first = template.instantiate(&doc);
        let second = template.instantiate(&doc);
        let first_div = first.first_child().unwrap();
        first_div.set_attribute("class", "changed").unwrap();

        let second_div = second.first_child().unwrap();
        assert_eq!(second_div.get_attribute("class").as_deref(), Some("label"));
        assert_ne!(first_div, second_div);
        assert_eq!(template.inner_html(), "<div class=\"label\">Hi</div>");
    }

    #[test]
    fn test_empty_template() {
        let template = Template::parse("");
        assert!(template.is_empty());
        let doc = Document::new();
        assert!(template.instantiate(&doc).children().is_empty());
    }
}
