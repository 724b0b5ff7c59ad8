//! HTML Serialization (innerHTML/outerHTML)
//!
//! Serializes DOM nodes to HTML strings. Shadow roots are not part of the
//! light tree and are never serialized.

use kiln_dom::{DomTree, NodeData, NodeId};

/// HTML serializer
#[derive(Debug, Clone)]
pub struct HtmlSerializer {
    /// Whether to format output with indentation
    pub pretty_print: bool,
    /// Indentation string
    pub indent: String,
}

/// Void elements (no end tag)
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input",
    "link", "meta", "param", "source", "track", "wbr",
];

/// Raw text elements (no escaping for content)
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

impl Default for HtmlSerializer {
    fn default() -> Self {
        Self {
            pretty_print: false,
            indent: "  ".to_string(),
        }
    }
}

impl HtmlSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self {
            pretty_print: true,
            ..Self::default()
        }
    }

    /// Serialize the children of a node
    pub fn serialize_inner(&self, tree: &DomTree, node_id: NodeId) -> String {
        let mut output = String::new();
        self.serialize_children(tree, node_id, &mut output, 0);
        output
    }

    /// Serialize a node including itself
    pub fn serialize_outer(&self, tree: &DomTree, node_id: NodeId) -> String {
        let mut output = String::new();
        self.serialize_node(tree, node_id, &mut output, 0);
        output
    }

    fn newline(&self, output: &mut String, depth: usize) {
        output.push('\n');
        for _ in 0..depth {
            output.push_str(&self.indent);
        }
    }

    fn serialize_node(&self, tree: &DomTree, node_id: NodeId, output: &mut String, depth: usize) {
        let Some(node) = tree.get(node_id) else {
            return;
        };

        match &node.data {
            NodeData::Document | NodeData::Fragment => {
                self.serialize_children(tree, node_id, output, depth);
            }
            NodeData::ShadowRoot(_) => {}
            NodeData::Element(elem) => {
                let tag = elem.tag_name();

                if self.pretty_print && depth > 0 {
                    self.newline(output, depth);
                }

                output.push('<');
                output.push_str(tag);
                for attr in elem.attributes() {
                    output.push(' ');
                    output.push_str(&attr.name);
                    if !attr.value.is_empty() {
                        output.push_str("=\"");
                        escape_attribute(&attr.value, output);
                        output.push('"');
                    }
                }

                if VOID_ELEMENTS.contains(&tag) {
                    output.push('>');
                    return;
                }
                output.push('>');

                if RAW_TEXT_ELEMENTS.contains(&tag) {
                    output.push_str(&tree.text_content(node_id));
                } else {
                    self.serialize_children(tree, node_id, output, depth + 1);
                    let has_element_child = node.children().iter().any(|&c| tree.element(c).is_some());
                    if self.pretty_print && has_element_child {
                        self.newline(output, depth);
                    }
                }

                output.push_str("</");
                output.push_str(tag);
                output.push('>');
            }
            NodeData::Text(text) => {
                if self.pretty_print && text.trim().is_empty() {
                    return;
                }
                escape_text(text, output);
            }
            NodeData::Comment(text) => {
                output.push_str("<!--");
                output.push_str(text);
                output.push_str("-->");
            }
        }
    }

    fn serialize_children(&self, tree: &DomTree, parent_id: NodeId, output: &mut String, depth: usize) {
        for &child in tree.children(parent_id) {
            self.serialize_node(tree, child, output, depth);
        }
    }
}

/// Escape text content for HTML
fn escape_text(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            _ => output.push(c),
        }
    }
}

/// Escape attribute value
fn escape_attribute(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '"' => output.push_str("&quot;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            _ => output.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_text() {
        let mut output = String::new();
        escape_text("Hello <world> & \"friends\"", &mut output);
        assert_eq!(output, "Hello &lt;world&gt; &amp; \"friends\"");
    }

    #[test]
    fn test_escape_attribute() {
        let mut output = String::new();
        escape_attribute("a < b & \"c\"", &mut output);
        assert_eq!(output, "a < b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_serialize_element() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        tree.element_mut(div).unwrap().set_attr("class", "box");
        tree.element_mut(div).unwrap().set_attr("hidden", "");
        let br = tree.create_element("br");
        let text = tree.create_text("1 < 2");
        tree.insert(div, br, None).unwrap();
        tree.insert(div, text, None).unwrap();

        let serializer = HtmlSerializer::new();
        assert_eq!(serializer.serialize_outer(&tree, div), "<div class=\"box\" hidden><br>1 &lt; 2</div>");
        assert_eq!(serializer.serialize_inner(&tree, div), "<br>1 &lt; 2");
    }

    #[test]
    fn test_raw_text_not_escaped() {
        let mut tree = DomTree::new();
        let style = tree.create_element("style");
        let css = tree.create_text(":host > p { color: red }");
        tree.insert(style, css, None).unwrap();
        assert_eq!(
            HtmlSerializer::new().serialize_outer(&tree, style),
            "<style>:host > p { color: red }</style>"
        );
    }

    #[test]
    fn test_pretty_print() {
        let mut tree = DomTree::new();
        let ul = tree.create_element("ul");
        let li = tree.create_element("li");
        let text = tree.create_text("one");
        tree.insert(li, text, None).unwrap();
        tree.insert(ul, li, None).unwrap();

        assert_eq!(
            HtmlSerializer::pretty().serialize_outer(&tree, ul),
            "<ul>\n  <li>one</li>\n</ul>"
        );
    }

    #[test]
    fn test_shadow_root_skipped() {
        let mut tree = DomTree::new();
        let host = tree.create_element("x-card");
        let shadow = tree.attach_shadow(host, kiln_dom::ShadowRootMode::Open).unwrap();
        let inner = tree.create_element("span");
        tree.insert(shadow, inner, None).unwrap();
        assert_eq!(HtmlSerializer::new().serialize_outer(&tree, host), "<x-card></x-card>");
    }
}
