//! DOM Tree (arena-based allocation)

use crate::{DomError, ElementData, Node, NodeData, NodeId, ShadowRoot, ShadowRootMode};

/// Arena-based DOM tree
///
/// Node 0 is always the document node. Nodes are never freed; removed
/// nodes simply become detached.
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
        }
    }

    /// Document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Number of nodes in the arena
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(data));
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(ElementData::new(tag)))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    /// Create a detached comment
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Comment(text.to_string()))
    }

    /// Create an empty fragment
    pub fn create_fragment(&mut self) -> NodeId {
        self.push(NodeData::Fragment)
    }

    /// Attach a shadow root to an element
    pub fn attach_shadow(&mut self, host: NodeId, mode: ShadowRootMode) -> Result<NodeId, DomError> {
        match self.element(host) {
            None if self.get(host).is_none() => return Err(DomError::MissingNode(host)),
            None => return Err(DomError::NotAnElement(host)),
            Some(elem) if elem.shadow_root.is_some() => return Err(DomError::ShadowRootExists(host)),
            Some(_) => {}
        }
        let root = self.push(NodeData::ShadowRoot(ShadowRoot::new(host, mode)));
        if let Some(elem) = self.element_mut(host) {
            elem.shadow_root = Some(root);
        }
        Ok(root)
    }

    /// Children of a node (empty for unknown IDs)
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Element data for a node
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(Node::as_element)
    }

    /// Mutable element data for a node
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(Node::as_element_mut)
    }

    /// Shadow-root data for a node
    pub fn shadow_root(&self, id: NodeId) -> Option<&ShadowRoot> {
        self.get(id).and_then(Node::as_shadow_root)
    }

    pub(crate) fn shadow_root_mut(&mut self, id: NodeId) -> Option<&mut ShadowRoot> {
        self.get_mut(id).and_then(Node::as_shadow_root_mut)
    }

    /// Parent, or the host when `id` is a shadow root
    pub fn host_including_parent(&self, id: NodeId) -> Option<NodeId> {
        let node = self.get(id)?;
        match &node.data {
            NodeData::ShadowRoot(shadow) => Some(shadow.host),
            _ => node.parent,
        }
    }

    /// Connected means the shadow-including root is the document
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == NodeId::ROOT {
                return true;
            }
            match self.host_including_parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Whether `ancestor` is `node` or one of its host-including ancestors
    pub fn is_host_including_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.host_including_parent(id);
        }
        false
    }

    /// Detach a node from its parent
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        if let Some(n) = self.get_mut(id) {
            n.parent = None;
        }
    }

    /// Insert `child` into `parent` before `before` (append when None).
    ///
    /// Fragments are emptied into the parent. Returns the inserted nodes.
    pub fn insert(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    ) -> Result<Vec<NodeId>, DomError> {
        let parent_node = self.get(parent).ok_or(DomError::MissingNode(parent))?;
        if matches!(parent_node.data, NodeData::Text(_) | NodeData::Comment(_)) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        let child_node = self.get(child).ok_or(DomError::MissingNode(child))?;
        if matches!(child_node.data, NodeData::Document | NodeData::ShadowRoot(_))
            || self.is_host_including_inclusive_ancestor(child, parent)
        {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if let Some(reference) = before {
            if self.parent(reference) != Some(parent) {
                return Err(DomError::HierarchyRequest { parent, child: reference });
            }
        }
        // Inserting a node before itself keeps it in place
        let before = if before == Some(child) {
            let siblings = self.children(parent);
            siblings
                .iter()
                .position(|&c| c == child)
                .and_then(|pos| siblings.get(pos + 1).copied())
        } else {
            before
        };

        let moved = if matches!(child_node.data, NodeData::Fragment) {
            let kids = std::mem::take(&mut self.nodes[child.index()].children);
            for &kid in &kids {
                self.nodes[kid.index()].parent = None;
            }
            kids
        } else {
            self.detach(child);
            vec![child]
        };

        for &node in &moved {
            let siblings = &mut self.nodes[parent.index()].children;
            let pos = before
                .and_then(|r| siblings.iter().position(|&c| c == r))
                .unwrap_or(siblings.len());
            siblings.insert(pos, node);
            self.nodes[node.index()].parent = Some(parent);
        }
        Ok(moved)
    }

    /// Light-tree descendants in tree order (exclusive)
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Shadow-including inclusive descendants in tree order
    pub fn shadow_including_descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
            if let Some(shadow) = self.element(current).and_then(|e| e.shadow_root) {
                stack.push(shadow);
            }
        }
        out
    }

    /// Concatenated text of light-tree descendants
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.get(id).and_then(Node::as_text) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|d| self.get(d).and_then(Node::as_text))
            .collect()
    }

    /// Replace a text or comment node's data
    pub fn set_character_data(&mut self, id: NodeId, value: &str) -> bool {
        match self.get_mut(id).map(|n| &mut n.data) {
            Some(NodeData::Text(t)) | Some(NodeData::Comment(t)) => {
                *t = value.to_string();
                true
            }
            _ => false,
        }
    }

    /// Deep-copy a subtree from another tree (or this one) into this arena.
    ///
    /// Shadow roots, listeners and custom element state are not copied.
    /// Document and shadow-root sources become fragments.
    pub fn import_subtree(&mut self, source: &DomTree, source_id: NodeId) -> Option<NodeId> {
        let node = source.get(source_id)?;
        let copy = match &node.data {
            NodeData::Element(elem) => {
                let mut data = ElementData::new(&elem.tag);
                data.attrs = elem.attrs.clone();
                NodeData::Element(data)
            }
            NodeData::Text(t) => NodeData::Text(t.clone()),
            NodeData::Comment(c) => NodeData::Comment(c.clone()),
            NodeData::Document | NodeData::Fragment | NodeData::ShadowRoot(_) => NodeData::Fragment,
        };
        let id = self.push(copy);
        for &child in source.children(source_id) {
            if let Some(imported) = self.import_subtree(source, child) {
                self.nodes[id.index()].children.push(imported);
                self.nodes[imported.index()].parent = Some(id);
            }
        }
        Some(id)
    }

    /// Whether an element matches a compound selector
    /// (`tag`, `#id`, `.class`, `[attr]`, `[attr=value]`, no combinators)
    pub fn matches(&self, id: NodeId, selector: &str) -> bool {
        let Some(elem) = self.element(id) else {
            return false;
        };
        let Some(parts) = parse_compound(selector) else {
            tracing::warn!("Unsupported selector: {}", selector);
            return false;
        };
        parts.iter().all(|part| match part {
            SelectorPart::Tag(tag) => elem.tag.eq_ignore_ascii_case(tag),
            SelectorPart::Id(value) => elem.get_attr("id") == Some(value.as_str()),
            SelectorPart::Class(class) => elem.get_attr("class")
                .map(|c| c.split_whitespace().any(|t| t == class))
                .unwrap_or(false),
            SelectorPart::Attr(name, None) => elem.has_attr(name),
            SelectorPart::Attr(name, Some(value)) => elem.get_attr(name) == Some(value.as_str()),
        })
    }

    /// First light-tree descendant matching a selector
    pub fn query(&self, root: NodeId, selector: &str) -> Option<NodeId> {
        self.descendants(root).into_iter().find(|&id| self.matches(id, selector))
    }

    /// All light-tree descendants matching a selector
    pub fn query_all(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&id| self.matches(id, selector))
            .collect()
    }
}

#[derive(Debug, PartialEq)]
enum SelectorPart {
    Tag(String),
    Id(String),
    Class(String),
    Attr(String, Option<String>),
}

fn parse_compound(selector: &str) -> Option<Vec<SelectorPart>> {
    let selector = selector.trim();
    if selector.is_empty() || selector.contains(char::is_whitespace) {
        return None;
    }
    let mut parts = Vec::new();
    let mut rest = selector;
    while !rest.is_empty() {
        let (kind, body) = match rest.as_bytes()[0] {
            b'#' | b'.' => (rest.as_bytes()[0], &rest[1..]),
            b'[' => {
                let end = rest.find(']')?;
                let inner = &rest[1..end];
                let part = match inner.split_once('=') {
                    Some((name, value)) => SelectorPart::Attr(
                        name.trim().to_string(),
                        Some(value.trim().trim_matches(|c| c == '"' || c == '\'').to_string()),
                    ),
                    None => SelectorPart::Attr(inner.trim().to_string(), None),
                };
                parts.push(part);
                rest = &rest[end + 1..];
                continue;
            }
            _ => (b't', rest),
        };
        let end = body.find(['#', '.', '[']).unwrap_or(body.len());
        let name = &body[..end];
        if name.is_empty() {
            return None;
        }
        parts.push(match kind {
            b'#' => SelectorPart::Id(name.to_string()),
            b'.' => SelectorPart::Class(name.to_string()),
            _ => SelectorPart::Tag(name.to_string()),
        });
        rest = &body[end..];
    }
    Some(parts)
}
