//! In-memory document tree.
//!
//! Invariant: only crate code mutates a [`Document`]. The public surface is read-only so
//! hosts can inspect and serialize the tree but every change goes through a region owner.

use std::collections::HashMap;

use crate::core::markup::MarkupNode;

/// Stable identifier for a node owned by a single [`Document`].
///
/// Semantics:
/// - IDs are unique within a document.
/// - IDs are never reused for the lifetime of the document, so a stale ID held across a
///   removal resolves to nothing instead of to an unrelated node.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(u64);

impl NodeId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element { tag: String },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    attrs: Vec<(String, String)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attrs: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct Document {
    nodes: HashMap<NodeId, NodeData>,
    root: NodeId,
    next_id: u64,
    revision: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            NodeData::new(NodeKind::Element {
                tag: "body".to_string(),
            }),
        );
        Self {
            nodes,
            root,
            next_id: 1,
            revision: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Mutation counter; bumped by every structural, attribute, or text change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of nodes currently held by the arena, attached or not.
    pub fn live_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.nodes.get(&node).map(|data| &data.kind)
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match self.kind(node)? {
            NodeKind::Element { tag } => Some(tag.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match self.kind(node)? {
            NodeKind::Text(text) => Some(text.as_str()),
            NodeKind::Element { .. } => None,
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|data| data.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(&node)
            .map(|data| data.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).last().copied()
    }

    pub fn attrs(&self, node: NodeId) -> &[(String, String)] {
        self.nodes
            .get(&node)
            .map(|data| data.attrs.as_slice())
            .unwrap_or(&[])
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.attrs(node)
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.attr(node, name).is_some()
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attr(node, "class")
            .is_some_and(|value| value.split_ascii_whitespace().any(|token| token == class))
    }

    /// Returns true when `node` is reachable from the document root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.root {
                return true;
            }
            let Some(data) = self.nodes.get(&id) else {
                return false;
            };
            current = data.parent;
        }
        false
    }

    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let Some(data) = self.nodes.get(&node) else {
            return;
        };
        match &data.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element { .. } => {
                for child in &data.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        crate::render::html::outer_html(self, node)
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        crate::render::html::inner_html(self, node)
    }

    fn allocate(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, NodeData::new(kind));
        self.revision += 1;
        id
    }

    pub(crate) fn create_element(&mut self, tag: &str) -> NodeId {
        self.allocate(NodeKind::Element {
            tag: tag.to_string(),
        })
    }

    pub(crate) fn create_text(&mut self, text: &str) -> NodeId {
        self.allocate(NodeKind::Text(text.to_string()))
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Appends `child` as the last child of `parent`, detaching it from any previous parent.
    ///
    /// Refuses text parents, unknown nodes, and appends that would create a cycle.
    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.contains(child) || self.tag(parent).is_none() {
            return false;
        }
        if self.is_ancestor_or_self(child, parent) {
            return false;
        }

        self.detach(child);
        if let Some(data) = self.nodes.get_mut(&parent) {
            data.children.push(child);
        }
        if let Some(data) = self.nodes.get_mut(&child) {
            data.parent = Some(parent);
        }
        self.revision += 1;
        true
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        if let Some(data) = self.nodes.get_mut(&parent) {
            data.children.retain(|child| *child != node);
        }
        if let Some(data) = self.nodes.get_mut(&node) {
            data.parent = None;
        }
        self.revision += 1;
    }

    /// Detaches `node` and frees its whole subtree. The root cannot be removed.
    pub(crate) fn remove(&mut self, node: NodeId) -> bool {
        if node == self.root || !self.contains(node) {
            return false;
        }
        self.detach(node);
        self.free_subtree(node);
        true
    }

    fn free_subtree(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(data) = self.nodes.remove(&id) {
                stack.extend(data.children);
            }
        }
        self.revision += 1;
    }

    /// Frees every child subtree of `node`; returns the number of direct children removed.
    pub(crate) fn clear_children(&mut self, node: NodeId) -> usize {
        let children = match self.nodes.get_mut(&node) {
            Some(data) => std::mem::take(&mut data.children),
            None => return 0,
        };
        let removed = children.len();
        for child in children {
            if let Some(data) = self.nodes.get_mut(&child) {
                data.parent = None;
            }
            self.free_subtree(child);
        }
        self.revision += 1;
        removed
    }

    /// Replaces all children of `node` with a single text node (or nothing for empty text).
    pub(crate) fn set_text(&mut self, node: NodeId, text: &str) {
        self.clear_children(node);
        if !text.is_empty() {
            let text_node = self.create_text(text);
            self.append_child(node, text_node);
        }
    }

    pub(crate) fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(data) = self.nodes.get_mut(&node) else {
            return;
        };
        if !matches!(data.kind, NodeKind::Element { .. }) {
            return;
        }
        if let Some(entry) = data.attrs.iter_mut().find(|(key, _)| key == name) {
            if entry.1 == value {
                return;
            }
            entry.1 = value.to_string();
        } else {
            data.attrs.push((name.to_string(), value.to_string()));
        }
        self.revision += 1;
    }

    pub(crate) fn remove_attr(&mut self, node: NodeId, name: &str) -> bool {
        let Some(data) = self.nodes.get_mut(&node) else {
            return false;
        };
        let before = data.attrs.len();
        data.attrs.retain(|(key, _)| key != name);
        let removed = data.attrs.len() != before;
        if removed {
            self.revision += 1;
        }
        removed
    }

    pub(crate) fn add_class(&mut self, node: NodeId, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        let value = match self.attr(node, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        self.set_attr(node, "class", &value);
    }

    pub(crate) fn remove_class(&mut self, node: NodeId, class: &str) {
        let Some(existing) = self.attr(node, "class") else {
            return;
        };
        let remaining = existing
            .split_ascii_whitespace()
            .filter(|token| *token != class)
            .collect::<Vec<_>>()
            .join(" ");
        if remaining.is_empty() {
            self.remove_attr(node, "class");
        } else {
            self.set_attr(node, "class", &remaining);
        }
    }

    /// Builds `nodes` as new children appended to `parent`.
    pub(crate) fn append_markup(&mut self, parent: NodeId, nodes: &[MarkupNode]) {
        for node in nodes {
            let id = match node {
                MarkupNode::Text { text } => self.create_text(text),
                MarkupNode::Element {
                    tag,
                    attrs,
                    children,
                } => {
                    let id = self.create_element(tag);
                    for (name, value) in attrs {
                        self.set_attr(id, name, value);
                    }
                    self.append_markup(id, children);
                    id
                }
            };
            self.append_child(parent, id);
        }
    }

    /// Document-wide `id` lookup over attached nodes.
    ///
    /// Only [`crate::core::locator`] may call this, and only for static landmarks.
    pub(crate) fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if self.attr(node, "id") == Some(id) {
                return Some(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        None
    }
}
