//! XML Document - Mutable arena-based tree
//!
//! Storage for the documents the adapter reads from and writes into:
//! - Arena allocation for nodes, addressed by `NodeId`
//! - Sibling-linked children so insertion and detachment are O(1)
//! - String interning for element/attribute names and prefixes
//!
//! `detach` only unlinks. Subtrees dropped by `remove_children` are released
//! to a free list and their slots reused by later appends.

use super::node::{NodeId, NodeKind, XmlAttribute, XmlNode};
use super::strings::StringPool;
use super::DocumentAccess;
use crate::error::WriteError;
use crate::writer::{Fragment, FragmentEvent, TextWriter, XmlWriter};

/// A mutable XML document stored in arena format
#[derive(Debug, Clone)]
pub struct XmlTree {
    nodes: Vec<XmlNode>,
    /// Released slots awaiting reuse
    free: Vec<NodeId>,
    /// Interned names
    pub strings: StringPool,
}

impl XmlTree {
    /// Id of the document node
    pub const DOCUMENT: NodeId = 0;

    /// Create an empty document
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(64);
        nodes.push(XmlNode::document());
        XmlTree {
            nodes,
            free: Vec::new(),
            strings: StringPool::new(),
        }
    }

    /// First element child of the document node
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(Self::DOCUMENT).find(|&id| self.is_element(id))
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id as usize)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut XmlNode> {
        self.nodes.get_mut(id as usize)
    }

    #[inline]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.get_node(id).map(XmlNode::is_element).unwrap_or(false)
    }

    /// Number of arena slots, including released ones
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn alloc(&mut self, node: XmlNode) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id as usize] = node;
                id
            }
            None => {
                self.nodes.push(node);
                (self.nodes.len() - 1) as NodeId
            }
        }
    }

    /// Return a detached subtree's slots to the free list
    fn release(&mut self, node: NodeId) {
        let mut released = self.descendants(node);
        released.push(node);
        for id in released {
            if let Some(n) = self.node_mut(id) {
                *n = XmlNode::text("", 0, 0);
                n.parent = None;
                self.free.push(id);
            }
        }
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Append a new element as the last child of `parent`
    pub fn append_element(&mut self, parent: NodeId, prefix: &str, local_name: &str) -> NodeId {
        let prefix_id = self.strings.intern(prefix);
        let name_id = self.strings.intern(local_name);
        let depth = self.child_depth(parent);
        let id = self.alloc(XmlNode::element(prefix_id, name_id, parent, depth));
        self.link_last(parent, id);
        id
    }

    /// Append a text node as the last child of `parent`
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let depth = self.child_depth(parent);
        let id = self.alloc(XmlNode::text(text, parent, depth));
        self.link_last(parent, id);
        id
    }

    /// Replace all children of `node` with a single text node
    ///
    /// An empty string leaves the element without children.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        self.remove_children(node);
        if !text.is_empty() {
            self.append_text(node, text);
        }
    }

    fn child_depth(&self, parent: NodeId) -> u16 {
        self.get_node(parent)
            .map(|p| p.depth.saturating_add(1))
            .unwrap_or(1)
    }

    fn link_last(&mut self, parent: NodeId, child: NodeId) {
        let prev = self.get_node(parent).and_then(|p| p.last_child);
        if let Some(prev) = prev {
            if let Some(p) = self.node_mut(prev) {
                p.next_sibling = Some(child);
            }
        }
        if let Some(c) = self.node_mut(child) {
            c.parent = Some(parent);
            c.prev_sibling = prev;
            c.next_sibling = None;
        }
        if let Some(p) = self.node_mut(parent) {
            if p.first_child.is_none() {
                p.first_child = Some(child);
            }
            p.last_child = Some(child);
        }
    }

    /// Unlink `node` from its parent
    pub fn detach(&mut self, node: NodeId) {
        let Some((parent, prev, next)) = self
            .get_node(node)
            .map(|n| (n.parent, n.prev_sibling, n.next_sibling))
        else {
            return;
        };
        let Some(parent) = parent else {
            return;
        };

        match prev {
            Some(prev) => {
                if let Some(p) = self.node_mut(prev) {
                    p.next_sibling = next;
                }
            }
            None => {
                if let Some(p) = self.node_mut(parent) {
                    p.first_child = next;
                }
            }
        }
        match next {
            Some(next) => {
                if let Some(n) = self.node_mut(next) {
                    n.prev_sibling = prev;
                }
            }
            None => {
                if let Some(p) = self.node_mut(parent) {
                    p.last_child = prev;
                }
            }
        }
        if let Some(n) = self.node_mut(node) {
            n.parent = None;
            n.prev_sibling = None;
            n.next_sibling = None;
        }
    }

    /// Drop every child of `node`, releasing their slots for reuse
    ///
    /// Ids of the removed nodes become invalid.
    pub fn remove_children(&mut self, node: NodeId) {
        let children: Vec<NodeId> = self.children(node).collect();
        for child in children {
            self.detach(child);
            self.release(child);
        }
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    /// Set an attribute, replacing any existing value
    pub fn set_attribute(&mut self, node: NodeId, prefix: &str, local_name: &str, value: &str) {
        let prefix_id = self.strings.intern(prefix);
        let name_id = self.strings.intern(local_name);
        let Some(n) = self.node_mut(node) else {
            return;
        };
        match n
            .attributes
            .iter_mut()
            .find(|a| a.prefix_id == prefix_id && a.name_id == name_id)
        {
            Some(attr) => {
                attr.value.clear();
                attr.value.push_str(value);
            }
            None => n.attributes.push(XmlAttribute {
                prefix_id,
                name_id,
                value: value.to_string(),
            }),
        }
    }

    /// Remove an attribute; returns whether it existed
    pub fn remove_attribute(&mut self, node: NodeId, prefix: &str, local_name: &str) -> bool {
        let (Some(prefix_id), Some(name_id)) =
            (self.strings.lookup(prefix), self.strings.lookup(local_name))
        else {
            return false;
        };
        let Some(n) = self.node_mut(node) else {
            return false;
        };
        let before = n.attributes.len();
        n.attributes
            .retain(|a| !(a.prefix_id == prefix_id && a.name_id == name_id));
        n.attributes.len() != before
    }

    /// Get an attribute value by prefix and local name
    pub fn attribute(&self, node: NodeId, prefix: &str, local_name: &str) -> Option<&str> {
        let prefix_id = self.strings.lookup(prefix)?;
        let name_id = self.strings.lookup(local_name)?;
        self.get_node(node)?
            .attributes
            .iter()
            .find(|a| a.prefix_id == prefix_id && a.name_id == name_id)
            .map(|a| a.value.as_str())
    }

    /// Attributes of an element in document order
    pub fn attributes(&self, node: NodeId) -> &[XmlAttribute] {
        self.get_node(node)
            .map(|n| n.attributes.as_slice())
            .unwrap_or(&[])
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        if !node.is_element() {
            return None;
        }
        self.strings.get_str(node.name_id)
    }

    pub fn prefix(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        self.strings.get_str(node.prefix_id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.parent
    }

    /// Iterate over the children of a node
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get_node(id).and_then(|n| n.first_child),
        }
    }

    /// Child elements with the given name
    pub fn child_elements<'a>(
        &'a self,
        id: NodeId,
        prefix: &'a str,
        local_name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id).filter(move |&child| {
            self.local_name(child) == Some(local_name) && self.prefix(child) == Some(prefix)
        })
    }

    /// All descendants in document order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).collect();
        stack.reverse();
        while let Some(node) = stack.pop() {
            result.push(node);
            let first = stack.len();
            stack.extend(self.children(node));
            stack[first..].reverse();
        }
        result
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        match self.get_node(id) {
            Some(node) if node.is_text() => node.text.clone(),
            Some(_) => self
                .descendants(id)
                .into_iter()
                .filter_map(|d| self.get_node(d))
                .filter(|n| n.is_text())
                .map(|n| n.text.as_str())
                .collect(),
            None => String::new(),
        }
    }

    /// First element in document order carrying the given attribute value
    pub fn find_element_with_attribute(
        &self,
        prefix: &str,
        local_name: &str,
        value: &str,
    ) -> Option<NodeId> {
        self.descendants(Self::DOCUMENT)
            .into_iter()
            .filter(|&id| self.is_element(id))
            .find(|&id| self.attribute(id, prefix, local_name) == Some(value))
    }

    // ------------------------------------------------------------------
    // Fragments and serialization
    // ------------------------------------------------------------------

    /// Commit a buffered fragment under `parent`
    ///
    /// Returns the ids of the top-level elements created. Leading attributes
    /// land on `parent` itself.
    pub fn insert_fragment(
        &mut self,
        parent: NodeId,
        fragment: &Fragment,
    ) -> Result<Vec<NodeId>, WriteError> {
        let mut created = Vec::new();
        let mut stack = vec![parent];

        for event in fragment.events() {
            let top = *stack.last().ok_or(WriteError::NoOpenElement)?;
            match event {
                FragmentEvent::StartElement { prefix, local_name } => {
                    let id = self.append_element(top, prefix, local_name);
                    if stack.len() == 1 {
                        created.push(id);
                    }
                    stack.push(id);
                }
                FragmentEvent::EndElement => {
                    if stack.len() == 1 {
                        return Err(WriteError::NoOpenElement);
                    }
                    stack.pop();
                }
                FragmentEvent::Attribute {
                    prefix,
                    local_name,
                    value,
                } => self.set_attribute(top, prefix, local_name, value),
                FragmentEvent::Text(text) => {
                    self.append_text(top, text);
                }
            }
        }

        match stack.len() {
            1 => Ok(created),
            n => Err(WriteError::Unclosed(n - 1)),
        }
    }

    /// Replay the subtree rooted at `id` into a writer
    pub fn write_to<W: XmlWriter>(&self, id: NodeId, writer: &mut W) -> Result<(), WriteError> {
        let Some(node) = self.get_node(id) else {
            return Ok(());
        };
        match node.kind {
            NodeKind::Document => {
                for child in self.children(id) {
                    self.write_to(child, writer)?;
                }
            }
            NodeKind::Text => writer.write_string(&node.text)?,
            NodeKind::Element => {
                writer.write_start_element(
                    self.strings.get_str(node.prefix_id).unwrap_or_default(),
                    self.strings.get_str(node.name_id).unwrap_or_default(),
                )?;
                for attr in &node.attributes {
                    writer.write_attribute(
                        self.strings.get_str(attr.prefix_id).unwrap_or_default(),
                        self.strings.get_str(attr.name_id).unwrap_or_default(),
                        &attr.value,
                    )?;
                }
                for child in self.children(id) {
                    self.write_to(child, writer)?;
                }
                writer.write_end_element()?;
            }
        }
        Ok(())
    }

    /// Serialize the whole document
    pub fn to_xml_string(&self) -> Result<String, WriteError> {
        let mut writer = TextWriter::new();
        self.write_to(Self::DOCUMENT, &mut writer)?;
        writer.finish()
    }
}

impl Default for XmlTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a node's children
pub struct Children<'a> {
    tree: &'a XmlTree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.get_node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

impl DocumentAccess for XmlTree {
    fn document_node_id(&self) -> NodeId {
        Self::DOCUMENT
    }

    fn node_kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get_node(id).map(|n| n.kind)
    }

    fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id)
    }

    fn node_local_name(&self, id: NodeId) -> Option<&str> {
        self.local_name(id)
    }

    fn node_prefix(&self, id: NodeId) -> Option<&str> {
        self.prefix(id)
    }

    fn get_attribute(&self, id: NodeId, prefix: &str, local_name: &str) -> Option<&str> {
        self.attribute(id, prefix, local_name)
    }

    fn attribute_values(&self, id: NodeId) -> Vec<&str> {
        self.attributes(id).iter().map(|a| a.value.as_str()).collect()
    }

    fn children_vec(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).collect()
    }

    fn descendants_vec(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
    }

    fn string_value(&self, id: NodeId) -> String {
        self.text_content(id)
    }
}
