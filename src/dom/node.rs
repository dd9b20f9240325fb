//! XML Node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references.

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// Type of XML node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node
    Element,
    /// Text content
    Text,
}

/// An XML node in the arena
#[derive(Debug, Clone)]
pub struct XmlNode {
    /// Type of this node
    pub kind: NodeKind,
    /// Parent node (None for document root and detached nodes)
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    /// Index into string pool for the local name, or 0
    pub name_id: u32,
    /// Index into string pool for namespace prefix, or 0
    pub prefix_id: u32,
    /// Attributes in document order (elements only)
    pub attributes: Vec<XmlAttribute>,
    /// Character data (text nodes only)
    pub text: String,
    /// Depth in document tree
    pub depth: u16,
}

impl XmlNode {
    /// Create a new document root node
    pub fn document() -> Self {
        Self::with_kind(NodeKind::Document, None, 0)
    }

    /// Create a new element node
    pub fn element(prefix_id: u32, name_id: u32, parent: NodeId, depth: u16) -> Self {
        XmlNode {
            name_id,
            prefix_id,
            ..Self::with_kind(NodeKind::Element, Some(parent), depth)
        }
    }

    /// Create a new text node
    pub fn text(text: &str, parent: NodeId, depth: u16) -> Self {
        XmlNode {
            text: text.to_string(),
            ..Self::with_kind(NodeKind::Text, Some(parent), depth)
        }
    }

    fn with_kind(kind: NodeKind, parent: Option<NodeId>, depth: u16) -> Self {
        XmlNode {
            kind,
            parent,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name_id: 0,
            prefix_id: 0,
            attributes: Vec::new(),
            text: String::new(),
            depth,
        }
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }
}

/// Stored attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    /// Index into string pool for namespace prefix
    pub prefix_id: u32,
    /// Index into string pool for attribute local name
    pub name_id: u32,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let doc = XmlNode::document();
        assert_eq!(doc.kind, NodeKind::Document);
        assert!(doc.parent.is_none());
        assert_eq!(doc.depth, 0);
    }

    #[test]
    fn test_element_node() {
        let elem = XmlNode::element(0, 1, 0, 1);
        assert!(elem.is_element());
        assert_eq!(elem.parent, Some(0));
        assert_eq!(elem.name_id, 1);
        assert!(!elem.has_children());
    }

    #[test]
    fn test_text_node() {
        let text = XmlNode::text("hi", 3, 2);
        assert!(text.is_text());
        assert_eq!(text.text, "hi");
    }
}
