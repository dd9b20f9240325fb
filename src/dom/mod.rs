//! DOM Module - Mutable arena-based XML document
//!
//! Implements the document collaborator the adapter reads and writes:
//! - Arena allocation for nodes
//! - NodeId (u32) indices for cache-friendly traversal
//! - String interning for element/attribute names

pub mod document;
pub mod node;
pub mod strings;

pub use document::{Children, XmlTree};
pub use node::{NodeId, NodeKind, XmlAttribute, XmlNode};
pub use strings::StringPool;

/// Trait for read-only document access - lets XPath evaluate against any tree
pub trait DocumentAccess {
    /// The document node (parent of the root element)
    fn document_node_id(&self) -> NodeId;

    fn node_kind(&self, id: NodeId) -> Option<NodeKind>;

    fn parent_of(&self, id: NodeId) -> Option<NodeId>;

    /// Local name of an element (without prefix)
    fn node_local_name(&self, id: NodeId) -> Option<&str>;

    /// Namespace prefix of an element, empty if none
    fn node_prefix(&self, id: NodeId) -> Option<&str>;

    /// Get attribute value by prefix and local name
    fn get_attribute(&self, id: NodeId, prefix: &str, local_name: &str) -> Option<&str>;

    /// All attribute values of an element in document order
    fn attribute_values(&self, id: NodeId) -> Vec<&str>;

    /// Children - returns collected Vec for trait object compatibility
    fn children_vec(&self, id: NodeId) -> Vec<NodeId>;

    /// Descendants in document order - returns collected Vec for trait object compatibility
    fn descendants_vec(&self, id: NodeId) -> Vec<NodeId>;

    /// XPath string-value of a node
    fn string_value(&self, id: NodeId) -> String;

    /// Qualified name of an element (`prefix:local` or `local`)
    fn node_name(&self, id: NodeId) -> Option<String> {
        let local = self.node_local_name(id)?;
        match self.node_prefix(id) {
            Some(prefix) if !prefix.is_empty() => Some(format!("{}:{}", prefix, local)),
            _ => Some(local.to_string()),
        }
    }
}
