//! Compiled Path Nodes
//!
//! One pre-resolved step of a document-emission plan. Nodes are built once
//! by a path compiler and are read-only afterwards.
//!
//! - `next` is the owned sibling produced after this node in traversal order
//! - `dependencies` are shared nodes emitted alongside, never owned
//!
//! The constructors tie value expressions to kinds: attribute and simple
//! element nodes always carry one, complex elements never do.

use crate::xpath::CompiledExpr;
use std::sync::Arc;

/// What a node emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathNodeKind {
    /// `prefix:name="value"` on the enclosing element
    Attribute,
    /// `<prefix:name>value</prefix:name>`
    SimpleElement,
    /// Element whose content comes from `next` and `dependencies`
    ComplexElement,
}

/// Compiled path node
#[derive(Debug, Clone)]
pub struct CompiledPathNode {
    kind: PathNodeKind,
    prefix: String,
    local_name: String,
    value: Option<Arc<CompiledExpr>>,
    next: Option<Box<CompiledPathNode>>,
    dependencies: Vec<Arc<CompiledPathNode>>,
}

impl CompiledPathNode {
    fn new(
        kind: PathNodeKind,
        prefix: &str,
        local_name: &str,
        value: Option<Arc<CompiledExpr>>,
    ) -> Self {
        CompiledPathNode {
            kind,
            prefix: prefix.to_string(),
            local_name: local_name.to_string(),
            value,
            next: None,
            dependencies: Vec::new(),
        }
    }

    /// Attribute node written with the evaluated value
    pub fn attribute(prefix: &str, local_name: &str, value: Arc<CompiledExpr>) -> Self {
        Self::new(PathNodeKind::Attribute, prefix, local_name, Some(value))
    }

    /// Element node holding only the evaluated value
    pub fn simple_element(prefix: &str, local_name: &str, value: Arc<CompiledExpr>) -> Self {
        Self::new(PathNodeKind::SimpleElement, prefix, local_name, Some(value))
    }

    /// Element node whose content comes from its subnodes
    pub fn complex_element(prefix: &str, local_name: &str) -> Self {
        Self::new(PathNodeKind::ComplexElement, prefix, local_name, None)
    }

    /// Set the sibling emitted after this node
    ///
    /// Only complex elements traverse `next`; on other kinds it is inert.
    pub fn with_next(mut self, next: CompiledPathNode) -> Self {
        self.next = Some(Box::new(next));
        self
    }

    /// Append a shared dependency
    pub fn with_dependency(mut self, dependency: Arc<CompiledPathNode>) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn kind(&self) -> PathNodeKind {
        self.kind
    }

    #[inline]
    pub fn is_attribute(&self) -> bool {
        self.kind == PathNodeKind::Attribute
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn value(&self) -> Option<&CompiledExpr> {
        self.value.as_deref()
    }

    pub fn next(&self) -> Option<&CompiledPathNode> {
        self.next.as_deref()
    }

    pub fn dependencies(&self) -> &[Arc<CompiledPathNode>] {
        &self.dependencies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_and_values() {
        let value = Arc::new(CompiledExpr::literal("v"));
        let attr = CompiledPathNode::attribute("x", "id", Arc::clone(&value));
        assert!(attr.is_attribute());
        assert_eq!(attr.value().map(|v| v.source.as_str()), Some("'v'"));

        let complex = CompiledPathNode::complex_element("", "Item1");
        assert_eq!(complex.kind(), PathNodeKind::ComplexElement);
        assert!(complex.value().is_none());
    }

    #[test]
    fn test_dependencies_are_shared() {
        let shared = Arc::new(CompiledPathNode::attribute(
            "",
            "k",
            Arc::new(CompiledExpr::literal("1")),
        ));
        let a = CompiledPathNode::complex_element("", "a").with_dependency(Arc::clone(&shared));
        let b = CompiledPathNode::complex_element("", "b").with_dependency(Arc::clone(&shared));
        assert!(Arc::ptr_eq(&a.dependencies()[0], &b.dependencies()[0]));
        assert_eq!(Arc::strong_count(&shared), 3);
    }

    #[test]
    fn test_next_is_owned() {
        let node = CompiledPathNode::complex_element("", "a")
            .with_next(CompiledPathNode::complex_element("", "b"));
        assert_eq!(node.next().map(|n| n.local_name()), Some("b"));
    }
}
