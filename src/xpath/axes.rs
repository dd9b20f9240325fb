//! XPath Axes
//!
//! Supported axes:
//! - child, parent, self
//! - descendant, descendant-or-self
//! - attribute (yields attribute values, not nodes)

use super::parser::{Axis, NodeTest};
use crate::dom::{DocumentAccess, NodeId, NodeKind};

/// Navigate along a node axis from a context node
///
/// The attribute axis is handled by `attribute_values`.
pub fn navigate<D: DocumentAccess>(doc: &D, context: NodeId, axis: Axis) -> Vec<NodeId> {
    match axis {
        Axis::Child => doc.children_vec(context),
        Axis::Descendant => doc.descendants_vec(context),
        Axis::DescendantOrSelf => {
            let descendants = doc.descendants_vec(context);
            let mut result = Vec::with_capacity(1 + descendants.len());
            result.push(context);
            result.extend(descendants);
            result
        }
        Axis::Parent => doc.parent_of(context).into_iter().collect(),
        Axis::Self_ => vec![context],
        Axis::Attribute => Vec::new(),
    }
}

/// Check whether a node satisfies a node test
pub fn matches_node_test<D: DocumentAccess>(doc: &D, node: NodeId, test: &NodeTest) -> bool {
    let kind = doc.node_kind(node);
    match test {
        NodeTest::Node => true,
        NodeTest::Text => kind == Some(NodeKind::Text),
        NodeTest::Any => kind == Some(NodeKind::Element),
        NodeTest::Name(name) => {
            doc.node_local_name(node) == Some(name.as_str())
                && doc.node_prefix(node).unwrap_or_default().is_empty()
        }
        NodeTest::QName(prefix, local) => {
            doc.node_local_name(node) == Some(local.as_str())
                && doc.node_prefix(node) == Some(prefix.as_str())
        }
    }
}

/// Values of the attributes of `node` matching the test
pub fn attribute_values<D: DocumentAccess>(doc: &D, node: NodeId, test: &NodeTest) -> Vec<String> {
    match test {
        NodeTest::Any | NodeTest::Node => doc
            .attribute_values(node)
            .into_iter()
            .map(str::to_string)
            .collect(),
        NodeTest::Name(name) => doc
            .get_attribute(node, "", name)
            .map(str::to_string)
            .into_iter()
            .collect(),
        NodeTest::QName(prefix, local) => doc
            .get_attribute(node, prefix, local)
            .map(str::to_string)
            .into_iter()
            .collect(),
        NodeTest::Text => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::XmlTree;

    fn tree() -> (XmlTree, NodeId, NodeId, NodeId) {
        let mut t = XmlTree::new();
        let root = t.append_element(XmlTree::DOCUMENT, "", "root");
        let a = t.append_element(root, "", "a");
        let b = t.append_element(root, "p", "a");
        t.set_attribute(a, "", "k", "1");
        t.set_attribute(a, "x", "id", "2");
        (t, root, a, b)
    }

    #[test]
    fn test_child_and_parent() {
        let (t, root, a, b) = tree();
        assert_eq!(navigate(&t, root, Axis::Child), vec![a, b]);
        assert_eq!(navigate(&t, a, Axis::Parent), vec![root]);
        assert_eq!(navigate(&t, XmlTree::DOCUMENT, Axis::Parent), Vec::<NodeId>::new());
    }

    #[test]
    fn test_name_tests_respect_prefix() {
        let (t, _, a, b) = tree();
        let plain = NodeTest::Name("a".into());
        let prefixed = NodeTest::QName("p".into(), "a".into());
        assert!(matches_node_test(&t, a, &plain));
        assert!(!matches_node_test(&t, b, &plain));
        assert!(matches_node_test(&t, b, &prefixed));
    }

    #[test]
    fn test_attribute_values() {
        let (t, _, a, _) = tree();
        assert_eq!(attribute_values(&t, a, &NodeTest::Name("k".into())), vec!["1"]);
        assert_eq!(
            attribute_values(&t, a, &NodeTest::QName("x".into(), "id".into())),
            vec!["2"]
        );
        assert_eq!(attribute_values(&t, a, &NodeTest::Any).len(), 2);
    }
}
