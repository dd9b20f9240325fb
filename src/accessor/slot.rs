//! Slot Accessor
//!
//! Reads and writes slot `n` of a tuple as the child element `Item{n}` of the
//! tuple's element.
//!
//! - missing slot on a probe read: the slot type's default, nothing created
//! - null slot: element present with `xsi:nil="true"` and no content
//! - reference slots: a tuple already written in this operation becomes
//!   `x:ref="n"` pointing at the element carrying `x:id="n"`
//!
//! Slot elements are created by writing a compiled complex-element path into
//! a buffered fragment and committing it under the tuple's element.

use super::{AccessorId, XmlAccessor};
use crate::adapter::XmlAdapter;
use crate::dom::{NodeId, XmlTree};
use crate::error::CodecError;
use crate::path::{CompiledPathNode, PathWriter};
use crate::serializer::{XmlTypeKind, XmlTypeSerializer};
use crate::value::{slot_equals, TypeDescriptor, Value};
use crate::writer::FragmentWriter;
use crate::xpath::NodeEvaluator;
use std::sync::Arc;

/// Accessor for one tuple slot
#[derive(Debug)]
pub struct SlotAccessor {
    id: AccessorId,
    index: usize,
    name: String,
    descriptor: TypeDescriptor,
    serializer: Arc<dyn XmlTypeSerializer>,
    is_reference: bool,
    path: CompiledPathNode,
}

/// Candidate elements for one slot
///
/// A mutable cursor belongs to a write and may have elements created for it.
#[derive(Debug, Clone)]
pub struct SlotCursor {
    nodes: std::vec::IntoIter<NodeId>,
    mutable: bool,
}

impl SlotCursor {
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }
}

impl Iterator for SlotCursor {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        self.nodes.next()
    }
}

impl SlotAccessor {
    pub(crate) fn new(
        id: AccessorId,
        index: usize,
        descriptor: TypeDescriptor,
        serializer: Arc<dyn XmlTypeSerializer>,
        is_reference: bool,
    ) -> Self {
        let name = format!("Item{}", index + 1);
        let path = CompiledPathNode::complex_element("", &name);
        SlotAccessor {
            id,
            index,
            name,
            descriptor,
            serializer,
            is_reference,
            path,
        }
    }

    /// 0-based slot index
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// Elements under `node` that can hold this slot
    pub fn select_candidate_nodes(&self, node: NodeId, tree: &XmlTree, mutable: bool) -> SlotCursor {
        let nodes: Vec<NodeId> = tree.child_elements(node, "", &self.name).collect();
        SlotCursor {
            nodes: nodes.into_iter(),
            mutable,
        }
    }

    /// Read this slot of the tuple stored at `node`
    ///
    /// A probe read never changes the document. A non-probe read of a
    /// missing complex slot creates its element first.
    pub fn get(&self, node: NodeId, parent: &mut XmlAdapter, probe: bool) -> Result<Value, CodecError> {
        let mut cursor = self.select_candidate_nodes(node, parent.tree(), !probe);
        let element = match cursor.next() {
            Some(element) => element,
            None if cursor.is_mutable() && self.serializer.kind() == XmlTypeKind::Complex => {
                tracing::trace!(slot = self.name.as_str(), "stub missing slot");
                self.create_element(node, parent)?
            }
            None => return Ok(self.descriptor.default_value()),
        };
        tracing::trace!(slot = self.name.as_str(), element, "get slot");
        self.read_element(element, parent)
    }

    /// Write `assigned` into this slot of the tuple stored at `node`
    ///
    /// `original` is the slot's previously persisted value, `None` when the
    /// stored tuple is unknown. `assigned` may be replaced with the value
    /// actually stored.
    pub fn set(
        &self,
        node: NodeId,
        parent: &mut XmlAdapter,
        original: Option<&Value>,
        assigned: &mut Value,
    ) -> Result<(), CodecError> {
        let existing = self
            .select_candidate_nodes(node, parent.tree(), true)
            .next();
        tracing::trace!(slot = self.name.as_str(), ?existing, "set slot");

        if assigned.is_null() {
            let element = match existing {
                Some(element) => element,
                None => self.create_element(node, parent)?,
            };
            parent.set_nil(element);
            return Ok(());
        }

        if let (Some(element), Some(original)) = (existing, original) {
            if self.is_unchanged(element, parent, original, assigned)? {
                return Ok(());
            }
        }

        let element = match existing {
            Some(element) => element,
            None => self.create_element(node, parent)?,
        };
        parent.clear_nil(element);

        if self.is_reference {
            if let Value::Tuple(tuple) = assigned {
                if let Some(target) = parent.references().written_node(tuple) {
                    if target != element {
                        let id = parent.reference_id(target);
                        parent.write_reference(element, id);
                        tracing::debug!(slot = self.name.as_str(), id, "tuple written as reference");
                    }
                    return Ok(());
                }
                parent.references_mut().record_written(tuple, element);
            }
        }
        parent.clear_reference(element);

        let old = original.filter(|v| !v.is_null());
        self.serializer
            .set_value(element, parent, self, old, assigned)
    }

    /// Whether `element` already holds `assigned`
    ///
    /// The caller's `original` must agree with `assigned` and the element's
    /// current content must read back equal to it.
    fn is_unchanged(
        &self,
        element: NodeId,
        parent: &mut XmlAdapter,
        original: &Value,
        assigned: &Value,
    ) -> Result<bool, CodecError> {
        let tracked = self.is_reference && matches!(assigned, Value::Tuple(_));
        if tracked
            || parent.is_nil(element)
            || parent.reference_of(element)?.is_some()
            || !slot_equals(&self.descriptor, original, assigned)
        {
            return Ok(false);
        }
        match self.serializer.get_value(element, parent, self) {
            Ok(stored) => Ok(slot_equals(&self.descriptor, &stored, assigned)),
            Err(err) => {
                tracing::debug!(slot = self.name.as_str(), %err, "stored slot unreadable, rewriting");
                Ok(false)
            }
        }
    }

    fn read_element(&self, element: NodeId, parent: &mut XmlAdapter) -> Result<Value, CodecError> {
        if parent.is_nil(element) {
            return Ok(Value::Null);
        }
        if !self.is_reference {
            return self.serializer.get_value(element, parent, self);
        }
        if let Some(id) = parent.reference_of(element)? {
            return self.resolve_reference(id, parent);
        }

        let value = self.serializer.get_value(element, parent, self)?;
        if let Some(id) = parent.id_of(element)? {
            parent.references_mut().record_read(id, value.clone());
        }
        Ok(value)
    }

    fn resolve_reference(&self, id: u32, parent: &mut XmlAdapter) -> Result<Value, CodecError> {
        if let Some(value) = parent.references().resolved(id) {
            return Ok(value.clone());
        }
        let target = parent
            .find_by_id(id)
            .ok_or(CodecError::UnresolvedReference(id))?;
        if parent.reference_of(target)?.is_some() {
            return Err(CodecError::UnresolvedReference(id));
        }

        let value = self.serializer.get_value(target, parent, self)?;
        parent.references_mut().record_read(id, value.clone());
        Ok(value)
    }

    /// Create this slot's element as the last child of `node`
    fn create_element(&self, node: NodeId, parent: &mut XmlAdapter) -> Result<NodeId, CodecError> {
        let fragment = {
            let evaluator = NodeEvaluator::new(parent.tree(), node);
            let mut writer = FragmentWriter::new();
            PathWriter::new(&mut writer, &evaluator).write_node(&self.path)?;
            writer.into_fragment()?
        };
        let created = parent.tree_mut().insert_fragment(node, &fragment)?;
        created
            .first()
            .copied()
            .ok_or(CodecError::NotAnElement(node))
    }
}

impl XmlAccessor for SlotAccessor {
    fn id(&self) -> AccessorId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_reference(&self) -> bool {
        self.is_reference
    }

    fn is_nillable(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::AdapterMeta;
    use crate::serializer::serializer_for;
    use crate::settings::AdapterSettings;
    use crate::value::{ScalarType, TupleValue};
    use rstest::rstest;

    fn adapter() -> (XmlAdapter, NodeId) {
        let mut adapter = XmlAdapter::new(Arc::new(AdapterMeta::new()), AdapterSettings::default());
        let root = adapter.root();
        let node = adapter.tree_mut().append_element(root, "", "value");
        (adapter, node)
    }

    fn slot(
        adapter: &XmlAdapter,
        index: usize,
        descriptor: TypeDescriptor,
        is_reference: bool,
    ) -> SlotAccessor {
        let serializer = serializer_for(&descriptor).unwrap();
        let id = adapter.meta().accessors().allocate_id();
        SlotAccessor::new(id, index, descriptor, serializer, is_reference)
    }

    fn pair() -> TypeDescriptor {
        TypeDescriptor::tuple([
            TypeDescriptor::Scalar(ScalarType::Int),
            TypeDescriptor::Scalar(ScalarType::Int),
        ])
    }

    #[test]
    fn test_create_and_read_scalar() {
        let (mut adapter, node) = adapter();
        let slot = slot(&adapter, 1, TypeDescriptor::Scalar(ScalarType::String), false);

        let mut value = Value::from("hello");
        slot.set(node, &mut adapter, None, &mut value).unwrap();

        let cursor = slot.select_candidate_nodes(node, adapter.tree(), false);
        assert!(!cursor.is_mutable());
        let elements: Vec<NodeId> = cursor.collect();
        assert_eq!(elements.len(), 1);
        assert_eq!(adapter.tree().local_name(elements[0]), Some("Item2"));

        assert_eq!(slot.get(node, &mut adapter, true).unwrap(), Value::from("hello"));
    }

    #[test]
    fn test_non_probe_read_stubs_complex_slot() {
        let (mut adapter, node) = adapter();
        let slot = slot(&adapter, 0, pair(), false);

        assert_eq!(slot.get(node, &mut adapter, true).unwrap(), Value::Null);
        assert_eq!(slot.select_candidate_nodes(node, adapter.tree(), false).count(), 0);

        let value = slot.get(node, &mut adapter, false).unwrap();
        assert_eq!(value, Value::tuple(vec![Value::Int(0), Value::Int(0)]));
        assert_eq!(slot.select_candidate_nodes(node, adapter.tree(), false).count(), 1);
    }

    #[test]
    fn test_non_probe_read_leaves_missing_scalar() {
        let (mut adapter, node) = adapter();
        let slot = slot(&adapter, 0, TypeDescriptor::Scalar(ScalarType::Int), false);
        assert_eq!(slot.get(node, &mut adapter, false).unwrap(), Value::Int(0));
        assert_eq!(slot.select_candidate_nodes(node, adapter.tree(), false).count(), 0);
    }

    #[test]
    fn test_nil_replaces_content() {
        let (mut adapter, node) = adapter();
        let slot = slot(&adapter, 0, TypeDescriptor::Scalar(ScalarType::Int), false);

        let mut value = Value::Int(4);
        slot.set(node, &mut adapter, None, &mut value).unwrap();
        let mut null = Value::Null;
        slot.set(node, &mut adapter, Some(&Value::Int(4)), &mut null).unwrap();

        let element = slot.select_candidate_nodes(node, adapter.tree(), false).next().unwrap();
        assert!(adapter.is_nil(element));
        assert!(!adapter.tree().get_node(element).unwrap().has_children());
        assert_eq!(slot.get(node, &mut adapter, true).unwrap(), Value::Null);

        // Writing a value again clears the marker
        let mut value = Value::Int(5);
        slot.set(node, &mut adapter, None, &mut value).unwrap();
        assert!(!adapter.is_nil(element));
        assert_eq!(slot.get(node, &mut adapter, true).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_shared_tuple_written_as_reference() {
        let (mut adapter, node) = adapter();
        let first = slot(&adapter, 0, pair(), true);
        let second = slot(&adapter, 1, pair(), true);

        let shared = TupleValue::new(vec![Value::Int(1), Value::Int(2)]);
        let mut a = Value::Tuple(shared.clone());
        let mut b = Value::Tuple(shared.clone());
        first.set(node, &mut adapter, None, &mut a).unwrap();
        second.set(node, &mut adapter, None, &mut b).unwrap();

        let e1 = first.select_candidate_nodes(node, adapter.tree(), false).next().unwrap();
        let e2 = second.select_candidate_nodes(node, adapter.tree(), false).next().unwrap();
        assert_eq!(adapter.tree().attribute(e1, "x", "id"), Some("1"));
        assert_eq!(adapter.tree().attribute(e2, "x", "ref"), Some("1"));
        assert!(!adapter.tree().get_node(e2).unwrap().has_children());

        adapter.references_mut().clear();
        let r1 = first.get(node, &mut adapter, true).unwrap();
        let r2 = second.get(node, &mut adapter, true).unwrap();
        assert_eq!(r1, Value::Tuple(shared));
        assert!(TupleValue::ptr_eq(r1.as_tuple().unwrap(), r2.as_tuple().unwrap()));
    }

    #[test]
    fn test_reference_resolved_on_demand() {
        let (mut adapter, node) = adapter();
        let first = slot(&adapter, 0, pair(), true);
        let second = slot(&adapter, 1, pair(), true);

        let shared = TupleValue::new(vec![Value::Int(3), Value::Int(4)]);
        first
            .set(node, &mut adapter, None, &mut Value::Tuple(shared.clone()))
            .unwrap();
        second
            .set(node, &mut adapter, None, &mut Value::Tuple(shared))
            .unwrap();

        // Read the referencing slot first
        adapter.references_mut().clear();
        let r2 = second.get(node, &mut adapter, true).unwrap();
        assert_eq!(r2, Value::tuple(vec![Value::Int(3), Value::Int(4)]));
    }

    #[test]
    fn test_unresolved_reference() {
        let (mut adapter, node) = adapter();
        let slot = slot(&adapter, 0, pair(), true);
        let item = adapter.tree_mut().append_element(node, "", "Item1");
        adapter.tree_mut().set_attribute(item, "x", "ref", "42");

        let err = slot.get(node, &mut adapter, true).unwrap_err();
        assert_eq!(err, CodecError::UnresolvedReference(42));
    }

    #[test]
    fn test_equal_tuples_without_reference_flag_are_copied() {
        let (mut adapter, node) = adapter();
        let first = slot(&adapter, 0, pair(), false);
        let second = slot(&adapter, 1, pair(), false);

        let shared = TupleValue::new(vec![Value::Int(1), Value::Int(2)]);
        first
            .set(node, &mut adapter, None, &mut Value::Tuple(shared.clone()))
            .unwrap();
        second
            .set(node, &mut adapter, None, &mut Value::Tuple(shared))
            .unwrap();

        let e2 = second.select_candidate_nodes(node, adapter.tree(), false).next().unwrap();
        assert_eq!(adapter.tree().attribute(e2, "x", "ref"), None);
        assert!(adapter.tree().get_node(e2).unwrap().has_children());
    }

    #[rstest]
    #[case::int(ScalarType::Int, Value::Int(0))]
    #[case::float(ScalarType::Float, Value::Float(0.0))]
    #[case::boolean(ScalarType::Bool, Value::Bool(false))]
    #[case::string(ScalarType::String, Value::Null)]
    fn test_missing_scalar_reads_type_default(#[case] ty: ScalarType, #[case] expected: Value) {
        let (mut adapter, node) = adapter();
        let slot = slot(&adapter, 0, TypeDescriptor::Scalar(ty), false);
        assert_eq!(slot.get(node, &mut adapter, true).unwrap(), expected);
    }

    #[test]
    fn test_unknown_original_rewrites_default_value() {
        let (mut adapter, node) = adapter();
        let slot = slot(&adapter, 0, TypeDescriptor::Scalar(ScalarType::Int), false);

        slot.set(node, &mut adapter, None, &mut Value::Int(5)).unwrap();
        slot.set(node, &mut adapter, None, &mut Value::Int(0)).unwrap();
        assert_eq!(slot.get(node, &mut adapter, true).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_stale_original_does_not_skip_write() {
        let (mut adapter, node) = adapter();
        let slot = slot(&adapter, 0, TypeDescriptor::Scalar(ScalarType::Bool), false);

        slot.set(node, &mut adapter, None, &mut Value::Bool(true)).unwrap();
        // Claimed old value disagrees with the document
        slot.set(node, &mut adapter, Some(&Value::Bool(false)), &mut Value::Bool(false))
            .unwrap();
        assert_eq!(slot.get(node, &mut adapter, true).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_matching_original_leaves_element_alone() {
        let (mut adapter, node) = adapter();
        let slot = slot(&adapter, 0, TypeDescriptor::Scalar(ScalarType::Int), false);
        let item = adapter.tree_mut().append_element(node, "", "Item1");
        adapter.tree_mut().set_text(item, " 7 ");

        slot.set(node, &mut adapter, Some(&Value::Int(7)), &mut Value::Int(7)).unwrap();
        assert_eq!(adapter.tree().text_content(item), " 7 ");

        // Without a known original the slot is written out
        slot.set(node, &mut adapter, None, &mut Value::Int(7)).unwrap();
        assert_eq!(adapter.tree().text_content(item), "7");
    }

    #[test]
    fn test_corrupt_slot_is_repaired() {
        let (mut adapter, node) = adapter();
        let slot = slot(&adapter, 0, TypeDescriptor::Scalar(ScalarType::Int), false);
        let item = adapter.tree_mut().append_element(node, "", "Item1");
        adapter.tree_mut().set_text(item, "abc");

        slot.set(node, &mut adapter, Some(&Value::Int(0)), &mut Value::Int(0)).unwrap();
        assert_eq!(adapter.tree().text_content(item), "0");
    }
}
