//! Tuple Serializer
//!
//! Maps an N-slot tuple onto the child elements of one node, one element per
//! slot, through slot accessors cached per parent accessor.
//!
//! Writes are minimal-mutation: each slot accessor may replace the value it
//! was handed (canonicalization, reference substitution). Only when some slot
//! comes back different is a new tuple composed; otherwise the caller's value
//! is left untouched, identity included.

use super::typed::Tuple;
use super::{serializer_for, XmlTypeKind, XmlTypeSerializer};
use crate::accessor::XmlAccessor;
use crate::adapter::XmlAdapter;
use crate::dom::NodeId;
use crate::error::{CodecError, ConstructionError};
use crate::value::{slot_equals, TupleValue, TypeDescriptor, Value};
use std::sync::Arc;

/// Serializer for a closed tuple type of arity >= 1
#[derive(Debug)]
pub struct TupleSerializer {
    descriptor: TypeDescriptor,
    slot_types: Vec<TypeDescriptor>,
    slot_serializers: Vec<Arc<dyn XmlTypeSerializer>>,
}

impl TupleSerializer {
    /// Build a serializer for `descriptor`
    ///
    /// Fails with `ArgumentNull` for no type and `ArgumentOutOfRange` for
    /// anything but a closed tuple with at least one slot. Slot serializers
    /// are built here, so an unsupported slot type fails construction too.
    pub fn new(descriptor: Option<&TypeDescriptor>) -> Result<Self, ConstructionError> {
        let descriptor = descriptor.ok_or(ConstructionError::ArgumentNull)?;
        let slot_types = match descriptor {
            TypeDescriptor::Tuple(slots) if !slots.is_empty() => slots.clone(),
            other => {
                return Err(ConstructionError::ArgumentOutOfRange {
                    type_name: other.to_string(),
                })
            }
        };
        let slot_serializers = slot_types
            .iter()
            .map(serializer_for)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TupleSerializer {
            descriptor: descriptor.clone(),
            slot_types,
            slot_serializers,
        })
    }

    /// Build the serializer for a Rust tuple type
    pub fn of<T: Tuple>() -> Result<Self, ConstructionError> {
        Self::new(Some(&T::descriptor()))
    }

    pub fn arity(&self) -> usize {
        self.slot_types.len()
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn slot_type(&self, index: usize) -> Option<&TypeDescriptor> {
        self.slot_types.get(index)
    }

    pub fn slot_serializer(&self, index: usize) -> Option<&Arc<dyn XmlTypeSerializer>> {
        self.slot_serializers.get(index)
    }

    /// Build a tuple from exactly N slot values
    pub fn compose(&self, items: Vec<Value>) -> Result<TupleValue, CodecError> {
        if items.len() != self.arity() {
            return Err(CodecError::ArityMismatch {
                expected: self.arity(),
                actual: items.len(),
            });
        }
        for (i, (ty, item)) in self.slot_types.iter().zip(&items).enumerate() {
            if !ty.accepts(item) {
                return Err(CodecError::TypeMismatch {
                    slot: i + 1,
                    expected: ty.to_string(),
                    actual: item.type_name().to_string(),
                });
            }
        }
        Ok(TupleValue::new(items))
    }

    /// Split a tuple into its N slot values
    ///
    /// No value (or null) yields each slot type's default.
    pub fn decompose(&self, value: Option<&Value>) -> Result<Vec<Value>, CodecError> {
        match value {
            None | Some(Value::Null) => Ok(self
                .slot_types
                .iter()
                .map(TypeDescriptor::default_value)
                .collect()),
            Some(Value::Tuple(tuple)) if tuple.arity() == self.arity() => Ok(tuple.items().to_vec()),
            Some(Value::Tuple(tuple)) => Err(CodecError::ArityMismatch {
                expected: self.arity(),
                actual: tuple.arity(),
            }),
            Some(other) => Err(self.not_a_tuple(other)),
        }
    }

    fn not_a_tuple(&self, value: &Value) -> CodecError {
        CodecError::TypeMismatch {
            slot: 0,
            expected: self.descriptor.to_string(),
            actual: value.type_name().to_string(),
        }
    }
}

impl XmlTypeSerializer for TupleSerializer {
    fn kind(&self) -> XmlTypeKind {
        XmlTypeKind::Complex
    }

    fn get_value(
        &self,
        node: NodeId,
        parent: &mut XmlAdapter,
        accessor: &dyn XmlAccessor,
    ) -> Result<Value, CodecError> {
        let meta = Arc::clone(parent.meta());
        let slots = meta.accessors().slot_accessors(accessor, self);

        let mut items = Vec::with_capacity(slots.len());
        for slot in slots.iter() {
            items.push(slot.get(node, parent, true)?);
        }
        Ok(Value::Tuple(self.compose(items)?))
    }

    fn set_value(
        &self,
        node: NodeId,
        parent: &mut XmlAdapter,
        accessor: &dyn XmlAccessor,
        old: Option<&Value>,
        value: &mut Value,
    ) -> Result<(), CodecError> {
        if value.is_null() {
            return Err(self.not_a_tuple(value));
        }
        // No old value means the stored tuple is unknown, so every slot is written
        let original = match old {
            None | Some(Value::Null) => None,
            Some(old) => Some(self.decompose(Some(old))?),
        };
        let provided = self.decompose(Some(value))?;

        let meta = Arc::clone(parent.meta());
        let slots = meta.accessors().slot_accessors(accessor, self);

        // Allocated at the first slot whose stored value differs from the one provided
        let mut output: Option<Vec<Value>> = None;

        for (i, slot) in slots.iter().enumerate() {
            let mut assigned = provided[i].clone();
            let slot_old = original.as_ref().map(|items| &items[i]);
            slot.set(node, parent, slot_old, &mut assigned)?;

            if let Some(out) = output.as_mut() {
                out.push(assigned);
                continue;
            }
            if !slot_equals(&self.slot_types[i], &assigned, &provided[i]) {
                tracing::debug!(
                    accessor = accessor.name(),
                    slot = i + 1,
                    "slot value replaced on write"
                );
                let mut out = Vec::with_capacity(self.arity());
                out.extend_from_slice(&provided[..i]);
                out.push(assigned);
                output = Some(out);
            }
        }

        if let Some(items) = output {
            *value = Value::Tuple(self.compose(items)?);
        }
        Ok(())
    }
}
