//! Type Serializers
//!
//! A serializer converts between one element of the document and a `Value`
//! of its declared type. Dispatch is by `TypeDescriptor`:
//! - scalars go through `ScalarSerializer` and report `Simple`
//! - closed tuples go through `TupleSerializer` and report `Complex`
//!
//! Serializers are built once per declared type and shared behind `Arc`.

pub mod scalar;
pub mod tuple;
pub mod typed;

pub use scalar::ScalarSerializer;
pub use tuple::TupleSerializer;
pub use typed::{Slot, Token, Tuple};

use crate::accessor::XmlAccessor;
use crate::adapter::XmlAdapter;
use crate::dom::NodeId;
use crate::error::{CodecError, ConstructionError};
use crate::value::{TypeDescriptor, Value};
use std::fmt;
use std::sync::Arc;

/// Structural classification reported to dispatching callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlTypeKind {
    /// Stored as element text
    Simple,
    /// Stored as nested structure
    Complex,
}

/// Reads and writes values of one declared type
pub trait XmlTypeSerializer: Send + Sync + fmt::Debug {
    fn kind(&self) -> XmlTypeKind;

    /// Read the value held by `node`
    fn get_value(
        &self,
        node: NodeId,
        parent: &mut XmlAdapter,
        accessor: &dyn XmlAccessor,
    ) -> Result<Value, CodecError>;

    /// Write `value` into `node`
    ///
    /// `old` is the previously persisted value, if known. The serializer may
    /// replace `value` with the form actually stored.
    fn set_value(
        &self,
        node: NodeId,
        parent: &mut XmlAdapter,
        accessor: &dyn XmlAccessor,
        old: Option<&Value>,
        value: &mut Value,
    ) -> Result<(), CodecError>;
}

/// Build the serializer for a declared type
pub fn serializer_for(
    descriptor: &TypeDescriptor,
) -> Result<Arc<dyn XmlTypeSerializer>, ConstructionError> {
    match descriptor {
        TypeDescriptor::Scalar(ty) => Ok(Arc::new(ScalarSerializer::new(*ty))),
        TypeDescriptor::Tuple(_) | TypeDescriptor::TupleDefinition(_) => {
            Ok(Arc::new(TupleSerializer::new(Some(descriptor))?))
        }
        TypeDescriptor::Opaque(name) => Err(ConstructionError::Unsupported {
            type_name: name.clone(),
        }),
    }
}
