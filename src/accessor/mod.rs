//! Accessors
//!
//! An accessor locates one member of a value in the document and carries
//! the flags that govern how it is stored:
//! - `PropertyAccessor`: a named property element under the adapter root
//! - `SlotAccessor`: one fixed-index slot of a tuple
//!
//! Each accessor has a dense `AccessorId`, which keys the slot accessor
//! cache in place of object identity.

pub mod cache;
pub mod references;
pub mod slot;

pub use cache::{AccessorCache, SlotSet};
pub use references::ReferenceTable;
pub use slot::{SlotAccessor, SlotCursor};

use crate::error::ConstructionError;
use crate::serializer::{serializer_for, XmlTypeSerializer};
use crate::value::TypeDescriptor;
use std::fmt;
use std::sync::Arc;

/// Stable accessor identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccessorId(u32);

impl AccessorId {
    pub(crate) fn new(id: u32) -> Self {
        AccessorId(id)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Common view of property and slot accessors
pub trait XmlAccessor: fmt::Debug + Send + Sync {
    fn id(&self) -> AccessorId;

    fn name(&self) -> &str;

    /// Whether shared values are written once and referenced afterwards
    fn is_reference(&self) -> bool;

    /// Whether null is stored as an `xsi:nil` element
    fn is_nillable(&self) -> bool;
}

/// Accessor for a named property of the adapter root
#[derive(Debug, Clone)]
pub struct PropertyAccessor {
    id: AccessorId,
    name: String,
    descriptor: TypeDescriptor,
    serializer: Arc<dyn XmlTypeSerializer>,
    is_reference: bool,
}

impl PropertyAccessor {
    pub(crate) fn new(
        id: AccessorId,
        name: &str,
        descriptor: TypeDescriptor,
        is_reference: bool,
    ) -> Result<Self, ConstructionError> {
        let serializer = serializer_for(&descriptor)?;
        Ok(PropertyAccessor {
            id,
            name: name.to_string(),
            descriptor,
            serializer,
            is_reference,
        })
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn serializer(&self) -> &Arc<dyn XmlTypeSerializer> {
        &self.serializer
    }
}

impl XmlAccessor for PropertyAccessor {
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
