//! Slot Accessor Cache
//!
//! Slot accessors for a tuple are built once per parent accessor and kept in
//! a flat table indexed by the parent's `AccessorId`. An entry is reused only
//! while its length matches the tuple's arity; otherwise it is rebuilt and
//! overwritten. Concurrent first use may build twice; the last write wins and
//! both results are equivalent.

use super::slot::SlotAccessor;
use super::{AccessorId, XmlAccessor};
use crate::serializer::TupleSerializer;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Slot accessors of one tuple, in slot order
pub type SlotSet = Arc<[Arc<SlotAccessor>]>;

#[derive(Debug, Default)]
pub struct AccessorCache {
    entries: RwLock<Vec<Option<SlotSet>>>,
    next_id: AtomicU32,
}

impl AccessorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next accessor id
    pub fn allocate_id(&self) -> AccessorId {
        AccessorId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Slot accessors for `codec` under `parent`, building them on first use
    pub fn slot_accessors(&self, parent: &dyn XmlAccessor, codec: &TupleSerializer) -> SlotSet {
        let key = parent.id().index();
        let arity = codec.arity();

        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(Some(cached)) = entries.get(key) {
                if cached.len() == arity {
                    return Arc::clone(cached);
                }
                tracing::debug!(
                    accessor = parent.name(),
                    cached = cached.len(),
                    arity,
                    "stale slot accessors"
                );
            }
        }

        let built = self.build(parent, codec);
        tracing::debug!(accessor = parent.name(), arity, "built slot accessors");

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.len() <= key {
            entries.resize(key + 1, None);
        }
        entries[key] = Some(Arc::clone(&built));
        built
    }

    fn build(&self, parent: &dyn XmlAccessor, codec: &TupleSerializer) -> SlotSet {
        (0..codec.arity())
            .filter_map(|index| {
                let descriptor = codec.slot_type(index)?.clone();
                let serializer = Arc::clone(codec.slot_serializer(index)?);
                Some(Arc::new(SlotAccessor::new(
                    self.allocate_id(),
                    index,
                    descriptor,
                    serializer,
                    parent.is_reference(),
                )))
            })
            .collect()
    }

    /// Number of parent accessors with cached slots
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
