//! Reference Table
//!
//! Tracks tuple identity across the slots of one adapter operation.
//! - write side: tuple identity to the element it was first written into
//! - read side: reference id to the value already read for it
//!
//! Written tuples are held here so their identity stays unique while the
//! table is populated.

use crate::dom::{NodeId, XmlTree};
use crate::value::{TupleValue, Value};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ReferenceTable {
    written: HashMap<usize, (TupleValue, NodeId)>,
    read: HashMap<u32, Value>,
    next_id: u32,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget tracked values; id allocation continues where it left off
    pub fn clear(&mut self) {
        self.written.clear();
        self.read.clear();
    }

    /// Element `tuple` was first written into
    pub fn written_node(&self, tuple: &TupleValue) -> Option<NodeId> {
        self.written.get(&tuple.identity()).map(|(_, node)| *node)
    }

    pub fn record_written(&mut self, tuple: &TupleValue, node: NodeId) {
        self.written
            .entry(tuple.identity())
            .or_insert_with(|| (tuple.clone(), node));
    }

    /// Value already read for reference `id`
    pub fn resolved(&self, id: u32) -> Option<&Value> {
        self.read.get(&id)
    }

    pub fn record_read(&mut self, id: u32, value: Value) {
        self.read.insert(id, value);
    }

    /// Next id not yet carried by any element as `prefix:local`
    pub fn allocate_id(&mut self, tree: &XmlTree, prefix: &str, local_name: &str) -> u32 {
        loop {
            self.next_id = self.next_id.wrapping_add(1).max(1);
            let candidate = self.next_id.to_string();
            if tree
                .find_element_with_attribute(prefix, local_name, &candidate)
                .is_none()
            {
                return self.next_id;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.written.is_empty() && self.read.is_empty()
    }
}
