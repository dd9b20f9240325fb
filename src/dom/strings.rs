//! Name Interning Pool
//!
//! Element names, attribute names and prefixes repeat heavily across a
//! document, so each distinct string is stored once and nodes refer to it
//! by a `u32` id. Id 0 is reserved for the empty string.
//!
//! Uses hash-based lookup to avoid storing duplicate string data.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Location of an interned string inside the pool buffer: (offset, length)
#[derive(Debug, Clone, Copy)]
struct Entry(u32, u32);

/// String interning pool
///
/// Memory layout:
/// - `entries`: buffer span for each interned string ID
/// - `data`: concatenated string bytes
/// - `hash_index`: hash -> list of IDs (handles rare collisions)
#[derive(Debug, Clone)]
pub struct StringPool {
    entries: Vec<Entry>,
    data: String,
    hash_index: HashMap<u64, Vec<u32>>,
}

impl StringPool {
    /// Create a new pool holding only the empty string
    pub fn new() -> Self {
        let mut pool = StringPool {
            entries: Vec::with_capacity(64),
            data: String::with_capacity(1024),
            hash_index: HashMap::new(),
        };
        // Entry 0 is reserved for ""
        pool.entries.push(Entry(0, 0));
        pool
    }

    #[inline]
    fn compute_hash(s: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        hasher.finish()
    }

    /// Intern a string, returning its id
    pub fn intern(&mut self, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }

        let hash = Self::compute_hash(s);
        if let Some(id) = self.find(hash, s) {
            return id;
        }

        let offset = self.data.len() as u32;
        self.data.push_str(s);
        let id = self.entries.len() as u32;
        self.entries.push(Entry(offset, s.len() as u32));
        self.hash_index.entry(hash).or_default().push(id);
        id
    }

    /// Look up the id of a string without interning it
    pub fn lookup(&self, s: &str) -> Option<u32> {
        if s.is_empty() {
            return Some(0);
        }
        self.find(Self::compute_hash(s), s)
    }

    fn find(&self, hash: u64, s: &str) -> Option<u32> {
        self.hash_index
            .get(&hash)?
            .iter()
            .copied()
            .find(|&id| self.get_str(id) == Some(s))
    }

    /// Resolve an id back to its string
    pub fn get_str(&self, id: u32) -> Option<&str> {
        let Entry(offset, len) = *self.entries.get(id as usize)?;
        self.data.get(offset as usize..(offset + len) as usize)
    }

    /// Number of interned strings, including the reserved empty string
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedup() {
        let mut pool = StringPool::new();
        let a = pool.intern("Item1");
        let b = pool.intern("Item2");
        let c = pool.intern("Item1");
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(pool.get_str(b), Some("Item2"));
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_empty_is_zero() {
        let mut pool = StringPool::new();
        assert_eq!(pool.intern(""), 0);
        assert_eq!(pool.get_str(0), Some(""));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_lookup_does_not_intern() {
        let mut pool = StringPool::new();
        assert_eq!(pool.lookup("missing"), None);
        assert_eq!(pool.len(), 1);
        let id = pool.intern("present");
        assert_eq!(pool.lookup("present"), Some(id));
    }
}
