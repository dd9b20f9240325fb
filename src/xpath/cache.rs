//! Compiled Expression Cache
//!
//! Value expressions repeat across every node an adapter writes, so compiled
//! programs are kept in an LRU keyed by expression text. With the
//! `expression-cache` feature disabled every lookup compiles afresh.

use super::compiler::{compile, CompiledExpr};
use crate::error::EvalError;
use std::sync::Arc;

#[cfg(feature = "expression-cache")]
use lru::LruCache;
#[cfg(feature = "expression-cache")]
use std::num::NonZeroUsize;

/// LRU cache of compiled expressions
pub struct ExpressionCache {
    #[cfg(feature = "expression-cache")]
    entries: LruCache<String, Arc<CompiledExpr>>,
}

impl ExpressionCache {
    /// Create a cache holding at most `capacity` programs (minimum 1)
    pub fn new(capacity: usize) -> Self {
        #[cfg(not(feature = "expression-cache"))]
        let _ = capacity;
        ExpressionCache {
            #[cfg(feature = "expression-cache")]
            entries: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Return the compiled program for `xpath`, compiling on a miss
    pub fn get_or_compile(&mut self, xpath: &str) -> Result<Arc<CompiledExpr>, EvalError> {
        #[cfg(feature = "expression-cache")]
        {
            if let Some(hit) = self.entries.get(xpath) {
                return Ok(Arc::clone(hit));
            }
            let compiled = Arc::new(compile(xpath)?);
            tracing::trace!(xpath, "compiled value expression");
            self.entries.put(xpath.to_string(), Arc::clone(&compiled));
            Ok(compiled)
        }
        #[cfg(not(feature = "expression-cache"))]
        {
            Ok(Arc::new(compile(xpath)?))
        }
    }

    /// Number of cached programs
    pub fn len(&self) -> usize {
        #[cfg(feature = "expression-cache")]
        {
            self.entries.len()
        }
        #[cfg(not(feature = "expression-cache"))]
        {
            0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ExpressionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionCache")
            .field("len", &self.len())
            .finish()
    }
}
