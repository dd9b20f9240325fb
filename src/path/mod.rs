//! Compiled Paths
//!
//! The immutable emission plan for one structural subtree and the
//! interpreter that writes it.

pub mod node;
pub mod writer;

pub use node::{CompiledPathNode, PathNodeKind};
pub use writer::PathWriter;
