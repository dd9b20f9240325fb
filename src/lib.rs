//! xmladapter - Typed values over XML documents
//!
//! Layers, leaves first:
//! - `dom`: mutable arena document with interned names
//! - `xpath`: value-expression evaluator with an LRU of compiled programs
//! - `writer`: element/attribute writers (markup text or buffered fragments)
//! - `path`: compiled emission plans and the writer that interprets them
//! - `serializer`: scalar and tuple serializers, typed Rust tuple bridge
//! - `accessor`: property and slot accessors, slot cache, reference table
//! - `adapter`: document plus per-operation state; property get/set
//!
//! ```
//! use std::sync::Arc;
//! use xmladapter::{AdapterMeta, AdapterSettings, Tuple, XmlAdapter};
//!
//! let meta = Arc::new(AdapterMeta::new());
//! let pair = meta.property("pair", <(String, i64)>::descriptor(), false).unwrap();
//! let mut adapter = XmlAdapter::new(Arc::clone(&meta), AdapterSettings::default());
//!
//! adapter.set(&pair, ("A".to_string(), 1i64)).unwrap();
//! assert_eq!(adapter.get::<(String, i64)>(&pair).unwrap(), Some(("A".to_string(), 1)));
//! ```

pub mod accessor;
pub mod adapter;
pub mod dom;
pub mod error;
pub mod path;
pub mod serializer;
pub mod settings;
pub mod value;
pub mod writer;
pub mod xpath;

pub use accessor::{AccessorId, PropertyAccessor, SlotAccessor, XmlAccessor};
pub use adapter::{AdapterMeta, XmlAdapter};
pub use dom::{NodeId, XmlTree};
pub use error::{CodecError, ConstructionError, EvalError, PathWriteError, WriteError};
pub use path::{CompiledPathNode, PathNodeKind, PathWriter};
pub use serializer::{
    serializer_for, ScalarSerializer, Slot, Token, Tuple, TupleSerializer, XmlTypeKind,
    XmlTypeSerializer,
};
pub use settings::AdapterSettings;
pub use value::{ScalarType, TupleValue, TypeDescriptor, Value};
pub use writer::{Fragment, FragmentWriter, TextWriter, XmlWriter};
