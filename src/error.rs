//! Error types
//!
//! - `ConstructionError`: a serializer was built for a type it cannot handle
//! - `CodecError`: composing, decomposing or persisting a value failed
//! - `WriteError`: a writer primitive was called out of order
//! - `EvalError`: a value expression failed to compile or evaluate

use crate::dom::NodeId;

/// Errors raised while building a serializer for a type descriptor
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstructionError {
    /// No type was supplied
    #[error("type must not be null")]
    ArgumentNull,

    /// The type is not a closed fixed-arity tuple of arity >= 1
    #[error("type is not a closed tuple type: {type_name}")]
    ArgumentOutOfRange { type_name: String },

    /// No serializer exists for the type
    #[error("no serializer for type: {type_name}")]
    Unsupported { type_name: String },
}

/// Errors raised by the markup writers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WriteError {
    /// An attribute was opened after element content was written
    #[error("attribute '{name}' written after element content")]
    AttributeAfterContent { name: String },

    /// An attribute was opened while another attribute is open
    #[error("attribute '{name}' opened inside another attribute")]
    NestedAttribute { name: String },

    /// An element was opened while an attribute is open
    #[error("element '{name}' opened inside an attribute")]
    ElementInsideAttribute { name: String },

    /// An element was closed while one of its attributes is still open
    #[error("attribute still open")]
    OpenAttribute,

    /// An attribute or end tag was written with no element open
    #[error("no open element")]
    NoOpenElement,

    /// `end_attribute` without a matching `start_attribute`
    #[error("no open attribute")]
    NoOpenAttribute,

    /// The writer was finished with elements still open
    #[error("{0} element(s) left open")]
    Unclosed(usize),

    /// An element or attribute was given an empty local name
    #[error("empty local name")]
    EmptyName,
}

/// Errors raised while compiling or evaluating a value expression
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// The expression text could not be parsed
    #[error("parse error: {0}")]
    Parse(String),

    /// Call to a function the evaluator does not know
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// A function was called with the wrong number of arguments
    #[error("{function}() expects {expected} argument(s)")]
    Arity {
        function: String,
        expected: &'static str,
    },

    /// `$name` has no binding
    #[error("unbound variable: ${0}")]
    UnboundVariable(String),

    /// An operation that requires a node-set got a scalar
    #[error("operand is not a node-set")]
    NotANodeSet,
}

/// Errors raised while reading or writing a value against the document
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// A composition or decomposition produced the wrong item count
    #[error("arity mismatch: expected {expected} item(s), got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    /// A value does not fit the declared type
    ///
    /// `slot` is 1-based; 0 stands for the value as a whole.
    #[error("slot {slot}: expected {expected}, got {actual}")]
    TypeMismatch {
        slot: usize,
        expected: String,
        actual: String,
    },

    /// Element text could not be parsed as the declared scalar type
    #[error("invalid {ty} value: '{text}'")]
    InvalidScalar { ty: &'static str, text: String },

    /// A back-reference names an id no element carries
    #[error("unresolved reference id {0}")]
    UnresolvedReference(u32),

    /// The node handed to a serializer is not an element
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Errors surfaced by the compiled path writer
///
/// Evaluator and writer failures pass through unmodified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathWriteError {
    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

impl From<PathWriteError> for CodecError {
    fn from(err: PathWriteError) -> Self {
        match err {
            PathWriteError::Eval(e) => CodecError::Eval(e),
            PathWriteError::Write(e) => CodecError::Write(e),
        }
    }
}
