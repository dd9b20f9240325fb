//! Slot Values and Type Descriptors
//!
//! Dynamic values exchanged between serializers and the document:
//! - `Value`: one slot or property value
//! - `TupleValue`: fixed-arity aggregate with identity (shared `Arc`)
//! - `TypeDescriptor`: declared shape a serializer is built from
//!
//! Equality used for write divergence is explicit per declared type, see
//! [`slot_equals`].

use std::fmt;
use std::sync::Arc;

/// Scalar slot types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// Text stored verbatim
    String,
    /// Text with whitespace collapsed on write
    Token,
    Int,
    Float,
    Bool,
}

impl ScalarType {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Token => "token",
            ScalarType::Int => "int",
            ScalarType::Float => "float",
            ScalarType::Bool => "bool",
        }
    }
}

/// Declared type of a property or slot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    Scalar(ScalarType),
    /// Closed tuple with one descriptor per slot
    Tuple(Vec<TypeDescriptor>),
    /// Open tuple definition of the given arity, with no slot types bound
    TupleDefinition(usize),
    /// Any other named type
    Opaque(String),
}

impl TypeDescriptor {
    /// Shorthand for a closed tuple
    pub fn tuple<I: IntoIterator<Item = TypeDescriptor>>(slots: I) -> Self {
        TypeDescriptor::Tuple(slots.into_iter().collect())
    }

    /// Arity of a closed tuple
    pub fn tuple_arity(&self) -> Option<usize> {
        match self {
            TypeDescriptor::Tuple(slots) => Some(slots.len()),
            _ => None,
        }
    }

    /// Value a slot of this type holds when nothing was persisted
    pub fn default_value(&self) -> Value {
        match self {
            TypeDescriptor::Scalar(ScalarType::Int) => Value::Int(0),
            TypeDescriptor::Scalar(ScalarType::Float) => Value::Float(0.0),
            TypeDescriptor::Scalar(ScalarType::Bool) => Value::Bool(false),
            _ => Value::Null,
        }
    }

    /// Whether `value` may be stored under this type
    ///
    /// Null fits every type. Tuples are checked by arity only; slot
    /// contents are checked when they are written.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (TypeDescriptor::Scalar(ScalarType::String | ScalarType::Token), Value::Str(_)) => true,
            (TypeDescriptor::Scalar(ScalarType::Int), Value::Int(_)) => true,
            (TypeDescriptor::Scalar(ScalarType::Float), Value::Float(_)) => true,
            (TypeDescriptor::Scalar(ScalarType::Bool), Value::Bool(_)) => true,
            (TypeDescriptor::Tuple(slots), Value::Tuple(t)) => slots.len() == t.arity(),
            _ => false,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Scalar(ty) => f.write_str(ty.name()),
            TypeDescriptor::Tuple(slots) => {
                f.write_str("tuple<")?;
                for (i, slot) in slots.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", slot)?;
                }
                f.write_str(">")
            }
            TypeDescriptor::TupleDefinition(arity) => write!(f, "tuple`{}", arity),
            TypeDescriptor::Opaque(name) => f.write_str(name),
        }
    }
}

/// Fixed-arity tuple value
///
/// Clones share the same allocation, which is the value's identity for
/// reference tracking.
#[derive(Clone)]
pub struct TupleValue(Arc<[Value]>);

impl TupleValue {
    pub fn new(items: Vec<Value>) -> Self {
        TupleValue(items.into())
    }

    pub fn arity(&self) -> usize {
        self.0.len()
    }

    pub fn items(&self) -> &[Value] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Whether both handles point at the same tuple
    #[inline]
    pub fn ptr_eq(a: &TupleValue, b: &TupleValue) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Address identifying this tuple while any handle is alive
    #[inline]
    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const Value as usize
    }
}

impl PartialEq for TupleValue {
    fn eq(&self, other: &Self) -> bool {
        TupleValue::ptr_eq(self, other) || self.items() == other.items()
    }
}

impl fmt::Debug for TupleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut t = f.debug_tuple("Tuple");
        for item in self.items() {
            t.field(item);
        }
        t.finish()
    }
}

/// A property or slot value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Tuple(TupleValue),
}

impl Value {
    /// Build a tuple value from its items
    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(TupleValue::new(items))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Tuple(_) => "tuple",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&TupleValue> {
        match self {
            Value::Tuple(t) => Some(t),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<TupleValue> for Value {
    fn from(t: TupleValue) -> Self {
        Value::Tuple(t)
    }
}

/// Equality of two values declared as `ty`
///
/// - strings and tokens compare by content
/// - floats compare bitwise, so `NaN` equals itself and `0.0` differs from `-0.0`
/// - tuples are equal when they share identity, otherwise slot by slot
/// - null equals only null
pub fn slot_equals(ty: &TypeDescriptor, a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x.to_bits() == y.to_bits(),
        (Value::Tuple(x), Value::Tuple(y)) => {
            if TupleValue::ptr_eq(x, y) {
                return true;
            }
            if x.arity() != y.arity() {
                return false;
            }
            let opaque = TypeDescriptor::Opaque(String::new());
            x.items().iter().zip(y.items()).enumerate().all(|(i, (p, q))| {
                let slot_ty = match ty {
                    TypeDescriptor::Tuple(slots) => slots.get(i).unwrap_or(&opaque),
                    _ => &opaque,
                };
                slot_equals(slot_ty, p, q)
            })
        }
        _ => false,
    }
}
