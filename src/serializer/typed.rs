//! Typed Tuple Bridge
//!
//! Statically dispatched compose/decompose for Rust tuples of arity 1..=8.
//! Each arity gets its own `Tuple` impl from a macro, so checking that a
//! type is a fixed-arity tuple happens at compile time.
//!
//! Slot types implement `Slot`: `String`, `Token`, `i64`, `i32`, `f64`,
//! `bool`, `Option<T>` for nillable slots, and nested tuples.

use crate::error::CodecError;
use crate::value::{ScalarType, TupleValue, TypeDescriptor, Value};

/// A fixed-arity Rust tuple mapped onto a `TupleValue`
pub trait Tuple: Sized {
    const ARITY: usize;

    /// Declared type of the tuple
    fn descriptor() -> TypeDescriptor;

    /// Split into exactly `ARITY` values
    fn into_items(self) -> Vec<Value>;

    /// Rebuild from exactly `ARITY` values
    fn from_items(items: Vec<Value>) -> Result<Self, CodecError>;

    fn into_value(self) -> Value {
        Value::Tuple(TupleValue::new(self.into_items()))
    }

    fn from_tuple(tuple: &TupleValue) -> Result<Self, CodecError> {
        Self::from_items(tuple.items().to_vec())
    }
}

/// A type that can occupy one tuple slot
pub trait Slot: Sized {
    fn descriptor() -> TypeDescriptor;

    fn into_value(self) -> Value;

    /// Convert the value read for 1-based `slot`
    fn from_value(slot: usize, value: Value) -> Result<Self, CodecError>;
}

/// String slot stored with whitespace collapsed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Token(pub String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Token(s.to_string())
    }
}

fn mismatch(slot: usize, expected: &TypeDescriptor, actual: &Value) -> CodecError {
    CodecError::TypeMismatch {
        slot,
        expected: expected.to_string(),
        actual: actual.type_name().to_string(),
    }
}

macro_rules! scalar_slot {
    ($ty:ty, $scalar:ident, $variant:ident($bind:ident) => $convert:expr, $wrap:expr) => {
        impl Slot for $ty {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::Scalar(ScalarType::$scalar)
            }

            fn into_value(self) -> Value {
                let wrap: fn($ty) -> Value = $wrap;
                wrap(self)
            }

            fn from_value(slot: usize, value: Value) -> Result<Self, CodecError> {
                let actual = value.type_name();
                match value {
                    Value::$variant($bind) => $convert.ok_or_else(|| CodecError::TypeMismatch {
                        slot,
                        expected: Self::descriptor().to_string(),
                        actual: actual.to_string(),
                    }),
                    other => Err(mismatch(slot, &Self::descriptor(), &other)),
                }
            }
        }
    };
}

scalar_slot!(String, String, Str(s) => Some(s), Value::Str);
scalar_slot!(Token, Token, Str(s) => Some(Token(s)), |t: Token| Value::Str(t.0));
scalar_slot!(i64, Int, Int(n) => Some(n), Value::Int);
scalar_slot!(i32, Int, Int(n) => i32::try_from(n).ok(), |n: i32| Value::Int(n as i64));
scalar_slot!(f64, Float, Float(n) => Some(n), Value::Float);
scalar_slot!(bool, Bool, Bool(b) => Some(b), Value::Bool);

impl<T: Slot> Slot for Option<T> {
    fn descriptor() -> TypeDescriptor {
        T::descriptor()
    }

    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }

    fn from_value(slot: usize, value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(slot, other).map(Some),
        }
    }
}

macro_rules! tuple_impl {
    ($arity:expr => $($name:ident $idx:tt),+) => {
        impl<$($name: Slot),+> Tuple for ($($name,)+) {
            const ARITY: usize = $arity;

            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::Tuple(vec![$($name::descriptor()),+])
            }

            fn into_items(self) -> Vec<Value> {
                vec![$(self.$idx.into_value()),+]
            }

            fn from_items(items: Vec<Value>) -> Result<Self, CodecError> {
                if items.len() != $arity {
                    return Err(CodecError::ArityMismatch {
                        expected: $arity,
                        actual: items.len(),
                    });
                }
                let mut items = items.into_iter();
                Ok(($($name::from_value($idx + 1, items.next().unwrap_or(Value::Null))?,)+))
            }
        }

        impl<$($name: Slot),+> Slot for ($($name,)+) {
            fn descriptor() -> TypeDescriptor {
                <Self as Tuple>::descriptor()
            }

            fn into_value(self) -> Value {
                Tuple::into_value(self)
            }

            fn from_value(slot: usize, value: Value) -> Result<Self, CodecError> {
                match value {
                    Value::Tuple(tuple) => Self::from_tuple(&tuple),
                    other => Err(mismatch(slot, &<Self as Tuple>::descriptor(), &other)),
                }
            }
        }
    };
}

tuple_impl!(1 => A 0);
tuple_impl!(2 => A 0, B 1);
tuple_impl!(3 => A 0, B 1, C 2);
tuple_impl!(4 => A 0, B 1, C 2, D 3);
tuple_impl!(5 => A 0, B 1, C 2, D 3, E 4);
tuple_impl!(6 => A 0, B 1, C 2, D 3, E 4, F 5);
tuple_impl!(7 => A 0, B 1, C 2, D 3, E 4, F 5, G 6);
tuple_impl!(8 => A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_and_arity() {
        type Pair = (String, Option<i64>);
        assert_eq!(<Pair as Tuple>::ARITY, 2);
        assert_eq!(
            <Pair as Tuple>::descriptor(),
            TypeDescriptor::tuple([
                TypeDescriptor::Scalar(ScalarType::String),
                TypeDescriptor::Scalar(ScalarType::Int),
            ])
        );
    }

    #[test]
    fn test_items_round_trip() {
        let value = ("A".to_string(), 1i64, Token::from("t"), None::<bool>);
        let items = value.clone().into_items();
        assert_eq!(
            items,
            vec!["A".into(), Value::Int(1), "t".into(), Value::Null]
        );
        assert_eq!(<(String, i64, Token, Option<bool>)>::from_items(items).unwrap(), value);
    }

    #[test]
    fn test_nested_tuple() {
        let value = (1i32, (2.5f64, true));
        let Value::Tuple(t) = Tuple::into_value(value) else {
            panic!("expected a tuple");
        };
        assert_eq!(t.arity(), 2);
        assert_eq!(<(i32, (f64, bool))>::from_tuple(&t).unwrap(), value);
    }

    #[test]
    fn test_arity_mismatch() {
        let err = <(String, i64)>::from_items(vec!["A".into()]).unwrap_err();
        assert_eq!(err, CodecError::ArityMismatch { expected: 2, actual: 1 });
    }

    #[test]
    fn test_slot_mismatch_reports_position() {
        let err = <(String, i64)>::from_items(vec!["A".into(), "x".into()]).unwrap_err();
        assert_eq!(
            err,
            CodecError::TypeMismatch {
                slot: 2,
                expected: "int".into(),
                actual: "string".into()
            }
        );
    }

    #[test]
    fn test_i32_out_of_range() {
        let err = <(i32,)>::from_items(vec![Value::Int(i64::MAX)]).unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { slot: 1, .. }));
    }

    #[test]
    fn test_required_slot_rejects_null() {
        assert!(<(String,)>::from_items(vec![Value::Null]).is_err());
        assert_eq!(<(Option<String>,)>::from_items(vec![Value::Null]).unwrap(), (None,));
    }
}
