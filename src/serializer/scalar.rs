//! Scalar Serializer
//!
//! Stores a scalar as the text content of its element. Lexical forms follow
//! the XML Schema built-ins: `true`/`false` (`1`/`0` accepted on read),
//! decimal integers, and `INF`/`-INF`/`NaN` for non-finite floats.
//!
//! `Token` values have whitespace collapsed when written; the collapsed text
//! replaces the value the caller assigned.

use super::{XmlTypeKind, XmlTypeSerializer};
use crate::accessor::XmlAccessor;
use crate::adapter::XmlAdapter;
use crate::dom::NodeId;
use crate::error::CodecError;
use crate::value::{ScalarType, Value};
use crate::xpath::functions::normalize_space;

/// Serializer for one scalar type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarSerializer {
    ty: ScalarType,
}

impl ScalarSerializer {
    pub fn new(ty: ScalarType) -> Self {
        ScalarSerializer { ty }
    }

    pub fn scalar_type(&self) -> ScalarType {
        self.ty
    }

    /// Lexical form of `value`
    pub fn format(&self, value: &Value) -> Result<String, CodecError> {
        let text = match (self.ty, value) {
            (ScalarType::String, Value::Str(s)) => s.clone(),
            (ScalarType::Token, Value::Str(s)) => normalize_space(s),
            (ScalarType::Int, Value::Int(n)) => n.to_string(),
            (ScalarType::Float, Value::Float(n)) => format_float(*n),
            (ScalarType::Bool, Value::Bool(b)) => b.to_string(),
            _ => {
                return Err(CodecError::TypeMismatch {
                    slot: 0,
                    expected: self.ty.name().to_string(),
                    actual: value.type_name().to_string(),
                })
            }
        };
        Ok(text)
    }

    /// Parse element text as this scalar type
    pub fn parse(&self, text: &str) -> Result<Value, CodecError> {
        let invalid = || CodecError::InvalidScalar {
            ty: self.ty.name(),
            text: text.to_string(),
        };
        match self.ty {
            ScalarType::String => Ok(Value::Str(text.to_string())),
            ScalarType::Token => Ok(Value::Str(normalize_space(text))),
            ScalarType::Int => text.trim().parse().map(Value::Int).map_err(|_| invalid()),
            ScalarType::Float => parse_float(text.trim()).map(Value::Float).ok_or_else(invalid),
            ScalarType::Bool => match text.trim() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(invalid()),
            },
        }
    }
}

impl XmlTypeSerializer for ScalarSerializer {
    fn kind(&self) -> XmlTypeKind {
        XmlTypeKind::Simple
    }

    fn get_value(
        &self,
        node: NodeId,
        parent: &mut XmlAdapter,
        _accessor: &dyn XmlAccessor,
    ) -> Result<Value, CodecError> {
        if !parent.tree().is_element(node) {
            return Err(CodecError::NotAnElement(node));
        }
        self.parse(&parent.tree().text_content(node))
    }

    fn set_value(
        &self,
        node: NodeId,
        parent: &mut XmlAdapter,
        _accessor: &dyn XmlAccessor,
        _old: Option<&Value>,
        value: &mut Value,
    ) -> Result<(), CodecError> {
        if !parent.tree().is_element(node) {
            return Err(CodecError::NotAnElement(node));
        }
        if value.is_null() {
            parent.tree_mut().remove_children(node);
            return Ok(());
        }

        let text = self.format(value)?;
        parent.tree_mut().set_text(node, &text);

        if self.ty == ScalarType::Token && value.as_str() != Some(text.as_str()) {
            *value = Value::Str(text);
        }
        Ok(())
    }
}

fn format_float(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "INF" } else { "-INF" }.to_string()
    } else {
        n.to_string()
    }
}

fn parse_float(text: &str) -> Option<f64> {
    match text {
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        // Only the spellings above name non-finite values
        _ if text
            .bytes()
            .any(|b| b.is_ascii_alphabetic() && !matches!(b, b'e' | b'E')) =>
        {
            None
        }
        _ => text.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::string(ScalarType::String, Value::from("  a  b "), "  a  b ")]
    #[case::token(ScalarType::Token, Value::from("  a  b "), "a b")]
    #[case::int(ScalarType::Int, Value::Int(-42), "-42")]
    #[case::float(ScalarType::Float, Value::Float(1.5), "1.5")]
    #[case::float_whole(ScalarType::Float, Value::Float(3.0), "3")]
    #[case::float_inf(ScalarType::Float, Value::Float(f64::NEG_INFINITY), "-INF")]
    #[case::bool(ScalarType::Bool, Value::Bool(true), "true")]
    fn test_format(#[case] ty: ScalarType, #[case] value: Value, #[case] expected: &str) {
        assert_eq!(ScalarSerializer::new(ty).format(&value).unwrap(), expected);
    }

    #[rstest]
    #[case::int(ScalarType::Int, " 7 ", Value::Int(7))]
    #[case::bool_digit(ScalarType::Bool, "0", Value::Bool(false))]
    #[case::float_inf(ScalarType::Float, "INF", Value::Float(f64::INFINITY))]
    #[case::token(ScalarType::Token, "\ta\n b", Value::from("a b"))]
    fn test_parse(#[case] ty: ScalarType, #[case] text: &str, #[case] expected: Value) {
        assert_eq!(ScalarSerializer::new(ty).parse(text).unwrap(), expected);
    }

    #[rstest]
    #[case::int(ScalarType::Int, "1.5")]
    #[case::bool(ScalarType::Bool, "yes")]
    #[case::float(ScalarType::Float, "inf")]
    fn test_parse_invalid(#[case] ty: ScalarType, #[case] text: &str) {
        let err = ScalarSerializer::new(ty).parse(text).unwrap_err();
        assert!(matches!(err, CodecError::InvalidScalar { .. }));
    }

    #[test]
    fn test_format_type_mismatch() {
        let err = ScalarSerializer::new(ScalarType::Int)
            .format(&Value::from("1"))
            .unwrap_err();
        assert_eq!(
            err,
            CodecError::TypeMismatch {
                slot: 0,
                expected: "int".into(),
                actual: "string".into()
            }
        );
    }
}
