//! XPath Value Types
//!
//! XPath 1.0 has four data types: node-set, boolean, number, and string.
//! Attribute steps yield their values directly as strings.

use crate::dom::{DocumentAccess, NodeId};

/// XPath value types
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum XPathValue {
    /// A set of nodes in document order, no duplicates
    NodeSet(Vec<NodeId>),
    Boolean(bool),
    Number(f64),
    String(String),
    /// Values of the attributes an attribute step matched
    StringList(Vec<String>),
}

impl XPathValue {
    pub fn empty_nodeset() -> Self {
        XPathValue::NodeSet(Vec::new())
    }

    /// Convert to boolean (XPath boolean() function semantics)
    pub fn to_boolean(&self) -> bool {
        match self {
            XPathValue::NodeSet(nodes) => !nodes.is_empty(),
            XPathValue::Boolean(b) => *b,
            XPathValue::Number(n) => *n != 0.0 && !n.is_nan(),
            XPathValue::String(s) => !s.is_empty(),
            XPathValue::StringList(list) => !list.is_empty(),
        }
    }

    /// Convert a scalar to number (XPath number() function semantics)
    ///
    /// Node-sets need document access; use `to_number_in`.
    pub fn to_number(&self) -> f64 {
        match self {
            XPathValue::Boolean(b) => f64::from(u8::from(*b)),
            XPathValue::Number(n) => *n,
            XPathValue::NodeSet(_) => f64::NAN,
            _ => parse_number(&self.to_string_value()),
        }
    }

    /// Convert a scalar to string (XPath string() function semantics)
    ///
    /// Node-sets need document access; use `to_string_in`.
    pub fn to_string_value(&self) -> String {
        match self {
            XPathValue::NodeSet(_) => String::new(),
            XPathValue::Boolean(b) => b.to_string(),
            XPathValue::Number(n) => format_number(*n),
            XPathValue::String(s) => s.clone(),
            XPathValue::StringList(list) => list.first().cloned().unwrap_or_default(),
        }
    }

    /// String conversion with document access for node-sets
    pub fn to_string_in<D: DocumentAccess>(&self, doc: &D) -> String {
        match self {
            XPathValue::NodeSet(nodes) => nodes
                .first()
                .map(|&n| doc.string_value(n))
                .unwrap_or_default(),
            _ => self.to_string_value(),
        }
    }

    /// Number conversion with document access for node-sets
    pub fn to_number_in<D: DocumentAccess>(&self, doc: &D) -> f64 {
        match self {
            XPathValue::NodeSet(_) => parse_number(&self.to_string_in(doc)),
            _ => self.to_number(),
        }
    }

    /// Reduce to a scalar: node-sets and string lists become the string
    /// value of their first member
    pub fn into_scalar<D: DocumentAccess>(self, doc: &D) -> XPathValue {
        match self {
            XPathValue::NodeSet(_) | XPathValue::StringList(_) => {
                XPathValue::String(self.to_string_in(doc))
            }
            scalar => scalar,
        }
    }

    pub fn is_nodeset(&self) -> bool {
        matches!(self, XPathValue::NodeSet(_))
    }

    pub fn as_nodeset(&self) -> Option<&Vec<NodeId>> {
        match self {
            XPathValue::NodeSet(nodes) => Some(nodes),
            _ => None,
        }
    }
}

/// XPath number() parsing: surrounding whitespace allowed, otherwise NaN
pub fn parse_number(s: &str) -> f64 {
    s.trim().parse().unwrap_or(f64::NAN)
}

/// XPath string() formatting for numbers
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl Default for XPathValue {
    fn default() -> Self {
        XPathValue::empty_nodeset()
    }
}

impl From<bool> for XPathValue {
    fn from(b: bool) -> Self {
        XPathValue::Boolean(b)
    }
}

impl From<f64> for XPathValue {
    fn from(n: f64) -> Self {
        XPathValue::Number(n)
    }
}

impl From<i64> for XPathValue {
    fn from(n: i64) -> Self {
        XPathValue::Number(n as f64)
    }
}

impl From<String> for XPathValue {
    fn from(s: String) -> Self {
        XPathValue::String(s)
    }
}

impl From<&str> for XPathValue {
    fn from(s: &str) -> Self {
        XPathValue::String(s.to_string())
    }
}
