//! XPath Functions
//!
//! The core-library subset value expressions use:
//!
//! Node Set Functions:
//! - position(), last(), count(), local-name(), name()
//!
//! String Functions:
//! - string(), concat(), starts-with(), contains(), string-length(),
//!   normalize-space()
//!
//! Boolean Functions:
//! - boolean(), not(), true(), false()
//!
//! Number Functions:
//! - number()

use super::value::XPathValue;
use crate::dom::{DocumentAccess, NodeId};
use crate::error::EvalError;

/// Where a function call happens
pub struct CallContext<'a, D: DocumentAccess> {
    pub doc: &'a D,
    pub node: NodeId,
    pub position: usize,
    pub size: usize,
}

/// Evaluate a function call
pub fn call<D: DocumentAccess>(
    name: &str,
    args: Vec<XPathValue>,
    ctx: &CallContext<'_, D>,
) -> Result<XPathValue, EvalError> {
    let doc = ctx.doc;
    let value = match name {
        // Node Set Functions
        "position" => {
            arity(name, &args, 0, 0)?;
            XPathValue::Number(ctx.position as f64)
        }
        "last" => {
            arity(name, &args, 0, 0)?;
            XPathValue::Number(ctx.size as f64)
        }
        "count" => {
            arity(name, &args, 1, 1)?;
            let nodes = args[0].as_nodeset().ok_or(EvalError::NotANodeSet)?;
            XPathValue::Number(nodes.len() as f64)
        }
        "local-name" | "name" => {
            arity(name, &args, 0, 1)?;
            let node = match args.first() {
                Some(arg) => arg.as_nodeset().ok_or(EvalError::NotANodeSet)?.first().copied(),
                None => Some(ctx.node),
            };
            let text = node.and_then(|n| {
                if name == "name" {
                    doc.node_name(n)
                } else {
                    doc.node_local_name(n).map(str::to_string)
                }
            });
            XPathValue::String(text.unwrap_or_default())
        }

        // String Functions
        "string" => {
            arity(name, &args, 0, 1)?;
            XPathValue::String(string_arg(doc, ctx.node, args.first()))
        }
        "concat" => {
            if args.len() < 2 {
                return Err(EvalError::Arity {
                    function: name.to_string(),
                    expected: "2 or more",
                });
            }
            XPathValue::String(args.iter().map(|a| a.to_string_in(doc)).collect())
        }
        "starts-with" => {
            arity(name, &args, 2, 2)?;
            let s = args[0].to_string_in(doc);
            XPathValue::Boolean(s.starts_with(&args[1].to_string_in(doc)))
        }
        "contains" => {
            arity(name, &args, 2, 2)?;
            let s = args[0].to_string_in(doc);
            XPathValue::Boolean(s.contains(&args[1].to_string_in(doc)))
        }
        "string-length" => {
            arity(name, &args, 0, 1)?;
            let s = string_arg(doc, ctx.node, args.first());
            XPathValue::Number(s.chars().count() as f64)
        }
        "normalize-space" => {
            arity(name, &args, 0, 1)?;
            let s = string_arg(doc, ctx.node, args.first());
            XPathValue::String(normalize_space(&s))
        }

        // Boolean Functions
        "boolean" => {
            arity(name, &args, 1, 1)?;
            XPathValue::Boolean(args[0].to_boolean())
        }
        "not" => {
            arity(name, &args, 1, 1)?;
            XPathValue::Boolean(!args[0].to_boolean())
        }
        "true" => {
            arity(name, &args, 0, 0)?;
            XPathValue::Boolean(true)
        }
        "false" => {
            arity(name, &args, 0, 0)?;
            XPathValue::Boolean(false)
        }

        // Number Functions
        "number" => {
            arity(name, &args, 0, 1)?;
            match args.first() {
                Some(arg) => XPathValue::Number(arg.to_number_in(doc)),
                None => XPathValue::Number(super::value::parse_number(&doc.string_value(ctx.node))),
            }
        }

        _ => return Err(EvalError::UnknownFunction(name.to_string())),
    };
    Ok(value)
}

/// Collapse runs of whitespace to single spaces and trim the ends
pub fn normalize_space(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn string_arg<D: DocumentAccess>(doc: &D, node: NodeId, arg: Option<&XPathValue>) -> String {
    match arg {
        Some(value) => value.to_string_in(doc),
        None => doc.string_value(node),
    }
}

fn arity(name: &str, args: &[XPathValue], min: usize, max: usize) -> Result<(), EvalError> {
    if (min..=max).contains(&args.len()) {
        return Ok(());
    }
    let expected = match (min, max) {
        (0, 0) => "0",
        (1, 1) => "1",
        (2, 2) => "2",
        (0, 1) => "0 or 1",
        _ => "a different number of",
    };
    Err(EvalError::Arity {
        function: name.to_string(),
        expected,
    })
}
