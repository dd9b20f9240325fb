//! XPath Evaluation Engine
//!
//! Runs compiled programs against any `DocumentAccess` from a context node.
//! `NodeEvaluator` packages a document position and variable bindings as the
//! evaluator collaborator the compiled path writer calls into.

use super::axes::{attribute_values, matches_node_test, navigate};
use super::compiler::{CompiledExpr, Op};
use super::functions::{self, CallContext};
use super::parser::{Axis, BinaryOp};
use super::value::XPathValue;
use crate::dom::{DocumentAccess, NodeId};
use crate::error::EvalError;
use std::collections::{HashMap, HashSet};

/// Variable bindings for `$name` references
pub type Variables = HashMap<String, XPathValue>;

/// Evaluation context - generic over document type
pub struct EvalContext<'a, D: DocumentAccess> {
    pub doc: &'a D,
    pub context_node: NodeId,
    pub context_position: usize,
    pub context_size: usize,
    pub variables: Option<&'a Variables>,
}

impl<'a, D: DocumentAccess> EvalContext<'a, D> {
    pub fn new(doc: &'a D, context_node: NodeId) -> Self {
        EvalContext {
            doc,
            context_node,
            context_position: 1,
            context_size: 1,
            variables: None,
        }
    }

    fn at(&self, node: NodeId, position: usize, size: usize) -> Self {
        EvalContext {
            doc: self.doc,
            context_node: node,
            context_position: position,
            context_size: size,
            variables: self.variables,
        }
    }
}

/// Evaluate an expression string from a context node
#[must_use = "XPath evaluation result should be used"]
pub fn evaluate_from_node<D: DocumentAccess>(
    doc: &D,
    context_node: NodeId,
    xpath: &str,
) -> Result<XPathValue, EvalError> {
    let compiled = super::compiler::compile(xpath)?;
    evaluate_compiled(&compiled, &EvalContext::new(doc, context_node))
}

/// Evaluate a compiled expression
pub fn evaluate_compiled<D: DocumentAccess>(
    expr: &CompiledExpr,
    ctx: &EvalContext<'_, D>,
) -> Result<XPathValue, EvalError> {
    let mut stack: Vec<XPathValue> = Vec::with_capacity(8);

    for op in &expr.ops {
        match op {
            Op::Root => stack.push(XPathValue::NodeSet(vec![ctx.doc.document_node_id()])),

            Op::Context => stack.push(XPathValue::NodeSet(vec![ctx.context_node])),

            Op::Navigate(axis, test) => {
                let nodes = match stack.pop() {
                    Some(XPathValue::NodeSet(nodes)) => nodes,
                    Some(_) => return Err(EvalError::NotANodeSet),
                    None => vec![ctx.context_node],
                };

                if *axis == Axis::Attribute {
                    let mut values: Vec<String> = nodes
                        .iter()
                        .flat_map(|&n| attribute_values(ctx.doc, n, test))
                        .collect();
                    stack.push(match values.len() {
                        0 => XPathValue::empty_nodeset(),
                        1 => XPathValue::String(values.pop().unwrap_or_default()),
                        _ => XPathValue::StringList(values),
                    });
                    continue;
                }

                let mut seen = HashSet::with_capacity(nodes.len());
                let mut result = Vec::with_capacity(nodes.len());
                for node in nodes {
                    for candidate in navigate(ctx.doc, node, *axis) {
                        if matches_node_test(ctx.doc, candidate, test) && seen.insert(candidate) {
                            result.push(candidate);
                        }
                    }
                }
                stack.push(XPathValue::NodeSet(result));
            }

            Op::Predicate(pred) => {
                let nodes = match stack.pop() {
                    Some(XPathValue::NodeSet(nodes)) => nodes,
                    _ => return Err(EvalError::NotANodeSet),
                };
                let size = nodes.len();
                let mut filtered = Vec::with_capacity(size);
                for (i, &node) in nodes.iter().enumerate() {
                    let result = evaluate_compiled(pred, &ctx.at(node, i + 1, size))?;
                    let include = match result {
                        XPathValue::Number(n) => (i + 1) as f64 == n,
                        other => other.to_boolean(),
                    };
                    if include {
                        filtered.push(node);
                    }
                }
                stack.push(XPathValue::NodeSet(filtered));
            }

            Op::Union => {
                let right = stack.pop();
                let left = stack.pop();
                match (left, right) {
                    (Some(XPathValue::NodeSet(mut l)), Some(XPathValue::NodeSet(r))) => {
                        let mut seen: HashSet<NodeId> = l.iter().copied().collect();
                        l.extend(r.into_iter().filter(|n| seen.insert(*n)));
                        stack.push(XPathValue::NodeSet(l));
                    }
                    _ => return Err(EvalError::NotANodeSet),
                }
            }

            Op::Number(n) => stack.push(XPathValue::Number(*n)),

            Op::String(s) => stack.push(XPathValue::String(s.clone())),

            Op::Variable(name) => {
                let value = ctx
                    .variables
                    .and_then(|vars| vars.get(name))
                    .cloned()
                    .ok_or_else(|| EvalError::UnboundVariable(name.clone()))?;
                stack.push(value);
            }

            Op::Negate => {
                let value = stack.pop().unwrap_or_default();
                stack.push(XPathValue::Number(-value.to_number_in(ctx.doc)));
            }

            Op::Binary(op) => {
                let right = stack.pop().unwrap_or_default();
                let left = stack.pop().unwrap_or_default();
                stack.push(binary(ctx.doc, *op, &left, &right));
            }

            Op::Call(name, argc) => {
                let split = stack.len().saturating_sub(*argc);
                let args = stack.split_off(split);
                let call_ctx = CallContext {
                    doc: ctx.doc,
                    node: ctx.context_node,
                    position: ctx.context_position,
                    size: ctx.context_size,
                };
                stack.push(functions::call(name, args, &call_ctx)?);
            }
        }
    }

    Ok(stack.pop().unwrap_or_default())
}

fn binary<D: DocumentAccess>(doc: &D, op: BinaryOp, left: &XPathValue, right: &XPathValue) -> XPathValue {
    let num = |v: &XPathValue| v.to_number_in(doc);
    match op {
        BinaryOp::Or => XPathValue::Boolean(left.to_boolean() || right.to_boolean()),
        BinaryOp::And => XPathValue::Boolean(left.to_boolean() && right.to_boolean()),
        BinaryOp::Eq => XPathValue::Boolean(equals(doc, left, right)),
        BinaryOp::NotEq => XPathValue::Boolean(!equals(doc, left, right)),
        BinaryOp::Lt => XPathValue::Boolean(num(left) < num(right)),
        BinaryOp::LtEq => XPathValue::Boolean(num(left) <= num(right)),
        BinaryOp::Gt => XPathValue::Boolean(num(left) > num(right)),
        BinaryOp::GtEq => XPathValue::Boolean(num(left) >= num(right)),
        BinaryOp::Add => XPathValue::Number(num(left) + num(right)),
        BinaryOp::Sub => XPathValue::Number(num(left) - num(right)),
        BinaryOp::Mul => XPathValue::Number(num(left) * num(right)),
        BinaryOp::Div => XPathValue::Number(num(left) / num(right)),
        BinaryOp::Mod => XPathValue::Number(num(left) % num(right)),
    }
}

/// Equality per XPath 1.0: node-sets and string lists compare member-wise
fn equals<D: DocumentAccess>(doc: &D, left: &XPathValue, right: &XPathValue) -> bool {
    let members = |v: &XPathValue| -> Option<Vec<String>> {
        match v {
            XPathValue::NodeSet(nodes) => Some(nodes.iter().map(|&n| doc.string_value(n)).collect()),
            XPathValue::StringList(list) => Some(list.clone()),
            _ => None,
        }
    };

    match (members(left), members(right)) {
        (Some(l), Some(r)) => l.iter().any(|a| r.contains(a)),
        (Some(set), None) => set.iter().any(|s| scalar_equals(&XPathValue::String(s.clone()), right)),
        (None, Some(set)) => set.iter().any(|s| scalar_equals(left, &XPathValue::String(s.clone()))),
        (None, None) => scalar_equals(left, right),
    }
}

fn scalar_equals(left: &XPathValue, right: &XPathValue) -> bool {
    match (left, right) {
        (XPathValue::Boolean(_), _) | (_, XPathValue::Boolean(_)) => left.to_boolean() == right.to_boolean(),
        (XPathValue::Number(_), _) | (_, XPathValue::Number(_)) => left.to_number() == right.to_number(),
        _ => left.to_string_value() == right.to_string_value(),
    }
}

// ============================================================================
// Evaluator collaborator
// ============================================================================

/// Evaluates a compiled value expression at a fixed document position
pub trait Evaluator {
    /// Evaluate to a scalar; node-sets reduce to the string value of their first node
    fn evaluate(&self, expr: &CompiledExpr) -> Result<XPathValue, EvalError>;
}

/// Evaluator bound to one node of a document
pub struct NodeEvaluator<'a, D: DocumentAccess> {
    doc: &'a D,
    position: NodeId,
    variables: Option<&'a Variables>,
}

impl<'a, D: DocumentAccess> NodeEvaluator<'a, D> {
    pub fn new(doc: &'a D, position: NodeId) -> Self {
        NodeEvaluator {
            doc,
            position,
            variables: None,
        }
    }

    pub fn with_variables(mut self, variables: &'a Variables) -> Self {
        self.variables = Some(variables);
        self
    }
}

impl<D: DocumentAccess> Evaluator for NodeEvaluator<'_, D> {
    fn evaluate(&self, expr: &CompiledExpr) -> Result<XPathValue, EvalError> {
        let ctx = EvalContext {
            variables: self.variables,
            ..EvalContext::new(self.doc, self.position)
        };
        Ok(evaluate_compiled(expr, &ctx)?.into_scalar(self.doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::XmlTree;

    fn sample() -> (XmlTree, NodeId) {
        let mut tree = XmlTree::new();
        let root = tree.append_element(XmlTree::DOCUMENT, "", "root");
        for (i, text) in ["a", "b", "c"].iter().enumerate() {
            let item = tree.append_element(root, "", "item");
            tree.set_attribute(item, "", "n", &(i + 1).to_string());
            tree.set_text(item, text);
        }
        (tree, root)
    }

    #[test]
    fn test_absolute_path() {
        let (tree, root) = sample();
        let result = evaluate_from_node(&tree, root, "/root/item").unwrap();
        assert_eq!(result.as_nodeset().unwrap().len(), 3);
    }

    #[test]
    fn test_descendant() {
        let (tree, _) = sample();
        let result = evaluate_from_node(&tree, XmlTree::DOCUMENT, "count(//item)").unwrap();
        assert_eq!(result.to_number(), 3.0);
    }

    #[test]
    fn test_position_predicate() {
        let (tree, root) = sample();
        let result = evaluate_from_node(&tree, root, "string(item[2])").unwrap();
        assert_eq!(result, XPathValue::String("b".into()));
    }

    #[test]
    fn test_attribute_predicate() {
        let (tree, root) = sample();
        let result = evaluate_from_node(&tree, root, "string(item[@n = 3])").unwrap();
        assert_eq!(result, XPathValue::String("c".into()));
    }

    #[test]
    fn test_arithmetic_and_comparison() {
        let (tree, root) = sample();
        assert_eq!(
            evaluate_from_node(&tree, root, "(1 + 2) * 4 mod 5").unwrap(),
            XPathValue::Number(2.0)
        );
        assert_eq!(
            evaluate_from_node(&tree, root, "item = 'b'").unwrap(),
            XPathValue::Boolean(true)
        );
        assert_eq!(
            evaluate_from_node(&tree, root, "-item[@n='2']/@n").unwrap(),
            XPathValue::Number(-2.0)
        );
    }

    #[test]
    fn test_node_evaluator_scalarizes() {
        let (tree, root) = sample();
        let mut vars = Variables::new();
        vars.insert("who".into(), XPathValue::from("world"));
        let evaluator = NodeEvaluator::new(&tree, root).with_variables(&vars);

        let expr = super::super::compiler::compile("item").unwrap();
        assert_eq!(evaluator.evaluate(&expr).unwrap(), XPathValue::String("a".into()));

        let expr = super::super::compiler::compile("concat('hello ', $who)").unwrap();
        assert_eq!(
            evaluator.evaluate(&expr).unwrap(),
            XPathValue::String("hello world".into())
        );
    }

    #[test]
    fn test_unbound_variable() {
        let (tree, root) = sample();
        let evaluator = NodeEvaluator::new(&tree, root);
        let expr = super::super::compiler::compile("$missing").unwrap();
        assert_eq!(
            evaluator.evaluate(&expr),
            Err(EvalError::UnboundVariable("missing".into()))
        );
    }
}
