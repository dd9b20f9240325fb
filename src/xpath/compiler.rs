//! XPath Expression Compiler
//!
//! Flattens the parsed AST into a postfix program for the stack evaluator.

use super::parser::{Axis, BinaryOp, Expr, NodeTest, Step};
use crate::error::EvalError;

/// Compiled XPath expression
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpr {
    /// Expression text the program was compiled from
    pub source: String,
    pub ops: Vec<Op>,
}

/// Compiled operation
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Push the document node
    Root,
    /// Push the context node
    Context,
    /// Replace the node-set on top of the stack with the nodes reached along an axis
    Navigate(Axis, NodeTest),
    /// Filter the node-set on top of the stack
    Predicate(Box<CompiledExpr>),
    Union,
    Number(f64),
    String(String),
    Variable(String),
    /// Call function: name, arg count
    Call(String, usize),
    Binary(BinaryOp),
    Negate,
}

impl CompiledExpr {
    /// Compile a parsed expression
    pub fn compile(source: &str, expr: &Expr) -> Self {
        let mut ops = Vec::new();
        Self::compile_expr(expr, &mut ops);
        CompiledExpr {
            source: source.to_string(),
            ops,
        }
    }

    fn compile_expr(expr: &Expr, ops: &mut Vec<Op>) {
        match expr {
            Expr::Root => ops.push(Op::Root),
            Expr::Step(step) => {
                ops.push(Op::Context);
                Self::compile_step(step, ops);
            }
            Expr::Path(base, step) => {
                Self::compile_expr(base, ops);
                Self::compile_step(step, ops);
            }
            Expr::Filter(base, pred) => {
                Self::compile_expr(base, ops);
                ops.push(Op::Predicate(Box::new(Self::compile_nested(pred))));
            }
            Expr::Union(left, right) => {
                Self::compile_expr(left, ops);
                Self::compile_expr(right, ops);
                ops.push(Op::Union);
            }
            Expr::Function(name, args) => {
                for arg in args {
                    Self::compile_expr(arg, ops);
                }
                ops.push(Op::Call(name.clone(), args.len()));
            }
            Expr::Binary(left, op, right) => {
                Self::compile_expr(left, ops);
                Self::compile_expr(right, ops);
                ops.push(Op::Binary(*op));
            }
            Expr::Negate(inner) => {
                Self::compile_expr(inner, ops);
                ops.push(Op::Negate);
            }
            Expr::Number(n) => ops.push(Op::Number(*n)),
            Expr::String(s) => ops.push(Op::String(s.clone())),
            Expr::Variable(name) => ops.push(Op::Variable(name.clone())),
        }
    }

    fn compile_step(step: &Step, ops: &mut Vec<Op>) {
        ops.push(Op::Navigate(step.axis, step.node_test.clone()));
        for pred in &step.predicates {
            ops.push(Op::Predicate(Box::new(Self::compile_nested(pred))));
        }
    }

    fn compile_nested(expr: &Expr) -> CompiledExpr {
        let mut ops = Vec::new();
        Self::compile_expr(expr, &mut ops);
        CompiledExpr {
            source: String::new(),
            ops,
        }
    }

    /// A program that pushes a single string literal
    pub fn literal(text: &str) -> Self {
        CompiledExpr {
            source: format!("'{}'", text),
            ops: vec![Op::String(text.to_string())],
        }
    }
}

/// Compile an XPath expression string
pub fn compile(xpath: &str) -> Result<CompiledExpr, EvalError> {
    let expr = super::parser::parse(xpath)?;
    Ok(CompiledExpr::compile(xpath, &expr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_absolute() {
        let compiled = compile("/root").unwrap();
        assert_eq!(compiled.source, "/root");
        assert!(matches!(compiled.ops[0], Op::Root));
        assert!(matches!(compiled.ops[1], Op::Navigate(Axis::Child, _)));
    }

    #[test]
    fn test_compile_postfix_order() {
        let compiled = compile("1 + $n").unwrap();
        assert_eq!(
            compiled.ops,
            vec![
                Op::Number(1.0),
                Op::Variable("n".into()),
                Op::Binary(BinaryOp::Add)
            ]
        );
    }

    #[test]
    fn test_compile_predicate() {
        let compiled = compile("Item1[2]").unwrap();
        assert_eq!(compiled.ops.len(), 3);
        assert!(matches!(compiled.ops[2], Op::Predicate(_)));
    }

    #[test]
    fn test_literal() {
        let compiled = CompiledExpr::literal("x");
        assert_eq!(compiled.ops, vec![Op::String("x".into())]);
    }
}
