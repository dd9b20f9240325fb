//! XPath Value-Expression Engine
//!
//! XPath 1.0 subset used for the values a compiled path writes:
//! - child, attribute, self, parent and descendant axes
//! - predicates, unions, arithmetic and comparisons
//! - the string/boolean/number core functions
//! - LRU caching of compiled expressions

pub mod axes;
pub mod cache;
pub mod compiler;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod value;

pub use cache::ExpressionCache;
pub use compiler::{compile, CompiledExpr};
pub use eval::{evaluate_compiled, evaluate_from_node, EvalContext, Evaluator, NodeEvaluator, Variables};
pub use value::XPathValue;
