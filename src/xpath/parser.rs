//! XPath Parser
//!
//! Recursive descent for paths and primaries, precedence climbing for the
//! binary operators.

use super::lexer::{Lexer, Token};
use crate::error::EvalError;

/// XPath expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Document node (/)
    Root,
    /// Location step relative to the context node
    Step(Step),
    /// Step applied to every node of a base expression
    Path(Box<Expr>, Step),
    /// Predicate applied to a primary expression
    Filter(Box<Expr>, Box<Expr>),
    Union(Box<Expr>, Box<Expr>),
    Function(String, Vec<Expr>),
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    Negate(Box<Expr>),
    Number(f64),
    String(String),
    Variable(String),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    /// Binding strength and operator for a token, if it is a binary operator
    fn from_token(token: &Token) -> Option<(u8, BinaryOp)> {
        let entry = match token {
            Token::Or => (1, BinaryOp::Or),
            Token::And => (2, BinaryOp::And),
            Token::Eq => (3, BinaryOp::Eq),
            Token::NotEq => (3, BinaryOp::NotEq),
            Token::Lt => (4, BinaryOp::Lt),
            Token::LtEq => (4, BinaryOp::LtEq),
            Token::Gt => (4, BinaryOp::Gt),
            Token::GtEq => (4, BinaryOp::GtEq),
            Token::Plus => (5, BinaryOp::Add),
            Token::Minus => (5, BinaryOp::Sub),
            Token::Star => (6, BinaryOp::Mul),
            Token::Div => (6, BinaryOp::Div),
            Token::Mod => (6, BinaryOp::Mod),
            _ => return None,
        };
        Some(entry)
    }
}

/// Location step in a path
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    fn bare(axis: Axis, node_test: NodeTest) -> Self {
        Step {
            axis,
            node_test,
            predicates: Vec::new(),
        }
    }
}

/// Supported axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Self_,
    Attribute,
}

impl Axis {
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "child" => Some(Axis::Child),
            "descendant" => Some(Axis::Descendant),
            "descendant-or-self" => Some(Axis::DescendantOrSelf),
            "parent" => Some(Axis::Parent),
            "self" => Some(Axis::Self_),
            "attribute" => Some(Axis::Attribute),
            _ => None,
        }
    }
}

/// Node test in a location step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// `*`
    Any,
    /// Unprefixed name
    Name(String),
    /// prefix:local
    QName(String, String),
    /// node()
    Node,
    /// text()
    Text,
}

/// XPath parser
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peeked: Option<Token>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Result<Self, EvalError> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current,
            peeked: None,
        })
    }

    /// Parse a complete expression
    pub fn parse(&mut self) -> Result<Expr, EvalError> {
        let expr = self.parse_binary(1)?;
        if self.current != Token::Eof {
            return Err(unexpected(&self.current));
        }
        Ok(expr)
    }

    fn advance(&mut self) -> Result<(), EvalError> {
        self.current = match self.peeked.take() {
            Some(t) => t,
            None => self.lexer.next_token()?,
        };
        Ok(())
    }

    fn peek(&mut self) -> Result<&Token, EvalError> {
        if self.peeked.is_none() {
            self.peeked = Some(self.lexer.next_token()?);
        }
        Ok(self.peeked.as_ref().unwrap_or(&Token::Eof))
    }

    fn expect(&mut self, token: Token) -> Result<(), EvalError> {
        if self.current != token {
            return Err(EvalError::Parse(format!(
                "expected {:?}, got {:?}",
                token, self.current
            )));
        }
        self.advance()
    }

    /// Binary operators with precedence at least `min_prec`, left-associative
    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, EvalError> {
        let mut left = self.parse_unary()?;
        while let Some((prec, op)) = BinaryOp::from_token(&self.current) {
            if prec < min_prec {
                break;
            }
            self.advance()?;
            let right = self.parse_binary(prec + 1)?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        if self.current == Token::Minus {
            self.advance()?;
            return Ok(Expr::Negate(Box::new(self.parse_unary()?)));
        }
        let mut left = self.parse_path()?;
        while self.current == Token::Pipe {
            self.advance()?;
            let right = self.parse_path()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_path(&mut self) -> Result<Expr, EvalError> {
        let relative = starts_step(&self.current) && !self.at_function_call()?;
        let mut expr = match self.current {
            Token::Slash => {
                self.advance()?;
                if !starts_step(&self.current) {
                    return Ok(Expr::Root);
                }
                Expr::Path(Box::new(Expr::Root), self.parse_step()?)
            }
            Token::DoubleSlash => {
                self.advance()?;
                let base = Expr::Path(Box::new(Expr::Root), descendant_or_self());
                Expr::Path(Box::new(base), self.parse_step()?)
            }
            _ if relative => Expr::Step(self.parse_step()?),
            _ => self.parse_filter()?,
        };

        loop {
            match self.current {
                Token::Slash => {
                    self.advance()?;
                    expr = Expr::Path(Box::new(expr), self.parse_step()?);
                }
                Token::DoubleSlash => {
                    self.advance()?;
                    let base = Expr::Path(Box::new(expr), descendant_or_self());
                    expr = Expr::Path(Box::new(base), self.parse_step()?);
                }
                _ => return Ok(expr),
            }
        }
    }

    fn at_function_call(&mut self) -> Result<bool, EvalError> {
        Ok(matches!(self.current, Token::Name(_)) && *self.peek()? == Token::LeftParen)
    }

    fn parse_filter(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.parse_primary()?;
        while self.current == Token::LeftBracket {
            let pred = self.parse_predicate()?;
            expr = Expr::Filter(Box::new(expr), Box::new(pred));
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        let expr = match &self.current {
            Token::Number(n) => Expr::Number(*n),
            Token::String(s) => Expr::String(s.clone()),
            Token::Variable(name) => Expr::Variable(name.clone()),
            Token::LeftParen => {
                self.advance()?;
                let inner = self.parse_binary(1)?;
                self.expect(Token::RightParen)?;
                return Ok(inner);
            }
            Token::Name(name) => {
                let name = name.clone();
                self.advance()?;
                self.expect(Token::LeftParen)?;
                let args = self.parse_arguments()?;
                return Ok(Expr::Function(name, args));
            }
            other => return Err(unexpected(other)),
        };
        self.advance()?;
        Ok(expr)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, EvalError> {
        let mut args = Vec::new();
        if self.current != Token::RightParen {
            args.push(self.parse_binary(1)?);
            while self.current == Token::Comma {
                self.advance()?;
                args.push(self.parse_binary(1)?);
            }
        }
        self.expect(Token::RightParen)?;
        Ok(args)
    }

    fn parse_predicate(&mut self) -> Result<Expr, EvalError> {
        self.expect(Token::LeftBracket)?;
        let pred = self.parse_binary(1)?;
        self.expect(Token::RightBracket)?;
        Ok(pred)
    }

    fn parse_step(&mut self) -> Result<Step, EvalError> {
        let axis = match &self.current {
            Token::Dot => {
                self.advance()?;
                return Ok(Step::bare(Axis::Self_, NodeTest::Node));
            }
            Token::DoubleDot => {
                self.advance()?;
                return Ok(Step::bare(Axis::Parent, NodeTest::Node));
            }
            Token::At => {
                self.advance()?;
                Axis::Attribute
            }
            Token::Axis(name) => {
                let axis = Axis::from_name(name)
                    .ok_or_else(|| EvalError::Parse(format!("unsupported axis: {}", name)))?;
                self.advance()?;
                axis
            }
            _ => Axis::Child,
        };

        let node_test = match &self.current {
            Token::Star => NodeTest::Any,
            Token::Name(name) => NodeTest::Name(name.clone()),
            Token::QName(prefix, local) if !local.is_empty() => {
                NodeTest::QName(prefix.clone(), local.clone())
            }
            Token::NodeType(kind) => {
                let test = if kind == "text" {
                    NodeTest::Text
                } else {
                    NodeTest::Node
                };
                self.advance()?;
                self.expect(Token::LeftParen)?;
                if self.current != Token::RightParen {
                    return Err(unexpected(&self.current));
                }
                test
            }
            other => return Err(unexpected(other)),
        };
        self.advance()?;

        let mut step = Step::bare(axis, node_test);
        while self.current == Token::LeftBracket {
            step.predicates.push(self.parse_predicate()?);
        }
        Ok(step)
    }
}

fn starts_step(token: &Token) -> bool {
    matches!(
        token,
        Token::Name(_)
            | Token::QName(..)
            | Token::Star
            | Token::At
            | Token::Dot
            | Token::DoubleDot
            | Token::Axis(_)
            | Token::NodeType(_)
    )
}

fn descendant_or_self() -> Step {
    Step::bare(Axis::DescendantOrSelf, NodeTest::Node)
}

fn unexpected(token: &Token) -> EvalError {
    EvalError::Parse(format!("unexpected token {:?}", token))
}

/// Parse an XPath expression string
pub fn parse(input: &str) -> Result<Expr, EvalError> {
    Parser::new(input)?.parse()
}
