//! XPath Lexer
//!
//! Tokenizes value expressions. Covers the XPath 1.0 token set minus
//! comments and processing instructions.

use crate::error::EvalError;

/// XPath token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Operators
    Slash,       // /
    DoubleSlash, // //
    Dot,         // .
    DoubleDot,   // ..
    At,          // @
    Pipe,        // |
    Plus,        // +
    Minus,       // -
    Star,        // *
    Eq,          // =
    NotEq,       // !=
    Lt,          // <
    LtEq,        // <=
    Gt,          // >
    GtEq,        // >=
    And,         // and
    Or,          // or
    Mod,         // mod
    Div,         // div

    // Brackets
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,

    // Literals
    Number(f64),
    String(String),

    // Names
    Name(String),               // NCName
    QName(String, String),      // prefix:local
    NodeType(String),           // node(), text()
    Axis(String),               // child::, attribute::, ...
    Variable(String),           // $name

    Comma,
    Eof,
}

/// XPath lexer
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.rest().chars().nth(offset)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consume `c` if it is next
    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token, EvalError> {
        self.skip_whitespace();

        let Some(c) = self.peek() else {
            return Ok(Token::Eof);
        };

        if c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) {
            return Ok(self.read_number());
        }
        if c.is_ascii_digit() {
            return Ok(self.read_number());
        }
        if c == '"' || c == '\'' {
            return self.read_string(c);
        }
        if is_name_start_char(c) {
            return Ok(self.read_name_or_keyword());
        }

        self.bump();
        let token = match c {
            '/' if self.eat('/') => Token::DoubleSlash,
            '/' => Token::Slash,
            '.' if self.eat('.') => Token::DoubleDot,
            '.' => Token::Dot,
            '@' => Token::At,
            '|' => Token::Pipe,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '=' => Token::Eq,
            '!' if self.eat('=') => Token::NotEq,
            '<' if self.eat('=') => Token::LtEq,
            '<' => Token::Lt,
            '>' if self.eat('=') => Token::GtEq,
            '>' => Token::Gt,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            '[' => Token::LeftBracket,
            ']' => Token::RightBracket,
            ',' => Token::Comma,
            '$' => {
                let name = self.read_ncname();
                if name.is_empty() {
                    return Err(EvalError::Parse("expected variable name after $".into()));
                }
                Token::Variable(name.to_string())
            }
            other => {
                return Err(EvalError::Parse(format!(
                    "unexpected character '{}' at {}",
                    other,
                    self.pos - other.len_utf8()
                )))
            }
        };
        Ok(token)
    }

    fn read_number(&mut self) -> Token {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some('.') {
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        Token::Number(self.input[start..self.pos].parse().unwrap_or(f64::NAN))
    }

    fn read_string(&mut self, quote: char) -> Result<Token, EvalError> {
        self.bump();
        let start = self.pos;
        while let Some(c) = self.bump() {
            if c == quote {
                let end = self.pos - quote.len_utf8();
                return Ok(Token::String(self.input[start..end].to_string()));
            }
        }
        Err(EvalError::Parse("unterminated string literal".into()))
    }

    fn read_ncname(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.bump();
        }
        &self.input[start..self.pos]
    }

    fn read_name_or_keyword(&mut self) -> Token {
        let name = self.read_ncname();

        // Operator names are only keywords where an operator can appear;
        // this lexer keeps the simple rule of treating them as keywords always.
        match name {
            "and" => return Token::And,
            "or" => return Token::Or,
            "mod" => return Token::Mod,
            "div" => return Token::Div,
            _ => {}
        }

        // prefix:local (but not axis::)
        if self.peek() == Some(':') && self.peek_at(1) != Some(':') {
            self.bump();
            let local = self.read_ncname();
            return Token::QName(name.to_string(), local.to_string());
        }

        let save = self.pos;
        self.skip_whitespace();
        if self.rest().starts_with("::") {
            self.pos += 2;
            return Token::Axis(name.to_string());
        }
        if self.peek() == Some('(') && matches!(name, "node" | "text") {
            return Token::NodeType(name.to_string());
        }
        self.pos = save;
        Token::Name(name.to_string())
    }

    /// Tokenize entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, EvalError> {
        let mut tokens = Vec::new();
        loop {
            match self.next_token()? {
                Token::Eof => return Ok(tokens),
                token => tokens.push(token),
            }
        }
    }
}

fn is_name_start_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_path() {
        let tokens = Lexer::new("/root/child").tokenize().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Slash,
                Token::Name("root".into()),
                Token::Slash,
                Token::Name("child".into()),
            ]
        );
    }

    #[test]
    fn test_predicate() {
        let tokens = Lexer::new("Item1[@x:id='7']").tokenize().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Name("Item1".into()),
                Token::LeftBracket,
                Token::At,
                Token::QName("x".into(), "id".into()),
                Token::Eq,
                Token::String("7".into()),
                Token::RightBracket,
            ]
        );
    }

    #[test]
    fn test_axis_and_variable() {
        let tokens = Lexer::new("attribute :: kind = $k").tokenize().unwrap();
        assert_eq!(tokens[0], Token::Axis("attribute".into()));
        assert_eq!(tokens[1], Token::Name("kind".into()));
        assert_eq!(tokens[3], Token::Variable("k".into()));
    }

    #[test]
    fn test_numbers() {
        let tokens = Lexer::new("1.5 + .5 - 2").tokenize().unwrap();
        assert_eq!(tokens[0], Token::Number(1.5));
        assert_eq!(tokens[2], Token::Number(0.5));
        assert_eq!(tokens[4], Token::Number(2.0));
    }

    #[test]
    fn test_errors() {
        assert!(Lexer::new("'open").tokenize().is_err());
        assert!(Lexer::new("a # b").tokenize().is_err());
        assert!(Lexer::new("$").tokenize().is_err());
    }
}
