use crate::lox::LoxError;
use crate::token::{Literal, RcToken, Token};
use crate::token_type::TokenType;
use crate::token_type::TokenType::*;

use std::rc::Rc;

trait Alpha {
    fn is_ascii_identifier(&self) -> bool;
}

impl Alpha for u8 {
    fn is_ascii_identifier(&self) -> bool {
        self.is_ascii_alphanumeric() || *self == b'_'
    }
}

fn keyword(text: &str) -> Option<TokenType> {
    Some(match text {
        "and" => AND,
        "class" => CLASS,
        "else" => ELSE,
        "false" => FALSE,
        "for" => FOR,
        "fun" => FUN,
        "if" => IF,
        "nil" => NIL,
        "or" => OR,
        "print" => PRINT,
        "return" => RETURN,
        "super" => SUPER,
        "this" => THIS,
        "true" => TRUE,
        "var" => VAR,
        "while" => WHILE,
        _ => return None,
    })
}

/// Turns source text into the token stream the parser consumes.
pub struct Scanner<'a> {
    source: &'a str,
    tokens: Vec<RcToken>,
    start: usize,
    current: usize,
    line: usize,
}

macro_rules! match_ {
    ($self:ident, $expected:literal) => {
        if $self.is_at_end() || $self.bytes()[$self.current] != $expected {
            false
        } else {
            $self.current += 1;
            true
        }
    };
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Scanner {
            source,
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
        }
    }

    pub fn scan_tokens(mut self) -> Result<Vec<RcToken>, LoxError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }
        self.tokens
            .push(Rc::new(Token::new(EOF, "", Literal::NIL, self.line)));
        Ok(self.tokens)
    }

    #[inline(always)]
    fn bytes(&self) -> &'a [u8] {
        self.source.as_bytes()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn scan_token(&mut self) -> Result<(), LoxError> {
        let c = self.advance();
        match c {
            b'(' => self.add_token(LEFT_PAREN),
            b')' => self.add_token(RIGHT_PAREN),
            b'{' => self.add_token(LEFT_BRACE),
            b'}' => self.add_token(RIGHT_BRACE),
            b',' => self.add_token(COMMA),
            b'.' => self.add_token(DOT),
            b'-' => self.add_token(MINUS),
            b'+' => self.add_token(PLUS),
            b';' => self.add_token(SEMICOLON),
            b'*' => self.add_token(STAR),
            b'?' => self.add_token(QUESTION),
            b':' => self.add_token(COLON),
            b'!' => {
                let matches = match_!(self, b'=');
                self.add_token(if matches { BANG_EQUAL } else { BANG })
            }
            b'=' => {
                let matches = match_!(self, b'=');
                self.add_token(if matches { EQUAL_EQUAL } else { EQUAL })
            }
            b'<' => {
                let matches = match_!(self, b'=');
                self.add_token(if matches { LESS_EQUAL } else { LESS })
            }
            b'>' => {
                let matches = match_!(self, b'=');
                self.add_token(if matches { GREATER_EQUAL } else { GREATER })
            }
            b'/' => {
                if match_!(self, b'/') {
                    // a comment -- //
                    while self.peek() != b'\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(SLASH);
                }
            }
            b' ' | b'\r' | b'\t' => {}
            b'\n' => self.line += 1,
            b'"' => return self.string(),
            b'0'..=b'9' => return self.number(),
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => self.identifier(),
            _ => {
                return Err(LoxError::ScanError {
                    line: self.line,
                    message: String::from("Unexpected character."),
                });
            }
        }
        Ok(())
    }

    fn advance(&mut self) -> u8 {
        let res = self.bytes()[self.current];
        self.current += 1;
        res
    }

    fn add_token_literal(&mut self, type_: TokenType, literal: Literal) {
        let text = &self.source[self.start..self.current];
        self.tokens
            .push(Rc::new(Token::new(type_, text, literal, self.line)));
    }

    fn add_token(&mut self, type_: TokenType) {
        self.add_token_literal(type_, Literal::NIL);
    }

    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            return b'\0';
        }
        self.bytes()[self.current]
    }

    fn peek_next(&self) -> u8 {
        if self.current + 1 >= self.source.len() {
            return b'\0';
        }
        self.bytes()[self.current + 1]
    }

    fn string(&mut self) -> Result<(), LoxError> {
        while self.peek() != b'"' && !self.is_at_end() {
            if self.peek() == b'\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            return Err(LoxError::ScanError {
                line: self.line,
                message: String::from("Unterminated string."),
            });
        }
        // the closing "
        self.advance();
        let value = self.source[self.start + 1..self.current - 1].to_string();
        self.add_token_literal(STRING, Literal::STRING(value));
        Ok(())
    }

    fn number(&mut self) -> Result<(), LoxError> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        // look for fractional part .
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }
        let value = self.source[self.start..self.current]
            .parse()
            .map_err(|_| LoxError::ScanError {
                line: self.line,
                message: String::from("Invalid number."),
            })?;
        self.add_token_literal(NUMBER, Literal::NUMBER(value));
        Ok(())
    }

    fn identifier(&mut self) {
        while self.peek().is_ascii_identifier() {
            self.advance();
        }
        let text = &self.source[self.start..self.current];
        let token_type = keyword(text).unwrap_or(IDENTIFIER);
        self.add_token(token_type);
    }
}
