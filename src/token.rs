use crate::token_type::TokenType;
use std::fmt;
use std::rc::Rc;

#[allow(non_camel_case_types)]
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    STRING(String),
    NUMBER(f64),
    BOOL(bool),
    NIL,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub type_: TokenType,
    pub lexeme: String,
    pub literal: Literal,
    pub line: usize,
}

impl Token {
    pub fn new(type_: TokenType, lexeme: &str, literal: Literal, line: usize) -> Token {
        Token {
            type_,
            lexeme: lexeme.to_string(),
            literal,
            line,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Token] type: {:?}, lexeme: {}, literal: {:?}, line: {}",
            self.type_, self.lexeme, self.literal, self.line
        )
    }
}

pub type RcToken = Rc<Token>;

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::STRING(st) => f.write_str(st),
            Literal::NUMBER(num) => write_number(f, *num),
            Literal::BOOL(bl) => write!(f, "{}", bl),
            Literal::NIL => f.write_str("nil"),
        }
    }
}

/// Plain decimals between 1e-3 and 1e7, `1.0E21` style outside that range.
fn write_number(f: &mut fmt::Formatter<'_>, num: f64) -> fmt::Result {
    if num.is_nan() {
        return f.write_str("NaN");
    }
    if num.is_infinite() {
        return f.write_str(if num > 0.0 { "Infinity" } else { "-Infinity" });
    }
    let magnitude = num.abs();
    if magnitude != 0.0 && !(1e-3..1e7).contains(&magnitude) {
        let text = format!("{:e}", num);
        let (mantissa, exponent) = text.split_once('e').unwrap_or((text.as_str(), "0"));
        if mantissa.contains('.') {
            write!(f, "{}E{}", mantissa, exponent)
        } else {
            write!(f, "{}.0E{}", mantissa, exponent)
        }
    } else {
        let text = format!("{}", num);
        f.write_str(text.strip_suffix(".0").unwrap_or(&text))
    }
}
