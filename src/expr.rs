use crate::token::*;

#[derive(PartialEq, Clone, Debug)]
pub enum Expr {
    Assign {
        name: RcToken,
        value: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        operator: RcToken,
        right: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        /// Closing paren, kept for the line of call-time errors.
        paren: RcToken,
        arguments: Vec<Expr>,
    },
    Grouping(Box<Expr>),
    Literal(Literal),
    Logical {
        left: Box<Expr>,
        operator: RcToken,
        right: Box<Expr>,
    },
    Ternary {
        condition: Box<Expr>,
        question: RcToken,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    Unary {
        operator: RcToken,
        right: Box<Expr>,
    },
    Variable {
        name: RcToken,
    },
}
