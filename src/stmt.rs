use crate::expr::Expr;
use crate::token::RcToken;
use std::rc::Rc;

#[derive(PartialEq, Clone, Debug)]
pub enum Stmt {
    Block {
        statements: Vec<Stmt>,
    },
    Expression {
        expr: Expr,
    },
    Function(Rc<FunctionDecl>),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    Print {
        expr: Expr,
    },
    Return {
        keyword: RcToken,
        value: Option<Expr>,
    },
    Var {
        name: RcToken,
        initializer: Option<Expr>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
}

/// A `fun` declaration. Shared between the tree and every function value
/// created from it.
#[derive(PartialEq, Clone, Debug)]
pub struct FunctionDecl {
    pub name: RcToken,
    pub params: Vec<RcToken>,
    pub body: Vec<Stmt>,
}
