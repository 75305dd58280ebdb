use crate::expr::*;
use crate::lox::{LoxError, Reporter};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::*;
use crate::token_type::TokenType::*;
use std::rc::Rc;

const MAX_ARGUMENTS: usize = 255;

/// Deepest nesting of statements and expressions the parser accepts.
pub const MAX_NESTING: usize = 1000;

/// Recursive descent parser over a scanned token stream.
///
/// Syntax errors are sent to the reporter as soon as they are found. Once any
/// error has been reported the parse result is withheld.
pub struct Parser<'a> {
    reporter: &'a mut dyn Reporter,
    tokens: Vec<RcToken>,
    current: usize,
    had_error: bool,
    function_depth: usize,
    nesting: usize,
}

type ExprResult = Result<Expr, LoxError>;

type StmtResult = Result<Stmt, LoxError>;

macro_rules! check {
    ($self:ident, $types:pat) => {
        if $self.is_at_end() {
            false
        } else {
            matches!(&$self.peek().type_, $types)
        }
    };
}

macro_rules! match_ {
    ($self:ident, $types:pat) => {
        if check!($self, $types) {
            $self.advance();
            true
        } else {
            false
        }
    };
}

macro_rules! consume {
    ($self:ident, $type_:pat, $message:expr) => {
        if check!($self, $type_) {
            Ok($self.advance())
        } else {
            Err(Parser::error($self.peek(), $message))
        }
    };
    ($self:ident, $type_:pat, $message:literal, $($args: tt) *) => {
        if check!($self, $type_) {
            Ok($self.advance())
        } else {
            Err(Parser::error($self.peek(), format!($message, $($args,) *)))
        }
    };
}

impl<'a> Parser<'a> {
    pub fn new(reporter: &'a mut dyn Reporter, mut tokens: Vec<RcToken>) -> Parser<'a> {
        if !matches!(tokens.last(), Some(token) if token.type_ == EOF) {
            let line = tokens.last().map_or(1, |token| token.line);
            tokens.push(Rc::new(Token::new(EOF, "", Literal::NIL, line)));
        }
        Parser {
            reporter,
            tokens,
            current: 0,
            had_error: false,
            function_depth: 0,
            nesting: 0,
        }
    }

    /// Parses a whole program.
    ///
    /// After an error the parser skips to the next statement boundary and keeps
    /// going so that later errors are reported too, but returns `None`.
    pub fn parse(&mut self) -> Option<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();
        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.report(&err);
                    self.synchronize();
                }
            }
        }
        if self.had_error {
            None
        } else {
            Some(statements)
        }
    }

    /// Parses a single comma-separated expression sequence, as typed at the
    /// prompt. Only the last expression of the sequence is kept.
    pub fn parse_expression(&mut self) -> Option<Expr> {
        let result = self.comma().and_then(|expr| {
            if self.is_at_end() {
                Ok(expr)
            } else {
                Err(Parser::error(self.peek(), "Expect end of expression."))
            }
        });
        match result {
            Ok(expr) if !self.had_error => Some(expr),
            Ok(_) => None,
            Err(err) => {
                self.report(&err);
                None
            }
        }
    }

    fn comma(&mut self) -> ExprResult {
        let mut expr = self.expression()?;
        while match_!(self, COMMA) {
            expr = self.expression()?;
        }
        Ok(expr)
    }

    fn expression(&mut self) -> ExprResult {
        self.nested(Parser::assignment)
    }

    /// Runs one recursive rule one level deeper, failing once the input nests
    /// past [`MAX_NESTING`].
    fn nested<T>(&mut self, rule: fn(&mut Self) -> Result<T, LoxError>) -> Result<T, LoxError> {
        if self.nesting >= MAX_NESTING {
            return Err(Parser::error(self.peek(), "Too much nesting."));
        }
        self.nesting += 1;
        let result = rule(self);
        self.nesting -= 1;
        result
    }

    fn declaration(&mut self) -> StmtResult {
        self.nested(Parser::declaration_rule)
    }

    fn declaration_rule(&mut self) -> StmtResult {
        if match_!(self, FUN) {
            self.function("function")
        } else if match_!(self, VAR) {
            self.var_declaration()
        } else {
            self.statement()
        }
    }

    fn statement(&mut self) -> StmtResult {
        self.nested(Parser::statement_rule)
    }

    fn statement_rule(&mut self) -> StmtResult {
        if match_!(self, FOR) {
            return self.for_statement();
        }
        if match_!(self, IF) {
            return self.if_statement();
        }
        if match_!(self, PRINT) {
            return self.print_statement();
        }
        if match_!(self, RETURN) {
            return self.return_statement();
        }
        if match_!(self, WHILE) {
            return self.while_statement();
        }
        if match_!(self, LEFT_BRACE) {
            return Ok(Stmt::Block {
                statements: self.block()?,
            });
        }
        self.expression_statement()
    }

    fn for_statement(&mut self) -> StmtResult {
        consume!(self, LEFT_PAREN, "Expect '(' after 'for'.")?;

        let initializer = if match_!(self, SEMICOLON) {
            None
        } else if match_!(self, VAR) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };
        let mut condition = None;
        if !check!(self, SEMICOLON) {
            condition = Some(self.expression()?);
        }
        consume!(self, SEMICOLON, "Expect ';' after loop condition.")?;

        let mut increment = None;
        if !check!(self, RIGHT_PAREN) {
            increment = Some(self.expression()?);
        }
        consume!(self, RIGHT_PAREN, "Expect ')' after for clauses.")?;
        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block {
                statements: vec![body, Stmt::Expression { expr: increment }],
            }
        }

        let condition = condition.unwrap_or(Expr::Literal(Literal::BOOL(true)));
        body = Stmt::While {
            condition,
            body: Box::new(body),
        };
        if let Some(initializer) = initializer {
            body = Stmt::Block {
                statements: vec![initializer, body],
            };
        }
        Ok(body)
    }

    fn if_statement(&mut self) -> StmtResult {
        consume!(self, LEFT_PAREN, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        consume!(self, RIGHT_PAREN, "Expect ')' after if condition.")?;

        let then_branch = self.statement()?;
        let else_branch = if match_!(self, ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            condition,
            then_branch: Box::new(then_branch),
            else_branch,
        })
    }

    fn print_statement(&mut self) -> StmtResult {
        let value = self.expression()?;
        consume!(self, SEMICOLON, "Expect ';' after value.")?;
        Ok(Stmt::Print { expr: value })
    }

    fn return_statement(&mut self) -> StmtResult {
        let keyword = self.previous();
        if self.function_depth == 0 {
            self.report(&Parser::error(&keyword, "Can't return from top-level code."));
        }
        let value = if !check!(self, SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        consume!(self, SEMICOLON, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn var_declaration(&mut self) -> StmtResult {
        let name = consume!(self, IDENTIFIER, "Expect variable name.")?;
        let mut initializer = None;
        if match_!(self, EQUAL) {
            initializer = Some(self.expression()?);
        }
        consume!(self, SEMICOLON, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var { name, initializer })
    }

    fn while_statement(&mut self) -> StmtResult {
        consume!(self, LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        consume!(self, RIGHT_PAREN, "Expect ')' after condition.")?;
        let body = self.statement()?;
        Ok(Stmt::While {
            condition,
            body: Box::new(body),
        })
    }

    fn expression_statement(&mut self) -> StmtResult {
        let expr = self.expression()?;
        consume!(self, SEMICOLON, "Expect ';' after expression.")?;
        Ok(Stmt::Expression { expr })
    }

    fn function(&mut self, kind: &'static str) -> StmtResult {
        let name = consume!(self, IDENTIFIER, "Expect {} name.", kind)?;
        consume!(self, LEFT_PAREN, "Expect '(' after {} name.", kind)?;
        let mut params: Vec<RcToken> = Vec::new();
        if !check!(self, RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARGUMENTS {
                    let err = Parser::error(self.peek(), "Can't have more than 255 parameters.");
                    self.report(&err);
                }
                params.push(consume!(self, IDENTIFIER, "Expect parameter name.")?);
                if !match_!(self, COMMA) {
                    break;
                }
            }
        }
        consume!(self, RIGHT_PAREN, "Expect ')' after parameters.")?;

        consume!(self, LEFT_BRACE, "Expect '{{' before {} body.", kind)?;
        self.function_depth += 1;
        let body = self.block();
        self.function_depth -= 1;
        Ok(Stmt::Function(Rc::new(FunctionDecl {
            name,
            params,
            body: body?,
        })))
    }

    fn block(&mut self) -> Result<Vec<Stmt>, LoxError> {
        let mut statements = Vec::new();
        while !check!(self, RIGHT_BRACE) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }
        consume!(self, RIGHT_BRACE, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn assignment(&mut self) -> ExprResult {
        let expr = self.or()?;
        if match_!(self, EQUAL) {
            let equals = self.previous();
            let value = self.nested(Parser::assignment)?;
            match expr {
                Expr::Variable { name } => {
                    return Ok(Expr::Assign {
                        name,
                        value: Box::new(value),
                    });
                }
                _ => self.report(&Parser::error(&equals, "Invalid assignment target.")),
            }
        }
        Ok(expr)
    }

    fn or(&mut self) -> ExprResult {
        let mut expr = self.and()?;
        while match_!(self, OR) {
            let operator = self.previous();
            let right = self.and()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn and(&mut self) -> ExprResult {
        let mut expr = self.ternary()?;
        while match_!(self, AND) {
            let operator = self.previous();
            let right = self.ternary()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn ternary(&mut self) -> ExprResult {
        let expr = self.equality()?;
        if match_!(self, QUESTION) {
            let question = self.previous();
            let then_branch = self.expression()?;
            consume!(self, COLON, "Expect ':' after then branch of conditional expression.")?;
            let else_branch = self.expression()?;
            return Ok(Expr::Ternary {
                condition: Box::new(expr),
                question,
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            });
        }
        Ok(expr)
    }

    fn equality(&mut self) -> ExprResult {
        let mut expr = self.comparison()?;
        while match_!(self, BANG_EQUAL | EQUAL_EQUAL) {
            let operator = self.previous();
            let right = self.comparison()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> ExprResult {
        let mut expr = self.term()?;
        while match_!(self, GREATER | GREATER_EQUAL | LESS | LESS_EQUAL) {
            let operator = self.previous();
            let right = self.term()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn term(&mut self) -> ExprResult {
        let mut expr = self.factor()?;
        while match_!(self, MINUS | PLUS) {
            let operator = self.previous();
            let right = self.factor()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn factor(&mut self) -> ExprResult {
        let mut expr = self.unary()?;
        while match_!(self, SLASH | STAR) {
            let operator = self.previous();
            let right = self.unary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ExprResult {
        if match_!(self, BANG | MINUS) {
            let operator = self.previous();
            let right = self.nested(Parser::unary)?;
            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }
        self.call()
    }

    fn finish_call(&mut self, callee: Expr) -> ExprResult {
        let mut arguments = Vec::new();
        if !check!(self, RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARGUMENTS {
                    let err = Parser::error(self.peek(), "Can't have more than 255 arguments.");
                    self.report(&err);
                }
                arguments.push(self.expression()?);
                if !match_!(self, COMMA) {
                    break;
                }
            }
        }
        let paren = consume!(self, RIGHT_PAREN, "Expect ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn call(&mut self) -> ExprResult {
        let mut expr = self.primary()?;
        while match_!(self, LEFT_PAREN) {
            expr = self.finish_call(expr)?;
        }
        Ok(expr)
    }

    fn primary(&mut self) -> ExprResult {
        if match_!(self, FALSE) {
            return Ok(Expr::Literal(Literal::BOOL(false)));
        }
        if match_!(self, TRUE) {
            return Ok(Expr::Literal(Literal::BOOL(true)));
        }
        if match_!(self, NIL) {
            return Ok(Expr::Literal(Literal::NIL));
        }
        if match_!(self, NUMBER | STRING) {
            return Ok(Expr::Literal(self.previous().literal.clone()));
        }
        if match_!(self, IDENTIFIER) {
            return Ok(Expr::Variable {
                name: self.previous(),
            });
        }
        if match_!(self, LEFT_PAREN) {
            let expr = self.expression()?;
            consume!(self, RIGHT_PAREN, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping(Box::new(expr)));
        }
        Err(Parser::error(self.peek(), "Expect expression."))
    }

    /* Non-production rule functions */
    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().type_, EOF)
    }
    #[inline(always)]
    fn peek(&self) -> &RcToken {
        &self.tokens[self.current]
    }
    #[inline(always)]
    fn previous(&self) -> RcToken {
        Rc::clone(&self.tokens[self.current - 1])
    }
    fn advance(&mut self) -> RcToken {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }
    fn error(token: &RcToken, message: impl Into<String>) -> LoxError {
        LoxError::ParseError {
            token: Rc::clone(token),
            message: message.into(),
        }
    }
    fn report(&mut self, err: &LoxError) {
        self.had_error = true;
        self.reporter.report(err);
    }
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if matches!(self.previous().type_, SEMICOLON) {
                return;
            }

            match self.peek().type_ {
                CLASS | FUN | VAR | FOR | IF | WHILE | PRINT | RETURN => return,
                _ => {
                    self.advance();
                }
            };
        }
    }
}
