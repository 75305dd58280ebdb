use crate::environment::{EnvId, Environments};
use crate::expr::Expr;
use crate::lox::{LoxError, Reporter};
use crate::lox_function::LoxFunction;
use crate::stmt::Stmt;
use crate::token::*;
use crate::token_type::TokenType;
use dyn_clone::{clone_trait_object, DynClone};
use std::any::Any;
use std::fmt;
use std::fmt::Debug;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Debug)]
pub enum ExprValue {
    Literal(Literal),
    LoxCallable(Box<dyn LoxCallable>),
}

impl ExprValue {
    fn get_number(&self) -> Option<f64> {
        match self {
            ExprValue::Literal(Literal::NUMBER(f)) => Some(*f),
            _ => None,
        }
    }
    fn is_string(&self) -> bool {
        matches!(self, ExprValue::Literal(Literal::STRING(_)))
    }
    /// `nil` and `false` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(
            self,
            ExprValue::Literal(Literal::NIL) | ExprValue::Literal(Literal::BOOL(false))
        )
    }
}

impl From<Literal> for ExprValue {
    fn from(literal: Literal) -> Self {
        ExprValue::Literal(literal)
    }
}

impl PartialEq for ExprValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ExprValue::Literal(l1), ExprValue::Literal(l2)) => l1 == l2,
            (ExprValue::LoxCallable(c1), ExprValue::LoxCallable(c2)) => c1.same_as(c2.as_ref()),
            _ => false,
        }
    }
}

impl fmt::Display for ExprValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprValue::Literal(l) => write!(f, "{}", l),
            ExprValue::LoxCallable(c) => f.write_str(&LoxCallable::to_string(c.as_ref())),
        }
    }
}

pub trait LoxCallable: Debug + DynClone {
    fn arity(&self) -> usize;
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<ExprValue>) -> ExprValueResult;
    fn to_string(&self) -> String;
    fn as_any(&self) -> &dyn Any;
    /// Identity comparison, backing `==` on function values.
    fn same_as(&self, other: &dyn LoxCallable) -> bool;
}

clone_trait_object!(LoxCallable);

pub type ExprValueResult = Result<ExprValue, LoxError>;
pub type VoidResult = Result<(), LoxError>;

fn runtime_error(token: &RcToken, message: impl Into<String>) -> LoxError {
    LoxError::RuntimeError {
        token: Rc::clone(token),
        message: message.into(),
    }
}

// BUILTINS

#[derive(Clone, Debug)]
struct Clock;

impl LoxCallable for Clock {
    fn arity(&self) -> usize {
        0
    }
    fn call(&self, _interpreter: &mut Interpreter, _arguments: Vec<ExprValue>) -> ExprValueResult {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_secs_f64())
            .unwrap_or(0.0);
        Ok(Literal::NUMBER(seconds).into())
    }
    fn to_string(&self) -> String {
        String::from("<native fn>")
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn same_as(&self, other: &dyn LoxCallable) -> bool {
        other.as_any().is::<Clock>()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Deepest allowed chain of active function calls.
    pub max_call_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_call_depth: 4096,
        }
    }
}

pub struct Interpreter {
    pub environments: Environments,
    globals: EnvId,
    output: Box<dyn Write>,
    config: Config,
    call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter::with_output(Box::new(io::stdout()), Config::default())
    }

    pub fn with_output(output: Box<dyn Write>, config: Config) -> Self {
        let mut environments = Environments::new();
        let globals = environments.globals();
        environments.define(
            globals,
            "clock",
            ExprValue::LoxCallable(Box::new(Clock)),
        );
        Interpreter {
            environments,
            globals,
            output,
            config,
            call_depth: 0,
        }
    }

    pub fn globals(&self) -> EnvId {
        self.globals
    }

    /// Runs a program in the global scope, reporting the first error.
    pub fn interpret(&mut self, statements: &[Stmt], reporter: &mut dyn Reporter) {
        if let Err(err) = self.execute_statements(statements, self.globals) {
            reporter.report(&err);
        }
        if let Err(err) = self.output.flush() {
            reporter.report(&LoxError::from(err));
        }
    }

    /// Evaluates one expression and prints its value.
    pub fn interpret_expression(&mut self, expr: &Expr, reporter: &mut dyn Reporter) {
        let result = self.evaluate(expr, self.globals).and_then(|value| {
            writeln!(self.output, "{}", value)?;
            self.output.flush()?;
            Ok(())
        });
        if let Err(err) = result {
            reporter.report(&err);
        }
    }

    /// Executes `statements` in order against `env`, stopping at the first error.
    pub fn execute_statements(&mut self, statements: &[Stmt], env: EnvId) -> VoidResult {
        statements
            .iter()
            .try_for_each(|statement| self.execute(statement, env))
    }

    pub fn execute(&mut self, stmt: &Stmt, env: EnvId) -> VoidResult {
        match stmt {
            Stmt::Block { statements } => {
                let block = self.environments.push(env);
                self.execute_block(statements, block)?;
            }
            Stmt::Expression { expr } => {
                self.evaluate(expr, env)?;
            }
            Stmt::Function(declaration) => {
                self.environments.capture(env);
                let function = LoxFunction {
                    declaration: Rc::clone(declaration),
                    closure: env,
                };
                self.environments.define(
                    env,
                    &declaration.name.lexeme,
                    ExprValue::LoxCallable(Box::new(function)),
                );
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition, env)?.is_truthy() {
                    self.execute(then_branch, env)?;
                } else if let Some(els) = else_branch {
                    self.execute(els, env)?;
                }
            }
            Stmt::Print { expr } => {
                let value = self.evaluate(expr, env)?;
                writeln!(self.output, "{}", value)?;
            }
            Stmt::Return { keyword: _, value } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Literal::NIL.into(),
                };
                return Err(LoxError::ReturnValue { value });
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Literal::NIL.into(),
                };
                self.environments.define(env, &name.lexeme, value);
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition, env)?.is_truthy() {
                    self.execute(body, env)?;
                }
            }
        }
        Ok(())
    }

    /// Runs `statements` inside the freshly pushed scope `env`, then releases
    /// it whether or not execution failed.
    pub fn execute_block(&mut self, statements: &[Stmt], env: EnvId) -> VoidResult {
        let result = self.execute_statements(statements, env);
        self.environments.release(env);
        result
    }

    pub fn evaluate(&mut self, expr: &Expr, env: EnvId) -> ExprValueResult {
        match expr {
            Expr::Assign { name, value } => {
                let value = self.evaluate(value, env)?;
                self.environments.assign(env, name, value.clone())?;
                Ok(value)
            }
            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left, env)?;
                let right = self.evaluate(right, env)?;
                Interpreter::binary(operator, left, right)
            }
            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let function = match self.evaluate(callee, env)? {
                    ExprValue::LoxCallable(function) => function,
                    _ => return Err(runtime_error(paren, "Can only call functions and classes.")),
                };
                let mut eval_arguments = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    eval_arguments.push(self.evaluate(argument, env)?);
                }
                let arity = function.arity();
                if eval_arguments.len() != arity {
                    return Err(runtime_error(
                        paren,
                        format!(
                            "Expected {} arguments but got {}.",
                            arity,
                            eval_arguments.len()
                        ),
                    ));
                }
                if self.call_depth >= self.config.max_call_depth {
                    return Err(LoxError::StackOverflow {
                        depth: self.config.max_call_depth,
                    });
                }
                self.call_depth += 1;
                let result = function.call(self, eval_arguments);
                self.call_depth -= 1;
                result
            }
            Expr::Grouping(expr) => self.evaluate(expr, env),
            Expr::Literal(literal) => Ok(literal.clone().into()),
            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left, env)?;
                if matches!(operator.type_, TokenType::OR) {
                    if left.is_truthy() {
                        return Ok(left);
                    }
                // AND operation
                } else if !left.is_truthy() {
                    return Ok(left);
                }
                self.evaluate(right, env)
            }
            Expr::Ternary {
                condition,
                question,
                then_branch,
                else_branch,
            } => match self.evaluate(condition, env)? {
                ExprValue::Literal(Literal::BOOL(true)) => self.evaluate(then_branch, env),
                ExprValue::Literal(Literal::BOOL(false)) => self.evaluate(else_branch, env),
                _ => Err(runtime_error(question, "Operand must be a boolean.")),
            },
            Expr::Unary { operator, right } => {
                let right = self.evaluate(right, env)?;
                Interpreter::unary(operator, right)
            }
            Expr::Variable { name } => self.environments.get(env, name),
        }
    }

    fn unary(operator: &RcToken, right: ExprValue) -> ExprValueResult {
        match operator.type_ {
            TokenType::MINUS => match right.get_number() {
                Some(num) => Ok(Literal::NUMBER(-num).into()),
                None => Err(runtime_error(operator, "Operand must be a number.")),
            },
            TokenType::BANG => Ok(Literal::BOOL(!right.is_truthy()).into()),
            _ => unreachable!("Invalid unary operator"),
        }
    }

    fn binary(operator: &RcToken, left: ExprValue, right: ExprValue) -> ExprValueResult {
        macro_rules! numeric {
            ($op:tt, $type_:ident) => {
                match (left.get_number(), right.get_number()) {
                    (Some(num_left), Some(num_right)) => {
                        Ok(Literal::$type_(num_left $op num_right).into())
                    }
                    _ => Err(runtime_error(operator, "Operands must be numbers.")),
                }
            };
        }
        match operator.type_ {
            TokenType::GREATER => numeric!(>, BOOL),
            TokenType::GREATER_EQUAL => numeric!(>=, BOOL),
            TokenType::LESS => numeric!(<, BOOL),
            TokenType::LESS_EQUAL => numeric!(<=, BOOL),
            TokenType::BANG_EQUAL => Ok(Literal::BOOL(left != right).into()),
            TokenType::EQUAL_EQUAL => Ok(Literal::BOOL(left == right).into()),
            TokenType::MINUS => numeric!(-, NUMBER),
            TokenType::STAR => numeric!(*, NUMBER),
            TokenType::SLASH => {
                if right.get_number() == Some(0.0) && left.get_number().is_some() {
                    return Err(runtime_error(operator, "Divided by the /0"));
                }
                numeric!(/, NUMBER)
            }
            TokenType::PLUS => {
                if let (Some(num_left), Some(num_right)) = (left.get_number(), right.get_number()) {
                    return Ok(Literal::NUMBER(num_left + num_right).into());
                }
                if left.is_string() || right.is_string() {
                    return Ok(Literal::STRING(format!("{}{}", left, right)).into());
                }
                Err(runtime_error(operator, "Operands must be numbers."))
            }
            _ => unreachable!("invalid binary operator"),
        }
    }
}
