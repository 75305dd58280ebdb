use crate::environment::EnvId;
use crate::interpreter::{ExprValue, ExprValueResult, Interpreter, LoxCallable};
use crate::lox::LoxError;
use crate::stmt::FunctionDecl;
use crate::token::Literal;
use std::any::Any;
use std::rc::Rc;

/// A `fun` declaration closed over the scope it was declared in.
#[derive(Debug, Clone)]
pub struct LoxFunction {
    pub declaration: Rc<FunctionDecl>,
    pub closure: EnvId,
}

impl LoxCallable for LoxFunction {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<ExprValue>) -> ExprValueResult {
        // The new scope hangs off the closure, not the caller.
        let environment = interpreter.environments.push(self.closure);
        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            interpreter
                .environments
                .define(environment, &param.lexeme, argument);
        }
        match interpreter.execute_block(&self.declaration.body, environment) {
            Err(LoxError::ReturnValue { value }) => Ok(value),
            Err(e) => Err(e),
            Ok(()) => Ok(Literal::NIL.into()),
        }
    }

    fn to_string(&self) -> String {
        format!("<fn {}>", self.declaration.name.lexeme)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn same_as(&self, other: &dyn LoxCallable) -> bool {
        match other.as_any().downcast_ref::<LoxFunction>() {
            Some(other) => {
                Rc::ptr_eq(&self.declaration, &other.declaration) && self.closure == other.closure
            }
            None => false,
        }
    }
}
