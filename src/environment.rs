use crate::interpreter::ExprValue;
use crate::lox::LoxError;
use crate::token::RcToken;
use std::collections::HashMap;
use std::rc::Rc;

/// Index of a scope inside [`Environments`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EnvId(usize);

#[derive(Debug)]
pub struct Environment {
    enclosing: Option<EnvId>,
    values: HashMap<String, ExprValue>,
    captured: bool,
}

impl Environment {
    fn new(enclosing: Option<EnvId>) -> Self {
        Environment {
            enclosing,
            values: HashMap::new(),
            captured: false,
        }
    }
}

/// Arena holding every live scope.
///
/// Scopes form a chain through `enclosing`, always pointing at a lower index.
/// A scope is freed when it is released while sitting on top of the arena and
/// no closure captured it; captured scopes live as long as the arena.
#[derive(Debug)]
pub struct Environments {
    scopes: Vec<Environment>,
}

impl Default for Environments {
    fn default() -> Self {
        Self::new()
    }
}

impl Environments {
    /// Creates the arena with an empty global scope.
    pub fn new() -> Self {
        Environments {
            scopes: vec![Environment::new(None)],
        }
    }

    pub fn globals(&self) -> EnvId {
        EnvId(0)
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Opens a new scope nested in `enclosing`.
    pub fn push(&mut self, enclosing: EnvId) -> EnvId {
        self.scopes.push(Environment::new(Some(enclosing)));
        EnvId(self.scopes.len() - 1)
    }

    /// Marks `id` as referenced by a closure so it is never freed.
    pub fn capture(&mut self, id: EnvId) {
        self.scopes[id.0].captured = true;
    }

    /// Called when execution leaves the scope `id`.
    pub fn release(&mut self, id: EnvId) {
        if id.0 != 0 && id.0 + 1 == self.scopes.len() && !self.scopes[id.0].captured {
            self.scopes.pop();
        }
    }

    pub fn define(&mut self, id: EnvId, name: &str, value: ExprValue) {
        self.scopes[id.0].values.insert(name.to_string(), value);
    }

    pub fn get(&self, id: EnvId, name: &RcToken) -> Result<ExprValue, LoxError> {
        let mut scope = Some(id);
        while let Some(EnvId(index)) = scope {
            let environment = &self.scopes[index];
            if let Some(value) = environment.values.get(&name.lexeme) {
                return Ok(value.clone());
            }
            scope = environment.enclosing;
        }
        Err(undefined(name))
    }

    pub fn assign(&mut self, id: EnvId, name: &RcToken, value: ExprValue) -> Result<(), LoxError> {
        let mut scope = Some(id);
        while let Some(EnvId(index)) = scope {
            let environment = &mut self.scopes[index];
            if let Some(slot) = environment.values.get_mut(&name.lexeme) {
                *slot = value;
                return Ok(());
            }
            scope = environment.enclosing;
        }
        Err(undefined(name))
    }
}

fn undefined(name: &RcToken) -> LoxError {
    LoxError::RuntimeError {
        token: Rc::clone(name),
        message: format!("Undefined variable '{}'.", name.lexeme),
    }
}
