use std::{cell::RefCell, rc::Rc};

use rustc_hash::FxHashMap;

use crate::{interpreter::RuntimeError, token::Token, value::RuntimeValue};

/// Shared handle to a scope. Blocks, calls and closures all hold one, so a
/// scope lives as long as the longest of them.
pub type EnvironmentRef = Rc<RefCell<Environment>>;

pub struct Environment {
    enclosing: Option<EnvironmentRef>,
    values: FxHashMap<String, RuntimeValue>,
}

impl Environment {
    pub fn root() -> EnvironmentRef {
        Rc::new(RefCell::new(Environment {
            enclosing: None,
            values: FxHashMap::default(),
        }))
    }

    pub fn with_enclosing(enclosing: &EnvironmentRef) -> EnvironmentRef {
        Rc::new(RefCell::new(Environment {
            enclosing: Some(Rc::clone(enclosing)),
            values: FxHashMap::default(),
        }))
    }

    pub fn define(&mut self, name: &str, value: RuntimeValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &Token) -> Result<RuntimeValue, RuntimeError> {
        match self.values.get(&name.lexeme) {
            Some(value) => Ok(value.clone()),
            None => match &self.enclosing {
                Some(enclosing) => enclosing.borrow().get(name),
                None => Err(undefined_variable(name)),
            },
        }
    }

    pub fn assign(&mut self, name: &Token, value: RuntimeValue) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            return Ok(());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign(name, value),
            None => Err(undefined_variable(name)),
        }
    }
}

fn undefined_variable(name: &Token) -> RuntimeError {
    RuntimeError::new(name, &format!("Undefined variable '{}'.", name.lexeme))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::token::TokenType;

    fn name(lexeme: &str) -> Token {
        Token::new(TokenType::Identifier, lexeme, None, 1)
    }

    #[test]
    fn get_walks_outward() {
        let globals = Environment::root();
        globals.borrow_mut().define("a", RuntimeValue::Number(1.0));
        let inner = Environment::with_enclosing(&Environment::with_enclosing(&globals));

        assert_eq!(inner.borrow().get(&name("a")), Ok(RuntimeValue::Number(1.0)));
    }

    #[test]
    fn inner_definition_shadows_outer() {
        let globals = Environment::root();
        globals.borrow_mut().define("a", RuntimeValue::Number(1.0));
        let inner = Environment::with_enclosing(&globals);
        inner.borrow_mut().define("a", RuntimeValue::Bool(true));

        assert_eq!(inner.borrow().get(&name("a")), Ok(RuntimeValue::Bool(true)));
        assert_eq!(globals.borrow().get(&name("a")), Ok(RuntimeValue::Number(1.0)));
    }

    #[test]
    fn assign_mutates_nearest_definition() {
        let globals = Environment::root();
        globals.borrow_mut().define("a", RuntimeValue::Number(1.0));
        let inner = Environment::with_enclosing(&globals);

        inner
            .borrow_mut()
            .assign(&name("a"), RuntimeValue::Number(2.0))
            .unwrap();

        assert_eq!(globals.borrow().get(&name("a")), Ok(RuntimeValue::Number(2.0)));
        assert!(inner.borrow().values.is_empty());
    }

    #[test]
    fn redefinition_overwrites() {
        let globals = Environment::root();
        globals.borrow_mut().define("a", RuntimeValue::Number(1.0));
        globals.borrow_mut().define("a", RuntimeValue::Nil);

        assert_eq!(globals.borrow().get(&name("a")), Ok(RuntimeValue::Nil));
    }

    #[test]
    fn undefined_name_is_an_error() {
        let globals = Environment::root();
        let inner = Environment::with_enclosing(&globals);

        let err = inner.borrow().get(&name("missing")).unwrap_err();
        assert_eq!(err.message, "Undefined variable 'missing'.");

        let err = inner
            .borrow_mut()
            .assign(&name("missing"), RuntimeValue::Nil)
            .unwrap_err();
        assert_eq!(err.message, "Undefined variable 'missing'.");
        assert!(globals.borrow().get(&name("missing")).is_err());
    }
}
