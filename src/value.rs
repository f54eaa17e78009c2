use std::{fmt, rc::Rc};

use crate::{
    callable::{BuiltinFunction, DeclaredFunction, LoxCallable},
    token::LiteralValue,
};

#[derive(Clone, PartialEq)]
pub enum RuntimeValue {
    Nil,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    BuiltinFunction(Rc<BuiltinFunction>),
    DeclaredFunction(Rc<DeclaredFunction>),
}

impl RuntimeValue {
    /// `nil`, `false`, `0` and `""` are falsy. Everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            RuntimeValue::Nil => false,
            RuntimeValue::Bool(value) => *value,
            RuntimeValue::Number(value) => *value != 0.0,
            RuntimeValue::String(value) => !value.is_empty(),
            RuntimeValue::BuiltinFunction(_) | RuntimeValue::DeclaredFunction(_) => true,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            RuntimeValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&dyn LoxCallable> {
        match self {
            RuntimeValue::BuiltinFunction(function) => Some(&**function),
            RuntimeValue::DeclaredFunction(function) => Some(&**function),
            _ => None,
        }
    }
}

impl From<&LiteralValue> for RuntimeValue {
    fn from(literal: &LiteralValue) -> Self {
        match literal {
            LiteralValue::Nil => RuntimeValue::Nil,
            LiteralValue::Bool(value) => RuntimeValue::Bool(*value),
            LiteralValue::Number(value) => RuntimeValue::Number(*value),
            LiteralValue::String(value) => RuntimeValue::String(Rc::from(value.as_str())),
        }
    }
}

impl From<&str> for RuntimeValue {
    fn from(value: &str) -> Self {
        RuntimeValue::String(Rc::from(value))
    }
}

impl fmt::Display for RuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use RuntimeValue::*;
        match self {
            Nil => write!(f, "nil"),
            Bool(value) => write!(f, "{}", value),
            // f64 already drops the fraction of integral values: 3.0 -> "3".
            Number(value) => write!(f, "{}", value),
            String(value) => write!(f, "{}", value),
            BuiltinFunction(value) => write!(f, "{}", value),
            DeclaredFunction(value) => write!(f, "{}", value),
        }
    }
}

impl fmt::Debug for RuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeValue::String(value) => write!(f, "{:?}", value),
            other => write!(f, "{}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn truthiness() {
        assert!(!RuntimeValue::Nil.is_truthy());
        assert!(!RuntimeValue::Bool(false).is_truthy());
        assert!(RuntimeValue::Bool(true).is_truthy());
        assert!(!RuntimeValue::Number(0.0).is_truthy());
        assert!(!RuntimeValue::Number(-0.0).is_truthy());
        assert!(RuntimeValue::Number(0.5).is_truthy());
        assert!(!RuntimeValue::from("").is_truthy());
        assert!(RuntimeValue::from("0").is_truthy());
        assert!(RuntimeValue::BuiltinFunction(Rc::new(BuiltinFunction::clock())).is_truthy());
    }

    #[test]
    fn display() {
        assert_eq!(RuntimeValue::Nil.to_string(), "nil");
        assert_eq!(RuntimeValue::Bool(false).to_string(), "false");
        assert_eq!(RuntimeValue::Number(3.0).to_string(), "3");
        assert_eq!(RuntimeValue::Number(-2.5).to_string(), "-2.5");
        assert_eq!(RuntimeValue::Number(0.1 + 0.2).to_string(), "0.30000000000000004");
        assert_eq!(RuntimeValue::from("raw text").to_string(), "raw text");
        assert_eq!(
            RuntimeValue::BuiltinFunction(Rc::new(BuiltinFunction::clock())).to_string(),
            "<native fn>"
        );
    }

    #[test]
    fn from_literal() {
        assert_eq!(
            RuntimeValue::from(&LiteralValue::String("hi".to_string())),
            RuntimeValue::from("hi")
        );
        assert_eq!(
            RuntimeValue::from(&LiteralValue::Number(4.0)),
            RuntimeValue::Number(4.0)
        );
    }
}
