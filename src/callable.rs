use std::{
    fmt,
    rc::Rc,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{
    ast::FunctionStmt,
    environment::{Environment, EnvironmentRef},
    interpreter::{EarlyReturn, Interpreter, RuntimeError},
    value::RuntimeValue,
};

/// Anything a call expression can invoke.
pub trait LoxCallable: fmt::Display {
    fn arity(&self) -> usize;

    /// Invoked with exactly `arity()` arguments; the interpreter checks the
    /// count before calling.
    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<RuntimeValue>,
    ) -> Result<RuntimeValue, RuntimeError>;
}

pub struct BuiltinFunction {
    name: &'static str,
    arity: usize,
    function: fn(arguments: &[RuntimeValue]) -> RuntimeValue,
}

impl BuiltinFunction {
    /// Wall clock time in seconds since the Unix epoch.
    pub fn clock() -> BuiltinFunction {
        BuiltinFunction {
            name: "clock",
            arity: 0,
            function: |_| {
                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|elapsed| elapsed.as_secs_f64())
                    .unwrap_or_default();
                RuntimeValue::Number(now)
            },
        }
    }

    pub fn add_to_environment(self, environment: &EnvironmentRef) {
        environment
            .borrow_mut()
            .define(self.name, RuntimeValue::BuiltinFunction(Rc::new(self)));
    }
}

impl LoxCallable for BuiltinFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        _: &mut Interpreter,
        arguments: Vec<RuntimeValue>,
    ) -> Result<RuntimeValue, RuntimeError> {
        Ok((self.function)(&arguments))
    }
}

impl PartialEq for BuiltinFunction {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl fmt::Display for BuiltinFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn>")
    }
}

/// A function declared in script code, closed over the scope it was
/// declared in.
pub struct DeclaredFunction {
    declaration: Rc<FunctionStmt>,
    closure: EnvironmentRef,
}

impl DeclaredFunction {
    pub fn new(declaration: Rc<FunctionStmt>, closure: EnvironmentRef) -> DeclaredFunction {
        DeclaredFunction {
            declaration,
            closure,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }
}

impl LoxCallable for DeclaredFunction {
    fn arity(&self) -> usize {
        self.declaration.parameters.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<RuntimeValue>,
    ) -> Result<RuntimeValue, RuntimeError> {
        let environment = Environment::with_enclosing(&self.closure);

        for (parameter, argument) in self.declaration.parameters.iter().zip(arguments) {
            environment
                .borrow_mut()
                .define(&parameter.lexeme, argument);
        }

        match interpreter.execute_block(&self.declaration.body, environment) {
            Ok(()) => Ok(RuntimeValue::Nil),
            Err(EarlyReturn::Return(value)) => Ok(value),
            Err(EarlyReturn::Error(error)) => Err(error),
        }
    }
}

impl PartialEq for DeclaredFunction {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl fmt::Display for DeclaredFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}
