use std::{
    cell::RefCell,
    io::{self, Write},
    rc::Rc,
};

use thiserror::Error;

use crate::{
    ast::{BinaryExpr, CallExpr, Expr, LogicalExpr, Stmt, UnaryExpr},
    callable::{BuiltinFunction, DeclaredFunction},
    environment::{Environment, EnvironmentRef},
    error::ErrorCollector,
    token::{Token, TokenType},
    value::RuntimeValue,
};

/// Tree walking evaluator.
///
/// Owns the global scope for its whole lifetime, so definitions made by one
/// `interpret` call are visible to the next (one REPL line to the next).
pub struct Interpreter {
    globals: EnvironmentRef,
    environment: EnvironmentRef,
    error_collector: Rc<RefCell<ErrorCollector>>,
    output: Box<dyn Write>,
}

impl Interpreter {
    pub fn new(error_collector: Rc<RefCell<ErrorCollector>>) -> Interpreter {
        Interpreter::with_output(error_collector, Box::new(io::stdout()))
    }

    pub fn with_output(
        error_collector: Rc<RefCell<ErrorCollector>>,
        output: Box<dyn Write>,
    ) -> Interpreter {
        let globals = Environment::root();
        BuiltinFunction::clock().add_to_environment(&globals);

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            error_collector,
            output,
        }
    }

    /// Runs top level statements until the first runtime error.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        for statement in statements {
            match self.execute(statement) {
                Ok(()) => {}
                // A top level return just ends the unit.
                Err(EarlyReturn::Return(_)) => break,
                Err(EarlyReturn::Error(error)) => {
                    self.environment = Rc::clone(&self.globals);
                    return Err(error);
                }
            }
        }

        if let Err(err) = self.output.flush() {
            tracing::warn!("failed to flush program output: {}", err);
        }

        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<(), EarlyReturn> {
        match stmt {
            Stmt::Expression(stmt) => self.evaluate(&stmt.expression).map(|_| ()),
            Stmt::Print(stmt) => {
                let value = self.evaluate(&stmt.expression)?;
                if let Err(err) = writeln!(self.output, "{}", value) {
                    tracing::warn!("failed to write program output: {}", err);
                }
                Ok(())
            }
            Stmt::Var(stmt) => {
                let value = self.evaluate_optional(&stmt.initializer)?;
                self.environment
                    .borrow_mut()
                    .define(&stmt.name.lexeme, value);
                Ok(())
            }
            Stmt::Block(stmt) => {
                let environment = Environment::with_enclosing(&self.environment);
                self.execute_block(&stmt.statements, environment)
            }
            Stmt::If(stmt) => {
                if self.evaluate(&stmt.condition)?.is_truthy() {
                    self.execute(&stmt.then_statement)
                } else if let Some(else_statement) = &stmt.else_statement {
                    self.execute(else_statement)
                } else {
                    Ok(())
                }
            }
            Stmt::While(stmt) => {
                while self.evaluate(&stmt.condition)?.is_truthy() {
                    self.execute(&stmt.body)?;
                }
                Ok(())
            }
            Stmt::Function(stmt) => {
                tracing::debug!(
                    name = %stmt.name.lexeme,
                    arity = stmt.parameters.len(),
                    "defining function"
                );
                let function =
                    DeclaredFunction::new(Rc::clone(stmt), Rc::clone(&self.environment));
                self.environment.borrow_mut().define(
                    &stmt.name.lexeme,
                    RuntimeValue::DeclaredFunction(Rc::new(function)),
                );
                Ok(())
            }
            Stmt::Return(stmt) => {
                let value = self.evaluate_optional(&stmt.value)?;
                Err(EarlyReturn::Return(value))
            }
        }
    }

    /// Runs `statements` in `environment` and restores the current scope on
    /// every exit path.
    pub(crate) fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: EnvironmentRef,
    ) -> Result<(), EarlyReturn> {
        let previous = std::mem::replace(&mut self.environment, environment);

        let result = statements
            .iter()
            .try_for_each(|statement| self.execute(statement));

        self.environment = previous;

        result
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<RuntimeValue, EarlyReturn> {
        match expr {
            Expr::Literal(expr) => Ok(RuntimeValue::from(&expr.value)),
            Expr::Grouping(expr) => self.evaluate(&expr.expression),
            Expr::Unary(expr) => self.evaluate_unary(expr),
            Expr::Binary(expr) => self.evaluate_binary(expr),
            Expr::Logical(expr) => self.evaluate_logical(expr),
            Expr::Variable(expr) => Ok(self.environment.borrow().get(&expr.name)?),
            Expr::Assign(expr) => {
                let value = self.evaluate(&expr.value)?;
                self.environment
                    .borrow_mut()
                    .assign(&expr.name, value.clone())?;
                Ok(value)
            }
            Expr::Call(expr) => self.evaluate_call(expr),
        }
    }

    fn evaluate_optional(&mut self, expr: &Option<Expr>) -> Result<RuntimeValue, EarlyReturn> {
        match expr {
            None => Ok(RuntimeValue::Nil),
            Some(expr) => self.evaluate(expr),
        }
    }

    fn evaluate_unary(&mut self, expr: &UnaryExpr) -> Result<RuntimeValue, EarlyReturn> {
        let operand = self.evaluate(&expr.expression)?;

        match expr.operator.token_type {
            TokenType::Bang => Ok(RuntimeValue::Bool(!operand.is_truthy())),
            TokenType::Minus => {
                let operand = check_numeric_operand(&expr.operator, &operand)?;
                Ok(RuntimeValue::Number(-operand))
            }
            _ => Err(unknown_operator(&expr.operator).into()),
        }
    }

    fn evaluate_binary(&mut self, expr: &BinaryExpr) -> Result<RuntimeValue, EarlyReturn> {
        let left = self.evaluate(&expr.left)?;
        let right = self.evaluate(&expr.right)?;
        let operator = &expr.operator;

        if operator.token_type == TokenType::Plus {
            return match (&left, &right) {
                (RuntimeValue::Number(left), RuntimeValue::Number(right)) => {
                    Ok(RuntimeValue::Number(left + right))
                }
                (RuntimeValue::String(left), RuntimeValue::String(right)) => {
                    Ok(RuntimeValue::from(format!("{}{}", left, right).as_str()))
                }
                _ => Err(RuntimeError::new(
                    operator,
                    "Operands must be two numbers or two strings.",
                )
                .into()),
            };
        }

        let (left, right) = check_numeric_operands(operator, &left, &right)?;

        Ok(match operator.token_type {
            TokenType::Minus => RuntimeValue::Number(left - right),
            TokenType::Slash => RuntimeValue::Number(left / right),
            TokenType::Star => RuntimeValue::Number(left * right),
            TokenType::Greater => RuntimeValue::Bool(left > right),
            TokenType::GreaterEqual => RuntimeValue::Bool(left >= right),
            TokenType::Less => RuntimeValue::Bool(left < right),
            TokenType::LessEqual => RuntimeValue::Bool(left <= right),
            TokenType::EqualEqual => RuntimeValue::Bool(left == right),
            TokenType::BangEqual => RuntimeValue::Bool(left != right),
            _ => return Err(unknown_operator(operator).into()),
        })
    }

    fn evaluate_logical(&mut self, expr: &LogicalExpr) -> Result<RuntimeValue, EarlyReturn> {
        let left = self.evaluate(&expr.left)?;

        let short_circuits = match expr.operator.token_type {
            TokenType::Or => left.is_truthy(),
            _ => !left.is_truthy(),
        };

        if short_circuits {
            Ok(left)
        } else {
            self.evaluate(&expr.right)
        }
    }

    fn evaluate_call(&mut self, expr: &CallExpr) -> Result<RuntimeValue, EarlyReturn> {
        let callee = self.evaluate(&expr.callee)?;

        let mut arguments = Vec::with_capacity(expr.arguments.len());
        for argument in &expr.arguments {
            arguments.push(self.evaluate(argument)?);
        }

        let Some(callable) = callee.as_callable() else {
            return Err(RuntimeError::new(&expr.paren, "Can only call functions.").into());
        };

        if arguments.len() != callable.arity() {
            // Reported, but not fatal: the call evaluates to nil.
            let error = RuntimeError::new(
                &expr.paren,
                &format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arguments.len()
                ),
            );
            self.error_collector.borrow_mut().runtime_error(&error);
            return Ok(RuntimeValue::Nil);
        }

        tracing::trace!(callee = %callable, "call");
        Ok(callable.call(self, arguments)?)
    }
}

/// Non-local exit out of statement execution.
///
/// `Return` unwinds to the nearest call boundary, `Error` to the top of
/// `interpret`.
#[derive(Debug, Error)]
pub enum EarlyReturn {
    #[error("return with value {0}")]
    Return(RuntimeValue),
    #[error(transparent)]
    Error(#[from] RuntimeError),
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct RuntimeError {
    pub message: String,
    pub token: Token,
}

impl RuntimeError {
    pub fn new(token: &Token, message: &str) -> RuntimeError {
        RuntimeError {
            message: message.to_string(),
            token: token.clone(),
        }
    }
}

fn unknown_operator(operator: &Token) -> RuntimeError {
    RuntimeError::new(operator, &format!("Unknown operator '{}'.", operator.lexeme))
}

fn check_numeric_operand(operator: &Token, operand: &RuntimeValue) -> Result<f64, RuntimeError> {
    operand
        .as_number()
        .ok_or_else(|| RuntimeError::new(operator, "Operand must be a number."))
}

fn check_numeric_operands(
    operator: &Token,
    left_operand: &RuntimeValue,
    right_operand: &RuntimeValue,
) -> Result<(f64, f64), RuntimeError> {
    match (left_operand.as_number(), right_operand.as_number()) {
        (Some(left), Some(right)) => Ok((left, right)),
        _ => Err(RuntimeError::new(operator, "Operands must be numbers.")),
    }
}
