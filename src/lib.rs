//! A tree walking interpreter for a small Lox-like scripting language.
//!
//! Source goes through [`scanner::Scanner`], [`parser::Parser`] and finally
//! [`interpreter::Interpreter`]. [`Lox`] ties the three together into a
//! session:
//!
//! ```
//! use treelox::{Lox, Outcome};
//!
//! let mut lox = Lox::with_io(Box::new(std::io::sink()), Box::new(std::io::sink()));
//! let tokens = lox.scan("var greeting = \"hi\"; print greeting;");
//! assert_eq!(lox.interpret(tokens), Outcome::Success);
//! ```

pub mod ast;
pub mod ast_printer;
pub mod callable;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod lox;
pub mod parser;
pub mod scanner;
pub mod token;
pub mod value;

pub use crate::{
    error::LoxError,
    lox::{Lox, Outcome},
};
