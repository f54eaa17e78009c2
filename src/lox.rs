use std::{
    cell::RefCell,
    fs,
    io::{self, BufRead, Write},
    path::Path,
    rc::Rc,
};

use crate::{
    ast::Stmt,
    error::{ErrorCollector, LoxError},
    interpreter::Interpreter,
    parser::Parser,
    scanner::Scanner,
    token::Token,
};

/// How a unit of source (a file or a REPL line) ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Scan or parse errors; nothing was executed.
    StaticError,
    RuntimeError,
}

/// An interpreter session.
///
/// Global definitions survive from one `run` to the next. Error flags do not
/// reset on their own; the prompt loop calls `reset` after each line.
pub struct Lox {
    error_collector: Rc<RefCell<ErrorCollector>>,
    interpreter: Interpreter,
}

impl Lox {
    pub fn new() -> Lox {
        let error_collector = Rc::new(RefCell::new(ErrorCollector::new()));

        Lox {
            error_collector: Rc::clone(&error_collector),
            interpreter: Interpreter::new(error_collector),
        }
    }

    /// Session writing program output to `output` and diagnostics to `errors`.
    pub fn with_io(output: Box<dyn Write>, errors: Box<dyn Write>) -> Lox {
        let error_collector = Rc::new(RefCell::new(ErrorCollector::with_sink(errors)));

        Lox {
            error_collector: Rc::clone(&error_collector),
            interpreter: Interpreter::with_output(error_collector, output),
        }
    }

    pub fn scan(&mut self, source: &str) -> Vec<Token> {
        let mut error_collector = self.error_collector.borrow_mut();
        Scanner::new(&mut error_collector, source).scan_tokens()
    }

    pub fn parse(&mut self, tokens: Vec<Token>) -> Vec<Stmt> {
        let mut error_collector = self.error_collector.borrow_mut();
        Parser::new(&mut error_collector, tokens).parse()
    }

    /// Parses and executes `tokens`. Nothing runs if this unit had a scan or
    /// parse error.
    pub fn interpret(&mut self, tokens: Vec<Token>) -> Outcome {
        let statements = self.parse(tokens);
        tracing::debug!(count = statements.len(), "parsed statements");

        if self.had_error() {
            return Outcome::StaticError;
        }

        if let Err(err) = self.interpreter.interpret(&statements) {
            self.error_collector.borrow_mut().runtime_error(&err);
        }

        self.outcome()
    }

    pub fn run(&mut self, source: &str) -> Outcome {
        let tokens = self.scan(source);
        tracing::debug!(count = tokens.len(), "scanned source");
        self.interpret(tokens)
    }

    pub fn run_file(&mut self, path: &Path) -> io::Result<Outcome> {
        let content = fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "running file");
        Ok(self.run(&content))
    }

    /// Reads and runs one line at a time until end of input or `exit`.
    /// A failing line is reported and the session carries on.
    pub fn run_prompt<R, W>(&mut self, input: R, mut prompt: W) -> io::Result<()>
    where
        R: BufRead,
        W: Write,
    {
        let mut lines = input.lines();

        loop {
            write!(prompt, "> ")?;
            prompt.flush()?;

            let Some(line) = lines.next() else {
                return Ok(());
            };
            let line = line?;

            if line.trim() == "exit" {
                return Ok(());
            }

            self.run(&line);
            self.reset();
        }
    }

    pub fn had_error(&self) -> bool {
        self.error_collector.borrow().had_error()
    }

    pub fn had_runtime_error(&self) -> bool {
        self.error_collector.borrow().had_runtime_error()
    }

    /// Every diagnostic reported in this session so far.
    pub fn errors(&self) -> Vec<LoxError> {
        self.error_collector.borrow().errors().to_vec()
    }

    pub fn reset(&mut self) {
        self.error_collector.borrow_mut().reset();
    }

    fn outcome(&self) -> Outcome {
        if self.had_error() {
            Outcome::StaticError
        } else if self.had_runtime_error() {
            Outcome::RuntimeError
        } else {
            Outcome::Success
        }
    }
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}
