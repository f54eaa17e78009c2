use std::io::{self, Write};

use thiserror::Error;

use crate::{interpreter::RuntimeError, token::Token};

/// A diagnostic reported on the error channel.
///
/// The `Display` form is the user facing line, e.g.
/// `[line 3] Error at 'x': Expect ';' after value.`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoxError {
    #[error("[line {line}] Error: {message}")]
    Scan { line: usize, message: String },

    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        line: usize,
        location: String,
        message: String,
    },

    #[error("[line {line}] Error: {message}")]
    Runtime { line: usize, message: String },
}

impl LoxError {
    pub fn message(&self) -> &str {
        match self {
            LoxError::Scan { message, .. }
            | LoxError::Parse { message, .. }
            | LoxError::Runtime { message, .. } => message,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            LoxError::Scan { line, .. }
            | LoxError::Parse { line, .. }
            | LoxError::Runtime { line, .. } => *line,
        }
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, LoxError::Runtime { .. })
    }
}

/// Records every diagnostic of a session and writes it to a sink.
///
/// Scan and parse errors set `had_error`, runtime errors set
/// `had_runtime_error`. The driver resets both between REPL lines.
pub struct ErrorCollector {
    sink: Box<dyn Write>,
    errors: Vec<LoxError>,
    had_error: bool,
    had_runtime_error: bool,
}

impl ErrorCollector {
    pub fn new() -> ErrorCollector {
        ErrorCollector::with_sink(Box::new(io::stderr()))
    }

    pub fn with_sink(sink: Box<dyn Write>) -> ErrorCollector {
        ErrorCollector {
            sink,
            errors: Vec::new(),
            had_error: false,
            had_runtime_error: false,
        }
    }

    pub fn scanner_error(&mut self, line: usize, message: &str) {
        self.had_error = true;
        self.report(LoxError::Scan {
            line,
            message: message.to_string(),
        });
    }

    pub fn parser_error(&mut self, token: &Token, message: &str) {
        let location = if token.is_eof() {
            " at end".to_string()
        } else {
            format!(" at '{}'", token.lexeme)
        };

        self.had_error = true;
        self.report(LoxError::Parse {
            line: token.line,
            location,
            message: message.to_string(),
        });
    }

    pub fn runtime_error(&mut self, err: &RuntimeError) {
        self.had_runtime_error = true;
        self.report(LoxError::Runtime {
            line: err.token.line,
            message: err.message.clone(),
        });
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    pub fn errors(&self) -> &[LoxError] {
        &self.errors
    }

    pub fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }

    fn report(&mut self, error: LoxError) {
        tracing::debug!(line = error.line(), "reporting error: {}", error.message());
        if let Err(err) = writeln!(self.sink, "{}", error) {
            tracing::warn!("failed to write diagnostic: {}", err);
        }
        self.errors.push(error);
    }
}

impl Default for ErrorCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::token::TokenType;

    fn quiet() -> ErrorCollector {
        ErrorCollector::with_sink(Box::new(io::sink()))
    }

    #[test]
    fn parser_error_at_end() {
        let mut collector = quiet();
        let eof = Token::new(TokenType::Eof, "", None, 4);

        collector.parser_error(&eof, "Expect expression.");

        assert!(collector.had_error());
        assert_eq!(
            collector.errors()[0].to_string(),
            "[line 4] Error at end: Expect expression."
        );
    }

    #[test]
    fn parser_error_at_lexeme() {
        let mut collector = quiet();
        let token = Token::new(TokenType::Identifier, "foo", None, 2);

        collector.parser_error(&token, "Expect ';' after value.");

        assert_eq!(
            collector.errors()[0].to_string(),
            "[line 2] Error at 'foo': Expect ';' after value."
        );
    }

    #[test]
    fn runtime_error_sets_only_runtime_flag() {
        let mut collector = quiet();
        let token = Token::new(TokenType::Identifier, "x", None, 7);

        collector.runtime_error(&RuntimeError::new(&token, "Undefined variable 'x'."));

        assert!(!collector.had_error());
        assert!(collector.had_runtime_error());
        assert!(collector.errors()[0].is_runtime());
        assert_eq!(
            collector.errors()[0].to_string(),
            "[line 7] Error: Undefined variable 'x'."
        );
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn unwritable_sink_still_records_errors() {
        let mut collector = ErrorCollector::with_sink(Box::new(BrokenSink));

        collector.scanner_error(3, "Unterminated string.");

        assert!(collector.had_error());
        assert_eq!(
            collector.errors()[0].to_string(),
            "[line 3] Error: Unterminated string."
        );
    }

    #[test]
    fn reset_clears_flags_but_keeps_history() {
        let mut collector = quiet();
        collector.scanner_error(1, "Unexpected character '@'.");

        collector.reset();

        assert!(!collector.had_error());
        assert_eq!(collector.errors().len(), 1);
    }
}
