use crate::{
    error::ErrorCollector,
    token::{LiteralValue, Token, TokenType},
};

/// Single pass lexer over a source string.
///
/// The cursor works on bytes. Only ASCII letters start identifiers; any other
/// non-ASCII character is reported as unexpected and skipped.
pub struct Scanner<'a> {
    error_collector: &'a mut ErrorCollector,
    source: &'a str,
    bytes: &'a [u8],
    line: usize,
    start: usize,
    current: usize,
    tokens: Vec<Token>,
}

impl<'a> Scanner<'a> {
    pub fn new(error_collector: &'a mut ErrorCollector, source: &'a str) -> Scanner<'a> {
        Scanner {
            error_collector,
            source,
            bytes: source.as_bytes(),
            line: 1,
            start: 0,
            current: 0,
            tokens: Vec::new(),
        }
    }

    pub fn scan_tokens(mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }

        self.start = self.current;
        self.add_token(TokenType::Eof);

        tracing::trace!(count = self.tokens.len(), "scanned tokens");
        self.tokens
    }

    fn scan_token(&mut self) {
        let character = self.advance();

        match character {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            '.' => self.add_token(TokenType::Dot),
            ',' => self.add_token(TokenType::Comma),
            ';' => self.add_token(TokenType::Semicolon),
            '+' => self.add_token(TokenType::Plus),
            '-' => self.add_token(TokenType::Minus),
            '*' => self.add_token(TokenType::Star),
            '/' => {
                if self.match_char('/') {
                    while !self.is_at_end() && self.peek() != '\n' {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenType::Slash)
                }
            }
            '!' => {
                let token_type = match self.match_char('=') {
                    true => TokenType::BangEqual,
                    false => TokenType::Bang,
                };
                self.add_token(token_type)
            }
            '=' => {
                let token_type = match self.match_char('=') {
                    true => TokenType::EqualEqual,
                    false => TokenType::Equal,
                };
                self.add_token(token_type)
            }
            '<' => {
                let token_type = match self.match_char('=') {
                    true => TokenType::LessEqual,
                    false => TokenType::Less,
                };
                self.add_token(token_type)
            }
            '>' => {
                let token_type = match self.match_char('=') {
                    true => TokenType::GreaterEqual,
                    false => TokenType::Greater,
                };
                self.add_token(token_type)
            }
            '"' => self.string(),
            ' ' | '\r' | '\t' => {}
            '\n' => {
                self.line += 1;
            }
            _ => {
                if is_digit(character) {
                    self.number();
                } else if is_alpha(character) {
                    self.identifier();
                } else {
                    self.unexpected_character();
                }
            }
        }
    }

    fn string(&mut self) {
        while !self.is_at_end() && self.peek() != '"' {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if !self.match_char('"') {
            self.error_collector
                .scanner_error(self.line, "Unterminated string.");
            return;
        }

        let lexeme = self.lexeme();
        let value = lexeme[1..(lexeme.len() - 1)].to_string();
        self.add_full_token(TokenType::String, Some(LiteralValue::String(value)));
    }

    fn number(&mut self) {
        while !self.is_at_end() && is_digit(self.peek()) {
            self.advance();
        }

        // A trailing '.' is left for the next token.
        if !self.is_at_end() && self.peek() == '.' && self.peek_next().is_some_and(is_digit) {
            self.advance();
            while !self.is_at_end() && is_digit(self.peek()) {
                self.advance();
            }
        }

        match self.lexeme().parse::<f64>() {
            Ok(value) => {
                self.add_full_token(TokenType::Number, Some(LiteralValue::Number(value)))
            }
            Err(_) => {
                let message = format!("Invalid number '{}'.", self.lexeme());
                self.error_collector.scanner_error(self.line, &message);
            }
        }
    }

    fn identifier(&mut self) {
        while !self.is_at_end() && is_alpha_numeric(self.peek()) {
            self.advance();
        }

        let token_type = resolve_keyword_type(self.lexeme()).unwrap_or(TokenType::Identifier);
        self.add_token(token_type)
    }

    fn unexpected_character(&mut self) {
        // Report the whole character, not just its first UTF-8 byte.
        let character = self.source[self.start..].chars().next().unwrap_or('\u{FFFD}');
        self.current = self.start + character.len_utf8();

        let message = format!("Unexpected character '{}'.", character);
        self.error_collector.scanner_error(self.line, &message);
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.bytes.len()
    }

    fn peek(&self) -> char {
        self.bytes[self.current] as char
    }

    fn peek_next(&self) -> Option<char> {
        self.bytes.get(self.current + 1).map(|byte| *byte as char)
    }

    fn advance(&mut self) -> char {
        let current = self.peek();
        self.current += 1;
        current
    }

    fn match_char(&mut self, character: char) -> bool {
        if !self.is_at_end() && self.peek() == character {
            self.advance();
            return true;
        }

        false
    }

    fn add_token(&mut self, token_type: TokenType) {
        self.add_full_token(token_type, None)
    }

    fn add_full_token(&mut self, token_type: TokenType, literal: Option<LiteralValue>) {
        let token = Token::new(token_type, self.lexeme(), literal, self.line);
        self.tokens.push(token)
    }

    fn lexeme(&self) -> &'a str {
        &self.source[self.start..self.current]
    }
}

fn is_digit(character: char) -> bool {
    character.is_ascii_digit()
}

fn is_alpha(character: char) -> bool {
    character.is_ascii_alphabetic() || character == '_'
}

fn is_alpha_numeric(character: char) -> bool {
    is_digit(character) || is_alpha(character)
}

fn resolve_keyword_type(lexeme: &str) -> Option<TokenType> {
    match lexeme {
        "and" => Some(TokenType::And),
        "class" => Some(TokenType::Class),
        "else" => Some(TokenType::Else),
        "false" => Some(TokenType::False),
        "for" => Some(TokenType::For),
        "fun" => Some(TokenType::Fun),
        "if" => Some(TokenType::If),
        "nil" => Some(TokenType::Nil),
        "or" => Some(TokenType::Or),
        "print" => Some(TokenType::Print),
        "return" => Some(TokenType::Return),
        "super" => Some(TokenType::Super),
        "this" => Some(TokenType::This),
        "true" => Some(TokenType::True),
        "var" => Some(TokenType::Var),
        "while" => Some(TokenType::While),
        _ => None,
    }
}
