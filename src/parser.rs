use std::rc::Rc;

use thiserror::Error;

use crate::{
    ast::{
        AssignExpr, CallExpr, Expr, FunctionStmt, IfStmt, PrintStmt, ReturnStmt, Stmt, VarStmt,
        VariableExpr,
    },
    error::ErrorCollector,
    token::{LiteralValue, Token, TokenType},
};

const MAX_ARGUMENTS: usize = 255;

/// Recursive descent parser.
///
/// Errors are reported to the collector as they are found. After an error the
/// parser skips to the next statement boundary and keeps going, so one run
/// reports as many independent errors as possible.
pub struct Parser<'a> {
    error_collector: &'a mut ErrorCollector,
    tokens: Vec<Token>,
    current: usize,
}

/// Marker for an already reported error; unwinds to `synchronize`.
#[derive(Debug, Error)]
#[error("parse error")]
struct ParserError;

type ParseResult<T> = Result<T, ParserError>;

impl<'a> Parser<'a> {
    pub fn new(error_collector: &'a mut ErrorCollector, mut tokens: Vec<Token>) -> Parser<'a> {
        if tokens.last().map_or(true, |token| !token.is_eof()) {
            let line = tokens.last().map_or(1, |token| token.line);
            tokens.push(Token::new(TokenType::Eof, "", None, line));
        }

        Parser {
            error_collector,
            tokens,
            current: 0,
        }
    }

    pub fn parse(mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if let Some(statement) = self.declaration_with_sync() {
                statements.push(statement);
            }
        }

        statements
    }

    fn declaration_with_sync(&mut self) -> Option<Stmt> {
        match self.declaration() {
            Ok(statement) => Some(statement),
            Err(_) => {
                self.synchronize();
                None
            }
        }
    }

    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().token_type == TokenType::Semicolon {
                return;
            }

            use TokenType::*;
            if let Class | Fun | Var | For | If | While | Print | Return = self.peek().token_type {
                return;
            }

            self.advance();
        }
    }

    fn declaration(&mut self) -> ParseResult<Stmt> {
        if self.match_token(TokenType::Fun) {
            self.function_declaration("function")
        } else if self.match_token(TokenType::Var) {
            self.var_declaration()
        } else {
            self.statement()
        }
    }

    fn function_declaration(&mut self, kind: &str) -> ParseResult<Stmt> {
        let name = self.consume(TokenType::Identifier, &format!("Expect {} name.", kind))?;

        self.consume(
            TokenType::LeftParen,
            &format!("Expect '(' after {} name.", kind),
        )?;

        let mut parameters = vec![];

        if !self.check(TokenType::RightParen) {
            loop {
                if parameters.len() >= MAX_ARGUMENTS {
                    let token = self.peek().clone();
                    self.report(&token, "Can't have more than 255 parameters.");
                }

                parameters.push(self.consume(TokenType::Identifier, "Expect parameter name.")?);

                if !self.match_token(TokenType::Comma) {
                    break;
                }
            }
        }

        self.consume(TokenType::RightParen, "Expect ')' after parameters.")?;

        self.consume(
            TokenType::LeftBrace,
            &format!("Expect '{{' before {} body.", kind),
        )?;

        let body = self.block()?;

        Ok(Stmt::Function(Rc::new(FunctionStmt {
            name,
            parameters,
            body,
        })))
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(TokenType::Identifier, "Expect variable name.")?;

        let initializer = match self.match_token(TokenType::Equal) {
            true => Some(self.expression()?),
            false => None,
        };

        self.consume(
            TokenType::Semicolon,
            "Expect ';' after variable declaration.",
        )?;

        Ok(Stmt::Var(Box::new(VarStmt { name, initializer })))
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        if self.match_token(TokenType::For) {
            self.for_stmt()
        } else if self.match_token(TokenType::If) {
            self.if_stmt()
        } else if self.match_token(TokenType::Print) {
            self.print_stmt()
        } else if self.match_token(TokenType::Return) {
            self.return_stmt()
        } else if self.match_token(TokenType::While) {
            self.while_stmt()
        } else if self.match_token(TokenType::LeftBrace) {
            Ok(Stmt::block(self.block()?))
        } else {
            self.expression_stmt()
        }
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();

        // Recover inside the block so its closing brace stays with it.
        while !self.check(TokenType::RightBrace) && !self.is_at_end() {
            if let Some(statement) = self.declaration_with_sync() {
                statements.push(statement);
            }
        }

        self.consume(TokenType::RightBrace, "Expect '}' after block.")?;

        Ok(statements)
    }

    fn print_stmt(&mut self) -> ParseResult<Stmt> {
        let expression = self.expression()?;

        self.consume(TokenType::Semicolon, "Expect ';' after value.")?;

        Ok(Stmt::Print(Box::new(PrintStmt { expression })))
    }

    fn if_stmt(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenType::LeftParen, "Expect '(' after 'if'.")?;

        let condition = self.expression()?;

        self.consume(TokenType::RightParen, "Expect ')' after if condition.")?;

        let then_statement = self.statement()?;

        let else_statement = match self.match_token(TokenType::Else) {
            true => Some(self.statement()?),
            false => None,
        };

        Ok(Stmt::If(Box::new(IfStmt {
            condition,
            then_statement,
            else_statement,
        })))
    }

    fn while_stmt(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenType::LeftParen, "Expect '(' after 'while'.")?;

        let condition = self.expression()?;

        self.consume(TokenType::RightParen, "Expect ')' after condition.")?;

        let body = self.statement()?;

        Ok(Stmt::while_loop(condition, body))
    }

    /// `for` has no node of its own: it is rewritten into a `while` loop,
    /// wrapped in a block when there is an initializer.
    fn for_stmt(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenType::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.match_token(TokenType::Semicolon) {
            None
        } else if self.match_token(TokenType::Var) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_stmt()?)
        };

        let condition = if self.check(TokenType::Semicolon) {
            Expr::literal(LiteralValue::Bool(true))
        } else {
            self.expression()?
        };
        self.consume(TokenType::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if self.check(TokenType::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenType::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::block(vec![body, Stmt::expression(increment)]);
        }

        body = Stmt::while_loop(condition, body);

        if let Some(initializer) = initializer {
            body = Stmt::block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn return_stmt(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();

        let value = if self.check(TokenType::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };

        self.consume(TokenType::Semicolon, "Expect ';' after return value.")?;

        Ok(Stmt::Return(Box::new(ReturnStmt { keyword, value })))
    }

    fn expression_stmt(&mut self) -> ParseResult<Stmt> {
        let expression = self.expression()?;

        self.consume(TokenType::Semicolon, "Expect ';' after expression.")?;

        Ok(Stmt::expression(expression))
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.assign_expr()
    }

    fn assign_expr(&mut self) -> ParseResult<Expr> {
        let expr = self.or_expr()?;

        if self.match_token(TokenType::Equal) {
            let equals = self.previous().clone();
            let value = self.assign_expr()?;

            return match expr {
                Expr::Variable(variable) => Ok(Expr::Assign(Box::new(AssignExpr {
                    name: variable.name,
                    value,
                }))),
                // The parser is not confused here, so there is nothing to
                // synchronize past.
                expr => {
                    self.report(&equals, "Invalid assignment target.");
                    Ok(expr)
                }
            };
        }

        Ok(expr)
    }

    fn or_expr(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and_expr()?;

        while self.match_token(TokenType::Or) {
            let operator = self.previous().clone();
            let right = self.and_expr()?;
            expr = Expr::logical(expr, operator, right);
        }

        Ok(expr)
    }

    fn and_expr(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality_expr()?;

        while self.match_token(TokenType::And) {
            let operator = self.previous().clone();
            let right = self.equality_expr()?;
            expr = Expr::logical(expr, operator, right);
        }

        Ok(expr)
    }

    fn equality_expr(&mut self) -> ParseResult<Expr> {
        let mut expr = self.comparison_expr()?;

        while self.match_any(&[TokenType::EqualEqual, TokenType::BangEqual]) {
            let operator = self.previous().clone();
            let right = self.comparison_expr()?;
            expr = Expr::binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn comparison_expr(&mut self) -> ParseResult<Expr> {
        let mut expr = self.sum_expr()?;

        while self.match_any(&[
            TokenType::Less,
            TokenType::LessEqual,
            TokenType::Greater,
            TokenType::GreaterEqual,
        ]) {
            let operator = self.previous().clone();
            let right = self.sum_expr()?;
            expr = Expr::binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn sum_expr(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor_expr()?;

        while self.match_any(&[TokenType::Plus, TokenType::Minus]) {
            let operator = self.previous().clone();
            let right = self.factor_expr()?;
            expr = Expr::binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn factor_expr(&mut self) -> ParseResult<Expr> {
        let mut expr = self.unary_expr()?;

        while self.match_any(&[TokenType::Slash, TokenType::Star]) {
            let operator = self.previous().clone();
            let right = self.unary_expr()?;
            expr = Expr::binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn unary_expr(&mut self) -> ParseResult<Expr> {
        if self.match_any(&[TokenType::Bang, TokenType::Minus]) {
            let operator = self.previous().clone();
            let expression = self.unary_expr()?;
            Ok(Expr::unary(operator, expression))
        } else {
            self.call_expr()
        }
    }

    fn call_expr(&mut self) -> ParseResult<Expr> {
        let mut expression = self.primary_expr()?;

        while self.match_token(TokenType::LeftParen) {
            expression = self.finish_call_expr(expression)?;
        }

        Ok(expression)
    }

    fn finish_call_expr(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut arguments = vec![];

        if !self.check(TokenType::RightParen) {
            loop {
                if arguments.len() >= MAX_ARGUMENTS {
                    let token = self.peek().clone();
                    self.report(&token, "Can't have more than 255 arguments.");
                }

                arguments.push(self.expression()?);

                if !self.match_token(TokenType::Comma) {
                    break;
                }
            }
        }

        let paren = self.consume(TokenType::RightParen, "Expect ')' after arguments.")?;

        Ok(Expr::Call(Box::new(CallExpr {
            callee,
            paren,
            arguments,
        })))
    }

    fn primary_expr(&mut self) -> ParseResult<Expr> {
        if self.match_token(TokenType::False) {
            Ok(Expr::literal(LiteralValue::Bool(false)))
        } else if self.match_token(TokenType::True) {
            Ok(Expr::literal(LiteralValue::Bool(true)))
        } else if self.match_token(TokenType::Nil) {
            Ok(Expr::literal(LiteralValue::Nil))
        } else if self.match_any(&[TokenType::Number, TokenType::String]) {
            let value = self.previous().literal.clone().unwrap_or(LiteralValue::Nil);
            Ok(Expr::literal(value))
        } else if self.match_token(TokenType::Identifier) {
            Ok(Expr::Variable(Box::new(VariableExpr {
                name: self.previous().clone(),
            })))
        } else if self.match_token(TokenType::LeftParen) {
            let expression = self.expression()?;
            self.consume(TokenType::RightParen, "Expect ')' after expression.")?;
            Ok(Expr::grouping(expression))
        } else {
            let token = self.peek().clone();
            self.error(&token, "Expect expression.")
        }
    }

    fn is_at_end(&self) -> bool {
        self.peek().is_eof()
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.current += 1;
        }
    }

    fn check(&self, token_type: TokenType) -> bool {
        self.peek().token_type == token_type
    }

    fn match_token(&mut self, token_type: TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            return true;
        }

        false
    }

    fn match_any(&mut self, token_types: &[TokenType]) -> bool {
        token_types
            .iter()
            .any(|token_type| self.match_token(*token_type))
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> ParseResult<Token> {
        let token = self.peek().clone();
        if token.token_type == token_type {
            self.advance();
            return Ok(token);
        }

        self.error(&token, message)
    }

    fn report(&mut self, token: &Token, message: &str) {
        self.error_collector.parser_error(token, message);
    }

    fn error<T>(&mut self, token: &Token, message: &str) -> ParseResult<T> {
        self.report(token, message);
        Err(ParserError)
    }
}
