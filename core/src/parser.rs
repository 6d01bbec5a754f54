use std::rc::Rc;

use crate::ast::{
    BinaryOperator, BlockStatement, ElseBranch, Expression, FunctionLiteral, Identifier,
    IfStatement, Param, PostfixOperator, PrefixOperator, Program, Statement, TypeAnnotation,
};
use crate::error::ParseError;
use crate::lexer::{Lexer, Token, TokenKind, TokenSource};
use crate::types;

/// Binding power of operators, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Assign,
    Ternary,
    Logical,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Postfix,
    Call,
}

impl Precedence {
    fn of(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Assign => Precedence::Assign,
            TokenKind::Question => Precedence::Ternary,
            TokenKind::And | TokenKind::Or => Precedence::Logical,
            TokenKind::EqualEqual | TokenKind::NotEqual => Precedence::Equals,
            TokenKind::Less | TokenKind::Greater | TokenKind::LessEq | TokenKind::GreaterEq => {
                Precedence::LessGreater
            }
            TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
            TokenKind::Asterisk | TokenKind::Slash | TokenKind::Percent => Precedence::Product,
            TokenKind::Increment | TokenKind::Decrement => Precedence::Postfix,
            TokenKind::LParen => Precedence::Call,
            _ => Precedence::Lowest,
        }
    }
}

fn binary_operator(kind: TokenKind) -> Option<BinaryOperator> {
    let op = match kind {
        TokenKind::Plus => BinaryOperator::Add,
        TokenKind::Minus => BinaryOperator::Subtract,
        TokenKind::Asterisk => BinaryOperator::Multiply,
        TokenKind::Slash => BinaryOperator::Divide,
        TokenKind::Percent => BinaryOperator::Modulo,
        TokenKind::Less => BinaryOperator::Less,
        TokenKind::Greater => BinaryOperator::Greater,
        TokenKind::LessEq => BinaryOperator::LessEq,
        TokenKind::GreaterEq => BinaryOperator::GreaterEq,
        TokenKind::EqualEqual => BinaryOperator::EqualEqual,
        TokenKind::NotEqual => BinaryOperator::NotEqual,
        TokenKind::And => BinaryOperator::And,
        TokenKind::Or => BinaryOperator::Or,
        _ => return None,
    };
    Some(op)
}

/// Pratt parser over any [`TokenSource`].
///
/// Diagnostics are collected instead of aborting: a failed statement is dropped and
/// parsing resumes at the next token.
pub struct Parser<S: TokenSource> {
    source: S,
    current: Token,
    peek: Token,
    errors: Vec<ParseError>,
    in_function: bool,
}

impl<'a> Parser<Lexer<'a>> {
    pub fn from_source(source: &'a str) -> Self {
        Self::new(Lexer::new(source))
    }
}

impl<S: TokenSource> Parser<S> {
    pub fn new(mut source: S) -> Self {
        let current = source.next_token();
        let peek = source.next_token();
        Self {
            source,
            current,
            peek,
            errors: Vec::new(),
            in_function: false,
        }
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    pub fn parse_program(&mut self) -> Program {
        let span = tracing::debug_span!("parse_program");
        let _enter = span.enter();

        let mut program = Program::default();
        while !self.check(TokenKind::Eof) {
            match self.parse_statement() {
                Some(statement) => program.statements.push(statement),
                None => self.synchronize(),
            }
            self.advance();
        }
        tracing::debug!(
            statements = program.statements.len(),
            errors = self.errors.len(),
            "parsed program"
        );
        program
    }

    fn advance(&mut self) {
        let next = self.source.next_token();
        self.current = std::mem::replace(&mut self.peek, next);
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn check_peek(&self, kind: TokenKind) -> bool {
        self.peek.kind == kind
    }

    /// Advances onto the peek token if it has the expected kind.
    fn expect_peek(&mut self, kind: TokenKind) -> Option<()> {
        if self.check_peek(kind) {
            self.advance();
            Some(())
        } else {
            self.peek_error(format!(
                "Expected next token to be {}, got {}",
                kind, self.peek.kind
            ));
            None
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        let (line, column) = (self.current.line, self.current.column);
        self.push_error(line, column, message.into());
    }

    fn peek_error(&mut self, message: impl Into<String>) {
        let (line, column) = (self.peek.line, self.peek.column);
        self.push_error(line, column, message.into());
    }

    fn push_error(&mut self, line: u32, column: u32, message: String) {
        tracing::debug!(line, column, %message, "parse error");
        self.errors.push(ParseError::new(line, column, message));
    }

    /// Skips the rest of a failed statement, stopping on its `;` or before a closing `}`.
    fn synchronize(&mut self) {
        while !self.check(TokenKind::Semicolon)
            && !self.check(TokenKind::RBrace)
            && !self.check_peek(TokenKind::RBrace)
            && !self.check(TokenKind::Eof)
        {
            self.advance();
        }
    }

    /// Whether the latest diagnostic points at the current token, i.e. it was never consumed.
    fn failed_on_current(&self) -> bool {
        self.errors
            .last()
            .is_some_and(|e| e.line == self.current.line && e.column == self.current.column)
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        tracing::trace!(token = %self.current.kind, line = self.current.line, "statement");

        match self.current.kind {
            TokenKind::Var => self.parse_var_statement(),
            TokenKind::Const => self.parse_const_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::If => self.parse_if_statement().map(Statement::If),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Do => self.parse_do_while_statement(),
            TokenKind::Display => self.parse_display_statement(),
            TokenKind::Fn if self.check_peek(TokenKind::Identifier) => {
                self.parse_function_declaration()
            }
            TokenKind::LBrace => self.parse_block().map(Statement::Block),
            _ => self.parse_expression_statement(),
        }
    }

    /// Parses `{ ... }` with the current token on `{`, leaving it on `}`.
    fn parse_block(&mut self) -> Option<BlockStatement> {
        let token = self.current.clone();
        let mut statements = Vec::new();
        self.advance();

        while !self.check(TokenKind::RBrace) {
            if self.check(TokenKind::Eof) {
                self.error(format!(
                    "Expected '}}' to close block opened at line {}, got EOF",
                    token.line
                ));
                return None;
            }
            match self.parse_statement() {
                Some(statement) => statements.push(statement),
                None => {
                    self.synchronize();
                    if self.check(TokenKind::RBrace) && self.failed_on_current() {
                        // The failure stopped on this block's own closing brace
                        continue;
                    }
                }
            }
            self.advance();
        }

        Some(BlockStatement { token, statements })
    }

    /// Parses `: type` with the peek token on `:`, leaving the current token on the type.
    fn parse_type_annotation(&mut self) -> Option<TypeAnnotation> {
        self.expect_peek(TokenKind::Colon)?;

        if !self.peek.kind.is_type_keyword() && !self.check_peek(TokenKind::Identifier) {
            self.peek_error(format!(
                "Invalid token for type annotation: '{}'. Expected a built-in type (int, float, string, boolean, void) or a type name",
                self.peek.literal
            ));
            return None;
        }
        self.advance();
        Some(TypeAnnotation::new(
            self.current.clone(),
            self.current.literal.clone(),
        ))
    }

    fn resolve_declared_type(
        &mut self,
        kind: &str,
        name: &Identifier,
        annotation: Option<TypeAnnotation>,
        value: Option<&Expression>,
    ) -> Option<Option<TypeAnnotation>> {
        match types::resolve_declaration(kind, &name.name, annotation, value) {
            Ok(resolved) => Some(resolved),
            Err(message) => {
                self.push_error(name.token.line, name.token.column, message);
                None
            }
        }
    }

    fn parse_var_statement(&mut self) -> Option<Statement> {
        let token = self.current.clone();
        self.expect_peek(TokenKind::Identifier)?;
        let name = Identifier::new(self.current.clone());

        let annotation = if self.check_peek(TokenKind::Colon) {
            Some(self.parse_type_annotation()?)
        } else {
            None
        };

        let value = if self.check_peek(TokenKind::Assign) {
            self.advance();
            self.advance();
            Some(self.parse_expression(Precedence::Lowest)?)
        } else {
            None
        };

        self.expect_peek(TokenKind::Semicolon)?;
        let type_annotation =
            self.resolve_declared_type("variable", &name, annotation, value.as_ref())?;

        Some(Statement::Var {
            token,
            name,
            type_annotation,
            value,
        })
    }

    fn parse_const_statement(&mut self) -> Option<Statement> {
        let token = self.current.clone();
        self.expect_peek(TokenKind::Identifier)?;
        let name = Identifier::new(self.current.clone());

        let annotation = if self.check_peek(TokenKind::Colon) {
            Some(self.parse_type_annotation()?)
        } else {
            None
        };

        if !self.check_peek(TokenKind::Assign) {
            self.peek_error(format!(
                "Expected '=' after const identifier '{}'. Constants must be initialized.",
                name
            ));
            return None;
        }
        self.advance();
        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;

        self.expect_peek(TokenKind::Semicolon)?;
        let type_annotation =
            self.resolve_declared_type("constant", &name, annotation, Some(&value))?;

        Some(Statement::Const {
            token,
            name,
            type_annotation,
            value,
        })
    }

    fn parse_return_statement(&mut self) -> Option<Statement> {
        if !self.in_function {
            self.error("Return statement is not allowed outside of a function body");
            return None;
        }
        let token = self.current.clone();

        if self.check_peek(TokenKind::Semicolon) {
            self.advance();
            return Some(Statement::Return { token, value: None });
        }

        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::Semicolon)?;

        Some(Statement::Return {
            token,
            value: Some(value),
        })
    }

    fn parse_if_statement(&mut self) -> Option<IfStatement> {
        let token = self.current.clone();
        self.expect_peek(TokenKind::LParen)?;
        self.advance();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RParen)?;
        self.expect_peek(TokenKind::LBrace)?;
        let consequence = self.parse_block()?;

        let alternative = if self.check_peek(TokenKind::Else) {
            self.advance();
            if self.check_peek(TokenKind::If) {
                self.advance();
                Some(ElseBranch::If(Box::new(self.parse_if_statement()?)))
            } else if self.check_peek(TokenKind::LBrace) {
                self.advance();
                Some(ElseBranch::Block(self.parse_block()?))
            } else {
                self.peek_error(format!(
                    "Expected 'if' or '{{' after 'else', got {}",
                    self.peek.kind
                ));
                return None;
            }
        } else {
            None
        };

        Some(IfStatement {
            token,
            condition,
            consequence,
            alternative,
        })
    }

    fn parse_while_statement(&mut self) -> Option<Statement> {
        let token = self.current.clone();
        self.expect_peek(TokenKind::LParen)?;
        self.advance();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RParen)?;
        self.expect_peek(TokenKind::LBrace)?;
        let body = self.parse_block()?;

        Some(Statement::While {
            token,
            condition,
            body,
        })
    }

    fn parse_do_while_statement(&mut self) -> Option<Statement> {
        let token = self.current.clone();
        self.expect_peek(TokenKind::LBrace)?;
        let body = self.parse_block()?;
        self.expect_peek(TokenKind::While)?;
        self.expect_peek(TokenKind::LParen)?;
        self.advance();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RParen)?;
        self.expect_peek(TokenKind::Semicolon)?;

        Some(Statement::DoWhile {
            token,
            body,
            condition,
        })
    }

    /// `for (init; condition; update) { ... }`, where each clause may be empty.
    fn parse_for_statement(&mut self) -> Option<Statement> {
        let token = self.current.clone();
        self.expect_peek(TokenKind::LParen)?;
        self.advance();

        let init = if self.check(TokenKind::Semicolon) {
            None
        } else {
            let statement = self.parse_statement()?;
            if !self.check(TokenKind::Semicolon) {
                self.error(format!(
                    "Expected ';' after for-loop initializer, got {}",
                    self.current.kind
                ));
                return None;
            }
            Some(Box::new(statement))
        };

        let condition = if self.check_peek(TokenKind::Semicolon) {
            self.advance();
            None
        } else {
            self.advance();
            let condition = self.parse_expression(Precedence::Lowest)?;
            self.expect_peek(TokenKind::Semicolon)?;
            Some(condition)
        };

        let update = if self.check_peek(TokenKind::RParen) {
            self.advance();
            None
        } else {
            self.advance();
            let update = self.parse_expression(Precedence::Lowest)?;
            self.expect_peek(TokenKind::RParen)?;
            Some(update)
        };

        self.expect_peek(TokenKind::LBrace)?;
        let body = self.parse_block()?;

        Some(Statement::For {
            token,
            init,
            condition,
            update,
            body,
        })
    }

    fn parse_display_statement(&mut self) -> Option<Statement> {
        let token = self.current.clone();
        self.expect_peek(TokenKind::LParen)?;
        let arguments = self.parse_expression_list(TokenKind::RParen)?;
        self.expect_peek(TokenKind::Semicolon)?;

        Some(Statement::Display { token, arguments })
    }

    fn parse_function_declaration(&mut self) -> Option<Statement> {
        let token = self.current.clone();
        self.advance();
        let name = Identifier::new(self.current.clone());
        let function = self.parse_function_rest(token.clone(), Some(name.clone()))?;

        Some(Statement::FunctionDeclaration {
            token,
            name,
            function: Rc::new(function),
        })
    }

    /// Parses parameters, return type and body, starting with `(` as the peek token.
    fn parse_function_rest(
        &mut self,
        token: Token,
        name: Option<Identifier>,
    ) -> Option<FunctionLiteral> {
        self.expect_peek(TokenKind::LParen)?;
        let params = self.parse_params()?;

        let return_type = if self.check_peek(TokenKind::Colon) {
            self.parse_type_annotation()?
        } else {
            TypeAnnotation::new(
                Token::synthetic(TokenKind::VoidType, types::VOID, &token),
                types::VOID,
            )
        };

        self.expect_peek(TokenKind::LBrace)?;
        let was_in_function = std::mem::replace(&mut self.in_function, true);
        let body = self.parse_block();
        self.in_function = was_in_function;

        Some(FunctionLiteral {
            token,
            name,
            params,
            return_type,
            body: body?,
        })
    }

    fn parse_params(&mut self) -> Option<Vec<Param>> {
        let mut params: Vec<Param> = Vec::new();
        if self.check_peek(TokenKind::RParen) {
            self.advance();
            return Some(params);
        }

        loop {
            self.expect_peek(TokenKind::Identifier)?;
            let name = Identifier::new(self.current.clone());
            if params.iter().any(|p| p.name.name == name.name) {
                self.error(format!("Duplicate parameter name '{}'", name));
                return None;
            }
            if !self.check_peek(TokenKind::Colon) {
                self.peek_error(format!(
                    "Expected type annotation for parameter '{}', got {}",
                    name, self.peek.kind
                ));
                return None;
            }
            let type_annotation = self.parse_type_annotation()?;
            params.push(Param {
                name,
                type_annotation,
            });

            if !self.check_peek(TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        self.expect_peek(TokenKind::RParen)?;
        Some(params)
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let token = self.current.clone();
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::Semicolon)?;

        Some(Statement::Expression { token, expression })
    }

    pub fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        let mut left = self.parse_prefix()?;

        while !self.check_peek(TokenKind::Semicolon) && precedence < Precedence::of(self.peek.kind)
        {
            self.advance();
            left = self.parse_infix(left)?;
        }

        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        match token.kind {
            TokenKind::Identifier => Some(Expression::Identifier(Identifier::new(token))),
            TokenKind::Int => match token.literal.parse::<i64>() {
                Ok(value) => Some(Expression::IntegerLiteral { token, value }),
                Err(_) => {
                    self.error(format!("Could not parse '{}' as an integer", token.literal));
                    None
                }
            },
            TokenKind::Float => match token.literal.parse::<f64>() {
                Ok(value) => Some(Expression::FloatLiteral { token, value }),
                Err(_) => {
                    self.error(format!("Could not parse '{}' as a float", token.literal));
                    None
                }
            },
            TokenKind::String => {
                let value = token.literal.clone();
                Some(Expression::StringLiteral { token, value })
            }
            TokenKind::True | TokenKind::False => {
                let value = token.kind == TokenKind::True;
                Some(Expression::BooleanLiteral { token, value })
            }
            TokenKind::Bang => self.parse_prefix_operator(token, PrefixOperator::Not),
            TokenKind::Minus => self.parse_prefix_operator(token, PrefixOperator::Negate),
            TokenKind::Increment => self.parse_prefix_operator(token, PrefixOperator::Increment),
            TokenKind::Decrement => self.parse_prefix_operator(token, PrefixOperator::Decrement),
            TokenKind::LParen => {
                self.advance();
                let expression = self.parse_expression(Precedence::Lowest)?;
                self.expect_peek(TokenKind::RParen)?;
                Some(expression)
            }
            TokenKind::Fn => self
                .parse_function_rest(token, None)
                .map(|literal| Expression::Function(Rc::new(literal))),
            TokenKind::Illegal => {
                self.error(format!("Illegal token '{}'", token.literal));
                None
            }
            _ => {
                self.error(format!(
                    "No prefix parse function found for token {} ('{}')",
                    token.kind, token.literal
                ));
                None
            }
        }
    }

    fn parse_prefix_operator(
        &mut self,
        token: Token,
        operator: PrefixOperator,
    ) -> Option<Expression> {
        self.advance();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expression::Prefix {
            token,
            operator,
            right: Box::new(right),
        })
    }

    fn parse_infix(&mut self, left: Expression) -> Option<Expression> {
        let token = self.current.clone();
        match token.kind {
            TokenKind::Question => self.parse_ternary(token, left),
            TokenKind::Assign => self.parse_assignment(token, left),
            TokenKind::LParen => {
                let arguments = self.parse_expression_list(TokenKind::RParen)?;
                Some(Expression::Call {
                    token,
                    callee: Box::new(left),
                    arguments,
                })
            }
            TokenKind::Increment | TokenKind::Decrement => {
                let operator = if token.kind == TokenKind::Increment {
                    PostfixOperator::Increment
                } else {
                    PostfixOperator::Decrement
                };
                Some(Expression::Postfix {
                    token,
                    operator,
                    left: Box::new(left),
                })
            }
            kind => {
                let operator = binary_operator(kind)?;
                let precedence = Precedence::of(kind);
                self.advance();
                let right = self.parse_expression(precedence)?;
                Some(Expression::Infix {
                    token,
                    left: Box::new(left),
                    operator,
                    right: Box::new(right),
                })
            }
        }
    }

    // Both branches parse at Lowest, so an assignment in the alternative binds inside it.
    fn parse_ternary(&mut self, token: Token, condition: Expression) -> Option<Expression> {
        self.advance();
        let consequence = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::Colon)?;
        self.advance();
        let alternative = self.parse_expression(Precedence::Lowest)?;

        Some(Expression::Ternary {
            token,
            condition: Box::new(condition),
            consequence: Box::new(consequence),
            alternative: Box::new(alternative),
        })
    }

    fn parse_assignment(&mut self, token: Token, target: Expression) -> Option<Expression> {
        let name = match target {
            Expression::Identifier(name) => name,
            other => {
                self.error(format!(
                    "Invalid assignment target. Expected an identifier, got {}",
                    other
                ));
                return None;
            }
        };

        // One level below Assign keeps `a = b = c` right-associative.
        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;

        Some(Expression::Assignment {
            token,
            name,
            value: Box::new(value),
        })
    }

    /// Comma-separated expressions with the current token on the opening delimiter.
    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expression>> {
        let mut list = Vec::new();
        if self.check_peek(end) {
            self.advance();
            return Some(list);
        }

        self.advance();
        list.push(self.parse_expression(Precedence::Lowest)?);
        while self.check_peek(TokenKind::Comma) {
            self.advance();
            self.advance();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }
        self.expect_peek(end)?;

        Some(list)
    }
}

/// Parses `source` and returns the program together with every diagnostic.
pub fn parse_program(source: &str) -> (Program, Vec<ParseError>) {
    let mut parser = Parser::from_source(source);
    let program = parser.parse_program();
    (program, parser.into_errors())
}
