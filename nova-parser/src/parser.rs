// nova-parser - Recursive descent parser for Nova
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Recursive descent parser for Nova source code.
//!
//! The parser works directly on the source bytes; there is no separate
//! tokeniser. Keywords and operators are matched as plain prefixes at
//! each decision point, whitespace and `//` comments are skipped between
//! constructs, and the first mismatch aborts the parse. Spans are byte
//! offsets into the source buffer.

use std::fmt;

use crate::ast::{
    BinOp, Expr, ExprKind, FunctionDecl, Item, Param, Program, Span, Stmt, StmtKind, UnOp,
};
use crate::scope::{ScopeId, ScopeTree};
use crate::types::{Type, TypeKind};

/// Parse error with the byte position of the failure.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub pos: usize,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parse error at position {}: {}", self.pos, self.message)
    }
}

impl std::error::Error for ParseError {}

type Result<T> = std::result::Result<T, ParseError>;

/// The parser consumes a source buffer and produces a [`Program`].
pub struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
    scopes: ScopeTree,
    current_scope: ScopeId,
}

impl<'a> Parser<'a> {
    /// Create a parser for the given source code.
    pub fn new(source: &'a str) -> Self {
        let scopes = ScopeTree::new();
        let current_scope = scopes.root();
        Parser {
            src: source.as_bytes(),
            pos: 0,
            scopes,
            current_scope,
        }
    }

    /// Parse a whole program: zero or more function declarations.
    pub fn parse(mut self) -> Result<Program> {
        let start = self.pos;
        let mut items = Vec::new();

        self.skip_ws();
        while !self.at_end() {
            items.push(Item::Function(self.function()?));
            self.skip_ws();
        }

        let span = self.span_from(start);
        Ok(Program {
            items,
            scopes: self.scopes,
            span,
        })
    }

    /// Parse a string and return the program (convenience function).
    pub fn parse_str(source: &str) -> Result<Program> {
        Parser::new(source).parse()
    }

    // ========================================================================
    // Declarations and statements
    // ========================================================================

    fn function(&mut self) -> Result<FunctionDecl> {
        let start = self.pos;
        self.expect("fn")?;
        self.skip_ws();

        let name = self.consume_identifier()?;
        self.skip_ws();

        self.expect("(")?;
        let params = self.params()?;
        self.expect(")")?;
        self.skip_ws();

        let return_type = if self.match_str("->") {
            self.skip_ws();
            let ty = self.type_expr()?;
            self.skip_ws();
            ty
        } else {
            // No annotation defaults to i32, not unit.
            Type::new(TypeKind::I32, self.span_from(self.pos))
        };

        let function_scope = self.enter_scope();
        for param in &params {
            self.scopes.declare(function_scope, &param.name);
        }

        let body = self.block()?;
        self.exit_scope();

        Ok(FunctionDecl {
            name,
            params,
            return_type,
            body,
            span: self.span_from(start),
        })
    }

    fn params(&mut self) -> Result<Vec<Param>> {
        let mut params = Vec::new();

        self.skip_ws();
        if self.peek_str(")") {
            return Ok(params);
        }

        loop {
            let param_start = self.pos;
            self.skip_ws();
            let is_mut = self.match_str("mut");
            if is_mut {
                self.skip_ws();
            }

            let name = self.consume_identifier()?;
            self.skip_ws();

            self.expect(":")?;
            self.skip_ws();

            let ty = self.type_expr()?;

            params.push(Param {
                is_mut,
                name,
                ty,
                span: self.span_from(param_start),
            });

            self.skip_ws();
            if !self.match_str(",") {
                break;
            }
        }

        Ok(params)
    }

    fn type_expr(&mut self) -> Result<Type> {
        let start = self.pos;

        if self.match_str("&") {
            let is_mut = self.match_str("mut");
            if is_mut {
                self.skip_ws();
            }
            let inner = self.type_expr()?;
            let kind = if is_mut {
                TypeKind::MutRef(Box::new(inner))
            } else {
                TypeKind::Ref(Box::new(inner))
            };
            return Ok(Type::new(kind, self.span_from(start)));
        }

        if self.match_str("i32") {
            return Ok(Type::new(TypeKind::I32, self.span_from(start)));
        }
        if self.match_str("bool") {
            return Ok(Type::new(TypeKind::Bool, self.span_from(start)));
        }
        if self.match_str("str") {
            return Ok(Type::new(TypeKind::Str, self.span_from(start)));
        }

        Err(self.error("Expected type"))
    }

    fn statement(&mut self) -> Result<Stmt> {
        self.skip_ws();

        if self.match_str("let") {
            return self.let_stmt();
        }
        if self.match_str("if") {
            return self.if_stmt();
        }
        if self.match_str("while") {
            return self.while_stmt();
        }
        if self.peek_str("{") {
            return self.block();
        }

        // Expression statement. The trailing semicolon is optional before
        // a closing brace or EOF so a block-final expression can act as
        // the function's return value.
        let start = self.pos;
        let expr = self.expr()?;
        self.skip_ws();

        if !self.peek_str("}") && !self.at_end() {
            self.expect(";")?;
        }

        Ok(Stmt::new(
            StmtKind::Expr(expr),
            self.span_from(start),
            self.current_scope,
        ))
    }

    fn let_stmt(&mut self) -> Result<Stmt> {
        let start = self.pos;
        self.skip_ws();
        let is_mut = self.match_str("mut");
        if is_mut {
            self.skip_ws();
        }

        let name = self.consume_identifier()?;
        self.skip_ws();

        self.expect(":")?;
        self.skip_ws();

        let ty = self.type_expr()?;
        self.skip_ws();

        self.expect("=")?;
        self.skip_ws();

        let init = self.expr()?;
        self.skip_ws();
        self.expect(";")?;

        self.scopes.declare(self.current_scope, &name);

        Ok(Stmt::new(
            StmtKind::Let {
                is_mut,
                name,
                ty,
                init,
            },
            self.span_from(start),
            self.current_scope,
        ))
    }

    fn if_stmt(&mut self) -> Result<Stmt> {
        let start = self.pos;
        self.skip_ws();

        let cond = self.expr()?;
        self.skip_ws();

        self.enter_scope();
        let then_branch = self.block()?;
        self.exit_scope();

        self.skip_ws();

        let else_branch = if self.match_str("else") {
            self.skip_ws();
            self.enter_scope();
            let branch = if self.match_str("if") {
                self.if_stmt()?
            } else {
                self.block()?
            };
            self.exit_scope();
            Some(Box::new(branch))
        } else {
            None
        };

        Ok(Stmt::new(
            StmtKind::If {
                cond,
                then_branch: Box::new(then_branch),
                else_branch,
            },
            self.span_from(start),
            self.current_scope,
        ))
    }

    fn while_stmt(&mut self) -> Result<Stmt> {
        let start = self.pos;
        self.skip_ws();

        let cond = self.expr()?;
        self.skip_ws();

        self.enter_scope();
        let body = self.block()?;
        self.exit_scope();

        Ok(Stmt::new(
            StmtKind::While {
                cond,
                body: Box::new(body),
            },
            self.span_from(start),
            self.current_scope,
        ))
    }

    fn block(&mut self) -> Result<Stmt> {
        let start = self.pos;
        self.expect("{")?;

        let block_scope = self.enter_scope();
        let mut statements = Vec::new();

        self.skip_ws();
        while !self.at_end() && !self.peek_str("}") {
            statements.push(self.statement()?);
            self.skip_ws();
        }

        self.expect("}")?;

        let stmt = Stmt::new(
            StmtKind::Block(statements),
            self.span_from(start),
            block_scope,
        );
        self.exit_scope();
        Ok(stmt)
    }

    // ========================================================================
    // Expressions, lowest precedence first
    // ========================================================================

    fn expr(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let lhs = self.or_expr()?;

        if self.match_str("=") {
            self.skip_ws();
            // The target must be an identifier; parentheses around it are
            // transparent because the primary level returns the inner
            // expression directly.
            if !matches!(lhs.kind, ExprKind::Ident { .. }) {
                return Err(self.error("Invalid assignment target"));
            }
            let rhs = self.assignment()?; // right-associative
            let span = self.span_from(lhs.span.start);
            return Ok(Expr::new(
                ExprKind::Binary {
                    op: BinOp::Assign,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            ));
        }

        Ok(lhs)
    }

    fn or_expr(&mut self) -> Result<Expr> {
        let mut expr = self.and_expr()?;

        while self.match_str("||") {
            self.skip_ws();
            let rhs = self.and_expr()?;
            let span = self.span_from(expr.span.start);
            expr = Expr::new(
                ExprKind::Binary {
                    op: BinOp::Or,
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }

        Ok(expr)
    }

    fn and_expr(&mut self) -> Result<Expr> {
        let mut expr = self.equality()?;

        while self.match_str("&&") {
            self.skip_ws();
            let rhs = self.equality()?;
            let span = self.span_from(expr.span.start);
            expr = Expr::new(
                ExprKind::Binary {
                    op: BinOp::And,
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        let mut expr = self.comparison()?;

        loop {
            let op = if self.match_str("==") {
                BinOp::Eq
            } else if self.match_str("!=") {
                BinOp::Ne
            } else {
                break;
            };

            self.skip_ws();
            let rhs = self.comparison()?;
            let span = self.span_from(expr.span.start);
            expr = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr> {
        let start = self.pos;
        let mut expr = self.term()?;

        loop {
            self.skip_ws();
            // Two-character operators first so `<=` never parses as `<`.
            let op = if self.match_str("<=") {
                BinOp::Le
            } else if self.match_str(">=") {
                BinOp::Ge
            } else if self.match_str("<") {
                BinOp::Lt
            } else if self.match_str(">") {
                BinOp::Gt
            } else {
                break;
            };

            self.skip_ws();
            let rhs = self.term()?;
            let span = self.span_from(start);
            expr = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr> {
        let start = self.pos;
        let mut expr = self.factor()?;

        loop {
            self.skip_ws();
            let op = if self.match_str("+") {
                BinOp::Add
            } else if self.match_str("-") {
                BinOp::Sub
            } else {
                break;
            };

            self.skip_ws();
            let rhs = self.factor()?;
            let span = self.span_from(start);
            expr = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr> {
        let start = self.pos;
        let mut expr = self.unary()?;

        loop {
            self.skip_ws();
            let op = if self.match_str("*") {
                BinOp::Mul
            } else if self.match_str("/") {
                BinOp::Div
            } else {
                break;
            };

            self.skip_ws();
            let rhs = self.unary()?;
            let span = self.span_from(start);
            expr = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr> {
        let start = self.pos;
        self.skip_ws();

        if self.match_str("-") {
            let operand = self.unary()?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnOp::Neg,
                    operand: Box::new(operand),
                },
                self.span_from(start),
            ));
        }

        if self.match_str("!") {
            let operand = self.unary()?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnOp::Not,
                    operand: Box::new(operand),
                },
                self.span_from(start),
            ));
        }

        if self.match_str("&") {
            let is_mut = self.match_str("mut");
            if is_mut {
                self.skip_ws();
            }
            let operand = self.unary()?;
            return Ok(Expr::new(
                ExprKind::Borrow {
                    is_mut,
                    operand: Box::new(operand),
                },
                self.span_from(start),
            ));
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr> {
        let start = self.pos;
        let mut expr = self.primary()?;

        loop {
            self.skip_ws();
            if self.match_str("(") {
                let mut args = Vec::new();

                self.skip_ws();
                if !self.peek_str(")") {
                    loop {
                        args.push(self.expr()?);
                        self.skip_ws();
                        if !self.match_str(",") {
                            break;
                        }
                    }
                }

                self.expect(")")?;
                expr = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    self.span_from(start),
                );
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr> {
        let start = self.pos;
        self.skip_ws();

        if self.peek_byte().is_some_and(|b| b.is_ascii_digit()) {
            let value = self.consume_integer()?;
            return Ok(Expr::new(ExprKind::Int(value), self.span_from(start)));
        }

        if self.match_str("true") {
            return Ok(Expr::new(ExprKind::Bool(true), self.span_from(start)));
        }
        if self.match_str("false") {
            return Ok(Expr::new(ExprKind::Bool(false), self.span_from(start)));
        }

        if self.peek_byte() == Some(b'"') {
            let value = self.consume_string()?;
            return Ok(Expr::new(ExprKind::Str(value), self.span_from(start)));
        }

        if self
            .peek_byte()
            .is_some_and(|b| b.is_ascii_alphabetic() || b == b'_')
        {
            let name = self.consume_identifier()?;
            return Ok(Expr::new(
                ExprKind::Ident {
                    name,
                    is_mut_binding: false,
                },
                self.span_from(start),
            ));
        }

        if self.match_str("(") {
            let expr = self.expr()?;
            self.expect(")")?;
            return Ok(expr);
        }

        Err(self.error("Expected expression"))
    }

    // ========================================================================
    // Lexical helpers
    // ========================================================================

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek_byte(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    /// Consume `expected` if the source continues with it. A bare prefix
    /// match: keywords are not checked for a following word boundary.
    fn match_str(&mut self, expected: &str) -> bool {
        if self.peek_str(expected) {
            self.pos += expected.len();
            true
        } else {
            false
        }
    }

    fn peek_str(&self, expected: &str) -> bool {
        self.src[self.pos..].starts_with(expected.as_bytes())
    }

    fn expect(&mut self, expected: &str) -> Result<()> {
        if self.match_str(expected) {
            Ok(())
        } else {
            Err(self.error(&format!("Expected '{}'", expected)))
        }
    }

    fn consume_identifier(&mut self) -> Result<String> {
        let start = self.pos;

        match self.peek_byte() {
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
            _ => return Err(self.error("Expected identifier")),
        }

        while let Some(b) = self.peek_byte() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }

        Ok(String::from_utf8_lossy(&self.src[start..self.pos]).into_owned())
    }

    fn consume_integer(&mut self) -> Result<i32> {
        let start = self.pos;

        while let Some(b) = self.peek_byte() {
            if b.is_ascii_digit() {
                self.pos += 1;
            } else {
                break;
            }
        }

        let digits = std::str::from_utf8(&self.src[start..self.pos]).unwrap_or("");
        digits
            .parse::<i32>()
            .map_err(|_| self.error_at(start, "Integer literal out of range"))
    }

    /// Consume a double-quoted string literal. A backslash shields the
    /// following byte from terminating the literal, but the raw bytes
    /// (backslash included) are kept as the value.
    fn consume_string(&mut self) -> Result<String> {
        if self.peek_byte() != Some(b'"') {
            return Err(self.error("Expected string"));
        }
        self.pos += 1;

        let start = self.pos;
        while let Some(b) = self.peek_byte() {
            if b == b'"' {
                break;
            }
            if b == b'\\' {
                self.pos += 1;
                if self.at_end() {
                    return Err(self.error("Unterminated string"));
                }
            }
            self.pos += 1;
        }

        if self.at_end() {
            return Err(self.error("Unterminated string"));
        }

        let value = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        self.pos += 1; // closing quote
        Ok(value)
    }

    fn skip_ws(&mut self) {
        while let Some(b) = self.peek_byte() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
                continue;
            }

            // Line comment: consume up to (not including) the newline.
            if b == b'/' && self.src.get(self.pos + 1) == Some(&b'/') {
                self.pos += 2;
                while let Some(c) = self.peek_byte() {
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                    self.pos += 1;
                }
                continue;
            }

            break;
        }
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.pos)
    }

    fn error(&self, message: &str) -> ParseError {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, pos: usize, message: &str) -> ParseError {
        ParseError {
            pos,
            message: message.to_string(),
        }
    }

    // ========================================================================
    // Scope management
    // ========================================================================

    fn enter_scope(&mut self) -> ScopeId {
        let child = self.scopes.push_child(self.current_scope);
        self.current_scope = child;
        child
    }

    fn exit_scope(&mut self) {
        if let Some(parent) = self.scopes.parent(self.current_scope) {
            self.current_scope = parent;
        }
    }
}
