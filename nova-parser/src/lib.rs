// nova-parser - Parser for the Nova programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # nova-parser
//!
//! AST definitions and recursive descent parser for the Nova programming
//! language. Produces a [`Program`] (typed AST plus lexical scope tree)
//! from source text.

pub mod ast;
pub mod parser;
pub mod scope;
pub mod types;

pub use ast::{
    BinOp, Expr, ExprKind, FunctionDecl, Item, Param, Program, Span, Stmt, StmtKind, UnOp,
};
pub use parser::{ParseError, Parser};
pub use scope::{ScopeId, ScopeTree};
pub use types::{Type, TypeKind};
