// nova-typeck - Type and borrow checker for the Nova programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # nova-typeck
//!
//! Type and borrow checking for Nova programs. Annotates every expression
//! with its inferred type and enforces the mutability and aliasing rules:
//! assignment requires a `mut` binding, `&mut` requires a `mut` binding,
//! and a variable admits only one active mutable borrow (which, in this
//! simplified model, lasts until the end of the function).

pub mod check;
pub mod env;
pub mod error;

pub use check::{assignable, compatible, TypeChecker};
pub use env::{Env, VarInfo};
pub use error::TypeError;
