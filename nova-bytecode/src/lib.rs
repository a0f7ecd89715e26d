// nova-bytecode - Bytecode compiler for the Nova programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # nova-bytecode
//!
//! Lowers a type-checked Nova AST to instructions for a stack-based
//! virtual machine, and serialises the result as a textual assembly
//! listing (`.ns`) and a binary image (`.no`). The instruction set is a
//! contract this crate produces; no interpreter lives here.

pub mod chunk;
pub mod compiler;
pub mod function_table;
pub mod opcode;

pub use chunk::{Chunk, ListingError};
pub use compiler::{CompileError, CompiledProgram, Compiler};
pub use function_table::{FunctionInfo, FunctionTable};
pub use opcode::Op;
