// nova-bytecode - Bytecode chunks and on-disk formats
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The compiled instruction stream with its string-constant pool, and the
//! two serialised forms: the textual assembly listing (`.ns`) and the
//! binary image (`.no`).
//!
//! The binary format is one opcode byte per instruction followed, for
//! opcodes that take one, by a little-endian machine-word operand. It is
//! deliberately host-sized: images are not portable across word widths.

use std::fmt;

use crate::opcode::Op;

/// Error produced when reading an assembly listing back.
#[derive(Debug, Clone)]
pub struct ListingError {
    /// 1-indexed line number.
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ListingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid listing at line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ListingError {}

/// A chunk of bytecode with its string-constant pool.
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    /// The instruction stream, across all functions, in emission order.
    pub code: Vec<Op>,

    /// String-constant pool. Indices are assigned per literal occurrence;
    /// identical literals are not deduplicated.
    pub strings: Vec<String>,
}

impl Chunk {
    /// Create a new empty chunk.
    pub fn new() -> Self {
        Chunk {
            code: Vec::new(),
            strings: Vec::new(),
        }
    }

    /// Append an instruction.
    pub fn emit(&mut self, op: Op) {
        self.code.push(op);
    }

    /// The current instruction index (the index the next emitted
    /// instruction will get). Used to record and patch jump targets.
    pub fn position(&self) -> usize {
        self.code.len()
    }

    /// Rewrite the jump at `at` to target the absolute instruction index
    /// `target`.
    pub fn patch_jump(&mut self, at: usize, target: usize) {
        match &mut self.code[at] {
            Op::Jmp(t) | Op::JmpIf(t) | Op::JmpIfNot(t) => *t = target,
            other => debug_assert!(false, "patch_jump called on non-jump: {:?}", other),
        }
    }

    /// Add a string to the constant pool and return its index.
    pub fn add_string(&mut self, s: &str) -> usize {
        let idx = self.strings.len();
        self.strings.push(s.to_string());
        idx
    }

    /// Render the assembly listing: one instruction per line, mnemonic
    /// plus decimal operand where the opcode takes one.
    pub fn listing(&self) -> String {
        let mut out = String::new();
        for op in &self.code {
            out.push_str(&op.to_string());
            out.push('\n');
        }
        out
    }

    /// Parse an assembly listing back into a chunk (with an empty string
    /// pool). Inverse of [`Chunk::listing`] over the instruction stream.
    pub fn from_listing(text: &str) -> Result<Chunk, ListingError> {
        let mut chunk = Chunk::new();

        for (i, line) in text.lines().enumerate() {
            let mut parts = line.split_whitespace();
            let Some(mnemonic) = parts.next() else {
                continue; // blank line
            };

            let operand = match parts.next() {
                Some(text) => Some(text.parse::<usize>().map_err(|_| ListingError {
                    line: i + 1,
                    message: format!("invalid operand '{}'", text),
                })?),
                None => None,
            };

            if parts.next().is_some() {
                return Err(ListingError {
                    line: i + 1,
                    message: "trailing tokens".to_string(),
                });
            }

            let op = Op::from_parts(mnemonic, operand).ok_or_else(|| ListingError {
                line: i + 1,
                message: format!("unknown instruction '{}'", line.trim()),
            })?;
            chunk.emit(op);
        }

        Ok(chunk)
    }

    /// Encode the binary image: opcode byte, then a little-endian
    /// machine-word operand for opcodes that carry one.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for op in &self.code {
            out.push(op.opcode());
            if let Some(operand) = op.operand() {
                out.extend_from_slice(&operand.to_le_bytes());
            }
        }
        out
    }
}
