// nova-bytecode - Instruction set for the Nova stack machine
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Bytecode instruction definitions.
//!
//! Instructions operate on a value stack; locals live in a per-function,
//! zero-indexed slot array with parameters in the first slots. An operand,
//! where present, is a machine word whose meaning depends on the opcode:
//! a constant, a local index, a string-pool index, an absolute instruction
//! index (jumps), or a function-table index (calls).

use std::fmt;

/// Instructions for the Nova stack machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    // =========================================================================
    // Constants & stack
    // =========================================================================
    /// Push an i32 constant. The operand is the bit pattern of the value
    /// sign-extended to the machine word, so negatives show up as large
    /// unsigned numbers in listings.
    PushI32(usize),

    /// Push a boolean constant (operand is 0 or 1).
    PushBool(usize),

    /// Push string constant from the string pool.
    PushStr(usize),

    /// Pop the top value.
    Pop,

    /// Duplicate the top value.
    Dup,

    /// Swap the top two values.
    Swap,

    // =========================================================================
    // Variables
    // =========================================================================
    /// Push the value of local slot n.
    Load(usize),

    /// Pop into local slot n.
    Store(usize),

    /// Push a reference to local slot n.
    LoadRef(usize),

    /// Store through a reference.
    StoreRef,

    // =========================================================================
    // Arithmetic
    // =========================================================================
    /// Push a + b where b = pop(), a = pop().
    AddI32,

    /// Push a - b where b = pop(), a = pop().
    SubI32,

    /// Push a * b where b = pop(), a = pop().
    MulI32,

    /// Push a / b where b = pop(), a = pop().
    DivI32,

    /// Negate the top integer.
    NegI32,

    // =========================================================================
    // Comparison
    // =========================================================================
    /// Integer equality.
    EqI32,

    /// Integer inequality.
    NeI32,

    /// Integer less than.
    LtI32,

    /// Integer greater than.
    GtI32,

    /// Integer less than or equal.
    LeI32,

    /// Integer greater than or equal.
    GeI32,

    // =========================================================================
    // Logical
    // =========================================================================
    /// Logical AND of the top two booleans.
    And,

    /// Logical OR of the top two booleans.
    Or,

    /// Logical NOT of the top boolean.
    Not,

    // =========================================================================
    // Control flow (operands are absolute instruction indices)
    // =========================================================================
    /// Unconditional jump.
    Jmp(usize),

    /// Jump if the top of stack is true.
    JmpIf(usize),

    /// Jump if the top of stack is false.
    JmpIfNot(usize),

    /// Call the function at index n in the function table.
    Call(usize),

    /// Return with no value.
    Ret,

    /// Return the top of stack.
    RetVal,

    // =========================================================================
    // References
    // =========================================================================
    /// Turn the top value into a shared reference.
    Borrow,

    /// Turn the top value into a mutable reference.
    BorrowMut,

    /// Read through a shared reference.
    Deref,

    /// Read through a mutable reference.
    DerefMut,
}

impl Op {
    /// The textual opcode name used in assembly listings.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Op::PushI32(_) => "PUSH_I32",
            Op::PushBool(_) => "PUSH_BOOL",
            Op::PushStr(_) => "PUSH_STR",
            Op::Pop => "POP",
            Op::Dup => "DUP",
            Op::Swap => "SWAP",
            Op::Load(_) => "LOAD",
            Op::Store(_) => "STORE",
            Op::LoadRef(_) => "LOAD_REF",
            Op::StoreRef => "STORE_REF",
            Op::AddI32 => "ADD_I32",
            Op::SubI32 => "SUB_I32",
            Op::MulI32 => "MUL_I32",
            Op::DivI32 => "DIV_I32",
            Op::NegI32 => "NEG_I32",
            Op::EqI32 => "EQ_I32",
            Op::NeI32 => "NE_I32",
            Op::LtI32 => "LT_I32",
            Op::GtI32 => "GT_I32",
            Op::LeI32 => "LE_I32",
            Op::GeI32 => "GE_I32",
            Op::And => "AND",
            Op::Or => "OR",
            Op::Not => "NOT",
            Op::Jmp(_) => "JMP",
            Op::JmpIf(_) => "JMP_IF",
            Op::JmpIfNot(_) => "JMP_IF_NOT",
            Op::Call(_) => "CALL",
            Op::Ret => "RET",
            Op::RetVal => "RET_VAL",
            Op::Borrow => "BORROW",
            Op::BorrowMut => "BORROW_MUT",
            Op::Deref => "DEREF",
            Op::DerefMut => "DEREF_MUT",
        }
    }

    /// The operand, for opcodes that carry one.
    pub fn operand(&self) -> Option<usize> {
        match self {
            Op::PushI32(n)
            | Op::PushBool(n)
            | Op::PushStr(n)
            | Op::Load(n)
            | Op::Store(n)
            | Op::LoadRef(n)
            | Op::Jmp(n)
            | Op::JmpIf(n)
            | Op::JmpIfNot(n)
            | Op::Call(n) => Some(*n),
            _ => None,
        }
    }

    /// The opcode byte used in the binary image.
    pub fn opcode(&self) -> u8 {
        match self {
            Op::PushI32(_) => 0,
            Op::PushBool(_) => 1,
            Op::PushStr(_) => 2,
            Op::Pop => 3,
            Op::Dup => 4,
            Op::Swap => 5,
            Op::Load(_) => 6,
            Op::Store(_) => 7,
            Op::LoadRef(_) => 8,
            Op::StoreRef => 9,
            Op::AddI32 => 10,
            Op::SubI32 => 11,
            Op::MulI32 => 12,
            Op::DivI32 => 13,
            Op::NegI32 => 14,
            Op::EqI32 => 15,
            Op::NeI32 => 16,
            Op::LtI32 => 17,
            Op::GtI32 => 18,
            Op::LeI32 => 19,
            Op::GeI32 => 20,
            Op::And => 21,
            Op::Or => 22,
            Op::Not => 23,
            Op::Jmp(_) => 24,
            Op::JmpIf(_) => 25,
            Op::JmpIfNot(_) => 26,
            Op::Call(_) => 27,
            Op::Ret => 28,
            Op::RetVal => 29,
            Op::Borrow => 30,
            Op::BorrowMut => 31,
            Op::Deref => 32,
            Op::DerefMut => 33,
        }
    }

    /// Rebuild an instruction from a mnemonic and optional operand, as
    /// read from a listing line. Returns `None` for unknown mnemonics or
    /// an operand mismatch.
    pub fn from_parts(mnemonic: &str, operand: Option<usize>) -> Option<Op> {
        let op = match (mnemonic, operand) {
            ("PUSH_I32", Some(n)) => Op::PushI32(n),
            ("PUSH_BOOL", Some(n)) => Op::PushBool(n),
            ("PUSH_STR", Some(n)) => Op::PushStr(n),
            ("POP", None) => Op::Pop,
            ("DUP", None) => Op::Dup,
            ("SWAP", None) => Op::Swap,
            ("LOAD", Some(n)) => Op::Load(n),
            ("STORE", Some(n)) => Op::Store(n),
            ("LOAD_REF", Some(n)) => Op::LoadRef(n),
            ("STORE_REF", None) => Op::StoreRef,
            ("ADD_I32", None) => Op::AddI32,
            ("SUB_I32", None) => Op::SubI32,
            ("MUL_I32", None) => Op::MulI32,
            ("DIV_I32", None) => Op::DivI32,
            ("NEG_I32", None) => Op::NegI32,
            ("EQ_I32", None) => Op::EqI32,
            ("NE_I32", None) => Op::NeI32,
            ("LT_I32", None) => Op::LtI32,
            ("GT_I32", None) => Op::GtI32,
            ("LE_I32", None) => Op::LeI32,
            ("GE_I32", None) => Op::GeI32,
            ("AND", None) => Op::And,
            ("OR", None) => Op::Or,
            ("NOT", None) => Op::Not,
            ("JMP", Some(n)) => Op::Jmp(n),
            ("JMP_IF", Some(n)) => Op::JmpIf(n),
            ("JMP_IF_NOT", Some(n)) => Op::JmpIfNot(n),
            ("CALL", Some(n)) => Op::Call(n),
            ("RET", None) => Op::Ret,
            ("RET_VAL", None) => Op::RetVal,
            ("BORROW", None) => Op::Borrow,
            ("BORROW_MUT", None) => Op::BorrowMut,
            ("DEREF", None) => Op::Deref,
            ("DEREF_MUT", None) => Op::DerefMut,
            _ => return None,
        };
        Some(op)
    }
}

impl fmt::Display for Op {
    /// Renders exactly one listing line: `MNEMONIC` or `MNEMONIC operand`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand() {
            Some(n) => write!(f, "{} {}", self.mnemonic(), n),
            None => write!(f, "{}", self.mnemonic()),
        }
    }
}
