// nova-bytecode - AST to bytecode lowering
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Lowers a type-checked program to stack-machine instructions.
//!
//! Two passes: first every top-level function is registered in the
//! function table (so forward calls resolve), then bodies are lowered in
//! declaration order. Jump operands are absolute instruction indices,
//! patched forward once the target is known.

use std::collections::HashMap;
use std::fmt;

use nova_parser::{BinOp, Expr, ExprKind, FunctionDecl, Item, Program, Stmt, StmtKind, UnOp};

use crate::chunk::Chunk;
use crate::function_table::FunctionTable;
use crate::opcode::Op;

/// Error during lowering.
///
/// Every variant is an invariant violation: a program that passed the
/// type checker cannot trigger one.
#[derive(Debug, Clone)]
pub enum CompileError {
    /// A name with no local slot.
    UndefinedVariable(String),
    /// Assignment whose target is not an identifier.
    InvalidAssignmentTarget,
    /// Call whose callee is not an identifier.
    InvalidCallee,
    /// Call to a function missing from the function table.
    UnknownFunction(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UndefinedVariable(name) => {
                write!(f, "Undefined variable: {}", name)
            }
            CompileError::InvalidAssignmentTarget => {
                write!(f, "Assignment target must be an identifier")
            }
            CompileError::InvalidCallee => {
                write!(f, "Function callee must be an identifier")
            }
            CompileError::UnknownFunction(name) => {
                write!(f, "Function not found: {}", name)
            }
        }
    }
}

impl std::error::Error for CompileError {}

/// Result type for lowering.
pub type Result<T> = std::result::Result<T, CompileError>;

/// The complete output of compilation: the instruction stream with its
/// string pool, and the function table.
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    pub chunk: Chunk,
    pub functions: FunctionTable,
}

/// The bytecode compiler. One instance compiles one program.
#[derive(Default)]
pub struct Compiler {
    chunk: Chunk,
    functions: FunctionTable,

    /// Local slot assignment for the function being compiled. Slots are
    /// handed out sequentially and never reused; a re-declaration of the
    /// same name keeps its existing slot.
    locals: HashMap<String, usize>,
    next_local: usize,
}

impl Compiler {
    pub fn new() -> Self {
        Compiler {
            chunk: Chunk::new(),
            functions: FunctionTable::new(),
            locals: HashMap::new(),
            next_local: 0,
        }
    }

    /// Compile a type-checked program.
    pub fn compile(mut self, program: &Program) -> Result<CompiledProgram> {
        // Pass 1: register every function so forward calls resolve.
        for item in &program.items {
            let Item::Function(func) = item;
            self.functions.add(func, 0);
        }

        // Pass 2: lower bodies, recording the real entry points.
        for item in &program.items {
            let Item::Function(func) = item;
            let entry_point = self.chunk.position();
            self.compile_function(func)?;

            let index = self
                .functions
                .index_of(&func.name)
                .ok_or_else(|| CompileError::UnknownFunction(func.name.clone()))?;
            let info = self
                .functions
                .get_mut(index)
                .ok_or_else(|| CompileError::UnknownFunction(func.name.clone()))?;
            info.entry_point = entry_point;
            info.num_locals = self.next_local;
        }

        Ok(CompiledProgram {
            chunk: self.chunk,
            functions: self.functions,
        })
    }

    fn compile_function(&mut self, func: &FunctionDecl) -> Result<()> {
        self.locals.clear();
        self.next_local = 0;

        // Parameters take the first slots in declaration order.
        for param in &func.params {
            self.locals.insert(param.name.clone(), self.next_local);
            self.next_local += 1;
        }

        self.compile_stmt(&func.body)?;

        // Fall off the end with a plain return unless the body already
        // returned a value.
        if !matches!(self.chunk.code.last(), Some(Op::RetVal)) {
            self.chunk.emit(Op::Ret);
        }

        Ok(())
    }

    fn compile_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match &stmt.kind {
            StmtKind::Let { name, init, .. } => {
                self.compile_expr(init)?;

                if !self.locals.contains_key(name) {
                    self.locals.insert(name.clone(), self.next_local);
                    self.next_local += 1;
                }

                let index = self.local_index(name)?;
                self.chunk.emit(Op::Store(index));
                Ok(())
            }

            StmtKind::Expr(expr) => {
                self.compile_expr(expr)?;
                // The statement's value is discarded, block-final or not.
                self.chunk.emit(Op::Pop);
                Ok(())
            }

            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.compile_expr(cond)?;
                let else_jump = self.emit_jump(Op::JmpIfNot(0));

                self.compile_stmt(then_branch)?;

                if let Some(else_branch) = else_branch {
                    let end_jump = self.emit_jump(Op::Jmp(0));

                    let else_target = self.chunk.position();
                    self.chunk.patch_jump(else_jump, else_target);

                    self.compile_stmt(else_branch)?;

                    let end_target = self.chunk.position();
                    self.chunk.patch_jump(end_jump, end_target);
                } else {
                    let end_target = self.chunk.position();
                    self.chunk.patch_jump(else_jump, end_target);
                }
                Ok(())
            }

            StmtKind::While { cond, body } => {
                let loop_start = self.chunk.position();

                self.compile_expr(cond)?;
                let exit_jump = self.emit_jump(Op::JmpIfNot(0));

                self.compile_stmt(body)?;
                self.chunk.emit(Op::Jmp(loop_start));

                let exit_target = self.chunk.position();
                self.chunk.patch_jump(exit_jump, exit_target);
                Ok(())
            }

            StmtKind::Block(stmts) => {
                for stmt in stmts {
                    self.compile_stmt(stmt)?;
                }
                Ok(())
            }
        }
    }

    fn compile_expr(&mut self, expr: &Expr) -> Result<()> {
        match &expr.kind {
            ExprKind::Int(value) => {
                // Bit-preserving widening: negatives wrap to large
                // unsigned operands.
                self.chunk.emit(Op::PushI32(*value as usize));
                Ok(())
            }

            ExprKind::Bool(value) => {
                self.chunk.emit(Op::PushBool(*value as usize));
                Ok(())
            }

            ExprKind::Str(value) => {
                let index = self.chunk.add_string(value);
                self.chunk.emit(Op::PushStr(index));
                Ok(())
            }

            ExprKind::Ident { name, .. } => {
                let index = self.local_index(name)?;
                self.chunk.emit(Op::Load(index));
                Ok(())
            }

            ExprKind::Binary {
                op: BinOp::Assign,
                lhs,
                rhs,
            } => {
                self.compile_expr(rhs)?;

                let name = match &lhs.kind {
                    ExprKind::Ident { name, .. } => name,
                    _ => return Err(CompileError::InvalidAssignmentTarget),
                };

                let index = self.local_index(name)?;
                self.chunk.emit(Op::Store(index));
                // Load the value back so the assignment is an r-value.
                self.chunk.emit(Op::Load(index));
                Ok(())
            }

            ExprKind::Binary { op, lhs, rhs } => {
                self.compile_expr(lhs)?;
                self.compile_expr(rhs)?;

                let op = match op {
                    BinOp::Add => Op::AddI32,
                    BinOp::Sub => Op::SubI32,
                    BinOp::Mul => Op::MulI32,
                    BinOp::Div => Op::DivI32,
                    BinOp::Eq => Op::EqI32,
                    BinOp::Ne => Op::NeI32,
                    BinOp::Lt => Op::LtI32,
                    BinOp::Gt => Op::GtI32,
                    BinOp::Le => Op::LeI32,
                    BinOp::Ge => Op::GeI32,
                    BinOp::And => Op::And,
                    BinOp::Or => Op::Or,
                    BinOp::Assign => unreachable!("assignment handled above"),
                };
                self.chunk.emit(op);
                Ok(())
            }

            ExprKind::Unary { op, operand } => {
                self.compile_expr(operand)?;
                match op {
                    UnOp::Neg => self.chunk.emit(Op::NegI32),
                    UnOp::Not => self.chunk.emit(Op::Not),
                }
                Ok(())
            }

            ExprKind::Borrow { is_mut, operand } => {
                self.compile_expr(operand)?;
                if *is_mut {
                    self.chunk.emit(Op::BorrowMut);
                } else {
                    self.chunk.emit(Op::Borrow);
                }
                Ok(())
            }

            ExprKind::Call { callee, args } => {
                // Arguments are pushed rightmost first.
                for arg in args.iter().rev() {
                    self.compile_expr(arg)?;
                }

                let name = match &callee.kind {
                    ExprKind::Ident { name, .. } => name,
                    _ => return Err(CompileError::InvalidCallee),
                };

                let index = self
                    .functions
                    .index_of(name)
                    .ok_or_else(|| CompileError::UnknownFunction(name.clone()))?;
                self.chunk.emit(Op::Call(index));
                Ok(())
            }
        }
    }

    /// Emit a jump with a placeholder target, returning its index for
    /// patching.
    fn emit_jump(&mut self, op: Op) -> usize {
        let at = self.chunk.position();
        self.chunk.emit(op);
        at
    }

    fn local_index(&self, name: &str) -> Result<usize> {
        self.locals
            .get(name)
            .copied()
            .ok_or_else(|| CompileError::UndefinedVariable(name.to_string()))
    }
}
