// nova-typeck - Type and borrow checker for Nova
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The type and borrow checker.
//!
//! Walks the program annotating every expression with its inferred type,
//! resolving identifiers against the scope stack and the top-level
//! function namespace, and enforcing the single-active-mutable-borrow
//! rule. Errors are accumulated (and echoed to stderr as they are found);
//! the walk of a function stops at its first error, then moves on to the
//! next function.

use std::collections::HashMap;

use nova_parser::{
    BinOp, Expr, ExprKind, FunctionDecl, Item, Program, Stmt, StmtKind, Type, TypeKind, UnOp,
};

use crate::env::Env;
use crate::error::TypeError;

/// Signature of a top-level function, collected before the walk so
/// forward references resolve.
#[derive(Debug, Clone)]
struct FnSig {
    params: Vec<Type>,
    return_type: Type,
}

/// The type checker. One instance checks one program.
#[derive(Default)]
pub struct TypeChecker {
    env: Env,
    functions: HashMap<String, FnSig>,
    errors: Vec<TypeError>,
}

impl TypeChecker {
    pub fn new() -> Self {
        TypeChecker {
            env: Env::new(),
            functions: HashMap::new(),
            errors: Vec::new(),
        }
    }

    /// Check a whole program. Returns `true` when no errors were
    /// recorded. Expression type slots are filled in as a side effect.
    pub fn check_program(&mut self, program: &mut Program) -> bool {
        for item in &program.items {
            let Item::Function(func) = item;
            // First declaration wins on duplicate names.
            self.functions
                .entry(func.name.clone())
                .or_insert_with(|| FnSig {
                    params: func.params.iter().map(|p| p.ty.clone()).collect(),
                    return_type: func.return_type.clone(),
                });
        }

        for item in &mut program.items {
            let Item::Function(func) = item;
            self.check_function(func);
        }

        !self.has_errors()
    }

    pub fn errors(&self) -> &[TypeError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn check_function(&mut self, func: &mut FunctionDecl) -> bool {
        self.env.enter();
        let ok = self.check_function_body(func);
        self.env.exit();
        ok
    }

    fn check_function_body(&mut self, func: &mut FunctionDecl) -> bool {
        for param in &func.params {
            if !self.env.declare(&param.name, param.ty.clone(), param.is_mut) {
                self.error(
                    format!("Duplicate parameter name: {}", param.name),
                    param.span,
                );
                return false;
            }
        }

        if !self.check_stmt(&mut func.body) {
            return false;
        }

        // The block-final expression statement doubles as the return
        // value; its inferred type must fit the declared return type.
        // Any other trailing statement shape goes unchecked.
        if let StmtKind::Block(stmts) = &func.body.kind {
            if let Some(last) = stmts.last() {
                if let StmtKind::Expr(expr) = &last.kind {
                    let fits = expr
                        .ty
                        .as_ref()
                        .is_some_and(|ty| assignable(&func.return_type, ty));
                    if !fits {
                        self.error("Function return type mismatch", last.span);
                        return false;
                    }
                }
            }
        }

        true
    }

    fn check_stmt(&mut self, stmt: &mut Stmt) -> bool {
        let span = stmt.span;
        match &mut stmt.kind {
            StmtKind::Let {
                is_mut,
                name,
                ty,
                init,
            } => {
                if !self.check_expr(init) {
                    return false;
                }

                let fits = init
                    .ty
                    .as_ref()
                    .is_some_and(|init_ty| assignable(ty, init_ty));
                if !fits {
                    self.error("Type mismatch in let binding", span);
                    return false;
                }

                let is_mut = *is_mut;
                let declared = ty.clone();
                let name = name.clone();
                if !self.env.declare(&name, declared, is_mut) {
                    self.error(format!("Duplicate variable name: {}", name), span);
                    return false;
                }
                true
            }

            StmtKind::Expr(expr) => self.check_expr(expr),

            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if !self.check_expr(cond) {
                    return false;
                }
                if !matches!(
                    cond.ty.as_ref().map(|t| &t.kind),
                    Some(TypeKind::Bool)
                ) {
                    self.error("If condition must be boolean", cond.span);
                    return false;
                }

                self.env.enter();
                let then_ok = self.check_stmt(then_branch);
                self.env.exit();

                if let Some(else_branch) = else_branch {
                    self.env.enter();
                    let else_ok = self.check_stmt(else_branch);
                    self.env.exit();
                    return then_ok && else_ok;
                }

                then_ok
            }

            StmtKind::While { cond, body } => {
                if !self.check_expr(cond) {
                    return false;
                }
                if !matches!(
                    cond.ty.as_ref().map(|t| &t.kind),
                    Some(TypeKind::Bool)
                ) {
                    self.error("While condition must be boolean", cond.span);
                    return false;
                }

                self.env.enter();
                let ok = self.check_stmt(body);
                self.env.exit();
                ok
            }

            StmtKind::Block(stmts) => {
                self.env.enter();
                for stmt in stmts {
                    if !self.check_stmt(stmt) {
                        self.env.exit();
                        return false;
                    }
                }
                self.env.exit();
                true
            }
        }
    }

    fn check_expr(&mut self, expr: &mut Expr) -> bool {
        let span = expr.span;
        match &mut expr.kind {
            ExprKind::Int(_) => {
                expr.ty = Some(Type::new(TypeKind::I32, span));
                true
            }
            ExprKind::Bool(_) => {
                expr.ty = Some(Type::new(TypeKind::Bool, span));
                true
            }
            ExprKind::Str(_) => {
                expr.ty = Some(Type::new(TypeKind::Str, span));
                true
            }

            ExprKind::Ident {
                name,
                is_mut_binding,
            } => {
                // A top-level function name is accepted here but gets no
                // type; it is only usable as a call's callee, and any
                // other use trips a downstream "invalid operand" error.
                if self.functions.contains_key(name.as_str()) {
                    return true;
                }

                match self.env.lookup(name) {
                    Some(info) => {
                        *is_mut_binding = info.is_mut;
                        let mut ty = info.ty;
                        ty.span = span;
                        expr.ty = Some(ty);
                        true
                    }
                    None => {
                        let msg = format!("Undefined variable: {}", name);
                        self.error(msg, span);
                        false
                    }
                }
            }

            ExprKind::Binary { op: BinOp::Assign, lhs, rhs } => {
                let name = match &lhs.kind {
                    ExprKind::Ident { name, .. } => name.clone(),
                    _ => {
                        self.error("Left side of assignment must be an identifier", span);
                        return false;
                    }
                };

                let info = match self.env.lookup(&name) {
                    Some(info) => info,
                    None => {
                        self.error(format!("Undefined variable: {}", name), span);
                        return false;
                    }
                };

                if info.ty.is_mut_ref() {
                    self.error(
                        format!("Cannot use variable while mutably borrowed: {}", name),
                        span,
                    );
                    return false;
                }
                if !info.is_mut {
                    self.error(
                        format!("Cannot assign to immutable variable: {}", name),
                        span,
                    );
                    return false;
                }

                if !self.check_expr(rhs) {
                    return false;
                }

                match &rhs.ty {
                    Some(rhs_ty) if assignable(&info.ty, rhs_ty) => {
                        expr.ty = Some(rhs_ty.clone());
                        true
                    }
                    _ => {
                        self.error("Type mismatch in assignment", span);
                        false
                    }
                }
            }

            ExprKind::Binary { op, lhs, rhs } => {
                let op = *op;
                if !self.check_expr(lhs) || !self.check_expr(rhs) {
                    return false;
                }

                // Either operand may be a bare function name with no type.
                let (lhs_ty, rhs_ty) = match (&lhs.ty, &rhs.ty) {
                    (Some(l), Some(r)) => (l, r),
                    _ => {
                        self.error("Invalid operands in binary expression", span);
                        return false;
                    }
                };

                match op {
                    BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
                        if lhs_ty.kind != TypeKind::I32 || rhs_ty.kind != TypeKind::I32 {
                            self.error("Arithmetic operations require integer operands", span);
                            return false;
                        }
                        expr.ty = Some(Type::new(TypeKind::I32, span));
                    }
                    BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
                        if !compatible(lhs_ty, rhs_ty) {
                            self.error("Incompatible types in comparison", span);
                            return false;
                        }
                        expr.ty = Some(Type::new(TypeKind::Bool, span));
                    }
                    BinOp::And | BinOp::Or => {
                        if lhs_ty.kind != TypeKind::Bool || rhs_ty.kind != TypeKind::Bool {
                            self.error("Logical operations require boolean operands", span);
                            return false;
                        }
                        expr.ty = Some(Type::new(TypeKind::Bool, span));
                    }
                    BinOp::Assign => unreachable!("assignment handled above"),
                }
                true
            }

            ExprKind::Unary { op, operand } => {
                let op = *op;
                if !self.check_expr(operand) {
                    return false;
                }

                let operand_ty = match &operand.ty {
                    Some(ty) => ty,
                    None => {
                        self.error("Invalid operand in unary expression", span);
                        return false;
                    }
                };

                match op {
                    UnOp::Neg => {
                        if operand_ty.kind != TypeKind::I32 {
                            self.error("Negation requires integer operand", span);
                            return false;
                        }
                        expr.ty = Some(Type::new(TypeKind::I32, span));
                    }
                    UnOp::Not => {
                        if operand_ty.kind != TypeKind::Bool {
                            self.error("Logical not requires boolean operand", span);
                            return false;
                        }
                        expr.ty = Some(Type::new(TypeKind::Bool, span));
                    }
                }
                true
            }

            ExprKind::Borrow { is_mut, operand } => {
                let is_mut = *is_mut;
                if !self.check_expr(operand) {
                    return false;
                }

                let base = match &operand.ty {
                    Some(ty) => ty.clone(),
                    None => {
                        self.error("Invalid operand in borrow expression", span);
                        return false;
                    }
                };

                // Borrow discipline only applies when the operand is a
                // plain variable; borrowing any other expression mutably
                // is waved through.
                if is_mut {
                    if let ExprKind::Ident {
                        name,
                        is_mut_binding,
                    } = &operand.kind
                    {
                        if !*is_mut_binding {
                            self.error("Cannot borrow immutable variable as mutable", span);
                            return false;
                        }

                        if let Some(info) = self.env.lookup(name) {
                            if info.ty.is_mut_ref() {
                                self.error(
                                    format!("Variable already mutably borrowed: {}", name),
                                    span,
                                );
                                return false;
                            }
                            self.env.mark_mut_borrowed(name, span);
                        }
                    }
                }

                let kind = if is_mut {
                    TypeKind::MutRef(Box::new(base))
                } else {
                    TypeKind::Ref(Box::new(base))
                };
                expr.ty = Some(Type::new(kind, span));
                true
            }

            ExprKind::Call { callee, args } => {
                if !self.check_expr(callee) {
                    return false;
                }

                let name = match &callee.kind {
                    ExprKind::Ident { name, .. } => name.clone(),
                    _ => {
                        self.error("Function call requires a function name", span);
                        return false;
                    }
                };

                let sig = match self.functions.get(&name) {
                    Some(sig) => sig.clone(),
                    None => {
                        self.error(format!("Undefined function: {}", name), span);
                        return false;
                    }
                };

                if args.len() != sig.params.len() {
                    self.error(
                        format!("Wrong number of arguments for function {}", name),
                        span,
                    );
                    return false;
                }

                for (i, arg) in args.iter_mut().enumerate() {
                    if !self.check_expr(arg) {
                        return false;
                    }

                    let arg_ty = match &arg.ty {
                        Some(ty) => ty,
                        None => {
                            self.error("Invalid argument in function call", span);
                            return false;
                        }
                    };

                    if !assignable(&sig.params[i], arg_ty) {
                        self.error(
                            format!(
                                "Type mismatch in argument {} of function {}",
                                i + 1,
                                name
                            ),
                            arg.span,
                        );
                        return false;
                    }
                }

                let mut ty = sig.return_type;
                ty.span = span;
                expr.ty = Some(ty);
                true
            }
        }
    }

    fn error(&mut self, message: impl Into<String>, span: nova_parser::Span) {
        let err = TypeError::new(message, span);
        eprintln!("{}", err);
        self.errors.push(err);
    }
}

/// Whether `source` can be stored into a slot of type `target`.
/// A mutable borrow weakens to a shared one; nothing else converts.
pub fn assignable(target: &Type, source: &Type) -> bool {
    match (&target.kind, &source.kind) {
        (TypeKind::I32, TypeKind::I32)
        | (TypeKind::Bool, TypeKind::Bool)
        | (TypeKind::Str, TypeKind::Str) => true,
        (TypeKind::Ref(t), TypeKind::Ref(s)) => assignable(t, s),
        (TypeKind::MutRef(t), TypeKind::MutRef(s)) => assignable(t, s),
        (TypeKind::Ref(t), TypeKind::MutRef(s)) => assignable(t, s),
        _ => false,
    }
}

/// Whether two types may be compared. `&T` and `&mut T` are comparable
/// in either order.
pub fn compatible(lhs: &Type, rhs: &Type) -> bool {
    match (&lhs.kind, &rhs.kind) {
        (TypeKind::I32, TypeKind::I32)
        | (TypeKind::Bool, TypeKind::Bool)
        | (TypeKind::Str, TypeKind::Str) => true,
        (TypeKind::Ref(l), TypeKind::Ref(r)) => compatible(l, r),
        (TypeKind::MutRef(l), TypeKind::MutRef(r)) => compatible(l, r),
        (TypeKind::Ref(l), TypeKind::MutRef(r)) => compatible(l, r),
        (TypeKind::MutRef(l), TypeKind::Ref(r)) => compatible(l, r),
        _ => false,
    }
}
