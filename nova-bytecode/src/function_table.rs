// nova-bytecode - Function dispatch table
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The function table: one entry per top-level function, indexed in
//! declaration order. `CALL` operands are indices into this table.

use std::collections::HashMap;

use nova_parser::{FunctionDecl, Type};

/// Metadata for one compiled function.
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    /// Instruction index where the function's code starts.
    pub entry_point: usize,

    /// Number of parameters (they occupy the first local slots).
    pub num_params: usize,

    /// Total local slots, parameters included. Filled in after the body
    /// is compiled.
    pub num_locals: usize,

    pub return_type: Type,
    pub param_types: Vec<Type>,

    /// Function name, kept for diagnostics and lookup.
    pub name: String,
}

/// Ordered table of the program's functions with name lookup.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    functions: Vec<FunctionInfo>,
    by_name: HashMap<String, usize>,
}

impl FunctionTable {
    pub fn new() -> Self {
        FunctionTable {
            functions: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Register a function and return its index.
    pub fn add(&mut self, func: &FunctionDecl, entry_point: usize) -> usize {
        let info = FunctionInfo {
            entry_point,
            num_params: func.params.len(),
            num_locals: 0,
            return_type: func.return_type.clone(),
            param_types: func.params.iter().map(|p| p.ty.clone()).collect(),
            name: func.name.clone(),
        };

        let index = self.functions.len();
        self.functions.push(info);
        self.by_name.insert(func.name.clone(), index);
        index
    }

    pub fn get(&self, index: usize) -> Option<&FunctionInfo> {
        self.functions.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut FunctionInfo> {
        self.functions.get_mut(index)
    }

    /// Look up a function's index by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionInfo> {
        self.functions.iter()
    }
}
