// nova - Compiler driver for the Nova programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Command-line driver: parses, type checks, and compiles one source
//! file, then writes the assembly listing (`.ns`) and binary image
//! (`.no`) next to it. Nothing is written unless compilation succeeds.

use std::env;
use std::fs;
use std::path::Path;
use std::process;

use nova_bytecode::Compiler;
use nova_parser::Parser;
use nova_typeck::TypeChecker;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <source_file>", args[0]);
        process::exit(1);
    }

    if let Err(e) = compile_file(&args[1]) {
        eprintln!("{}", e);
        process::exit(1);
    }
}

/// Compile a single source file and write both output files.
fn compile_file(file_path: &str) -> Result<(), String> {
    let source = fs::read_to_string(file_path)
        .map_err(|e| format!("Failed to open file: {}: {}", file_path, e))?;

    let mut program = Parser::parse_str(&source).map_err(|e| e.to_string())?;

    let mut checker = TypeChecker::new();
    if !checker.check_program(&mut program) {
        // The individual errors were already echoed to stderr.
        return Err("Type checking failed".to_string());
    }

    let compiled = Compiler::new()
        .compile(&program)
        .map_err(|e| e.to_string())?;

    let asm_path = Path::new(file_path).with_extension("ns");
    fs::write(&asm_path, compiled.chunk.listing())
        .map_err(|e| format!("Failed to write {}: {}", asm_path.display(), e))?;

    let image_path = Path::new(file_path).with_extension("no");
    fs::write(&image_path, compiled.chunk.encode())
        .map_err(|e| format!("Failed to write {}: {}", image_path.display(), e))?;

    Ok(())
}
