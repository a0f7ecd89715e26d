// nova-bytecode - Lowering tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

use nova_bytecode::{CompiledProgram, Compiler, Op};
use nova_parser::Parser;
use nova_typeck::TypeChecker;

/// Parse, type check, and compile a source string.
fn compile_source(src: &str) -> CompiledProgram {
    let mut program = Parser::parse_str(src).expect("parse error");
    let mut checker = TypeChecker::new();
    assert!(
        checker.check_program(&mut program),
        "type errors: {:?}",
        checker.errors()
    );
    Compiler::new().compile(&program).expect("compile error")
}

#[test]
fn test_basic_function() {
    let compiled = compile_source("fn main() { let x: i32 = 42; }");
    assert_eq!(
        compiled.chunk.code,
        vec![Op::PushI32(42), Op::Store(0), Op::Ret]
    );
}

#[test]
fn test_arithmetic_expression() {
    let compiled = compile_source("fn main() { let x: i32 = 1 + 2 * 3; }");
    assert_eq!(
        compiled.chunk.code,
        vec![
            Op::PushI32(1),
            Op::PushI32(2),
            Op::PushI32(3),
            Op::MulI32,
            Op::AddI32,
            Op::Store(0),
            Op::Ret,
        ]
    );
}

#[test]
fn test_string_literal() {
    let compiled = compile_source(r#"fn main() { let s: str = "hello"; }"#);
    assert_eq!(
        compiled.chunk.code,
        vec![Op::PushStr(0), Op::Store(0), Op::Ret]
    );
    assert_eq!(compiled.chunk.strings, vec!["hello".to_string()]);
}

#[test]
fn test_while_loop() {
    let compiled = compile_source(
        r#"
        fn main() {
            let mut x: i32 = 10;
            while (x > 0) {
                x = x - 1;
            }
        }
    "#,
    );
    assert_eq!(
        compiled.chunk.code,
        vec![
            Op::PushI32(10),
            Op::Store(0),
            Op::Load(0),
            Op::PushI32(0),
            Op::GtI32,
            Op::JmpIfNot(13),
            Op::Load(0),
            Op::PushI32(1),
            Op::SubI32,
            Op::Store(0),
            Op::Load(0),
            Op::Pop,
            Op::Jmp(2),
            Op::Ret,
        ]
    );
}

#[test]
fn test_if_without_else() {
    let compiled = compile_source(
        r#"
        fn main() {
            let mut x: i32 = 42;
            if (x > 0) {
                x = x + 1;
            }
        }
    "#,
    );
    assert_eq!(
        compiled.chunk.code,
        vec![
            Op::PushI32(42),
            Op::Store(0),
            Op::Load(0),
            Op::PushI32(0),
            Op::GtI32,
            Op::JmpIfNot(12),
            Op::Load(0),
            Op::PushI32(1),
            Op::AddI32,
            Op::Store(0),
            Op::Load(0),
            Op::Pop,
            Op::Ret,
        ]
    );
}

#[test]
fn test_if_else() {
    let compiled = compile_source("fn main() { if true { 1; } else { 2; } }");
    assert_eq!(
        compiled.chunk.code,
        vec![
            Op::PushBool(1),
            Op::JmpIfNot(5),
            Op::PushI32(1),
            Op::Pop,
            Op::Jmp(7),
            Op::PushI32(2),
            Op::Pop,
            Op::Ret,
        ]
    );
}

#[test]
fn test_function_calls() {
    let compiled = compile_source(
        r#"
        fn add(x: i32, y: i32) -> i32 {
            x + y
        }

        fn main() {
            let result: i32 = add(1, 2);
        }
    "#,
    );

    // `add` first: its trailing expression is still popped before RET.
    // `main` pushes arguments rightmost first.
    assert_eq!(
        compiled.chunk.code,
        vec![
            Op::Load(0),
            Op::Load(1),
            Op::AddI32,
            Op::Pop,
            Op::Ret,
            Op::PushI32(2),
            Op::PushI32(1),
            Op::Call(0),
            Op::Store(0),
            Op::Ret,
        ]
    );

    let add = compiled.functions.get(0).unwrap();
    assert_eq!(add.name, "add");
    assert_eq!(add.entry_point, 0);
    assert_eq!(add.num_params, 2);
    assert_eq!(add.num_locals, 2);
    assert_eq!(add.param_types.len(), 2);
    assert_eq!(add.param_types[0].kind, nova_parser::TypeKind::I32);
    assert_eq!(add.return_type.kind, nova_parser::TypeKind::I32);

    let main = compiled.functions.get(1).unwrap();
    assert_eq!(main.name, "main");
    assert_eq!(main.entry_point, 5);
    assert_eq!(main.num_params, 0);
    assert_eq!(main.num_locals, 1);

    assert_eq!(compiled.functions.index_of("add"), Some(0));
    assert_eq!(compiled.functions.index_of("main"), Some(1));

    let names: Vec<&str> = compiled.functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["add", "main"]);
}

#[test]
fn test_references() {
    let compiled = compile_source(
        r#"
        fn main() {
            let mut x: i32 = 42;
            let y: &i32 = &x;
            let z: &mut i32 = &mut x;
        }
    "#,
    );
    assert_eq!(
        compiled.chunk.code,
        vec![
            Op::PushI32(42),
            Op::Store(0),
            Op::Load(0),
            Op::Borrow,
            Op::Store(1),
            Op::Load(0),
            Op::BorrowMut,
            Op::Store(2),
            Op::Ret,
        ]
    );
}

#[test]
fn test_unary_and_logical_lowering() {
    let compiled = compile_source("fn main() { let a: bool = !false && true; let b: i32 = -5; }");
    assert_eq!(
        compiled.chunk.code,
        vec![
            Op::PushBool(0),
            Op::Not,
            Op::PushBool(1),
            Op::And,
            Op::Store(0),
            Op::PushI32(5),
            Op::NegI32,
            Op::Store(1),
            Op::Ret,
        ]
    );
}

#[test]
fn test_forward_call_resolves() {
    let compiled = compile_source(
        r#"
        fn main() {
            later();
        }

        fn later() -> i32 {
            7
        }
    "#,
    );
    // `later` is function index 1 even though `main` lowers first.
    assert_eq!(compiled.chunk.code[0], Op::Call(1));
    assert_eq!(compiled.functions.get(1).unwrap().entry_point, 3);
}

#[test]
fn test_local_slots_never_reused_across_scopes() {
    let compiled = compile_source(
        r#"
        fn main() {
            if true {
                let a: i32 = 1;
            }
            let b: i32 = 2;
        }
    "#,
    );
    // `a` keeps slot 0 even after its scope closes; `b` gets a new slot.
    assert_eq!(
        compiled.chunk.code,
        vec![
            Op::PushBool(1),
            Op::JmpIfNot(4),
            Op::PushI32(1),
            Op::Store(0),
            Op::PushI32(2),
            Op::Store(1),
            Op::Ret,
        ]
    );
    assert_eq!(compiled.functions.get(0).unwrap().num_locals, 2);
}

#[test]
fn test_shadowed_name_reuses_slot() {
    let compiled = compile_source(
        r#"
        fn main() {
            let x: i32 = 1;
            if true {
                let x: bool = true;
            }
        }
    "#,
    );
    // The inner `x` shadows the outer one in the checker, but the
    // compiler keys slots by name, so both land in slot 0.
    assert_eq!(
        compiled.chunk.code,
        vec![
            Op::PushI32(1),
            Op::Store(0),
            Op::PushBool(1),
            Op::JmpIfNot(6),
            Op::PushBool(1),
            Op::Store(0),
            Op::Ret,
        ]
    );
    assert_eq!(compiled.functions.get(0).unwrap().num_locals, 1);
}

#[test]
fn test_assignment_is_an_rvalue() {
    let compiled = compile_source("fn main() { let mut x: i32 = 0; let y: i32 = x = 3; }");
    assert_eq!(
        compiled.chunk.code,
        vec![
            Op::PushI32(0),
            Op::Store(0),
            Op::PushI32(3),
            Op::Store(0),
            Op::Load(0),
            Op::Store(1),
            Op::Ret,
        ]
    );
}

#[test]
fn test_param_slots_in_declaration_order() {
    let compiled = compile_source("fn f(a: i32, b: i32, c: i32) -> i32 { c }");
    assert_eq!(
        compiled.chunk.code,
        vec![Op::Load(2), Op::Pop, Op::Ret]
    );
    let info = compiled.functions.get(0).unwrap();
    assert_eq!(info.num_params, 3);
    assert_eq!(info.num_locals, 3);
}

#[test]
fn test_string_pool_indices_per_occurrence() {
    let compiled = compile_source(
        r#"
        fn main() {
            let a: str = "one";
            let b: str = "two";
            let c: str = "one";
        }
    "#,
    );
    // No deduplication: three literals, three pool entries.
    assert_eq!(
        compiled.chunk.strings,
        vec!["one".to_string(), "two".to_string(), "one".to_string()]
    );
    assert_eq!(compiled.chunk.code[0], Op::PushStr(0));
    assert_eq!(compiled.chunk.code[2], Op::PushStr(1));
    assert_eq!(compiled.chunk.code[4], Op::PushStr(2));
}

#[test]
fn test_empty_program_compiles_to_nothing() {
    let compiled = compile_source("");
    assert!(compiled.chunk.code.is_empty());
    assert!(compiled.functions.is_empty());
}
