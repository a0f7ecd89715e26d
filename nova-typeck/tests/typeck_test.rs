// nova-typeck - Type checking tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

use nova_parser::Parser;
use nova_typeck::TypeChecker;

/// Check a source string, returning success and the rendered errors.
fn check(src: &str) -> (bool, Vec<String>) {
    let mut program = Parser::parse_str(src).expect("parse error");
    let mut checker = TypeChecker::new();
    let ok = checker.check_program(&mut program);
    let errors = checker.errors().iter().map(|e| e.to_string()).collect();
    (ok, errors)
}

fn assert_checks(src: &str) {
    let (ok, errors) = check(src);
    assert!(ok, "expected success, got errors: {:?}", errors);
}

/// Check a failing program and return its error messages.
fn check_errors(src: &str) -> Vec<String> {
    let (ok, errors) = check(src);
    assert!(!ok, "expected type errors, but checking succeeded");
    assert!(!errors.is_empty());
    errors
}

#[test]
fn test_basic_types() {
    assert_checks(
        r#"
        fn main() {
            let x: i32 = 42;
            let y: bool = true;
            let z: str = "hello";
        }
    "#,
    );
}

#[test]
fn test_let_type_mismatch() {
    let errors = check_errors("fn main() { let x: i32 = true; }");
    assert!(errors[0].contains("Type mismatch in let binding"), "{:?}", errors);
}

#[test]
fn test_arithmetic() {
    assert_checks("fn main() { let x: i32 = 1 + 2 * 3 - 4 / 5; }");
}

#[test]
fn test_invalid_arithmetic() {
    let errors = check_errors("fn main() { let x: i32 = true + 42; }");
    assert!(
        errors[0].contains("Arithmetic operations require integer operands"),
        "{:?}",
        errors
    );
}

#[test]
fn test_logical_operators() {
    assert_checks("fn main() { let a: bool = true && false || true; }");

    let errors = check_errors("fn main() { let a: bool = 1 && true; }");
    assert!(
        errors[0].contains("Logical operations require boolean operands"),
        "{:?}",
        errors
    );
}

#[test]
fn test_unary_operators() {
    assert_checks("fn main() { let a: i32 = -5; let b: bool = !false; }");

    let errors = check_errors("fn main() { let a: i32 = -true; }");
    assert!(errors[0].contains("Negation requires integer operand"), "{:?}", errors);

    let errors = check_errors("fn main() { let a: bool = !3; }");
    assert!(
        errors[0].contains("Logical not requires boolean operand"),
        "{:?}",
        errors
    );
}

#[test]
fn test_comparison_produces_bool() {
    assert_checks("fn main() { let a: bool = 1 < 2; let b: bool = 3 == 3; }");

    let errors = check_errors("fn main() { let a: bool = 1 == true; }");
    assert!(errors[0].contains("Incompatible types in comparison"), "{:?}", errors);
}

#[test]
fn test_shared_and_mutable_references_compare() {
    // &T and &mut T are comparable in either order.
    assert_checks(
        r#"
        fn main() {
            let mut x: i32 = 1;
            let y: i32 = 2;
            let m: &mut i32 = &mut x;
            let r: &i32 = &y;
            let same: bool = m == r;
        }
    "#,
    );
}

#[test]
fn test_undefined_variable() {
    let errors = check_errors("fn main() { let x: i32 = y; }");
    assert!(errors[0].contains("Undefined variable: y"), "{:?}", errors);
}

#[test]
fn test_duplicate_variable_in_scope() {
    let errors = check_errors("fn main() { let x: i32 = 1; let x: i32 = 2; }");
    assert!(errors[0].contains("Duplicate variable name: x"), "{:?}", errors);
}

#[test]
fn test_shadowing_in_inner_scope() {
    assert_checks(
        r#"
        fn main() {
            let x: i32 = 1;
            if true {
                let x: bool = false;
                let y: bool = x;
            }
            let z: i32 = x;
        }
    "#,
    );
}

#[test]
fn test_duplicate_parameter() {
    let errors = check_errors("fn f(a: i32, a: i32) { 1 }");
    assert!(errors[0].contains("Duplicate parameter name: a"), "{:?}", errors);
}

#[test]
fn test_if_condition_must_be_bool() {
    let errors = check_errors("fn main() { let x: i32 = 42; if x { let y: i32 = 1; } }");
    assert!(errors[0].contains("If condition must be boolean"), "{:?}", errors);
}

#[test]
fn test_while_condition_must_be_bool() {
    let errors = check_errors("fn main() { while 1 { let y: i32 = 1; } }");
    assert!(errors[0].contains("While condition must be boolean"), "{:?}", errors);
}

#[test]
fn test_control_flow() {
    assert_checks(
        r#"
        fn main() {
            let x: i32 = 42;
            if x > 0 {
                let y: i32 = x + 1;
            } else {
                let y: i32 = x - 1;
            }

            let mut i: i32 = 0;
            while i < 10 {
                i = i + 1;
            }
        }
    "#,
    );
}

#[test]
fn test_else_if_chain() {
    assert_checks(
        r#"
        fn main() {
            let x: i32 = 3;
            if x < 1 {
                let a: i32 = 1;
            } else if x < 2 {
                let b: i32 = 2;
            } else {
                let c: i32 = 3;
            }
        }
    "#,
    );
}

#[test]
fn test_assignment() {
    assert_checks("fn main() { let mut x: i32 = 1; x = 2; }");

    let errors = check_errors("fn main() { let x: i32 = 1; x = 2; }");
    assert!(
        errors[0].contains("Cannot assign to immutable variable: x"),
        "{:?}",
        errors
    );
}

#[test]
fn test_assignment_type_mismatch() {
    let errors = check_errors("fn main() { let mut x: i32 = 1; x = true; }");
    assert!(errors[0].contains("Type mismatch in assignment"), "{:?}", errors);
}

#[test]
fn test_chained_assignment() {
    assert_checks("fn main() { let mut x: i32 = 0; let mut y: i32 = 0; x = y = 5; }");
}

#[test]
fn test_function_return() {
    assert_checks(
        r#"
        fn add(x: i32, y: i32) -> i32 {
            x + y
        }

        fn main() {
            let result: i32 = add(1, 2);
        }
    "#,
    );
}

#[test]
fn test_invalid_function_return() {
    let errors = check_errors("fn add(x: i32, y: i32) -> i32 { true }");
    assert!(errors[0].contains("Function return type mismatch"), "{:?}", errors);
}

#[test]
fn test_forward_call() {
    // Functions are registered before bodies are checked, so a call may
    // precede the declaration it targets.
    assert_checks(
        r#"
        fn main() {
            let x: i32 = later(1);
        }

        fn later(n: i32) -> i32 {
            n
        }
    "#,
    );
}

#[test]
fn test_call_of_unknown_name() {
    // The callee identifier fails resolution before any function lookup.
    let errors = check_errors("fn main() { missing(); }");
    assert!(errors[0].contains("Undefined variable: missing"), "{:?}", errors);
}

#[test]
fn test_call_of_variable_is_not_a_function() {
    // A variable resolves as the callee identifier, then fails the
    // function lookup.
    let errors = check_errors("fn main() { let g: i32 = 1; g(); }");
    assert!(errors[0].contains("Undefined function: g"), "{:?}", errors);
}

#[test]
fn test_wrong_argument_count() {
    let errors = check_errors(
        r#"
        fn f(a: i32) -> i32 { a }
        fn main() { let x: i32 = f(1, 2); }
    "#,
    );
    assert!(
        errors[0].contains("Wrong number of arguments for function f"),
        "{:?}",
        errors
    );
}

#[test]
fn test_argument_type_mismatch() {
    let errors = check_errors(
        r#"
        fn f(a: i32, b: bool) -> i32 { a }
        fn main() { let x: i32 = f(1, 2); }
    "#,
    );
    assert!(
        errors[0].contains("Type mismatch in argument 2 of function f"),
        "{:?}",
        errors
    );
}

#[test]
fn test_mutable_argument_weakens_to_shared() {
    // Passing &mut i32 where &i32 is expected is fine.
    assert_checks(
        r#"
        fn read(r: &i32) -> i32 { 1 }
        fn main() {
            let mut x: i32 = 1;
            let y: i32 = read(&mut x);
        }
    "#,
    );
}

#[test]
fn test_function_name_in_expression() {
    // A bare function name gets no type, so using it as an operand
    // surfaces as an invalid-operand error downstream.
    let errors = check_errors(
        r#"
        fn f() -> i32 { 1 }
        fn main() { let x: i32 = f + 1; }
    "#,
    );
    assert!(
        errors[0].contains("Invalid operands in binary expression"),
        "{:?}",
        errors
    );
}

#[test]
fn test_call_through_non_identifier() {
    let errors = check_errors("fn main() { 3(); }");
    assert!(
        errors[0].contains("Function call requires a function name"),
        "{:?}",
        errors
    );
}

#[test]
fn test_errors_continue_across_functions() {
    // The walk stops inside a failing function but still checks the
    // next one, so both errors are reported.
    let errors = check_errors(
        r#"
        fn first() { let x: i32 = true; }
        fn second() { let y: bool = 1; }
    "#,
    );
    assert_eq!(errors.len(), 2, "{:?}", errors);
}

#[test]
fn test_error_carries_span() {
    let errors = check_errors("fn main() { let x: i32 = y; }");
    assert!(errors[0].starts_with("Type error at "), "{:?}", errors);
}
