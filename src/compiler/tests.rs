//! Unit tests for LLVM code generation.
//!
//! Each test compiles a small program through the front-end, checker and
//! IR builder, then inspects the printed module.

use std::sync::Arc;

use super::{builtins::print_format, compiler::compile_unit};
use crate::{
    ast::types::Type,
    ir::builder::build_unit,
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::type_checker::{type_check, ExportedSignature},
};

fn compile_with_externs(source: &str, externs: &[ExportedSignature]) -> String {
    let tokens = tokenize(source.to_string(), Some("test.py".to_string())).unwrap();
    let program = parse(tokens, Arc::new("test.py".to_string())).unwrap();
    let checked = type_check(&program, externs);
    assert!(checked.diagnostics.is_empty(), "{:?}", checked.diagnostics);

    let unit = build_unit("test", checked).unwrap();
    compile_unit(&unit).unwrap()
}

fn compile(source: &str) -> String {
    compile_with_externs(source, &[])
}

#[test]
fn test_codegen_add_function_and_call() {
    let ir = compile("def add(a: int, b: int) -> int:\n    return a + b\nprint(add(42, 24))\n");

    assert!(ir.contains("define i64 @add(i64 %a, i64 %b)"), "{}", ir);
    assert_eq!(ir.matches("= add i64").count(), 1, "{}", ir);
    assert_eq!(ir.matches("call i64 @add(i64 42, i64 24)").count(), 1, "{}", ir);
    assert!(ir.contains("define i32 @main()"), "{}", ir);
    assert!(ir.contains("ret i32 0"), "{}", ir);
}

#[test]
fn test_codegen_is_deterministic() {
    let source = "def f(x: float) -> float:\n    return x * 2\nprint(f(1.5))\nprint(\"done\")\n";
    assert_eq!(compile(source), compile(source));
}

#[test]
fn test_codegen_has_no_target_triple() {
    let ir = compile("print(1)\n");
    assert!(!ir.contains("target triple"), "{}", ir);
}

#[test]
fn test_codegen_function_attributes() {
    let ir = compile("def f() -> None:\n    pass\n");

    assert!(ir.contains("define void @f()"), "{}", ir);
    assert!(ir.contains("nounwind"), "{}", ir);
    assert!(ir.contains("uwtable"), "{}", ir);
}

#[test]
fn test_codegen_print_formats() {
    let ir = compile("print(1)\nprint(2.5)\nprint(\"hi\")\nprint()\n");

    assert!(ir.contains("declare i32 @printf(i8*, ...)"), "{}", ir);
    assert!(ir.contains(r#"c"%lld\0A\00""#), "{}", ir);
    assert!(ir.contains(r#"c"%g\0A\00""#), "{}", ir);
    assert!(ir.contains(r#"c"%s\0A\00""#), "{}", ir);
    assert!(ir.contains(r#"c"hi\00""#), "{}", ir);
    assert!(ir.contains(r#"c"\0A\00""#), "{}", ir);
    assert_eq!(ir.matches("call i32 (i8*, ...) @printf").count(), 4, "{}", ir);
}

// Floats go through C's `%g`: six significant digits and no trailing `.0`,
// so `print(3.0)` writes `3` and `print(0.1)` writes `0.1`.
#[test]
fn test_codegen_print_float_uses_percent_g() {
    assert_eq!(print_format(&Type::Float), Some("%g\n"));
    assert_eq!(print_format(&Type::Int), Some("%lld\n"));
    assert_eq!(print_format(&Type::Unit), None);

    let ir = compile("print(3.0)\n");
    assert!(ir.contains(r#"c"%g\0A\00""#), "{}", ir);
    assert!(ir.contains("double 3.000000e+00)"), "{}", ir);
    assert!(!ir.contains("%.1f"), "{}", ir);
}

#[test]
fn test_codegen_print_bool_selects_text() {
    let ir = compile("def f(a: int) -> None:\n    print(a < 2)\n");

    assert!(ir.contains(r#"c"True\00""#), "{}", ir);
    assert!(ir.contains(r#"c"False\00""#), "{}", ir);
    assert!(ir.contains("select i1"), "{}", ir);
}

#[test]
fn test_codegen_string_literals_are_shared() {
    let ir = compile("print(\"same\")\nprint(\"same\")\n");
    assert_eq!(ir.matches(r#"c"same\00""#).count(), 1, "{}", ir);
}

#[test]
fn test_codegen_return_widens_int() {
    let ir = compile("def f(a: int) -> float:\n    return a\n");

    assert!(ir.contains("define double @f(i64 %a)"), "{}", ir);
    assert!(ir.contains("sitofp i64"), "{}", ir);
}

#[test]
fn test_codegen_integer_floor_division() {
    let ir = compile("def f(a: int, b: int) -> int:\n    return a // b + a % b\n");

    assert!(ir.contains("sdiv i64"), "{}", ir);
    assert!(ir.contains("srem i64"), "{}", ir);
}

#[test]
fn test_codegen_float_floor_division() {
    let ir = compile("def f(a: float, b: float) -> float:\n    return a // b\n");
    assert!(ir.contains("@llvm.floor.f64"), "{}", ir);
}

#[test]
fn test_codegen_true_division_is_float() {
    let ir = compile("def f(a: int, b: int) -> float:\n    return a / b\n");

    assert!(ir.contains("fdiv double"), "{}", ir);
    assert!(!ir.contains("sdiv"), "{}", ir);
}

#[test]
fn test_codegen_control_flow_labels() {
    let source = "def f(n: int) -> int:\n    i = 0\n    while i < n:\n        if i == 3:\n            return i\n        i += 1\n    return n\n";
    let ir = compile(source);

    assert!(ir.contains("while.cond"), "{}", ir);
    assert!(ir.contains("while.body"), "{}", ir);
    assert!(ir.contains("br i1"), "{}", ir);
}

#[test]
fn test_codegen_short_circuit() {
    let ir = compile("def f(a: bool, b: bool) -> bool:\n    return a or b\n");

    assert!(ir.contains("or.rhs"), "{}", ir);
    assert!(ir.contains("or.end"), "{}", ir);
}

#[test]
fn test_codegen_external_declarations() {
    let externs = vec![ExportedSignature {
        name: "helper".to_string(),
        parameters: vec![Type::Int],
        return_type: Type::Int,
    }];
    let ir = compile_with_externs("print(helper(3))\n", &externs);

    assert!(ir.contains("declare i64 @helper(i64)"), "{}", ir);
    assert!(ir.contains("call i64 @helper(i64 3)"), "{}", ir);
}
