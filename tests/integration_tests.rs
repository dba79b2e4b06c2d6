//! Integration tests for end-to-end compilation.
//!
//! These drive the public `Pipeline` from source text to LLVM IR and check
//! the diagnostics and emitted functions each unit produces.

use morelia::{
    errors::errors::ErrorKind,
    pipeline::pipeline::{CompileOptions, Pipeline, SourceUnit, Stage},
};
use pretty_assertions::assert_eq;

/// The text of the function named `name`, from `define` to its closing brace.
fn function_body(ir: &str, name: &str) -> String {
    let marker = format!("@{}(", name);
    let lines: Vec<&str> = ir
        .lines()
        .skip_while(|line| !(line.starts_with("define") && line.contains(&marker)))
        .take_while(|line| *line != "}")
        .collect();
    assert!(!lines.is_empty(), "no definition of {} in\n{}", name, ir);
    lines.join("\n")
}

#[test]
fn test_add_function_and_call() {
    let source = "def add(a: int, b: int) -> int:\n    return a + b\n\nprint(add(42, 24))\n";
    let result = Pipeline::default().compile("add.py", source);

    assert!(result.is_success(), "{:?}", result.diagnostics);
    let ir = result.ir.unwrap();

    let add = function_body(&ir, "add");
    assert!(add.starts_with("define i64 @add(i64 %a, i64 %b)"), "{}", add);
    assert_eq!(add.matches("= add i64").count(), 1, "{}", add);
    assert_eq!(add.matches("ret i64").count(), 1, "{}", add);
    assert_eq!(add.lines().filter(|line| line.ends_with(':')).count(), 1, "{}", add);

    let main = function_body(&ir, "main");
    assert_eq!(main.matches("call i64 @add(i64 42, i64 24)").count(), 1, "{}", main);
}

#[test]
fn test_type_mismatch_omits_declaration() {
    let source = "def bad(a: int) -> int:\n    return a + \"x\"\n\ndef good(a: int) -> int:\n    return a * 2\n";
    let result = Pipeline::default().compile("bad.py", source);

    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].kind, ErrorKind::TypeMismatchError);
    assert_eq!(result.diagnostics[0].declaration, "bad");
    assert!(result.diagnostics[0].span.is_some());

    let ir = result.ir.unwrap();
    assert!(!ir.contains("@bad"), "{}", ir);
    assert!(ir.contains("define i64 @good(i64 %a)"), "{}", ir);
}

#[test]
fn test_undefined_call_aborts_only_its_declaration() {
    let source = "def caller() -> int:\n    return missing(1)\n\ndef other() -> int:\n    return 7\n";
    let result = Pipeline::default().compile("missing.py", source);

    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].kind, ErrorKind::UndefinedNameError);
    assert_eq!(result.diagnostics[0].declaration, "caller");

    let ir = result.ir.unwrap();
    assert!(!ir.contains("@caller"), "{}", ir);
    assert!(ir.contains("define i64 @other()"), "{}", ir);
}

#[test]
fn test_repeated_compilation_is_byte_identical() {
    let source = "def fib(n: int) -> int:\n    if n < 2:\n        return n\n    return fib(n - 1) + fib(n - 2)\n\nprint(fib(10))\nprint(1.5)\nprint(\"done\")\n";
    let pipeline = Pipeline::default();

    let first = pipeline.compile("fib.py", source);
    let second = pipeline.compile("fib.py", source);

    assert!(first.is_success(), "{:?}", first.diagnostics);
    assert_eq!(first.ir, second.ir);
}

#[test]
fn test_missing_annotation_is_reported() {
    let source = "def f(a) -> int:\n    return 1\n";
    let result = Pipeline::default().compile("f.py", source);

    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].kind, ErrorKind::MissingAnnotationError);
    assert_eq!(result.diagnostics[0].declaration, "f");
}

#[test]
fn test_str_plus_int_drops_module_statement() {
    let source = "s: str = \"a\"\nprint(s + 1)\n";
    let result = Pipeline::default().compile("s.py", source);

    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].kind, ErrorKind::TypeMismatchError);
    assert_eq!(result.diagnostics[0].declaration, "<module>");

    // The remaining module statements still form the entry point.
    let ir = result.ir.unwrap();
    assert!(ir.contains("define i32 @main()"), "{}", ir);
    assert!(!ir.contains("call i32 (i8*, ...) @printf"), "{}", ir);
}

#[test]
fn test_one_function_per_well_typed_declaration() {
    let source = "\
def square(x: int) -> int:
    return x * x

def half(x: float) -> float:
    return x / 2

def greet() -> None:
    print(\"hi\")

def wrong() -> int:
    return \"no\"
";
    let result = Pipeline::default().compile("many.py", source);

    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].kind, ErrorKind::ReturnTypeError);
    assert_eq!(result.diagnostics[0].declaration, "wrong");

    let ir = result.ir.unwrap();
    let defined: Vec<_> = ir.lines().filter(|line| line.starts_with("define")).collect();
    assert_eq!(defined.len(), 3, "{}", ir);
    assert!(ir.contains("define i64 @square(i64 %x)"));
    assert!(ir.contains("define double @half(double %x)"));
    assert!(ir.contains("define void @greet()"));
}

#[test]
fn test_control_flow_program_compiles() {
    let source = "\
def collatz(n: int) -> int:
    steps: int = 0
    while n != 1:
        if n % 2 == 0:
            n = n // 2
        else:
            n = 3 * n + 1
        steps = steps + 1
    return steps

print(collatz(27))
print(collatz(1) == 0 and True)
";
    let result = Pipeline::default().compile("collatz.py", source);

    assert!(result.is_success(), "{:?}", result.diagnostics);
    let ir = result.ir.unwrap();
    let collatz = function_body(&ir, "collatz");
    assert!(collatz.contains("while.cond"), "{}", collatz);
    assert!(collatz.contains("srem i64"), "{}", collatz);
}

#[test]
fn test_batch_compilation_links_units_by_signature() {
    let units = vec![
        SourceUnit::new("math.py", "def cube(x: int) -> int:\n    return x * x * x\n"),
        SourceUnit::new("main.py", "print(cube(3))\n"),
        SourceUnit::new("typo.py", "print(cube(\"3\"))\n"),
    ];
    let results = Pipeline::default().compile_batch(&units);

    assert_eq!(results.len(), 3);
    assert!(results[0].is_success());
    assert!(!results[0].ir.as_ref().unwrap().contains("define i32 @main()"));

    assert!(results[1].is_success(), "{:?}", results[1].diagnostics);
    let main = results[1].ir.as_ref().unwrap();
    assert!(main.contains("declare i64 @cube(i64)"), "{}", main);
    assert!(main.contains("call i64 @cube(i64 3)"), "{}", main);

    assert_eq!(results[2].diagnostics.len(), 1);
    assert_eq!(results[2].diagnostics[0].kind, ErrorKind::ArgumentTypeError);
}

#[test]
fn test_fail_whole_unit_policy() {
    let source = "def ok() -> int:\n    return 1\n\ndef broken() -> int:\n    return undefined_name\n";

    let lenient = Pipeline::default().compile("unit.py", source);
    assert_eq!(lenient.stage, Some(Stage::CodeGenerated));
    assert!(lenient.ir.unwrap().contains("@ok"));

    let strict = Pipeline::new(CompileOptions {
        fail_whole_unit: true,
        ..CompileOptions::default()
    })
    .compile("unit.py", source);
    assert_eq!(strict.diagnostics.len(), 1);
    assert_eq!(strict.ir, None);
}
