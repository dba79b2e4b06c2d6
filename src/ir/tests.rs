//! Unit tests for IR lowering.
//!
//! Covers block structure for control flow, reachability normalization and
//! the single-assignment property of produced values.

use std::{collections::HashSet, sync::Arc};

use pretty_assertions::assert_eq;

use super::{
    builder::{build_unit, lower_function},
    ir::{CompilationUnit, FunctionUnit, Instruction, Terminator},
};
use crate::{
    ast::{expressions::BinaryOperator, types::Type},
    errors::errors::ErrorKind,
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::{
        environment::{Symbol, SymbolKind},
        type_checker::type_check,
        typed_ast::TypedFunction,
    },
    Position, Span,
};

fn lower(source: &str) -> CompilationUnit {
    let tokens = tokenize(source.to_string(), Some("test.py".to_string())).unwrap();
    let program = parse(tokens, Arc::new("test.py".to_string())).unwrap();
    let checked = type_check(&program, &[]);
    assert!(checked.diagnostics.is_empty(), "{:?}", checked.diagnostics);
    build_unit("test", checked).unwrap()
}

fn labels(function: &FunctionUnit) -> Vec<&str> {
    function.blocks.iter().map(|block| block.label.as_str()).collect()
}

fn assert_single_assignment(function: &FunctionUnit) {
    let values = function.defined_values();
    let unique: HashSet<_> = values.iter().collect();
    assert_eq!(unique.len(), values.len(), "a value is defined twice in {}", function.name);
}

#[test]
fn test_lower_straight_line_function() {
    let unit = lower("def add(a: int, b: int) -> int:\n    return a + b\n");
    let add = unit.function("add").unwrap();

    assert_eq!(add.blocks.len(), 1);
    let block = &add.blocks[0];
    assert_eq!(block.instructions.len(), 3);
    assert!(matches!(
        block.instructions[2],
        Instruction::BinaryOp {
            op: BinaryOperator::Add,
            result_type: Type::Int,
            ..
        }
    ));
    assert!(matches!(block.terminator, Terminator::Return(Some(_))));
}

#[test]
fn test_lower_entry_function_comes_last() {
    let unit = lower("def f() -> int:\n    return 1\nprint(f())\n");

    let names: Vec<_> = unit.functions.iter().map(|function| function.name.as_str()).collect();
    assert_eq!(names, vec!["f", "main"]);
    assert!(unit.functions[1].is_entry);
    assert!(matches!(unit.functions[1].blocks[0].terminator, Terminator::Return(None)));
}

#[test]
fn test_lower_print_has_no_result_value() {
    let unit = lower("print(1)\n");
    let main = unit.function("main").unwrap();

    let call = main.blocks[0]
        .instructions
        .iter()
        .find(|instruction| matches!(instruction, Instruction::Call { .. }))
        .unwrap();
    assert_eq!(call.dest(), None);
}

#[test]
fn test_lower_if_without_else_joins() {
    let unit = lower("def f(a: int) -> int:\n    if a > 0:\n        a = 1\n    return a\n");
    let f = unit.function("f").unwrap();

    assert_eq!(labels(f), vec!["entry", "then1", "if.end2"]);

    let Terminator::Branch {
        then_block, else_block, ..
    } = &f.blocks[0].terminator
    else {
        panic!("expected a branch");
    };
    assert_eq!(*then_block, f.blocks[1].id);
    assert_eq!(*else_block, f.blocks[2].id);
    assert_eq!(f.blocks[1].terminator, Terminator::Jump(f.blocks[2].id));
}

#[test]
fn test_lower_returning_branches_prune_join_block() {
    let unit = lower("def f(a: int) -> int:\n    if a > 0:\n        return 1\n    else:\n        return 2\n");
    let f = unit.function("f").unwrap();

    assert_eq!(labels(f), vec!["entry", "then1", "else2"]);
}

#[test]
fn test_lower_code_after_return_is_pruned() {
    let unit = lower("def f() -> int:\n    return 1\n    print(2)\n");
    let f = unit.function("f").unwrap();

    assert_eq!(f.blocks.len(), 1);
    assert!(f.blocks[0]
        .instructions
        .iter()
        .all(|instruction| !matches!(instruction, Instruction::Call { .. })));
}

#[test]
fn test_lower_while_loop() {
    let unit = lower("i = 0\nwhile i < 3:\n    i += 1\n");
    let main = unit.function("main").unwrap();

    assert_eq!(labels(main), vec!["entry", "while.cond1", "while.body2", "while.end3"]);
    assert_eq!(main.blocks[2].terminator, Terminator::Jump(main.blocks[1].id));
    assert_single_assignment(main);
}

#[test]
fn test_lower_short_circuit_uses_hidden_local() {
    let unit = lower("def f(a: bool, b: bool) -> bool:\n    return a and b\n");
    let f = unit.function("f").unwrap();

    assert_eq!(labels(f), vec!["entry", "and.rhs1", "and.end2"]);
    assert_eq!(f.locals.len(), 1);
    assert_eq!(f.locals[0].name, "and.2");
    assert_eq!(f.locals[0].ty, Type::Bool);
}

#[test]
fn test_lower_unary_operators() {
    let unit = lower("def f(a: float, b: bool) -> bool:\n    x = -a\n    return not b\n");
    let f = unit.function("f").unwrap();

    let ops: Vec<_> = f.blocks[0]
        .instructions
        .iter()
        .filter_map(|instruction| match instruction {
            Instruction::BinaryOp { op, operand_type, .. } => Some((*op, operand_type.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        ops,
        vec![(BinaryOperator::Sub, Type::Float), (BinaryOperator::Eq, Type::Bool)]
    );
}

#[test]
fn test_lower_docstring_emits_nothing() {
    let unit = lower("def f() -> None:\n    \"doc\"\n    pass\n");
    let f = unit.function("f").unwrap();

    assert!(f.blocks[0].instructions.is_empty());
    assert_eq!(f.blocks[0].terminator, Terminator::Return(None));
}

#[test]
fn test_lower_values_are_assigned_once() {
    let source = "def f(n: int) -> int:\n    total = 0\n    i = 0\n    while i < n and total < 100:\n        if i % 2 == 0:\n            total += i\n        else:\n            total -= 1\n        i += 1\n    return total\n";
    let unit = lower(source);

    for function in &unit.functions {
        assert_single_assignment(function);
    }
}

#[test]
fn test_lower_every_block_is_reachable() {
    let source = "def f(a: int) -> int:\n    while a > 0:\n        return a\n    return 0\n";
    let unit = lower(source);
    let f = unit.function("f").unwrap();

    let mut reachable = HashSet::new();
    let mut worklist = vec![f.blocks[0].id];
    while let Some(id) = worklist.pop() {
        if reachable.insert(id) {
            worklist.extend(f.block(id).unwrap().terminator.successors());
        }
    }
    assert_eq!(reachable.len(), f.blocks.len());
}

fn function_with_empty_body(return_type: Type) -> TypedFunction {
    let position = Position(0, Arc::new("test.py".to_string()));
    let span = Span {
        start: position.clone(),
        end: position,
    };

    TypedFunction {
        name: "f".to_string(),
        symbol: Symbol {
            name: "f".to_string(),
            ty: Type::Unit,
            depth: 0,
            kind: SymbolKind::Function,
        },
        parameters: vec![],
        return_type,
        locals: vec![],
        slot_count: 0,
        body: vec![],
        span,
    }
}

#[test]
fn test_lower_unit_function_gets_implicit_return() {
    let unit = lower_function(&function_with_empty_body(Type::Unit)).unwrap();
    assert_eq!(unit.blocks[0].terminator, Terminator::Return(None));
}

#[test]
fn test_lower_fall_through_in_valued_function_is_internal_error() {
    let error = lower_function(&function_with_empty_body(Type::Int)).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::UnreachableCodeError);
    assert!(error.get_position().is_some());
}
