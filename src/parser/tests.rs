//! Unit tests for the parser module.
//!
//! This module contains tests for parsing various language constructs including:
//! - Function definitions with annotations
//! - Assignments, annotated declarations and augmented assignments
//! - Operator precedence
//! - Control flow statements
//! - Syntax errors

use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::parser::parse;
use crate::{
    ast::{
        ast::Program,
        expressions::{BinaryOperator, ExprKind, UnaryOperator},
        statements::Stmt,
    },
    errors::errors::Error,
    lexer::lexer::tokenize,
};

fn parse_source(source: &str) -> Result<Program, Error> {
    let tokens = tokenize(source.to_string(), Some("test.py".to_string()))?;
    parse(tokens, Arc::new("test.py".to_string()))
}

#[test]
fn test_parse_function_declaration() {
    let program = parse_source("def add(a: int, b: int) -> int:\n    return a + b\n").unwrap();

    assert_eq!(program.body.len(), 1);
    let Stmt::FnDecl(function) = &program.body[0] else {
        panic!("expected a function declaration");
    };

    assert_eq!(function.name, "add");
    assert_eq!(function.parameters.len(), 2);
    assert_eq!(function.parameters[0].name, "a");
    assert_eq!(function.parameters[0].annotation.as_ref().map(|a| a.name.as_str()), Some("int"));
    assert_eq!(function.return_type.as_ref().map(|a| a.name.as_str()), Some("int"));
    assert!(matches!(function.body[0], Stmt::Return(_)));
}

#[test]
fn test_parse_missing_annotations_are_kept_absent() {
    let program = parse_source("def f(a, b: int):\n    pass\n").unwrap();

    let Stmt::FnDecl(function) = &program.body[0] else {
        panic!("expected a function declaration");
    };

    assert!(function.parameters[0].annotation.is_none());
    assert!(function.parameters[1].annotation.is_some());
    assert!(function.return_type.is_none());
}

#[test]
fn test_parse_none_return_annotation() {
    let program = parse_source("def f() -> None:\n    pass\n").unwrap();

    let Stmt::FnDecl(function) = &program.body[0] else {
        panic!("expected a function declaration");
    };
    assert_eq!(function.return_type.as_ref().map(|a| a.name.as_str()), Some("None"));
}

#[test]
fn test_parse_annotated_declaration() {
    let program = parse_source("x: float = 1.5\n").unwrap();

    let Stmt::VarDecl(decl) = &program.body[0] else {
        panic!("expected a declaration");
    };
    assert_eq!(decl.name, "x");
    assert_eq!(decl.annotation.name, "float");
    assert_eq!(decl.value.kind, ExprKind::Float(1.5));
}

#[test]
fn test_parse_annotation_requires_value() {
    let error = parse_source("x: int\n").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_parse_augmented_assignment_desugars() {
    let program = parse_source("x += 2\n").unwrap();

    let Stmt::Assign(assign) = &program.body[0] else {
        panic!("expected an assignment");
    };
    let ExprKind::Binary { operator, left, right } = &assign.value.kind else {
        panic!("expected a binary expression");
    };

    assert_eq!(*operator, BinaryOperator::Add);
    assert_eq!(left.kind, ExprKind::Symbol("x".to_string()));
    assert_eq!(right.kind, ExprKind::Integer(2));
}

#[test]
fn test_parse_precedence() {
    let program = parse_source("x = 1 + 2 * 3\n").unwrap();

    let Stmt::Assign(assign) = &program.body[0] else {
        panic!("expected an assignment");
    };
    let ExprKind::Binary { operator, right, .. } = &assign.value.kind else {
        panic!("expected a binary expression");
    };

    assert_eq!(*operator, BinaryOperator::Add);
    assert!(matches!(right.kind, ExprKind::Binary { operator: BinaryOperator::Mul, .. }));
}

#[test]
fn test_parse_not_binds_looser_than_comparison() {
    let program = parse_source("x = not a < b and c\n").unwrap();

    let Stmt::Assign(assign) = &program.body[0] else {
        panic!("expected an assignment");
    };
    let ExprKind::Binary { operator, left, .. } = &assign.value.kind else {
        panic!("expected a binary expression");
    };

    assert_eq!(*operator, BinaryOperator::And);
    let ExprKind::Unary { operator, operand } = &left.kind else {
        panic!("expected a unary expression");
    };
    assert_eq!(*operator, UnaryOperator::Not);
    assert!(matches!(operand.kind, ExprKind::Binary { operator: BinaryOperator::Less, .. }));
}

#[test]
fn test_parse_negation_binds_tighter_than_multiplication() {
    let program = parse_source("x = -a * b\n").unwrap();

    let Stmt::Assign(assign) = &program.body[0] else {
        panic!("expected an assignment");
    };
    let ExprKind::Binary { operator, left, .. } = &assign.value.kind else {
        panic!("expected a binary expression");
    };

    assert_eq!(*operator, BinaryOperator::Mul);
    assert!(matches!(left.kind, ExprKind::Unary { operator: UnaryOperator::Neg, .. }));
}

#[test]
fn test_parse_call_arguments() {
    let program = parse_source("add(42, 24)\n").unwrap();

    let Stmt::Expression(expr) = &program.body[0] else {
        panic!("expected an expression statement");
    };
    let ExprKind::Call { callee, arguments, .. } = &expr.kind else {
        panic!("expected a call");
    };

    assert_eq!(callee, "add");
    assert_eq!(arguments.len(), 2);
    assert_eq!(arguments[1].kind, ExprKind::Integer(24));
}

#[test]
fn test_parse_if_elif_else() {
    let source = "if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n";
    let program = parse_source(source).unwrap();

    let Stmt::If(if_stmt) = &program.body[0] else {
        panic!("expected an if statement");
    };
    let else_body = if_stmt.else_body.as_ref().unwrap();
    assert_eq!(else_body.len(), 1);

    let Stmt::If(elif) = &else_body[0] else {
        panic!("expected a nested if for elif");
    };
    assert!(elif.else_body.is_some());
}

#[test]
fn test_parse_while_and_one_line_block() {
    let program = parse_source("while i < 10: i += 1\n").unwrap();

    let Stmt::While(while_stmt) = &program.body[0] else {
        panic!("expected a while statement");
    };
    assert_eq!(while_stmt.body.len(), 1);
}

#[test]
fn test_parse_bare_return() {
    let program = parse_source("def f() -> None:\n    return\n").unwrap();

    let Stmt::FnDecl(function) = &program.body[0] else {
        panic!("expected a function declaration");
    };
    let Stmt::Return(ret) = &function.body[0] else {
        panic!("expected a return");
    };
    assert!(ret.value.is_none());
}

#[test]
fn test_parse_docstring_is_expression_statement() {
    let program = parse_source("\"module doc\"\n").unwrap();

    assert!(matches!(&program.body[0], Stmt::Expression(expr) if expr.is_literal()));
}

#[test]
fn test_parse_missing_indent_is_error() {
    let error = parse_source("def f() -> int:\nreturn 1\n").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_parse_assign_to_call_is_error() {
    let error = parse_source("f() = 1\n").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_parse_integer_overflow() {
    let error = parse_source("x = 99999999999999999999\n").unwrap_err();
    assert_eq!(error.get_error_name(), "NumberParseError");
}
