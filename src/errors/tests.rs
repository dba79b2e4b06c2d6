//! Unit tests for error handling.
//!
//! This module contains tests for error kinds, names, tips and diagnostics.

use std::sync::Arc;

use crate::errors::errors::{Diagnostic, Error, ErrorImpl, ErrorKind, ErrorTip};
use crate::{Position, Span};

fn position(offset: u32) -> Position {
    Position(offset, Arc::new("test.py".to_string()))
}

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        position(10),
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.kind(), ErrorKind::SyntaxError);
}

#[test]
fn test_error_position() {
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "identifier".to_string(),
        },
        position(42),
    );

    assert_eq!(error.get_position().map(|p| p.0), Some(42));
}

#[test]
fn test_unlocated_error_has_no_position() {
    let error = Error::unlocated(ErrorImpl::Backend {
        message: "llc exited with status 1".to_string(),
    });

    assert!(error.get_position().is_none());
    assert_eq!(error.kind(), ErrorKind::BackendError);
}

#[test]
fn test_or_span_keeps_existing_location() {
    let first = Span {
        start: position(1),
        end: position(2),
    };
    let second = Span {
        start: position(7),
        end: position(9),
    };

    let error = Error::spanned(ErrorImpl::UndefinedName { name: "x".to_string() }, first)
        .or_span(&second);
    assert_eq!(error.get_position().map(|p| p.0), Some(1));

    let error = Error::unlocated(ErrorImpl::UndefinedName { name: "x".to_string() }).or_span(&second);
    assert_eq!(error.get_position().map(|p| p.0), Some(7));
}

#[test]
fn test_type_mismatch_error() {
    let error = Error::new(
        ErrorImpl::TypeMismatch {
            operator: "+".to_string(),
            expected: "int".to_string(),
            received: "str".to_string(),
        },
        position(0),
    );

    assert_eq!(error.get_error_name(), "TypeMismatch");
    assert_eq!(error.kind(), ErrorKind::TypeMismatchError);
    assert_eq!(error.to_string(), "operator `+` expected int, received str");
}

#[test]
fn test_taxonomy_mapping() {
    let cases = vec![
        (ErrorImpl::DuplicateName { name: "f".into() }, ErrorKind::DuplicateNameError),
        (ErrorImpl::ReservedName { name: "main".into() }, ErrorKind::DuplicateNameError),
        (ErrorImpl::UndefinedName { name: "g".into() }, ErrorKind::UndefinedNameError),
        (ErrorImpl::DependsOnFailed { callee: "g".into() }, ErrorKind::UndefinedNameError),
        (ErrorImpl::ReadsDropped { name: "y".into() }, ErrorKind::UndefinedNameError),
        (ErrorImpl::SourceTooLarge { size: usize::MAX, max: u32::MAX }, ErrorKind::SyntaxError),
        (
            ErrorImpl::MissingAnnotation { declaration: "f".into(), item: "return type".into() },
            ErrorKind::MissingAnnotationError,
        ),
        (ErrorImpl::UnknownType { type_: "list".into() }, ErrorKind::UnknownTypeError),
        (ErrorImpl::ReturnOutsideFunction, ErrorKind::ReturnTypeError),
        (
            ErrorImpl::MissingReturn { function: "f".into(), expected: "int".into() },
            ErrorKind::ReturnTypeError,
        ),
        (
            ErrorImpl::ArgumentType {
                function: "f".into(),
                index: 0,
                expected: "int".into(),
                received: "str".into(),
            },
            ErrorKind::ArgumentTypeError,
        ),
        (
            ErrorImpl::Arity { function: "f".into(), expected: 2, received: 1 },
            ErrorKind::ArityError,
        ),
        (
            ErrorImpl::UnreachableCode { function: "f".into(), message: "block".into() },
            ErrorKind::UnreachableCodeError,
        ),
    ];

    for (error_impl, kind) in cases {
        assert_eq!(Error::unlocated(error_impl).kind(), kind);
    }
}

#[test]
fn test_error_tip_display() {
    let error = Error::new(
        ErrorImpl::Arity {
            function: "add".to_string(),
            expected: 2,
            received: 3,
        },
        position(0),
    );

    match error.get_tip() {
        ErrorTip::Suggestion(msg) => assert_eq!(msg, "Expected 2 arguments, received 3"),
        ErrorTip::None => panic!("Expected suggestion"),
    }

    assert_eq!(format!("{}", ErrorTip::None), "");
}

#[test]
fn test_diagnostic_from_error() {
    let span = Span {
        start: position(4),
        end: position(9),
    };
    let error = Error::spanned(
        ErrorImpl::UndefinedName {
            name: "missing".to_string(),
        },
        span.clone(),
    );

    let diagnostic = Diagnostic::from_error("<module>", &error);

    assert_eq!(diagnostic.declaration, "<module>");
    assert_eq!(diagnostic.kind, ErrorKind::UndefinedNameError);
    assert_eq!(diagnostic.message, "name \"missing\" is not defined");
    assert_eq!(diagnostic.span, Some(span));
    assert!(matches!(diagnostic.tip(), ErrorTip::None));
    assert_eq!(
        diagnostic.to_string(),
        "UndefinedNameError in `<module>`: name \"missing\" is not defined"
    );
}
