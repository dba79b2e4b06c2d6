use std::fmt::Display;

use thiserror::Error;

use crate::{Position, Span};

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    span: Option<Span>,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            span: Some(Span {
                start: position.clone(),
                end: position,
            }),
        }
    }

    pub fn spanned(error_impl: ErrorImpl, span: Span) -> Self {
        Error {
            internal_error: error_impl,
            span: Some(span),
        }
    }

    /// An error with no source location (backend failures, internal defects).
    pub fn unlocated(error_impl: ErrorImpl) -> Self {
        Error {
            internal_error: error_impl,
            span: None,
        }
    }

    /// Attaches `span` unless the error already carries a location.
    pub fn or_span(mut self, span: &Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span.clone());
        }
        self
    }

    pub fn get_position(&self) -> Option<&Position> {
        self.span.as_ref().map(|span| &span.start)
    }

    pub fn get_span(&self) -> Option<&Span> {
        self.span.as_ref()
    }

    pub fn get_internal(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn kind(&self) -> ErrorKind {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. }
            | ErrorImpl::UnexpectedToken { .. }
            | ErrorImpl::UnexpectedTokenDetailed { .. }
            | ErrorImpl::NumberParseError { .. }
            | ErrorImpl::InconsistentIndentation
            | ErrorImpl::UnterminatedString
            | ErrorImpl::SourceTooLarge { .. } => ErrorKind::SyntaxError,
            ErrorImpl::DuplicateName { .. } | ErrorImpl::ReservedName { .. } => {
                ErrorKind::DuplicateNameError
            }
            ErrorImpl::UndefinedName { .. }
            | ErrorImpl::DependsOnFailed { .. }
            | ErrorImpl::ReadsDropped { .. } => ErrorKind::UndefinedNameError,
            ErrorImpl::MissingAnnotation { .. } => ErrorKind::MissingAnnotationError,
            ErrorImpl::UnknownType { .. } => ErrorKind::UnknownTypeError,
            ErrorImpl::TypeMismatch { .. }
            | ErrorImpl::NotAValue { .. }
            | ErrorImpl::NotCallable { .. }
            | ErrorImpl::UnitBinding { .. } => ErrorKind::TypeMismatchError,
            ErrorImpl::ReturnType { .. }
            | ErrorImpl::MissingReturn { .. }
            | ErrorImpl::ReturnOutsideFunction => ErrorKind::ReturnTypeError,
            ErrorImpl::ArgumentType { .. } => ErrorKind::ArgumentTypeError,
            ErrorImpl::Arity { .. } => ErrorKind::ArityError,
            ErrorImpl::UnreachableCode { .. } | ErrorImpl::Codegen { .. } => {
                ErrorKind::UnreachableCodeError
            }
            ErrorImpl::Backend { .. } => ErrorKind::BackendError,
        }
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::InconsistentIndentation => "InconsistentIndentation",
            ErrorImpl::UnterminatedString => "UnterminatedString",
            ErrorImpl::SourceTooLarge { .. } => "SourceTooLarge",
            ErrorImpl::DuplicateName { .. } => "DuplicateName",
            ErrorImpl::ReservedName { .. } => "ReservedName",
            ErrorImpl::UndefinedName { .. } => "UndefinedName",
            ErrorImpl::DependsOnFailed { .. } => "DependsOnFailed",
            ErrorImpl::ReadsDropped { .. } => "ReadsDropped",
            ErrorImpl::MissingAnnotation { .. } => "MissingAnnotation",
            ErrorImpl::UnknownType { .. } => "UnknownType",
            ErrorImpl::TypeMismatch { .. } => "TypeMismatch",
            ErrorImpl::NotAValue { .. } => "NotAValue",
            ErrorImpl::NotCallable { .. } => "NotCallable",
            ErrorImpl::UnitBinding { .. } => "UnitBinding",
            ErrorImpl::ReturnType { .. } => "ReturnType",
            ErrorImpl::MissingReturn { .. } => "MissingReturn",
            ErrorImpl::ReturnOutsideFunction => "ReturnOutsideFunction",
            ErrorImpl::ArgumentType { .. } => "ArgumentType",
            ErrorImpl::Arity { .. } => "Arity",
            ErrorImpl::UnreachableCode { .. } => "UnreachableCode",
            ErrorImpl::Codegen { .. } => "Codegen",
            ErrorImpl::Backend { .. } => "Backend",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, is a `:` or newline missing?",
                token
            )),
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the 64-bit integer limit?",
                token
            )),
            ErrorImpl::InconsistentIndentation => ErrorTip::Suggestion(String::from(
                "Dedent does not match any outer indentation level",
            )),
            ErrorImpl::ReservedName { name } => ErrorTip::Suggestion(format!(
                "`{}` is reserved by the runtime, rename the function",
                name
            )),
            ErrorImpl::MissingAnnotation { declaration, item } => ErrorTip::Suggestion(format!(
                "Annotate {} of `{}`, e.g. `x: int` or `-> int`",
                item, declaration
            )),
            ErrorImpl::UnknownType { type_ } => ErrorTip::Suggestion(format!(
                "Unknown type `{}`, expected one of int, float, bool, str, None",
                type_
            )),
            ErrorImpl::MissingReturn { function, .. } => ErrorTip::Suggestion(format!(
                "Add a `return` at the end of `{}`",
                function
            )),
            ErrorImpl::Arity { expected, received, .. } => ErrorTip::Suggestion(format!(
                "Expected {} arguments, received {}",
                expected, received
            )),
            ErrorImpl::UnitBinding { name } => ErrorTip::Suggestion(format!(
                "`{}` would hold no value, `None` has no runtime representation",
                name
            )),
            _ => ErrorTip::None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.internal_error)
    }
}

impl std::error::Error for Error {}

impl From<inkwell::builder::BuilderError> for Error {
    fn from(error: inkwell::builder::BuilderError) -> Self {
        Error::unlocated(ErrorImpl::Codegen {
            message: error.to_string(),
        })
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("inconsistent indentation")]
    InconsistentIndentation,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("source is {size} bytes, positions only address {max}")]
    SourceTooLarge { size: usize, max: u32 },

    #[error("name {name:?} is already declared in this scope")]
    DuplicateName { name: String },
    #[error("name {name:?} is reserved")]
    ReservedName { name: String },
    #[error("name {name:?} is not defined")]
    UndefinedName { name: String },
    #[error("calls {callee:?}, which failed to compile")]
    DependsOnFailed { callee: String },
    #[error("reads {name:?}, whose assignment failed to compile")]
    ReadsDropped { name: String },
    #[error("missing type annotation on {item} of {declaration:?}")]
    MissingAnnotation { declaration: String, item: String },
    #[error("unknown type {type_:?}")]
    UnknownType { type_: String },

    #[error("operator `{operator}` expected {expected}, received {received}")]
    TypeMismatch {
        operator: String,
        expected: String,
        received: String,
    },
    #[error("function {name:?} cannot be used as a value")]
    NotAValue { name: String },
    #[error("{name:?} of type {type_} is not callable")]
    NotCallable { name: String, type_: String },
    #[error("cannot bind {name:?} to a value of type None")]
    UnitBinding { name: String },

    #[error("function {function:?} must return {expected}, received {received}")]
    ReturnType {
        function: String,
        expected: String,
        received: String,
    },
    #[error("function {function:?} may exit without returning {expected}")]
    MissingReturn { function: String, expected: String },
    #[error("`return` outside of a function")]
    ReturnOutsideFunction,

    #[error("argument {index} of {function:?} expected {expected}, received {received}")]
    ArgumentType {
        function: String,
        index: usize,
        expected: String,
        received: String,
    },
    #[error("{function:?} takes {expected} arguments, received {received}")]
    Arity {
        function: String,
        expected: usize,
        received: usize,
    },

    #[error("internal error in {function:?}: {message}")]
    UnreachableCode { function: String, message: String },
    #[error("code generation failed: {message}")]
    Codegen { message: String },
    #[error("backend failed: {message}")]
    Backend { message: String },
}

/// The caller-facing error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SyntaxError,
    DuplicateNameError,
    UndefinedNameError,
    MissingAnnotationError,
    UnknownTypeError,
    TypeMismatchError,
    ReturnTypeError,
    ArgumentTypeError,
    ArityError,
    UnreachableCodeError,
    BackendError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::DuplicateNameError => "DuplicateNameError",
            ErrorKind::UndefinedNameError => "UndefinedNameError",
            ErrorKind::MissingAnnotationError => "MissingAnnotationError",
            ErrorKind::UnknownTypeError => "UnknownTypeError",
            ErrorKind::TypeMismatchError => "TypeMismatchError",
            ErrorKind::ReturnTypeError => "ReturnTypeError",
            ErrorKind::ArgumentTypeError => "ArgumentTypeError",
            ErrorKind::ArityError => "ArityError",
            ErrorKind::UnreachableCodeError => "UnreachableCodeError",
            ErrorKind::BackendError => "BackendError",
        };
        write!(f, "{}", name)
    }
}

/// One failed declaration, as reported to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub declaration: String,
    pub kind: ErrorKind,
    pub message: String,
    pub span: Option<Span>,
    suggestion: Option<String>,
}

impl Diagnostic {
    pub fn from_error(declaration: &str, error: &Error) -> Self {
        let suggestion = match error.get_tip() {
            ErrorTip::None => None,
            ErrorTip::Suggestion(suggestion) => Some(suggestion),
        };

        Diagnostic {
            declaration: declaration.to_string(),
            kind: error.kind(),
            message: error.to_string(),
            span: error.get_span().cloned(),
            suggestion,
        }
    }

    pub fn tip(&self) -> ErrorTip {
        match &self.suggestion {
            Some(suggestion) => ErrorTip::Suggestion(suggestion.clone()),
            None => ErrorTip::None,
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} in `{}`: {}", self.kind, self.declaration, self.message)
    }
}
