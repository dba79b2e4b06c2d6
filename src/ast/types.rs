//! Type system definitions.
//!
//! `TypeAnnotation` is an annotation as written in the source; `Type` is the
//! closed set of resolved types every checked expression carries. Types
//! compare structurally: two function types are equal when their parameter
//! lists and return types are.

use std::fmt::Display;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Span,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Float,
    Bool,
    Str,
    /// `None`; functions returning it produce no value.
    Unit,
    Function(FunctionType),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionType {
    pub parameters: Vec<Type>,
    pub return_type: Box<Type>,
}

impl FunctionType {
    pub fn new(parameters: Vec<Type>, return_type: Type) -> Self {
        FunctionType {
            parameters,
            return_type: Box::new(return_type),
        }
    }
}

impl Type {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    /// The type both operands of mixed arithmetic are brought to.
    /// `Int` widens to `Float`; nothing else converts.
    pub fn numeric_join(&self, other: &Type) -> Option<Type> {
        match (self, other) {
            (Type::Int, Type::Int) => Some(Type::Int),
            (Type::Int | Type::Float, Type::Int | Type::Float) => Some(Type::Float),
            _ => None,
        }
    }

    /// Whether a value of `self` may stand where `target` is expected
    /// after implicit widening.
    pub fn widens_to(&self, target: &Type) -> bool {
        self == target || (*self == Type::Int && *target == Type::Float)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Bool => write!(f, "bool"),
            Type::Str => write!(f, "str"),
            Type::Unit => write!(f, "None"),
            Type::Function(function) => {
                let parameters = function
                    .parameters
                    .iter()
                    .map(|ty| ty.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "({}) -> {}", parameters, function.return_type)
            }
        }
    }
}

/// A type name as it appears after `:` or `->`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAnnotation {
    pub name: String,
    pub span: Span,
}

impl TypeAnnotation {
    pub fn resolve(&self) -> Result<Type, Error> {
        match self.name.as_str() {
            "int" => Ok(Type::Int),
            "float" => Ok(Type::Float),
            "bool" => Ok(Type::Bool),
            "str" => Ok(Type::Str),
            "None" => Ok(Type::Unit),
            other => Err(Error::spanned(
                ErrorImpl::UnknownType {
                    type_: other.to_string(),
                },
                self.span.clone(),
            )),
        }
    }
}
