//! Type annotation parsing.
//!
//! Annotations in the supported subset are bare names (`int`, `str`, ...)
//! or the `None` keyword. Resolution to a `Type` happens in the type checker.

use crate::{ast::types::TypeAnnotation, errors::errors::Error, lexer::tokens::TokenKind};

use super::parser::Parser;

pub fn parse_type(parser: &mut Parser) -> Result<TypeAnnotation, Error> {
    match parser.current_token_kind() {
        TokenKind::Identifier | TokenKind::None => {
            let token = parser.advance();
            Ok(TypeAnnotation {
                name: token.value,
                span: token.span,
            })
        }
        _ => Err(parser.unexpected("expected a type name")),
    }
}
