//! Unit tests for the lexer module.
//!
//! This module contains tests for tokenization including:
//! - Keywords and identifiers
//! - Numeric literals (integers and floats)
//! - String literals with escape sequences
//! - Operators and punctuation
//! - Indentation, blank lines and comments
//! - Error cases

use pretty_assertions::assert_eq;

use super::{
    lexer::{ensure_addressable, tokenize},
    tokens::TokenKind,
};
use crate::errors::errors::ErrorKind;

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source.to_string(), Some("test.py".to_string()))
        .unwrap()
        .into_iter()
        .map(|token| token.kind)
        .collect()
}

#[test]
fn test_tokenize_keywords() {
    let source = "def return if elif else while pass and or not True False None".to_string();
    let tokens = tokenize(source, Some("test.py".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Def);
    assert_eq!(tokens[1].kind, TokenKind::Return);
    assert_eq!(tokens[2].kind, TokenKind::If);
    assert_eq!(tokens[3].kind, TokenKind::Elif);
    assert_eq!(tokens[4].kind, TokenKind::Else);
    assert_eq!(tokens[5].kind, TokenKind::While);
    assert_eq!(tokens[6].kind, TokenKind::Pass);
    assert_eq!(tokens[7].kind, TokenKind::And);
    assert_eq!(tokens[8].kind, TokenKind::Or);
    assert_eq!(tokens[9].kind, TokenKind::Not);
    assert_eq!(tokens[10].kind, TokenKind::True);
    assert_eq!(tokens[11].kind, TokenKind::False);
    assert_eq!(tokens[12].kind, TokenKind::None);
    assert_eq!(tokens[13].kind, TokenKind::Newline);
    assert_eq!(tokens[14].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_identifiers() {
    let source = "foo bar baz_123 _underscore CamelCase defined".to_string();
    let tokens = tokenize(source, Some("test.py".to_string())).unwrap();

    let values: Vec<&str> = tokens[..6].iter().map(|t| t.value.as_str()).collect();
    assert_eq!(values, vec!["foo", "bar", "baz_123", "_underscore", "CamelCase", "defined"]);
    assert!(tokens[..6].iter().all(|t| t.kind == TokenKind::Identifier));
}

#[test]
fn test_tokenize_numbers() {
    let source = "42 3.14 0 100. 1e3 .5".to_string();
    let tokens = tokenize(source, Some("test.py".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Integer);
    assert_eq!(tokens[0].value, "42");
    assert_eq!(tokens[1].kind, TokenKind::Float);
    assert_eq!(tokens[1].value, "3.14");
    assert_eq!(tokens[2].kind, TokenKind::Integer);
    assert_eq!(tokens[3].kind, TokenKind::Float);
    assert_eq!(tokens[3].value, "100.");
    assert_eq!(tokens[4].kind, TokenKind::Float);
    assert_eq!(tokens[4].value, "1e3");
    assert_eq!(tokens[5].kind, TokenKind::Float);
    assert_eq!(tokens[5].value, ".5");
}

#[test]
fn test_tokenize_strings() {
    let source = r#""hello" 'world' "it's""#.to_string();
    let tokens = tokenize(source, Some("test.py".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].value, "hello");
    assert_eq!(tokens[1].kind, TokenKind::String);
    assert_eq!(tokens[1].value, "world");
    assert_eq!(tokens[2].value, "it's");
}

#[test]
fn test_tokenize_string_escapes() {
    let source = r#""hello\nworld" "tab\there" "backslash\\" "hex\x41" "quote\"" "odd\q""#.to_string();
    let tokens = tokenize(source, Some("test.py".to_string())).unwrap();

    assert_eq!(tokens[0].value, "hello\nworld");
    assert_eq!(tokens[1].value, "tab\there");
    assert_eq!(tokens[2].value, "backslash\\");
    assert_eq!(tokens[3].value, "hexA");
    assert_eq!(tokens[4].value, "quote\"");
    assert_eq!(tokens[5].value, "odd\\q");
}

#[test]
fn test_string_span_covers_quotes() {
    let tokens = tokenize(r#"x = "ab""#.to_string(), None).unwrap();

    assert_eq!(tokens[2].span.start.0, 4);
    assert_eq!(tokens[2].span.end.0, 8);
}

#[test]
fn test_tokenize_operators() {
    assert_eq!(
        kinds("+ - * / // % == != < > <= >= = += -= *= /= -> : ,"),
        vec![
            TokenKind::Plus,
            TokenKind::Dash,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::SlashSlash,
            TokenKind::Percent,
            TokenKind::Equals,
            TokenKind::NotEquals,
            TokenKind::Less,
            TokenKind::Greater,
            TokenKind::LessEquals,
            TokenKind::GreaterEquals,
            TokenKind::Assignment,
            TokenKind::PlusEquals,
            TokenKind::MinusEquals,
            TokenKind::StarEquals,
            TokenKind::SlashEquals,
            TokenKind::Arrow,
            TokenKind::Colon,
            TokenKind::Comma,
            TokenKind::Newline,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_indented_block() {
    let source = "def f() -> int:\n    return 1\nx = f()\n";

    assert_eq!(
        kinds(source),
        vec![
            TokenKind::Def,
            TokenKind::Identifier,
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::Arrow,
            TokenKind::Identifier,
            TokenKind::Colon,
            TokenKind::Newline,
            TokenKind::Indent,
            TokenKind::Return,
            TokenKind::Integer,
            TokenKind::Newline,
            TokenKind::Dedent,
            TokenKind::Identifier,
            TokenKind::Assignment,
            TokenKind::Identifier,
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::Newline,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_dedents_closed_at_eof() {
    let source = "if a:\n    if b:\n        pass";

    let kinds = kinds(source);
    let tail = &kinds[kinds.len() - 4..];
    assert_eq!(
        tail,
        &[TokenKind::Newline, TokenKind::Dedent, TokenKind::Dedent, TokenKind::EOF]
    );
}

#[test]
fn test_blank_and_comment_lines_are_ignored() {
    let source = "x = 1\n\n# a comment\n    # indented comment\ny = 2  # trailing\n";

    assert_eq!(
        kinds(source),
        vec![
            TokenKind::Identifier,
            TokenKind::Assignment,
            TokenKind::Integer,
            TokenKind::Newline,
            TokenKind::Identifier,
            TokenKind::Assignment,
            TokenKind::Integer,
            TokenKind::Newline,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_newlines_inside_parens_are_joined() {
    let source = "f(1,\n      2)\n";

    assert_eq!(
        kinds(source),
        vec![
            TokenKind::Identifier,
            TokenKind::OpenParen,
            TokenKind::Integer,
            TokenKind::Comma,
            TokenKind::Integer,
            TokenKind::CloseParen,
            TokenKind::Newline,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_inconsistent_dedent_is_error() {
    let source = "if a:\n        pass\n    pass\n".to_string();
    let error = tokenize(source, None).unwrap_err();

    assert_eq!(error.get_error_name(), "InconsistentIndentation");
}

#[test]
fn test_tokenize_unrecognised_token() {
    let error = tokenize("x = 1 $ 2".to_string(), None).unwrap_err();

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_position().map(|p| p.0), Some(6));
}

#[test]
fn test_tokenize_unterminated_string() {
    let error = tokenize("x = \"abc\n".to_string(), None).unwrap_err();

    assert_eq!(error.get_error_name(), "UnterminatedString");
}

#[test]
fn test_source_size_limited_by_position_width() {
    assert!(ensure_addressable(u32::MAX as usize).is_ok());

    let error = ensure_addressable(u32::MAX as usize + 1).unwrap_err();
    assert_eq!(error.get_error_name(), "SourceTooLarge");
    assert_eq!(error.kind(), ErrorKind::SyntaxError);
}
