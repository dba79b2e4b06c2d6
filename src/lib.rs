#![allow(clippy::module_inception)]

use std::{
    path::Path,
    sync::{Arc, Once},
};

use crate::errors::errors::{Diagnostic, ErrorTip};

pub mod ast;
pub mod compiler;
pub mod errors;
pub mod ir;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod pipeline;
pub mod type_checker;

extern crate regex;

/// Byte offset into a source file, plus the file's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position(pub u32, pub Arc<String>);

impl Position {
    pub fn null() -> Self {
        Position(0, Arc::new(String::from("<null>")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    /// Span covering `self` up to the end of `other`.
    pub fn to(&self, other: &Span) -> Span {
        Span {
            start: self.start.clone(),
            end: other.end.clone(),
        }
    }
}

static TRACING_INIT: Once = Once::new();

/// Installs the global `tracing` subscriber. Safe to call more than once.
///
/// `RUST_LOG` wins when set; otherwise `default_directive` is used, and
/// nothing is installed when neither is available.
pub fn init_tracing(default_directive: Option<&str>) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = match (std::env::var("RUST_LOG"), default_directive) {
            (Ok(_), _) => EnvFilter::from_default_env(),
            (Err(_), Some(directive)) => EnvFilter::new(directive),
            (Err(_), None) => return,
        };

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
            .with(filter)
            .init();
    });
}

/// Returns the 1-based line number, the line's text and the column of
/// `position` inside `content`. Offsets past the end clamp to the last line.
pub fn get_line_at_position(content: &str, position: u32) -> (usize, String, usize) {
    let pos = (position as usize).min(content.len());

    let mut start = 0;
    let mut line_number = 1;
    let mut last = (1, String::new(), 0);

    for line in content.split_inclusive('\n') {
        let end = start + line.len();

        if (start..end).contains(&pos) {
            return (line_number, line.to_string(), pos - start);
        }

        last = (line_number, line.to_string(), line.trim_end_matches('\n').len());
        start = end;
        line_number += 1;
    }

    last
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_get_line_at_position() {
        let content = "Hello, world!\nabc\n\nTesting { }\n";

        let (line_number, line, line_pos) = super::get_line_at_position(content, 10);
        assert_eq!(line_number, 1);
        assert_eq!(line, "Hello, world!\n");
        assert_eq!(line_pos, 10);

        let (line_number, line, line_pos) = super::get_line_at_position(content, 27);
        assert_eq!(line_number, 4);
        assert_eq!(line, "Testing { }\n");
        assert_eq!(line_pos, 8);
    }

    #[test]
    fn test_get_line_past_end() {
        let (line_number, line, _) = super::get_line_at_position("a = 1\nb = 2", 100);
        assert_eq!(line_number, 2);
        assert_eq!(line, "b = 2");
    }
}

/// Renders a diagnostic with the offending source line, if it has a location.
///
/// ```text
/// error[TypeMismatchError] in `bad`: ...
/// -> final.py
///    |
/// 20 |     return a + "x"
///    | -----------^
/// ```
pub fn display_error(diagnostic: &Diagnostic, source: &str, file: &Path) {
    match diagnostic.tip() {
        ErrorTip::None => eprintln!(
            "error[{}] in `{}`: {}",
            diagnostic.kind, diagnostic.declaration, diagnostic.message
        ),
        tip => eprintln!(
            "error[{}] in `{}`: {} ({})",
            diagnostic.kind, diagnostic.declaration, diagnostic.message, tip
        ),
    }

    let Some(span) = &diagnostic.span else {
        return;
    };

    let (line, line_text, line_pos) = get_line_at_position(source, span.start.0);

    let line_string = line.to_string();
    let padding = line_string.len() + 2;

    eprintln!("-> {}", file.as_os_str().to_string_lossy());
    eprintln!("{:>padding$}", "|");

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    eprintln!("{} | {}", line_string, line_text_removed.trim_end());

    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;

    eprintln!("{:>padding$} {:->arrows$}", "|", "^");
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let start = string.chars().take_while(|c| *c == ' ' || *c == '\t').count();

    (String::from(&string[start..]), start)
}
