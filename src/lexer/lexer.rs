use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position, Span, MK_DEFAULT_HANDLER, MK_TOKEN,
};

use super::tokens::{Token, TokenKind, RESERVED_LOOKUP};

pub type RegexHandler = fn(&mut Lexer, &Regex) -> Result<(), Error>;

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

const TAB_WIDTH: usize = 8;

lazy_static! {
    // Order matters: the first pattern matching at the cursor wins.
    static ref PATTERNS: Vec<RegexPattern> = vec![
        RegexPattern { regex: Regex::new("^\\r?\\n").unwrap(), handler: newline_handler },
        RegexPattern { regex: Regex::new("^[ \\t\\x0C]+").unwrap(), handler: skip_handler },
        RegexPattern { regex: Regex::new("^#[^\\n]*").unwrap(), handler: skip_handler },
        RegexPattern { regex: Regex::new("^\\\\\\r?\\n").unwrap(), handler: skip_handler },
        RegexPattern { regex: Regex::new("^[a-zA-Z_][a-zA-Z0-9_]*").unwrap(), handler: symbol_handler },
        RegexPattern { regex: Regex::new("^([0-9]+\\.[0-9]*([eE][+-]?[0-9]+)?|\\.[0-9]+([eE][+-]?[0-9]+)?|[0-9]+[eE][+-]?[0-9]+)").unwrap(), handler: float_handler },
        RegexPattern { regex: Regex::new("^[0-9]+").unwrap(), handler: integer_handler },
        RegexPattern { regex: Regex::new("^\"([^\"\\\\\\n]|\\\\.)*\"").unwrap(), handler: string_handler },
        RegexPattern { regex: Regex::new("^'([^'\\\\\\n]|\\\\.)*'").unwrap(), handler: string_handler },
        RegexPattern { regex: Regex::new("^[\"']").unwrap(), handler: unterminated_string_handler },
        RegexPattern { regex: Regex::new("^\\(").unwrap(), handler: open_paren_handler },
        RegexPattern { regex: Regex::new("^\\)").unwrap(), handler: close_paren_handler },
        RegexPattern { regex: Regex::new("^->").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Arrow, "->") },
        RegexPattern { regex: Regex::new("^==").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Equals, "==") },
        RegexPattern { regex: Regex::new("^!=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::NotEquals, "!=") },
        RegexPattern { regex: Regex::new("^<=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::LessEquals, "<=") },
        RegexPattern { regex: Regex::new("^>=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::GreaterEquals, ">=") },
        RegexPattern { regex: Regex::new("^\\+=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::PlusEquals, "+=") },
        RegexPattern { regex: Regex::new("^-=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::MinusEquals, "-=") },
        RegexPattern { regex: Regex::new("^\\*=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::StarEquals, "*=") },
        RegexPattern { regex: Regex::new("^/=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::SlashEquals, "/=") },
        RegexPattern { regex: Regex::new("^//").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::SlashSlash, "//") },
        RegexPattern { regex: Regex::new("^<").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Less, "<") },
        RegexPattern { regex: Regex::new("^>").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Greater, ">") },
        RegexPattern { regex: Regex::new("^=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Assignment, "=") },
        RegexPattern { regex: Regex::new("^\\+").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Plus, "+") },
        RegexPattern { regex: Regex::new("^-").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Dash, "-") },
        RegexPattern { regex: Regex::new("^\\*").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Star, "*") },
        RegexPattern { regex: Regex::new("^/").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Slash, "/") },
        RegexPattern { regex: Regex::new("^%").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Percent, "%") },
        RegexPattern { regex: Regex::new("^:").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Colon, ":") },
        RegexPattern { regex: Regex::new("^,").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Comma, ",") },
    ];
}

pub struct Lexer {
    tokens: Vec<Token>,
    source: String,
    pub pos: usize,
    file: Arc<String>,
    /// Column widths of the open indentation levels; the bottom is always 0.
    indent_stack: Vec<usize>,
    /// Newlines inside brackets do not end a logical line.
    paren_depth: usize,
    at_line_start: bool,
}

impl Lexer {
    pub fn new(source: String, file: Option<String>) -> Lexer {
        let file_name = Arc::new(file.unwrap_or_else(|| String::from("shell")));

        Lexer {
            tokens: vec![],
            source,
            pos: 0,
            file: file_name,
            indent_stack: vec![0],
            paren_depth: 0,
            at_line_start: true,
        }
    }

    pub fn advance_n(&mut self, n: usize) {
        self.pos += n;
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn remainder(&self) -> &str {
        &self.source[self.pos..]
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// `offset` fits in `u32`, `tokenize` rejects larger sources up front.
    pub fn position(&self, offset: usize) -> Position {
        Position(offset as u32, Arc::clone(&self.file))
    }

    pub fn span_from(&self, start: usize, len: usize) -> Span {
        Span {
            start: self.position(start),
            end: self.position(start + len),
        }
    }

    fn last_kind(&self) -> Option<TokenKind> {
        self.tokens.last().map(|token| token.kind)
    }

    /// Emits `Indent`/`Dedent` tokens for the leading whitespace of a
    /// logical line. Blank and comment-only lines leave the levels untouched.
    fn handle_indentation(&mut self) -> Result<(), Error> {
        let rest = self.remainder();
        let leading = rest.bytes().take_while(|b| *b == b' ' || *b == b'\t').count();
        let after = &rest[leading..];

        if after.is_empty() || after.starts_with('\n') || after.starts_with("\r\n") || after.starts_with('#') {
            self.advance_n(leading);
            return Ok(());
        }

        let width = rest[..leading].chars().fold(0, |column, c| match c {
            '\t' => (column / TAB_WIDTH + 1) * TAB_WIDTH,
            _ => column + 1,
        });
        let current = self.indent_stack.last().copied().unwrap_or(0);

        if width > current {
            let span = self.span_from(self.pos, leading);
            self.push(MK_TOKEN!(TokenKind::Indent, String::from("INDENT"), span));
            self.indent_stack.push(width);
        } else {
            while width < self.indent_stack.last().copied().unwrap_or(0) {
                self.indent_stack.pop();
                let span = self.span_from(self.pos + leading, 0);
                self.push(MK_TOKEN!(TokenKind::Dedent, String::from("DEDENT"), span));
            }

            if self.indent_stack.last().copied().unwrap_or(0) != width {
                return Err(Error::new(ErrorImpl::InconsistentIndentation, self.position(self.pos + leading)));
            }
        }

        self.advance_n(leading);
        Ok(())
    }

    fn finish(mut self) -> Vec<Token> {
        if !matches!(self.last_kind(), None | Some(TokenKind::Newline)) {
            let span = self.span_from(self.pos, 0);
            self.push(MK_TOKEN!(TokenKind::Newline, String::from("\\n"), span));
        }

        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            let span = self.span_from(self.pos, 0);
            self.push(MK_TOKEN!(TokenKind::Dedent, String::from("DEDENT"), span));
        }

        let span = self.span_from(self.pos, 0);
        self.push(MK_TOKEN!(TokenKind::EOF, String::from("EOF"), span));
        self.tokens
    }
}

fn matched_len(lexer: &Lexer, regex: &Regex) -> usize {
    regex.find(lexer.remainder()).map(|m| m.end()).unwrap_or(0)
}

fn newline_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let len = matched_len(lexer, regex);

    if lexer.paren_depth == 0 {
        if !matches!(lexer.last_kind(), None | Some(TokenKind::Newline)) {
            let span = lexer.span_from(lexer.pos, len);
            lexer.push(MK_TOKEN!(TokenKind::Newline, String::from("\\n"), span));
        }
        lexer.at_line_start = true;
    }

    lexer.advance_n(len);
    Ok(())
}

fn skip_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let len = matched_len(lexer, regex);
    lexer.advance_n(len);
    Ok(())
}

fn open_paren_handler(lexer: &mut Lexer, _regex: &Regex) -> Result<(), Error> {
    lexer.paren_depth += 1;
    let span = lexer.span_from(lexer.pos, 1);
    lexer.push(MK_TOKEN!(TokenKind::OpenParen, String::from("("), span));
    lexer.advance_n(1);
    Ok(())
}

fn close_paren_handler(lexer: &mut Lexer, _regex: &Regex) -> Result<(), Error> {
    lexer.paren_depth = lexer.paren_depth.saturating_sub(1);
    let span = lexer.span_from(lexer.pos, 1);
    lexer.push(MK_TOKEN!(TokenKind::CloseParen, String::from(")"), span));
    lexer.advance_n(1);
    Ok(())
}

fn integer_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let len = matched_len(lexer, regex);
    let matched = lexer.remainder()[..len].to_string();

    let span = lexer.span_from(lexer.pos, len);
    lexer.push(MK_TOKEN!(TokenKind::Integer, matched, span));
    lexer.advance_n(len);
    Ok(())
}

fn float_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let len = matched_len(lexer, regex);
    let matched = lexer.remainder()[..len].to_string();

    let span = lexer.span_from(lexer.pos, len);
    lexer.push(MK_TOKEN!(TokenKind::Float, matched, span));
    lexer.advance_n(len);
    Ok(())
}

fn string_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let len = matched_len(lexer, regex);
    let raw = &lexer.remainder()[1..len - 1];

    let mut result = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }

        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('0') => result.push('\0'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('\'') => result.push('\''),
            Some('x') => {
                let mut hex = String::new();
                while hex.len() < 2 {
                    match chars.peek() {
                        Some(c) if c.is_ascii_hexdigit() => {
                            hex.push(*c);
                            chars.next();
                        }
                        _ => break,
                    }
                }

                match u8::from_str_radix(&hex, 16) {
                    Ok(byte) => result.push(char::from(byte)),
                    Err(_) => {
                        result.push_str("\\x");
                        result.push_str(&hex);
                    }
                }
            }
            // Unknown escapes keep their backslash.
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    let span = lexer.span_from(lexer.pos, len);
    lexer.push(MK_TOKEN!(TokenKind::String, result, span));
    lexer.advance_n(len);
    Ok(())
}

fn unterminated_string_handler(lexer: &mut Lexer, _regex: &Regex) -> Result<(), Error> {
    Err(Error::new(ErrorImpl::UnterminatedString, lexer.position(lexer.pos)))
}

fn symbol_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let len = matched_len(lexer, regex);
    let value = lexer.remainder()[..len].to_string();
    let kind = RESERVED_LOOKUP.get(value.as_str()).copied().unwrap_or(TokenKind::Identifier);

    let span = lexer.span_from(lexer.pos, len);
    lexer.push(MK_TOKEN!(kind, value, span));
    lexer.advance_n(len);
    Ok(())
}

/// Positions are `u32` byte offsets; every offset up to and including the
/// end of a source of `len` bytes must fit.
pub fn ensure_addressable(len: usize) -> Result<(), Error> {
    match u32::try_from(len) {
        Ok(_) => Ok(()),
        Err(_) => Err(Error::unlocated(ErrorImpl::SourceTooLarge {
            size: len,
            max: u32::MAX,
        })),
    }
}

pub fn tokenize(source: String, file: Option<String>) -> Result<Vec<Token>, Error> {
    ensure_addressable(source.len())?;
    let mut lex = Lexer::new(source, file);

    while !lex.at_eof() {
        if lex.at_line_start && lex.paren_depth == 0 {
            lex.at_line_start = false;
            lex.handle_indentation()?;
            continue;
        }

        let pattern = PATTERNS.iter().find(|pattern| pattern.regex.is_match(lex.remainder()));

        match pattern {
            Some(pattern) => (pattern.handler)(&mut lex, &pattern.regex)?,
            None => {
                let token = lex.remainder().chars().next().map(String::from).unwrap_or_default();
                return Err(Error::new(ErrorImpl::UnrecognisedToken { token }, lex.position(lex.pos)));
            }
        }
    }

    Ok(lex.finish())
}
