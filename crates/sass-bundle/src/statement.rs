//! Splitting the cleaned stream into top-level statements and classifying them.
//!
//! Copyright (c) 2025 Posit, PBC

use crate::variable::find_block_start;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// How a statement ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// `;` at brace depth zero
    Semicolon,
    /// `}` closing the outermost block
    Brace,
    /// Stream ran out with text still pending
    EndOfInput,
}

/// One complete top-level statement, terminator included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStatement {
    pub text: String,
    pub terminator: Terminator,
}

/// Accumulates characters until a top-level statement is complete.
///
/// Braces and semicolons inside string literals are ignored, and so are the
/// braces of `#{...}` interpolation.
#[derive(Debug, Default)]
pub struct StatementSplitter {
    buffer: String,
    depth: i32,
    interpolation: u32,
    quote: Option<char>,
    escaped: bool,
}

impl StatementSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one character; returns the statement it completes, if any.
    pub fn push(&mut self, c: char, root_uri: &str) -> Option<RawStatement> {
        if c == BYTE_ORDER_MARK {
            return None;
        }
        let after_hash = self.buffer.ends_with('#');
        self.buffer.push(c);

        if self.escaped {
            self.escaped = false;
            return None;
        }

        if let Some(q) = self.quote {
            if c == '\\' {
                self.escaped = true;
            } else if c == q {
                self.quote = None;
            }
            return None;
        }

        match c {
            '"' | '\'' => self.quote = Some(c),
            '\\' => self.escaped = true,
            '{' if after_hash => self.interpolation += 1,
            '{' => self.depth += 1,
            '}' if self.interpolation > 0 => self.interpolation -= 1,
            '}' => {
                self.depth -= 1;
                if self.depth <= 0 {
                    self.depth = 0;
                    return Some(self.emit(Terminator::Brace, root_uri));
                }
            }
            ';' if self.depth == 0 => return Some(self.emit(Terminator::Semicolon, root_uri)),
            _ => {}
        }
        None
    }

    /// Flush whatever is left once the stream is exhausted.
    pub fn finish(mut self, root_uri: &str) -> Option<RawStatement> {
        if self.buffer.trim().is_empty() {
            return None;
        }
        Some(self.emit(Terminator::EndOfInput, root_uri))
    }

    fn emit(&mut self, terminator: Terminator, root_uri: &str) -> RawStatement {
        let mut text = std::mem::take(&mut self.buffer);
        self.interpolation = 0;
        self.quote = None;
        self.escaped = false;

        if text.contains("~/") {
            text = text.replace("~/", root_uri);
        }
        if terminator != Terminator::Brace {
            if let Some(stripped) = strip_default_flag(&text) {
                text = stripped;
            }
        }

        RawStatement { text, terminator }
    }
}

/// Drop a trailing `!default`; every declaration is treated as overridable.
fn strip_default_flag(text: &str) -> Option<String> {
    const FLAG: &str = "!default";

    let (body, terminator) = match text.strip_suffix(';') {
        Some(body) => (body, ";"),
        None => (text, ""),
    };
    let body = body.trim_end();
    let split = body.len().checked_sub(FLAG.len())?;
    let flag = body.get(split..)?;
    if !flag.eq_ignore_ascii_case(FLAG) {
        return None;
    }
    Some(format!("{}{}", body[..split].trim_end(), terminator))
}

/// Where a statement goes in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// `@import` of SCSS partials, inlined into the stream
    Import,
    /// `@use`, `@forward`, `@charset`
    Use,
    /// `$name: value;`
    Variable,
    /// `@mixin` or `@function`
    Mixin,
    /// `@if` block; `assigns_variables` when its body opens with an assignment
    If { assigns_variables: bool },
    /// `@else` / `@else if` continuing the previous `@if`
    Else,
    /// Anything else, plain CSS imports included
    Rule,
}

/// Whether `text` starts with the at-rule `name` as a whole word.
fn has_directive(text: &str, name: &str) -> bool {
    text.strip_prefix(name)
        .is_some_and(|rest| !rest.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_'))
}

/// Classify a statement by its structural prefix.
pub fn classify(text: &str) -> StatementKind {
    let text = text.trim();

    if has_directive(text, "@import") {
        if crate::import::is_css_import(text) {
            StatementKind::Rule
        } else {
            StatementKind::Import
        }
    } else if has_directive(text, "@use")
        || has_directive(text, "@forward")
        || has_directive(text, "@charset")
    {
        StatementKind::Use
    } else if text.starts_with('$') {
        StatementKind::Variable
    } else if has_directive(text, "@function") || has_directive(text, "@mixin") {
        StatementKind::Mixin
    } else if has_directive(text, "@if") {
        StatementKind::If {
            assigns_variables: body_opens_with_assignment(text),
        }
    } else if has_directive(text, "@else") {
        StatementKind::Else
    } else {
        StatementKind::Rule
    }
}

/// The first token inside the opening `{` is a `$variable`.
fn body_opens_with_assignment(text: &str) -> bool {
    find_block_start(text).is_some_and(|idx| text[idx + 1..].trim_start().starts_with('$'))
}
