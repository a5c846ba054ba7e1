//! Comment and whitespace stripping for one raw SCSS buffer.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! The scanner produces the cleaned character sequence the statement
//! splitter consumes:
//!
//! - `// line` and `/* block */` comments are removed
//! - `\r`, `\n` and `\t` become spaces and runs of spaces collapse to one
//! - spaces around `{ } ; : , < > =` are dropped
//! - a `;` directly before `}` or another `;` is dropped
//!
//! String literals are copied verbatim, so `"a // b"` and `'/* x */'` keep
//! their content and never open a comment.

/// Characters that never need surrounding whitespace.
fn is_tight(c: char) -> bool {
    matches!(c, '{' | '}' | ';' | ':' | ',' | '<' | '>' | '=')
}

/// Clean a raw buffer into its compact form.
///
/// ```
/// use sass_bundle::clean;
///
/// let cleaned = clean("/* c */ $x :  1px ;  // trailing\n.a{color:red}");
/// assert_eq!(cleaned, "$x:1px;.a{color:red}");
/// ```
pub fn clean(source: &str) -> String {
    clean_chars(source).into_iter().collect()
}

/// Cursor over the cleaned form of one source buffer.
#[derive(Debug, Clone)]
pub struct Scanner {
    chars: Vec<char>,
    position: usize,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Self {
            chars: clean_chars(source),
            position: 0,
        }
    }

    /// Length of the cleaned sequence.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Character under the cursor, without advancing.
    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    /// Random access into the cleaned sequence.
    pub fn char_at(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.chars.len()
    }
}

impl Iterator for Scanner {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        let c = self.chars.get(self.position).copied()?;
        self.position += 1;
        Some(c)
    }
}

fn clean_chars(source: &str) -> Vec<char> {
    let input: Vec<char> = source.chars().collect();
    let mut out: Vec<char> = Vec::with_capacity(input.len());
    let mut quote: Option<char> = None;
    let mut in_url = false;
    let mut i = 0;

    while i < input.len() {
        let c = input[i];
        let next = input.get(i + 1).copied();

        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = next {
                    out.push(escaped);
                    i += 2;
                    continue;
                }
            } else if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match c {
            '"' | '\'' => {
                quote = Some(c);
                out.push(c);
            }
            '\\' => {
                out.push(c);
                if let Some(escaped) = next {
                    out.push(escaped);
                    i += 1;
                }
            }
            '/' if next == Some('/') && !in_url => {
                // The newline itself is left for the whitespace branch.
                while i < input.len() && input[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            '/' if next == Some('*') => {
                i += 2;
                while i < input.len() && !(input[i] == '*' && input.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
                push_space(&mut out);
                continue;
            }
            ' ' | '\r' | '\n' | '\t' => push_space(&mut out),
            ';' => {
                trim_space(&mut out);
                if out.last() != Some(&';') {
                    out.push(';');
                }
            }
            '}' => {
                trim_space(&mut out);
                if out.last() == Some(&';') {
                    out.pop();
                }
                out.push('}');
            }
            '(' => {
                in_url = out.ends_with(&['u', 'r', 'l']);
                out.push(c);
            }
            ')' => {
                in_url = false;
                out.push(c);
            }
            c if is_tight(c) => {
                trim_space(&mut out);
                out.push(c);
            }
            _ => out.push(c),
        }
        i += 1;
    }

    trim_space(&mut out);
    out
}

fn push_space(out: &mut Vec<char>) {
    match out.last() {
        None | Some(' ') => {}
        Some(&c) if is_tight(c) => {}
        _ => out.push(' '),
    }
}

fn trim_space(out: &mut Vec<char>) {
    while out.last() == Some(&' ') {
        out.pop();
    }
}
