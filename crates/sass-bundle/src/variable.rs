//! Variable declarations and the table that consolidates them.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Records live in an arena and are addressed by [`VariableId`]. A key that
//! is declared again mutates its existing slot, so anything already holding
//! the id keeps pointing at the current value.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// A `$name` reference anywhere in a value.
static VARIABLE_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$[A-Za-z_][A-Za-z0-9_-]*").unwrap());

/// An assignment at the start of a block statement: `{$name:` or `;$name:`.
static BLOCK_ASSIGNMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[{;]\$([A-Za-z_][A-Za-z0-9_-]*):").unwrap());

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Every `$name` read in `text`, first occurrence order, without duplicates.
///
/// Module members such as `math.$pi` belong to another namespace and are
/// skipped.
pub fn variable_references(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for m in VARIABLE_REFERENCE.find_iter(text) {
        if text[..m.start()].ends_with('.') {
            continue;
        }
        if !names.iter().any(|n| n == m.as_str()) {
            names.push(m.as_str().to_string());
        }
    }
    names
}

/// Replace whole-identifier occurrences of `key` (e.g. `$s`, not `$size`).
pub fn replace_identifier(text: &str, key: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find(key) {
        let after = &rest[idx + key.len()..];
        out.push_str(&rest[..idx]);
        if after.chars().next().is_some_and(is_identifier_char) {
            out.push_str(key);
        } else {
            out.push_str(replacement);
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

/// Byte offset of the first `{` outside a string literal.
pub(crate) fn find_block_start(text: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (idx, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match quote {
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '{' => return Some(idx),
            None => {}
        }
    }
    None
}

/// Stable handle into a [`VariableTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(usize);

impl VariableId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableKind {
    /// `$name: value;`
    Simple,
    /// One `@if`/`@else if`/`@else` branch whose body assigns variables.
    Conditional {
        /// Variables read by the branch condition
        condition_dependencies: Vec<String>,
        /// Variables assigned in the branch body ("dependers")
        assignees: Vec<String>,
        /// `@else` branches following an `@if`; always empty on the branches themselves
        else_chain: Vec<Variable>,
    },
}

/// A variable declaration or a conditional block that assigns variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    /// `$name` for simple variables; the branch head (`@if $a==1`) for conditionals
    pub key: String,
    /// Statement text, terminator included
    pub declaration: String,
    /// Names read by the declaration, unresolved
    pub raw_dependencies: Vec<String>,
    /// The value reads the variable's own key
    pub self_dependent: bool,
    pub kind: VariableKind,
}

impl Variable {
    /// Build from a statement: `$…` is a simple variable, `@…` a conditional.
    pub fn from_statement(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.starts_with('$') {
            Some(Self::simple(text))
        } else if text.starts_with('@') {
            Some(Self::conditional(text))
        } else {
            None
        }
    }

    pub fn simple(text: &str) -> Self {
        let text = text.trim();
        let (key, value) = match text.find(':') {
            Some(idx) => (text[..idx].trim(), &text[idx + 1..]),
            None => (text.trim_end_matches(';').trim(), ""),
        };
        let raw_dependencies = variable_references(value);
        let self_dependent = raw_dependencies.iter().any(|name| name == key);

        Self {
            key: key.to_string(),
            declaration: text.to_string(),
            raw_dependencies,
            self_dependent,
            kind: VariableKind::Simple,
        }
    }

    pub fn conditional(text: &str) -> Self {
        let text = text.trim();
        let (head, body) = match find_block_start(text) {
            Some(idx) => (&text[..idx], &text[idx..]),
            None => (text, ""),
        };

        let mut assignees: Vec<String> = Vec::new();
        for captures in BLOCK_ASSIGNMENT.captures_iter(body) {
            let name = format!("${}", &captures[1]);
            if !assignees.contains(&name) {
                assignees.push(name);
            }
        }

        // Reads of the block's own assignees are satisfied by the block itself.
        let raw_dependencies = variable_references(body)
            .into_iter()
            .filter(|name| !assignees.contains(name))
            .collect();

        Self {
            key: head.trim().to_string(),
            declaration: text.to_string(),
            raw_dependencies,
            self_dependent: false,
            kind: VariableKind::Conditional {
                condition_dependencies: variable_references(head),
                assignees,
                else_chain: Vec::new(),
            },
        }
    }

    pub fn is_conditional(&self) -> bool {
        matches!(self.kind, VariableKind::Conditional { .. })
    }

    /// Right-hand side of a simple declaration, without the trailing `;`.
    pub fn value(&self) -> &str {
        let value = match self.declaration.find(':') {
            Some(idx) => &self.declaration[idx + 1..],
            None => "",
        };
        value.trim_end_matches(';').trim()
    }

    /// Take over every field of `other`, keeping this record's slot.
    pub fn replace_by(&mut self, other: Variable) {
        *self = other;
    }

    /// Merge a self-referencing redeclaration into this record.
    ///
    /// Every occurrence of the key in `other`'s value is replaced by this
    /// record's current value: `$s: ();` followed by
    /// `$s: map-merge((a:1),$s);` becomes `$s:map-merge((a:1),());`.
    pub fn apply_self_call(&mut self, other: &Variable) {
        let old_value = self.value().to_string();
        let new_value = replace_identifier(other.value(), &self.key, &old_value);

        self.declaration = format!("{}:{};", self.key, new_value);
        self.raw_dependencies = variable_references(&new_value);
        self.self_dependent = false;
    }

    /// Append an `@else` branch to this conditional.
    ///
    /// Returns the branch back if this record is not a conditional.
    pub fn push_else(&mut self, branch: Variable) -> Result<(), Variable> {
        match &mut self.kind {
            VariableKind::Conditional { else_chain, .. } => {
                else_chain.push(branch);
                Ok(())
            }
            VariableKind::Simple => Err(branch),
        }
    }

    /// Text emitted for this record, `@else` branches included.
    pub fn emitted_text(&self) -> String {
        match &self.kind {
            VariableKind::Simple => self.declaration.clone(),
            VariableKind::Conditional { else_chain, .. } => {
                let mut text = self.declaration.clone();
                for branch in else_chain {
                    text.push_str(&branch.declaration);
                }
                text
            }
        }
    }

    /// The record and its `@else` branches, in source order.
    pub fn branches(&self) -> impl Iterator<Item = &Variable> {
        let chain: &[Variable] = match &self.kind {
            VariableKind::Conditional { else_chain, .. } => else_chain,
            VariableKind::Simple => &[],
        };
        std::iter::once(self).chain(chain.iter())
    }
}

/// Symbol table and arena of every variable seen during a pass.
///
/// Simple variables are unique by key; conditionals are never keyed.
/// Iteration follows first-declaration order.
#[derive(Debug, Default)]
pub struct VariableTable {
    records: Vec<Variable>,
    by_key: HashMap<String, VariableId>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a declaration, consolidating it with an earlier one of the same key.
    ///
    /// A redeclaration replaces the existing record in place, unless it reads
    /// its own key, in which case it is spliced onto the previous value.
    pub fn declare(&mut self, variable: Variable) -> VariableId {
        if variable.is_conditional() {
            return self.push(variable);
        }

        match self.by_key.get(&variable.key).copied() {
            Some(id) => {
                let existing = &mut self.records[id.0];
                if variable.self_dependent {
                    tracing::trace!(key = %variable.key, "Merging self-referencing redeclaration");
                    existing.apply_self_call(&variable);
                } else {
                    tracing::trace!(key = %variable.key, "Replacing redeclared variable");
                    existing.replace_by(variable);
                }
                id
            }
            None => {
                let key = variable.key.clone();
                let id = self.push(variable);
                self.by_key.insert(key, id);
                id
            }
        }
    }

    fn push(&mut self, variable: Variable) -> VariableId {
        let id = VariableId(self.records.len());
        self.records.push(variable);
        id
    }

    pub fn get(&self, id: VariableId) -> &Variable {
        &self.records[id.0]
    }

    pub fn get_mut(&mut self, id: VariableId) -> &mut Variable {
        &mut self.records[id.0]
    }

    /// Resolve a `$name` against the simple variables.
    pub fn lookup(&self, key: &str) -> Option<VariableId> {
        self.by_key.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VariableId, &Variable)> {
        self.records
            .iter()
            .enumerate()
            .map(|(idx, var)| (VariableId(idx), var))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
