//! SCSS consolidation engine.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Turns a stylesheet and the partials it imports into one self-contained
//! SCSS text that a downstream compiler can evaluate deterministically:
//!
//! - comments and insignificant whitespace are stripped
//! - `@import`ed partials are inlined where they are imported
//! - repeated `$variable` declarations are merged into one record
//! - variables are emitted in dependency order, after mixins and before rules
//!
//! Nothing is evaluated: values, mixins and `@if` conditions are carried
//! through as text.

mod config;
mod document;
mod error;
mod graph;
mod hash;
mod import;
mod inclusion;
mod scanner;
mod statement;
mod variable;

pub use config::BundleOptions;
pub use document::{BundleStats, Document};
pub use error::BundleError;
pub use graph::DependencyGraph;
pub use hash::calculate_folder_hash;
pub use import::{candidate_paths, import_targets, is_css_import, resolve_import};
pub use inclusion::InclusionStack;
pub use scanner::{Scanner, clean};
pub use statement::{RawStatement, StatementKind, StatementSplitter, Terminator, classify};
pub use variable::{Variable, VariableId, VariableKind, VariableTable};
