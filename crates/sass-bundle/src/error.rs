//! Error types for bundling operations.
//!
//! Copyright (c) 2025 Posit, PBC

use std::path::PathBuf;

use sass_bundle_runtime::RuntimeError;
use thiserror::Error;

/// Errors that abort a bundling pass.
///
/// Every variant is fatal: a pass either produces a complete, ordered
/// document or one of these.
#[derive(Debug, Error)]
pub enum BundleError {
    /// Two or more declarations depend on each other
    #[error("Dependency cycle detected at `{declaration}` (via `{dependency}`)")]
    DependencyCycle {
        declaration: String,
        dependency: String,
    },

    /// A declaration reads a variable that is never declared
    #[error("Undefined variable {name} in `{declaration}`")]
    UndefinedVariable { name: String, declaration: String },

    /// `@else` appeared without an `@if` directly before it
    #[error("@else without a preceding @if: `{excerpt}`")]
    ElseWithoutIf { excerpt: String },

    /// A file imports itself, directly or through other imports
    #[error("Circular import of {}", .path.display())]
    CircularImport { path: PathBuf },

    /// File system failure, passed through untouched
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Shorten statement text for error messages.
pub(crate) fn excerpt(text: &str) -> String {
    const MAX: usize = 80;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_truncates_long_text() {
        let long = "x".repeat(200);
        let short = excerpt(&long);
        assert_eq!(short.len(), 83);
        assert!(short.ends_with("..."));
        assert_eq!(excerpt("@else{}"), "@else{}");
    }

    #[test]
    fn test_error_messages() {
        let err = BundleError::UndefinedVariable {
            name: "$missing".to_string(),
            declaration: "$a:$missing;".to_string(),
        };
        assert!(err.to_string().contains("$missing"));

        let err = BundleError::CircularImport {
            path: PathBuf::from("/p/_a.scss"),
        };
        assert!(err.to_string().contains("/p/_a.scss"));
    }
}
