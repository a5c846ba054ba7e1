//! Options controlling a bundling pass.
//!
//! Copyright (c) 2025 Posit, PBC

/// Options for [`Document::load`](crate::Document::load).
///
/// # Example
///
/// ```rust
/// use sass_bundle::BundleOptions;
///
/// let options = BundleOptions::default().with_root_uri("/static/");
/// assert_eq!(options.root_uri, "/static/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleOptions {
    /// Replacement for the `~/` prefix in statement text.
    ///
    /// Any value is accepted; it is substituted verbatim.
    pub root_uri: String,
}

impl BundleOptions {
    pub fn new(root_uri: impl Into<String>) -> Self {
        Self {
            root_uri: root_uri.into(),
        }
    }

    pub fn with_root_uri(mut self, root_uri: impl Into<String>) -> Self {
        self.root_uri = root_uri.into();
        self
    }
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self::new("/")
    }
}
