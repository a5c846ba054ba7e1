//! SASS compilation using the grass crate (native only).
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! The bundler only consolidates SCSS text; turning it into CSS is the job
//! of a downstream compiler. This module is that compiler for native callers:
//! - `RuntimeFs`: Adapter implementing `grass::Fs` for our `SystemRuntime`
//! - `compile_scss`: High-level function for SCSS compilation

use std::fmt::Debug;
use std::io;
use std::path::{Path, PathBuf};

use grass::{Options, OutputStyle};

use crate::traits::{RuntimeError, RuntimeResult, SystemRuntime};

/// Adapter that implements `grass::Fs` using a `SystemRuntime`.
///
/// Any `@use`/`@import` left in a bundle (for example `@use "sass:math"`
/// module loads resolved from load paths) is read through the same runtime
/// the bundle came from.
pub struct RuntimeFs<'a> {
    runtime: &'a dyn SystemRuntime,
}

impl<'a> RuntimeFs<'a> {
    /// Create a new RuntimeFs adapter wrapping the given runtime.
    pub fn new(runtime: &'a dyn SystemRuntime) -> Self {
        Self { runtime }
    }
}

impl Debug for RuntimeFs<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeFs")
            .field("runtime", &"<SystemRuntime>")
            .finish()
    }
}

impl grass::Fs for RuntimeFs<'_> {
    fn is_dir(&self, path: &Path) -> bool {
        self.runtime.is_dir(path).unwrap_or(false)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.runtime.is_file(path).unwrap_or(false)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.runtime.file_read(path).map_err(|e| match e {
            RuntimeError::Io(inner) => inner,
            other => io::Error::other(other.to_string()),
        })
    }
}

/// Compile SCSS source to CSS using grass.
///
/// # Arguments
///
/// * `runtime` - The runtime to use for file system access
/// * `scss` - The SCSS source code to compile
/// * `load_paths` - Directories to search for @use/@import resolution
/// * `minified` - Whether to produce compressed output
///
/// # Returns
///
/// Compiled CSS string on success, `RuntimeError::SassError` on failure.
pub fn compile_scss(
    runtime: &dyn SystemRuntime,
    scss: &str,
    load_paths: &[PathBuf],
    minified: bool,
) -> RuntimeResult<String> {
    let fs = RuntimeFs::new(runtime);

    let style = if minified {
        OutputStyle::Compressed
    } else {
        OutputStyle::Expanded
    };

    let options = Options::default()
        .fs(&fs)
        .load_paths(load_paths)
        .style(style);

    grass::from_string(scss, &options).map_err(|e| RuntimeError::SassError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryRuntime, NativeRuntime};

    #[test]
    fn test_compile_simple_scss() {
        let runtime = NativeRuntime::new();
        let scss = "$primary: #007bff; .btn { color: $primary; }";

        let css = compile_scss(&runtime, scss, &[], false).unwrap();

        assert!(css.contains(".btn"));
        assert!(css.contains("#007bff"));
    }

    #[test]
    fn test_compile_scss_minified() {
        let runtime = NativeRuntime::new();
        let scss = "$primary: blue;\n\n.btn {\n  color: $primary;\n}";

        let css = compile_scss(&runtime, scss, &[], true).unwrap();

        assert!(!css.contains("\n\n"));
        assert!(css.contains(".btn"));
        assert!(css.contains("blue"));
    }

    #[test]
    fn test_compile_reads_through_runtime() {
        let runtime = MemoryRuntime::new();
        runtime.add_file("/project/lib/_extra.scss", ".extra { margin: 0; }");

        let css = compile_scss(
            &runtime,
            "@import \"extra\";",
            &[PathBuf::from("/project/lib")],
            false,
        )
        .unwrap();

        assert!(css.contains(".extra"));
    }

    #[test]
    fn test_compile_error_is_sass_error() {
        let runtime = NativeRuntime::new();
        let err = compile_scss(&runtime, ".a { color: $undefined; }", &[], false).unwrap_err();
        assert!(matches!(err, RuntimeError::SassError(_)));
    }
}
