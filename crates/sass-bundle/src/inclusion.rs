//! A single character stream spanning a file and everything it imports.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Imports are inlined depth-first at the point they appear: `import` parks
//! the current frame on an explicit stack and starts reading the imported
//! file; when that file runs out, the parent resumes exactly where it
//! stopped. Nesting depth is bounded by the heap-allocated stack, never by
//! native recursion.

use std::path::{Path, PathBuf};

use sass_bundle_runtime::SystemRuntime;

use crate::error::BundleError;
use crate::import::resolve_import;
use crate::scanner::Scanner;

/// One open source buffer.
#[derive(Debug)]
struct Frame {
    scanner: Scanner,
    working_dir: PathBuf,
    /// File the frame was read from; `None` for in-memory entry content.
    path: Option<PathBuf>,
    /// Has yielded at least one character. Frames parked by a multi-target
    /// `@import` before being read are not part of the import chain yet.
    started: bool,
}

pub struct InclusionStack<'a> {
    runtime: &'a dyn SystemRuntime,
    current: Frame,
    parents: Vec<Frame>,
    root_uri: String,
    files_read: usize,
}

impl<'a> InclusionStack<'a> {
    /// Start a stream over in-memory content.
    pub fn new(
        runtime: &'a dyn SystemRuntime,
        content: &str,
        working_dir: impl Into<PathBuf>,
        root_uri: impl Into<String>,
    ) -> Self {
        Self {
            runtime,
            current: Frame {
                scanner: Scanner::new(content),
                working_dir: working_dir.into(),
                path: None,
                started: false,
            },
            parents: Vec::new(),
            root_uri: root_uri.into(),
            files_read: 0,
        }
    }

    /// Start a stream over a file on the runtime.
    pub fn open(
        runtime: &'a dyn SystemRuntime,
        path: &Path,
        root_uri: impl Into<String>,
    ) -> Result<Self, BundleError> {
        let content = runtime.file_read_string(path)?;
        let working_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        tracing::debug!(path = %path.display(), "Loaded main stylesheet");

        let mut stack = Self::new(runtime, &content, working_dir, root_uri);
        stack.current.path = Some(path.to_path_buf());
        stack.files_read = 1;
        Ok(stack)
    }

    /// Inline `target`, resolved against the current frame's directory.
    ///
    /// The imported file becomes the current frame; the importer resumes
    /// once it is exhausted.
    pub fn import(&mut self, target: &str) -> Result<(), BundleError> {
        let path = resolve_import(self.runtime, &self.current.working_dir, target)?;

        let already_open = std::iter::once(&self.current)
            .chain(self.parents.iter())
            .filter(|frame| frame.started)
            .any(|frame| frame.path.as_deref() == Some(path.as_path()));
        if already_open {
            return Err(BundleError::CircularImport { path });
        }

        let content = self.runtime.file_read_string(&path)?;
        tracing::debug!(
            import = target,
            path = %path.display(),
            depth = self.parents.len() + 1,
            "Inlining import"
        );

        let frame = Frame {
            scanner: Scanner::new(&content),
            working_dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            path: Some(path),
            started: false,
        };
        let parent = std::mem::replace(&mut self.current, frame);
        self.parents.push(parent);
        self.files_read += 1;
        Ok(())
    }

    /// Directory relative imports currently resolve against.
    pub fn working_dir(&self) -> &Path {
        &self.current.working_dir
    }

    /// Replacement for `~/` in statement text; shared by every frame.
    pub fn root_uri(&self) -> &str {
        &self.root_uri
    }

    /// Number of frames waiting for the current one to finish.
    pub fn depth(&self) -> usize {
        self.parents.len()
    }

    pub fn files_read(&self) -> usize {
        self.files_read
    }
}

impl Iterator for InclusionStack<'_> {
    type Item = char;

    /// Next character of the whole bundle; `None` only once every frame,
    /// including the bottom one, is exhausted.
    fn next(&mut self) -> Option<char> {
        loop {
            if let Some(c) = self.current.scanner.next() {
                self.current.started = true;
                return Some(c);
            }
            self.current = self.parents.pop()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sass_bundle_runtime::MemoryRuntime;

    fn drain(stack: &mut InclusionStack<'_>, n: usize) -> String {
        stack.by_ref().take(n).collect()
    }

    #[test]
    fn test_import_inserts_at_current_position() {
        let rt = MemoryRuntime::new();
        rt.add_file("/p/_a.scss", "$a: 1;");

        let mut stack = InclusionStack::new(&rt, "X;Y;", "/p", "/");
        assert_eq!(drain(&mut stack, 2), "X;");
        stack.import("a").unwrap();
        assert_eq!(stack.depth(), 1);
        let rest: String = stack.by_ref().collect();
        assert_eq!(rest, "$a:1;Y;");
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_nested_imports_use_own_working_dir() {
        let rt = MemoryRuntime::new();
        rt.add_file("/p/sub/_outer.scss", "O;");
        rt.add_file("/p/sub/_inner.scss", "I;");

        let mut stack = InclusionStack::new(&rt, "M;", "/p", "/");
        stack.import("sub/outer").unwrap();
        assert_eq!(stack.working_dir(), Path::new("/p/sub"));
        assert_eq!(drain(&mut stack, 2), "O;");
        stack.import("inner").unwrap();
        assert_eq!(stack.depth(), 2);

        let rest: String = stack.by_ref().collect();
        assert_eq!(rest, "I;M;");
        assert_eq!(stack.files_read(), 2);
    }

    #[test]
    fn test_missing_import_is_runtime_error() {
        let rt = MemoryRuntime::new();
        let mut stack = InclusionStack::new(&rt, "", "/p", "/");
        let err = stack.import("missing").unwrap_err();
        match err {
            BundleError::Runtime(e) => {
                assert_eq!(e.io_kind(), Some(std::io::ErrorKind::NotFound))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_self_import_is_circular() {
        let rt = MemoryRuntime::new();
        rt.add_file("/p/main.scss", "@import \"main\";");

        let mut stack = InclusionStack::open(&rt, Path::new("/p/main.scss"), "/").unwrap();
        assert_eq!(drain(&mut stack, 15), "@import \"main\";");
        let err = stack.import("main.scss").unwrap_err();
        assert!(matches!(err, BundleError::CircularImport { .. }));
    }

    #[test]
    fn test_parked_sibling_is_not_circular() {
        let rt = MemoryRuntime::new();
        rt.add_file("/p/_a.scss", "@import \"b\";");
        rt.add_file("/p/_b.scss", "B;");

        // `@import "a", "b";` parks b, then reads a, which imports b itself
        let mut stack = InclusionStack::new(&rt, "", "/p", "/");
        stack.import("b").unwrap();
        stack.import("a").unwrap();
        assert_eq!(drain(&mut stack, 12), "@import \"b\";");
        stack.import("b").unwrap();

        let rest: String = stack.by_ref().collect();
        assert_eq!(rest, "B;B;");
    }

    #[test]
    fn test_root_uri_shared() {
        let rt = MemoryRuntime::new();
        rt.add_file("/p/_a.scss", "");
        let mut stack = InclusionStack::new(&rt, "", "/p", "/static/");
        stack.import("a").unwrap();
        assert_eq!(stack.root_uri(), "/static/");
    }
}
