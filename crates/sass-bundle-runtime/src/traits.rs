/*
 * traits.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Defines the SystemRuntime trait and supporting types for the runtime abstraction layer.
 *
 * The consolidation engine never touches std::fs directly; every read, existence
 * check and write goes through this trait so the same bundling pass can run
 * against the real file system or an in-memory one.
 */

use std::io;
use std::path::{Path, PathBuf};

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug)]
pub enum RuntimeError {
    /// Standard I/O error
    Io(io::Error),

    /// SASS compilation failed
    SassError(String),
}

impl RuntimeError {
    /// The underlying I/O error kind, if this is an I/O failure.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            RuntimeError::Io(e) => Some(e.kind()),
            RuntimeError::SassError(_) => None,
        }
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::Io(e) => write!(f, "I/O error: {}", e),
            RuntimeError::SassError(msg) => write!(f, "SASS compilation error: {}", msg),
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RuntimeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RuntimeError {
    fn from(e: io::Error) -> Self {
        RuntimeError::Io(e)
    }
}

/// Type of filesystem path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Regular file
    File,
    /// Directory
    Directory,
}

/// Trait defining the file-system operations the bundler needs.
///
/// Implementations provide the actual system interaction, allowing the
/// engine to run against the real disk (`NativeRuntime`) or a virtual file
/// system (`MemoryRuntime`).
///
/// Errors are reported as `RuntimeError::Io` carrying the original
/// `io::ErrorKind`, so callers can tell a missing file from other failures.
pub trait SystemRuntime: Send + Sync {
    // ═══════════════════════════════════════════════════════════════════════
    // FILE OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════

    /// Read entire file contents as bytes.
    fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Read file as string with UTF-8 encoding.
    ///
    /// Default implementation reads bytes and converts to string.
    fn file_read_string(&self, path: &Path) -> RuntimeResult<String> {
        let bytes = self.file_read(path)?;
        String::from_utf8(bytes).map_err(|e| {
            RuntimeError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid UTF-8 in file {}: {}", path.display(), e),
            ))
        })
    }

    /// Write bytes to file (creates or overwrites).
    fn file_write(&self, path: &Path, contents: &[u8]) -> RuntimeResult<()>;

    /// Check if path exists, optionally filtering by type.
    fn path_exists(&self, path: &Path, kind: Option<PathKind>) -> RuntimeResult<bool>;

    /// Check if path exists and is a file.
    ///
    /// Convenience method that calls `path_exists` with `PathKind::File`.
    fn is_file(&self, path: &Path) -> RuntimeResult<bool> {
        self.path_exists(path, Some(PathKind::File))
    }

    /// Check if path exists and is a directory.
    ///
    /// Convenience method that calls `path_exists` with `PathKind::Directory`.
    fn is_dir(&self, path: &Path) -> RuntimeResult<bool> {
        self.path_exists(path, Some(PathKind::Directory))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // DIRECTORY OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════

    /// Create directory (optionally with parents).
    fn dir_create(&self, path: &Path, recursive: bool) -> RuntimeResult<()>;

    /// List directory entries (excluding . and ..).
    ///
    /// Entries are returned as full paths, in no particular order.
    fn dir_list(&self, path: &Path) -> RuntimeResult<Vec<PathBuf>>;

    /// Get current working directory.
    fn cwd(&self) -> RuntimeResult<PathBuf>;
}
