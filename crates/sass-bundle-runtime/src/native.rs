/*
 * native.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * NativeRuntime implementation using std::fs.
 */

use std::path::{Path, PathBuf};

use crate::traits::{PathKind, RuntimeResult, SystemRuntime};

/// Runtime with full access to the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRuntime;

impl NativeRuntime {
    /// Create a new native runtime.
    pub fn new() -> Self {
        Self
    }
}

impl SystemRuntime for NativeRuntime {
    fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }

    fn file_write(&self, path: &Path, contents: &[u8]) -> RuntimeResult<()> {
        Ok(std::fs::write(path, contents)?)
    }

    fn path_exists(&self, path: &Path, kind: Option<PathKind>) -> RuntimeResult<bool> {
        let metadata = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        Ok(match kind {
            None => true,
            Some(PathKind::File) => metadata.is_file(),
            Some(PathKind::Directory) => metadata.is_dir(),
        })
    }

    fn dir_create(&self, path: &Path, recursive: bool) -> RuntimeResult<()> {
        if recursive {
            std::fs::create_dir_all(path)?;
        } else {
            std::fs::create_dir(path)?;
        }
        Ok(())
    }

    fn dir_list(&self, path: &Path) -> RuntimeResult<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path)? {
            entries.push(entry?.path());
        }
        Ok(entries)
    }

    fn cwd(&self) -> RuntimeResult<PathBuf> {
        Ok(std::env::current_dir()?)
    }
}
