/*
 * memory.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * MemoryRuntime: an in-memory virtual file system.
 *
 * Used by tests and by hosts that hand the bundler sources that never
 * touch a disk (editors, WASM builds, build servers with cached inputs).
 */

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::{PathKind, RuntimeError, RuntimeResult, SystemRuntime};

/// Helper function to create a "not found" error.
fn not_found_error(path: &Path) -> RuntimeError {
    RuntimeError::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!("Path not found: {}", path.display()),
    ))
}

/// In-memory file tree.
///
/// Directories are implied by the files added to them; every path is stored
/// normalized and absolute (relative paths resolve against the project root).
#[derive(Debug, Default)]
struct VirtualFileSystem {
    /// File contents, keyed by normalized absolute path
    files: HashMap<PathBuf, Vec<u8>>,
    /// Directory entries (automatically includes parents of all files)
    directories: HashSet<PathBuf>,
    /// Project root directory (default working directory)
    project_root: PathBuf,
}

impl VirtualFileSystem {
    fn with_project_root(project_root: PathBuf) -> Self {
        let mut vfs = Self {
            files: HashMap::new(),
            directories: HashSet::new(),
            project_root: PathBuf::new(),
        };
        vfs.project_root = vfs.normalize_components(&project_root);
        vfs.directories.insert(PathBuf::from("/"));
        let root = vfs.project_root.clone();
        vfs.add_directory_and_parents(&root);
        vfs
    }

    fn add_file(&mut self, path: &Path, contents: Vec<u8>) {
        let normalized = self.normalize_path(path);
        if let Some(parent) = normalized.parent() {
            self.add_directory_and_parents(parent);
        }
        self.files.insert(normalized, contents);
    }

    fn add_directory(&mut self, path: &Path) {
        let normalized = self.normalize_path(path);
        self.add_directory_and_parents(&normalized);
    }

    fn list_directory(&self, path: &Path) -> RuntimeResult<Vec<PathBuf>> {
        let normalized = self.normalize_path(path);

        if !self.directories.contains(&normalized) {
            return Err(not_found_error(&normalized));
        }

        let mut entries: HashSet<PathBuf> = HashSet::new();

        for file_path in self.files.keys() {
            if file_path.parent() == Some(normalized.as_path()) {
                entries.insert(file_path.clone());
            }
        }

        for dir_path in &self.directories {
            if dir_path.parent() == Some(normalized.as_path()) && dir_path != &normalized {
                entries.insert(dir_path.clone());
            }
        }

        Ok(entries.into_iter().collect())
    }

    fn exists(&self, path: &Path) -> bool {
        let normalized = self.normalize_path(path);
        self.files.contains_key(&normalized) || self.directories.contains(&normalized)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(&self.normalize_path(path))
    }

    fn is_directory(&self, path: &Path) -> bool {
        self.directories.contains(&self.normalize_path(path))
    }

    fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        let normalized = self.normalize_path(path);
        self.files
            .get(&normalized)
            .cloned()
            .ok_or_else(|| not_found_error(&normalized))
    }

    fn normalize_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return self.normalize_components(path);
        }
        let absolute = self.project_root.join(path);
        self.normalize_components(&absolute)
    }

    /// Normalize path components (remove . and resolve ..)
    fn normalize_components(&self, path: &Path) -> PathBuf {
        let mut normalized = PathBuf::new();
        for component in path.components() {
            match component {
                Component::ParentDir => {
                    if !normalized.pop() {
                        // Can't go above root
                        normalized.push("/");
                    }
                }
                Component::CurDir => {}
                other => normalized.push(other),
            }
        }
        if normalized.as_os_str().is_empty() {
            normalized.push("/");
        }
        normalized
    }

    fn add_directory_and_parents(&mut self, path: &Path) {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            self.directories.insert(current.clone());
        }
    }
}

/// Runtime backed by an in-memory file tree.
///
/// The tree sits behind an `RwLock` so the runtime satisfies the
/// `Send + Sync` bound of `SystemRuntime`.
///
/// ```
/// use sass_bundle_runtime::{MemoryRuntime, SystemRuntime};
/// use std::path::Path;
///
/// let rt = MemoryRuntime::new();
/// rt.add_file("/project/_vars.scss", "$a: 1;");
/// assert!(rt.is_file(Path::new("_vars.scss")).unwrap());
/// ```
#[derive(Debug)]
pub struct MemoryRuntime {
    vfs: RwLock<VirtualFileSystem>,
}

impl MemoryRuntime {
    /// Create an empty file system rooted at `/project`.
    pub fn new() -> Self {
        Self::with_project_root("/project")
    }

    /// Create an empty file system with a custom project root (the cwd).
    pub fn with_project_root(project_root: impl AsRef<Path>) -> Self {
        Self {
            vfs: RwLock::new(VirtualFileSystem::with_project_root(
                project_root.as_ref().to_path_buf(),
            )),
        }
    }

    /// Add (or replace) a file; parent directories are created implicitly.
    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        self.write().add_file(path.as_ref(), contents.into());
    }

    /// All file paths currently stored.
    pub fn list_files(&self) -> Vec<PathBuf> {
        self.read().files.keys().cloned().collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, VirtualFileSystem> {
        self.vfs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, VirtualFileSystem> {
        self.vfs.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemRuntime for MemoryRuntime {
    fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        self.read().read_file(path)
    }

    fn file_write(&self, path: &Path, contents: &[u8]) -> RuntimeResult<()> {
        self.write().add_file(path, contents.to_vec());
        Ok(())
    }

    fn path_exists(&self, path: &Path, kind: Option<PathKind>) -> RuntimeResult<bool> {
        let vfs = self.read();
        Ok(match kind {
            None => vfs.exists(path),
            Some(PathKind::File) => vfs.is_file(path),
            Some(PathKind::Directory) => vfs.is_directory(path),
        })
    }

    fn dir_create(&self, path: &Path, recursive: bool) -> RuntimeResult<()> {
        let mut vfs = self.write();
        if !recursive {
            let normalized = vfs.normalize_path(path);
            if let Some(parent) = normalized.parent() {
                if !vfs.directories.contains(parent) {
                    return Err(not_found_error(parent));
                }
            }
        }
        vfs.add_directory(path);
        Ok(())
    }

    fn dir_list(&self, path: &Path) -> RuntimeResult<Vec<PathBuf>> {
        self.read().list_directory(path)
    }

    fn cwd(&self) -> RuntimeResult<PathBuf> {
        Ok(self.read().project_root.clone())
    }
}
