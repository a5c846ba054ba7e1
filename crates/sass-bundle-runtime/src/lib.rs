/*
 * sass-bundle-runtime
 * Copyright (c) 2025 Posit, PBC
 *
 * Runtime abstraction layer for the file-system operations the SCSS
 * consolidation engine depends on.
 *
 * - NativeRuntime: full file-system access using std (default for native targets)
 * - MemoryRuntime: in-memory virtual file system (tests, embedding, WASM hosts)
 */

mod memory;
mod native;
mod traits;

#[cfg(not(target_arch = "wasm32"))]
pub mod sass_native;

// Re-export core types (API surface)
pub use traits::{PathKind, RuntimeError, RuntimeResult, SystemRuntime};

// Re-export runtime implementations
pub use memory::MemoryRuntime;
pub use native::NativeRuntime;

/// Create a default runtime for the current platform.
///
/// On native targets this is a NativeRuntime backed by the real file system.
/// Targets without one get an empty MemoryRuntime the host is expected to fill.
#[cfg(not(target_arch = "wasm32"))]
pub fn default_runtime() -> NativeRuntime {
    NativeRuntime::new()
}

#[cfg(target_arch = "wasm32")]
pub fn default_runtime() -> MemoryRuntime {
    MemoryRuntime::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_runtime_file_operations() {
        let rt = NativeRuntime::new();
        let temp = tempfile::tempdir().unwrap();

        let file_path = temp.path().join("test.scss");
        rt.file_write(&file_path, b"$a: 1;").unwrap();

        assert!(rt.path_exists(&file_path, None).unwrap());
        assert!(rt.is_file(&file_path).unwrap());
        assert!(!rt.is_dir(&file_path).unwrap());
        assert_eq!(rt.file_read(&file_path).unwrap(), b"$a: 1;");
    }

    #[test]
    fn test_default_runtime_cwd() {
        let rt = default_runtime();
        let cwd = rt.cwd().unwrap();
        assert!(cwd.is_absolute());
    }
}
