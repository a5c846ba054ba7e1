//! Content hash of a stylesheet folder, for build-cache invalidation.
//!
//! Copyright (c) 2025 Posit, PBC

use std::path::{Path, PathBuf};

use sass_bundle_runtime::SystemRuntime;
use sha2::{Digest, Sha256};

use crate::error::BundleError;

/// Hash every `*.scss` file next to `main_file`.
///
/// Returns `None` when `main_file` does not exist. The digest covers file
/// names and contents in name order, so renaming, adding, removing or
/// editing any sibling stylesheet changes it. Imports outside the folder
/// are not followed.
pub fn calculate_folder_hash(
    runtime: &dyn SystemRuntime,
    main_file: impl AsRef<Path>,
) -> Result<Option<String>, BundleError> {
    let main_file = main_file.as_ref();
    if !runtime.is_file(main_file)? {
        return Ok(None);
    }

    let folder = match main_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut stylesheets: Vec<PathBuf> = runtime
        .dir_list(&folder)?
        .into_iter()
        .filter(|path| path.extension().is_some_and(|ext| ext == "scss"))
        .collect();
    stylesheets.sort();

    let mut hasher = Sha256::new();
    for path in &stylesheets {
        let Some(name) = path.file_name() else {
            continue;
        };
        if !runtime.is_file(path)? {
            continue;
        }
        hasher.update(name.as_encoded_bytes());
        hasher.update([0u8]);
        hasher.update(runtime.file_read(path)?);
        hasher.update([0u8]);
    }

    let hash = hex::encode(hasher.finalize());
    tracing::debug!(folder = %folder.display(), files = stylesheets.len(), %hash, "Hashed stylesheet folder");
    Ok(Some(hash))
}
