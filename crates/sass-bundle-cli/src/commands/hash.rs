/*
 * hash.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Hash command implementation
 */

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::warn;

use sass_bundle::calculate_folder_hash;
use sass_bundle_runtime::NativeRuntime;

/// Print the folder hash of `input`; exit code 1 when it does not exist.
pub fn execute(input: &Path) -> Result<ExitCode> {
    let runtime = NativeRuntime::new();
    let hash = calculate_folder_hash(&runtime, input)
        .with_context(|| format!("Failed to hash folder of {}", input.display()))?;

    match hash {
        Some(hash) => {
            println!("{hash}");
            Ok(ExitCode::SUCCESS)
        }
        None => {
            warn!(input = %input.display(), "Stylesheet does not exist");
            Ok(ExitCode::FAILURE)
        }
    }
}
