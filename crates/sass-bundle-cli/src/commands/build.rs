/*
 * build.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Build command implementation
 */

//! Build command implementation.
//!
//! Builds every bundle listed in a manifest. A bundle is skipped when its
//! output exists and the folder hash recorded beside it still matches the
//! stylesheets on disk.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use sass_bundle::{BundleOptions, calculate_folder_hash};
use sass_bundle_runtime::{NativeRuntime, SystemRuntime};

use crate::commands::bundle::{render, write_output};
use crate::manifest::{BundleEntry, Manifest};

/// What a build did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub built: usize,
    pub skipped: usize,
}

/// Execute the build command
pub fn execute(manifest_path: &Path, force: bool) -> Result<()> {
    let runtime = NativeRuntime::new();
    let summary = run(&runtime, manifest_path, force)?;
    info!(
        built = summary.built,
        skipped = summary.skipped,
        "Build complete"
    );
    Ok(())
}

pub fn run(runtime: &dyn SystemRuntime, manifest_path: &Path, force: bool) -> Result<BuildSummary> {
    let manifest = Manifest::load(runtime, manifest_path)?;
    let mut summary = BuildSummary::default();

    for entry in &manifest.bundles {
        if build_entry(runtime, entry, force)? {
            summary.built += 1;
        } else {
            summary.skipped += 1;
        }
    }
    Ok(summary)
}

/// Build one entry; `false` when it was up to date.
fn build_entry(runtime: &dyn SystemRuntime, entry: &BundleEntry, force: bool) -> Result<bool> {
    let hash = calculate_folder_hash(runtime, &entry.input)?
        .with_context(|| format!("Input does not exist: {}", entry.input.display()))?;
    let hash_path = entry.hash_path();

    if !force && recorded_hash(runtime, entry)?.as_deref() == Some(hash.as_str()) {
        debug!(output = %entry.output.display(), "Bundle is up to date");
        return Ok(false);
    }

    let options = BundleOptions::new(entry.root_uri.as_str());
    let text = render(runtime, &entry.input, &options, entry.css, entry.minified)?;
    write_output(runtime, &entry.output, &text)?;
    write_output(runtime, &hash_path, &hash)?;

    info!(
        input = %entry.input.display(),
        output = %entry.output.display(),
        "Built bundle"
    );
    Ok(true)
}

/// Hash recorded by the previous build, if its output still exists.
fn recorded_hash(runtime: &dyn SystemRuntime, entry: &BundleEntry) -> Result<Option<String>> {
    let hash_path = entry.hash_path();
    if !runtime.is_file(&entry.output)? || !runtime.is_file(&hash_path)? {
        return Ok(None);
    }
    let recorded = runtime.file_read_string(&hash_path)?;
    Ok(Some(recorded.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sass_bundle_runtime::MemoryRuntime;

    fn runtime() -> MemoryRuntime {
        let rt = MemoryRuntime::new();
        rt.add_file(
            "/site/sass-bundle.toml",
            "[[bundle]]\ninput = \"styles/main.scss\"\noutput = \"dist/main.scss\"\nroot-uri = \"/assets/\"\n",
        );
        rt.add_file(
            "/site/styles/main.scss",
            "@import \"vars\";\n.logo { background: url(~/logo.png); width: $w; }",
        );
        rt.add_file("/site/styles/_vars.scss", "$w: 10px;");
        rt
    }

    fn build(rt: &MemoryRuntime, force: bool) -> BuildSummary {
        run(rt, Path::new("/site/sass-bundle.toml"), force).unwrap()
    }

    #[test]
    fn test_first_build_writes_output_and_hash() {
        let rt = runtime();
        assert_eq!(build(&rt, false), BuildSummary { built: 1, skipped: 0 });

        let output = rt
            .file_read_string(Path::new("/site/dist/main.scss"))
            .unwrap();
        assert_eq!(output, "$w:10px;\n.logo{background:url(/assets/logo.png);width:$w}\n");

        let hash = rt
            .file_read_string(Path::new("/site/dist/main.scss.hash"))
            .unwrap();
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_unchanged_bundle_is_skipped() {
        let rt = runtime();
        build(&rt, false);
        assert_eq!(build(&rt, false), BuildSummary { built: 0, skipped: 1 });
        assert_eq!(build(&rt, true), BuildSummary { built: 1, skipped: 0 });
    }

    #[test]
    fn test_changed_partial_triggers_rebuild() {
        let rt = runtime();
        build(&rt, false);
        rt.add_file("/site/styles/_vars.scss", "$w: 20px;");
        assert_eq!(build(&rt, false), BuildSummary { built: 1, skipped: 0 });

        let output = rt
            .file_read_string(Path::new("/site/dist/main.scss"))
            .unwrap();
        assert!(output.starts_with("$w:20px;"));
    }

    #[test]
    fn test_missing_input_fails() {
        let rt = MemoryRuntime::new();
        rt.add_file(
            "/site/sass-bundle.toml",
            "[[bundle]]\ninput = \"nope.scss\"\noutput = \"out.scss\"\n",
        );
        let err = run(&rt, Path::new("/site/sass-bundle.toml"), false).unwrap_err();
        assert!(err.to_string().contains("nope.scss"));
    }
}
