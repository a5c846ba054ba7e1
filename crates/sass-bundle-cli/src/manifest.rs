/*
 * manifest.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Build manifest listing the bundles `sass-bundle build` produces.
 */

//! Build manifest.
//!
//! ```toml
//! [[bundle]]
//! input = "styles/site.scss"
//! output = "dist/site.scss"
//!
//! [[bundle]]
//! input = "styles/theme.scss"
//! output = "dist/theme.css"
//! root-uri = "/assets/"
//! css = true
//! minified = true
//! ```
//!
//! Relative paths are resolved against the manifest's directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use sass_bundle_runtime::SystemRuntime;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default, rename = "bundle")]
    pub bundles: Vec<BundleEntry>,
}

/// One bundle to build.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BundleEntry {
    /// Main SCSS file
    pub input: PathBuf,
    /// Bundled SCSS, or CSS when `css` is set
    pub output: PathBuf,
    #[serde(default = "default_root_uri")]
    pub root_uri: String,
    #[serde(default)]
    pub css: bool,
    #[serde(default)]
    pub minified: bool,
}

fn default_root_uri() -> String {
    "/".to_string()
}

impl BundleEntry {
    /// Cache file recording the folder hash the output was built from.
    pub fn hash_path(&self) -> PathBuf {
        let mut name = self.output.clone().into_os_string();
        name.push(".hash");
        PathBuf::from(name)
    }
}

impl Manifest {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid bundle manifest")
    }

    /// Read a manifest and resolve its paths against its directory.
    pub fn load(runtime: &dyn SystemRuntime, path: &Path) -> Result<Self> {
        let content = runtime
            .file_read_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        let mut manifest =
            Self::parse(&content).with_context(|| format!("In {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for entry in &mut manifest.bundles {
            entry.input = base.join(&entry.input);
            entry.output = base.join(&entry.output);
        }
        Ok(manifest)
    }
}
