/*
 * bundle.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Bundle command implementation
 */

//! Bundle command implementation.
//!
//! Consolidates one stylesheet and its imports, then either prints the
//! result or writes it to a file. With `--css` the consolidated SCSS is
//! compiled with grass before it is written.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use sass_bundle::{BundleOptions, Document};
use sass_bundle_runtime::sass_native::compile_scss;
use sass_bundle_runtime::{NativeRuntime, SystemRuntime};

/// Arguments for the bundle command
#[derive(Debug)]
pub struct BundleArgs {
    /// Main SCSS file
    pub input: PathBuf,
    /// Output file; stdout when absent
    pub output: Option<PathBuf>,
    /// Replacement for `~/`
    pub root_uri: String,
    /// Compile the bundle to CSS
    pub css: bool,
    /// Minify compiled CSS
    pub minified: bool,
}

/// Execute the bundle command
pub fn execute(args: BundleArgs) -> Result<()> {
    let runtime = NativeRuntime::new();
    let options = BundleOptions::new(args.root_uri);

    let text = render(&runtime, &args.input, &options, args.css, args.minified)?;

    match &args.output {
        Some(path) => {
            write_output(&runtime, path, &text)?;
            info!(input = %args.input.display(), output = %path.display(), "Bundled stylesheet");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .context("Failed to write bundle to stdout")?;
        }
    }
    Ok(())
}

/// Bundle `input`, compiling the result to CSS when `css` is set.
///
/// Compilation resolves any remaining `@use` against the input's folder.
pub fn render(
    runtime: &dyn SystemRuntime,
    input: &Path,
    options: &BundleOptions,
    css: bool,
    minified: bool,
) -> Result<String> {
    let document = Document::load(runtime, input, options)
        .with_context(|| format!("Failed to bundle {}", input.display()))?;
    let scss = document
        .to_scss()
        .with_context(|| format!("Failed to order variables of {}", input.display()))?;

    if !css {
        return Ok(scss);
    }

    let load_paths: Vec<PathBuf> = input.parent().map(Path::to_path_buf).into_iter().collect();
    compile_scss(runtime, &scss, &load_paths, minified)
        .with_context(|| format!("Failed to compile bundle of {}", input.display()))
}

/// Write `text` to `path`, creating its parent directory if needed.
pub fn write_output(runtime: &dyn SystemRuntime, path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty())
        && !runtime.is_dir(parent)?
    {
        runtime
            .dir_create(parent, true)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    runtime
        .file_write(path, text.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sass_bundle_runtime::MemoryRuntime;

    fn runtime() -> MemoryRuntime {
        let rt = MemoryRuntime::new();
        rt.add_file("/site/main.scss", "@import \"colors\";\n.a { color: $link; }");
        rt.add_file("/site/_colors.scss", "$link: $brand;\n$brand: #336699;");
        rt
    }

    #[test]
    fn test_render_scss() {
        let rt = runtime();
        let text = render(
            &rt,
            Path::new("/site/main.scss"),
            &BundleOptions::default(),
            false,
            false,
        )
        .unwrap();
        assert_eq!(text, "$brand:#336699;\n$link:$brand;\n.a{color:$link}\n");
    }

    #[test]
    fn test_render_css() {
        let rt = runtime();
        let css = render(
            &rt,
            Path::new("/site/main.scss"),
            &BundleOptions::default(),
            true,
            true,
        )
        .unwrap();
        assert!(css.trim().starts_with(".a{color:#"));
        assert!(!css.contains('$'));
    }

    #[test]
    fn test_render_reports_input() {
        let rt = MemoryRuntime::new();
        let err = render(
            &rt,
            Path::new("/site/missing.scss"),
            &BundleOptions::default(),
            false,
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("/site/missing.scss"));
    }

    #[test]
    fn test_write_output_creates_parent() {
        let rt = MemoryRuntime::new();
        write_output(&rt, Path::new("/out/css/site.css"), "a{}").unwrap();
        assert!(rt.is_dir(Path::new("/out/css")).unwrap());
        assert_eq!(
            rt.file_read_string(Path::new("/out/css/site.css")).unwrap(),
            "a{}"
        );
    }
}
