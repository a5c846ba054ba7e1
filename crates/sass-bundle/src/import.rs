//! `@import` target parsing and partial file resolution.
//!
//! Copyright (c) 2025 Posit, PBC

use std::path::{Path, PathBuf};

use sass_bundle_runtime::{RuntimeResult, SystemRuntime};

/// Extract the quoted targets of an `@import` statement, in source order.
///
/// `@import "a", 'b';` yields `["a", "b"]`. Unquoted segments (such as
/// `url(...)`) are ignored.
pub fn import_targets(statement: &str) -> Vec<String> {
    let body = statement
        .trim()
        .strip_prefix("@import")
        .unwrap_or(statement)
        .trim_end_matches(';');

    let mut targets = Vec::new();
    let mut quote: Option<char> = None;
    let mut current = String::new();

    for c in body.chars() {
        match quote {
            Some(q) if c == q => {
                targets.push(std::mem::take(&mut current));
                quote = None;
            }
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => quote = Some(c),
            None => {}
        }
    }

    targets
}

/// Whether an `@import` statement refers to plain CSS the compiler must keep.
///
/// `url(...)` imports, `.css` files and remote URLs are never inlined.
pub fn is_css_import(statement: &str) -> bool {
    let body = statement
        .trim()
        .strip_prefix("@import")
        .unwrap_or(statement)
        .trim();

    if body.starts_with("url(") {
        return true;
    }

    let targets = import_targets(statement);
    !targets.is_empty()
        && targets.iter().all(|t| {
            t.ends_with(".css")
                || t.starts_with("http://")
                || t.starts_with("https://")
                || t.starts_with("//")
        })
}

/// Candidate files for an import target, in the order they are tried.
///
/// For target `name` relative to `working_dir`:
/// `name`, `_name`, `_name.scss`, `name.scss`.
pub fn candidate_paths(working_dir: &Path, target: &str) -> Vec<PathBuf> {
    let path = working_dir.join(target);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

    vec![
        path.clone(),
        dir.join(format!("_{}", file_name)),
        dir.join(format!("_{}.scss", file_name)),
        dir.join(format!("{}.scss", file_name)),
    ]
}

/// Resolve an import target to the file that will be read.
///
/// Returns the first candidate that exists as a file. When none does, the
/// last candidate is returned so reading it surfaces the runtime's own
/// "not found" error.
pub fn resolve_import(
    runtime: &dyn SystemRuntime,
    working_dir: &Path,
    target: &str,
) -> RuntimeResult<PathBuf> {
    let candidates = candidate_paths(working_dir, target);
    for candidate in &candidates {
        if runtime.is_file(candidate)? {
            return Ok(candidate.clone());
        }
    }
    Ok(candidates
        .into_iter()
        .last()
        .unwrap_or_else(|| working_dir.join(target)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sass_bundle_runtime::MemoryRuntime;

    #[test]
    fn test_import_targets_single_and_multiple() {
        assert_eq!(import_targets("@import \"a\";"), vec!["a"]);
        assert_eq!(
            import_targets("@import \"a\",'sub/b',\"c\";"),
            vec!["a", "sub/b", "c"]
        );
        assert!(import_targets("@import url(foo.css);").is_empty());
    }

    #[test]
    fn test_css_imports_detected() {
        assert!(is_css_import("@import url(foo.css);"));
        assert!(is_css_import("@import \"theme.css\";"));
        assert!(is_css_import("@import \"https://fonts.example/x\";"));
        assert!(!is_css_import("@import \"variables\";"));
        assert!(!is_css_import("@import \"a.css\",\"b\";"));
    }

    #[test]
    fn test_candidate_order() {
        let candidates = candidate_paths(Path::new("/p"), "sub/colors");
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/p/sub/colors"),
                PathBuf::from("/p/sub/_colors"),
                PathBuf::from("/p/sub/_colors.scss"),
                PathBuf::from("/p/sub/colors.scss"),
            ]
        );
    }

    #[test]
    fn test_resolve_prefers_earlier_candidates() {
        let rt = MemoryRuntime::new();
        rt.add_file("/p/_colors.scss", "");
        rt.add_file("/p/colors.scss", "");
        assert_eq!(
            resolve_import(&rt, Path::new("/p"), "colors").unwrap(),
            PathBuf::from("/p/_colors.scss")
        );

        rt.add_file("/p/_colors", "");
        assert_eq!(
            resolve_import(&rt, Path::new("/p"), "colors").unwrap(),
            PathBuf::from("/p/_colors")
        );
    }

    #[test]
    fn test_resolve_exact_path() {
        let rt = MemoryRuntime::new();
        rt.add_file("/p/mixins.scss", "");
        assert_eq!(
            resolve_import(&rt, Path::new("/p"), "mixins.scss").unwrap(),
            PathBuf::from("/p/mixins.scss")
        );
    }

    #[test]
    fn test_resolve_missing_falls_through_to_last_candidate() {
        let rt = MemoryRuntime::new();
        let path = resolve_import(&rt, Path::new("/p"), "nowhere").unwrap();
        assert_eq!(path, PathBuf::from("/p/nowhere.scss"));
        assert!(rt.file_read(&path).is_err());
    }
}
