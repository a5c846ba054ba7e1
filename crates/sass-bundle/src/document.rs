//! One bundling pass: read, classify, consolidate, assemble.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Statements are sorted into four buckets while the stream is read:
//!
//! | Bucket    | Contents                                   | Emitted order       |
//! |-----------|--------------------------------------------|---------------------|
//! | uses      | `@use`, `@forward`, `@charset`             | source order        |
//! | mixins    | `@mixin`, `@function`                      | source order        |
//! | variables | `$name:` and variable-assigning `@if`s     | dependency order    |
//! | rules     | everything else                            | source order        |
//!
//! Variables are only ordered once the whole stream has been read, so a
//! declaration may reference a variable that appears later in the bundle.

use std::path::Path;

use sass_bundle_runtime::SystemRuntime;

use crate::config::BundleOptions;
use crate::error::{BundleError, excerpt};
use crate::graph::DependencyGraph;
use crate::import::import_targets;
use crate::inclusion::InclusionStack;
use crate::statement::{RawStatement, StatementKind, StatementSplitter, classify};
use crate::variable::{Variable, VariableId, VariableTable};

/// The `@if` an `@else` would continue.
#[derive(Debug, Clone, Copy)]
enum OpenChain {
    Variable(VariableId),
    Rule(usize),
}

/// Bucket sizes of a loaded document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BundleStats {
    /// Files read, main file included
    pub files: usize,
    pub uses: usize,
    pub mixins: usize,
    /// Simple variables after consolidation
    pub variables: usize,
    /// Variable-assigning `@if` chains
    pub conditionals: usize,
    pub rules: usize,
    /// Total length of every stored statement
    pub size: usize,
}

/// A consolidated SCSS bundle.
///
/// # Example
///
/// ```rust
/// use sass_bundle::{BundleOptions, Document};
/// use sass_bundle_runtime::MemoryRuntime;
///
/// let rt = MemoryRuntime::new();
/// rt.add_file("/project/_colors.scss", "$primary: blue;");
///
/// let source = "$link: $primary;\n@import \"colors\";\na { color: $link; }";
/// let doc = Document::load_scss(&rt, source, "/project", &BundleOptions::default()).unwrap();
///
/// assert_eq!(doc.to_scss().unwrap(), "$primary:blue;\n$link:$primary;\na{color:$link}\n");
/// ```
#[derive(Debug, Default)]
pub struct Document {
    uses: Vec<String>,
    mixins: Vec<String>,
    variables: VariableTable,
    rules: Vec<String>,
    size: usize,
    files_read: usize,
}

impl Document {
    /// Bundle `main_path` and everything it imports.
    pub fn load(
        runtime: &dyn SystemRuntime,
        main_path: impl AsRef<Path>,
        options: &BundleOptions,
    ) -> Result<Self, BundleError> {
        let stack = InclusionStack::open(runtime, main_path.as_ref(), options.root_uri.as_str())?;
        Self::parse(stack)
    }

    /// Bundle in-memory content; imports resolve against `working_path`.
    pub fn load_scss(
        runtime: &dyn SystemRuntime,
        content: &str,
        working_path: impl AsRef<Path>,
        options: &BundleOptions,
    ) -> Result<Self, BundleError> {
        let stack = InclusionStack::new(
            runtime,
            content,
            working_path.as_ref(),
            options.root_uri.as_str(),
        );
        Self::parse(stack)
    }

    fn parse(mut stack: InclusionStack<'_>) -> Result<Self, BundleError> {
        let mut document = Self::default();
        let mut splitter = StatementSplitter::new();
        let mut chain: Option<OpenChain> = None;

        loop {
            let statement = match stack.next() {
                Some(c) => match splitter.push(c, stack.root_uri()) {
                    Some(statement) => statement,
                    None => continue,
                },
                // A trailing import may refill the stream
                None => match std::mem::take(&mut splitter).finish(stack.root_uri()) {
                    Some(statement) => statement,
                    None => break,
                },
            };
            document.accept(statement, &mut chain, &mut stack)?;
        }

        document.files_read = stack.files_read();
        tracing::debug!(
            files = document.files_read,
            variables = document.variables.len(),
            mixins = document.mixins.len(),
            rules = document.rules.len(),
            size = document.size,
            "Parsed bundle"
        );
        Ok(document)
    }

    fn accept(
        &mut self,
        statement: RawStatement,
        chain: &mut Option<OpenChain>,
        stack: &mut InclusionStack<'_>,
    ) -> Result<(), BundleError> {
        let text = statement.text.trim();
        if text.is_empty() || text == ";" {
            return Ok(());
        }

        let kind = classify(text);
        tracing::trace!(?kind, statement = text, "Classified statement");

        // Anything but `@else` closes the open chain
        let open = chain.take();

        match kind {
            StatementKind::Else => {
                *chain = open;
                return self.continue_chain(text, open);
            }
            StatementKind::Import => {
                // Reverse, so the first target is read first
                for target in import_targets(text).iter().rev() {
                    stack.import(target)?;
                }
                return Ok(());
            }
            StatementKind::Use => self.uses.push(text.to_string()),
            StatementKind::Mixin => self.mixins.push(text.to_string()),
            StatementKind::Variable => {
                self.variables.declare(Variable::simple(text));
            }
            StatementKind::If {
                assigns_variables: true,
            } => {
                let id = self.variables.declare(Variable::conditional(text));
                *chain = Some(OpenChain::Variable(id));
            }
            StatementKind::If {
                assigns_variables: false,
            } => {
                *chain = Some(OpenChain::Rule(self.rules.len()));
                self.rules.push(text.to_string());
            }
            StatementKind::Rule => self.rules.push(text.to_string()),
        }

        self.size += text.len();
        Ok(())
    }

    fn continue_chain(&mut self, text: &str, chain: Option<OpenChain>) -> Result<(), BundleError> {
        let else_without_if = || BundleError::ElseWithoutIf {
            excerpt: excerpt(text),
        };

        match chain.ok_or_else(else_without_if)? {
            OpenChain::Variable(id) => self
                .variables
                .get_mut(id)
                .push_else(Variable::conditional(text))
                .map_err(|_| else_without_if())?,
            OpenChain::Rule(index) => self.rules[index].push_str(text),
        }

        self.size += text.len();
        Ok(())
    }

    /// Variables and variable-assigning conditionals, dependencies first.
    pub fn ordered_variables(&self) -> Result<Vec<&Variable>, BundleError> {
        let graph = DependencyGraph::build(&self.variables)?;
        let order = graph.topological_order(&self.variables)?;
        Ok(order.into_iter().map(|id| self.variables.get(id)).collect())
    }

    /// Assemble the bundle: uses, mixins, ordered variables, then rules,
    /// one statement per line.
    ///
    /// Fails without producing any text if the variables cannot be ordered.
    pub fn to_scss(&self) -> Result<String, BundleError> {
        let variables = self.ordered_variables()?;
        tracing::debug!(variables = variables.len(), "Ordered variables");

        let statements = self.uses.len() + self.mixins.len() + variables.len() + self.rules.len();
        let mut out = String::with_capacity(self.size + statements);

        let variables: Vec<String> = variables.iter().map(|v| v.emitted_text()).collect();
        for text in self
            .uses
            .iter()
            .chain(&self.mixins)
            .chain(&variables)
            .chain(&self.rules)
        {
            out.push_str(text);
            out.push('\n');
        }

        Ok(out)
    }

    /// Assemble and write the bundle as UTF-8, creating parent directories.
    pub fn save_to(&self, runtime: &dyn SystemRuntime, path: impl AsRef<Path>) -> Result<(), BundleError> {
        let path = path.as_ref();
        let text = self.to_scss()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty())
            && !runtime.is_dir(parent)?
        {
            runtime.dir_create(parent, true)?;
        }
        runtime.file_write(path, text.as_bytes())?;

        tracing::debug!(path = %path.display(), bytes = text.len(), "Saved bundle");
        Ok(())
    }

    pub fn stats(&self) -> BundleStats {
        let conditionals = self
            .variables
            .iter()
            .filter(|(_, v)| v.is_conditional())
            .count();

        BundleStats {
            files: self.files_read,
            uses: self.uses.len(),
            mixins: self.mixins.len(),
            variables: self.variables.len() - conditionals,
            conditionals,
            rules: self.rules.len(),
            size: self.size,
        }
    }

    pub fn uses(&self) -> &[String] {
        &self.uses
    }

    pub fn mixins(&self) -> &[String] {
        &self.mixins
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    /// Consolidated variables in first-declaration order.
    pub fn variables(&self) -> &VariableTable {
        &self.variables
    }

    /// Running length of every stored statement.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn files_read(&self) -> usize {
        self.files_read
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sass_bundle_runtime::MemoryRuntime;

    fn bundle(rt: &MemoryRuntime, source: &str) -> Result<String, BundleError> {
        Document::load_scss(rt, source, "/p", &BundleOptions::default())?.to_scss()
    }

    fn lines(text: &str) -> Vec<&str> {
        text.lines().collect()
    }

    #[test]
    fn test_bucket_order() {
        let rt = MemoryRuntime::new();
        let out = bundle(
            &rt,
            ".a{color:$c}\n@mixin m{x:1}\n$c:red;\n@use \"sass:math\";\n.b{y:2}\n@function f(){@return 1}",
        )
        .unwrap();
        assert_eq!(
            lines(&out),
            vec![
                "@use \"sass:math\";",
                "@mixin m{x:1}",
                "@function f(){@return 1}",
                "$c:red;",
                ".a{color:$c}",
                ".b{y:2}",
            ]
        );
    }

    #[test]
    fn test_redeclaration_keeps_last_value() {
        let rt = MemoryRuntime::new();
        let out = bundle(&rt, "$a:1;$b:$a;$a:2;$a:3;").unwrap();
        assert_eq!(lines(&out), vec!["$a:3;", "$b:$a;"]);
    }

    #[test]
    fn test_self_reference_merge() {
        let rt = MemoryRuntime::new();
        let doc = Document::load_scss(
            &rt,
            "$s: ();\n$s: map-merge((a:1), $s);",
            "/p",
            &BundleOptions::default(),
        )
        .unwrap();
        let id = doc.variables().lookup("$s").unwrap();
        let s = doc.variables().get(id);
        assert_eq!(s.declaration, "$s:map-merge((a:1),());");
        assert!(!s.self_dependent);
    }

    #[test]
    fn test_cycle_produces_no_output() {
        let rt = MemoryRuntime::new();
        let err = bundle(&rt, "$a: $b;\n$b: $a;").unwrap_err();
        assert!(matches!(err, BundleError::DependencyCycle { .. }));
    }

    #[test]
    fn test_else_appends_to_variable_chain() {
        let rt = MemoryRuntime::new();
        let out = bundle(
            &rt,
            "$dark:true;$bg:white;@if $dark{$bg:black}@else{$bg:white}.a{color:$bg}",
        )
        .unwrap();
        assert_eq!(
            lines(&out),
            vec![
                "$dark:true;",
                "@if $dark{$bg:black}@else{$bg:white}",
                "$bg:white;",
                ".a{color:$bg}",
            ]
        );
    }

    #[test]
    fn test_else_appends_to_rule_chain() {
        let rt = MemoryRuntime::new();
        let doc = Document::load_scss(
            &rt,
            "@if $x{.a{b:c}}@else if $y{.d{e:f}}@else{.g{h:i}}.j{k:l}",
            "/p",
            &BundleOptions::default(),
        )
        .unwrap();
        assert_eq!(
            doc.rules(),
            &["@if $x{.a{b:c}}@else if $y{.d{e:f}}@else{.g{h:i}}", ".j{k:l}"]
        );
    }

    #[test]
    fn test_else_without_if() {
        let rt = MemoryRuntime::new();
        let err = Document::load_scss(&rt, "$a:1;@else{$a:2}", "/p", &BundleOptions::default())
            .unwrap_err();
        match err {
            BundleError::ElseWithoutIf { excerpt } => assert_eq!(excerpt, "@else{$a:2}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_else_after_interrupting_statement() {
        let rt = MemoryRuntime::new();
        let err = Document::load_scss(
            &rt,
            "$a:1;@if $a{$b:1}.x{y:z}@else{$b:2}",
            "/p",
            &BundleOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BundleError::ElseWithoutIf { .. }));
    }

    #[test]
    fn test_imports_inline_in_order() {
        let rt = MemoryRuntime::new();
        rt.add_file("/p/_a.scss", "$x:1;");
        rt.add_file("/p/_b.scss", "$y:2;");
        let out = bundle(&rt, "@import \"a\", \"b\";").unwrap();
        assert_eq!(lines(&out), vec!["$x:1;", "$y:2;"]);
    }

    #[test]
    fn test_trailing_import_without_terminator() {
        let rt = MemoryRuntime::new();
        rt.add_file("/p/_a.scss", "$x:1;");
        let out = bundle(&rt, "$w:0;@import \"a\"").unwrap();
        assert_eq!(lines(&out), vec!["$w:0;", "$x:1;"]);
    }

    #[test]
    fn test_deeply_nested_imports() {
        const LEVELS: usize = 3_000;
        let rt = MemoryRuntime::new();
        for level in 0..LEVELS {
            rt.add_file(
                format!("/p/_l{level}.scss"),
                format!("@import \"l{}\";\n$v{level}: $v{};", level + 1, level + 1),
            );
        }
        rt.add_file(format!("/p/_l{LEVELS}.scss"), format!("$v{LEVELS}: 0;"));

        let doc = Document::load_scss(&rt, "@import \"l0\";", "/p", &BundleOptions::default())
            .unwrap();
        assert_eq!(doc.stats().files, LEVELS + 1);
        assert_eq!(doc.stats().variables, LEVELS + 1);

        let out = doc.to_scss().unwrap();
        let lines = lines(&out);
        assert_eq!(lines.first(), Some(&format!("$v{LEVELS}:0;").as_str()));
        assert_eq!(lines.last(), Some(&"$v0:$v1;"));
    }

    #[test]
    fn test_non_ascii_statements() {
        let rt = MemoryRuntime::new();
        let out = bundle(
            &rt,
            "$label: 日本語;\n$mark: \"✓\" !default;\n@include icon(\"x\") ✓✓✓;\n.é { content: $label; }",
        )
        .unwrap();
        assert_eq!(
            lines(&out),
            vec![
                "$label:日本語;",
                "$mark:\"✓\";",
                "@include icon(\"x\") ✓✓✓;",
                ".é{content:$label}",
            ]
        );
    }

    #[test]
    fn test_interpolation_stays_in_statement() {
        let rt = MemoryRuntime::new();
        let out = bundle(&rt, "$a: 1;\n$w: #{$a}px;\n.col-#{$a} { width: $w; }").unwrap();
        assert_eq!(lines(&out), vec!["$a:1;", "$w:#{$a}px;", ".col-#{$a}{width:$w}"]);
    }

    #[test]
    fn test_css_import_kept_as_rule() {
        let rt = MemoryRuntime::new();
        let out = bundle(&rt, "@import url(theme.css);.a{b:c}").unwrap();
        assert_eq!(lines(&out), vec!["@import url(theme.css);", ".a{b:c}"]);
    }

    #[test]
    fn test_root_uri_substituted() {
        let rt = MemoryRuntime::new();
        let doc = Document::load_scss(
            &rt,
            ".logo{background:url(\"~/img/logo.svg\")}",
            "/p",
            &BundleOptions::new("/static/"),
        )
        .unwrap();
        assert_eq!(doc.rules(), &[".logo{background:url(\"/static/img/logo.svg\")}"]);
    }

    #[test]
    fn test_size_and_stats() {
        let rt = MemoryRuntime::new();
        rt.add_file("/p/_a.scss", "$x:1;");
        let doc = Document::load_scss(
            &rt,
            "@import \"a\";$y:1;@if $y{$x:2}@mixin m{}.r{}",
            "/p",
            &BundleOptions::default(),
        )
        .unwrap();

        let stats = doc.stats();
        assert_eq!(stats.files, 1);
        assert_eq!(stats.variables, 2);
        assert_eq!(stats.conditionals, 1);
        assert_eq!(stats.mixins, 1);
        assert_eq!(stats.rules, 1);
        assert_eq!(
            stats.size,
            "$x:1;".len() + "$y:1;".len() + "@if $y{$x:2}".len() + "@mixin m{}".len() + ".r{}".len()
        );
        assert!(doc.to_scss().unwrap().len() >= stats.size);
    }

    #[test]
    fn test_save_to_creates_directories() {
        let rt = MemoryRuntime::new();
        let doc = Document::load_scss(&rt, "$a:1;", "/p", &BundleOptions::default()).unwrap();
        doc.save_to(&rt, "/out/css/bundle.scss").unwrap();

        assert!(rt.is_dir(Path::new("/out/css")).unwrap());
        assert_eq!(
            rt.file_read_string(Path::new("/out/css/bundle.scss")).unwrap(),
            "$a:1;\n"
        );
    }

    #[test]
    fn test_save_to_writes_nothing_on_failure() {
        let rt = MemoryRuntime::new();
        let doc = Document::load_scss(&rt, "$a:$missing;", "/p", &BundleOptions::default()).unwrap();
        assert!(doc.save_to(&rt, "/out/bundle.scss").is_err());
        assert!(!rt.path_exists(Path::new("/out/bundle.scss"), None).unwrap());
    }
}
