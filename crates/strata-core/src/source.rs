use std::path::Path;
use std::sync::LazyLock;

use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::fs::FileAccess;
use crate::layer::LayerClassifier;
use crate::parser::SourceParser;
use crate::types::Layer;

/// An import specifier as written, with the 1-based line it appears on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    pub specifier: String,
    pub line: usize,
}

impl Import {
    /// Relative specifiers (`./x`, `../x`) point inside the project.
    pub fn is_relative(&self) -> bool {
        self.specifier.starts_with('.')
    }
}

/// One analyzed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnit {
    /// Project-relative, `/`-separated path. Unique within a run.
    pub path: String,
    #[serde(skip)]
    pub content: String,
    pub imports: Vec<Import>,
    pub exports: Vec<String>,
    pub layer: Option<Layer>,
    pub functions: usize,
}

impl SourceUnit {
    /// Build a unit from raw content using the lexical scanner.
    pub fn from_content(path: &str, content: String, classifier: &LayerClassifier) -> Self {
        let imports = extract_imports(&content);
        let exports = extract_exports(&content);
        Self {
            path: path.to_string(),
            layer: classifier.classify(path),
            content,
            imports,
            exports,
            functions: 0,
        }
    }

    /// File name without directory and extension(s): `Order.entity.ts` -> `Order.entity`.
    pub fn stem(&self) -> &str {
        file_stem(&self.path)
    }

    /// Directory part of the path (empty for root-level files).
    pub fn dir(&self) -> &str {
        self.path.rsplit_once('/').map(|(d, _)| d).unwrap_or("")
    }
}

pub(crate) fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

static IMPORT_FROM_RE: LazyLock<Regex> = LazyLock::new(|| {
    // `import x from 's'`, `import { a } from "s"`, `export * from 's'`, `import type ...`
    Regex::new(r#"(?m)^[ \t]*(?:import|export)\b[^;'"`]*?\bfrom[ \t]*['"]([^'"\n]+)['"]"#)
        .unwrap_or_else(|e| panic!("invalid import regex: {e}"))
});

static IMPORT_BARE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*import[ \t]*['"]([^'"\n]+)['"]"#)
        .unwrap_or_else(|e| panic!("invalid import regex: {e}"))
});

static IMPORT_CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:require|import)\s*\(\s*['"]([^'"\n]+)['"]\s*\)"#)
        .unwrap_or_else(|e| panic!("invalid import regex: {e}"))
});

static EXPORT_DECL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*export[ \t]+(?:default[ \t]+)?(?:declare[ \t]+)?(?:abstract[ \t]+)?(?:async[ \t]+)?(?:class|interface|type|enum|function\*?|const|let|var|namespace)[ \t]+([A-Za-z_$][\w$]*)",
    )
    .unwrap_or_else(|e| panic!("invalid export regex: {e}"))
});

static EXPORT_LIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*export[ \t]+(?:type[ \t]+)?\{([^}]*)\}")
        .unwrap_or_else(|e| panic!("invalid export regex: {e}"))
});

static EXPORT_DEFAULT_IDENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*export[ \t]+default[ \t]+([A-Za-z_$][\w$]*)[ \t]*;?[ \t]*$")
        .unwrap_or_else(|e| panic!("invalid export regex: {e}"))
});

fn line_of(content: &str, offset: usize) -> usize {
    content[..offset].bytes().filter(|b| *b == b'\n').count() + 1
}

/// Extract import specifiers in source order.
///
/// This is a lexical scan, not a parse: it recognizes static imports,
/// re-exports, side-effect imports, `require()` and dynamic `import()`.
pub fn extract_imports(content: &str) -> Vec<Import> {
    let mut found: Vec<(usize, String)> = Vec::new();
    for re in [&*IMPORT_FROM_RE, &*IMPORT_BARE_RE, &*IMPORT_CALL_RE] {
        for caps in re.captures_iter(content) {
            if let Some(m) = caps.get(1) {
                found.push((m.start(), m.as_str().to_string()));
            }
        }
    }
    found.sort_by_key(|(offset, _)| *offset);
    // A specifier offset matched by two patterns is one import
    found.dedup_by_key(|(offset, _)| *offset);

    found
        .into_iter()
        .map(|(offset, specifier)| Import {
            line: line_of(content, offset),
            specifier,
        })
        .collect()
}

/// Extract exported names in source order. `default` is reported for
/// anonymous default exports of a declaration.
pub fn extract_exports(content: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = Vec::new();

    for caps in EXPORT_DECL_RE.captures_iter(content) {
        if let Some(m) = caps.get(1) {
            found.push((m.start(), m.as_str().to_string()));
        }
    }

    for caps in EXPORT_LIST_RE.captures_iter(content) {
        let Some(list) = caps.get(1) else { continue };
        // `export { a } from './x'` re-exports still add names to this module
        for (i, item) in list.as_str().split(',').enumerate() {
            let item = item.trim().trim_start_matches("type ").trim();
            if item.is_empty() {
                continue;
            }
            let name = match item.split_once(" as ") {
                Some((_, alias)) => alias.trim(),
                None => item,
            };
            found.push((list.start() + i, name.to_string()));
        }
    }

    for caps in EXPORT_DEFAULT_IDENT_RE.captures_iter(content) {
        if let Some(m) = caps.get(1) {
            let ident = m.as_str();
            // `export default class Foo` is already covered by the declaration pattern
            if !matches!(ident, "class" | "function" | "abstract" | "async" | "interface") {
                found.push((m.start(), ident.to_string()));
            }
        }
    }

    found.sort_by_key(|(offset, _)| *offset);
    found.into_iter().map(|(_, name)| name).collect()
}

/// Builds the source model: one `SourceUnit` per readable file, sorted by path.
pub struct SourceModelBuilder<'a> {
    access: &'a dyn FileAccess,
    classifier: &'a LayerClassifier,
    parser: Option<&'a dyn SourceParser>,
    max_workers: usize,
}

impl<'a> SourceModelBuilder<'a> {
    pub fn new(access: &'a dyn FileAccess, classifier: &'a LayerClassifier) -> Self {
        Self {
            access,
            classifier,
            parser: None,
            max_workers: 0,
        }
    }

    pub fn with_parser(mut self, parser: &'a dyn SourceParser) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Bound concurrent reads. 0 uses rayon's global pool.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Scan `root` and build units. Only a failing scan is an error; a file
    /// that cannot be read is logged and left out.
    pub fn build(
        &self,
        root: &Path,
        include: &[String],
        exclude: &[String],
    ) -> anyhow::Result<Vec<SourceUnit>> {
        let paths = self.access.scan(root, include, exclude)?;
        tracing::debug!(files = paths.len(), root = %root.display(), "scanned project");

        let units = if self.max_workers > 0 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.max_workers)
                .build()
            {
                Ok(pool) => pool.install(|| self.read_units(root, &paths)),
                Err(e) => {
                    tracing::warn!("failed to build worker pool ({e}), using global pool");
                    self.read_units(root, &paths)
                }
            }
        } else {
            self.read_units(root, &paths)
        };

        Ok(units)
    }

    fn read_units(&self, root: &Path, paths: &[String]) -> Vec<SourceUnit> {
        let mut units: Vec<SourceUnit> = paths
            .par_iter()
            .filter_map(|rel_path| self.read_unit(root, rel_path))
            .collect();
        units.sort_by(|a, b| a.path.cmp(&b.path));
        units
    }

    fn read_unit(&self, root: &Path, rel_path: &str) -> Option<SourceUnit> {
        let content = match self.access.read_file(root, rel_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("skipping {rel_path}: {e:#}");
                return None;
            }
        };

        let mut unit = SourceUnit::from_content(rel_path, content, self.classifier);
        if let Some(parser) = self.parser {
            unit.functions = match parser.count_functions(rel_path, &unit.content) {
                Ok(n) => n,
                Err(e) => {
                    tracing::debug!("could not count functions in {rel_path}: {e:#}");
                    0
                }
            };
        }
        Some(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, bail};
    use std::collections::BTreeMap;

    struct MemoryFiles {
        files: BTreeMap<String, Option<String>>,
    }

    impl MemoryFiles {
        fn new(files: &[(&str, Option<&str>)]) -> Self {
            Self {
                files: files
                    .iter()
                    .map(|(p, c)| (p.to_string(), c.map(|s| s.to_string())))
                    .collect(),
            }
        }
    }

    impl FileAccess for MemoryFiles {
        fn scan(&self, _root: &Path, _inc: &[String], _exc: &[String]) -> anyhow::Result<Vec<String>> {
            Ok(self.files.keys().cloned().collect())
        }

        fn read_file(&self, _root: &Path, rel_path: &str) -> anyhow::Result<String> {
            match self.files.get(rel_path) {
                Some(Some(content)) => Ok(content.clone()),
                Some(None) => bail!("permission denied"),
                None => Err(anyhow!("not found")),
            }
        }
    }

    struct FixedParser;

    impl SourceParser for FixedParser {
        fn count_functions(&self, path: &str, _content: &str) -> anyhow::Result<usize> {
            if path.contains("broken") {
                bail!("syntax error");
            }
            Ok(2)
        }
    }

    fn specifiers(content: &str) -> Vec<String> {
        extract_imports(content)
            .into_iter()
            .map(|i| i.specifier)
            .collect()
    }

    #[test]
    fn test_extract_import_forms_in_order() {
        let content = r#"import { Order } from './Order';
import type { Money } from "../shared/Money";
import * as fs from 'fs';
import './polyfill';
import Default, { named } from '@scope/pkg';
export { OrderId } from './value-objects/OrderId';
export * from './events';
const lazy = await import('./lazy');
const legacy = require("legacy-lib");
"#;
        assert_eq!(
            specifiers(content),
            vec![
                "./Order",
                "../shared/Money",
                "fs",
                "./polyfill",
                "@scope/pkg",
                "./value-objects/OrderId",
                "./events",
                "./lazy",
                "legacy-lib",
            ]
        );
    }

    #[test]
    fn test_import_lines_and_multiline_import() {
        let content = "// header\nimport {\n  A,\n  B,\n} from './ab';\n\nimport c from 'c';\n";
        let imports = extract_imports(content);
        assert_eq!(imports.len(), 2);
        assert_eq!(imports[0].specifier, "./ab");
        assert_eq!(imports[0].line, 5);
        assert_eq!(imports[1].specifier, "c");
        assert_eq!(imports[1].line, 7);
    }

    #[test]
    fn test_commented_import_is_ignored() {
        let content = "// import { x } from './x';\nimport { y } from './y';\n";
        assert_eq!(specifiers(content), vec!["./y"]);
    }

    #[test]
    fn test_duplicate_imports_are_kept() {
        let content = "import { a } from './m';\nimport { b } from './m';\n";
        assert_eq!(specifiers(content), vec!["./m", "./m"]);
    }

    #[test]
    fn test_extract_exports() {
        let content = r#"export class Order {}
export default abstract class Base {}
export interface OrderProps {}
export type OrderStatus = 'open' | 'closed';
export enum Kind { A }
export async function load() {}
export const MAX = 3;
const a = 1, b = 2;
export { a, b as beta };
export default Order;
"#;
        assert_eq!(
            extract_exports(content),
            vec![
                "Order",
                "Base",
                "OrderProps",
                "OrderStatus",
                "Kind",
                "load",
                "MAX",
                "a",
                "beta",
                "Order",
            ]
        );
    }

    #[test]
    fn test_file_stem_and_dir() {
        let classifier = LayerClassifier::default();
        let unit = SourceUnit::from_content(
            "src/domain/order/Order.entity.ts",
            String::new(),
            &classifier,
        );
        assert_eq!(unit.stem(), "Order.entity");
        assert_eq!(unit.dir(), "src/domain/order");
        assert_eq!(unit.layer, Some(Layer::Domain));
        assert_eq!(file_stem("index.ts"), "index");
        assert_eq!(file_stem(".eslintrc"), ".eslintrc");
    }

    #[test]
    fn test_build_skips_unreadable_file() {
        let files = MemoryFiles::new(&[
            ("src/domain/Order.ts", Some("import { Money } from '../shared/Money';")),
            ("src/domain/Locked.ts", None),
            ("src/shared/Money.ts", Some("export class Money {}")),
        ]);
        let classifier = LayerClassifier::default();
        let units = SourceModelBuilder::new(&files, &classifier)
            .build(Path::new("."), &[], &[])
            .unwrap();

        let paths: Vec<_> = units.iter().map(|u| u.path.as_str()).collect();
        assert_eq!(paths, vec!["src/domain/Order.ts", "src/shared/Money.ts"]);
        assert_eq!(units[0].imports[0].specifier, "../shared/Money");
        assert_eq!(units[1].exports, vec!["Money"]);
        assert_eq!(units[1].layer, Some(Layer::Shared));
    }

    #[test]
    fn test_build_counts_functions_and_tolerates_parse_failure() {
        let files = MemoryFiles::new(&[("a.ts", Some("")), ("broken.ts", Some(""))]);
        let classifier = LayerClassifier::default();
        let units = SourceModelBuilder::new(&files, &classifier)
            .with_parser(&FixedParser)
            .with_max_workers(2)
            .build(Path::new("."), &[], &[])
            .unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].functions, 2);
        assert_eq!(units[1].functions, 0);
    }

    #[test]
    fn test_build_propagates_scan_failure() {
        struct NoRoot;
        impl FileAccess for NoRoot {
            fn scan(&self, root: &Path, _: &[String], _: &[String]) -> anyhow::Result<Vec<String>> {
                bail!("directory '{}' does not exist", root.display())
            }
            fn read_file(&self, _: &Path, _: &str) -> anyhow::Result<String> {
                unreachable!()
            }
        }
        let classifier = LayerClassifier::default();
        let result = SourceModelBuilder::new(&NoRoot, &classifier).build(Path::new("/nope"), &[], &[]);
        assert!(result.is_err());
    }
}
