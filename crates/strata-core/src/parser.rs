use anyhow::{Context, Result};
use tree_sitter::{Language, Node, Parser};

/// Syntax-tree capability used for metrics that a lexical scan cannot
/// answer reliably.
pub trait SourceParser: Send + Sync {
    /// Number of declared functions (declarations, methods, function
    /// expressions and arrow functions) in a file.
    fn count_functions(&self, path: &str, content: &str) -> Result<usize>;
}

const FUNCTION_KINDS: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "function_expression",
    "generator_function",
    "arrow_function",
    "method_definition",
];

/// TypeScript/TSX parser using tree-sitter. Also accepts plain JavaScript,
/// which the TypeScript grammars are a superset of.
pub struct TypeScriptParser {
    ts_language: Language,
    tsx_language: Language,
}

impl TypeScriptParser {
    pub fn new() -> Self {
        Self {
            ts_language: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            tsx_language: tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }

    fn language_for_file(&self, path: &str) -> &Language {
        if path.ends_with(".tsx") || path.ends_with(".jsx") {
            &self.tsx_language
        } else {
            &self.ts_language
        }
    }
}

impl Default for TypeScriptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceParser for TypeScriptParser {
    fn count_functions(&self, path: &str, content: &str) -> Result<usize> {
        let mut parser = Parser::new();
        parser
            .set_language(self.language_for_file(path))
            .context("failed to set TypeScript language")?;
        let tree = parser
            .parse(content, None)
            .with_context(|| format!("failed to parse {path}"))?;
        Ok(count_kinds(tree.root_node(), FUNCTION_KINDS))
    }
}

/// Count nodes of the given kinds with an explicit cursor walk.
fn count_kinds(root: Node<'_>, kinds: &[&str]) -> usize {
    let mut count = 0;
    let mut cursor = root.walk();
    loop {
        if kinds.contains(&cursor.node().kind()) {
            count += 1;
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return count;
            }
        }
    }
}
