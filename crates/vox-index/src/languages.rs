//! Language detection and per-grammar symbol rules.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::symbol::SymbolKind;

/// Languages with a compiled-in symbol extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Python,
    TypeScript,
    Tsx,
    JavaScript,
    Rust,
}

/// How the extractor treats a syntax node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRule {
    /// Always a symbol of this kind.
    Emit(SymbolKind),
    /// A function: method when its nearest enclosing symbol is class-like.
    Callable,
    /// Not a symbol itself, but names a class-like scope (Rust `impl`).
    Scope,
}

impl Lang {
    pub const ALL: [Self; 5] = [
        Self::Python,
        Self::TypeScript,
        Self::Tsx,
        Self::JavaScript,
        Self::Rust,
    ];

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::JavaScript => "javascript",
            Self::Rust => "rust",
        }
    }

    #[must_use]
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Python => &["py", "pyi"],
            Self::TypeScript => &["ts", "mts", "cts"],
            Self::Tsx => &["tsx"],
            Self::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Self::Rust => &["rs"],
        }
    }

    /// Get the tree-sitter grammar. Returns `None` if the
    /// corresponding feature is not enabled.
    #[must_use]
    pub fn grammar(self) -> Option<tree_sitter::Language> {
        match self {
            #[cfg(feature = "lang-python")]
            Self::Python => Some(tree_sitter_python::LANGUAGE.into()),
            #[cfg(feature = "lang-js")]
            Self::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            #[cfg(feature = "lang-js")]
            Self::Tsx => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
            #[cfg(feature = "lang-js")]
            Self::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            #[cfg(feature = "lang-rust")]
            Self::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    #[must_use]
    pub fn rule(self, node_kind: &str) -> Option<NodeRule> {
        match self {
            Self::Python => match node_kind {
                "class_definition" => Some(NodeRule::Emit(SymbolKind::Class)),
                "function_definition" => Some(NodeRule::Callable),
                _ => None,
            },
            Self::TypeScript | Self::Tsx => match node_kind {
                "class_declaration" | "abstract_class_declaration" => {
                    Some(NodeRule::Emit(SymbolKind::Class))
                }
                "interface_declaration" => Some(NodeRule::Emit(SymbolKind::Interface)),
                "type_alias_declaration" | "enum_declaration" => {
                    Some(NodeRule::Emit(SymbolKind::Type))
                }
                "internal_module" => Some(NodeRule::Emit(SymbolKind::Module)),
                "function_declaration"
                | "generator_function_declaration"
                | "method_definition"
                | "lexical_declaration"
                | "variable_declaration" => Some(NodeRule::Callable),
                _ => None,
            },
            Self::JavaScript => match node_kind {
                "class_declaration" => Some(NodeRule::Emit(SymbolKind::Class)),
                "function_declaration"
                | "generator_function_declaration"
                | "method_definition"
                | "lexical_declaration"
                | "variable_declaration" => Some(NodeRule::Callable),
                _ => None,
            },
            Self::Rust => match node_kind {
                "struct_item" | "enum_item" | "union_item" | "type_item" => {
                    Some(NodeRule::Emit(SymbolKind::Type))
                }
                "trait_item" => Some(NodeRule::Emit(SymbolKind::Interface)),
                "mod_item" => Some(NodeRule::Emit(SymbolKind::Module)),
                "impl_item" => Some(NodeRule::Scope),
                "function_item" | "function_signature_item" => Some(NodeRule::Callable),
                _ => None,
            },
        }
    }

    /// Python is the only grammar with docstrings.
    #[must_use]
    pub fn has_docstrings(self) -> bool {
        self == Self::Python
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Detect language from file extension.
#[must_use]
pub fn detect_language(path: &Path) -> Option<Lang> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    Lang::ALL
        .into_iter()
        .find(|lang| lang.extensions().contains(&ext.as_str()))
}

/// Extensions handled by the prose chunker.
pub const PROSE_EXTENSIONS: &[&str] = &["md", "markdown", "mdx", "txt"];

#[must_use]
pub fn is_prose(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| PROSE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}
