//! Symbol extraction from tree-sitter syntax trees.

use tree_sitter::{Node, Parser};

use crate::error::{Result, ScanError};
use crate::languages::{Lang, NodeRule};
use crate::symbol::{Symbol, SymbolKind};

/// Turns source text into symbols, in pre-order.
pub trait SymbolExtractor: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the source cannot be parsed.
    fn extract(&self, source: &str, path: &str) -> Result<Vec<Symbol>>;

    fn language(&self) -> &'static str;
}

/// Declarator values that make `const f = ...` a function.
const FUNCTION_VALUES: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function",
    "generator_function",
];

/// Nearest enclosing named symbol of a node.
#[derive(Clone, Copy)]
struct Enclosing<'s> {
    name: Option<&'s str>,
    class_like: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct TreeSitterExtractor {
    lang: Lang,
}

impl TreeSitterExtractor {
    #[must_use]
    pub fn new(lang: Lang) -> Self {
        Self { lang }
    }

    #[must_use]
    pub fn lang(&self) -> Lang {
        self.lang
    }

    fn symbol_at<'s>(
        &self,
        node: Node<'_>,
        source: &'s str,
        path: &str,
        kind: SymbolKind,
        name: &'s str,
        parent: Option<&str>,
    ) -> Symbol {
        Symbol {
            name: name.to_owned(),
            kind,
            file_path: path.to_owned(),
            start_line: node.start_position().row + 1,
            end_line: node.end_position().row + 1,
            code: source[node.byte_range()].to_owned(),
            parent: parent.map(str::to_owned),
            docstring: if self.lang.has_docstrings() {
                python_docstring(node, source)
            } else {
                None
            },
        }
    }
}

impl SymbolExtractor for TreeSitterExtractor {
    fn extract(&self, source: &str, path: &str) -> Result<Vec<Symbol>> {
        let grammar = self
            .lang
            .grammar()
            .ok_or(ScanError::NoGrammar(self.lang.id()))?;

        let mut parser = Parser::new();
        parser
            .set_language(&grammar)
            .map_err(|e| ScanError::Parse {
                path: path.to_owned(),
                message: format!("set_language failed: {e}"),
            })?;

        let tree = parser.parse(source, None).ok_or_else(|| ScanError::Parse {
            path: path.to_owned(),
            message: "parser returned no tree".into(),
        })?;
        let root = tree.root_node();
        if root.has_error() {
            tracing::debug!(file = path, "syntax errors present, extracting what parsed");
        }

        let mut symbols = Vec::new();
        let top = Enclosing {
            name: None,
            class_like: false,
        };
        // Explicit stack keeps pre-order without recursing on deep trees.
        let mut stack = vec![(root, top)];
        let mut cursor = root.walk();

        while let Some((node, enclosing)) = stack.pop() {
            let mut inner = enclosing;
            match self.lang.rule(node.kind()) {
                Some(NodeRule::Emit(kind)) => {
                    if let Some(name) = symbol_name(node, source) {
                        symbols.push(self.symbol_at(node, source, path, kind, name, enclosing.name));
                        inner = Enclosing {
                            name: Some(name),
                            class_like: kind.is_class_like(),
                        };
                    }
                }
                Some(NodeRule::Callable) => {
                    if let Some(name) = symbol_name(node, source) {
                        let kind = if enclosing.class_like {
                            SymbolKind::Method
                        } else {
                            SymbolKind::Function
                        };
                        symbols.push(self.symbol_at(node, source, path, kind, name, enclosing.name));
                        inner = Enclosing {
                            name: Some(name),
                            class_like: false,
                        };
                    }
                }
                Some(NodeRule::Scope) => {
                    if let Some(name) = symbol_name(node, source) {
                        inner = Enclosing {
                            name: Some(name),
                            class_like: true,
                        };
                    }
                }
                None => {}
            }

            let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev().map(|child| (child, inner)));
        }

        Ok(symbols)
    }

    fn language(&self) -> &'static str {
        self.lang.id()
    }
}

fn symbol_name<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    let name_node = match node.kind() {
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = node.walk();
            let declarator = node.named_children(&mut cursor).find(|d| {
                d.kind() == "variable_declarator"
                    && d.child_by_field_name("value")
                        .is_some_and(|v| FUNCTION_VALUES.contains(&v.kind()))
            })?;
            declarator
                .child_by_field_name("name")
                .filter(|n| n.kind() == "identifier")?
        }
        // tree-sitter-rust: impl_item names its target in the "type" field
        "impl_item" => node.child_by_field_name("type")?,
        _ => node.child_by_field_name("name")?,
    };
    let name = source[name_node.byte_range()].trim();
    (!name.is_empty()).then_some(name)
}

/// First statement of the body, when it is a bare string literal.
fn python_docstring(node: Node<'_>, source: &str) -> Option<String> {
    let body = node.child_by_field_name("body")?;
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment")?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let literal = first.named_child(0)?;
    if literal.kind() != "string" {
        return None;
    }
    let raw = &source[literal.byte_range()];
    let text = raw
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    (!text.is_empty()).then(|| text.to_owned())
}
