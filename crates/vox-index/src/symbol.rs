use std::fmt;

use serde::{Deserialize, Serialize};
use vox_store::{IndexableItem, ItemKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Class,
    Function,
    Method,
    Interface,
    Type,
    Module,
}

impl SymbolKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Function => "function",
            Self::Method => "method",
            Self::Interface => "interface",
            Self::Type => "type",
            Self::Module => "module",
        }
    }

    /// Functions directly inside these become methods.
    #[must_use]
    pub fn is_class_like(self) -> bool {
        matches!(self, Self::Class | Self::Interface)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named code construct. Lines are 1-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub file_path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub code: String,
    pub parent: Option<String>,
    pub docstring: Option<String>,
}

impl Symbol {
    /// Indexed text: kind, name and the full body.
    #[must_use]
    pub fn content(&self) -> String {
        format!(
            "Symbol: {}\nType: {}\nCode:\n{}",
            self.name, self.kind, self.code
        )
    }

    #[must_use]
    pub fn to_item(&self) -> IndexableItem {
        let mut item = IndexableItem::new(ItemKind::Symbol, self.content())
            .with_file_path(self.file_path.clone())
            .with_meta("name", self.name.clone())
            .with_meta("symbol_type", self.kind.as_str())
            .with_meta("start_line", self.start_line)
            .with_meta("end_line", self.end_line);
        if let Some(parent) = &self.parent {
            item = item.with_meta("parent", parent.clone());
        }
        if let Some(doc) = &self.docstring {
            item = item.with_meta("docstring", doc.clone());
        }
        item
    }
}
