use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Registry row id of a [`Document`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct DocumentId(pub i64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub path: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Rule,
    #[default]
    Note,
    Doc,
}

impl DocumentKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rule => "rule",
            Self::Note => "note",
            Self::Doc => "doc",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rule" => Ok(Self::Rule),
            "note" => Ok(Self::Note),
            "doc" => Ok(Self::Doc),
            other => Err(format!(
                "unknown document type {other:?} (expected rule, note or doc)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub project_id: String,
    pub kind: DocumentKind,
    pub title: Option<String>,
    pub content: String,
    pub file_path: Option<String>,
    pub created_at: String,
}

impl Document {
    /// Text indexed for this document: `Title: <title>\n<content>` when titled.
    #[must_use]
    pub fn indexable_text(&self) -> String {
        match self.title.as_deref().filter(|t| !t.is_empty()) {
            Some(title) => format!("Title: {title}\n{}", self.content),
            None => self.content.clone(),
        }
    }

    #[must_use]
    pub fn to_item(&self) -> IndexableItem {
        let mut metadata = serde_json::Map::new();
        metadata.insert("document_id".into(), self.id.0.into());
        if let Some(title) = &self.title {
            metadata.insert("title".into(), title.clone().into());
        }
        IndexableItem {
            content: self.indexable_text(),
            file_path: self.file_path.clone(),
            kind: self.kind.into(),
            metadata,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewDocument {
    pub kind: DocumentKind,
    pub title: Option<String>,
    pub content: String,
    pub file_path: Option<String>,
}

/// Type tag of a persisted item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Symbol,
    Markdown,
    Rule,
    Note,
    Doc,
}

impl ItemKind {
    pub const ALL: [Self; 5] = [
        Self::Symbol,
        Self::Markdown,
        Self::Rule,
        Self::Note,
        Self::Doc,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Symbol => "symbol",
            Self::Markdown => "markdown",
            Self::Rule => "rule",
            Self::Note => "note",
            Self::Doc => "doc",
        }
    }

    /// Authority tier used by hybrid ranking: rules, then code, then prose.
    #[must_use]
    pub fn tier(self) -> u8 {
        match self {
            Self::Rule => 0,
            Self::Symbol => 1,
            Self::Markdown | Self::Note | Self::Doc => 2,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown item type {s:?}"))
    }
}

impl From<DocumentKind> for ItemKind {
    fn from(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Rule => Self::Rule,
            DocumentKind::Note => Self::Note,
            DocumentKind::Doc => Self::Doc,
        }
    }
}

/// Restricts a search to code symbols, to everything else, or to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemScope {
    #[default]
    All,
    Symbols,
    Text,
}

impl ItemScope {
    #[must_use]
    pub fn admits(self, kind: ItemKind) -> bool {
        match self {
            Self::All => true,
            Self::Symbols => kind == ItemKind::Symbol,
            Self::Text => kind != ItemKind::Symbol,
        }
    }
}

/// A unit of retrievable content before it is embedded.
///
/// The owning project and the vector are supplied at upsert time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexableItem {
    pub content: String,
    pub file_path: Option<String>,
    pub kind: ItemKind,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl IndexableItem {
    #[must_use]
    pub fn new(kind: ItemKind, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            file_path: None,
            kind,
            metadata: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_owned(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub content: String,
    pub source: String,
    pub relevance: f32,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}
