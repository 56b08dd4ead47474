//! Extension → extractor dispatch table.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::extractor::{SymbolExtractor, TreeSitterExtractor};
use crate::languages::Lang;

/// Maps lowercase file extensions to the extractor that understands them.
///
/// New languages are added with [`ExtractorRegistry::register`]; the scanner
/// never matches on extensions itself.
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    by_extension: HashMap<String, Arc<dyn SymbolExtractor>>,
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("extensions", &self.extensions())
            .finish()
    }
}

impl ExtractorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every compiled-in tree-sitter grammar.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for lang in Lang::ALL {
            if lang.grammar().is_some() {
                registry.register(lang.extensions(), Arc::new(TreeSitterExtractor::new(lang)));
            }
        }
        registry
    }

    /// Route `extensions` (without the dot) to `extractor`, replacing any
    /// previous registration.
    pub fn register(&mut self, extensions: &[&str], extractor: Arc<dyn SymbolExtractor>) {
        for ext in extensions {
            self.by_extension
                .insert(ext.trim_start_matches('.').to_ascii_lowercase(), Arc::clone(&extractor));
        }
    }

    #[must_use]
    pub fn for_path(&self, path: &Path) -> Option<&Arc<dyn SymbolExtractor>> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.by_extension.get(&ext)
    }

    /// Registered extensions, sorted.
    #[must_use]
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.by_extension.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }
}
