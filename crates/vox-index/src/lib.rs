//! Project scanning: directory walk, tree-sitter symbol extraction and
//! prose chunking into [`vox_store::IndexableItem`]s.

pub mod error;
pub mod extractor;
pub mod languages;
pub mod markdown;
pub mod registry;
pub mod scanner;
pub mod skeleton;
pub mod splitter;
pub mod symbol;
pub mod tree;

pub use error::ScanError;
pub use extractor::{SymbolExtractor, TreeSitterExtractor};
pub use languages::Lang;
pub use registry::ExtractorRegistry;
pub use scanner::{ScanOutcome, ScannerConfig, SourceScanner};
pub use symbol::{Symbol, SymbolKind};
