use serde::{Deserialize, Serialize};

use super::operation::{Operation, OperationAction};
use crate::format::{
    BulletSettings, HeadingStyles, IndentationTable, StyleTable, TableSettings,
};
use crate::package::io::DEFAULT_MAX_FILE_SIZE;

pub const DEFAULT_CANONICAL_BASE: &str = "https://thesource.example.com/";

/// Everything a document run needs besides its collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingOptions {
    pub operations: Vec<Operation>,
    /// Prefix of rewritten targets: `{base}#!/view?docid={id}`
    pub canonical_base_url: String,
    pub max_file_size: u64,
    pub create_backup: bool,
    /// Run structural diagnostics before executing operations
    pub validate: bool,
    pub headings: HeadingStyles,
    pub styles: StyleTable,
    pub indentation: IndentationTable,
    pub tables: TableSettings,
    pub bullets: BulletSettings,
    /// Documents per batch chunk
    pub concurrency: usize,
    /// Reclaim lookup cache memory after this many documents
    pub reclaim_every: usize,
    /// Cache entries older than this are dropped on reclamation
    pub cache_max_age_secs: u64,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            operations: vec![Operation::new(OperationAction::FixHyperlinks)],
            canonical_base_url: DEFAULT_CANONICAL_BASE.to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            create_backup: true,
            validate: true,
            headings: HeadingStyles::default(),
            styles: StyleTable::new(),
            indentation: IndentationTable::standard(),
            tables: TableSettings::default(),
            bullets: BulletSettings::default(),
            concurrency: 3,
            reclaim_every: 10,
            cache_max_age_secs: 3600,
        }
    }
}

impl ProcessingOptions {
    pub fn with_operations(mut self, operations: impl IntoIterator<Item = Operation>) -> Self {
        self.operations = operations.into_iter().collect();
        self
    }

    pub fn needs_lookup(&self) -> bool {
        self.operations
            .iter()
            .any(|op| matches!(op.action, OperationAction::FixHyperlinks))
    }
}
