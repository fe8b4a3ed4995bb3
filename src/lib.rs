//! dochub: batch hyperlink repair and formatting normalization for .docx files
//!
//! This library loads Word packages, resolves organization identifiers found in
//! hyperlinks against a lookup service, rewrites link targets and text, and
//! applies formatting passes, all under a backup/rollback discipline.

pub mod backup;
pub mod config;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod format;
pub mod hyperlink;
pub mod lookup;
pub mod package;
pub mod processor;
pub mod xml;

// Re-export commonly used types
pub use backup::{BackupStore, FileBackupStore};
pub use config::Config;
pub use document::WordDocument;
pub use error::{OperationError, PersistenceError, ProcessingError, ResolutionError, ValidationError};
pub use lookup::{LocalDictionary, LookupBackend, LookupClient, RemoteLookup, RetryPolicy};
pub use package::Package;
pub use processor::{
    BatchResult, DocumentProcessor, Operation, OperationAction, ProcessingOptions,
    ProcessingResult, process_batch,
};
