//! Error taxonomy for document processing
//!
//! Validation and non-critical operation errors are recorded on the result and
//! processing continues. Resolution, persistence and critical operation errors
//! fail the whole document and trigger a rollback when a backup exists.

use std::path::PathBuf;

use thiserror::Error;

use crate::xml::XmlError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("hyperlink in {part} references missing relationship {id}")]
    MissingRelationship { part: String, id: String },
    #[error("relationship {id} in {part} is not referenced by any hyperlink")]
    OrphanedRelationship { part: String, id: String },
    #[error("duplicate relationship id {id} in {part}")]
    DuplicateRelationship { part: String, id: String },
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("lookup endpoint is not configured")]
    EndpointUnset,
    #[error("lookup request timeout after {0}ms")]
    Timeout(u128),
    #[error("lookup endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed lookup response: {0}")]
    Malformed(String),
    #[error("lookup transport error: {0}")]
    Transport(String),
    #[error("local dictionary unavailable: {0}")]
    Dictionary(String),
}

impl ResolutionError {
    /// Whether another attempt may succeed
    ///
    /// Timeouts are terminal: the caller's deadline already elapsed.
    pub fn is_transient(&self) -> bool {
        match self {
            ResolutionError::Transport(_) => true,
            ResolutionError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid package: {0}")]
    Archive(String),
    #[error("missing required part {0}")]
    MissingPart(String),
    #[error("failed to process XML part {part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: XmlError,
    },
    #[error("backup failed for {path}: {message}")]
    Backup { path: PathBuf, message: String },
    #[error("restore from {backup} failed: {message}")]
    Restore { backup: PathBuf, message: String },
    #[error("saved package failed verification: {0}")]
    Verification(String),
}

impl From<zip::result::ZipError> for PersistenceError {
    fn from(err: zip::result::ZipError) -> Self {
        PersistenceError::Archive(err.to_string())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("operation '{operation}' failed: {message}")]
pub struct OperationError {
    pub operation: String,
    pub message: String,
}

impl OperationError {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Operation(#[from] OperationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("file size {size} bytes exceeds the limit of {limit} bytes")]
    LimitExceeded { size: u64, limit: u64 },
    #[error("rollback failed: {restore} (original error: {original})")]
    RollbackFailed {
        original: Box<ProcessingError>,
        restore: PersistenceError,
    },
}

impl ProcessingError {
    /// Errors that fail the whole document regardless of the operation's criticality
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ProcessingError::Resolution(_)
                | ProcessingError::Persistence(_)
                | ProcessingError::LimitExceeded { .. }
                | ProcessingError::RollbackFailed { .. }
        )
    }
}
