//! Per-document pipeline
//!
//! Idle -> BackupCreated -> Loaded -> Validated -> Executing -> Saving ->
//! Completed, or RolledBack / Unrecoverable on failure. A document that
//! entered the pipeline always ends in one of the last three states.

pub mod batch;
pub mod operation;
pub mod options;
pub mod result;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::backup::BackupStore;
use crate::diagnostics::{self, Severity};
use crate::document::{WordDocument, verify_readable};
use crate::error::{OperationError, ProcessingError};
use crate::format::blank::remove_blank_paragraphs;
use crate::format::bullets::apply_bullet_uniformity;
use crate::format::custom_style::apply_custom_styles;
use crate::format::list_indent::apply_list_indentation;
use crate::format::paragraph_style::assign_paragraph_styles;
use crate::format::replace::{replace_text, replace_urls};
use crate::format::table::format_tables;
use crate::format::whitespace::normalize_whitespace;
use crate::hyperlink::{extract_document, fix_hyperlinks};
use crate::lookup::LookupClient;
use crate::package::Package;
use crate::package::io::{
    check_file_size, read_package, validate_docx_package, validate_docx_path, write_package,
};

pub use batch::process_batch;
pub use operation::{Operation, OperationAction, OperationKind, sort_operations};
pub use options::ProcessingOptions;
pub use result::{BatchResult, Change, ProcessedLink, ProcessingResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingState {
    Idle,
    BackupCreated,
    Loaded,
    Validated,
    Executing,
    Saving,
    Completed,
    RolledBack,
    Unrecoverable,
}

impl ProcessingState {
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessingState::Idle => "idle",
            ProcessingState::BackupCreated => "backup_created",
            ProcessingState::Loaded => "loaded",
            ProcessingState::Validated => "validated",
            ProcessingState::Executing => "executing",
            ProcessingState::Saving => "saving",
            ProcessingState::Completed => "completed",
            ProcessingState::RolledBack => "rolled_back",
            ProcessingState::Unrecoverable => "unrecoverable",
        }
    }
}

/// Tracks the state of one document run
struct Run<'a> {
    label: &'a str,
    state: ProcessingState,
}

impl<'a> Run<'a> {
    fn new(label: &'a str) -> Self {
        Self {
            label,
            state: ProcessingState::Idle,
        }
    }

    fn transition(&mut self, next: ProcessingState) {
        debug!(
            event = "processor.state",
            document = self.label,
            from = self.state.as_str(),
            to = next.as_str()
        );
        self.state = next;
    }
}

pub struct DocumentProcessor {
    options: ProcessingOptions,
    lookup: Option<Arc<LookupClient>>,
    backups: Option<Arc<dyn BackupStore>>,
}

impl DocumentProcessor {
    pub fn new(options: ProcessingOptions) -> Self {
        Self {
            options,
            lookup: None,
            backups: None,
        }
    }

    pub fn with_lookup(mut self, client: Arc<LookupClient>) -> Self {
        self.lookup = Some(client);
        self
    }

    pub fn with_backup_store(mut self, store: Arc<dyn BackupStore>) -> Self {
        self.backups = Some(store);
        self
    }

    pub fn options(&self) -> &ProcessingOptions {
        &self.options
    }

    pub fn lookup(&self) -> Option<&Arc<LookupClient>> {
        self.lookup.as_ref()
    }

    /// Process a document in place on disk
    pub async fn process_path(&self, path: &Path) -> ProcessingResult {
        let started = Instant::now();
        let label = path.display().to_string();
        let mut run = Run::new(&label);
        let mut result = ProcessingResult::for_path(Some(path.to_path_buf()));

        match self.run_path(path, &mut run, &mut result).await {
            Ok(()) => self.complete(&mut run, &mut result),
            Err(err) => {
                let err = self.roll_back(path, err, &mut run, &result).await;
                self.record_failure(&mut run, &mut result, err);
            }
        }

        result.duration_ms = started.elapsed().as_millis();
        result
    }

    /// Process an in-memory package; on failure the input bytes are returned unchanged
    pub async fn process_bytes(&self, bytes: &[u8]) -> (ProcessingResult, Vec<u8>) {
        let started = Instant::now();
        let mut run = Run::new("<memory>");
        let mut result = ProcessingResult::for_path(None);

        let output = match self.run_bytes(bytes, &mut run, &mut result).await {
            Ok(output) => {
                self.complete(&mut run, &mut result);
                output.unwrap_or_else(|| bytes.to_vec())
            }
            Err(err) => {
                run.transition(ProcessingState::RolledBack);
                self.record_failure(&mut run, &mut result, err);
                bytes.to_vec()
            }
        };

        result.duration_ms = started.elapsed().as_millis();
        (result, output)
    }

    async fn run_path(
        &self,
        path: &Path,
        run: &mut Run<'_>,
        result: &mut ProcessingResult,
    ) -> Result<(), ProcessingError> {
        validate_docx_path(path)?;
        check_file_size(path, self.options.max_file_size).await?;

        if self.options.create_backup {
            match &self.backups {
                Some(store) => {
                    result.backup_path = Some(store.create_backup(path).await?);
                    run.transition(ProcessingState::BackupCreated);
                }
                None => {
                    warn!(event = "processor.backup.unavailable", path = %path.display());
                    result.warnings.push(
                        "no backup store attached; changes cannot be rolled back".to_string(),
                    );
                }
            }
        }

        let (package, original) = read_package(path, self.options.max_file_size).await?;
        if let Some(output) = self.run_package(package, &original, run, result).await? {
            write_package(path, &output).await?;
        }
        Ok(())
    }

    async fn run_bytes(
        &self,
        bytes: &[u8],
        run: &mut Run<'_>,
        result: &mut ProcessingResult,
    ) -> Result<Option<Vec<u8>>, ProcessingError> {
        let size = bytes.len() as u64;
        if size > self.options.max_file_size {
            return Err(ProcessingError::LimitExceeded {
                size,
                limit: self.options.max_file_size,
            });
        }
        let package = Package::from_bytes(bytes)?;
        validate_docx_package(&package)?;
        self.run_package(package, bytes, run, result).await
    }

    /// Load, validate, execute and serialize; `None` when nothing changed
    async fn run_package(
        &self,
        package: Package,
        original: &[u8],
        run: &mut Run<'_>,
        result: &mut ProcessingResult,
    ) -> Result<Option<Vec<u8>>, ProcessingError> {
        let mut doc = WordDocument::load(package)?;
        run.transition(ProcessingState::Loaded);

        if self.options.validate {
            let report = diagnostics::diagnose_package(doc.package());
            result.warnings.extend(
                report
                    .issues
                    .iter()
                    .filter(|issue| issue.severity != Severity::Info)
                    .map(ToString::to_string),
            );
            run.transition(ProcessingState::Validated);
        }

        let extraction = extract_document(&doc);
        result.total_hyperlinks = extraction.hyperlinks.len();
        result
            .warnings
            .extend(extraction.issues.iter().map(ToString::to_string));

        run.transition(ProcessingState::Executing);
        for operation in sort_operations(&self.options.operations) {
            let name = operation.name();
            match self.execute(&operation, &mut doc, result).await {
                Ok(()) => {}
                Err(err) if operation.is_critical() || err.is_fatal() => {
                    warn!(
                        event = "processor.operation.aborted",
                        document = run.label,
                        operation = name,
                        error = %err
                    );
                    return Err(err);
                }
                Err(err) => {
                    warn!(
                        event = "processor.operation.failed",
                        document = run.label,
                        operation = name,
                        error = %err
                    );
                    result.record_error(err.to_string());
                    if operation.kind() == OperationKind::Hyperlink {
                        result.skipped_hyperlinks += 1;
                    }
                }
            }
        }

        run.transition(ProcessingState::Saving);
        if !doc.is_modified() {
            return Ok(None);
        }
        let output = doc.to_bytes()?;
        verify_readable(original, &output)?;
        Ok(Some(output))
    }

    async fn execute(
        &self,
        operation: &Operation,
        doc: &mut WordDocument,
        result: &mut ProcessingResult,
    ) -> Result<(), ProcessingError> {
        let options = &self.options;
        let outcome = match &operation.action {
            OperationAction::FixHyperlinks => return self.repair_hyperlinks(doc, result).await,
            OperationAction::ReplaceUrl(rule) => replace_urls(doc, rule)?,
            OperationAction::ReplaceText(rule) => replace_text(doc, rule)?,
            OperationAction::Whitespace => normalize_whitespace(doc),
            OperationAction::ParagraphStyles => assign_paragraph_styles(doc, &options.headings),
            OperationAction::CustomStyles => apply_custom_styles(doc, &options.styles),
            OperationAction::ListIndentation => apply_list_indentation(doc, &options.indentation),
            OperationAction::Bullets => apply_bullet_uniformity(doc, &options.bullets),
            OperationAction::Tables => format_tables(doc, &options.tables),
            OperationAction::BlankParagraphs => remove_blank_paragraphs(doc),
        };

        debug!(
            event = "processor.operation.completed",
            operation = operation.name(),
            mutations = outcome.mutations,
            warnings = outcome.warnings.len()
        );
        result.changes.extend(outcome.changes);
        result.warnings.extend(outcome.warnings);
        Ok(())
    }

    async fn repair_hyperlinks(
        &self,
        doc: &mut WordDocument,
        result: &mut ProcessingResult,
    ) -> Result<(), ProcessingError> {
        let client = self.lookup.as_ref().ok_or_else(|| {
            OperationError::new("fix_hyperlinks", "no lookup backend is configured")
        })?;

        // Earlier operations may have rewritten targets
        let extraction = extract_document(doc);
        let resolution = client.resolve(&extraction.hyperlinks).await?;
        let outcome = fix_hyperlinks(
            doc,
            &extraction.hyperlinks,
            &resolution,
            &self.options.canonical_base_url,
        );

        debug!(
            event = "processor.hyperlinks.fixed",
            backend = client.backend_name(),
            processed = outcome.processed,
            modified = outcome.modified,
            skipped = outcome.skipped
        );
        result.processed_hyperlinks += outcome.processed;
        result.modified_hyperlinks += outcome.modified;
        result.skipped_hyperlinks += outcome.skipped;
        result.processed_links.extend(outcome.links);
        result.changes.extend(outcome.changes);
        Ok(())
    }

    fn complete(&self, run: &mut Run<'_>, result: &mut ProcessingResult) {
        run.transition(ProcessingState::Completed);
        result.success = true;
        info!(
            event = "processor.document.completed",
            document = run.label,
            hyperlinks = result.total_hyperlinks,
            modified = result.modified_hyperlinks,
            changes = result.changes.len(),
            errors = result.error_count
        );
    }

    /// Restore the backup when one was taken; a failed restore wraps the original error
    async fn roll_back(
        &self,
        path: &Path,
        err: ProcessingError,
        run: &mut Run<'_>,
        result: &ProcessingResult,
    ) -> ProcessingError {
        let (Some(backup), Some(store)) = (&result.backup_path, &self.backups) else {
            run.transition(ProcessingState::Unrecoverable);
            return err;
        };
        match store.restore_backup(backup, path).await {
            Ok(()) => {
                run.transition(ProcessingState::RolledBack);
                err
            }
            Err(restore) => {
                run.transition(ProcessingState::Unrecoverable);
                ProcessingError::RollbackFailed {
                    original: Box::new(err),
                    restore,
                }
            }
        }
    }

    fn record_failure(&self, run: &mut Run<'_>, result: &mut ProcessingResult, err: ProcessingError) {
        error!(
            event = "processor.document.failed",
            document = run.label,
            state = run.state.as_str(),
            error = %err
        );
        result.success = false;
        result.record_error(err.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_have_stable_names() {
        assert_eq!(ProcessingState::BackupCreated.as_str(), "backup_created");
        assert_eq!(ProcessingState::Unrecoverable.as_str(), "unrecoverable");
    }

    #[tokio::test]
    async fn oversized_buffers_are_rejected_before_parsing() {
        let processor = DocumentProcessor::new(ProcessingOptions {
            max_file_size: 4,
            ..ProcessingOptions::default()
        });
        let (result, output) = processor.process_bytes(b"not a zip at all").await;
        assert!(!result.success);
        assert_eq!(output, b"not a zip at all");
        assert!(result.error_messages[0].contains("exceeds the limit"));
    }

    #[tokio::test]
    async fn missing_lookup_fails_critical_fix() {
        let doc = WordDocument::from_body("<w:p/>");
        let bytes = doc.to_bytes().unwrap();
        let processor = DocumentProcessor::new(ProcessingOptions {
            validate: false,
            ..ProcessingOptions::default()
        });
        let (result, output) = processor.process_bytes(&bytes).await;
        assert!(!result.success);
        assert_eq!(output, bytes);
        assert!(result.error_messages[0].contains("no lookup backend"));
    }
}
