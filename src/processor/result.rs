//! Per-document and batch results

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::lookup::LookupStatus;

/// One entry of the audit log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    pub part: String,
    pub before: String,
    pub after: String,
    pub description: String,
}

/// A hyperlink that was sent through resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedLink {
    pub id: String,
    pub url: String,
    pub original_url: String,
    pub display_text: String,
    pub status: LookupStatus,
    pub before: String,
    pub after: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub path: Option<PathBuf>,
    pub success: bool,
    pub total_hyperlinks: usize,
    pub processed_hyperlinks: usize,
    pub modified_hyperlinks: usize,
    pub skipped_hyperlinks: usize,
    pub error_count: usize,
    pub error_messages: Vec<String>,
    pub warnings: Vec<String>,
    pub processed_links: Vec<ProcessedLink>,
    pub changes: Vec<Change>,
    pub duration_ms: u128,
    pub backup_path: Option<PathBuf>,
}

impl ProcessingResult {
    pub fn for_path(path: Option<PathBuf>) -> Self {
        Self {
            path,
            ..Self::default()
        }
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.error_count += 1;
        self.error_messages.push(message.into());
    }

    /// A failed result for a document that never got through the pipeline
    pub fn failed(path: Option<PathBuf>, message: impl Into<String>) -> Self {
        let mut result = Self::for_path(path);
        result.record_error(message);
        result
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub results: Vec<ProcessingResult>,
    pub successful_files: usize,
    pub failed_files: usize,
    pub duration_ms: u128,
}

impl BatchResult {
    pub fn push(&mut self, result: ProcessingResult) {
        if result.success {
            self.successful_files += 1;
        } else {
            self.failed_files += 1;
        }
        self.results.push(result);
    }

    pub fn total_changes(&self) -> usize {
        self.results.iter().map(|result| result.changes.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case() {
        let mut result = ProcessingResult::for_path(Some(PathBuf::from("a.docx")));
        result.total_hyperlinks = 3;
        result.record_error("boom");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["totalHyperlinks"], 3);
        assert_eq!(json["errorCount"], 1);
        assert_eq!(json["errorMessages"][0], "boom");
        assert!(json["backupPath"].is_null());
    }

    #[test]
    fn batch_counts_outcomes() {
        let mut batch = BatchResult::default();
        batch.push(ProcessingResult {
            success: true,
            ..ProcessingResult::default()
        });
        batch.push(ProcessingResult::failed(None, "nope"));
        assert_eq!((batch.successful_files, batch.failed_files), (1, 1));
        assert_eq!(batch.results.len(), 2);
    }
}
