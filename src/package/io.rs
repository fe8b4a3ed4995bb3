//! File I/O operations and validation
//!
//! This module handles file validation, the size ceiling, and reading/writing
//! packages on disk.

use std::path::Path;

use super::{MAIN_DOCUMENT_PART, Package};
use crate::error::{PersistenceError, ProcessingError};

/// Files above this size are rejected before any mutation
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

const WORD_EXTENSIONS: &[&str] = &["docx", "docm", "dotx", "dotm"];

/// Validates that the path names a Word package
pub fn validate_docx_path(file_path: &Path) -> Result<(), PersistenceError> {
    let extension = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if !WORD_EXTENSIONS.contains(&extension.as_str()) {
        return Err(PersistenceError::Archive(format!(
            "invalid file format: expected a .docx file, got .{extension} \
             (only Word packages are supported, not .doc, .xlsx, .zip, etc.)"
        )));
    }
    Ok(())
}

/// Validates that a loaded package is a Word document
pub(crate) fn validate_docx_package(package: &Package) -> Result<(), PersistenceError> {
    if package.has_part(MAIN_DOCUMENT_PART) {
        return Ok(());
    }
    if package.has_part("xl/workbook.xml") {
        return Err(PersistenceError::Archive(
            "this appears to be an Excel file (.xlsx); only Word documents are supported".into(),
        ));
    }
    if package.has_part("ppt/presentation.xml") {
        return Err(PersistenceError::Archive(
            "this appears to be a PowerPoint file (.pptx); only Word documents are supported"
                .into(),
        ));
    }
    Err(PersistenceError::MissingPart(MAIN_DOCUMENT_PART.to_string()))
}

/// Enforce the size ceiling, returning the file size
pub async fn check_file_size(file_path: &Path, limit: u64) -> Result<u64, ProcessingError> {
    let metadata = tokio::fs::metadata(file_path)
        .await
        .map_err(|source| PersistenceError::Read {
            path: file_path.to_path_buf(),
            source,
        })?;
    let size = metadata.len();
    if size > limit {
        return Err(ProcessingError::LimitExceeded { size, limit });
    }
    Ok(size)
}

/// Read a package from disk after the size check, returning it with the original bytes
pub async fn read_package(
    file_path: &Path,
    limit: u64,
) -> Result<(Package, Vec<u8>), ProcessingError> {
    validate_docx_path(file_path)?;
    check_file_size(file_path, limit).await?;

    let bytes = tokio::fs::read(file_path)
        .await
        .map_err(|source| PersistenceError::Read {
            path: file_path.to_path_buf(),
            source,
        })?;
    let package = Package::from_bytes(&bytes)?;
    validate_docx_package(&package)?;
    Ok((package, bytes))
}

pub async fn write_package(file_path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    tokio::fs::write(file_path, bytes)
        .await
        .map_err(|source| PersistenceError::Write {
            path: file_path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_word_extensions() {
        assert!(validate_docx_path(Path::new("report.docx")).is_ok());
        assert!(validate_docx_path(Path::new("REPORT.DOCX")).is_ok());
        let err = validate_docx_path(Path::new("sheet.xlsx")).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }

    #[test]
    fn detects_spreadsheet_packages() {
        let mut package = Package::new();
        package.set_part("xl/workbook.xml", b"<workbook/>".to_vec());
        let err = validate_docx_package(&package).unwrap_err();
        assert!(err.to_string().contains("Excel"));
    }

    #[tokio::test]
    async fn oversized_files_are_rejected_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.docx");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        let err = read_package(&path, 1024).await.unwrap_err();
        assert!(matches!(
            err,
            ProcessingError::LimitExceeded {
                size: 2048,
                limit: 1024
            }
        ));
    }
}
