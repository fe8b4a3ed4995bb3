//! Structural pre-flight checks for Word packages
//!
//! Diagnostics never modify a document. The processor records every issue as a
//! warning on the result; the `diagnose` command prints the full report.

use std::collections::BTreeSet;
use std::fmt::{self, Write as _};
use std::path::Path;

use serde::Serialize;

use crate::document::relationships::{RelationshipSet, TargetMode, rels_for_part, resolve_target};
use crate::package::io::DEFAULT_MAX_FILE_SIZE;
use crate::package::{CONTENT_TYPES_PART, MAIN_DOCUMENT_PART, Package, ROOT_RELS_PART};
use crate::xml::{Walk, XmlDocument, XmlElement, walk};

const OPTIONAL_PARTS: &[(&str, &str)] = &[
    (
        "word/styles.xml",
        "Style definitions missing; default styles will be used",
    ),
    (
        "word/numbering.xml",
        "Numbering definitions missing; lists may not render correctly",
    ),
    (
        "word/settings.xml",
        "Settings missing; document settings may be lost",
    ),
];

/// Revisions at or above this count are errors rather than warnings
const TRACKED_CHANGE_ERROR_THRESHOLD: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiagnosticStatus {
    Pass,
    Warn,
    Fail,
}

impl fmt::Display for DiagnosticStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticStatus::Pass => "PASS",
            DiagnosticStatus::Warn => "WARN",
            DiagnosticStatus::Fail => "FAIL",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub category: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        };
        write!(f, "[{severity}] {}: {}", self.category, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " ({location})")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrackedChanges {
    pub insertions: usize,
    pub deletions: usize,
    pub paragraph_changes: usize,
    pub run_changes: usize,
}

impl TrackedChanges {
    pub fn total(&self) -> usize {
        self.insertions + self.deletions + self.paragraph_changes + self.run_changes
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticStats {
    pub file_size: Option<u64>,
    pub parts: usize,
    pub tracked_changes: TrackedChanges,
    pub smart_tags: usize,
    pub content_controls: usize,
    pub field_codes: usize,
    pub equations: usize,
    pub hyperlinks: usize,
    pub relationships: usize,
    pub external_refs: usize,
    pub embedded_objects: usize,
    pub media_files: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub status: DiagnosticStatus,
    pub issues: Vec<Issue>,
    pub statistics: DiagnosticStats,
}

impl DiagnosticReport {
    pub fn count(&self, severity: Severity) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == severity)
            .count()
    }

    pub fn passed(&self) -> bool {
        self.status != DiagnosticStatus::Fail
    }

    /// Plain-text report for terminals
    pub fn render(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(60);
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "DOCX Diagnostic Report");
        if let Some(file) = &self.file {
            let _ = writeln!(out, "File: {file}");
        }
        if let Some(size) = self.statistics.file_size {
            let _ = writeln!(out, "Size: {:.2} MB", size as f64 / (1024.0 * 1024.0));
        }
        let _ = writeln!(out, "{rule}");

        let categories: BTreeSet<&str> = self.issues.iter().map(|issue| issue.category).collect();
        for category in categories {
            let _ = writeln!(out, "\n[{category}]");
            for issue in self.issues.iter().filter(|issue| issue.category == category) {
                let _ = writeln!(out, "{issue}");
                if let Some(suggestion) = &issue.suggestion {
                    let _ = writeln!(out, "  Suggestion: {suggestion}");
                }
            }
        }

        let _ = writeln!(out, "\n{rule}");
        let _ = writeln!(out, "Status: {}", self.status);
        let _ = writeln!(out, "Errors: {}", self.count(Severity::Error));
        let _ = writeln!(out, "Warnings: {}", self.count(Severity::Warning));
        let _ = writeln!(out, "Info: {}", self.count(Severity::Info));

        let stats = &self.statistics;
        let rows = [
            ("Tracked Changes", stats.tracked_changes.total()),
            ("Content Controls", stats.content_controls),
            ("Field Codes", stats.field_codes),
            ("Equations", stats.equations),
            ("Hyperlinks", stats.hyperlinks),
            ("Embedded Objects", stats.embedded_objects),
            ("Media Files", stats.media_files),
        ];
        if rows.iter().any(|(_, value)| *value > 0) {
            let _ = writeln!(out, "\nStatistics:");
            for (label, value) in rows.iter().filter(|(_, value)| *value > 0) {
                let _ = writeln!(out, "  {label}: {value}");
            }
        }
        let _ = writeln!(out, "{rule}");
        out
    }
}

#[derive(Default)]
struct Diagnostic {
    issues: Vec<Issue>,
    stats: DiagnosticStats,
}

impl Diagnostic {
    fn add(
        &mut self,
        severity: Severity,
        category: &'static str,
        message: impl Into<String>,
        location: Option<String>,
        suggestion: Option<&str>,
    ) {
        self.issues.push(Issue {
            severity,
            category,
            message: message.into(),
            location,
            suggestion: suggestion.map(str::to_string),
        });
    }

    fn finish(self, file: Option<String>) -> DiagnosticReport {
        let status = if self.issues.iter().any(|i| i.severity == Severity::Error) {
            DiagnosticStatus::Fail
        } else if self.issues.iter().any(|i| i.severity == Severity::Warning) {
            DiagnosticStatus::Warn
        } else {
            DiagnosticStatus::Pass
        };
        DiagnosticReport {
            file,
            status,
            issues: self.issues,
            statistics: self.stats,
        }
    }
}

/// Diagnose a file on disk
pub async fn diagnose_path(path: &Path) -> DiagnosticReport {
    let mut diag = Diagnostic::default();
    let file = Some(path.display().to_string());

    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) => {
            diag.add(
                Severity::Error,
                "File Access",
                format!("cannot read file: {err}"),
                None,
                None,
            );
            return diag.finish(file);
        }
    };
    let mut report = diagnose_bytes(&bytes);
    report.file = file;
    report
}

/// Diagnose an in-memory package
pub fn diagnose_bytes(bytes: &[u8]) -> DiagnosticReport {
    let mut diag = Diagnostic::default();
    diag.stats.file_size = Some(bytes.len() as u64);

    if bytes.is_empty() {
        diag.add(Severity::Error, "File Access", "File is empty (0 bytes)", None, None);
        return diag.finish(None);
    }
    if bytes.len() as u64 > DEFAULT_MAX_FILE_SIZE {
        diag.add(
            Severity::Warning,
            "File Size",
            format!(
                "File is very large ({:.2} MB), may cause performance issues",
                bytes.len() as f64 / (1024.0 * 1024.0)
            ),
            None,
            None,
        );
    }

    match Package::from_bytes(bytes) {
        Ok(package) => {
            let report = diagnose_package(&package);
            diag.issues.extend(report.issues);
            let file_size = diag.stats.file_size;
            diag.stats = report.statistics;
            diag.stats.file_size = file_size;
        }
        Err(err) => diag.add(
            Severity::Error,
            "ZIP Structure",
            format!("Invalid ZIP archive: {err}"),
            None,
            Some("File is not a valid DOCX. It may be corrupted or not a Word document."),
        ),
    }
    diag.finish(None)
}

pub fn diagnose_package(package: &Package) -> DiagnosticReport {
    let mut diag = Diagnostic::default();
    diag.stats.parts = package.len();

    for required in [CONTENT_TYPES_PART, ROOT_RELS_PART, MAIN_DOCUMENT_PART] {
        if !package.has_part(required) {
            diag.add(
                Severity::Error,
                "DOCX Structure",
                format!("Missing required part: {required}"),
                None,
                Some("Document structure is incomplete. It may be corrupted."),
            );
        }
    }
    for (part, message) in OPTIONAL_PARTS {
        if !package.has_part(part) {
            diag.add(
                Severity::Info,
                "DOCX Structure",
                *message,
                Some(part.to_string()),
                None,
            );
        }
    }

    if let Some(content) = package.part(MAIN_DOCUMENT_PART) {
        check_document_xml(&mut diag, content);
    }
    check_relationships(&mut diag, package);
    check_embedded(&mut diag, package);

    diag.finish(None)
}

fn is_invalid_xml_char(c: char) -> bool {
    matches!(
        c,
        '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}' | '\u{FFFE}' | '\u{FFFF}'
    )
}

fn check_document_xml(diag: &mut Diagnostic, content: &[u8]) {
    let text = match std::str::from_utf8(content) {
        Ok(text) => text,
        Err(err) => {
            diag.add(
                Severity::Error,
                "Encoding",
                format!("Invalid UTF-8 encoding in {MAIN_DOCUMENT_PART}"),
                Some(format!("Byte position: {}", err.valid_up_to())),
                Some("Document contains invalid byte sequences and may need manual repair."),
            );
            return;
        }
    };

    let invalid: Vec<(usize, char)> = text
        .chars()
        .enumerate()
        .filter(|(_, c)| is_invalid_xml_char(*c))
        .collect();
    if let Some((position, first)) = invalid.first() {
        diag.add(
            Severity::Error,
            "Invalid Characters",
            format!(
                "Found {} invalid XML character(s) in {MAIN_DOCUMENT_PART}",
                invalid.len()
            ),
            Some(format!("first U+{:04X} at character {position}", *first as u32)),
            Some("Remove control characters. These often come from copy/paste operations."),
        );
    }

    let xml = match XmlDocument::parse(content) {
        Ok(xml) => xml,
        Err(err) => {
            diag.add(
                Severity::Error,
                "XML Parsing",
                format!("Failed to parse {MAIN_DOCUMENT_PART}: {err}"),
                None,
                Some("Document XML is malformed. Check for invalid characters or corrupted content."),
            );
            return;
        }
    };
    if let Some(root) = xml.root() {
        check_elements(diag, root);
    }
}

#[derive(Default)]
struct ElementCounts {
    tracked: TrackedChanges,
    nested_revision: bool,
    smart_tags: usize,
    content_controls: usize,
    locked_controls: usize,
    field_chars: usize,
    field_types: BTreeSet<&'static str>,
    equations: usize,
    hyperlinks: usize,
    untargeted_hyperlinks: usize,
}

fn field_type(instruction: &str) -> Option<&'static str> {
    let upper = instruction.to_ascii_uppercase();
    [
        ("TOC", "Table of Contents"),
        ("REF", "Cross-reference"),
        ("HYPERLINK", "Hyperlink"),
        ("MERGEFIELD", "Mail Merge"),
        ("PAGE", "Page Number"),
        ("DATE", "Date/Time"),
        ("TIME", "Date/Time"),
    ]
    .into_iter()
    .find(|(keyword, _)| upper.contains(keyword))
    .map(|(_, label)| label)
}

fn count_elements(root: &XmlElement) -> ElementCounts {
    let mut counts = ElementCounts::default();
    walk(root, &mut |el| {
        match el.local_name() {
            "ins" => {
                counts.tracked.insertions += 1;
                if !counts.nested_revision {
                    walk(el, &mut |inner| {
                        if inner.local_name() == "del" {
                            counts.nested_revision = true;
                        }
                        Walk::Continue
                    });
                }
            }
            "del" => counts.tracked.deletions += 1,
            "pPrChange" => counts.tracked.paragraph_changes += 1,
            "rPrChange" => counts.tracked.run_changes += 1,
            "smartTag" => counts.smart_tags += 1,
            "sdt" => {
                counts.content_controls += 1;
                let locked = el
                    .child("sdtPr")
                    .and_then(|pr| pr.child("lock"))
                    .and_then(|lock| lock.attr_local("val"))
                    .is_some_and(|val| {
                        matches!(val, "sdtLocked" | "contentLocked" | "sdtContentLocked")
                    });
                if locked {
                    counts.locked_controls += 1;
                }
            }
            "fldChar" => counts.field_chars += 1,
            "instrText" => {
                if let Some(label) = field_type(&el.text()) {
                    counts.field_types.insert(label);
                }
            }
            "oMath" | "oMathPara" => counts.equations += 1,
            "hyperlink" => {
                counts.hyperlinks += 1;
                let has_target =
                    el.attr("r:id").is_some() || el.attr_local("anchor").is_some();
                if !has_target {
                    counts.untargeted_hyperlinks += 1;
                }
            }
            _ => {}
        }
        Walk::Continue
    });
    counts
}

fn check_elements(diag: &mut Diagnostic, root: &XmlElement) {
    let counts = count_elements(root);
    let stats = &mut diag.stats;
    stats.tracked_changes = counts.tracked;
    stats.smart_tags = counts.smart_tags;
    stats.content_controls = counts.content_controls;
    stats.field_codes = counts.field_chars;
    stats.equations = counts.equations;
    stats.hyperlinks = counts.hyperlinks;

    let tracked = counts.tracked;
    if tracked.total() > 0 {
        let severity = if tracked.total() < TRACKED_CHANGE_ERROR_THRESHOLD {
            Severity::Warning
        } else {
            Severity::Error
        };
        diag.add(
            severity,
            "Tracked Changes",
            format!("Document contains {} tracked change(s)", tracked.total()),
            Some(format!(
                "Insertions: {}, Deletions: {}, Paragraph changes: {}, Run changes: {}",
                tracked.insertions, tracked.deletions, tracked.paragraph_changes, tracked.run_changes
            )),
            Some("Accept or reject all tracked changes before processing."),
        );
        if counts.nested_revision {
            diag.add(
                Severity::Warning,
                "Nested Revisions",
                "Found deletions nested inside insertions",
                None,
                Some("Accept all changes in Word first."),
            );
        }
    }

    if counts.smart_tags > 0 {
        diag.add(
            Severity::Warning,
            "Smart Tags",
            format!("Document contains {} deprecated smart tag(s)", counts.smart_tags),
            None,
            Some("Open in Word and save to remove them."),
        );
    }

    if counts.locked_controls > 0 {
        diag.add(
            Severity::Warning,
            "Content Controls",
            format!(
                "Document contains {} locked content control(s)",
                counts.locked_controls
            ),
            None,
            Some("Locked content controls may prevent editing."),
        );
    } else if counts.content_controls > 0 {
        diag.add(
            Severity::Info,
            "Content Controls",
            format!("Document contains {} content control(s)", counts.content_controls),
            None,
            None,
        );
    }

    if counts.field_chars > 0 || !counts.field_types.is_empty() {
        let types = if counts.field_types.is_empty() {
            "Unknown".to_string()
        } else {
            counts.field_types.iter().copied().collect::<Vec<_>>().join(", ")
        };
        diag.add(
            Severity::Info,
            "Field Codes",
            format!("Document contains {} field code(s)", counts.field_chars),
            Some(format!("Types found: {types}")),
            Some("Field codes may need to be updated or unlinked before processing."),
        );
    }

    if counts.equations > 0 {
        diag.add(
            Severity::Info,
            "Equations",
            format!("Document contains {} equation(s)", counts.equations),
            None,
            None,
        );
    }

    if counts.untargeted_hyperlinks > 0 {
        diag.add(
            Severity::Warning,
            "Hyperlinks",
            format!(
                "Found {} hyperlink(s) without target reference",
                counts.untargeted_hyperlinks
            ),
            None,
            Some("Some hyperlinks may be broken. Check document relationships."),
        );
    } else if counts.hyperlinks > 0 {
        diag.add(
            Severity::Info,
            "Hyperlinks",
            format!("Document contains {} hyperlink(s)", counts.hyperlinks),
            None,
            None,
        );
    }
}

fn check_relationships(diag: &mut Diagnostic, package: &Package) {
    let rels_path = rels_for_part(MAIN_DOCUMENT_PART);
    let Some(bytes) = package.part(&rels_path) else {
        diag.add(
            Severity::Warning,
            "Relationships",
            "Document relationships part not found",
            Some(rels_path),
            None,
        );
        return;
    };
    let rels = match RelationshipSet::parse(rels_path.as_str(), bytes) {
        Ok(rels) => rels,
        Err(err) => {
            diag.add(
                Severity::Error,
                "Relationships",
                format!("Failed to parse relationships: {err}"),
                Some(rels_path),
                None,
            );
            return;
        }
    };
    diag.stats.relationships = rels.len();

    let mut broken_types = BTreeSet::new();
    let mut broken = 0;
    let mut external = 0;
    for rel in rels.iter() {
        if rel.target_mode == TargetMode::External || rel.target.starts_with("http") {
            external += 1;
            continue;
        }
        let target = resolve_target(MAIN_DOCUMENT_PART, &rel.target);
        if !target.is_empty() && !package.has_part(&target) {
            broken += 1;
            broken_types.insert(rel.short_type().to_string());
        }
    }
    diag.stats.external_refs = external;

    if broken > 0 {
        diag.add(
            Severity::Warning,
            "Broken References",
            format!("Found {broken} broken internal reference(s)"),
            Some(format!(
                "Types: {}",
                broken_types.into_iter().collect::<Vec<_>>().join(", ")
            )),
            Some("Some referenced parts are missing. The document may have been edited externally."),
        );
    }
    if external > 0 {
        diag.add(
            Severity::Info,
            "External References",
            format!("Document contains {external} external reference(s) (URLs)"),
            None,
            None,
        );
    }
}

fn check_embedded(diag: &mut Diagnostic, package: &Package) {
    let embeddings: Vec<&str> = package
        .part_names()
        .filter(|name| name.starts_with("word/embeddings/"))
        .collect();
    diag.stats.embedded_objects = embeddings.len();
    if !embeddings.is_empty() {
        let ole = embeddings.iter().filter(|name| name.ends_with(".bin")).count();
        diag.add(
            Severity::Warning,
            "Embedded Objects",
            format!("Document contains {} embedded object(s)", embeddings.len()),
            Some(format!("OLE objects: {ole}, Other: {}", embeddings.len() - ole)),
            Some("Embedded OLE objects may cause processing issues."),
        );
    }

    let media = package
        .part_names()
        .filter(|name| name.starts_with("word/media/"))
        .count();
    diag.stats.media_files = media;
    if media > 0 {
        diag.add(
            Severity::Info,
            "Media Files",
            format!("Document contains {media} media file(s)"),
            None,
            None,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/missing.png"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/></Relationships>"#;

    fn package(document: &str) -> Package {
        let mut package = Package::new();
        package.set_part(CONTENT_TYPES_PART, b"<Types/>".to_vec());
        package.set_part(ROOT_RELS_PART, b"<Relationships/>".to_vec());
        package.set_part(MAIN_DOCUMENT_PART, document.as_bytes().to_vec());
        package.set_part("word/_rels/document.xml.rels", RELS.as_bytes().to_vec());
        package.set_part("word/styles.xml", b"<w:styles xmlns:w=\"urn:w\"/>".to_vec());
        package
    }

    #[test]
    fn reports_structure_and_content_findings() {
        let document = r#"<w:document xmlns:w="urn:w" xmlns:r="urn:r"><w:body><w:p><w:ins w:id="1"><w:r><w:t>new</w:t></w:r></w:ins><w:hyperlink><w:r><w:t>dangling</w:t></w:r></w:hyperlink><w:hyperlink r:id="rId3"/><w:r><w:instrText> PAGE </w:instrText></w:r></w:p></w:body></w:document>"#;
        let report = diagnose_package(&package(document));

        assert_eq!(report.status, DiagnosticStatus::Warn);
        assert_eq!(report.statistics.tracked_changes.insertions, 1);
        assert_eq!(report.statistics.hyperlinks, 2);
        assert_eq!(report.statistics.external_refs, 1);

        let categories: Vec<_> = report.issues.iter().map(|issue| issue.category).collect();
        assert!(categories.contains(&"Tracked Changes"));
        assert!(categories.contains(&"Hyperlinks"));
        assert!(categories.contains(&"Broken References"));
        assert!(categories.contains(&"Field Codes"));
        // numbering.xml and settings.xml are absent
        assert_eq!(
            report
                .issues
                .iter()
                .filter(|issue| issue.category == "DOCX Structure")
                .count(),
            2
        );
    }

    #[test]
    fn control_characters_and_missing_parts_fail() {
        let mut package = Package::new();
        package.set_part(
            MAIN_DOCUMENT_PART,
            "<w:document xmlns:w=\"urn:w\"><w:body><w:p><w:r><w:t>a\u{1}b</w:t></w:r></w:p></w:body></w:document>"
                .as_bytes()
                .to_vec(),
        );
        let report = diagnose_package(&package);
        assert_eq!(report.status, DiagnosticStatus::Fail);
        assert!(!report.passed());
        assert!(
            report
                .issues
                .iter()
                .any(|issue| issue.category == "Invalid Characters")
        );
        assert!(report.render().contains("Status: FAIL"));
    }

    #[test]
    fn garbage_bytes_are_not_a_package() {
        let report = diagnose_bytes(b"definitely not a zip");
        assert_eq!(report.status, DiagnosticStatus::Fail);
        assert_eq!(report.issues[0].category, "ZIP Structure");
    }
}
