//! Shared fixtures: minimal Word packages assembled with `zip`, and
//! scriptable lookup backends.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use zip::write::SimpleFileOptions;

use dochub::error::ResolutionError;
use dochub::lookup::{LookupBackend, LookupRequest, LookupResult, LookupStatus};
use dochub::{LocalDictionary, LookupClient, RetryPolicy, WordDocument};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_HYPERLINK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
const REL_HEADER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const REL_NUMBERING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";

pub const POLICY_URL: &str = "https://thesource.example.com/docid=TSRC-ABC-123456";
pub const CANONICAL_URL: &str = "https://thesource.example.com/#!/view?docid=uuid-1";

/// A paragraph holding one hyperlink run
pub fn hyperlink_paragraph(rid: &str, text: &str) -> String {
    format!(r#"<w:p><w:hyperlink r:id="{rid}"><w:r><w:t>{text}</w:t></w:r></w:hyperlink></w:p>"#)
}

pub fn text_paragraph(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#)
}

#[derive(Debug, Clone, Default)]
pub struct DocxBuilder {
    body: String,
    links: Vec<(String, String)>,
    header: Option<(String, Vec<(String, String)>)>,
    styles: Option<String>,
    numbering: Option<String>,
}

impl DocxBuilder {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    /// External hyperlink relationship on the main document
    pub fn link(mut self, rid: &str, url: &str) -> Self {
        self.links.push((rid.to_string(), url.to_string()));
        self
    }

    /// `word/header1.xml` with its own hyperlink relationships
    pub fn header(mut self, content: impl Into<String>, links: &[(&str, &str)]) -> Self {
        let links = links
            .iter()
            .map(|(rid, url)| (rid.to_string(), url.to_string()))
            .collect();
        self.header = Some((content.into(), links));
        self
    }

    pub fn styles(mut self, styles: impl Into<String>) -> Self {
        self.styles = Some(styles.into());
        self
    }

    pub fn numbering(mut self, numbering: impl Into<String>) -> Self {
        self.numbering = Some(numbering.into());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut parts: Vec<(String, String)> = Vec::new();
        parts.push(("[Content_Types].xml".into(), self.content_types()));
        parts.push((
            "_rels/.rels".into(),
            rels_xml(&[(
                "rId1".into(),
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument"
                    .into(),
                "word/document.xml".into(),
                false,
            )]),
        ));
        parts.push((
            "word/document.xml".into(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{W_NS}" xmlns:r="{R_NS}"><w:body>{}<w:sectPr/></w:body></w:document>"#,
                self.body
            ),
        ));

        let mut main_rels: Vec<(String, String, String, bool)> = self
            .links
            .iter()
            .map(|(rid, url)| (rid.clone(), REL_HYPERLINK.into(), url.clone(), true))
            .collect();

        if let Some((content, links)) = &self.header {
            main_rels.push(("rIdHeader1".into(), REL_HEADER.into(), "header1.xml".into(), false));
            parts.push((
                "word/header1.xml".into(),
                format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:hdr xmlns:w="{W_NS}" xmlns:r="{R_NS}">{content}</w:hdr>"#),
            ));
            let header_rels: Vec<_> = links
                .iter()
                .map(|(rid, url)| (rid.clone(), REL_HYPERLINK.into(), url.clone(), true))
                .collect();
            parts.push(("word/_rels/header1.xml.rels".into(), rels_xml(&header_rels)));
        }
        if let Some(styles) = &self.styles {
            main_rels.push(("rIdStyles".into(), REL_STYLES.into(), "styles.xml".into(), false));
            parts.push((
                "word/styles.xml".into(),
                format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:styles xmlns:w="{W_NS}">{styles}</w:styles>"#),
            ));
        }
        if let Some(numbering) = &self.numbering {
            main_rels.push((
                "rIdNumbering".into(),
                REL_NUMBERING.into(),
                "numbering.xml".into(),
                false,
            ));
            parts.push((
                "word/numbering.xml".into(),
                format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:numbering xmlns:w="{W_NS}">{numbering}</w:numbering>"#),
            ));
        }
        parts.push(("word/_rels/document.xml.rels".into(), rels_xml(&main_rels)));

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, content) in parts {
            writer.start_file(name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }

    fn content_types(&self) -> String {
        let mut overrides = String::from(
            r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
        );
        if self.header.is_some() {
            overrides.push_str(r#"<Override PartName="/word/header1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"/>"#);
        }
        if self.styles.is_some() {
            overrides.push_str(r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#);
        }
        if self.numbering.is_some() {
            overrides.push_str(r#"<Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/>"#);
        }
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>{overrides}</Types>"#
        )
    }
}

fn rels_xml(rels: &[(String, String, String, bool)]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{REL_NS}">"#
    );
    for (id, rel_type, target, external) in rels {
        let mode = if *external { r#" TargetMode="External""# } else { "" };
        xml.push_str(&format!(
            r#"<Relationship Id="{id}" Type="{rel_type}" Target="{}"{mode}/>"#,
            escape(target)
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn escape(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// (url, display text) of every hyperlink in the package, in document order
pub fn links_of(bytes: &[u8]) -> Vec<(String, String)> {
    let doc = WordDocument::from_bytes(bytes).unwrap();
    dochub::hyperlink::extract_document(&doc)
        .hyperlinks
        .into_iter()
        .map(|link| (link.url, link.display_text))
        .collect()
}

pub fn part_text(bytes: &[u8], name: &str) -> String {
    let package = dochub::Package::from_bytes(bytes).unwrap();
    String::from_utf8(package.part(name).unwrap().to_vec()).unwrap()
}

pub fn policy_result(status: LookupStatus) -> LookupResult {
    LookupResult {
        document_id: "uuid-1".into(),
        content_id: "TSRC-ABC-123456".into(),
        title: "Policy X".into(),
        status,
    }
}

/// Counts calls and optionally stalls or fails before answering from a dictionary
pub struct CountingBackend {
    dictionary: LocalDictionary,
    pub calls: AtomicUsize,
    delay: Option<Duration>,
    fail_with: Option<ResolutionError>,
}

impl CountingBackend {
    pub fn new(entries: Vec<LookupResult>) -> Self {
        Self {
            dictionary: LocalDictionary::from_entries(entries),
            calls: AtomicUsize::new(0),
            delay: None,
            fail_with: None,
        }
    }

    pub fn stalling(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(Vec::new())
        }
    }

    pub fn failing(error: ResolutionError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LookupBackend for CountingBackend {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn lookup(&self, request: &LookupRequest) -> Result<Vec<LookupResult>, ResolutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.fail_with {
            return Err(error.clone());
        }
        self.dictionary.lookup(request).await
    }
}

pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        timeout: Duration::from_secs(5),
    }
}

pub fn client_for(backend: &Arc<CountingBackend>, policy: RetryPolicy) -> Arc<LookupClient> {
    Arc::new(LookupClient::new(backend.clone(), policy))
}
