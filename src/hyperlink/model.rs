use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkType {
    External,
    Internal,
    Bookmark,
    Email,
    File,
}

impl LinkType {
    /// Classification from the shape of the URL alone
    pub fn classify(url: &str) -> Self {
        let url = url.trim();
        let lower = url.to_ascii_lowercase();
        if url.starts_with('#') {
            LinkType::Bookmark
        } else if lower.starts_with("mailto:") {
            LinkType::Email
        } else if lower.starts_with("file://") {
            LinkType::File
        } else if lower.starts_with("http://") || lower.starts_with("https://") {
            LinkType::External
        } else {
            LinkType::Internal
        }
    }
}

/// A `w:hyperlink` joined with its relationship
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hyperlink {
    /// `{part}#{ordinal}`, unique within a document
    pub id: String,
    pub relationship_id: Option<String>,
    pub anchor: Option<String>,
    /// Owning content part, e.g. `word/header1.xml`
    pub part: String,
    /// Position among the part's `w:hyperlink` elements in document order
    pub ordinal: usize,
    pub url: String,
    pub display_text: String,
    pub link_type: LinkType,
    pub is_internal: bool,
    pub is_valid: bool,
}

impl Hyperlink {
    pub fn is_external(&self) -> bool {
        self.link_type == LinkType::External
    }

    #[cfg(test)]
    pub(crate) fn for_test(url: &str, link_type: LinkType) -> Self {
        Self {
            id: "word/document.xml#0".into(),
            relationship_id: Some("rId1".into()),
            anchor: None,
            part: "word/document.xml".into(),
            ordinal: 0,
            url: url.into(),
            display_text: String::new(),
            link_type,
            is_internal: matches!(link_type, LinkType::Internal | LinkType::Bookmark),
            is_valid: true,
        }
    }
}
