//! Typed XML tree for package parts
//!
//! Every XML part of a package is parsed into an [`XmlDocument`]: an ordered list
//! of [`XmlNode`]s where elements always own a `Vec` of children (a single child
//! is never special-cased). Elements are classified into an [`ElementKind`] so
//! traversal code can match on WordprocessingML concepts instead of raw tag names.

mod order;
mod reader;
mod writer;

pub use order::{LVL_ORDER, PPR_ORDER, RPR_ORDER, STYLE_ORDER, TCPR_ORDER};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("malformed XML at byte {position}: {message}")]
    Malformed { position: u64, message: String },
    #[error("unbalanced XML: {0}")]
    Unbalanced(String),
    #[error("failed to write XML: {0}")]
    Write(String),
}

/// The `<?xml ...?>` declaration of a part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDeclaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

impl Default for XmlDeclaration {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            encoding: Some("UTF-8".to_string()),
            standalone: Some("yes".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlDocument {
    pub declaration: Option<XmlDeclaration>,
    pub nodes: Vec<XmlNode>,
}

impl XmlDocument {
    pub fn parse(bytes: &[u8]) -> Result<Self, XmlError> {
        reader::parse(bytes)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, XmlError> {
        writer::serialize(self)
    }

    pub fn with_root(root: XmlElement) -> Self {
        Self {
            declaration: Some(XmlDeclaration::default()),
            // Word writes the root on its own line
            nodes: vec![XmlNode::Text("\r\n".to_string()), XmlNode::Element(root)],
        }
    }

    /// First top-level element
    pub fn root(&self) -> Option<&XmlElement> {
        self.nodes.iter().find_map(XmlNode::as_element)
    }

    pub fn root_mut(&mut self) -> Option<&mut XmlElement> {
        self.nodes.iter_mut().find_map(XmlNode::as_element_mut)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
}

impl XmlNode {
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }
}

/// WordprocessingML element classification
///
/// Only elements in the `w:` namespace prefix (or unprefixed) are classified;
/// DrawingML elements such as `a:p` / `a:t` map to [`ElementKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Document,
    Body,
    Header,
    Footer,
    Paragraph,
    ParagraphProperties,
    Run,
    RunProperties,
    Text,
    DeletedText,
    Tab,
    Break,
    Hyperlink,
    Insertion,
    Deletion,
    MoveFrom,
    MoveTo,
    SmartTag,
    ContentControl,
    ContentControlContent,
    Table,
    TableRow,
    TableCell,
    TableCellProperties,
    Drawing,
    Picture,
    Object,
    SimpleField,
    FieldChar,
    FieldInstruction,
    BookmarkStart,
    BookmarkEnd,
    NumberingProperties,
    SectionProperties,
    Other,
}

impl ElementKind {
    pub fn classify(name: &str) -> Self {
        let (prefix, local) = split_name(name);
        if !matches!(prefix, None | Some("w")) {
            return ElementKind::Other;
        }
        match local {
            "document" => ElementKind::Document,
            "body" => ElementKind::Body,
            "hdr" => ElementKind::Header,
            "ftr" => ElementKind::Footer,
            "p" => ElementKind::Paragraph,
            "pPr" => ElementKind::ParagraphProperties,
            "r" => ElementKind::Run,
            "rPr" => ElementKind::RunProperties,
            "t" => ElementKind::Text,
            "delText" => ElementKind::DeletedText,
            "tab" => ElementKind::Tab,
            "br" | "cr" => ElementKind::Break,
            "hyperlink" => ElementKind::Hyperlink,
            "ins" => ElementKind::Insertion,
            "del" => ElementKind::Deletion,
            "moveFrom" => ElementKind::MoveFrom,
            "moveTo" => ElementKind::MoveTo,
            "smartTag" => ElementKind::SmartTag,
            "sdt" => ElementKind::ContentControl,
            "sdtContent" => ElementKind::ContentControlContent,
            "tbl" => ElementKind::Table,
            "tr" => ElementKind::TableRow,
            "tc" => ElementKind::TableCell,
            "tcPr" => ElementKind::TableCellProperties,
            "drawing" => ElementKind::Drawing,
            "pict" => ElementKind::Picture,
            "object" => ElementKind::Object,
            "fldSimple" => ElementKind::SimpleField,
            "fldChar" => ElementKind::FieldChar,
            "instrText" => ElementKind::FieldInstruction,
            "bookmarkStart" => ElementKind::BookmarkStart,
            "bookmarkEnd" => ElementKind::BookmarkEnd,
            "numPr" => ElementKind::NumberingProperties,
            "sectPr" => ElementKind::SectionProperties,
            _ => ElementKind::Other,
        }
    }

    /// Wrappers whose runs belong to the surrounding paragraph
    pub fn is_run_container(self) -> bool {
        matches!(
            self,
            ElementKind::Hyperlink
                | ElementKind::Insertion
                | ElementKind::MoveTo
                | ElementKind::SmartTag
                | ElementKind::ContentControl
                | ElementKind::ContentControlContent
                | ElementKind::SimpleField
        )
    }
}

/// Split `prefix:local` into its parts
pub fn split_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn kind(&self) -> ElementKind {
        ElementKind::classify(&self.name)
    }

    pub fn local_name(&self) -> &str {
        split_name(&self.name).1
    }

    pub fn prefix(&self) -> Option<&str> {
        split_name(&self.name).0
    }

    /// Qualified name for a sibling/child element sharing this element's prefix
    pub fn qualify(&self, local: &str) -> String {
        match self.prefix() {
            Some(prefix) => format!("{prefix}:{local}"),
            None => local.to_string(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Attribute lookup by local name, ignoring the prefix
    pub fn attr_local(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| split_name(key).1 == local)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(index).1)
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(XmlNode::as_element_mut)
    }

    /// First child element with the given local name
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|el| el.local_name() == local)
    }

    pub fn child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|el| el.local_name() == local)
    }

    pub fn has_child(&self, local: &str) -> bool {
        self.child(local).is_some()
    }

    /// Return the child with `local` name, creating it at the position dictated by
    /// `order` (the schema sequence of the parent) when missing.
    pub fn ensure_child(&mut self, local: &str, order: &[&str]) -> &mut XmlElement {
        let index = match self
            .children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(el) if el.local_name() == local))
        {
            Some(index) => index,
            None => {
                let name = self.qualify(local);
                let rank = order.iter().position(|candidate| *candidate == local);
                let insert_at = rank
                    .and_then(|rank| {
                        self.children.iter().position(|node| match node {
                            XmlNode::Element(el) => order
                                .iter()
                                .position(|candidate| *candidate == el.local_name())
                                .is_some_and(|other| other > rank),
                            _ => false,
                        })
                    })
                    .unwrap_or(self.children.len());
                self.children
                    .insert(insert_at, XmlNode::Element(XmlElement::new(name)));
                insert_at
            }
        };
        match &mut self.children[index] {
            XmlNode::Element(el) => el,
            _ => unreachable!("index always points at an element"),
        }
    }

    /// Insert a properties element (`w:pPr`, `w:rPr`, `w:tcPr`...) as the first child
    pub fn ensure_properties(&mut self, local: &str) -> &mut XmlElement {
        if !self.has_child(local) {
            let name = self.qualify(local);
            self.children.insert(0, XmlNode::Element(XmlElement::new(name)));
        }
        match self.child_mut(local) {
            Some(el) => el,
            None => unreachable!("properties element inserted above"),
        }
    }

    pub fn remove_children(&mut self, local: &str) -> usize {
        let before = self.children.len();
        self.children
            .retain(|node| !matches!(node, XmlNode::Element(el) if el.local_name() == local));
        before - self.children.len()
    }

    /// Concatenated direct text content
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(text) | XmlNode::CData(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace all direct text content
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children
            .retain(|node| !matches!(node, XmlNode::Text(_) | XmlNode::CData(_)));
        let text = text.into();
        if !text.is_empty() {
            self.children.push(XmlNode::Text(text));
        }
    }
}

/// Traversal control returned by visitor callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Continue,
    SkipChildren,
}

/// Pre-order depth-first traversal
pub fn walk<'a>(element: &'a XmlElement, visit: &mut impl FnMut(&'a XmlElement) -> Walk) {
    if visit(element) == Walk::SkipChildren {
        return;
    }
    for child in element.elements() {
        walk(child, visit);
    }
}

/// Pre-order depth-first traversal with mutable access
pub fn walk_mut(element: &mut XmlElement, visit: &mut impl FnMut(&mut XmlElement) -> Walk) {
    if visit(&mut *element) == Walk::SkipChildren {
        return;
    }
    for child in element.elements_mut() {
        walk_mut(child, visit);
    }
}

/// All descendants (excluding `element`) with the given kind, in document order
pub fn descendants_of_kind(element: &XmlElement, kind: ElementKind) -> Vec<&XmlElement> {
    let mut found = Vec::new();
    for child in element.elements() {
        walk(child, &mut |el| {
            if el.kind() == kind {
                found.push(el);
            }
            Walk::Continue
        });
    }
    found
}
