//! Zip package container
//!
//! A [`Package`] owns every part of a `.docx` archive as raw bytes, in original
//! entry order. Parts that are never parsed and rewritten are saved byte-for-byte.

pub(crate) mod io;

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use crate::error::PersistenceError;

pub use io::{DEFAULT_MAX_FILE_SIZE, check_file_size, read_package, validate_docx_path, write_package};

pub const MAIN_DOCUMENT_PART: &str = "word/document.xml";
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const ROOT_RELS_PART: &str = "_rels/.rels";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    parts: BTreeMap<String, Vec<u8>>,
    order: Vec<String>,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PersistenceError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let mut package = Package::new();

        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            if !file.is_file() {
                continue;
            }
            let name = file.name().to_string();
            let mut buf = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut buf).map_err(|e| {
                PersistenceError::Archive(format!("failed to inflate {name}: {e}"))
            })?;
            package.set_part(name, buf);
        }

        Ok(package)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PersistenceError> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        for name in &self.order {
            let Some(bytes) = self.parts.get(name) else {
                continue;
            };
            zip.start_file(name.as_str(), options)?;
            zip.write_all(bytes).map_err(|e| {
                PersistenceError::Archive(format!("failed to deflate {name}: {e}"))
            })?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    /// Part lookup tolerating a leading `/` (relationship targets are often absolute)
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        let name = name.strip_prefix('/').unwrap_or(name);
        self.parts.get(name).map(Vec::as_slice)
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    pub fn set_part(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        let name = name.into();
        if !self.parts.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.parts.insert(name, bytes);
    }

    /// Part names in archive order
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_keeps_order_and_bytes() {
        let mut package = Package::new();
        package.set_part(CONTENT_TYPES_PART, b"<Types/>".to_vec());
        package.set_part(MAIN_DOCUMENT_PART, b"<w:document/>".to_vec());
        package.set_part("word/media/image1.png", vec![0, 159, 146, 150]);

        let bytes = package.to_bytes().unwrap();
        let reloaded = Package::from_bytes(&bytes).unwrap();

        assert_eq!(reloaded, package);
        assert_eq!(
            reloaded.part_names().collect::<Vec<_>>(),
            vec![CONTENT_TYPES_PART, MAIN_DOCUMENT_PART, "word/media/image1.png"]
        );
    }

    #[test]
    fn part_lookup_accepts_absolute_names() {
        let mut package = Package::new();
        package.set_part("word/styles.xml", b"<w:styles/>".to_vec());
        assert!(package.has_part("/word/styles.xml"));
        assert!(!package.has_part("word/numbering.xml"));
    }

    #[test]
    fn replacing_a_part_keeps_its_position() {
        let mut package = Package::new();
        package.set_part("a.xml", b"1".to_vec());
        package.set_part("b.xml", b"2".to_vec());
        package.set_part("a.xml", b"3".to_vec());
        assert_eq!(package.part_names().collect::<Vec<_>>(), vec!["a.xml", "b.xml"]);
        assert_eq!(package.part("a.xml"), Some(&b"3"[..]));
    }

    #[test]
    fn rejects_non_zip_input() {
        assert!(Package::from_bytes(b"definitely not a zip").is_err());
    }
}
