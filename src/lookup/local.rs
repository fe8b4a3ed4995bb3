//! Local dictionary backend
//!
//! A JSON file in the same shape as the remote response, either a bare array
//! or `{"Results": [...]}`. Used offline and in tests.

use std::path::Path;

use async_trait::async_trait;

use super::remote::parse_response;
use super::{LookupBackend, LookupRequest, LookupResult};
use crate::error::ResolutionError;

#[derive(Debug, Clone, Default)]
pub struct LocalDictionary {
    entries: Vec<LookupResult>,
}

impl LocalDictionary {
    pub fn from_entries(entries: Vec<LookupResult>) -> Self {
        Self { entries }
    }

    pub fn from_json(json: &str) -> Result<Self, ResolutionError> {
        let entries = parse_response(json)
            .map_err(|e| ResolutionError::Dictionary(e.to_string()))?;
        Ok(Self { entries })
    }

    pub async fn load(path: &Path) -> Result<Self, ResolutionError> {
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            ResolutionError::Dictionary(format!("{}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl LookupBackend for LocalDictionary {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn lookup(&self, request: &LookupRequest) -> Result<Vec<LookupResult>, ResolutionError> {
        let mut found: Vec<LookupResult> = Vec::new();
        for id in &request.ids {
            if let Some(entry) = self.entries.iter().find(|entry| entry.matches(id)) {
                if !found.contains(entry) {
                    found.push(entry.clone());
                }
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::LookupStatus;

    const DICTIONARY: &str = r#"{"Results":[
        {"Document_ID":"uuid-1","Content_ID":"TSRC-ABC-123456","Title":"Policy X","Status":"Active"},
        {"Document_ID":"uuid-2","Content_ID":"CMS-DEF-654321","Title":"Old Form","Status":"Expired"}
    ]}"#;

    #[tokio::test]
    async fn resolves_by_either_identifier_without_duplicates() {
        let dictionary = LocalDictionary::from_json(DICTIONARY).unwrap();
        let request = LookupRequest {
            ids: vec![
                "tsrc-abc-123456".into(),
                "uuid-1".into(),
                "uuid-2".into(),
                "missing".into(),
            ],
            ..LookupRequest::default()
        };
        let results = dictionary.lookup(&request).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].status, LookupStatus::Expired);
    }

    #[tokio::test]
    async fn missing_file_is_a_dictionary_error() {
        let err = LocalDictionary::load(Path::new("/nonexistent/dictionary.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolutionError::Dictionary(_)));
    }
}
