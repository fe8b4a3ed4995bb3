//! Remote batch lookup endpoint
//!
//! Request: `{"Lookup_ID": [...], "Hyperlinks_Checked": n, ...}`.
//! Response: an array of `{Document_ID, Content_ID, Title, Status}` objects,
//! either bare or wrapped as `{"Results": [...]}`.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::{LookupBackend, LookupRequest, LookupResult, LookupStatus};
use crate::error::ResolutionError;

pub const USER_AGENT: &str = "DocHub/1.0";

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    #[serde(rename = "Lookup_ID")]
    lookup_ids: &'a [String],
    #[serde(rename = "Hyperlinks_Checked", skip_serializing_if = "Option::is_none")]
    hyperlinks_checked: Option<usize>,
    #[serde(rename = "Total_Hyperlinks", skip_serializing_if = "Option::is_none")]
    total_hyperlinks: Option<usize>,
    #[serde(rename = "First_Name", skip_serializing_if = "Option::is_none")]
    first_name: Option<&'a str>,
    #[serde(rename = "Last_Name", skip_serializing_if = "Option::is_none")]
    last_name: Option<&'a str>,
    #[serde(rename = "Email", skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
}

impl<'a> WireRequest<'a> {
    fn from_request(request: &'a LookupRequest) -> Self {
        Self {
            lookup_ids: &request.ids,
            hyperlinks_checked: request.hyperlinks_checked,
            total_hyperlinks: request.total_hyperlinks,
            first_name: request.usage.first_name.as_deref(),
            last_name: request.usage.last_name.as_deref(),
            email: request.usage.email.as_deref(),
        }
    }
}

/// One entry of the wire response; every field is optional on the wire
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct WireResult {
    #[serde(rename = "Document_ID", default)]
    document_id: Option<String>,
    #[serde(rename = "Content_ID", default)]
    content_id: Option<String>,
    #[serde(rename = "Title", default)]
    title: Option<String>,
    #[serde(rename = "Status", default)]
    status: Option<String>,
}

impl WireResult {
    pub(crate) fn into_result(self) -> Option<LookupResult> {
        let trimmed = |value: Option<String>| value.map(|v| v.trim().to_string()).unwrap_or_default();
        let document_id = trimmed(self.document_id);
        let content_id = trimmed(self.content_id);
        if document_id.is_empty() && content_id.is_empty() {
            return None;
        }
        Some(LookupResult {
            document_id,
            content_id,
            title: trimmed(self.title),
            status: LookupStatus::parse(self.status.as_deref().unwrap_or_default()),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireResponse {
    Bare(Vec<WireResult>),
    Wrapped {
        #[serde(rename = "Results")]
        results: Vec<WireResult>,
    },
}

impl WireResponse {
    pub(crate) fn into_results(self) -> Vec<LookupResult> {
        let entries = match self {
            WireResponse::Bare(entries) => entries,
            WireResponse::Wrapped { results } => results,
        };
        entries
            .into_iter()
            .filter_map(WireResult::into_result)
            .collect()
    }
}

pub(crate) fn parse_response(body: &str) -> Result<Vec<LookupResult>, ResolutionError> {
    serde_json::from_str::<WireResponse>(body)
        .map(WireResponse::into_results)
        .map_err(|e| ResolutionError::Malformed(e.to_string()))
}

/// HTTP backend posting one batch request per resolution
pub struct RemoteLookup {
    client: Client,
    endpoint: String,
}

impl RemoteLookup {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ResolutionError> {
        let endpoint = endpoint.into().trim().to_string();
        if endpoint.is_empty() {
            return Err(ResolutionError::EndpointUnset);
        }
        // Deadlines are enforced by the caller through cancellation
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ResolutionError::Transport(e.to_string()))?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LookupBackend for RemoteLookup {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn lookup(&self, request: &LookupRequest) -> Result<Vec<LookupResult>, ResolutionError> {
        let started = Instant::now();
        let body = WireRequest::from_request(request);

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ResolutionError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ResolutionError::Transport(e.to_string()))?;

        if !status.is_success() {
            tracing::debug!(
                event = "lookup.remote.non_success_status",
                status = status.as_u16(),
                elapsed_ms = started.elapsed().as_millis(),
            );
            return Err(ResolutionError::Status {
                status: status.as_u16(),
                body: text.chars().take(512).collect(),
            });
        }

        let results = parse_response(&text)?;
        tracing::debug!(
            event = "lookup.remote.completed",
            requested = request.ids.len(),
            resolved = results.len(),
            elapsed_ms = started.elapsed().as_millis(),
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::UsageFields;

    #[test]
    fn request_omits_unset_usage_fields() {
        let request = LookupRequest {
            ids: vec!["TSRC-ABC-123456".into()],
            usage: UsageFields {
                email: Some("a@example.com".into()),
                ..UsageFields::default()
            },
            hyperlinks_checked: Some(3),
            total_hyperlinks: None,
        };
        let json = serde_json::to_value(WireRequest::from_request(&request)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "Lookup_ID": ["TSRC-ABC-123456"],
                "Hyperlinks_Checked": 3,
                "Email": "a@example.com"
            })
        );
    }

    #[test]
    fn accepts_bare_and_wrapped_responses() {
        let bare = r#"[{"Document_ID":" uuid-1 ","Content_ID":"TSRC-ABC-123456","Title":" Policy X ","Status":"Active"}]"#;
        let wrapped = r#"{"Results":[{"Document_ID":"uuid-1","Content_ID":"TSRC-ABC-123456","Title":"Policy X","Status":"active"}]}"#;
        let a = parse_response(bare).unwrap();
        let b = parse_response(wrapped).unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].document_id, "uuid-1");
        assert_eq!(a[0].title, "Policy X");
    }

    #[test]
    fn entries_without_ids_are_dropped() {
        let results = parse_response(r#"[{"Title":"orphan"},{"Content_ID":"CMS-A-000001"}]"#).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, LookupStatus::Active);
    }

    #[test]
    fn malformed_bodies_are_reported() {
        let err = parse_response("<html>").unwrap_err();
        assert!(matches!(err, ResolutionError::Malformed(_)));
    }

    #[test]
    fn blank_endpoint_is_unset() {
        assert!(matches!(
            RemoteLookup::new("   "),
            Err(ResolutionError::EndpointUnset)
        ));
    }
}
