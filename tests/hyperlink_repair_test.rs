mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use common::*;
use dochub::lookup::LookupStatus;
use dochub::{DocumentProcessor, ProcessingOptions, RetryPolicy};

fn processor_with(backend: &Arc<CountingBackend>, policy: RetryPolicy) -> DocumentProcessor {
    DocumentProcessor::new(ProcessingOptions::default()).with_lookup(client_for(backend, policy))
}

fn policy_document() -> Vec<u8> {
    DocxBuilder::new(hyperlink_paragraph("rId5", "Policy X"))
        .link("rId5", POLICY_URL)
        .build()
}

#[tokio::test]
async fn active_content_gets_canonical_url_and_suffix() {
    let backend = Arc::new(CountingBackend::new(vec![policy_result(LookupStatus::Active)]));
    let processor = processor_with(&backend, fast_policy());

    let (result, output) = processor.process_bytes(&policy_document()).await;

    assert!(result.success, "{:?}", result.error_messages);
    assert_eq!(result.total_hyperlinks, 1);
    assert_eq!(result.processed_hyperlinks, 1);
    assert_eq!(result.modified_hyperlinks, 1);
    assert_eq!(
        links_of(&output),
        vec![(CANONICAL_URL.to_string(), "Policy X (123456)".to_string())]
    );
    assert_eq!(result.processed_links.len(), 1);
    assert_eq!(result.processed_links[0].original_url, POLICY_URL);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn expired_content_is_marked() {
    let backend = Arc::new(CountingBackend::new(vec![policy_result(LookupStatus::Expired)]));
    let processor = processor_with(&backend, fast_policy());

    let (result, output) = processor.process_bytes(&policy_document()).await;

    assert!(result.success);
    assert_eq!(
        links_of(&output),
        vec![(
            CANONICAL_URL.to_string(),
            "Policy X (123456) - Expired".to_string()
        )]
    );
}

#[tokio::test]
async fn unresolved_identifiers_are_marked_not_found() {
    let backend = Arc::new(CountingBackend::new(Vec::new()));
    let processor = processor_with(&backend, fast_policy());

    let (result, output) = processor.process_bytes(&policy_document()).await;

    assert!(result.success);
    assert_eq!(
        links_of(&output),
        vec![(POLICY_URL.to_string(), "Policy X - Not Found".to_string())]
    );
    assert_eq!(result.processed_links[0].status, LookupStatus::NotFound);
}

#[tokio::test]
async fn repair_is_idempotent() {
    let backend = Arc::new(CountingBackend::new(vec![policy_result(LookupStatus::Expired)]));
    let processor = processor_with(&backend, fast_policy());

    let (_, first) = processor.process_bytes(&policy_document()).await;
    let (second_result, second) = processor.process_bytes(&first).await;

    assert!(second_result.success);
    assert_eq!(second_result.modified_hyperlinks, 0);
    assert!(second_result.changes.is_empty());
    assert_eq!(second, first);
    assert_eq!(links_of(&second), links_of(&first));
}

#[tokio::test]
async fn links_without_identifiers_never_reach_the_backend() {
    let body = [
        hyperlink_paragraph("rId1", "Vendor site"),
        hyperlink_paragraph("rId2", "Mail us"),
    ]
    .concat();
    let input = DocxBuilder::new(body)
        .link("rId1", "https://vendor.example.org/products")
        .link("rId2", "mailto:help@example.org")
        .build();
    let backend = Arc::new(CountingBackend::new(vec![policy_result(LookupStatus::Active)]));
    let processor = processor_with(&backend, fast_policy());

    let (result, output) = processor.process_bytes(&input).await;

    assert!(result.success);
    assert_eq!(backend.calls(), 0);
    assert_eq!(result.total_hyperlinks, 2);
    assert_eq!(result.modified_hyperlinks, 0);
    assert_eq!(output, input);
}

#[tokio::test]
async fn timeout_fails_the_document_without_retrying() {
    let backend = Arc::new(CountingBackend::stalling(Duration::from_millis(500)));
    let policy = RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        timeout: Duration::from_millis(20),
    };
    let processor = processor_with(&backend, policy);
    let input = policy_document();

    let (result, output) = processor.process_bytes(&input).await;

    assert!(!result.success);
    assert_eq!(backend.calls(), 1);
    assert!(
        result.error_messages[0].contains("timeout after 20ms"),
        "{:?}",
        result.error_messages
    );
    assert_eq!(output, input);
}

#[tokio::test]
async fn header_hyperlinks_are_repaired_in_their_own_part() {
    let input = DocxBuilder::new(text_paragraph("Body without links"))
        .header(hyperlink_paragraph("rId1", "Policy X"), &[("rId1", POLICY_URL)])
        .build();
    let backend = Arc::new(CountingBackend::new(vec![policy_result(LookupStatus::Active)]));
    let processor = processor_with(&backend, fast_policy());

    let (result, output) = processor.process_bytes(&input).await;

    assert!(result.success, "{:?}", result.error_messages);
    assert_eq!(result.modified_hyperlinks, 1);
    assert_eq!(
        links_of(&output),
        vec![(CANONICAL_URL.to_string(), "Policy X (123456)".to_string())]
    );
    assert!(part_text(&output, "word/_rels/header1.xml.rels").contains("docid=uuid-1"));
    assert!(!part_text(&output, "word/_rels/document.xml.rels").contains("uuid-1"));
}

#[tokio::test]
async fn cached_results_serve_later_documents() {
    let backend = Arc::new(CountingBackend::new(vec![policy_result(LookupStatus::Active)]));
    let processor = processor_with(&backend, fast_policy());

    processor.process_bytes(&policy_document()).await;
    let (result, _) = processor.process_bytes(&policy_document()).await;

    assert!(result.success);
    assert_eq!(result.modified_hyperlinks, 1);
    assert_eq!(backend.calls(), 1);
}
