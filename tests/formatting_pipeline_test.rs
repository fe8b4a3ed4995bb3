mod common;

use pretty_assertions::assert_eq;

use common::*;
use dochub::format::ReplacementRule;
use dochub::{DocumentProcessor, Operation, OperationAction, ProcessingOptions};

fn formatting_only(operations: Vec<Operation>) -> DocumentProcessor {
    DocumentProcessor::new(ProcessingOptions::default().with_operations(operations))
}

#[tokio::test]
async fn formatting_operations_run_without_a_lookup_backend() {
    let body = [
        text_paragraph("Acme  Corp  policy"),
        "<w:p/>".to_string(),
        "<w:p><w:r><w:t xml:space=\"preserve\">   </w:t></w:r></w:p>".to_string(),
        "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>Header</w:t></w:r></w:p></w:tc></w:tr>\
         <w:tr><w:tc><w:p><w:r><w:t>Cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"
            .to_string(),
        text_paragraph("Closing"),
    ]
    .concat();
    let input = DocxBuilder::new(body).build();

    let processor = formatting_only(vec![
        Operation::new(OperationAction::BlankParagraphs),
        Operation::new(OperationAction::Tables),
        Operation::new(OperationAction::ReplaceText(ReplacementRule::new(
            "Acme",
            "Globex",
        ))),
    ]);
    let (result, output) = processor.process_bytes(&input).await;

    assert!(result.success, "{:?}", result.error_messages);
    assert_ne!(output, input);

    let xml = part_text(&output, "word/document.xml");
    assert!(xml.contains("Globex"));
    assert!(!xml.contains("Acme"));
    assert!(xml.contains("D9D9D9"));
    assert_eq!(xml.matches("<w:p>").count() + xml.matches("<w:p/>").count(), 4);

    let descriptions: Vec<_> = result.changes.iter().map(|c| c.description.as_str()).collect();
    assert!(descriptions.iter().any(|d| d.to_lowercase().contains("blank")));
}

#[tokio::test]
async fn invalid_pattern_is_recorded_but_later_operations_still_run() {
    let input = DocxBuilder::new(
        "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>Header</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
    )
    .build();
    let processor = formatting_only(vec![
        Operation::new(OperationAction::ReplaceText(ReplacementRule::new("(", "x"))),
        Operation::new(OperationAction::Tables),
    ]);

    let (result, output) = processor.process_bytes(&input).await;

    assert!(result.success);
    assert_eq!(result.error_count, 1);
    assert!(result.error_messages[0].contains("replace_text"));
    assert!(part_text(&output, "word/document.xml").contains("D9D9D9"));
}

#[tokio::test]
async fn critical_formatting_failure_aborts_the_document() {
    let input = DocxBuilder::new(text_paragraph("unchanged")).build();
    let processor = formatting_only(vec![
        Operation::new(OperationAction::Tables),
        Operation::new(OperationAction::ReplaceText(ReplacementRule::new("", "x"))).critical(true),
    ]);

    let (result, output) = processor.process_bytes(&input).await;

    assert!(!result.success);
    assert!(result.error_messages[0].contains("replacement pattern is empty"));
    assert_eq!(output, input);
}
