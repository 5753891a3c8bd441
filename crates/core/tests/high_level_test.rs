//! Whole-document extraction.

mod common;

use common::{HI_FONT, PdfBuilder};
use pdfgraph_core::error::PdfError;
use pdfgraph_core::{OpenOptions, Record, extract_pages, extract_pages_parallel};

/// Three pages sharing a font; the second one carries a bad operator.
fn three_pages() -> Vec<u8> {
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(
            2,
            "<< /Type /Pages /Kids [3 0 R 4 0 R 5 0 R] /Count 3 /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 9 0 R >> >> >>",
        )
        .object(3, "<< /Type /Page /Parent 2 0 R /Contents 6 0 R >>")
        .object(4, "<< /Type /Page /Parent 2 0 R /Contents 7 0 R >>")
        .object(5, "<< /Type /Page /Parent 2 0 R /Rotate 180 /Contents 8 0 R >>")
        .stream(6, "", b"BT /F1 12 Tf 72 720 Td (Hi) Tj ET")
        .stream(7, "", b"0 0 m 10 0 l S bogus 1 1 m 2 2 l S")
        .stream(8, "", b"10 10 100 50 re f BT /F1 9 Tf (H) Tj ET")
        .object(9, HI_FONT);
    b.build("/Root 1 0 R")
}

#[test]
fn failing_page_does_not_stop_the_rest() {
    let pages = extract_pages(three_pages(), &OpenOptions::default()).unwrap();
    assert_eq!(pages.len(), 3);
    assert!(pages[0].is_ok() && pages[2].is_ok());
    assert_eq!(pages[0].records.len(), 2);

    let failed = &pages[1];
    assert!(failed.error.as_deref().is_some_and(|e| e.contains("bogus")));
    // what was drawn before the failure is kept
    assert_eq!(failed.records.len(), 1);
    assert!(matches!(failed.records[0], Record::Line { .. }));

    assert_eq!(pages[2].rotate, 180);
    assert_eq!(pages[2].bbox, (0.0, 0.0, 612.0, 792.0));
    assert_eq!(pages.iter().map(|p| p.index).collect::<Vec<_>>(), [0, 1, 2]);
}

#[test]
fn parallel_matches_sequential() {
    let options = OpenOptions::default();
    let sequential = extract_pages(three_pages(), &options).unwrap();
    let parallel = extract_pages_parallel(three_pages(), &options).unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn page_records_serialize_as_json() {
    let pages = extract_pages(three_pages(), &OpenOptions::default()).unwrap();
    let json = serde_json::to_string(&pages[0]).unwrap();
    assert!(json.contains(r#""box":[0.0,0.0,612.0,792.0]"#), "{json}");
    assert!(json.contains(r#""type":"glyph""#));
    assert!(json.contains(r#""text":"H""#));
    assert!(!json.contains("error"));

    let failed = serde_json::to_value(&pages[1]).unwrap();
    assert!(failed["error"].as_str().is_some());
}

#[test]
fn budget_applies_per_page() {
    let options = OpenOptions::default().with_max_operators(8);
    let pages = extract_pages(three_pages(), &options).unwrap();
    // the first page has 5 operators and stays under the limit
    assert!(pages[0].is_ok());
    assert!(pages[2].is_ok());

    let options = OpenOptions::default().with_max_operators(3);
    let pages = extract_pages(three_pages(), &options).unwrap();
    let expected = PdfError::BudgetExceeded(3).to_string();
    assert_eq!(pages[0].error.as_deref(), Some(expected.as_str()));
}

#[test]
fn unreadable_input_is_an_error() {
    let err = extract_pages(b"not a pdf at all".to_vec(), &OpenOptions::default()).unwrap_err();
    assert!(matches!(err, PdfError::NoValidXRef | PdfError::SyntaxError(_)), "got {err:?}");
}
