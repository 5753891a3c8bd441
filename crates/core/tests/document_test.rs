//! Document loading: xref chains, object resolution and the page tree.

mod common;

use common::{PdfBuilder, object_stream_body, startxref_of};
use pdfgraph_core::error::PdfError;
use pdfgraph_core::model::objects::DictExt;
use pdfgraph_core::{OpenOptions, PDFDocument, PDFObjRef, PDFObject};
use std::sync::Arc;

fn base_revision() -> Vec<u8> {
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(2, "<< /Type /Pages /Kids [] /Count 0 >>")
        .object(3, "(first revision)");
    b.build("/Root 1 0 R")
}

#[test]
fn newest_xref_section_wins() {
    let base = base_revision();
    let prev = startxref_of(&base);
    let mut update = PdfBuilder::update(base);
    update.object(3, "(second revision)");
    let data = update.build(&format!("/Root 1 0 R /Prev {prev}"));

    let doc = PDFDocument::open(data, "").unwrap();
    assert_eq!(doc.xrefs().len(), 2);
    assert_eq!(doc.getobj(3).unwrap().as_string().unwrap(), b"second revision");
    // objects only the older section lists are still reachable
    assert!(doc.getobj(2).unwrap().as_dict().unwrap().is_name("Type", "Pages"));
}

#[test]
fn cached_objects_are_shared() {
    let doc = PDFDocument::open(base_revision(), "").unwrap();
    let a = doc.getobj(1).unwrap();
    let b = doc.getobj(1).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn reference_cycles_fail_instead_of_looping() {
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(2, "<< /Type /Pages /Kids [] /Count 0 >>")
        .object(5, "6 0 R")
        .object(6, "5 0 R");
    let doc = PDFDocument::open(b.build("/Root 1 0 R"), "").unwrap();
    let err = doc.resolve(&PDFObject::Ref(PDFObjRef::new(5, 0))).unwrap_err();
    assert!(matches!(err, PdfError::CircularReference(_)), "got {err:?}");
}

#[test]
fn unknown_object_is_not_found() {
    let doc = PDFDocument::open(base_revision(), "").unwrap();
    assert!(matches!(doc.getobj(42), Err(PdfError::ObjectNotFound(42))));
    assert!(matches!(doc.getobj(0), Err(PdfError::ObjectNotFound(0))));
}

#[test]
fn xref_stream_with_object_stream() {
    let (first, body) = object_stream_body(&[(10, "<< /Kind /Packed /N 1 >>"), (11, "[1 2 3]")]);
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(2, "<< /Type /Pages /Kids [] /Count 0 >>");
    let mut stream = format!("<< /Type /ObjStm /N 2 /First {first} /Length {} >>\nstream\n", body.len())
        .into_bytes();
    stream.extend_from_slice(&body);
    stream.extend_from_slice(b"\nendstream");
    b.object_bytes(4, stream);
    let data = b.build_xref_stream(9, &[(10, 4, 0), (11, 4, 1)], "/Root 1 0 R");

    let doc = PDFDocument::open(data, "").unwrap();
    let packed = doc.getobj(10).unwrap();
    assert!(packed.as_dict().unwrap().is_name("Kind", "Packed"));
    let array = doc.getobj(11).unwrap();
    assert_eq!(array.as_array().unwrap().len(), 3);
    // the xref stream's dictionary doubles as the trailer
    assert!(doc.trailers().next().unwrap().1.get_key("Root").is_some());
}

#[test]
fn pages_inherit_attributes() {
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(
            2,
            "<< /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 /MediaBox [0 0 500 700] /Rotate 90 \
             /Resources << /Font << /F1 9 0 R >> >> >>",
        )
        .object(3, "<< /Type /Page /Parent 2 0 R /CropBox [10 20 400 600] >>")
        .object(4, "<< /Type /Page /Parent 2 0 R /Rotate -90 /MediaBox [0 0 100 100] >>");
    let doc = PDFDocument::open(b.build("/Root 1 0 R"), "").unwrap();

    let pages: Vec<_> = doc.pages().collect();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].mediabox, (0.0, 0.0, 500.0, 700.0));
    assert_eq!(pages[0].cropbox, (10.0, 20.0, 400.0, 600.0));
    assert_eq!(pages[0].rotate, 90);
    assert!(pages[0].resources.get_key("Font").is_some());

    assert_eq!(pages[1].mediabox, (0.0, 0.0, 100.0, 100.0));
    assert_eq!(pages[1].cropbox, pages[1].mediabox);
    assert_eq!(pages[1].rotate, 270);

    // the walk restarts from the root each time
    assert_eq!(doc.pages().count(), 2);
    assert_eq!(doc.page(1).unwrap().pageid, 4);
}

#[test]
fn page_content_arrays_are_decoded_in_order() {
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>")
        .object(3, "<< /Type /Page /Parent 2 0 R /Contents [4 0 R 5 0 R] >>")
        .stream(4, "/Filter /ASCIIHexDecode", b"712F>")
        .stream(5, "", b"Q");
    let doc = PDFDocument::open(b.build("/Root 1 0 R"), "").unwrap();
    let page = doc.page(0).unwrap();
    let parts: Vec<&[u8]> = page.contents.iter().map(|c| c.as_ref()).collect();
    assert_eq!(parts, vec![b"q/".as_slice(), b"Q"]);
}

#[test]
fn wrong_length_falls_back_to_endstream() {
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(2, "<< /Type /Pages /Kids [] /Count 0 >>")
        .object(3, "<< /Length 999 >>\nstream\nhello\r\nendstream");
    let doc = PDFDocument::open(b.build("/Root 1 0 R"), "").unwrap();
    let obj = doc.getobj(3).unwrap();
    assert_eq!(doc.decode_stream(obj.as_stream().unwrap()), b"hello");
}

#[test]
fn missing_xref_requires_fallback() {
    let mut data = base_revision();
    // drop the table, trailer and startxref, keeping the objects
    let pos = data.windows(6).position(|w| w == b"\nxref\n").unwrap();
    data.truncate(pos + 1);

    let doc = PDFDocument::open(data.clone(), "").unwrap();
    assert!(doc.trailers().all(|(fallback, _)| fallback));
    assert_eq!(doc.getobj(3).unwrap().as_string().unwrap(), b"first revision");

    let strict = OpenOptions::default().with_fallback(false);
    assert!(matches!(PDFDocument::open_with(data, &strict), Err(PdfError::NoValidXRef)));
}

fn object_stream_document(n: &str, first: Option<usize>, header: &str) -> Vec<u8> {
    let (real_first, body) = object_stream_body(&[(10, "<< /Kind /Packed >>")]);
    let body = match first {
        Some(_) => [header.as_bytes(), &body[real_first..]].concat(),
        None => body,
    };
    let first = first.unwrap_or(real_first);
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(2, "<< /Type /Pages /Kids [] /Count 0 >>");
    let mut stream = format!("<< /Type /ObjStm /N {n} /First {first} /Length {} >>\nstream\n", body.len())
        .into_bytes();
    stream.extend_from_slice(&body);
    stream.extend_from_slice(b"\nendstream");
    b.object_bytes(4, stream);
    b.build_xref_stream(9, &[(10, 4, 0)], "/Root 1 0 R")
}

#[test]
fn object_stream_count_is_checked() {
    let doc = PDFDocument::open(object_stream_document("1", None, ""), "").unwrap();
    assert!(doc.getobj(10).unwrap().as_dict().unwrap().is_name("Kind", "Packed"));

    for n in ["4611686018427387903", "-1"] {
        let doc = PDFDocument::open(object_stream_document(n, None, ""), "").unwrap();
        let err = doc.getobj(10).unwrap_err();
        assert!(matches!(err, PdfError::SyntaxError(_)), "N {n}: got {err:?}");
    }
}

#[test]
fn object_stream_offsets_are_checked() {
    // header offset that overflows when added to First
    let header = "10 9223372036854775807 ";
    let data = object_stream_document("1", Some(header.len()), header);
    let doc = PDFDocument::open(data, "").unwrap();
    assert!(doc.getobj(10).is_err());

    let data = object_stream_document("1", Some(1 << 40), "");
    let doc = PDFDocument::open(data, "").unwrap();
    assert!(matches!(doc.getobj(10), Err(PdfError::SyntaxError(_))));
}

#[test]
fn xref_stream_index_outside_object_numbers() {
    let mut data = b"%PDF-1.5\n".to_vec();
    let catalog = data.len();
    data.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
    let pages = data.len();
    data.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [] /Count 0 >>\nendobj\n");
    let xref_pos = data.len();

    let mut rows = Vec::new();
    for offset in [xref_pos, catalog, pages] {
        rows.push(1u8);
        rows.extend_from_slice(&u32::try_from(offset).unwrap().to_be_bytes());
        rows.extend_from_slice(&[0, 0]);
    }
    data.extend_from_slice(
        format!(
            "3 0 obj\n<< /Type /XRef /Size 3 /W [1 4 2] /Index [9223372036854775800 1 1 2] \
             /Root 1 0 R /Length {} >>\nstream\n",
            rows.len()
        )
        .as_bytes(),
    );
    data.extend_from_slice(&rows);
    data.extend_from_slice(format!("\nendstream\nendobj\nstartxref\n{xref_pos}\n%%EOF\n").as_bytes());

    let strict = OpenOptions::default().with_fallback(false);
    let doc = PDFDocument::open_with(data, &strict).unwrap();
    assert_eq!(doc.xrefs().len(), 1);
    assert!(doc.catalog().is_name("Type", "Catalog"));
    assert!(doc.getobj(2).unwrap().as_dict().unwrap().is_name("Type", "Pages"));
}
