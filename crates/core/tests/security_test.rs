//! Encrypted documents: authentication and transparent decryption.

mod common;

use common::{PdfBuilder, serialize};
use pdfgraph_core::document::security::{
    CryptMethod, EncryptSpec, build_encrypt_dict, encrypt_aes128, encrypt_aes256, encrypt_rc4,
};
use pdfgraph_core::error::PdfError;
use pdfgraph_core::model::objects::DictExt;
use pdfgraph_core::{PDFDocument, PDFObject};

const DOC_ID: &[u8] = b"\x8a\x01\x7f\x10pdfgraph-fixture";
const CONTENT: &[u8] = b"BT /F1 12 Tf 0 0 Td (Hi) Tj ET";

fn spec(v: i64, r: i64, key_bits: usize, method: CryptMethod) -> EncryptSpec<'static> {
    EncryptSpec {
        v,
        r,
        key_bits,
        user_password: "user",
        owner_password: "owner",
        permissions: -3904,
        doc_id: DOC_ID,
        method,
        encrypt_metadata: true,
    }
}

/// A one-page file whose content stream and Info title are encrypted with
/// the key `spec` produces.
fn encrypted_pdf(spec: &EncryptSpec<'_>) -> Vec<u8> {
    let (encrypt, key) = build_encrypt_dict(spec).unwrap();
    let seal = |objid: u32, data: &[u8]| -> Vec<u8> {
        match (spec.r, spec.method) {
            (5 | 6, _) => encrypt_aes256(&key, [3u8; 16], data).unwrap(),
            (4, CryptMethod::AESV2) => encrypt_aes128(&key, objid, 0, [9u8; 16], data).unwrap(),
            _ => encrypt_rc4(&key, objid, 0, data),
        }
    };

    let content = seal(4, CONTENT);
    let title = serialize(&PDFObject::String(seal(5, b"Quarterly report")));
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 200 200] >>")
        .object(3, "<< /Type /Page /Parent 2 0 R /Contents 4 0 R >>")
        .stream(4, "", &content)
        .object_bytes(5, [b"<< /Title ".as_slice(), &title, b" >>"].concat())
        .object_bytes(6, serialize(&PDFObject::Dict(encrypt)));
    let id = hex::encode(DOC_ID);
    b.build(&format!("/Root 1 0 R /Info 5 0 R /Encrypt 6 0 R /ID [<{id}> <{id}>]"))
}

fn assert_decrypts(spec: &EncryptSpec<'_>) {
    let data = encrypted_pdf(spec);
    for password in ["user", "owner"] {
        let doc = PDFDocument::open(data.clone(), password)
            .unwrap_or_else(|err| panic!("R{} with {password}: {err}", spec.r));
        assert!(doc.is_encrypted());
        let title = doc.info().get_key("Title").unwrap().as_string().unwrap().to_vec();
        assert_eq!(title, b"Quarterly report");
        let page = doc.page(0).unwrap();
        assert_eq!(page.contents[0].as_ref(), CONTENT);
    }
    let err = PDFDocument::open(data, "guess").unwrap_err();
    assert!(matches!(err, PdfError::EncryptionError(_)), "got {err:?}");
}

#[test]
fn rc4_40_bit_revision_2() {
    assert_decrypts(&spec(1, 2, 40, CryptMethod::V2));
}

#[test]
fn rc4_128_bit_revision_3() {
    assert_decrypts(&spec(2, 3, 128, CryptMethod::V2));
}

#[test]
fn aes_128_revision_4() {
    assert_decrypts(&spec(4, 4, 128, CryptMethod::AESV2));
}

#[test]
fn aes_256_revision_6() {
    assert_decrypts(&spec(5, 6, 256, CryptMethod::AESV3));
}

#[test]
fn empty_user_password_opens_without_prompt() {
    let mut s = spec(2, 3, 128, CryptMethod::V2);
    s.user_password = "";
    let doc = PDFDocument::open(encrypted_pdf(&s), "").unwrap();
    assert_eq!(doc.page(0).unwrap().contents[0].as_ref(), CONTENT);
}
