//! In-memory PDF fixtures with real xref offsets.

#![allow(dead_code)]

use pdfgraph_core::PDFObject;

/// Serialize an object in PDF syntax. Strings are written as hex so
/// arbitrary (encrypted) bytes survive.
pub fn serialize(obj: &PDFObject) -> Vec<u8> {
    match obj {
        PDFObject::Null => b"null".to_vec(),
        PDFObject::Bool(b) => b.to_string().into_bytes(),
        PDFObject::Int(n) => n.to_string().into_bytes(),
        PDFObject::Real(n) => format!("{n:.4}").into_bytes(),
        PDFObject::Name(n) => [b"/".as_slice(), n].concat(),
        PDFObject::String(s) => format!("<{}>", hex::encode(s)).into_bytes(),
        PDFObject::Array(items) => {
            let mut out = b"[".to_vec();
            for item in items {
                out.extend(serialize(item));
                out.push(b' ');
            }
            out.push(b']');
            out
        }
        PDFObject::Dict(dict) => {
            let mut out = b"<<".to_vec();
            for (k, v) in dict {
                out.push(b'/');
                out.extend_from_slice(k);
                out.push(b' ');
                out.extend(serialize(v));
                out.push(b' ');
            }
            out.extend_from_slice(b">>");
            out
        }
        PDFObject::Ref(r) => format!("{} {} R", r.objid, r.genno).into_bytes(),
        PDFObject::Stream(_) => unimplemented!("write streams with PdfBuilder::stream"),
    }
}

/// Builds a file object by object, then writes the xref and trailer.
#[derive(Default)]
pub struct PdfBuilder {
    /// Bytes of an earlier revision this one is appended to
    base: Vec<u8>,
    objects: Vec<(u32, Vec<u8>)>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self {
            base: b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n".to_vec(),
            objects: Vec::new(),
        }
    }

    /// Start an incremental update of `base`.
    pub fn update(base: Vec<u8>) -> Self {
        Self {
            base,
            objects: Vec::new(),
        }
    }

    pub fn object(&mut self, objid: u32, body: &str) -> &mut Self {
        self.object_bytes(objid, body.as_bytes().to_vec())
    }

    pub fn object_bytes(&mut self, objid: u32, body: Vec<u8>) -> &mut Self {
        self.objects.push((objid, body));
        self
    }

    /// A stream object; `/Length` is appended to `dict_entries`.
    pub fn stream(&mut self, objid: u32, dict_entries: &str, data: &[u8]) -> &mut Self {
        let mut body = format!("<< {dict_entries} /Length {} >>\nstream\n", data.len()).into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.object_bytes(objid, body)
    }

    /// Object bodies laid out after the base; returns (bytes, offsets).
    fn layout(&self) -> (Vec<u8>, Vec<(u32, usize)>) {
        let mut out = self.base.clone();
        let mut offsets = Vec::new();
        for (objid, body) in &self.objects {
            offsets.push((*objid, out.len()));
            out.extend_from_slice(format!("{objid} 0 obj\n").as_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }
        (out, offsets)
    }

    /// Finish with a classic xref table. `trailer` holds the entries
    /// besides `/Size`.
    pub fn build(&self, trailer: &str) -> Vec<u8> {
        let (mut out, mut offsets) = self.layout();
        offsets.sort_unstable();
        let size = offsets.last().map_or(1, |(id, _)| id + 1);
        let xref_pos = out.len();
        out.extend_from_slice(b"xref\n0 1\n0000000000 65535 f \n");
        // one subsection per object keeps sparse numbering valid
        for (objid, offset) in &offsets {
            out.extend_from_slice(format!("{objid} 1\n{offset:010} 00000 n \n").as_bytes());
        }
        out.extend_from_slice(
            format!("trailer\n<< /Size {size} {trailer} >>\nstartxref\n{xref_pos}\n%%EOF\n").as_bytes(),
        );
        out
    }

    /// Finish with a cross-reference stream numbered `xref_id`.
    /// `compressed` lists `(objid, container, index)` entries for objects
    /// stored in object streams.
    pub fn build_xref_stream(&self, xref_id: u32, compressed: &[(u32, u32, u16)], trailer: &str) -> Vec<u8> {
        let (mut out, offsets) = self.layout();
        let xref_pos = out.len();

        let mut rows: Vec<(u32, [u8; 7])> = Vec::new();
        for (objid, offset) in &offsets {
            let off = u32::try_from(*offset).unwrap().to_be_bytes();
            rows.push((*objid, [1, off[0], off[1], off[2], off[3], 0, 0]));
        }
        for (objid, container, index) in compressed {
            let c = container.to_be_bytes();
            let i = index.to_be_bytes();
            rows.push((*objid, [2, c[0], c[1], c[2], c[3], i[0], i[1]]));
        }
        let self_off = u32::try_from(xref_pos).unwrap().to_be_bytes();
        rows.push((xref_id, [1, self_off[0], self_off[1], self_off[2], self_off[3], 0, 0]));
        rows.sort_unstable_by_key(|(id, _)| *id);

        let mut index = String::new();
        let mut data = Vec::new();
        for (objid, row) in &rows {
            index.push_str(&format!("{objid} 1 "));
            data.extend_from_slice(row);
        }
        let size = rows.last().map_or(1, |(id, _)| id + 1);
        out.extend_from_slice(
            format!(
                "{xref_id} 0 obj\n<< /Type /XRef /Size {size} /W [1 4 2] /Index [{index}] /Length {} {trailer} >>\nstream\n",
                data.len()
            )
            .as_bytes(),
        );
        out.extend_from_slice(&data);
        out.extend_from_slice(format!("\nendstream\nendobj\nstartxref\n{xref_pos}\n%%EOF\n").as_bytes());
        out
    }
}

/// Offset recorded after the last `startxref`.
pub fn startxref_of(data: &[u8]) -> usize {
    let pos = data.windows(9).rposition(|w| w == b"startxref").unwrap();
    let tail = std::str::from_utf8(&data[pos + 9..]).unwrap();
    tail.split_whitespace().next().unwrap().parse().unwrap()
}

/// Body of an object stream holding `objects` as `(objid, body)`.
pub fn object_stream_body(objects: &[(u32, &str)]) -> (usize, Vec<u8>) {
    let mut header = String::new();
    let mut bodies = String::new();
    for (objid, body) in objects {
        header.push_str(&format!("{objid} {} ", bodies.len()));
        bodies.push_str(body);
        bodies.push(' ');
    }
    let first = header.len();
    (first, format!("{header}{bodies}").into_bytes())
}

/// A one-page document: catalog 1, pages 2, page 3, content 4. `resources`
/// is the page's `/Resources` entry; `extra` adds objects from 5 on.
pub fn single_page(content: &[u8], resources: &str, extra: &[(u32, &str)]) -> Vec<u8> {
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 612 792] >>")
        .object(3, &format!("<< /Type /Page /Parent 2 0 R /Resources {resources} /Contents 4 0 R >>"))
        .stream(4, "", content);
    for (objid, body) in extra {
        b.object(*objid, body);
    }
    b.build("/Root 1 0 R")
}

/// Simple Type1 font whose widths are H = 722 and i = 278.
pub const HI_FONT: &str = "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /FirstChar 72 /LastChar 105 \
     /Widths [722 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 278] >>";
