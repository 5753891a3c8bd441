//! Cross-reference tables.
//!
//! Both wire encodings (classic `xref` sections and `/Type /XRef` streams)
//! are normalized into [`XRef`]. The classic section reader lives on the
//! object parser because it shares the parser's trailer handling; this
//! module builds tables from streams and from the last-resort object scan.

use crate::codec::filters::{apply_filters, filter_chain};
use crate::error::{PdfError, Result};
use crate::model::objects::{DictExt, PDFDict, PDFObject, PDFStream};
use crate::parser::object_parser::ObjectParser;
use byteorder::{BigEndian, ByteOrder};
use regex::bytes::Regex;
use rustc_hash::FxHashMap;
use std::sync::LazyLock;
use tracing::debug;

/// Location of one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XRefEntry {
    /// Stored directly in the file at a byte offset.
    Direct { offset: usize, genno: u16 },
    /// Packed as member `index` of object stream `container`.
    InStream { container: u32, index: usize },
}

impl XRefEntry {
    /// Generation number used as part of the cache key.
    pub const fn genno(&self) -> u16 {
        match self {
            XRefEntry::Direct { genno, .. } => *genno,
            XRefEntry::InStream { .. } => 0,
        }
    }
}

/// One cross-reference table plus its trailer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XRef {
    entries: FxHashMap<u32, XRefEntry>,
    /// Trailer dictionary (for xref streams: the stream's own attributes)
    pub trailer: PDFDict,
    /// Whether this table was rebuilt by scanning for `N G obj` headers
    pub is_fallback: bool,
}

static OBJ_HEADER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+(\d+)\s+obj\b").ok());

impl XRef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry. Within one table a later line for the same number
    /// replaces the earlier one.
    pub fn insert(&mut self, objid: u32, entry: XRefEntry) {
        self.entries.insert(objid, entry);
    }

    pub fn get(&self, objid: u32) -> Option<&XRefEntry> {
        self.entries.get(&objid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Object numbers listed in this table, in ascending order.
    pub fn objids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Build a table from a decoded-on-demand `/Type /XRef` stream.
    pub fn from_stream(stream: &PDFStream) -> Result<Self> {
        let widths = stream
            .get("W")
            .ok_or_else(|| PdfError::SyntaxError("missing W in xref stream".into()))?
            .as_array()?;
        if widths.len() != 3 {
            return Err(PdfError::SyntaxError("W must have 3 elements".into()));
        }
        let mut w = [0usize; 3];
        for (slot, item) in w.iter_mut().zip(widths) {
            let width = item.as_int()?;
            if !(0..=8).contains(&width) {
                return Err(PdfError::SyntaxError(format!("bad xref field width {width}")));
            }
            *slot = width as usize;
        }
        let entry_size = w[0] + w[1] + w[2];
        if entry_size == 0 {
            return Err(PdfError::SyntaxError("empty xref stream entries".into()));
        }

        let size = stream
            .get("Size")
            .ok_or_else(|| PdfError::SyntaxError("missing Size in xref stream".into()))?
            .as_int()?;

        let index: Vec<(i64, i64)> = match stream.get("Index") {
            Some(idx) => idx
                .as_array()?
                .chunks_exact(2)
                .map(|pair| Ok((pair[0].as_int()?, pair[1].as_int()?)))
                .collect::<Result<_>>()?,
            None => vec![(0, size)],
        };

        // Xref streams are never encrypted and their parameters are direct.
        let chain = filter_chain(&stream.attrs, |o| match o {
            PDFObject::Ref(_) => None,
            other => Some(other.clone()),
        });
        let data = apply_filters(stream.get_rawdata(), &chain);

        let field = |bytes: &[u8]| -> u64 {
            if bytes.is_empty() {
                0
            } else {
                BigEndian::read_uint(bytes, bytes.len())
            }
        };

        let mut xref = XRef::new();
        let mut records = data.chunks_exact(entry_size);
        'sections: for (start, count) in index {
            for i in 0..count.max(0) {
                let Some(record) = records.next() else {
                    break 'sections;
                };
                let Some(objid) = start.checked_add(i).and_then(|id| u32::try_from(id).ok()) else {
                    debug!(start, i, "xref stream entry outside the object number range");
                    continue;
                };
                let (f0, rest) = record.split_at(w[0]);
                let (f1, f2) = rest.split_at(w[1]);
                let kind = if w[0] == 0 { 1 } else { field(f0) };
                match kind {
                    1 => xref.insert(
                        objid,
                        XRefEntry::Direct {
                            offset: field(f1) as usize,
                            genno: field(f2) as u16,
                        },
                    ),
                    2 => xref.insert(
                        objid,
                        XRefEntry::InStream {
                            container: field(f1) as u32,
                            index: field(f2) as usize,
                        },
                    ),
                    // 0 is a free entry; other types are reserved
                    _ => {}
                }
            }
        }

        for (key, value) in &stream.attrs {
            if !matches!(
                key.as_slice(),
                b"Length" | b"Filter" | b"DecodeParms" | b"W" | b"Index" | b"Type"
            ) {
                xref.trailer.insert(key.clone(), value.clone());
            }
        }

        Ok(xref)
    }

    /// Rebuild a table by scanning the whole file for `N G obj` headers.
    /// The last `trailer` dictionary in the file, if any, becomes the
    /// trailer; a later definition of the same number wins.
    pub fn fallback(data: &[u8]) -> Result<Self> {
        let Some(header) = OBJ_HEADER.as_ref() else {
            return Err(PdfError::NoValidXRef);
        };
        let mut xref = XRef::new();
        xref.is_fallback = true;

        for cap in header.captures_iter(data) {
            let number = |i: usize| {
                std::str::from_utf8(&cap[i])
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
            };
            let (Some(objid), Some(genno), Some(whole)) = (number(1), number(2), cap.get(0))
            else {
                continue;
            };
            let (Ok(objid), Ok(genno)) = (u32::try_from(objid), u16::try_from(genno)) else {
                continue;
            };
            xref.insert(
                objid,
                XRefEntry::Direct {
                    offset: whole.start(),
                    genno,
                },
            );
        }

        if let Some(pos) = memrchr_keyword(data, b"trailer") {
            let mut parser = ObjectParser::new(data);
            parser.seek(pos + b"trailer".len());
            if let Ok(PDFObject::Dict(dict)) = parser.next_object() {
                xref.trailer = dict;
            }
        }

        if xref.is_empty() {
            return Err(PdfError::NoValidXRef);
        }
        Ok(xref)
    }

    /// Whether the trailer names a document catalog.
    pub fn has_root(&self) -> bool {
        self.trailer.get_key("Root").is_some()
    }
}

fn memrchr_keyword(data: &[u8], needle: &[u8]) -> Option<usize> {
    data.windows(needle.len()).rposition(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::objects::dict_from;

    fn xref_stream(rows: &[u8], extra: Vec<(&'static str, PDFObject)>) -> PDFStream {
        let mut attrs = dict_from([
            ("Type", PDFObject::name("XRef")),
            (
                "W",
                PDFObject::Array(vec![PDFObject::Int(1), PDFObject::Int(2), PDFObject::Int(1)]),
            ),
            ("Size", PDFObject::Int(3)),
        ]);
        attrs.extend(dict_from(extra));
        PDFStream::new(attrs, rows.to_vec())
    }

    #[test]
    fn stream_entries_of_each_type() {
        let rows = [
            0, 0, 0, 255, // 0: free
            1, 0, 15, 0, // 1: offset 15
            2, 0, 5, 3, // 2: in object stream 5, index 3
        ];
        let xref = XRef::from_stream(&xref_stream(&rows, vec![])).unwrap();
        assert_eq!(xref.get(0), None);
        assert_eq!(xref.get(1), Some(&XRefEntry::Direct { offset: 15, genno: 0 }));
        assert_eq!(
            xref.get(2),
            Some(&XRefEntry::InStream { container: 5, index: 3 })
        );
        assert!(xref.trailer.get_key("W").is_none());
        assert!(xref.trailer.get_key("Size").is_some());
    }

    #[test]
    fn stream_index_pairs_number_entries() {
        let rows = [1, 0, 10, 0, 1, 0, 20, 0];
        let index = PDFObject::Array(vec![
            PDFObject::Int(4),
            PDFObject::Int(1),
            PDFObject::Int(9),
            PDFObject::Int(1),
        ]);
        let xref = XRef::from_stream(&xref_stream(&rows, vec![("Index", index)])).unwrap();
        assert_eq!(xref.objids(), vec![4, 9]);
    }

    #[test]
    fn stream_index_beyond_object_numbers_is_skipped() {
        let rows = [1, 0, 10, 0, 1, 0, 20, 0];
        let index = PDFObject::Array(vec![
            PDFObject::Int(i64::MAX),
            PDFObject::Int(1),
            PDFObject::Int(7),
            PDFObject::Int(1),
        ]);
        let xref = XRef::from_stream(&xref_stream(&rows, vec![("Index", index)])).unwrap();
        assert_eq!(xref.objids(), vec![7]);
        assert_eq!(xref.get(7), Some(&XRefEntry::Direct { offset: 20, genno: 0 }));
    }

    #[test]
    fn fallback_scans_headers_and_trailer() {
        let data = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\n\
            trailer\n<< /Root 1 0 R /Size 2 >>\n%%EOF";
        let xref = XRef::fallback(data).unwrap();
        assert!(xref.is_fallback);
        assert_eq!(xref.get(1), Some(&XRefEntry::Direct { offset: 9, genno: 0 }));
        assert!(xref.has_root());
    }
}
