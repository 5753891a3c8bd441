//! Single-byte encodings for simple fonts.
//!
//! The four base encodings share printable ASCII. Their upper halves (and
//! the two quote glyphs where `StandardEncoding` departs from ASCII) come
//! from [`FontResources::base_encoding`] when the injected tables know
//! them; otherwise those codes stay unmapped.

use crate::font::resources::FontResources;
use crate::model::objects::PDFObject;

/// Text per code, `None` where the encoding has no glyph.
pub type EncodingTable = [Option<String>; 256];

/// Base encodings a simple font can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaseEncoding {
    #[default]
    Standard,
    MacRoman,
    WinAnsi,
    PdfDoc,
}

impl BaseEncoding {
    pub fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"StandardEncoding" => Some(Self::Standard),
            b"MacRomanEncoding" => Some(Self::MacRoman),
            b"WinAnsiEncoding" => Some(Self::WinAnsi),
            b"PDFDocEncoding" => Some(Self::PdfDoc),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Standard => "StandardEncoding",
            Self::MacRoman => "MacRomanEncoding",
            Self::WinAnsi => "WinAnsiEncoding",
            Self::PdfDoc => "PDFDocEncoding",
        }
    }
}

/// Entry in a `Differences` array.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffEntry {
    /// Code the following names start at
    Code(u8),
    /// Glyph name for the current code
    Name(Vec<u8>),
}

impl DiffEntry {
    /// Read a `Differences` array; entries of other types are dropped.
    pub fn parse_array(items: &[PDFObject]) -> Vec<Self> {
        items
            .iter()
            .filter_map(|item| match item {
                PDFObject::Int(code) => u8::try_from(*code).ok().map(Self::Code),
                PDFObject::Name(name) => Some(Self::Name(name.clone())),
                _ => None,
            })
            .collect()
    }
}

/// Build the table for `base` with `differences` applied on top.
pub fn build_encoding(
    base: BaseEncoding,
    differences: &[DiffEntry],
    resources: &dyn FontResources,
) -> EncodingTable {
    let mut table: EncodingTable = std::array::from_fn(|_| None);
    for code in 0x20u8..0x7f {
        table[usize::from(code)] = Some(char::from(code).to_string());
    }
    if base == BaseEncoding::Standard {
        table[0x27] = Some("\u{2019}".to_string());
        table[0x60] = Some("\u{2018}".to_string());
    }
    if let Some(names) = resources.base_encoding(base.name()) {
        for (slot, name) in table.iter_mut().zip(names.iter()) {
            if let Some(text) = name.as_deref().and_then(|n| resources.lookup_unicode(n.as_bytes())) {
                *slot = Some(text);
            }
        }
    }

    let mut code: Option<usize> = None;
    for entry in differences {
        match entry {
            DiffEntry::Code(c) => code = Some(usize::from(*c)),
            DiffEntry::Name(name) => {
                // names before the first code have nowhere to go
                let Some(c) = code.filter(|&c| c < 256) else {
                    continue;
                };
                table[c] = resources.lookup_unicode(name);
                code = Some(c + 1);
            }
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::resources::BuiltinResources;
    use std::sync::Arc;

    #[test]
    fn printable_ascii_is_direct() {
        let table = build_encoding(BaseEncoding::WinAnsi, &[], &BuiltinResources);
        assert_eq!(table[usize::from(b'H')].as_deref(), Some("H"));
        assert_eq!(table[0x27].as_deref(), Some("'"));
        assert_eq!(table[0xe9], None);

        let std = build_encoding(BaseEncoding::Standard, &[], &BuiltinResources);
        assert_eq!(std[0x27].as_deref(), Some("\u{2019}"));
    }

    #[test]
    fn differences_override_and_advance() {
        let diffs = DiffEntry::parse_array(&[
            PDFObject::Int(65),
            PDFObject::name("uni0042"),
            PDFObject::name("seven"),
            PDFObject::Int(200),
            PDFObject::name("f_i"),
        ]);
        let table = build_encoding(BaseEncoding::Standard, &diffs, &BuiltinResources);
        assert_eq!(table[65].as_deref(), Some("B"));
        assert_eq!(table[66].as_deref(), Some("7"));
        assert_eq!(table[200].as_deref(), Some("fi"));
    }

    struct Latin1;

    impl FontResources for Latin1 {
        fn base_encoding(&self, name: &str) -> Option<Arc<EncodingTable>> {
            (name == "WinAnsiEncoding").then(|| {
                let mut t: EncodingTable = std::array::from_fn(|_| None);
                t[0xe9] = Some("uni00E9".to_string());
                Arc::new(t)
            })
        }
    }

    #[test]
    fn injected_upper_half() {
        let table = build_encoding(BaseEncoding::WinAnsi, &[], &Latin1);
        assert_eq!(table[0xe9].as_deref(), Some("\u{e9}"));
        assert_eq!(table[usize::from(b'a')].as_deref(), Some("a"));
    }
}
