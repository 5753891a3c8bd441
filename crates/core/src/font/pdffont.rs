//! PDF fonts: simple (Type1, TrueType, Type3) and composite (Type0).
//!
//! A [`PDFFont`] answers the questions the interpreter asks while showing
//! text: how to split a string into CIDs, how far each glyph advances, and
//! what text it stands for.

use super::cmap::{CMap, UnicodeMap};
use super::encoding::{BaseEncoding, DiffEntry, EncodingTable, build_encoding};
use super::resources::FontMetrics;
use crate::document::catalog::PDFDocument;
use crate::error::{PdfError, Result};
use crate::model::objects::{DictExt, PDFDict, PDFObject};
use rustc_hash::FxHashMap;
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default vertical advance (`DW2` second entry), glyph units.
const DEFAULT_VERTICAL_ADVANCE: f64 = -1000.0;

/// How codes turn into glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    /// One byte per code, 1/1000 glyph space
    Simple,
    /// One byte per code, glyph space from `FontMatrix`
    Type3,
    /// Codes decoded through a CMap into CIDs
    Composite,
}

/// A loaded font.
#[derive(Debug, Clone)]
pub struct PDFFont {
    /// `BaseFont`, subset prefix included
    pub fontname: String,
    pub kind: FontKind,
    encoding: Option<Box<EncodingTable>>,
    cmap: Option<CMap>,
    tounicode: Option<UnicodeMap>,
    /// `ToUnicode /Identity-H`: CIDs are code points
    identity_unicode: bool,
    cid_unicode: Option<Arc<HashMap<u32, String>>>,
    /// Advance widths in glyph units, by CID (simple fonts: by code)
    widths: FxHashMap<u32, f64>,
    default_width: f64,
    vertical: bool,
    /// Vertical advances (`W2` w1y), glyph units
    vertical_advances: FxHashMap<u32, f64>,
    default_vertical_advance: f64,
    hscale: f64,
    vscale: f64,
    descent: f64,
    height: f64,
}

impl PDFFont {
    /// Load a font from its dictionary. Unknown subtypes load as Type1.
    pub fn new(spec: &PDFDict, doc: &PDFDocument) -> Result<Self> {
        let subtype = doc.resolve_entry(spec, "Subtype").and_then(|s| s.name_str());
        match subtype.as_deref() {
            Some("Type1" | "MMType1" | "TrueType") => Ok(Self::simple(spec, doc, FontKind::Simple)),
            Some("Type3") => Ok(Self::simple(spec, doc, FontKind::Type3)),
            Some("Type0") => Self::type0(spec, doc),
            Some("CIDFontType0" | "CIDFontType2") => Ok(Self::composite(spec, spec, doc)),
            other => {
                warn!(subtype = ?other, "unsupported font subtype, treating as Type1");
                Ok(Self::simple(spec, doc, FontKind::Simple))
            }
        }
    }

    fn type0(spec: &PDFDict, doc: &PDFDocument) -> Result<Self> {
        let descendant = doc
            .resolve_entry(spec, "DescendantFonts")
            .and_then(|d| match d {
                PDFObject::Array(items) => items.into_iter().next(),
                other => Some(other),
            })
            .and_then(|first| doc.resolve(&first).ok())
            .and_then(|first| first.as_dict().ok().cloned())
            .ok_or_else(|| PdfError::KeyError("DescendantFonts".to_string()))?;

        let mut merged = descendant;
        for key in ["Encoding", "ToUnicode"] {
            if let Some(value) = spec.get_key(key) {
                merged.insert(key.as_bytes().to_vec(), value.clone());
            }
        }
        Ok(Self::composite(spec, &merged, doc))
    }

    fn blank(fontname: String, kind: FontKind) -> Self {
        Self {
            fontname,
            kind,
            encoding: None,
            cmap: None,
            tounicode: None,
            identity_unicode: false,
            cid_unicode: None,
            widths: FxHashMap::default(),
            default_width: 0.0,
            vertical: false,
            vertical_advances: FxHashMap::default(),
            default_vertical_advance: DEFAULT_VERTICAL_ADVANCE,
            hscale: 0.001,
            vscale: 0.001,
            descent: 0.0,
            height: 1.0,
        }
    }

    fn simple(spec: &PDFDict, doc: &PDFDocument, kind: FontKind) -> Self {
        let resources = doc.font_resources();
        let fontname = font_name(spec, doc);
        let mut font = Self::blank(fontname, kind);

        if kind == FontKind::Type3 {
            let matrix = number_array(doc, spec, "FontMatrix").filter(|m| m.len() == 6);
            if let Some(m) = matrix {
                font.hscale = m[0];
                font.vscale = m[3];
            }
        }

        let (base, differences) = match doc.resolve_entry(spec, "Encoding") {
            Some(PDFObject::Name(name)) => (BaseEncoding::from_name(&name).unwrap_or_default(), Vec::new()),
            Some(PDFObject::Dict(dict)) => {
                let base = doc
                    .resolve_entry(&dict, "BaseEncoding")
                    .and_then(|b| b.as_name().ok().and_then(BaseEncoding::from_name))
                    .unwrap_or_default();
                let diffs = match doc.resolve_entry(&dict, "Differences") {
                    Some(PDFObject::Array(items)) => DiffEntry::parse_array(&items),
                    _ => Vec::new(),
                };
                (base, diffs)
            }
            _ => (BaseEncoding::default(), Vec::new()),
        };
        font.encoding = Some(Box::new(build_encoding(base, &differences, resources)));

        let metrics = resources.font_metrics(strip_subset(&font.fontname));
        let descriptor = descriptor(spec, doc);
        font.default_width = descriptor
            .as_ref()
            .and_then(|d| doc.resolve_entry(d, "MissingWidth"))
            .and_then(|w| w.as_num().ok())
            .or_else(|| metrics.as_ref().map(|m| m.missing_width))
            .unwrap_or(0.0);

        let first_char = doc
            .resolve_entry(spec, "FirstChar")
            .and_then(|f| f.as_int().ok())
            .unwrap_or(0);
        if let Some(widths) = number_array(doc, spec, "Widths") {
            for (code, width) in (first_char..).zip(widths) {
                if let Ok(code) = u32::try_from(code) {
                    font.widths.insert(code, width);
                }
            }
        }
        if let Some(m) = &metrics {
            for (&code, &width) in &m.widths {
                font.widths.entry(u32::from(code)).or_insert(width);
            }
        }

        font.tounicode_from(spec, doc);
        font.vertical_metrics(spec, descriptor.as_ref(), metrics.as_deref(), doc);
        font
    }

    fn composite(outer: &PDFDict, spec: &PDFDict, doc: &PDFDocument) -> Self {
        let fontname = font_name(outer, doc);
        let mut font = Self::blank(fontname, FontKind::Composite);

        let cmap = match spec.get_key("Encoding").map(|e| doc.resolve_shared(e)) {
            Some(Ok(obj)) => match obj.as_ref() {
                PDFObject::Name(name) => CMap::predefined(&String::from_utf8_lossy(name)),
                PDFObject::Stream(stream) => {
                    let mut cmap = CMap::parse(doc.decode_stream(stream));
                    if stream.get("WMode").and_then(|w| w.as_int().ok()) == Some(1) {
                        cmap.set_vertical(true);
                    }
                    cmap
                }
                _ => CMap::identity(false),
            },
            Some(Err(err)) => {
                debug!(%err, "unreadable font encoding, using Identity-H");
                CMap::identity(false)
            }
            None => CMap::identity(false),
        };
        font.vertical = cmap.is_vertical();
        font.cmap = Some(cmap);

        font.default_width = doc
            .resolve_entry(spec, "DW")
            .and_then(|w| w.as_num().ok())
            .unwrap_or(1000.0);
        if let Some(PDFObject::Array(w)) = doc.resolve_entry(spec, "W") {
            font.widths = parse_widths(&w, doc);
        }
        if font.vertical {
            if let Some(dw2) = number_array(doc, spec, "DW2").filter(|a| a.len() >= 2) {
                font.default_vertical_advance = dw2[1];
            }
            if let Some(PDFObject::Array(w2)) = doc.resolve_entry(spec, "W2") {
                font.vertical_advances = parse_vertical_widths(&w2, doc);
            }
        }

        font.tounicode_from(spec, doc);
        if font.tounicode.is_none() && !font.identity_unicode {
            font.cid_unicode = system_info(spec, doc)
                .and_then(|ordering| doc.font_resources().cid_to_unicode(&ordering));
        }

        let descriptor = descriptor(spec, doc);
        font.vertical_metrics(spec, descriptor.as_ref(), None, doc);
        font
    }

    fn tounicode_from(&mut self, spec: &PDFDict, doc: &PDFDocument) {
        let Some(entry) = spec.get_key("ToUnicode") else {
            return;
        };
        let Ok(obj) = doc.resolve_shared(entry) else {
            return;
        };
        match obj.as_ref() {
            PDFObject::Stream(stream) => {
                let map = UnicodeMap::parse(doc.decode_stream(stream));
                if map.is_empty() {
                    debug!(font = %self.fontname, "ToUnicode has no mappings");
                } else {
                    self.tounicode = Some(map);
                }
            }
            PDFObject::Name(name) if name.starts_with(b"Identity") => self.identity_unicode = true,
            _ => {}
        }
    }

    /// Descent and height in text space per unit font size.
    fn vertical_metrics(
        &mut self,
        spec: &PDFDict,
        descriptor: Option<&PDFDict>,
        metrics: Option<&FontMetrics>,
        doc: &PDFDocument,
    ) {
        let from_descriptor = |key: &str| {
            descriptor
                .and_then(|d| doc.resolve_entry(d, key))
                .and_then(|v| v.as_num().ok())
        };
        let descent = from_descriptor("Descent").or(metrics.map(|m| m.descent)).unwrap_or(0.0);
        let ascent = from_descriptor("Ascent").or(metrics.map(|m| m.ascent)).unwrap_or(0.0);
        let bbox = descriptor
            .and_then(|d| number_array(doc, d, "FontBBox"))
            .or_else(|| number_array(doc, spec, "FontBBox"))
            .filter(|b| b.len() == 4)
            .map(|b| [b[0], b[1], b[2], b[3]])
            .or(metrics.map(|m| m.bbox))
            .unwrap_or_default();

        let bbox_height = bbox[3] - bbox[1];
        let height = if bbox_height != 0.0 {
            bbox_height
        } else {
            ascent - descent
        };
        self.descent = descent * self.vscale;
        self.height = if height != 0.0 { (height * self.vscale).abs() } else { 1.0 };
    }

    /// Split a shown string into CIDs.
    pub fn decode(&self, data: &[u8]) -> Vec<u32> {
        match &self.cmap {
            Some(cmap) => cmap.decode(data),
            None => data.iter().map(|&b| u32::from(b)).collect(),
        }
    }

    /// Horizontal advance in text space per unit font size.
    pub fn char_width(&self, cid: u32) -> f64 {
        self.widths.get(&cid).copied().unwrap_or(self.default_width) * self.hscale
    }

    /// Vertical advance (negative is downward) per unit font size.
    pub fn char_disp(&self, cid: u32) -> f64 {
        self.vertical_advances
            .get(&cid)
            .copied()
            .unwrap_or(self.default_vertical_advance)
            * 0.001
    }

    /// Text for a CID, `(cid:N)` when nothing maps it.
    pub fn to_unicode(&self, cid: u32) -> String {
        self.lookup_unicode(cid).unwrap_or_else(|| format!("(cid:{cid})"))
    }

    fn lookup_unicode(&self, cid: u32) -> Option<String> {
        if let Some(text) = self.tounicode.as_ref().and_then(|m| m.get(cid)) {
            return Some(text);
        }
        if self.identity_unicode {
            return char::from_u32(cid).map(String::from);
        }
        if let Some(table) = &self.encoding {
            return usize::try_from(cid).ok().and_then(|c| table.get(c)?.clone());
        }
        self.cid_unicode.as_ref()?.get(&cid).cloned()
    }

    pub fn is_vertical(&self) -> bool {
        self.vertical
    }

    pub fn is_multibyte(&self) -> bool {
        self.cmap.as_ref().is_some_and(CMap::is_multibyte)
    }

    pub fn descent(&self) -> f64 {
        self.descent
    }

    pub fn height(&self) -> f64 {
        self.height
    }
}

fn font_name(spec: &PDFDict, doc: &PDFDocument) -> String {
    doc.resolve_entry(spec, "BaseFont")
        .or_else(|| doc.resolve_entry(spec, "Name"))
        .and_then(|n| match n {
            PDFObject::Name(n) | PDFObject::String(n) => Some(String::from_utf8_lossy(&n).into_owned()),
            _ => None,
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// `ABCDEF+Helvetica` -> `Helvetica`.
fn strip_subset(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) => rest,
        _ => name,
    }
}

fn descriptor(spec: &PDFDict, doc: &PDFDocument) -> Option<PDFDict> {
    match doc.resolve_entry(spec, "FontDescriptor")? {
        PDFObject::Dict(d) => Some(d),
        _ => None,
    }
}

/// `Registry-Ordering` from `CIDSystemInfo`.
fn system_info(spec: &PDFDict, doc: &PDFDocument) -> Option<String> {
    let info = doc.resolve_entry(spec, "CIDSystemInfo")?;
    let info = info.as_dict().ok()?;
    let text = |key: &str| {
        doc.resolve_entry(info, key)
            .and_then(|v| v.as_string().ok().map(|s| String::from_utf8_lossy(s).into_owned()))
    };
    Some(format!("{}-{}", text("Registry")?, text("Ordering")?))
}

fn number_array(doc: &PDFDocument, dict: &PDFDict, key: &str) -> Option<Vec<f64>> {
    let PDFObject::Array(items) = doc.resolve_entry(dict, key)? else {
        return None;
    };
    items
        .iter()
        .map(|item| doc.resolve(item).ok()?.as_num().ok())
        .collect()
}

fn resolved_numbers(items: &[PDFObject], doc: &PDFDocument) -> Vec<Option<f64>> {
    items
        .iter()
        .map(|item| doc.resolve(item).ok().and_then(|v| v.as_num().ok()))
        .collect()
}

/// Largest CID a CMap can produce.
const MAX_CID: u32 = 0xFFFF;

fn cid_of(n: f64) -> Option<u32> {
    (n.is_finite() && (0.0..=f64::from(MAX_CID)).contains(&n)).then_some(n as u32)
}

/// `cfirst..=clast` clipped to the CID space; `None` when the range is
/// empty or starts outside it.
fn cid_range(first: f64, last: f64) -> Option<RangeInclusive<u32>> {
    let first = cid_of(first)?;
    if !last.is_finite() || last < f64::from(first) {
        return None;
    }
    Some(first..=last.min(f64::from(MAX_CID)) as u32)
}

/// Read a `W` array: `c [w1 w2 ...]` and `cfirst clast w` forms.
fn parse_widths(items: &[PDFObject], doc: &PDFDocument) -> FxHashMap<u32, f64> {
    let mut widths = FxHashMap::default();
    let mut pending: Vec<f64> = Vec::new();
    for item in items {
        match doc.resolve(item) {
            Ok(PDFObject::Array(run)) => {
                if let Some(start) = pending.last().copied().and_then(cid_of) {
                    for (cid, w) in (start..=MAX_CID).zip(resolved_numbers(&run, doc)) {
                        if let Some(w) = w {
                            widths.insert(cid, w);
                        }
                    }
                }
                pending.clear();
            }
            Ok(value) => {
                let Ok(n) = value.as_num() else {
                    continue;
                };
                pending.push(n);
                if let [first, last, w] = pending[..] {
                    match cid_range(first, last) {
                        Some(range) => widths.extend(range.map(|cid| (cid, w))),
                        None => debug!(first, last, "width range outside the CID space"),
                    }
                    pending.clear();
                }
            }
            Err(err) => debug!(%err, "unreadable width entry"),
        }
    }
    widths
}

/// Read a `W2` array; keeps the vertical advance (w1y) of each entry.
fn parse_vertical_widths(items: &[PDFObject], doc: &PDFDocument) -> FxHashMap<u32, f64> {
    let mut advances = FxHashMap::default();
    let mut pending: Vec<f64> = Vec::new();
    for item in items {
        match doc.resolve(item) {
            Ok(PDFObject::Array(run)) => {
                if let Some(start) = pending.last().copied().and_then(cid_of) {
                    let values: Vec<f64> = resolved_numbers(&run, doc).into_iter().flatten().collect();
                    for (cid, triple) in (start..=MAX_CID).zip(values.chunks_exact(3)) {
                        advances.insert(cid, triple[0]);
                    }
                }
                pending.clear();
            }
            Ok(value) => {
                let Ok(n) = value.as_num() else {
                    continue;
                };
                pending.push(n);
                if let [first, last, w1y, _vx, _vy] = pending[..] {
                    match cid_range(first, last) {
                        Some(range) => advances.extend(range.map(|cid| (cid, w1y))),
                        None => debug!(first, last, "vertical width range outside the CID space"),
                    }
                    pending.clear();
                }
            }
            Err(err) => debug!(%err, "unreadable vertical width entry"),
        }
    }
    advances
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subset_prefix() {
        assert_eq!(strip_subset("ABCDEF+Helvetica"), "Helvetica");
        assert_eq!(strip_subset("Foo+Bar"), "Foo+Bar");
        assert_eq!(strip_subset("Times-Roman"), "Times-Roman");
    }

    #[test]
    fn simple_font_defaults() {
        let font = PDFFont::blank("F".to_string(), FontKind::Simple);
        assert_eq!(font.decode(b"Hi"), vec![72, 105]);
        assert_eq!(font.char_width(72), 0.0);
        assert!(!font.is_multibyte());
        assert_eq!(font.to_unicode(7), "(cid:7)");
    }

    #[test]
    fn cid_ranges_stay_in_cid_space() {
        assert_eq!(cid_range(0.0, 4_000_000_000.0), Some(0..=MAX_CID));
        assert_eq!(cid_range(-5.0, 3.0), None);
        assert_eq!(cid_range(10.0, 2.0), None);
        assert_eq!(cid_range(70_000.0, 80_000.0), None);
        assert_eq!(cid_range(1.0, f64::NAN), None);
        assert_eq!(cid_of(f64::NAN), None);
    }

    #[test]
    fn vertical_advance_defaults_to_dw2() {
        let font = PDFFont::blank("F".to_string(), FontKind::Composite);
        assert_eq!(font.char_disp(1), -1.0);
    }
}
