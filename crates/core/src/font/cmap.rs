//! Character maps.
//!
//! A [`CMap`] turns the bytes of a shown string into CIDs; a
//! [`UnicodeMap`] (from a `ToUnicode` stream) turns CIDs into text. Both
//! are read from the same PostScript-like syntax by [`parse_cmap`], which
//! runs the document lexer over the stream and collects operands until a
//! block keyword consumes them.

use crate::font::resources::name2unicode;
use crate::model::objects::PDFObject;
use crate::parser::lexer::{Keyword, Lexer, Token};
use rustc_hash::FxHashMap;
use tracing::debug;

/// One `begincodespacerange` entry: codes of `low.len()` bytes whose
/// every byte lies within the matching bytes of `low..=high`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CodeSpace {
    low: Vec<u8>,
    high: Vec<u8>,
}

impl CodeSpace {
    fn contains(&self, code: &[u8]) -> bool {
        code.len() == self.low.len()
            && code
                .iter()
                .zip(self.low.iter().zip(&self.high))
                .all(|(b, (lo, hi))| (lo..=hi).contains(&b))
    }
}

#[derive(Debug, Clone)]
struct CidRange {
    start: Vec<u8>,
    end: Vec<u8>,
    cid: u32,
}

fn be_value(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

/// Code to CID mapping.
#[derive(Debug, Clone, Default)]
pub struct CMap {
    /// `CMapName`, or the predefined name this map was built from
    pub name: Option<String>,
    vertical: bool,
    /// Identity maps read fixed 2-byte big-endian codes
    identity: bool,
    codespace: Vec<CodeSpace>,
    code_to_cid: FxHashMap<Vec<u8>, u32>,
    ranges: Vec<CidRange>,
}

impl CMap {
    /// `Identity-H` / `Identity-V`.
    pub fn identity(vertical: bool) -> Self {
        Self {
            name: Some(if vertical { "Identity-V" } else { "Identity-H" }.to_string()),
            vertical,
            identity: true,
            ..Self::default()
        }
    }

    /// A predefined CMap by name. Only the identity maps are known; other
    /// names fall back to identity decoding with the writing mode taken
    /// from the `-V` suffix.
    pub fn predefined(name: &str) -> Self {
        let vertical = name.ends_with("-V");
        if !matches!(name, "Identity-H" | "Identity-V") {
            debug!(cmap = name, "predefined cmap not bundled, decoding as identity");
        }
        let mut cmap = Self::identity(vertical);
        cmap.name = Some(name.to_string());
        cmap
    }

    /// Parse an embedded CMap stream.
    pub fn parse(data: &[u8]) -> Self {
        parse_cmap(data).cmap
    }

    pub fn is_vertical(&self) -> bool {
        self.vertical
    }

    /// Override the writing mode, as a stream's `WMode` entry does.
    pub fn set_vertical(&mut self, vertical: bool) {
        self.vertical = vertical;
    }

    /// Whether codes can be longer than one byte.
    pub fn is_multibyte(&self) -> bool {
        self.identity
            || self.codespace.iter().any(|cs| cs.low.len() > 1)
            || self.code_to_cid.keys().any(|k| k.len() > 1)
    }

    fn lookup(&self, code: &[u8]) -> Option<u32> {
        if let Some(&cid) = self.code_to_cid.get(code) {
            return Some(cid);
        }
        self.ranges.iter().find_map(|r| {
            (code.len() == r.start.len() && code >= &r.start[..] && code <= &r.end[..])
                .then(|| r.cid + (be_value(code) - be_value(&r.start)))
        })
    }

    /// Length of the code starting at `data[0]`.
    fn code_len(&self, data: &[u8]) -> Option<usize> {
        if self.codespace.is_empty() {
            return (1..=data.len().min(4))
                .rev()
                .find(|&n| self.lookup(&data[..n]).is_some())
                .or_else(|| (self.identity && data.len() >= 2).then_some(2));
        }
        (1..=data.len().min(4)).find(|&n| self.codespace.iter().any(|cs| cs.contains(&data[..n])))
    }

    /// Decode a shown string into CIDs. Codes outside the codespace or
    /// without a mapping are skipped.
    pub fn decode(&self, data: &[u8]) -> Vec<u32> {
        if self.identity && self.code_to_cid.is_empty() && self.ranges.is_empty() {
            return data
                .chunks_exact(2)
                .map(|pair| u32::from(u16::from_be_bytes([pair[0], pair[1]])))
                .collect();
        }
        let mut cids = Vec::with_capacity(data.len());
        let mut pos = 0;
        while pos < data.len() {
            let Some(len) = self.code_len(&data[pos..]) else {
                debug!(byte = data[pos], "byte outside codespace");
                pos += 1;
                continue;
            };
            let code = &data[pos..pos + len];
            match self.lookup(code) {
                Some(cid) => cids.push(cid),
                None if self.identity && len == 2 => cids.push(be_value(code)),
                None => debug!(?code, "unmapped code"),
            }
            pos += len;
        }
        cids
    }
}

#[derive(Debug, Clone)]
struct BfRange {
    start: u32,
    end: u32,
    /// UTF-16BE text for `start`; later codes advance its last code unit
    base: Vec<u8>,
}

/// CID to Unicode mapping from a `ToUnicode` stream.
#[derive(Debug, Clone, Default)]
pub struct UnicodeMap {
    chars: FxHashMap<u32, String>,
    ranges: Vec<BfRange>,
}

impl UnicodeMap {
    pub fn parse(data: &[u8]) -> Self {
        parse_cmap(data).unicode
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty() && self.ranges.is_empty()
    }

    /// Add a single mapping. A no-break space never replaces an existing
    /// plain space for the same CID.
    pub fn insert(&mut self, cid: u32, text: String) {
        if text == "\u{a0}" && self.chars.get(&cid).is_some_and(|t| t == " ") {
            return;
        }
        self.chars.insert(cid, text);
    }

    pub fn get(&self, cid: u32) -> Option<String> {
        if let Some(text) = self.chars.get(&cid) {
            return Some(text.clone());
        }
        let range = self.ranges.iter().find(|r| (r.start..=r.end).contains(&cid))?;
        let mut units = utf16_units(&range.base);
        let last = units.last_mut()?;
        *last = last.wrapping_add(u16::try_from(cid - range.start).ok()?);
        Some(String::from_utf16_lossy(&units))
    }
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    match bytes {
        [single] => vec![u16::from(*single)],
        _ => bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect(),
    }
}

/// Decode UTF-16BE text as found in `bfchar`/`bfrange` destinations.
pub fn decode_utf16be(bytes: &[u8]) -> String {
    String::from_utf16_lossy(&utf16_units(bytes))
}

/// Everything one CMap stream defines.
#[derive(Debug, Clone, Default)]
pub struct ParsedCMap {
    pub cmap: CMap,
    pub unicode: UnicodeMap,
}

/// Parse CMap syntax. Malformed entries are skipped and a lexer error
/// ends the parse with whatever was collected so far.
pub fn parse_cmap(data: &[u8]) -> ParsedCMap {
    let mut out = ParsedCMap::default();
    let mut lexer = Lexer::new(data);
    let mut operands: Vec<PDFObject> = Vec::new();
    // open `[`, `<<` and `{` frames, each holding the operand-stack depth
    let mut frames: Vec<(Keyword, usize)> = Vec::new();

    while let Some(item) = lexer.next_token() {
        let token = match item {
            Ok((_, token)) => token,
            Err(err) => {
                debug!(%err, "cmap parse stopped");
                break;
            }
        };
        let kw = match token {
            Token::Int(n) => {
                operands.push(PDFObject::Int(n));
                continue;
            }
            Token::Real(n) => {
                operands.push(PDFObject::Real(n));
                continue;
            }
            Token::String(s) => {
                operands.push(PDFObject::String(s));
                continue;
            }
            Token::Name(n) => {
                operands.push(PDFObject::Name(n));
                continue;
            }
            Token::Keyword(kw) => kw,
        };
        match kw {
            Keyword::ArrayStart | Keyword::DictStart | Keyword::BraceOpen => {
                frames.push((kw, operands.len()));
            }
            Keyword::ArrayEnd | Keyword::DictEnd | Keyword::BraceClose => {
                let Some((open, depth)) = frames.pop() else {
                    continue;
                };
                let items = operands.split_off(depth.min(operands.len()));
                operands.push(match open {
                    Keyword::ArrayStart => PDFObject::Array(items),
                    _ => PDFObject::Null,
                });
            }
            _ if !frames.is_empty() => {}
            Keyword::Def => {
                let value = operands.pop();
                let key = operands.pop();
                match (key, value) {
                    (Some(k), Some(PDFObject::Int(mode))) if k.is_name("WMode") => {
                        out.cmap.vertical = mode != 0;
                    }
                    (Some(k), Some(v)) if k.is_name("CMapName") => {
                        out.cmap.name = v.name_str();
                    }
                    _ => {}
                }
            }
            Keyword::UseCMap => {
                if let Some(name) = operands.pop().and_then(|n| n.name_str())
                    && name.starts_with("Identity-")
                {
                    out.cmap.identity = true;
                }
                operands.clear();
            }
            Keyword::EndCodeSpaceRange => {
                for pair in operands.chunks_exact(2) {
                    if let [PDFObject::String(low), PDFObject::String(high)] = pair
                        && low.len() == high.len()
                        && !low.is_empty()
                    {
                        out.cmap.codespace.push(CodeSpace {
                            low: low.clone(),
                            high: high.clone(),
                        });
                    }
                }
                operands.clear();
            }
            Keyword::EndCidRange => {
                for triple in operands.chunks_exact(3) {
                    if let [PDFObject::String(start), PDFObject::String(end), PDFObject::Int(cid)] =
                        triple
                        && start.len() == end.len()
                        && let Ok(cid) = u32::try_from(*cid)
                    {
                        out.cmap.ranges.push(CidRange {
                            start: start.clone(),
                            end: end.clone(),
                            cid,
                        });
                    }
                }
                operands.clear();
            }
            Keyword::EndCidChar => {
                for pair in operands.chunks_exact(2) {
                    if let [PDFObject::String(code), PDFObject::Int(cid)] = pair
                        && let Ok(cid) = u32::try_from(*cid)
                    {
                        out.cmap.code_to_cid.insert(code.clone(), cid);
                    }
                }
                operands.clear();
            }
            Keyword::EndBfChar => {
                for pair in operands.chunks_exact(2) {
                    let [PDFObject::String(code), dst] = pair else {
                        continue;
                    };
                    let text = match dst {
                        PDFObject::String(s) => Some(decode_utf16be(s)),
                        PDFObject::Name(n) => name2unicode(n),
                        _ => None,
                    };
                    if let Some(text) = text {
                        out.unicode.insert(be_value(code), text);
                    }
                }
                operands.clear();
            }
            Keyword::EndBfRange => {
                for triple in operands.chunks_exact(3) {
                    let [PDFObject::String(start), PDFObject::String(end), dst] = triple else {
                        continue;
                    };
                    let (start, end) = (be_value(start), be_value(end));
                    if end < start {
                        continue;
                    }
                    match dst {
                        PDFObject::String(base) if !base.is_empty() => {
                            out.unicode.ranges.push(BfRange {
                                start,
                                end,
                                base: base.clone(),
                            });
                        }
                        PDFObject::Array(items) => {
                            for (cid, item) in (start..=end).zip(items) {
                                if let PDFObject::String(s) = item {
                                    out.unicode.insert(cid, decode_utf16be(s));
                                }
                            }
                        }
                        _ => {}
                    }
                }
                operands.clear();
            }
            Keyword::BeginCodeSpaceRange
            | Keyword::BeginCidRange
            | Keyword::BeginCidChar
            | Keyword::BeginBfChar
            | Keyword::BeginBfRange => operands.clear(),
            // findresource, begin, dict, defineresource, ...
            _ => {
                if !matches!(operands.last(), Some(PDFObject::Name(_))) {
                    operands.clear();
                }
            }
        }
    }
    out
}
