//! Lookup service for glyph names, font metrics and CID maps.
//!
//! Large tables (the Adobe Glyph List, core-14 metrics, CID to Unicode
//! maps) are not bundled. They are injected through [`FontResources`];
//! [`BuiltinResources`] only knows the names that can be decoded without a
//! table.

use std::collections::HashMap;
use std::sync::Arc;

/// Metrics for a font that does not carry its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontMetrics {
    /// Advance widths in glyph space (per mille), by character code
    pub widths: HashMap<u8, f64>,
    pub ascent: f64,
    pub descent: f64,
    pub bbox: [f64; 4],
    pub missing_width: f64,
}

/// Read-only tables queried by the font layer.
///
/// Implementations are shared across threads and must not change once
/// constructed.
pub trait FontResources: Send + Sync {
    /// Unicode text for a glyph name.
    fn lookup_unicode(&self, glyph_name: &[u8]) -> Option<String> {
        name2unicode(glyph_name)
    }

    /// Metrics for a font by its (subset-prefix free) base name.
    fn font_metrics(&self, _font_name: &str) -> Option<Arc<FontMetrics>> {
        None
    }

    /// CID to Unicode table for a `Registry-Ordering` collection.
    fn cid_to_unicode(&self, _registry_ordering: &str) -> Option<Arc<HashMap<u32, String>>> {
        None
    }

    /// Glyph names of a base encoding (`WinAnsiEncoding`, ...) by code.
    fn base_encoding(&self, _name: &str) -> Option<Arc<[Option<String>; 256]>> {
        None
    }
}

/// Algorithmic glyph names only.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinResources;

impl FontResources for BuiltinResources {}

const NAMED: &[(&str, char)] = &[
    ("space", ' '),
    ("exclam", '!'),
    ("quotedbl", '"'),
    ("numbersign", '#'),
    ("dollar", '$'),
    ("percent", '%'),
    ("ampersand", '&'),
    ("quotesingle", '\''),
    ("quoteright", '\u{2019}'),
    ("quoteleft", '\u{2018}'),
    ("parenleft", '('),
    ("parenright", ')'),
    ("asterisk", '*'),
    ("plus", '+'),
    ("comma", ','),
    ("hyphen", '-'),
    ("period", '.'),
    ("slash", '/'),
    ("zero", '0'),
    ("one", '1'),
    ("two", '2'),
    ("three", '3'),
    ("four", '4'),
    ("five", '5'),
    ("six", '6'),
    ("seven", '7'),
    ("eight", '8'),
    ("nine", '9'),
    ("colon", ':'),
    ("semicolon", ';'),
    ("less", '<'),
    ("equal", '='),
    ("greater", '>'),
    ("question", '?'),
    ("at", '@'),
    ("bracketleft", '['),
    ("backslash", '\\'),
    ("bracketright", ']'),
    ("asciicircum", '^'),
    ("underscore", '_'),
    ("grave", '`'),
    ("braceleft", '{'),
    ("bar", '|'),
    ("braceright", '}'),
    ("asciitilde", '~'),
    ("bullet", '\u{2022}'),
    ("endash", '\u{2013}'),
    ("emdash", '\u{2014}'),
    ("quotedblleft", '\u{201C}'),
    ("quotedblright", '\u{201D}'),
    ("ellipsis", '\u{2026}'),
    ("fi", '\u{FB01}'),
    ("fl", '\u{FB02}'),
];

fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|c| c.is_ascii_hexdigit())
}

fn decode_component(name: &str) -> Option<String> {
    if let Some(hex) = name.strip_prefix("uni")
        && hex.len() >= 4
        && hex.len() % 4 == 0
        && is_hex(hex)
    {
        return hex
            .as_bytes()
            .chunks(4)
            .map(|chunk| {
                let cp = u32::from_str_radix(std::str::from_utf8(chunk).ok()?, 16).ok()?;
                char::from_u32(cp)
            })
            .collect();
    }
    if let Some(hex) = name.strip_prefix('u')
        && (4..=6).contains(&hex.len())
        && is_hex(hex)
    {
        return char::from_u32(u32::from_str_radix(hex, 16).ok()?).map(String::from);
    }
    if let Some(&(_, ch)) = NAMED.iter().find(|(n, _)| *n == name) {
        return Some(ch.to_string());
    }
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Some(ch.to_string()),
        _ => None,
    }
}

/// Decode an algorithmic glyph name: `uniXXXX...`, `uXXXX[XX]`, a single
/// character, or one of a few ASCII names. A `.suffix` is ignored and `_`
/// joins ligature components.
pub fn name2unicode(glyph_name: &[u8]) -> Option<String> {
    let name = std::str::from_utf8(glyph_name).ok()?;
    let name = name.split_once('.').map_or(name, |(base, _)| base);
    if name.is_empty() {
        return None;
    }
    name.split('_').map(decode_component).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithmic_names() {
        assert_eq!(name2unicode(b"uni0041").as_deref(), Some("A"));
        assert_eq!(name2unicode(b"uni00410042").as_deref(), Some("AB"));
        assert_eq!(name2unicode(b"u1F600").as_deref(), Some("\u{1F600}"));
        assert_eq!(name2unicode(b"H").as_deref(), Some("H"));
        assert_eq!(name2unicode(b"seven").as_deref(), Some("7"));
        assert_eq!(name2unicode(b"a.sc").as_deref(), Some("a"));
        assert_eq!(name2unicode(b"f_i").as_deref(), Some("fi"));
    }

    #[test]
    fn unknown_names() {
        assert_eq!(name2unicode(b".notdef"), None);
        assert_eq!(name2unicode(b"Aacute"), None);
        assert_eq!(name2unicode(b"uniD800"), None);
    }

    #[test]
    fn builtin_has_no_tables() {
        let res = BuiltinResources;
        assert!(res.font_metrics("Helvetica").is_none());
        assert!(res.cid_to_unicode("Adobe-Japan1").is_none());
        assert_eq!(res.lookup_unicode(b"space").as_deref(), Some(" "));
    }
}
