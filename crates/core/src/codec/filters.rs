//! Stream filter chain.
//!
//! A stream names its filters in `Filter` (a name or an array) with a
//! matching `DecodeParms` entry per filter. Decoding runs them in order
//! and degrades instead of failing: an unknown filter or a decode error
//! stops the chain and keeps the bytes decoded so far.

use super::predictor::{PredictorParams, apply_predictor};
use super::{ascii85, flate, lzw, runlength};
use crate::error::Result;
use crate::model::objects::{DictExt, PDFDict, PDFObject};
use tracing::warn;

/// Filters known to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Flate,
    Lzw,
    Ascii85,
    AsciiHex,
    RunLength,
    /// Image codecs: the encoded bytes are handed to the caller as-is.
    Dct,
    Jpx,
    Jbig2,
    Ccitt,
    /// Decryption is handled by the security handler, not here.
    Crypt,
    Unknown(Vec<u8>),
}

impl Filter {
    /// Map a filter name (full or inline-image abbreviation).
    pub fn from_name(name: &[u8]) -> Self {
        match name {
            b"FlateDecode" | b"Fl" => Filter::Flate,
            b"LZWDecode" | b"LZW" => Filter::Lzw,
            b"ASCII85Decode" | b"A85" => Filter::Ascii85,
            b"ASCIIHexDecode" | b"AHx" => Filter::AsciiHex,
            b"RunLengthDecode" | b"RL" => Filter::RunLength,
            b"DCTDecode" | b"DCT" => Filter::Dct,
            b"JPXDecode" => Filter::Jpx,
            b"JBIG2Decode" => Filter::Jbig2,
            b"CCITTFaxDecode" | b"CCF" => Filter::Ccitt,
            b"Crypt" => Filter::Crypt,
            other => Filter::Unknown(other.to_vec()),
        }
    }

    /// Image codecs end the chain; their output is not raw bytes.
    pub const fn is_image_codec(&self) -> bool {
        matches!(self, Filter::Dct | Filter::Jpx | Filter::Jbig2 | Filter::Ccitt)
    }
}

/// One filter with its decode parameters.
pub type FilterStep = (Filter, Option<PDFDict>);

/// Build the filter chain for a stream dictionary.
///
/// `resolve` turns indirect references into values; entries that cannot be
/// resolved are skipped.
pub fn filter_chain<F>(attrs: &PDFDict, resolve: F) -> Vec<FilterStep>
where
    F: Fn(&PDFObject) -> Option<PDFObject>,
{
    let Some(filter) = attrs.get_any(&["Filter", "F"]).and_then(&resolve) else {
        return Vec::new();
    };
    let names: Vec<PDFObject> = match filter {
        PDFObject::Array(items) => items.iter().filter_map(&resolve).collect(),
        PDFObject::Null => Vec::new(),
        other => vec![other],
    };
    let params: Vec<Option<PDFDict>> = match attrs
        .get_any(&["DecodeParms", "DP"])
        .and_then(&resolve)
    {
        Some(PDFObject::Array(items)) => items
            .iter()
            .map(|p| match resolve(p) {
                Some(PDFObject::Dict(d)) => Some(d),
                _ => None,
            })
            .collect(),
        Some(PDFObject::Dict(d)) => vec![Some(d)],
        _ => Vec::new(),
    };

    names
        .iter()
        .enumerate()
        .filter_map(|(i, name)| {
            let name = name.as_name().ok()?;
            Some((Filter::from_name(name), params.get(i).cloned().flatten()))
        })
        .collect()
}

fn predictor_params(parms: &PDFDict) -> PredictorParams {
    let int = |key: &str, default: i64| {
        parms
            .get_key(key)
            .and_then(|v| v.as_int().ok())
            .unwrap_or(default)
    };
    PredictorParams {
        predictor: int("Predictor", 1),
        colors: int("Colors", 1).max(1) as usize,
        bits_per_component: int("BitsPerComponent", 8).max(1) as usize,
        columns: int("Columns", 1).max(1) as usize,
    }
}

fn decode_one(data: &[u8], filter: &Filter, parms: Option<&PDFDict>) -> Result<Vec<u8>> {
    let decoded = match filter {
        Filter::Flate => flate::flatedecode(data)?,
        Filter::Lzw => {
            let early = parms
                .and_then(|p| p.get_key("EarlyChange"))
                .and_then(|v| v.as_int().ok())
                .unwrap_or(1);
            lzw::lzwdecode_with_earlychange(data, early)?
        }
        Filter::Ascii85 => ascii85::ascii85decode(data)?,
        Filter::AsciiHex => ascii85::asciihexdecode(data)?,
        Filter::RunLength => runlength::rldecode(data)?,
        Filter::Crypt => data.to_vec(),
        Filter::Dct | Filter::Jpx | Filter::Jbig2 | Filter::Ccitt | Filter::Unknown(_) => {
            return Ok(data.to_vec());
        }
    };
    Ok(decoded)
}

/// Run a filter chain over `data`. Never fails: see the module docs for
/// how errors degrade.
pub fn apply_filters(data: &[u8], chain: &[FilterStep]) -> Vec<u8> {
    let mut output = data.to_vec();
    for (filter, parms) in chain {
        if filter.is_image_codec() {
            break;
        }
        if let Filter::Unknown(name) = filter {
            warn!(
                filter = %String::from_utf8_lossy(name),
                "unsupported filter, returning partially decoded data"
            );
            break;
        }
        match decode_one(&output, filter, parms.as_ref()) {
            Ok(decoded) => output = decoded,
            Err(err) => {
                warn!(?filter, %err, "filter failed, returning partially decoded data");
                break;
            }
        }
        if let (Filter::Flate | Filter::Lzw, Some(parms)) = (filter, parms) {
            match apply_predictor(&output, &predictor_params(parms)) {
                Ok(unpredicted) => output = unpredicted,
                Err(err) => {
                    warn!(?filter, %err, "predictor failed, returning filter output");
                    break;
                }
            }
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::objects::dict_from;

    fn chain_of(attrs: &PDFDict) -> Vec<FilterStep> {
        filter_chain(attrs, |o| Some(o.clone()))
    }

    #[test]
    fn chained_filters_run_in_order() {
        let inner = flate::flateencode(b"hello filters");
        let outer = ascii85::asciihexencode(&inner);
        let attrs = dict_from([(
            "Filter",
            PDFObject::Array(vec![PDFObject::name("ASCIIHexDecode"), PDFObject::name("FlateDecode")]),
        )]);
        assert_eq!(apply_filters(&outer, &chain_of(&attrs)), b"hello filters");
    }

    #[test]
    fn unknown_filter_returns_partial_result() {
        let attrs = dict_from([(
            "Filter",
            PDFObject::Array(vec![PDFObject::name("AHx"), PDFObject::name("NoSuchDecode")]),
        )]);
        assert_eq!(apply_filters(b"414243>", &chain_of(&attrs)), b"ABC");
    }

    #[test]
    fn flate_with_png_up_predictor() {
        let rows = [2u8, 1, 2, 2, 1, 1];
        let encoded = flate::flateencode(&rows);
        let attrs = dict_from([
            ("Filter", PDFObject::name("FlateDecode")),
            (
                "DecodeParms",
                PDFObject::Dict(dict_from([
                    ("Predictor", PDFObject::Int(12)),
                    ("Columns", PDFObject::Int(2)),
                ])),
            ),
        ]);
        assert_eq!(apply_filters(&encoded, &chain_of(&attrs)), vec![1, 2, 2, 3]);
    }

    #[test]
    fn unsupported_predictor_keeps_filter_output() {
        let encoded = flate::flateencode(b"abc");
        let attrs = dict_from([
            ("Filter", PDFObject::name("FlateDecode")),
            (
                "DecodeParms",
                PDFObject::Dict(dict_from([("Predictor", PDFObject::Int(2))])),
            ),
        ]);
        assert_eq!(apply_filters(&encoded, &chain_of(&attrs)), b"abc");
    }

    #[test]
    fn abbreviations_map_to_same_filter() {
        assert_eq!(Filter::from_name(b"AHx"), Filter::AsciiHex);
        assert_eq!(Filter::from_name(b"Fl"), Filter::Flate);
        assert!(Filter::from_name(b"DCTDecode").is_image_codec());
    }
}
