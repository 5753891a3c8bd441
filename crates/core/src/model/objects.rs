//! PDF object types.
//!
//! Names and dictionary keys are kept as raw bytes: `#xx` escapes can put
//! arbitrary bytes into a name, so they are never decoded as text here.

use crate::error::{PdfError, Result};
use bytes::Bytes;
use indexmap::IndexMap;
use std::sync::OnceLock;

/// Dictionary of name -> object. Insertion order is kept so dumps match
/// the file.
pub type PDFDict = IndexMap<Vec<u8>, PDFObject>;

/// PDF Object types - the fundamental value type in PDF.
#[derive(Debug, Clone, PartialEq)]
pub enum PDFObject {
    /// Null object
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Real (floating point) value
    Real(f64),
    /// Name object (e.g., /Type, /Font), raw bytes after `#xx` unescaping
    Name(Vec<u8>),
    /// String (byte array)
    String(Vec<u8>),
    /// Array of objects
    Array(Vec<Self>),
    /// Dictionary (name -> object mapping)
    Dict(PDFDict),
    /// Stream (dictionary + binary data)
    Stream(Box<PDFStream>),
    /// Indirect object reference
    Ref(PDFObjRef),
}

impl PDFObject {
    /// Build a name object from a str.
    pub fn name(s: &str) -> Self {
        Self::Name(s.as_bytes().to_vec())
    }

    /// Check if this is a null object
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get as boolean
    pub const fn as_bool(&self) -> Result<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            _ => Err(PdfError::TypeError {
                expected: "bool",
                got: self.type_name(),
            }),
        }
    }

    /// Get as integer
    pub const fn as_int(&self) -> Result<i64> {
        match self {
            Self::Int(n) => Ok(*n),
            _ => Err(PdfError::TypeError {
                expected: "int",
                got: self.type_name(),
            }),
        }
    }

    /// Get numeric value (int or real coerced to f64)
    pub const fn as_num(&self) -> Result<f64> {
        match self {
            Self::Int(n) => Ok(*n as f64),
            Self::Real(n) => Ok(*n),
            _ => Err(PdfError::TypeError {
                expected: "number",
                got: self.type_name(),
            }),
        }
    }

    /// Get as raw name bytes
    pub fn as_name(&self) -> Result<&[u8]> {
        match self {
            Self::Name(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "name",
                got: self.type_name(),
            }),
        }
    }

    /// Name decoded lossily as text, for display and lookups by str.
    pub fn name_str(&self) -> Option<String> {
        match self {
            Self::Name(s) => Some(String::from_utf8_lossy(s).into_owned()),
            _ => None,
        }
    }

    /// Whether this is the name `expected`.
    pub fn is_name(&self, expected: &str) -> bool {
        matches!(self, Self::Name(s) if s.as_slice() == expected.as_bytes())
    }

    /// Get as byte string
    pub fn as_string(&self) -> Result<&[u8]> {
        match self {
            Self::String(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "string",
                got: self.type_name(),
            }),
        }
    }

    /// Get as array
    pub const fn as_array(&self) -> Result<&Vec<Self>> {
        match self {
            Self::Array(arr) => Ok(arr),
            _ => Err(PdfError::TypeError {
                expected: "array",
                got: self.type_name(),
            }),
        }
    }

    /// Get as dictionary. A stream answers with its attribute dict.
    pub fn as_dict(&self) -> Result<&PDFDict> {
        match self {
            Self::Dict(d) => Ok(d),
            Self::Stream(s) => Ok(&s.attrs),
            _ => Err(PdfError::TypeError {
                expected: "dict",
                got: self.type_name(),
            }),
        }
    }

    /// Get as stream
    pub fn as_stream(&self) -> Result<&PDFStream> {
        match self {
            Self::Stream(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "stream",
                got: self.type_name(),
            }),
        }
    }

    /// Get as object reference
    pub const fn as_objref(&self) -> Result<&PDFObjRef> {
        match self {
            Self::Ref(r) => Ok(r),
            _ => Err(PdfError::TypeError {
                expected: "ref",
                got: self.type_name(),
            }),
        }
    }

    /// Get type name for error messages
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Real(_) => "real",
            Self::Name(_) => "name",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Dict(_) => "dict",
            Self::Stream(_) => "stream",
            Self::Ref(_) => "ref",
        }
    }
}

/// Lookup helpers for byte-keyed dictionaries.
pub trait DictExt {
    /// Get an entry by textual key.
    fn get_key(&self, key: &str) -> Option<&PDFObject>;

    /// Get the first present entry of several aliases (e.g. `Filter`/`F`).
    fn get_any(&self, keys: &[&str]) -> Option<&PDFObject> {
        keys.iter().find_map(|k| self.get_key(k))
    }

    /// Whether entry `key` is the name `value`.
    fn is_name(&self, key: &str, value: &str) -> bool {
        self.get_key(key).is_some_and(|v| v.is_name(value))
    }
}

impl DictExt for PDFDict {
    fn get_key(&self, key: &str) -> Option<&PDFObject> {
        self.get(key.as_bytes())
    }
}

/// PDF indirect object reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PDFObjRef {
    /// Object ID
    pub objid: u32,
    /// Generation number
    pub genno: u16,
}

impl PDFObjRef {
    /// Create a new object reference.
    pub const fn new(objid: u32, genno: u16) -> Self {
        Self { objid, genno }
    }
}

/// PDF Stream - dictionary attributes + binary data.
///
/// The decoded payload is memoized on first access through
/// [`PDFDocument::decode_stream`](crate::document::catalog::PDFDocument::decode_stream).
#[derive(Debug, Clone, PartialEq)]
pub struct PDFStream {
    /// Stream dictionary attributes
    pub attrs: PDFDict,
    /// Raw (possibly encoded) data, decrypted once resolved through a document
    rawdata: Bytes,
    pub(crate) decoded: OnceLock<Vec<u8>>,
    /// Object ID (set when stream is part of document)
    pub objid: Option<u32>,
    /// Generation number
    pub genno: Option<u16>,
}

impl PDFStream {
    /// Create a new stream.
    pub fn new(attrs: PDFDict, rawdata: impl Into<Bytes>) -> Self {
        Self {
            attrs,
            rawdata: rawdata.into(),
            decoded: OnceLock::new(),
            objid: None,
            genno: None,
        }
    }

    /// Set object ID and generation number.
    pub const fn set_objid(&mut self, objid: u32, genno: u16) {
        self.objid = Some(objid);
        self.genno = Some(genno);
    }

    /// Get raw (undecoded) data.
    pub fn get_rawdata(&self) -> &[u8] {
        self.rawdata.as_ref()
    }

    /// Replace rawdata, dropping any memoized decode.
    pub fn set_rawdata(&mut self, data: Vec<u8>) {
        self.rawdata = Bytes::from(data);
        self.decoded = OnceLock::new();
    }

    /// Decoded payload, if it has already been computed.
    pub fn decoded(&self) -> Option<&[u8]> {
        self.decoded.get().map(Vec::as_slice)
    }

    /// Get attribute by name.
    pub fn get(&self, name: &str) -> Option<&PDFObject> {
        self.attrs.get_key(name)
    }

    /// Get attribute, trying multiple names.
    pub fn get_any(&self, names: &[&str]) -> Option<&PDFObject> {
        self.attrs.get_any(names)
    }
}

/// Build a [`PDFDict`] from `(&str, PDFObject)` pairs.
pub fn dict_from<I>(entries: I) -> PDFDict
where
    I: IntoIterator<Item = (&'static str, PDFObject)>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.as_bytes().to_vec(), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dict_lookup_by_str_key() {
        let dict = dict_from([("Type", PDFObject::name("Page")), ("Rotate", PDFObject::Int(90))]);
        assert!(dict.is_name("Type", "Page"));
        assert_eq!(dict.get_key("Rotate").unwrap().as_int().unwrap(), 90);
        assert!(dict.get_key("MediaBox").is_none());
    }

    #[test]
    fn stream_answers_as_dict() {
        let stream = PDFStream::new(dict_from([("Length", PDFObject::Int(3))]), b"abc".to_vec());
        let obj = PDFObject::Stream(Box::new(stream));
        assert!(obj.as_dict().unwrap().get_key("Length").is_some());
        assert!(obj.as_array().is_err());
    }

    #[test]
    fn binary_names_round_trip_unchanged() {
        let obj = PDFObject::Name(vec![0xff, b'A']);
        assert_eq!(obj.as_name().unwrap(), &[0xff, b'A']);
        assert!(!obj.is_name("A"));
    }
}
