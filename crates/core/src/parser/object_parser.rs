//! PDF object parser - turns tokens into [`PDFObject`]s.
//!
//! Indirect references (`N G R`) and definitions (`N G obj`) are told
//! apart from plain numbers with a three-token lookahead. Stream payloads
//! are bounded by `Length` when it can be trusted and by a scan for
//! `endstream` otherwise.

use super::lexer::{Keyword, Lexer, Token};
use crate::document::xref::{XRef, XRefEntry};
use crate::error::{PdfError, Result};
use crate::model::objects::{DictExt, PDFDict, PDFObjRef, PDFObject, PDFStream};
use tracing::debug;

/// Resolves an indirect `Length` while a stream is being parsed.
///
/// Returning `None` makes the parser fall back to scanning for
/// `endstream`.
pub trait LengthResolver {
    fn resolve_length(&self, objref: PDFObjRef) -> Option<i64>;
}

/// A top-level item read by [`ObjectParser::next`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedItem {
    /// A direct object.
    Object(PDFObject),
    /// An `N G obj ... endobj` definition.
    Indirect {
        objid: u32,
        genno: u16,
        value: PDFObject,
    },
    /// A cross-reference table: a classic `xref` section with its trailer,
    /// or an indirect stream whose dictionary says `/Type /XRef`.
    XRef(XRef),
}

pub struct ObjectParser<'a> {
    lexer: Lexer<'a>,
    /// Pushed-back tokens, last pushed is next out
    lookahead: Vec<(usize, Token)>,
    resolver: Option<&'a dyn LengthResolver>,
}

impl<'a> ObjectParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            lexer: Lexer::new(data),
            lookahead: Vec::new(),
            resolver: None,
        }
    }

    /// Attach a resolver for indirect stream lengths.
    pub fn with_resolver(mut self, resolver: &'a dyn LengthResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Reposition the parser and drop the lookahead.
    pub fn seek(&mut self, pos: usize) {
        self.lookahead.clear();
        self.lexer.seek(pos);
    }

    /// Position of the next unread token.
    pub fn tell(&self) -> usize {
        self.lookahead
            .last()
            .map_or(self.lexer.tell(), |(pos, _)| *pos)
    }

    fn next_token(&mut self) -> Result<Option<(usize, Token)>> {
        if let Some(tok) = self.lookahead.pop() {
            return Ok(Some(tok));
        }
        self.lexer.next_token().transpose()
    }

    fn expect_token(&mut self) -> Result<(usize, Token)> {
        self.next_token()?.ok_or(PdfError::UnexpectedEof)
    }

    fn push_back(&mut self, tok: (usize, Token)) {
        self.lookahead.push(tok);
    }

    /// Read the next top-level item.
    pub fn next(&mut self) -> Result<ParsedItem> {
        let (pos, token) = self.expect_token()?;
        match token {
            Token::Int(n) => match self.number_pair_keyword(n)? {
                Some((genno, Keyword::R)) => Ok(ParsedItem::Object(make_ref(n, genno))),
                Some((genno, _)) => self.parse_indirect_body(n, genno),
                None => Ok(ParsedItem::Object(PDFObject::Int(n))),
            },
            Token::Keyword(Keyword::Xref) => Ok(ParsedItem::XRef(self.parse_xref_section()?)),
            other => Ok(ParsedItem::Object(self.token_to_object(pos, other)?)),
        }
    }

    /// Read the next direct object.
    pub fn next_object(&mut self) -> Result<PDFObject> {
        let (pos, token) = self.expect_token()?;
        self.token_to_object(pos, token)
    }

    /// Parse the indirect object whose header starts at `pos`.
    pub fn parse_indirect_at(&mut self, pos: usize) -> Result<(u32, u16, PDFObject)> {
        self.seek(pos);
        match self.next()? {
            ParsedItem::Indirect {
                objid,
                genno,
                value,
            } => Ok((objid, genno, value)),
            ParsedItem::XRef(_) => Err(PdfError::SyntaxError(format!(
                "xref data where an object was expected at {pos}"
            ))),
            ParsedItem::Object(_) => Err(PdfError::SyntaxError(format!(
                "no object header at {pos}"
            ))),
        }
    }

    /// After an integer `n`, look for `G R` or `G obj`. On a miss every
    /// peeked token is pushed back.
    fn number_pair_keyword(&mut self, n: i64) -> Result<Option<(i64, Keyword)>> {
        let Some(second) = self.next_token()? else {
            return Ok(None);
        };
        let Token::Int(genno) = second.1 else {
            self.push_back(second);
            return Ok(None);
        };
        let Some(third) = self.next_token()? else {
            self.push_back(second);
            return Ok(None);
        };
        let valid_ids = u32::try_from(n).is_ok() && u16::try_from(genno).is_ok();
        match &third.1 {
            Token::Keyword(kw @ (Keyword::R | Keyword::Obj)) if valid_ids => {
                Ok(Some((genno, kw.clone())))
            }
            _ => {
                self.push_back(third);
                self.push_back(second);
                Ok(None)
            }
        }
    }

    fn token_to_object(&mut self, pos: usize, token: Token) -> Result<PDFObject> {
        match token {
            Token::Int(n) => match self.number_pair_keyword(n)? {
                Some((genno, Keyword::R)) => Ok(make_ref(n, genno)),
                Some((_, _)) => Err(PdfError::SyntaxError(format!(
                    "object definition nested inside an object at {pos}"
                ))),
                None => Ok(PDFObject::Int(n)),
            },
            Token::Real(n) => Ok(PDFObject::Real(n)),
            Token::Name(s) => Ok(PDFObject::Name(s)),
            Token::String(s) => Ok(PDFObject::String(s)),
            Token::Keyword(Keyword::Null) => Ok(PDFObject::Null),
            Token::Keyword(Keyword::True) => Ok(PDFObject::Bool(true)),
            Token::Keyword(Keyword::False) => Ok(PDFObject::Bool(false)),
            Token::Keyword(Keyword::ArrayStart) => self.parse_array(),
            Token::Keyword(Keyword::DictStart) => self.parse_dict().map(PDFObject::Dict),
            Token::Keyword(kw) => Err(PdfError::TokenError {
                pos,
                msg: format!("unexpected keyword: {}", String::from_utf8_lossy(kw.as_bytes())),
            }),
        }
    }

    fn parse_array(&mut self) -> Result<PDFObject> {
        let mut arr = Vec::new();
        loop {
            let (pos, token) = self.expect_token()?;
            if token == Token::Keyword(Keyword::ArrayEnd) {
                break;
            }
            arr.push(self.token_to_object(pos, token)?);
        }
        Ok(PDFObject::Array(arr))
    }

    fn parse_dict(&mut self) -> Result<PDFDict> {
        let mut dict = PDFDict::new();
        loop {
            let (pos, token) = self.expect_token()?;
            let key = match token {
                Token::Keyword(Keyword::DictEnd) => break,
                Token::Name(name) => name,
                other => {
                    return Err(PdfError::SyntaxError(format!(
                        "dictionary key at {pos} is not a name: {other:?}"
                    )));
                }
            };
            let value = self.next_object()?;
            // A null value is the same as an absent key
            if !value.is_null() {
                dict.insert(key, value);
            }
        }
        Ok(dict)
    }

    fn parse_indirect_body(&mut self, objid: i64, genno: i64) -> Result<ParsedItem> {
        let objid = objid as u32;
        let genno = genno as u16;
        let mut value = self.next_object()?;

        match self.next_token()? {
            Some((pos, Token::Keyword(Keyword::Stream))) => {
                let PDFObject::Dict(attrs) = value else {
                    return Err(PdfError::SyntaxError(format!(
                        "stream keyword after non-dictionary in obj {objid}"
                    )));
                };
                let mut stream = self.parse_stream_body(attrs, pos + b"stream".len())?;
                stream.set_objid(objid, genno);
                self.skip_endobj()?;
                if stream.attrs.is_name("Type", "XRef") {
                    return Ok(ParsedItem::XRef(XRef::from_stream(&stream)?));
                }
                value = PDFObject::Stream(Box::new(stream));
            }
            Some((_, Token::Keyword(Keyword::EndObj))) | None => {}
            Some(other) => self.push_back(other),
        }

        Ok(ParsedItem::Indirect {
            objid,
            genno,
            value,
        })
    }

    fn skip_endobj(&mut self) -> Result<()> {
        match self.next_token()? {
            Some((_, Token::Keyword(Keyword::EndObj))) | None => Ok(()),
            Some(other) => {
                self.push_back(other);
                Ok(())
            }
        }
    }

    /// Read a stream payload starting right after the `stream` keyword.
    fn parse_stream_body(&mut self, attrs: PDFDict, after_keyword: usize) -> Result<PDFStream> {
        let data = self.lexer.data();
        let mut start = after_keyword;
        if data[start..].starts_with(b"\r\n") {
            start += 2;
        } else if data.get(start) == Some(&b'\n') {
            start += 1;
        }

        let declared = match attrs.get_key("Length") {
            Some(PDFObject::Int(n)) => Some(*n),
            Some(PDFObject::Ref(r)) => self.resolver.and_then(|res| res.resolve_length(*r)),
            _ => None,
        };

        let bounded = declared
            .and_then(|len| usize::try_from(len).ok())
            .and_then(|len| start.checked_add(len))
            .filter(|&end| end <= data.len() && ends_at_endstream(data, end));

        let (end, resume) = match bounded {
            Some(end) => {
                let mut after = end;
                while after < data.len() && super::lexer::is_whitespace(data[after]) {
                    after += 1;
                }
                (end, after + b"endstream".len())
            }
            None => {
                debug!(?declared, start, "stream length unusable, scanning for endstream");
                let found = find_subslice(&data[start..], b"endstream")
                    .map(|off| start + off)
                    .ok_or_else(|| PdfError::TokenError {
                        pos: start,
                        msg: "unterminated stream".into(),
                    })?;
                (trim_one_eol(data, start, found), found + b"endstream".len())
            }
        };

        self.seek(resume.min(data.len()));
        Ok(PDFStream::new(attrs, data[start..end].to_vec()))
    }

    /// Read a classic `xref` section (the `xref` keyword already consumed)
    /// and its `trailer` dictionary.
    pub fn parse_xref_section(&mut self) -> Result<XRef> {
        self.lookahead.clear();
        let mut xref = XRef::new();

        loop {
            let Some((line_pos, line)) = self.lexer.next_line() else {
                break;
            };
            let trimmed = line.trim_ascii();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with(b"trailer") {
                let indent = line.len() - line.trim_ascii_start().len();
                self.seek(line_pos + indent + b"trailer".len());
                break;
            }

            let mut fields = trimmed.split(|b| b.is_ascii_whitespace()).filter(|f| !f.is_empty());
            let (Some(start), Some(count), None) = (
                fields.next().and_then(parse_u64),
                fields.next().and_then(parse_u64),
                fields.next(),
            ) else {
                return Err(PdfError::SyntaxError(format!(
                    "malformed xref subsection header at {line_pos}"
                )));
            };

            let mut base = start;
            for i in 0..count {
                let Some((entry_pos, entry)) = self.lexer.next_line() else {
                    return Err(PdfError::UnexpectedEof);
                };
                let mut parts = entry.split(|b| b.is_ascii_whitespace()).filter(|f| !f.is_empty());
                let (Some(offset), Some(genno), Some(kind)) = (
                    parts.next().and_then(parse_u64),
                    parts.next().and_then(parse_u64),
                    parts.next(),
                ) else {
                    return Err(PdfError::SyntaxError(format!(
                        "malformed xref entry at {entry_pos}"
                    )));
                };
                // Subsections that claim to start at 1 but still list the
                // free head of object 0
                if i == 0 && base > 0 && kind == b"f" && offset == 0 && genno == 65535 {
                    base -= 1;
                }
                let objid = base.checked_add(i).and_then(|id| u32::try_from(id).ok());
                if kind == b"n"
                    && let Some(objid) = objid
                {
                    xref.insert(
                        objid,
                        XRefEntry::Direct {
                            offset: offset as usize,
                            genno: genno as u16,
                        },
                    );
                }
            }
        }

        match self.next_object() {
            Ok(PDFObject::Dict(trailer)) => xref.trailer = trailer,
            Ok(other) => {
                return Err(PdfError::SyntaxError(format!(
                    "trailer is a {}, not a dictionary",
                    other.type_name()
                )));
            }
            Err(PdfError::UnexpectedEof) => {}
            Err(err) => return Err(err),
        }
        Ok(xref)
    }
}

fn make_ref(objid: i64, genno: i64) -> PDFObject {
    PDFObject::Ref(PDFObjRef::new(objid as u32, genno as u16))
}

fn ends_at_endstream(data: &[u8], end: usize) -> bool {
    let rest = &data[end..];
    let skip = rest
        .iter()
        .take_while(|&&b| super::lexer::is_whitespace(b))
        .count();
    rest[skip..].starts_with(b"endstream")
}

/// Drop one EOL (CRLF, LF or CR) that precedes the `endstream` keyword.
fn trim_one_eol(data: &[u8], start: usize, end: usize) -> usize {
    let body = &data[start..end];
    if body.ends_with(b"\r\n") {
        end - 2
    } else if body.ends_with(b"\n") || body.ends_with(b"\r") {
        end - 1
    } else {
        end
    }
}

pub(crate) fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn parse_u64(field: &[u8]) -> Option<u64> {
    std::str::from_utf8(field).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &[u8]) -> PDFObject {
        ObjectParser::new(data).next_object().unwrap()
    }

    #[test]
    fn reference_versus_plain_numbers() {
        assert_eq!(parse(b"12 0 R"), PDFObject::Ref(PDFObjRef::new(12, 0)));
        assert_eq!(
            parse(b"[1 2 3 4 0 R]"),
            PDFObject::Array(vec![
                PDFObject::Int(1),
                PDFObject::Int(2),
                PDFObject::Int(3),
                PDFObject::Ref(PDFObjRef::new(4, 0)),
            ])
        );
        assert_eq!(
            parse(b"[1 2 /R]"),
            PDFObject::Array(vec![
                PDFObject::Int(1),
                PDFObject::Int(2),
                PDFObject::name("R"),
            ])
        );
    }

    #[test]
    fn nested_dict_and_values() {
        let obj = parse(b"<< /A true /B [null 1.5 (x)] /C << /D /E >> /N null >>");
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict.get_key("A"), Some(&PDFObject::Bool(true)));
        assert_eq!(
            dict.get_key("B"),
            Some(&PDFObject::Array(vec![
                PDFObject::Null,
                PDFObject::Real(1.5),
                PDFObject::String(b"x".to_vec()),
            ]))
        );
        assert!(dict.get_key("C").unwrap().as_dict().unwrap().is_name("D", "E"));
        assert!(dict.get_key("N").is_none());
    }

    #[test]
    fn non_name_key_is_syntax_error() {
        let err = ObjectParser::new(b"<< 1 2 >>").next_object().unwrap_err();
        assert!(matches!(err, PdfError::SyntaxError(_)));
    }

    #[test]
    fn unterminated_dict_is_eof() {
        let err = ObjectParser::new(b"<< /A 1").next_object().unwrap_err();
        assert!(matches!(err, PdfError::UnexpectedEof));
    }

    #[test]
    fn indirect_with_length_keeps_trailing_newline_out() {
        let data = b"7 0 obj\n<< /Length 5 >>\nstream\r\nhello\nendstream\nendobj";
        let (objid, genno, value) = ObjectParser::new(data).parse_indirect_at(0).unwrap();
        assert_eq!((objid, genno), (7, 0));
        let stream = value.as_stream().unwrap();
        assert_eq!(stream.get_rawdata(), b"hello");
        assert_eq!(stream.objid, Some(7));
    }

    #[test]
    fn wrong_length_falls_back_to_scan() {
        let data = b"1 0 obj << /Length 99 >> stream\nabc\r\nendstream endobj";
        let (_, _, value) = ObjectParser::new(data).parse_indirect_at(0).unwrap();
        assert_eq!(value.as_stream().unwrap().get_rawdata(), b"abc");
    }

    #[test]
    fn scan_trims_only_one_eol() {
        let data = b"1 0 obj << >> stream\nabc\n\nendstream endobj";
        let (_, _, value) = ObjectParser::new(data).parse_indirect_at(0).unwrap();
        assert_eq!(value.as_stream().unwrap().get_rawdata(), b"abc\n");
    }

    struct FixedLength(i64);

    impl LengthResolver for FixedLength {
        fn resolve_length(&self, _objref: PDFObjRef) -> Option<i64> {
            Some(self.0)
        }
    }

    #[test]
    fn indirect_length_uses_resolver() {
        let data = b"1 0 obj << /Length 2 0 R >> stream\nab\ncd\nendstream endobj";
        let resolver = FixedLength(5);
        let mut parser = ObjectParser::new(data).with_resolver(&resolver);
        let (_, _, value) = parser.parse_indirect_at(0).unwrap();
        assert_eq!(value.as_stream().unwrap().get_rawdata(), b"ab\ncd");
    }

    #[test]
    fn classic_xref_section_with_trailer() {
        let data = b"xref\n0 3\n0000000000 65535 f \n0000000015 00000 n \n\
            0000000079 00001 n \ntrailer\n<< /Size 3 /Root 1 0 R >>\nstartxref";
        let ParsedItem::XRef(xref) = ObjectParser::new(data).next().unwrap() else {
            panic!("expected xref");
        };
        assert_eq!(xref.get(0), None);
        assert_eq!(xref.get(1), Some(&XRefEntry::Direct { offset: 15, genno: 0 }));
        assert_eq!(xref.get(2), Some(&XRefEntry::Direct { offset: 79, genno: 1 }));
        assert!(xref.has_root());
    }

    #[test]
    fn xref_subsection_off_by_one() {
        let data = b"xref\n1 2\n0000000000 65535 f \n0000000020 00000 n \ntrailer << >>";
        let ParsedItem::XRef(xref) = ObjectParser::new(data).next().unwrap() else {
            panic!("expected xref");
        };
        assert_eq!(xref.get(1), Some(&XRefEntry::Direct { offset: 20, genno: 0 }));
    }

    #[test]
    fn subsection_past_object_numbers_is_dropped() {
        let data = b"xref\n4294967295 2\n0000000010 00000 n \n0000000020 00000 n \n\
            2 1\n0000000030 00000 n \ntrailer << >>";
        let ParsedItem::XRef(xref) = ObjectParser::new(data).next().unwrap() else {
            panic!("expected xref");
        };
        assert_eq!(xref.get(u32::MAX), Some(&XRefEntry::Direct { offset: 10, genno: 0 }));
        assert_eq!(xref.get(0), None);
        assert_eq!(xref.get(2), Some(&XRefEntry::Direct { offset: 30, genno: 0 }));
        assert_eq!(xref.len(), 2);
    }

    #[test]
    fn xref_stream_object_becomes_table() {
        let rows = [1u8, 0, 9, 0];
        let mut body = b"5 0 obj << /Type /XRef /W [1 2 1] /Size 1 /Index [3 1] /Length 4 /Root 1 0 R >> stream\n".to_vec();
        body.extend_from_slice(&rows);
        body.extend_from_slice(b"\nendstream\nendobj");
        let ParsedItem::XRef(xref) = ObjectParser::new(&body).next().unwrap() else {
            panic!("expected xref");
        };
        assert_eq!(xref.get(3), Some(&XRefEntry::Direct { offset: 9, genno: 0 }));
        assert!(xref.has_root());
    }
}
