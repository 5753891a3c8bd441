//! Content stream tokenizer.
//!
//! Groups lexer tokens into operands (arrays and dictionaries built up
//! front), operators, and inline images whose binary payload is cut out
//! of the stream directly.

use crate::error::{PdfError, Result};
use crate::model::objects::{PDFDict, PDFObject};
use crate::parser::lexer::{Keyword, Lexer, Token, is_whitespace};
use crate::parser::object_parser::find_subslice;
use tracing::debug;

/// Item produced by [`ContentParser`].
#[derive(Debug, Clone, PartialEq)]
pub enum ContentToken {
    Operand(PDFObject),
    Operator(Keyword),
    /// `BI ... ID <data> EI`, keys as written (abbreviations kept)
    InlineImage { dict: PDFDict, data: Vec<u8> },
}

/// Concatenate content parts the way a page with several `Contents`
/// streams is read: as one stream with a newline between parts.
pub fn join_parts<T: AsRef<[u8]>>(parts: &[T]) -> Vec<u8> {
    let mut joined = Vec::with_capacity(parts.iter().map(|p| p.as_ref().len() + 1).sum());
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            joined.push(b'\n');
        }
        joined.extend_from_slice(part.as_ref());
    }
    joined
}

enum Frame {
    Array(Vec<PDFObject>),
    Dict(Vec<PDFObject>),
}

/// Tokenizer over one (joined) content stream.
pub struct ContentParser<'a> {
    lexer: Lexer<'a>,
    frames: Vec<Frame>,
}

impl<'a> ContentParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            lexer: Lexer::new(data),
            frames: Vec::new(),
        }
    }

    /// Push a finished value into the innermost frame, or hand it out.
    fn emit(&mut self, obj: PDFObject) -> Option<PDFObject> {
        match self.frames.last_mut() {
            Some(Frame::Array(items) | Frame::Dict(items)) => {
                items.push(obj);
                None
            }
            None => Some(obj),
        }
    }

    fn next_token(&mut self) -> Option<Result<ContentToken>> {
        loop {
            let (pos, token) = match self.lexer.next_token()? {
                Ok(t) => t,
                Err(err) => return Some(Err(err)),
            };
            let obj = match token {
                Token::Int(n) => PDFObject::Int(n),
                Token::Real(n) => PDFObject::Real(n),
                Token::String(s) => PDFObject::String(s),
                Token::Name(n) => PDFObject::Name(n),
                Token::Keyword(Keyword::True) => PDFObject::Bool(true),
                Token::Keyword(Keyword::False) => PDFObject::Bool(false),
                Token::Keyword(Keyword::Null) => PDFObject::Null,
                Token::Keyword(Keyword::ArrayStart) => {
                    self.frames.push(Frame::Array(Vec::new()));
                    continue;
                }
                Token::Keyword(Keyword::DictStart) => {
                    self.frames.push(Frame::Dict(Vec::new()));
                    continue;
                }
                Token::Keyword(Keyword::ArrayEnd) => match self.frames.pop() {
                    Some(Frame::Array(items)) => PDFObject::Array(items),
                    _ => {
                        return Some(Err(PdfError::TokenError {
                            pos,
                            msg: "unbalanced ]".to_string(),
                        }));
                    }
                },
                Token::Keyword(Keyword::DictEnd) => match self.frames.pop() {
                    Some(Frame::Dict(items)) => PDFObject::Dict(pairs_to_dict(items)),
                    _ => {
                        return Some(Err(PdfError::TokenError {
                            pos,
                            msg: "unbalanced >>".to_string(),
                        }));
                    }
                },
                Token::Keyword(Keyword::BI) if self.frames.is_empty() => {
                    return Some(self.inline_image());
                }
                Token::Keyword(kw) => {
                    if self.frames.is_empty() {
                        return Some(Ok(ContentToken::Operator(kw)));
                    }
                    debug!(pos, keyword = ?kw, "keyword inside array or dict dropped");
                    continue;
                }
            };
            if let Some(obj) = self.emit(obj) {
                return Some(Ok(ContentToken::Operand(obj)));
            }
        }
    }

    /// Called right after `BI`.
    fn inline_image(&mut self) -> Result<ContentToken> {
        let mut items = Vec::new();
        loop {
            match self.next_token() {
                Some(Ok(ContentToken::Operand(obj))) => items.push(obj),
                Some(Ok(ContentToken::Operator(Keyword::ID))) => break,
                Some(Ok(other)) => {
                    return Err(PdfError::SyntaxError(format!(
                        "unexpected {other:?} in inline image dictionary"
                    )));
                }
                Some(Err(err)) => return Err(err),
                None => return Err(PdfError::UnexpectedEof),
            }
        }
        let dict = pairs_to_dict(items);

        let data = self.lexer.data();
        let mut start = self.lexer.tell();
        if data.get(start).copied().is_some_and(is_whitespace) {
            start += 1;
        }
        let end = find_inline_end(&data[start..])
            .map(|offset| start + offset)
            .ok_or(PdfError::UnexpectedEof)?;
        let mut payload_end = end;
        if payload_end > start && is_whitespace(data[payload_end - 1]) {
            payload_end -= 1;
        }
        self.lexer.seek(end + 2);
        Ok(ContentToken::InlineImage {
            dict,
            data: data[start..payload_end].to_vec(),
        })
    }
}

/// Offset of the `EI` that ends an inline image: followed by whitespace
/// or the end of the stream.
fn find_inline_end(data: &[u8]) -> Option<usize> {
    let mut from = 0;
    while let Some(offset) = find_subslice(&data[from..], b"EI") {
        let at = from + offset;
        match data.get(at + 2) {
            None => return Some(at),
            Some(&b) if is_whitespace(b) => return Some(at),
            Some(_) => from = at + 1,
        }
    }
    None
}

fn pairs_to_dict(items: Vec<PDFObject>) -> PDFDict {
    let mut dict = PDFDict::new();
    let mut iter = items.into_iter();
    while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
        match key {
            PDFObject::Name(name) => {
                dict.insert(name, value);
            }
            other => debug!(key = other.type_name(), "non-name dictionary key skipped"),
        }
    }
    dict
}

impl Iterator for ContentParser<'_> {
    type Item = Result<ContentToken>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::objects::DictExt;

    fn tokens(data: &[u8]) -> Vec<ContentToken> {
        ContentParser::new(data).collect::<Result<_>>().unwrap()
    }

    #[test]
    fn operands_then_operator() {
        let toks = tokens(b"BT /F1 12 Tf [(A) -120 (B)] TJ ET");
        assert_eq!(toks[0], ContentToken::Operator(Keyword::BT));
        assert_eq!(toks[1], ContentToken::Operand(PDFObject::name("F1")));
        assert_eq!(toks[3], ContentToken::Operator(Keyword::Tf));
        assert_eq!(
            toks[4],
            ContentToken::Operand(PDFObject::Array(vec![
                PDFObject::String(b"A".to_vec()),
                PDFObject::Int(-120),
                PDFObject::String(b"B".to_vec()),
            ]))
        );
        assert_eq!(toks.len(), 7);
    }

    #[test]
    fn marked_content_properties() {
        let toks = tokens(b"/Span <</ActualText (x) /MCID 3>> BDC EMC");
        let ContentToken::Operand(PDFObject::Dict(props)) = &toks[1] else {
            panic!("expected dict, got {:?}", toks[1]);
        };
        assert_eq!(props.get_key("MCID"), Some(&PDFObject::Int(3)));
    }

    #[test]
    fn inline_image_payload() {
        let toks = tokens(b"q BI /W 2 /H 1 /CS /G /BPC 8 ID \x00EI\xff\nEI Q");
        assert_eq!(toks[0], ContentToken::Operator(Keyword::Qq));
        let ContentToken::InlineImage { dict, data } = &toks[1] else {
            panic!("expected inline image, got {:?}", toks[1]);
        };
        assert_eq!(dict.get_key("W"), Some(&PDFObject::Int(2)));
        // `EI` followed by a non-whitespace byte is part of the data
        assert_eq!(data, b"\x00EI\xff");
        assert_eq!(toks[2], ContentToken::Operator(Keyword::Q));
    }

    #[test]
    fn inline_image_at_end_of_stream() {
        let toks = tokens(b"BI /W 1 /H 1 ID abcEI");
        assert!(matches!(&toks[0], ContentToken::InlineImage { data, .. } if data == b"abc"));
    }

    #[test]
    fn unterminated_inline_image() {
        let result: Result<Vec<_>> = ContentParser::new(b"BI /W 1 ID abc").collect();
        assert!(matches!(result, Err(PdfError::UnexpectedEof)));
    }

    #[test]
    fn parts_are_newline_separated() {
        assert_eq!(join_parts(&[b"q".as_slice(), b"Q"]), b"q\nQ");
    }
}
