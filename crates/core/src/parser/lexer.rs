//! PDF tokenizer.
//!
//! Turns a byte buffer into [`Token`]s. The lexer is a cursor over a
//! borrowed slice; [`Lexer::seek`] repositions it and drops any state
//! belonging to the previous position.

use crate::error::{PdfError, Result};

/// PDF keyword enum. Known operators are zero-allocation variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Structural
    ArrayStart, // [
    ArrayEnd,   // ]
    DictStart,  // <<
    DictEnd,    // >>
    BraceOpen,  // {
    BraceClose, // }

    // Primitives
    True,
    False,
    Null,

    // Object structure
    Obj,
    EndObj,
    R,
    Stream,
    EndStream,
    Xref,
    Trailer,
    StartXref,

    // Graphics state
    Q,  // restore (uppercase Q)
    Qq, // save (lowercase q)
    Cm,
    Ww, // line width (lowercase w)
    J,  // line cap (uppercase J)
    Jj, // line join (lowercase j)
    M,
    D,
    Ri,
    I,
    Gs,

    // Path construction
    Mm, // moveto (lowercase m)
    L,
    C,
    V,
    Y,
    H,
    Re,

    // Path painting
    S,      // stroke (uppercase)
    Ss,     // close+stroke (lowercase s)
    F,      // fill (uppercase, obsolete)
    Ff,     // fill (lowercase f)
    FStar,  // f*
    B,      // fill+stroke
    BStar,  // B*
    Bb,     // close+fill+stroke (lowercase b)
    BbStar, // b*
    N,

    // Clipping
    WClip, // W
    WStar, // W*

    // Text object
    BT,
    ET,

    // Text state
    Tc,
    Tw,
    Tz,
    TL,
    Tf,
    Tr,
    Ts,

    // Text positioning
    Td,
    TD,
    Tm,
    TStar, // T*

    // Text showing
    Tj,
    TJ,
    Quote,       // '
    DoubleQuote, // "

    // Color
    CS,
    Cs,
    SC,
    SCN,
    Sc,
    Scn,
    G,
    Gg,
    RG,
    Rg,
    K,
    Kk,

    // XObject
    Do,

    // Inline image
    BI,
    ID,
    EI,

    // Marked content
    MP,
    DP,
    BMC,
    BDC,
    EMC,

    // Shading, Type3 glyph metrics, compatibility
    Sh,
    D0,
    D1,
    BX,
    EX,

    // CMap structure
    BeginCMap,
    EndCMap,
    UseCMap,
    BeginCodeSpaceRange,
    EndCodeSpaceRange,
    BeginBfChar,
    EndBfChar,
    BeginBfRange,
    EndBfRange,
    BeginCidChar,
    EndCidChar,
    BeginCidRange,
    EndCidRange,
    Def,

    // Unknown (preserves original bytes)
    Unknown(Vec<u8>),
}

impl Keyword {
    pub fn from_bytes(b: &[u8]) -> Self {
        match b {
            b"[" => Keyword::ArrayStart,
            b"]" => Keyword::ArrayEnd,
            b"<<" => Keyword::DictStart,
            b">>" => Keyword::DictEnd,
            b"{" => Keyword::BraceOpen,
            b"}" => Keyword::BraceClose,

            b"true" => Keyword::True,
            b"false" => Keyword::False,
            b"null" => Keyword::Null,

            b"obj" => Keyword::Obj,
            b"endobj" => Keyword::EndObj,
            b"R" => Keyword::R,
            b"stream" => Keyword::Stream,
            b"endstream" => Keyword::EndStream,
            b"xref" => Keyword::Xref,
            b"trailer" => Keyword::Trailer,
            b"startxref" => Keyword::StartXref,

            b"Q" => Keyword::Q,
            b"q" => Keyword::Qq,
            b"cm" => Keyword::Cm,
            b"w" => Keyword::Ww,
            b"J" => Keyword::J,
            b"j" => Keyword::Jj,
            b"M" => Keyword::M,
            b"d" => Keyword::D,
            b"ri" => Keyword::Ri,
            b"i" => Keyword::I,
            b"gs" => Keyword::Gs,

            b"m" => Keyword::Mm,
            b"l" => Keyword::L,
            b"c" => Keyword::C,
            b"v" => Keyword::V,
            b"y" => Keyword::Y,
            b"h" => Keyword::H,
            b"re" => Keyword::Re,

            b"S" => Keyword::S,
            b"s" => Keyword::Ss,
            b"F" => Keyword::F,
            b"f" => Keyword::Ff,
            b"f*" => Keyword::FStar,
            b"B" => Keyword::B,
            b"B*" => Keyword::BStar,
            b"b" => Keyword::Bb,
            b"b*" => Keyword::BbStar,
            b"n" => Keyword::N,

            b"W" => Keyword::WClip,
            b"W*" => Keyword::WStar,

            b"BT" => Keyword::BT,
            b"ET" => Keyword::ET,

            b"Tc" => Keyword::Tc,
            b"Tw" => Keyword::Tw,
            b"Tz" => Keyword::Tz,
            b"TL" => Keyword::TL,
            b"Tf" => Keyword::Tf,
            b"Tr" => Keyword::Tr,
            b"Ts" => Keyword::Ts,

            b"Td" => Keyword::Td,
            b"TD" => Keyword::TD,
            b"Tm" => Keyword::Tm,
            b"T*" => Keyword::TStar,

            b"Tj" => Keyword::Tj,
            b"TJ" => Keyword::TJ,
            b"'" => Keyword::Quote,
            b"\"" => Keyword::DoubleQuote,

            b"CS" => Keyword::CS,
            b"cs" => Keyword::Cs,
            b"SC" => Keyword::SC,
            b"SCN" => Keyword::SCN,
            b"sc" => Keyword::Sc,
            b"scn" => Keyword::Scn,
            b"G" => Keyword::G,
            b"g" => Keyword::Gg,
            b"RG" => Keyword::RG,
            b"rg" => Keyword::Rg,
            b"K" => Keyword::K,
            b"k" => Keyword::Kk,

            b"Do" => Keyword::Do,

            b"BI" => Keyword::BI,
            b"ID" => Keyword::ID,
            b"EI" => Keyword::EI,

            b"MP" => Keyword::MP,
            b"DP" => Keyword::DP,
            b"BMC" => Keyword::BMC,
            b"BDC" => Keyword::BDC,
            b"EMC" => Keyword::EMC,

            b"sh" => Keyword::Sh,
            b"d0" => Keyword::D0,
            b"d1" => Keyword::D1,
            b"BX" => Keyword::BX,
            b"EX" => Keyword::EX,

            b"begincmap" => Keyword::BeginCMap,
            b"endcmap" => Keyword::EndCMap,
            b"usecmap" => Keyword::UseCMap,
            b"begincodespacerange" => Keyword::BeginCodeSpaceRange,
            b"endcodespacerange" => Keyword::EndCodeSpaceRange,
            b"beginbfchar" => Keyword::BeginBfChar,
            b"endbfchar" => Keyword::EndBfChar,
            b"beginbfrange" => Keyword::BeginBfRange,
            b"endbfrange" => Keyword::EndBfRange,
            b"begincidchar" => Keyword::BeginCidChar,
            b"endcidchar" => Keyword::EndCidChar,
            b"begincidrange" => Keyword::BeginCidRange,
            b"endcidrange" => Keyword::EndCidRange,
            b"def" => Keyword::Def,

            _ => Keyword::Unknown(b.to_vec()),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Keyword::ArrayStart => b"[",
            Keyword::ArrayEnd => b"]",
            Keyword::DictStart => b"<<",
            Keyword::DictEnd => b">>",
            Keyword::BraceOpen => b"{",
            Keyword::BraceClose => b"}",
            Keyword::True => b"true",
            Keyword::False => b"false",
            Keyword::Null => b"null",
            Keyword::Obj => b"obj",
            Keyword::EndObj => b"endobj",
            Keyword::R => b"R",
            Keyword::Stream => b"stream",
            Keyword::EndStream => b"endstream",
            Keyword::Xref => b"xref",
            Keyword::Trailer => b"trailer",
            Keyword::StartXref => b"startxref",
            Keyword::Q => b"Q",
            Keyword::Qq => b"q",
            Keyword::Cm => b"cm",
            Keyword::Ww => b"w",
            Keyword::J => b"J",
            Keyword::Jj => b"j",
            Keyword::M => b"M",
            Keyword::D => b"d",
            Keyword::Ri => b"ri",
            Keyword::I => b"i",
            Keyword::Gs => b"gs",
            Keyword::Mm => b"m",
            Keyword::L => b"l",
            Keyword::C => b"c",
            Keyword::V => b"v",
            Keyword::Y => b"y",
            Keyword::H => b"h",
            Keyword::Re => b"re",
            Keyword::S => b"S",
            Keyword::Ss => b"s",
            Keyword::F => b"F",
            Keyword::Ff => b"f",
            Keyword::FStar => b"f*",
            Keyword::B => b"B",
            Keyword::BStar => b"B*",
            Keyword::Bb => b"b",
            Keyword::BbStar => b"b*",
            Keyword::N => b"n",
            Keyword::WClip => b"W",
            Keyword::WStar => b"W*",
            Keyword::BT => b"BT",
            Keyword::ET => b"ET",
            Keyword::Tc => b"Tc",
            Keyword::Tw => b"Tw",
            Keyword::Tz => b"Tz",
            Keyword::TL => b"TL",
            Keyword::Tf => b"Tf",
            Keyword::Tr => b"Tr",
            Keyword::Ts => b"Ts",
            Keyword::Td => b"Td",
            Keyword::TD => b"TD",
            Keyword::Tm => b"Tm",
            Keyword::TStar => b"T*",
            Keyword::Tj => b"Tj",
            Keyword::TJ => b"TJ",
            Keyword::Quote => b"'",
            Keyword::DoubleQuote => b"\"",
            Keyword::CS => b"CS",
            Keyword::Cs => b"cs",
            Keyword::SC => b"SC",
            Keyword::SCN => b"SCN",
            Keyword::Sc => b"sc",
            Keyword::Scn => b"scn",
            Keyword::G => b"G",
            Keyword::Gg => b"g",
            Keyword::RG => b"RG",
            Keyword::Rg => b"rg",
            Keyword::K => b"K",
            Keyword::Kk => b"k",
            Keyword::Do => b"Do",
            Keyword::BI => b"BI",
            Keyword::ID => b"ID",
            Keyword::EI => b"EI",
            Keyword::MP => b"MP",
            Keyword::DP => b"DP",
            Keyword::BMC => b"BMC",
            Keyword::BDC => b"BDC",
            Keyword::EMC => b"EMC",
            Keyword::Sh => b"sh",
            Keyword::D0 => b"d0",
            Keyword::D1 => b"d1",
            Keyword::BX => b"BX",
            Keyword::EX => b"EX",
            Keyword::BeginCMap => b"begincmap",
            Keyword::EndCMap => b"endcmap",
            Keyword::UseCMap => b"usecmap",
            Keyword::BeginCodeSpaceRange => b"begincodespacerange",
            Keyword::EndCodeSpaceRange => b"endcodespacerange",
            Keyword::BeginBfChar => b"beginbfchar",
            Keyword::EndBfChar => b"endbfchar",
            Keyword::BeginBfRange => b"beginbfrange",
            Keyword::EndBfRange => b"endbfrange",
            Keyword::BeginCidChar => b"begincidchar",
            Keyword::EndCidChar => b"endcidchar",
            Keyword::BeginCidRange => b"begincidrange",
            Keyword::EndCidRange => b"endcidrange",
            Keyword::Def => b"def",
            Keyword::Unknown(bytes) => bytes,
        }
    }
}

/// Lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Integer value
    Int(i64),
    /// Floating point value
    Real(f64),
    /// Literal name (e.g., /Name), unescaped
    Name(Vec<u8>),
    /// String (literal or hex)
    String(Vec<u8>),
    /// Keyword/operator, including the structural `[ ] << >>`
    Keyword(Keyword),
}

#[inline]
pub(crate) fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x00' | b'\x0c')
}

#[inline]
pub(crate) fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

#[inline]
fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Tokenizer over a byte buffer.
pub struct Lexer<'a> {
    data: &'a [u8],
    pos: usize,
    /// Start of the most recently returned token
    token_pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            token_pos: 0,
        }
    }

    /// Underlying buffer.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Current position in stream
    pub fn tell(&self) -> usize {
        self.pos
    }

    /// Position of the most recently returned token.
    pub fn token_pos(&self) -> usize {
        self.token_pos
    }

    /// Reposition the cursor, discarding any in-flight token state.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
        self.token_pos = self.pos;
    }

    /// Get remaining unparsed data
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.data.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    /// Skip whitespace and `%` comments.
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b == b'%' {
                while let Some(c) = self.advance() {
                    if c == b'\r' || c == b'\n' {
                        break;
                    }
                }
                continue;
            }
            if !is_whitespace(b) {
                return;
            }
            self.pos += 1;
        }
    }

    /// Read one line starting at the cursor, returning it without its EOL.
    /// CR, LF and CRLF all end a line.
    pub fn next_line(&mut self) -> Option<(usize, &'a [u8])> {
        if self.pos >= self.data.len() {
            return None;
        }
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b'\r' || b == b'\n' {
                break;
            }
            self.pos += 1;
        }
        let line = &self.data[start..self.pos];
        if self.peek() == Some(b'\r') {
            self.pos += 1;
        }
        if self.peek() == Some(b'\n') {
            self.pos += 1;
        }
        Some((start, line))
    }

    /// Iterate lines backward from the end of the buffer, EOLs stripped.
    pub fn reversed_lines(&self) -> ReversedLines<'a> {
        ReversedLines {
            data: self.data,
            end: self.data.len(),
        }
    }

    fn parse_name(&mut self) -> Token {
        self.advance(); // Skip '/'
        let mut name = Vec::new();

        while let Some(b) = self.peek() {
            if is_whitespace(b) || is_delimiter(b) {
                break;
            }
            self.pos += 1;
            if b == b'#' {
                let hi = self.peek().and_then(hex_value);
                let lo = self.peek_at(1).and_then(hex_value);
                if let (Some(hi), Some(lo)) = (hi, lo) {
                    self.pos += 2;
                    name.push((hi << 4) | lo);
                    continue;
                }
            }
            name.push(b);
        }

        Token::Name(name)
    }

    fn parse_number(&mut self) -> Result<Token> {
        let start = self.pos;
        let mut has_dot = false;

        if matches!(self.peek(), Some(b'+') | Some(b'-')) {
            self.advance();
        }

        while let Some(b) = self.peek() {
            if b.is_ascii_digit() {
                self.advance();
            } else if b == b'.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        let raw = &self.data[start..self.pos];
        let s = std::str::from_utf8(raw).map_err(|_| PdfError::TokenError {
            pos: start,
            msg: "invalid number".into(),
        })?;

        if has_dot {
            // "-." and "+." alone read as zero
            let body = s.trim_start_matches(['+', '-']);
            if body == "." {
                return Ok(Token::Real(0.0));
            }
            let val: f64 = s.parse().map_err(|_| PdfError::TokenError {
                pos: start,
                msg: format!("invalid real: {s}"),
            })?;
            Ok(Token::Real(val))
        } else {
            match s.parse::<i64>() {
                Ok(val) => Ok(Token::Int(val)),
                // Out-of-range integers degrade to reals
                Err(_) => s.parse::<f64>().map(Token::Real).map_err(|_| PdfError::TokenError {
                    pos: start,
                    msg: format!("invalid int: {s}"),
                }),
            }
        }
    }

    fn parse_string(&mut self) -> Result<Token> {
        let start = self.pos;
        self.advance(); // Skip '('
        let mut result = Vec::new();
        let mut depth = 1;
        let unterminated = || PdfError::TokenError {
            pos: start,
            msg: "unterminated literal string".into(),
        };

        while depth > 0 {
            match self.advance() {
                Some(b'(') => {
                    depth += 1;
                    result.push(b'(');
                }
                Some(b')') => {
                    depth -= 1;
                    if depth > 0 {
                        result.push(b')');
                    }
                }
                Some(b'\\') => match self.advance() {
                    Some(b'n') => result.push(b'\n'),
                    Some(b'r') => result.push(b'\r'),
                    Some(b't') => result.push(b'\t'),
                    Some(b'b') => result.push(0x08),
                    Some(b'f') => result.push(0x0c),
                    Some(b'(') => result.push(b'('),
                    Some(b')') => result.push(b')'),
                    Some(b'\\') => result.push(b'\\'),
                    Some(b'\r') => {
                        if self.peek() == Some(b'\n') {
                            self.advance();
                        }
                    }
                    Some(b'\n') => {}
                    Some(c @ b'0'..=b'7') => {
                        let mut octal = u32::from(c - b'0');
                        for _ in 0..2 {
                            match self.peek() {
                                Some(d @ b'0'..=b'7') => {
                                    self.advance();
                                    octal = octal * 8 + u32::from(d - b'0');
                                }
                                _ => break,
                            }
                        }
                        result.push((octal & 0xFF) as u8);
                    }
                    // Unknown escape keeps the character
                    Some(c) => result.push(c),
                    None => return Err(unterminated()),
                },
                Some(c) => result.push(c),
                None => return Err(unterminated()),
            }
        }

        Ok(Token::String(result))
    }

    fn parse_hex_string(&mut self) -> Result<Token> {
        let start = self.pos;
        self.advance(); // Skip '<'
        let mut result = Vec::new();
        let mut pending: Option<u8> = None;

        loop {
            match self.advance() {
                Some(b'>') => break,
                Some(c) if is_whitespace(c) => {}
                Some(c) => {
                    let Some(nibble) = hex_value(c) else {
                        return Err(PdfError::TokenError {
                            pos: self.pos - 1,
                            msg: format!("invalid hex digit {:?}", c as char),
                        });
                    };
                    match pending.take() {
                        Some(high) => result.push((high << 4) | nibble),
                        None => pending = Some(nibble),
                    }
                }
                None => {
                    return Err(PdfError::TokenError {
                        pos: start,
                        msg: "unterminated hex string".into(),
                    });
                }
            }
        }

        if let Some(high) = pending {
            result.push(high << 4);
        }

        Ok(Token::String(result))
    }

    fn parse_keyword(&mut self) -> Token {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if is_whitespace(b) || is_delimiter(b) {
                break;
            }
            self.pos += 1;
        }
        // A stray delimiter such as ')' still has to make progress
        if self.pos == start {
            self.pos += 1;
        }
        Token::Keyword(Keyword::from_bytes(&self.data[start..self.pos]))
    }

    /// Get next token with its starting offset.
    pub fn next_token(&mut self) -> Option<Result<(usize, Token)>> {
        self.skip_whitespace();
        let b = self.peek()?;
        self.token_pos = self.pos;

        let result = match b {
            b'/' => Ok(self.parse_name()),
            b'(' => self.parse_string(),
            b'<' => {
                if self.peek_at(1) == Some(b'<') {
                    self.pos += 2;
                    Ok(Token::Keyword(Keyword::DictStart))
                } else {
                    self.parse_hex_string()
                }
            }
            b'>' => {
                self.pos += 1;
                if self.peek() == Some(b'>') {
                    self.pos += 1;
                    Ok(Token::Keyword(Keyword::DictEnd))
                } else {
                    Ok(Token::Keyword(Keyword::Unknown(b">".to_vec())))
                }
            }
            b'[' => {
                self.pos += 1;
                Ok(Token::Keyword(Keyword::ArrayStart))
            }
            b']' => {
                self.pos += 1;
                Ok(Token::Keyword(Keyword::ArrayEnd))
            }
            b'{' => {
                self.pos += 1;
                Ok(Token::Keyword(Keyword::BraceOpen))
            }
            b'}' => {
                self.pos += 1;
                Ok(Token::Keyword(Keyword::BraceClose))
            }
            b'+' | b'-' => {
                if matches!(self.peek_at(1), Some(c) if c.is_ascii_digit() || c == b'.') {
                    self.parse_number()
                } else {
                    Ok(self.parse_keyword())
                }
            }
            b'.' => {
                if matches!(self.peek_at(1), Some(c) if c.is_ascii_digit()) {
                    self.parse_number()
                } else {
                    Ok(self.parse_keyword())
                }
            }
            c if c.is_ascii_digit() => self.parse_number(),
            _ => Ok(self.parse_keyword()),
        };

        Some(result.map(|token| (self.token_pos, token)))
    }
}

/// Backward line iterator returned by [`Lexer::reversed_lines`].
pub struct ReversedLines<'a> {
    data: &'a [u8],
    end: usize,
}

impl<'a> Iterator for ReversedLines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.end == 0 {
            return None;
        }
        // Drop the EOL that terminates this line
        let mut end = self.end;
        if end > 0 && self.data[end - 1] == b'\n' {
            end -= 1;
        }
        if end > 0 && self.data[end - 1] == b'\r' {
            end -= 1;
        }
        let start = self.data[..end]
            .iter()
            .rposition(|&b| b == b'\r' || b == b'\n')
            .map_or(0, |p| p + 1);
        self.end = start;
        Some(&self.data[start..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(data: &[u8]) -> Vec<Token> {
        let mut lexer = Lexer::new(data);
        let mut out = Vec::new();
        while let Some(tok) = lexer.next_token() {
            out.push(tok.unwrap().1);
        }
        out
    }

    #[test]
    fn test_keyword_from_bytes_known() {
        assert_eq!(Keyword::from_bytes(b"BT"), Keyword::BT);
        assert_eq!(Keyword::from_bytes(b"f*"), Keyword::FStar);
        assert_eq!(Keyword::from_bytes(b"'"), Keyword::Quote);
        assert_eq!(Keyword::from_bytes(b"beginbfrange"), Keyword::BeginBfRange);
    }

    #[test]
    fn test_keyword_from_bytes_unknown() {
        let kw = Keyword::from_bytes(b"frobnicate");
        assert_eq!(kw, Keyword::Unknown(b"frobnicate".to_vec()));
        assert_eq!(kw.as_bytes(), b"frobnicate");
    }

    #[test]
    fn test_keyword_as_bytes_round_trips() {
        for kw in [Keyword::Qq, Keyword::TStar, Keyword::DoubleQuote, Keyword::BbStar] {
            assert_eq!(Keyword::from_bytes(kw.as_bytes()), kw);
        }
    }

    #[test]
    fn nested_parens_and_escapes() {
        assert_eq!(
            tokens(b"(a(b)c\\)\\n\\101)"),
            vec![Token::String(b"a(b)c)\nA".to_vec())]
        );
    }

    #[test]
    fn line_continuation_is_elided() {
        assert_eq!(tokens(b"(ab\\\r\ncd)"), vec![Token::String(b"abcd".to_vec())]);
        assert_eq!(tokens(b"(ab\\\ncd)"), vec![Token::String(b"abcd".to_vec())]);
    }

    #[test]
    fn odd_hex_pads_low_nibble() {
        assert_eq!(tokens(b"<4 8 6>"), vec![Token::String(vec![0x48, 0x60])]);
    }

    #[test]
    fn name_hex_escape() {
        assert_eq!(tokens(b"/A#20B"), vec![Token::Name(b"A B".to_vec())]);
    }

    #[test]
    fn numbers_with_sign_and_leading_dot() {
        assert_eq!(
            tokens(b".5 -3 +1.25 -.5"),
            vec![Token::Real(0.5), Token::Int(-3), Token::Real(1.25), Token::Real(-0.5)]
        );
    }

    #[test]
    fn comment_abutting_token() {
        assert_eq!(
            tokens(b"12%comment\n/Name%x\r(s)"),
            vec![Token::Int(12), Token::Name(b"Name".to_vec()), Token::String(b"s".to_vec())]
        );
    }

    #[test]
    fn unterminated_string_is_fatal() {
        let mut lexer = Lexer::new(b"(never closed");
        assert!(matches!(lexer.next_token(), Some(Err(PdfError::TokenError { .. }))));
    }

    #[test]
    fn reversed_lines_walks_backward() {
        let lexer = Lexer::new(b"a\r\nstartxref\n123\n%%EOF\n");
        let lines: Vec<&[u8]> = lexer.reversed_lines().collect();
        assert_eq!(lines, vec![b"%%EOF".as_slice(), b"123", b"startxref", b"a"]);
    }

    #[test]
    fn seek_resets_position() {
        let mut lexer = Lexer::new(b"1 2 3");
        lexer.next_token();
        lexer.seek(4);
        assert_eq!(lexer.next_token().unwrap().unwrap(), (4, Token::Int(3)));
    }
}
