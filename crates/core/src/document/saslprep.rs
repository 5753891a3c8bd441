//! Password preparation for revision 6 handlers (RFC 4013 SASLprep).
//!
//! Covers the mapping and normalization steps plus the prohibited-output
//! checks that matter for passwords. Unassigned code points are let
//! through, as stringprep allows for queries.

use unicode_normalization::UnicodeNormalization;

use crate::error::{PdfError, Result};

/// RFC 3454 Table B.1: commonly mapped to nothing.
fn mapped_to_nothing(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}'
            | '\u{034F}'
            | '\u{1806}'
            | '\u{180B}'..='\u{180D}'
            | '\u{200B}'..='\u{200D}'
            | '\u{2060}'
            | '\u{FE00}'..='\u{FE0F}'
            | '\u{FEFF}'
    )
}

/// RFC 3454 Table C.1.2: non-ASCII spaces, mapped to U+0020.
fn non_ascii_space(c: char) -> bool {
    matches!(
        c,
        '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
    )
}

/// Tables C.2 through C.9, folded.
fn prohibited(c: char) -> bool {
    matches!(
        c,
        '\u{0000}'..='\u{001F}'
            | '\u{007F}'..='\u{009F}'
            | '\u{06DD}'
            | '\u{070F}'
            | '\u{180E}'
            | '\u{2028}'..='\u{2029}'
            | '\u{2061}'..='\u{2063}'
            | '\u{206A}'..='\u{206F}'
            | '\u{E000}'..='\u{F8FF}'
            | '\u{F0000}'..='\u{FFFFD}'
            | '\u{100000}'..='\u{10FFFD}'
            | '\u{FDD0}'..='\u{FDEF}'
            | '\u{FFF9}'..='\u{FFFD}'
            | '\u{1D173}'..='\u{1D17A}'
            | '\u{E0001}'
            | '\u{E0020}'..='\u{E007F}'
            | '\u{2FF0}'..='\u{2FFB}'
            | '\u{0340}'..='\u{0341}'
            | '\u{200E}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
    ) || (c as u32 & 0xFFFE) == 0xFFFE
}

/// Prepare `password` for hashing.
pub fn saslprep(password: &str) -> Result<String> {
    let mapped: String = password
        .chars()
        .filter(|&c| !mapped_to_nothing(c))
        .map(|c| if non_ascii_space(c) { ' ' } else { c })
        .collect();

    let normalized: String = mapped.nfkc().collect();
    if let Some(bad) = normalized.chars().find(|&c| prohibited(c)) {
        return Err(PdfError::EncryptionError(format!(
            "password contains prohibited character U+{:04X}",
            bad as u32
        )));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc4013_examples() {
        assert_eq!(saslprep("I\u{00AD}X").unwrap(), "IX");
        assert_eq!(saslprep("user").unwrap(), "user");
        assert_eq!(saslprep("\u{00AA}").unwrap(), "a");
        assert_eq!(saslprep("\u{2168}").unwrap(), "IX");
        assert!(saslprep("\u{0007}").is_err());
    }

    #[test]
    fn non_ascii_space_becomes_space() {
        assert_eq!(saslprep("a\u{3000}b").unwrap(), "a b");
    }
}
