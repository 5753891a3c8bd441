//! LZW stream codec (MSB-first, 8-bit alphabet).
//!
//! Code widths grow 9 -> 12 bits. With `EarlyChange` 1 (the PDF default)
//! the width switches when the table reaches 511/1023/2047 entries, which
//! is the TIFF-style size switch; `EarlyChange` 0 switches one code later.

use crate::error::Result;
use tracing::debug;
use weezl::{BitOrder, decode::Decoder, encode::Encoder};

/// Decode LZW-encoded data with the PDF default `EarlyChange` of 1.
pub fn lzwdecode(data: &[u8]) -> Result<Vec<u8>> {
    lzwdecode_with_earlychange(data, 1)
}

/// Decode LZW-encoded data with an explicit `EarlyChange` setting.
///
/// Corrupt input yields whatever was decoded before the bad code.
pub fn lzwdecode_with_earlychange(data: &[u8], early_change: i64) -> Result<Vec<u8>> {
    let mut decoder = if early_change == 0 {
        Decoder::new(BitOrder::Msb, 8)
    } else {
        Decoder::with_tiff_size_switch(BitOrder::Msb, 8)
    };
    let mut output = Vec::new();
    let result = decoder.into_vec(&mut output).decode(data);
    if let Err(err) = result.status {
        debug!(%err, decoded = output.len(), "lzw stream truncated");
    }
    Ok(output)
}

/// Encode data with LZW (`EarlyChange` 1), starting with a clear code and
/// ending with the EOD code.
pub fn lzwencode(data: &[u8]) -> Vec<u8> {
    let mut encoder = Encoder::with_tiff_size_switch(BitOrder::Msb, 8);
    let mut output = Vec::new();
    // Encoding into a growable Vec has no failure mode for 8-bit input
    let _ = encoder.into_vec(&mut output).encode_all(data).status;
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_reference_sample() {
        // 256 45 258 258 65 259 66 257 as 9-bit codes
        let encoded = [0x80, 0x0B, 0x60, 0x50, 0x22, 0x0C, 0x0C, 0x85, 0x01];
        assert_eq!(lzwdecode(&encoded).unwrap(), b"-----A---B");
    }

    #[test]
    fn truncated_input_keeps_prefix() {
        let encoded = lzwencode(b"abcabcabcabc");
        let partial = lzwdecode(&encoded[..encoded.len() / 2]).unwrap();
        assert!(b"abcabcabcabc".starts_with(&partial));
    }
}
