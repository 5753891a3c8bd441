//! ASCII85 and ASCIIHex stream codecs.

use crate::error::Result;

/// Decode ASCII85-encoded data (PDF variant).
/// Handles: z-encoding, <~ ~> markers, whitespace, missing EOD.
pub fn ascii85decode(data: &[u8]) -> Result<Vec<u8>> {
    let data = data.strip_prefix(b"<~").unwrap_or(data);

    // Everything after the first '~' is the EOD marker or trailing junk
    let data = match data.iter().position(|&b| b == b'~') {
        Some(pos) => &data[..pos],
        None => data,
    };

    let mut result = Vec::with_capacity(data.len() / 5 * 4 + 4);
    let mut group = [0u8; 5];
    let mut n = 0;

    for &byte in data {
        match byte {
            b'z' if n == 0 => result.extend_from_slice(&[0, 0, 0, 0]),
            b'!'..=b'u' => {
                group[n] = byte;
                n += 1;
                if n == 5 {
                    result.extend_from_slice(&group_value(&group).to_be_bytes());
                    n = 0;
                }
            }
            // Whitespace and stray bytes are ignored
            _ => {}
        }
    }

    if n > 1 {
        group[n..].fill(b'u');
        let bytes = group_value(&group).to_be_bytes();
        result.extend_from_slice(&bytes[..n - 1]);
    }

    Ok(result)
}

fn group_value(group: &[u8; 5]) -> u32 {
    let value = group
        .iter()
        .fold(0u64, |acc, &b| acc * 85 + u64::from(b - b'!'));
    value as u32
}

/// Encode data as ASCII85, terminated by the `~>` EOD marker.
pub fn ascii85encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * 5 / 4 + 4);
    for chunk in data.chunks(4) {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        let mut value = u32::from_be_bytes(word);
        if chunk.len() == 4 && value == 0 {
            out.push(b'z');
            continue;
        }
        let mut digits = [0u8; 5];
        for digit in digits.iter_mut().rev() {
            *digit = (value % 85) as u8 + b'!';
            value /= 85;
        }
        out.extend_from_slice(&digits[..chunk.len() + 1]);
    }
    out.extend_from_slice(b"~>");
    out
}

/// Decode ASCIIHex-encoded data. Stops at `>`; an odd final digit is
/// padded with a zero nibble.
pub fn asciihexdecode(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len() / 2);
    let mut pending: Option<u8> = None;

    for &byte in data {
        if byte == b'>' {
            break;
        }
        if let Some(nibble) = hex_nibble(byte) {
            match pending.take() {
                Some(high) => result.push((high << 4) | nibble),
                None => pending = Some(nibble),
            }
        }
    }

    if let Some(high) = pending {
        result.push(high << 4);
    }

    Ok(result)
}

/// Encode data as ASCIIHex, terminated by `>`.
pub fn asciihexencode(data: &[u8]) -> Vec<u8> {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = Vec::with_capacity(data.len() * 2 + 1);
    for &b in data {
        out.push(DIGITS[usize::from(b >> 4)]);
        out.push(DIGITS[usize::from(b & 0x0f)]);
    }
    out.push(b'>');
    out
}

fn hex_nibble(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asciihex_decode_expected() {
        let data = b"<48656c6c6f 20776f726c64>";
        assert_eq!(asciihexdecode(data).unwrap(), b"Hello world");
    }

    #[test]
    fn ascii85_decode_expected() {
        let data = b"<~87cURD]i,\"Ebo7~>";
        assert_eq!(ascii85decode(data).unwrap(), b"Hello World");
    }

    #[test]
    fn ascii85_z_group() {
        assert_eq!(ascii85decode(b"z~>").unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn ascii85_encode_matches_known_text() {
        assert_eq!(ascii85encode(b"Hello World"), b"87cURD]i,\"Ebo7~>".to_vec());
    }
}
