//! RunLength stream codec.

use crate::error::Result;

/// Decode RunLength-encoded data.
///
/// - Length byte 0-127: copy next (length + 1) bytes literally
/// - Length byte 128: end of data
/// - Length byte 129-255: repeat next byte (257 - length) times
///
/// Truncated input stops decoding without error.
pub fn rldecode(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let length = data[i];
        i += 1;

        match length {
            128 => break,
            0..=127 => {
                let count = length as usize + 1;
                let end = (i + count).min(data.len());
                result.extend_from_slice(&data[i..end]);
                i = end;
            }
            129..=255 => {
                if let Some(&byte) = data.get(i) {
                    i += 1;
                    result.extend(std::iter::repeat_n(byte, 257 - length as usize));
                }
            }
        }
    }

    Ok(result)
}

/// Encode data with RunLength, terminated by the 128 EOD byte.
pub fn rlencode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 128 + 2);
    let mut i = 0;

    while i < data.len() {
        let run = data[i..]
            .iter()
            .take(128)
            .take_while(|&&b| b == data[i])
            .count();
        if run >= 2 {
            out.push((257 - run) as u8);
            out.push(data[i]);
            i += run;
            continue;
        }

        // Literal run until the next repeat of two or more
        let start = i;
        while i < data.len() && i - start < 128 {
            if i + 1 < data.len() && data[i] == data[i + 1] {
                break;
            }
            i += 1;
        }
        out.push((i - start - 1) as u8);
        out.extend_from_slice(&data[start..i]);
    }

    out.push(128);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_literal_and_repeat() {
        let encoded = [2, b'a', b'b', b'c', 254, b'x', 128, 0, b'z'];
        assert_eq!(rldecode(&encoded).unwrap(), b"abcxxx");
    }

    #[test]
    fn encode_uses_repeat_runs() {
        assert_eq!(rlencode(b"aaaa"), vec![253, b'a', 128]);
        assert_eq!(rlencode(b""), vec![128]);
    }
}
