//! Deflate (zlib) stream codec.

use crate::error::Result;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use std::io::{Read, Write};
use tracing::warn;

/// Inflate a zlib stream. A corrupt tail (bad checksum, truncated block)
/// yields everything decoded before the fault.
pub fn flatedecode(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = flate2::read::ZlibDecoder::new(data);
    let mut out = Vec::with_capacity(data.len() * 2);
    if decoder.read_to_end(&mut out).is_ok() {
        return Ok(out);
    }
    let partial = decompress_corrupted(data);
    warn!(
        input = data.len(),
        recovered = partial.len(),
        "corrupt flate stream, keeping partial output"
    );
    Ok(partial)
}

/// Feed the decoder one byte at a time so output produced before the
/// fault is kept.
fn decompress_corrupted(data: &[u8]) -> Vec<u8> {
    let mut decoder = Decompress::new(true);
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut buf = [0u8; 4096];
    let mut i = 0usize;
    while i < data.len() {
        let before_out = decoder.total_out();
        let before_in = decoder.total_in();
        let res = decoder.decompress(&data[i..i + 1], &mut buf, FlushDecompress::None);
        let produced = (decoder.total_out() - before_out) as usize;
        out.extend_from_slice(&buf[..produced]);
        let consumed = (decoder.total_in() - before_in) as usize;
        i += consumed.max(1);
        match res {
            Ok(Status::StreamEnd) | Err(_) => break,
            Ok(_) => {}
        }
    }
    out
}

/// Deflate data into a zlib stream.
pub fn flateencode(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), Compression::default());
    // Writes into a Vec cannot fail
    let _ = encoder.write_all(data);
    encoder.finish().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inflates_encoded_data() {
        let encoded = flateencode(b"BT /F1 12 Tf (Hi) Tj ET");
        assert_eq!(flatedecode(&encoded).unwrap(), b"BT /F1 12 Tf (Hi) Tj ET");
    }

    #[test]
    fn corrupt_checksum_keeps_body() {
        let text = vec![b'q'; 2000];
        let mut encoded = flateencode(&text);
        let n = encoded.len();
        encoded[n - 1] ^= 0xff;
        let decoded = flatedecode(&encoded).unwrap();
        assert_eq!(decoded, text);
    }
}
