//! AES-CBC helpers for the standard security handler.

use crate::error::{PdfError, Result};
use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use cbc::{Decryptor, Encryptor};

type Aes128CbcDec = Decryptor<aes::Aes128>;
type Aes256CbcDec = Decryptor<aes::Aes256>;
type Aes128CbcEnc = Encryptor<aes::Aes128>;
type Aes256CbcEnc = Encryptor<aes::Aes256>;

fn check_iv(iv: &[u8]) -> Result<()> {
    if iv.len() != 16 {
        return Err(PdfError::EncryptionError(format!(
            "AES IV must be 16 bytes, got {}",
            iv.len()
        )));
    }
    Ok(())
}

/// Decrypt with AES-CBC and no padding removal. The key must be 16 bytes
/// (AES-128) or 32 bytes (AES-256); data must be block aligned.
pub fn aes_cbc_decrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    check_iv(iv)?;
    let mut buf = data.to_vec();
    let unaligned = |_| PdfError::DecodeError("AES data is not block aligned".into());
    match key.len() {
        16 => {
            Aes128CbcDec::new(key.into(), iv.into())
                .decrypt_padded_mut::<NoPadding>(&mut buf)
                .map_err(unaligned)?;
        }
        32 => {
            Aes256CbcDec::new(key.into(), iv.into())
                .decrypt_padded_mut::<NoPadding>(&mut buf)
                .map_err(unaligned)?;
        }
        n => {
            return Err(PdfError::EncryptionError(format!(
                "AES key must be 16 or 32 bytes, got {n}"
            )));
        }
    }
    Ok(buf)
}

/// Encrypt with AES-CBC and no padding. Data must be block aligned.
pub fn aes_cbc_encrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    check_iv(iv)?;
    let mut buf = data.to_vec();
    let len = buf.len();
    let unaligned = |_| PdfError::DecodeError("AES data is not block aligned".into());
    match key.len() {
        16 => {
            Aes128CbcEnc::new(key.into(), iv.into())
                .encrypt_padded_mut::<NoPadding>(&mut buf, len)
                .map_err(unaligned)?;
        }
        32 => {
            Aes256CbcEnc::new(key.into(), iv.into())
                .encrypt_padded_mut::<NoPadding>(&mut buf, len)
                .map_err(unaligned)?;
        }
        n => {
            return Err(PdfError::EncryptionError(format!(
                "AES key must be 16 or 32 bytes, got {n}"
            )));
        }
    }
    Ok(buf)
}

/// Append PKCS#7 padding to a full block multiple.
pub fn pad_pkcs7(data: &[u8]) -> Vec<u8> {
    let pad = 16 - data.len() % 16;
    let mut out = Vec::with_capacity(data.len() + pad);
    out.extend_from_slice(data);
    out.extend(std::iter::repeat_n(pad as u8, pad));
    out
}

/// Remove PKCS#7 padding from AES-decrypted data.
///
/// Returns data unchanged if padding is invalid.
pub fn unpad_aes(data: &[u8]) -> &[u8] {
    let Some(&last) = data.last() else {
        return data;
    };
    let pad_len = last as usize;
    if pad_len == 0 || pad_len > 16 || pad_len > data.len() {
        return data;
    }
    let start = data.len() - pad_len;
    if data[start..].iter().all(|&b| b as usize == pad_len) {
        &data[..start]
    } else {
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_128_and_256() {
        let iv = [7u8; 16];
        let plain = pad_pkcs7(b"some stream bytes");
        for key in [vec![1u8; 16], vec![2u8; 32]] {
            let ct = aes_cbc_encrypt(&key, &iv, &plain).unwrap();
            let pt = aes_cbc_decrypt(&key, &iv, &ct).unwrap();
            assert_eq!(unpad_aes(&pt), b"some stream bytes");
        }
    }

    #[test]
    fn rejects_bad_key_length() {
        assert!(aes_cbc_decrypt(&[0u8; 5], &[0u8; 16], &[0u8; 16]).is_err());
    }

    #[test]
    fn unaligned_input_is_an_error() {
        assert!(aes_cbc_decrypt(&[0u8; 16], &[0u8; 16], &[0u8; 15]).is_err());
    }
}
