//! Stream codecs and ciphers.
//!
//! - `ascii85`: ASCII85 and ASCIIHex
//! - `runlength`: RunLength
//! - `lzw`: LZW
//! - `flate`: zlib/deflate
//! - `predictor`: PNG row predictors
//! - `filters`: the `Filter` chain built from a stream dictionary
//! - `arcfour`, `aes`: ciphers used by the security handler

pub mod aes;
pub mod arcfour;
pub mod ascii85;
pub mod filters;
pub mod flate;
pub mod lzw;
pub mod predictor;
pub mod runlength;

pub use aes::{aes_cbc_decrypt, aes_cbc_encrypt, pad_pkcs7, unpad_aes};
pub use arcfour::Arcfour;
pub use ascii85::{ascii85decode, ascii85encode, asciihexdecode, asciihexencode};
pub use filters::{Filter, FilterStep, apply_filters, filter_chain};
pub use flate::{flatedecode, flateencode};
pub use lzw::{lzwdecode, lzwdecode_with_earlychange, lzwencode};
pub use runlength::{rldecode, rlencode};
