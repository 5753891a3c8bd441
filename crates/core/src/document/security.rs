//! Standard security handlers for decryption.
//!
//! Revisions 2 to 4 derive an RC4/AES-128 file key from MD5 and then a
//! per-object key from it; revisions 5 and 6 unwrap a single AES-256 key
//! with SHA-2. The encrypt-side helpers at the bottom build matching
//! `/Encrypt` dictionaries for fixtures.

use super::saslprep::saslprep;
use crate::codec::aes::{aes_cbc_decrypt, aes_cbc_encrypt, pad_pkcs7, unpad_aes};
use crate::codec::arcfour::Arcfour;
use crate::error::{PdfError, Result};
use crate::model::objects::{DictExt, PDFDict, PDFObject, dict_from};
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Password padding constant from the PDF reference.
pub const PASSWORD_PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// Decrypts strings and stream payloads of one document.
pub trait SecurityHandler: Send + Sync {
    /// Decrypt a string that belongs to object `objid`.
    fn decrypt_string(&self, objid: u32, genno: u16, data: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt a stream payload. `attrs` lets handlers exempt metadata
    /// streams when `EncryptMetadata` is false.
    fn decrypt_stream(&self, objid: u32, genno: u16, data: &[u8], attrs: &PDFDict)
    -> Result<Vec<u8>>;

    /// The authenticated file key.
    fn file_key(&self) -> &[u8];

    /// Whether `/Type /Metadata` streams are encrypted.
    fn encrypts_metadata(&self) -> bool {
        true
    }
}

/// Crypt filter method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptMethod {
    Identity,
    /// RC4
    V2,
    /// AES-128
    AESV2,
    /// AES-256
    AESV3,
}

impl CryptMethod {
    fn from_cfm(cfm: &[u8]) -> Result<Self> {
        match cfm {
            b"V2" => Ok(Self::V2),
            b"AESV2" => Ok(Self::AESV2),
            b"AESV3" => Ok(Self::AESV3),
            b"None" => Ok(Self::Identity),
            other => Err(PdfError::EncryptionError(format!(
                "unknown crypt filter method: {}",
                String::from_utf8_lossy(other)
            ))),
        }
    }

    const fn cfm_name(self) -> &'static str {
        match self {
            Self::Identity => "None",
            Self::V2 => "V2",
            Self::AESV2 => "AESV2",
            Self::AESV3 => "AESV3",
        }
    }
}

/// Inputs shared by the MD5-based revisions (2, 3 and 4).
struct Rc4Params {
    r: i64,
    /// File key length in bytes
    n: usize,
    o: Vec<u8>,
    u: Vec<u8>,
    p: u32,
    docid: Vec<u8>,
    encrypt_metadata: bool,
}

fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = PASSWORD_PADDING;
    let len = password.len().min(32);
    padded[..len].copy_from_slice(&password[..len]);
    padded[len..].copy_from_slice(&PASSWORD_PADDING[..32 - len]);
    padded
}

fn xor_key(key: &[u8], i: u8) -> Vec<u8> {
    key.iter().map(|b| b ^ i).collect()
}

impl Rc4Params {
    fn from_encrypt(encrypt: &PDFDict, doc_id: Option<&[u8]>) -> Result<Self> {
        let r = get_int(encrypt, "R")?;
        let n = if r == 2 {
            5
        } else {
            (get_int_default(encrypt, "Length", if r >= 4 { 128 } else { 40 }).clamp(40, 128) / 8)
                as usize
        };
        Ok(Self {
            r,
            n,
            o: get_bytes(encrypt, "O")?,
            u: get_bytes(encrypt, "U")?,
            p: get_int(encrypt, "P")? as u32,
            docid: doc_id.unwrap_or_default().to_vec(),
            encrypt_metadata: get_bool_default(encrypt, "EncryptMetadata", true),
        })
    }

    /// Algorithm 2: file key from a user password.
    fn compute_key(&self, password: &[u8]) -> Vec<u8> {
        let mut context = md5::Context::new();
        context.consume(pad_password(password));
        context.consume(&self.o);
        context.consume(self.p.to_le_bytes());
        context.consume(&self.docid);
        if self.r >= 4 && !self.encrypt_metadata {
            context.consume([0xFF, 0xFF, 0xFF, 0xFF]);
        }
        let mut result = context.finalize().0;
        if self.r >= 3 {
            for _ in 0..50 {
                result = md5::compute(&result[..self.n]).0;
            }
        }
        result[..self.n].to_vec()
    }

    /// Algorithms 4 and 5: the U entry a key produces.
    fn compute_u(&self, key: &[u8]) -> Vec<u8> {
        if self.r == 2 {
            return Arcfour::new(key).process(&PASSWORD_PADDING);
        }
        let mut context = md5::Context::new();
        context.consume(PASSWORD_PADDING);
        context.consume(&self.docid);
        let mut result = Arcfour::new(key).process(&context.finalize().0);
        for i in 1..20u8 {
            result = Arcfour::new(&xor_key(key, i)).process(&result);
        }
        // Only the first 16 bytes are significant; the rest is arbitrary
        let mut padded = result.clone();
        padded.extend_from_slice(&result);
        padded
    }

    fn authenticate_user(&self, password: &[u8]) -> Option<Vec<u8>> {
        let key = self.compute_key(password);
        let u = self.compute_u(&key);
        let matched = if self.r == 2 {
            u.len() >= 32 && self.u.len() >= 32 && u[..32] == self.u[..32]
        } else {
            self.u.len() >= 16 && u[..16] == self.u[..16]
        };
        matched.then_some(key)
    }

    /// Algorithm 7: recover the user password from O, then authenticate it.
    fn authenticate_owner(&self, password: &[u8]) -> Option<Vec<u8>> {
        let rc4_key = owner_rc4_key(password, self.r, self.n);
        let user_password = if self.r == 2 {
            Arcfour::new(&rc4_key).process(&self.o)
        } else {
            let mut result = self.o.clone();
            for i in (0..20u8).rev() {
                result = Arcfour::new(&xor_key(&rc4_key, i)).process(&result);
            }
            result
        };
        self.authenticate_user(&user_password)
    }

    fn authenticate(&self, password: &str) -> Result<Vec<u8>> {
        let password = password.as_bytes();
        self.authenticate_user(password)
            .or_else(|| self.authenticate_owner(password))
            .ok_or_else(|| PdfError::EncryptionError("authentication failed".into()))
    }
}

/// RC4 key that wraps the user password into O.
fn owner_rc4_key(owner_password: &[u8], r: i64, n: usize) -> Vec<u8> {
    let mut hash = md5::compute(pad_password(owner_password)).0;
    if r >= 3 {
        for _ in 0..50 {
            hash = md5::compute(hash).0;
        }
    }
    hash[..n].to_vec()
}

/// Per-object key: md5(key + objid[..3] + genno[..2] [+ "sAlT"]).
fn object_key(key: &[u8], objid: u32, genno: u16, aes: bool) -> Vec<u8> {
    let mut context = md5::Context::new();
    context.consume(key);
    context.consume(&objid.to_le_bytes()[..3]);
    context.consume(genno.to_le_bytes());
    if aes {
        context.consume(b"sAlT");
    }
    let hash = context.finalize().0;
    hash[..(key.len() + 5).min(16)].to_vec()
}

fn decrypt_rc4(key: &[u8], objid: u32, genno: u16, data: &[u8]) -> Vec<u8> {
    Arcfour::new(&object_key(key, objid, genno, false)).process(data)
}

/// AES-CBC with a 16-byte IV prefix and PKCS#7 padding.
fn decrypt_aes(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < 16 {
        return Err(PdfError::DecodeError(format!(
            "AES payload of {} bytes has no IV",
            data.len()
        )));
    }
    let (iv, ciphertext) = data.split_at(16);
    if ciphertext.is_empty() {
        return Ok(Vec::new());
    }
    let plaintext = aes_cbc_decrypt(key, iv, ciphertext)?;
    Ok(unpad_aes(&plaintext).to_vec())
}

fn is_metadata_stream(attrs: &PDFDict) -> bool {
    attrs.is_name("Type", "Metadata")
}

/// Standard security handler for revisions 2 and 3 (RC4, 40 to 128 bits).
pub struct StandardSecurityHandlerV2 {
    key: Vec<u8>,
}

impl StandardSecurityHandlerV2 {
    pub fn new(encrypt: &PDFDict, doc_id: Option<&[u8]>, password: &str) -> Result<Self> {
        let params = Rc4Params::from_encrypt(encrypt, doc_id)?;
        Ok(Self {
            key: params.authenticate(password)?,
        })
    }

    /// Handler for an already known file key.
    pub fn with_key(key: Vec<u8>) -> Self {
        Self { key }
    }
}

impl SecurityHandler for StandardSecurityHandlerV2 {
    fn decrypt_string(&self, objid: u32, genno: u16, data: &[u8]) -> Result<Vec<u8>> {
        Ok(decrypt_rc4(&self.key, objid, genno, data))
    }

    fn decrypt_stream(
        &self,
        objid: u32,
        genno: u16,
        data: &[u8],
        _attrs: &PDFDict,
    ) -> Result<Vec<u8>> {
        Ok(decrypt_rc4(&self.key, objid, genno, data))
    }

    fn file_key(&self) -> &[u8] {
        &self.key
    }
}

/// Standard security handler for revision 4 (crypt filters).
pub struct StandardSecurityHandlerV4 {
    key: Vec<u8>,
    strf: CryptMethod,
    stmf: CryptMethod,
    encrypt_metadata: bool,
}

fn resolve_crypt_method(encrypt: &PDFDict, entry: &str) -> Result<CryptMethod> {
    let name = match encrypt.get_key(entry) {
        Some(PDFObject::Name(name)) => name.as_slice(),
        _ => b"Identity",
    };
    if name == b"Identity" {
        return Ok(CryptMethod::Identity);
    }
    let filter = encrypt
        .get_key("CF")
        .and_then(|cf| cf.as_dict().ok())
        .and_then(|cf| cf.get(name))
        .and_then(|f| f.as_dict().ok())
        .ok_or_else(|| {
            PdfError::EncryptionError(format!(
                "crypt filter {} not found in CF",
                String::from_utf8_lossy(name)
            ))
        })?;
    match filter.get_key("CFM") {
        Some(PDFObject::Name(cfm)) => CryptMethod::from_cfm(cfm),
        _ => Ok(CryptMethod::Identity),
    }
}

impl StandardSecurityHandlerV4 {
    pub fn new(encrypt: &PDFDict, doc_id: Option<&[u8]>, password: &str) -> Result<Self> {
        let params = Rc4Params::from_encrypt(encrypt, doc_id)?;
        let key = params.authenticate(password)?;
        Ok(Self {
            key,
            strf: resolve_crypt_method(encrypt, "StrF")?,
            stmf: resolve_crypt_method(encrypt, "StmF")?,
            encrypt_metadata: params.encrypt_metadata,
        })
    }

    pub fn with_key(
        key: Vec<u8>,
        stmf: CryptMethod,
        strf: CryptMethod,
        encrypt_metadata: bool,
    ) -> Self {
        Self {
            key,
            strf,
            stmf,
            encrypt_metadata,
        }
    }

    fn decrypt_with(&self, method: CryptMethod, objid: u32, genno: u16, data: &[u8]) -> Result<Vec<u8>> {
        match method {
            CryptMethod::Identity => Ok(data.to_vec()),
            CryptMethod::V2 => Ok(decrypt_rc4(&self.key, objid, genno, data)),
            CryptMethod::AESV2 => decrypt_aes(&object_key(&self.key, objid, genno, true), data),
            CryptMethod::AESV3 => Err(PdfError::EncryptionError(
                "AESV3 crypt filter requires revision 5 or 6".into(),
            )),
        }
    }
}

impl SecurityHandler for StandardSecurityHandlerV4 {
    fn decrypt_string(&self, objid: u32, genno: u16, data: &[u8]) -> Result<Vec<u8>> {
        self.decrypt_with(self.strf, objid, genno, data)
    }

    fn decrypt_stream(&self, objid: u32, genno: u16, data: &[u8], attrs: &PDFDict) -> Result<Vec<u8>> {
        if !self.encrypt_metadata && is_metadata_stream(attrs) {
            return Ok(data.to_vec());
        }
        self.decrypt_with(self.stmf, objid, genno, data)
    }

    fn file_key(&self) -> &[u8] {
        &self.key
    }

    fn encrypts_metadata(&self) -> bool {
        self.encrypt_metadata
    }
}

/// Standard security handler for revisions 5 and 6 (AES-256).
pub struct StandardSecurityHandlerV5 {
    key: Vec<u8>,
    strf: CryptMethod,
    stmf: CryptMethod,
    encrypt_metadata: bool,
}

/// Prepare a password for the SHA-2 revisions: UTF-8, at most 127 bytes.
fn prepare_password(password: &str, r: i64) -> Result<Vec<u8>> {
    let prepared = if r == 6 {
        saslprep(password)?
    } else {
        password.to_string()
    };
    let mut bytes = prepared.into_bytes();
    bytes.truncate(127);
    Ok(bytes)
}

/// Algorithm 2.A/2.B hash of `password + salt + vector`.
fn password_hash(r: i64, password: &[u8], salt: &[u8], vector: &[u8]) -> Result<Vec<u8>> {
    let mut k = Sha256::new()
        .chain_update(password)
        .chain_update(salt)
        .chain_update(vector)
        .finalize()
        .to_vec();
    if r == 5 {
        return Ok(k);
    }

    let mut round = 0u32;
    loop {
        let block: Vec<u8> = [password, &k, vector].concat();
        let k1 = block.repeat(64);
        let e = aes_cbc_encrypt(&k[..16], &k[16..32], &k1)?;
        // 256 = 1 (mod 3), so the 128-bit number mod 3 is the byte sum mod 3
        let selector = e[..16].iter().map(|&b| b as u32).sum::<u32>() % 3;
        k = match selector {
            0 => Sha256::digest(&e).to_vec(),
            1 => Sha384::digest(&e).to_vec(),
            _ => Sha512::digest(&e).to_vec(),
        };
        round += 1;
        let last = e.last().copied().unwrap_or(0) as u32;
        if round >= 64 && last + 32 <= round {
            break;
        }
    }
    k.truncate(32);
    Ok(k)
}

impl StandardSecurityHandlerV5 {
    pub fn new(encrypt: &PDFDict, password: &str) -> Result<Self> {
        let r = get_int(encrypt, "R")?;
        let o = get_bytes(encrypt, "O")?;
        let u = get_bytes(encrypt, "U")?;
        let oe = get_bytes(encrypt, "OE")?;
        let ue = get_bytes(encrypt, "UE")?;
        for (name, value, min) in [("O", &o, 48), ("U", &u, 48), ("OE", &oe, 32), ("UE", &ue, 32)] {
            if value.len() < min {
                return Err(PdfError::EncryptionError(format!(
                    "{name} is {} bytes, expected {min}",
                    value.len()
                )));
            }
        }

        let password = prepare_password(password, r)?;
        let iv = [0u8; 16];

        // Owner and user checks are independent; the owner one goes first
        let key = if password_hash(r, &password, &o[32..40], &u[..48])? == o[..32] {
            let wrap = password_hash(r, &password, &o[40..48], &u[..48])?;
            aes_cbc_decrypt(&wrap, &iv, &oe[..32])?
        } else if password_hash(r, &password, &u[32..40], &[])? == u[..32] {
            let wrap = password_hash(r, &password, &u[40..48], &[])?;
            aes_cbc_decrypt(&wrap, &iv, &ue[..32])?
        } else {
            return Err(PdfError::EncryptionError("authentication failed".into()));
        };

        Ok(Self {
            key,
            strf: resolve_crypt_method(encrypt, "StrF")?,
            stmf: resolve_crypt_method(encrypt, "StmF")?,
            encrypt_metadata: get_bool_default(encrypt, "EncryptMetadata", true),
        })
    }

    pub fn with_key(key: Vec<u8>, method: CryptMethod, encrypt_metadata: bool) -> Self {
        Self {
            key,
            strf: method,
            stmf: method,
            encrypt_metadata,
        }
    }

    fn decrypt_with(&self, method: CryptMethod, data: &[u8]) -> Result<Vec<u8>> {
        match method {
            CryptMethod::Identity => Ok(data.to_vec()),
            CryptMethod::AESV3 => decrypt_aes(&self.key, data),
            CryptMethod::V2 | CryptMethod::AESV2 => Err(PdfError::EncryptionError(format!(
                "{} crypt filter is not valid with a 256-bit key",
                method.cfm_name()
            ))),
        }
    }
}

impl SecurityHandler for StandardSecurityHandlerV5 {
    fn decrypt_string(&self, _objid: u32, _genno: u16, data: &[u8]) -> Result<Vec<u8>> {
        self.decrypt_with(self.strf, data)
    }

    fn decrypt_stream(&self, _objid: u32, _genno: u16, data: &[u8], attrs: &PDFDict) -> Result<Vec<u8>> {
        if !self.encrypt_metadata && is_metadata_stream(attrs) {
            return Ok(data.to_vec());
        }
        self.decrypt_with(self.stmf, data)
    }

    fn file_key(&self) -> &[u8] {
        &self.key
    }

    fn encrypts_metadata(&self) -> bool {
        self.encrypt_metadata
    }
}

fn get_int(encrypt: &PDFDict, key: &str) -> Result<i64> {
    encrypt
        .get_key(key)
        .ok_or_else(|| PdfError::EncryptionError(format!("missing {key} in /Encrypt")))?
        .as_int()
}

fn get_int_default(encrypt: &PDFDict, key: &str, default: i64) -> i64 {
    encrypt
        .get_key(key)
        .and_then(|v| v.as_int().ok())
        .unwrap_or(default)
}

fn get_bytes(encrypt: &PDFDict, key: &str) -> Result<Vec<u8>> {
    encrypt
        .get_key(key)
        .ok_or_else(|| PdfError::EncryptionError(format!("missing {key} in /Encrypt")))?
        .as_string()
        .map(<[u8]>::to_vec)
}

fn get_bool_default(encrypt: &PDFDict, key: &str, default: bool) -> bool {
    encrypt
        .get_key(key)
        .and_then(|v| v.as_bool().ok())
        .unwrap_or(default)
}

/// Pick and authenticate the handler an `/Encrypt` dictionary asks for.
pub fn create_security_handler(
    encrypt: &PDFDict,
    doc_id: Option<&[u8]>,
    password: &str,
) -> Result<Box<dyn SecurityHandler>> {
    if let Some(filter) = encrypt.get_key("Filter")
        && !filter.is_name("Standard")
    {
        return Err(PdfError::EncryptionError(format!(
            "unsupported security handler: {}",
            filter.name_str().unwrap_or_else(|| filter.type_name().to_string())
        )));
    }

    let v = get_int_default(encrypt, "V", 0);
    let r = get_int(encrypt, "R")?;
    match (v, r) {
        (1 | 2, 2) | (2 | 3, 3) => Ok(Box::new(StandardSecurityHandlerV2::new(
            encrypt, doc_id, password,
        )?)),
        (4, 4) => Ok(Box::new(StandardSecurityHandlerV4::new(
            encrypt, doc_id, password,
        )?)),
        (5, 5 | 6) => Ok(Box::new(StandardSecurityHandlerV5::new(encrypt, password)?)),
        _ => Err(PdfError::EncryptionError(format!(
            "unsupported encryption: V={v}, R={r}"
        ))),
    }
}

// Encrypt side, for building fixtures.

/// RC4-encrypt `data` for object `objid`.
pub fn encrypt_rc4(key: &[u8], objid: u32, genno: u16, data: &[u8]) -> Vec<u8> {
    decrypt_rc4(key, objid, genno, data)
}

/// AES-128 encrypt `data` for object `objid`, prefixing `iv`.
pub fn encrypt_aes128(key: &[u8], objid: u32, genno: u16, iv: [u8; 16], data: &[u8]) -> Result<Vec<u8>> {
    let ciphertext = aes_cbc_encrypt(&object_key(key, objid, genno, true), &iv, &pad_pkcs7(data))?;
    Ok([iv.as_slice(), &ciphertext].concat())
}

/// AES-256 encrypt `data` with the file key, prefixing `iv`.
pub fn encrypt_aes256(key: &[u8], iv: [u8; 16], data: &[u8]) -> Result<Vec<u8>> {
    let ciphertext = aes_cbc_encrypt(key, &iv, &pad_pkcs7(data))?;
    Ok([iv.as_slice(), &ciphertext].concat())
}

/// Parameters for [`build_encrypt_dict`].
#[derive(Debug, Clone)]
pub struct EncryptSpec<'a> {
    pub v: i64,
    pub r: i64,
    /// Key length in bits (ignored for revisions 5 and 6)
    pub key_bits: usize,
    pub user_password: &'a str,
    pub owner_password: &'a str,
    pub permissions: i32,
    pub doc_id: &'a [u8],
    /// Crypt filter method for `V` 4 and 5
    pub method: CryptMethod,
    pub encrypt_metadata: bool,
}

/// Build an `/Encrypt` dictionary that authenticates the passwords in
/// `spec`, returning it with the file key.
pub fn build_encrypt_dict(spec: &EncryptSpec<'_>) -> Result<(PDFDict, Vec<u8>)> {
    let mut dict = dict_from([
        ("Filter", PDFObject::name("Standard")),
        ("V", PDFObject::Int(spec.v)),
        ("R", PDFObject::Int(spec.r)),
        ("P", PDFObject::Int(spec.permissions as i64)),
    ]);

    let key = if spec.r >= 5 {
        let salts = Sha256::digest([b"salts".as_slice(), spec.doc_id].concat());
        let key = Sha256::digest([b"key".as_slice(), spec.doc_id].concat()).to_vec();
        let iv = [0u8; 16];

        let user = prepare_password(spec.user_password, spec.r)?;
        let mut u = password_hash(spec.r, &user, &salts[0..8], &[])?;
        u.extend_from_slice(&salts[0..16]);
        let ue = aes_cbc_encrypt(&password_hash(spec.r, &user, &salts[8..16], &[])?, &iv, &key)?;

        let owner = prepare_password(spec.owner_password, spec.r)?;
        let mut o = password_hash(spec.r, &owner, &salts[16..24], &u)?;
        o.extend_from_slice(&salts[16..32]);
        let oe = aes_cbc_encrypt(&password_hash(spec.r, &owner, &salts[24..32], &u)?, &iv, &key)?;

        dict.insert(b"Length".to_vec(), PDFObject::Int(256));
        dict.insert(b"O".to_vec(), PDFObject::String(o));
        dict.insert(b"U".to_vec(), PDFObject::String(u));
        dict.insert(b"OE".to_vec(), PDFObject::String(oe));
        dict.insert(b"UE".to_vec(), PDFObject::String(ue));
        key
    } else {
        let n = if spec.r == 2 { 5 } else { spec.key_bits / 8 };
        let owner = if spec.owner_password.is_empty() {
            spec.user_password
        } else {
            spec.owner_password
        };
        let rc4_key = owner_rc4_key(owner.as_bytes(), spec.r, n);
        let mut o = Arcfour::new(&rc4_key).process(&pad_password(spec.user_password.as_bytes()));
        if spec.r >= 3 {
            for i in 1..20u8 {
                o = Arcfour::new(&xor_key(&rc4_key, i)).process(&o);
            }
        }
        let params = Rc4Params {
            r: spec.r,
            n,
            o: o.clone(),
            u: Vec::new(),
            p: spec.permissions as u32,
            docid: spec.doc_id.to_vec(),
            encrypt_metadata: spec.encrypt_metadata,
        };
        let key = params.compute_key(spec.user_password.as_bytes());
        let mut u = params.compute_u(&key);
        u.truncate(32);

        dict.insert(b"Length".to_vec(), PDFObject::Int((n * 8) as i64));
        dict.insert(b"O".to_vec(), PDFObject::String(o));
        dict.insert(b"U".to_vec(), PDFObject::String(u));
        key
    };

    if spec.v >= 4 {
        let std_cf = dict_from([("CFM", PDFObject::name(spec.method.cfm_name()))]);
        dict.insert(
            b"CF".to_vec(),
            PDFObject::Dict(dict_from([("StdCF", PDFObject::Dict(std_cf))])),
        );
        dict.insert(b"StmF".to_vec(), PDFObject::name("StdCF"));
        dict.insert(b"StrF".to_vec(), PDFObject::name("StdCF"));
        if !spec.encrypt_metadata {
            dict.insert(b"EncryptMetadata".to_vec(), PDFObject::Bool(false));
        }
    }
    Ok((dict, key))
}
