//! PDFDocument - the object graph of one file.
//!
//! Objects are parsed lazily through the xref chain and cached by
//! `(objid, genno)`. The object, object-stream and font caches are behind
//! locks so pages can be interpreted from several threads at once.

use super::page::PageIterator;
use super::security::{SecurityHandler, create_security_handler};
use super::xref::{XRef, XRefEntry};
use crate::codec::filters::{apply_filters, filter_chain};
use crate::config::OpenOptions;
use crate::error::{PdfError, Result};
use crate::font::pdffont::PDFFont;
use crate::font::resources::FontResources;
use crate::model::objects::{DictExt, PDFDict, PDFObjRef, PDFObject, PDFStream};
use crate::parser::lexer::Lexer;
use crate::parser::object_parser::{LengthResolver, ObjectParser, ParsedItem};
use bytes::Bytes;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::RefCell;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, warn};

thread_local! {
    /// Objects being resolved on this thread, keyed by document address.
    static RESOLVING: RefCell<FxHashSet<(usize, u32)>> = RefCell::new(FxHashSet::default());
}

/// Clears the in-progress marker when a resolution finishes or fails.
struct ResolvingGuard {
    key: (usize, u32),
}

impl ResolvingGuard {
    fn enter(doc: &PDFDocument, objid: u32) -> Result<Self> {
        let key = (doc as *const PDFDocument as usize, objid);
        let fresh = RESOLVING.with(|set| set.borrow_mut().insert(key));
        if !fresh {
            return Err(PdfError::CircularReference(objid));
        }
        Ok(Self { key })
    }
}

impl Drop for ResolvingGuard {
    fn drop(&mut self) {
        RESOLVING.with(|set| {
            set.borrow_mut().remove(&self.key);
        });
    }
}

/// A parsed PDF file.
pub struct PDFDocument {
    data: Bytes,
    /// Newest first
    xrefs: Vec<XRef>,
    cache: Mutex<FxHashMap<(u32, u16), Arc<PDFObject>>>,
    objstm_cache: RwLock<FxHashMap<u32, Arc<Vec<PDFObject>>>>,
    /// Fonts given by reference, shared by every page
    font_cache: RwLock<FxHashMap<PDFObjRef, Arc<PDFFont>>>,
    security_handler: Option<Box<dyn SecurityHandler>>,
    /// Object number of the Encrypt dictionary, which is never decrypted
    encrypt_objid: Option<u32>,
    catalog: PDFDict,
    info: PDFDict,
    options: OpenOptions,
}

impl std::fmt::Debug for PDFDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PDFDocument")
            .field("len", &self.data.len())
            .field("xrefs", &self.xrefs.len())
            .field("encrypted", &self.is_encrypted())
            .finish_non_exhaustive()
    }
}

impl PDFDocument {
    /// Open a document with default options and the given password.
    pub fn open(data: impl Into<Bytes>, password: &str) -> Result<Self> {
        Self::open_with(data, &OpenOptions::default().with_password(password))
    }

    /// Open a document.
    pub fn open_with(data: impl Into<Bytes>, options: &OpenOptions) -> Result<Self> {
        let mut doc = Self {
            data: data.into(),
            xrefs: Vec::new(),
            cache: Mutex::new(FxHashMap::default()),
            objstm_cache: RwLock::new(FxHashMap::default()),
            font_cache: RwLock::new(FxHashMap::default()),
            security_handler: None,
            encrypt_objid: None,
            catalog: PDFDict::new(),
            info: PDFDict::new(),
            options: options.clone(),
        };
        doc.load_xref_chain()?;
        doc.setup()?;
        Ok(doc)
    }

    fn load_xref_chain(&mut self) -> Result<()> {
        match self.find_startxref() {
            Some(start) => self.load_xrefs(start),
            None => debug!("no startxref found"),
        }

        if self.xrefs.is_empty() || !self.xrefs.iter().any(XRef::has_root) {
            if !self.options.fallback {
                if self.xrefs.is_empty() {
                    return Err(PdfError::NoValidXRef);
                }
                return Ok(());
            }
            warn!(tables = self.xrefs.len(), "rebuilding xref by scanning for objects");
            match XRef::fallback(&self.data) {
                Ok(xref) => self.xrefs.push(xref),
                Err(err) if self.xrefs.is_empty() => return Err(err),
                Err(err) => debug!(%err, "fallback scan found nothing"),
            }
        }
        Ok(())
    }

    /// Offset after the last `startxref` keyword.
    fn find_startxref(&self) -> Option<usize> {
        let mut following: Option<&[u8]> = None;
        for line in Lexer::new(&self.data).reversed_lines() {
            let line = line.trim_ascii();
            if line.is_empty() {
                continue;
            }
            if line == b"startxref" {
                return std::str::from_utf8(following?).ok()?.parse().ok();
            }
            following = Some(line);
        }
        None
    }

    /// Follow `XRefStm` and `Prev` links from `start`. A table that fails to
    /// load ends the chain.
    fn load_xrefs(&mut self, start: usize) {
        let mut visited = FxHashSet::default();
        let mut next = Some(start);

        while let Some(pos) = next.take() {
            if !visited.insert(pos) {
                debug!(pos, "xref chain loops");
                break;
            }
            let xref = match self.load_xref_at(pos) {
                Ok(xref) => xref,
                Err(err) => {
                    warn!(pos, %err, "cannot load xref");
                    break;
                }
            };

            let xref_stm = offset_entry(&xref.trailer, "XRefStm");
            next = offset_entry(&xref.trailer, "Prev");
            self.xrefs.push(xref);

            if let Some(stm_pos) = xref_stm
                && visited.insert(stm_pos)
            {
                match self.load_xref_at(stm_pos) {
                    Ok(stm) => self.xrefs.push(stm),
                    Err(err) => warn!(pos = stm_pos, %err, "cannot load XRefStm"),
                }
            }
        }
    }

    fn load_xref_at(&self, pos: usize) -> Result<XRef> {
        if pos >= self.data.len() {
            return Err(PdfError::SyntaxError(format!("xref offset {pos} beyond end of file")));
        }
        let mut parser = ObjectParser::new(&self.data);
        parser.seek(pos);
        match parser.next()? {
            ParsedItem::XRef(xref) => Ok(xref),
            _ => Err(PdfError::SyntaxError(format!("no xref at offset {pos}"))),
        }
    }

    /// Pick the trailer entries, set up decryption and load the catalog.
    fn setup(&mut self) -> Result<()> {
        let mut root = None;
        let mut info = None;
        let mut encrypt = None;
        let mut id = None;
        for xref in &self.xrefs {
            let trailer = &xref.trailer;
            root = root.or_else(|| trailer.get_key("Root").cloned());
            info = info.or_else(|| trailer.get_key("Info").cloned());
            encrypt = encrypt.or_else(|| trailer.get_key("Encrypt").cloned());
            id = id.or_else(|| trailer.get_key("ID").cloned());
        }

        if let Some(encrypt) = encrypt {
            if let PDFObject::Ref(r) = &encrypt {
                self.encrypt_objid = Some(r.objid);
            }
            let encrypt = self.resolve(&encrypt)?;
            let doc_id = id
                .map(|id| self.resolve(&id))
                .transpose()?
                .and_then(|id| match id {
                    PDFObject::Array(parts) => parts.into_iter().next(),
                    _ => None,
                })
                .and_then(|first| match first {
                    PDFObject::String(s) => Some(s),
                    _ => None,
                });
            let handler = create_security_handler(
                encrypt.as_dict()?,
                doc_id.as_deref(),
                &self.options.password,
            )?;
            self.security_handler = Some(handler);
            // Objects read before the handler existed were not decrypted
            self.clear_caches();
        }

        self.catalog = match root.map(|r| self.resolve(&r)) {
            Some(Ok(PDFObject::Dict(dict))) => dict,
            Some(Ok(other)) => {
                warn!(got = other.type_name(), "Root is not a dictionary");
                self.find_catalog().unwrap_or_default()
            }
            Some(Err(err)) => {
                warn!(%err, "cannot resolve Root");
                self.find_catalog().unwrap_or_default()
            }
            None => self.find_catalog().unwrap_or_default(),
        };

        if let Some(Ok(PDFObject::Dict(dict))) = info.map(|i| self.resolve(&i)) {
            self.info = dict;
        }
        Ok(())
    }

    fn clear_caches(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
        if let Ok(mut cache) = self.objstm_cache.write() {
            cache.clear();
        }
        if let Ok(mut cache) = self.font_cache.write() {
            cache.clear();
        }
    }

    /// Look for a `/Type /Catalog` dictionary among the scanned objects.
    fn find_catalog(&self) -> Option<PDFDict> {
        let fallback = self.xrefs.iter().find(|x| x.is_fallback)?;
        let found = fallback.objids().into_iter().find_map(|objid| {
            let obj = self.getobj(objid).ok()?;
            let dict = obj.as_dict().ok()?;
            dict.is_name("Type", "Catalog").then(|| dict.clone())
        });
        if found.is_none() {
            warn!("document has no catalog");
        }
        found
    }

    /// Fetch an indirect object.
    pub fn getobj(&self, objid: u32) -> Result<Arc<PDFObject>> {
        if objid == 0 {
            return Err(PdfError::ObjectNotFound(0));
        }
        let entries: Vec<XRefEntry> = self
            .xrefs
            .iter()
            .filter_map(|x| x.get(objid).copied())
            .collect();
        let Some(newest) = entries.first() else {
            return Err(PdfError::ObjectNotFound(objid));
        };
        let key = (objid, newest.genno());

        if let Ok(cache) = self.cache.lock()
            && let Some(obj) = cache.get(&key)
        {
            return Ok(Arc::clone(obj));
        }

        let _guard = ResolvingGuard::enter(self, objid)?;

        // An older table only answers when the newer entry is unreadable
        let mut last_err = PdfError::ObjectNotFound(objid);
        for entry in entries {
            let loaded = match entry {
                XRefEntry::Direct { offset, .. } => self.load_direct(objid, offset),
                XRefEntry::InStream { container, index } => {
                    self.load_from_objstm(objid, container, index)
                }
            };
            match loaded {
                Ok(obj) => {
                    let obj = Arc::new(obj);
                    if let Ok(mut cache) = self.cache.lock() {
                        cache.insert(key, Arc::clone(&obj));
                    }
                    return Ok(obj);
                }
                Err(err @ PdfError::CircularReference(_)) => return Err(err),
                Err(err) => {
                    debug!(objid, %err, "xref entry unusable");
                    last_err = err;
                }
            }
        }
        Err(last_err)
    }

    fn load_direct(&self, objid: u32, offset: usize) -> Result<PDFObject> {
        if offset >= self.data.len() {
            return Err(PdfError::SyntaxError(format!(
                "offset {offset} of obj {objid} beyond end of file"
            )));
        }
        let mut parser = ObjectParser::new(&self.data).with_resolver(self);
        let (found, genno, value) = parser.parse_indirect_at(offset)?;
        if found != objid {
            return Err(PdfError::SyntaxError(format!(
                "expected obj {objid} at offset {offset}, found obj {found}"
            )));
        }
        Ok(self.decrypt_object(value, objid, genno))
    }

    fn load_from_objstm(&self, objid: u32, container: u32, index: usize) -> Result<PDFObject> {
        let members = self.objstm_members(container)?;
        members.get(index).cloned().ok_or_else(|| {
            PdfError::SyntaxError(format!(
                "obj {objid}: index {index} out of range in object stream {container}"
            ))
        })
    }

    /// Decode and split an object stream, once.
    fn objstm_members(&self, container: u32) -> Result<Arc<Vec<PDFObject>>> {
        if let Ok(cache) = self.objstm_cache.read()
            && let Some(members) = cache.get(&container)
        {
            return Ok(Arc::clone(members));
        }

        let obj = self.getobj(container)?;
        let stream = obj.as_stream()?;
        let n = stream
            .get("N")
            .ok_or_else(|| PdfError::SyntaxError("missing N in object stream".into()))?
            .as_int()?;
        let first = stream
            .get("First")
            .ok_or_else(|| PdfError::SyntaxError("missing First in object stream".into()))?
            .as_int()?;
        let data = self.decode_stream(stream);
        let first = usize::try_from(first)
            .ok()
            .filter(|&f| f <= data.len())
            .ok_or_else(|| PdfError::SyntaxError(format!("bad First {first} in object stream")))?;

        // each header pair takes at least two bytes ("0 0")
        let n = usize::try_from(n)
            .ok()
            .filter(|&n| n <= first / 2)
            .ok_or_else(|| {
                PdfError::SyntaxError(format!("bad N {n} in object stream {container}"))
            })?;

        let mut header = ObjectParser::new(&data[..first]);
        let mut members = Vec::with_capacity(n);
        for _ in 0..n {
            let (Ok(PDFObject::Int(_)), Ok(PDFObject::Int(offset))) =
                (header.next_object(), header.next_object())
            else {
                warn!(container, "object stream header is short");
                break;
            };
            let Some(pos) = usize::try_from(offset)
                .ok()
                .and_then(|o| first.checked_add(o))
                .filter(|&pos| pos < data.len())
            else {
                warn!(container, offset, "bad member offset in object stream");
                break;
            };
            let mut body = ObjectParser::new(data);
            body.seek(pos);
            members.push(body.next_object().unwrap_or_else(|err| {
                debug!(container, %err, "unparsable object stream member");
                PDFObject::Null
            }));
        }

        let members = Arc::new(members);
        if let Ok(mut cache) = self.objstm_cache.write() {
            cache.insert(container, Arc::clone(&members));
        }
        Ok(members)
    }

    /// Decrypt the strings and stream payload of a freshly parsed object.
    fn decrypt_object(&self, obj: PDFObject, objid: u32, genno: u16) -> PDFObject {
        let Some(handler) = &self.security_handler else {
            return obj;
        };
        if self.encrypt_objid == Some(objid) {
            return obj;
        }
        decrypt_leaves(handler.as_ref(), obj, objid, genno)
    }

    /// Follow a reference chain to a direct object.
    pub fn resolve(&self, obj: &PDFObject) -> Result<PDFObject> {
        Ok(self.resolve_shared(obj)?.as_ref().clone())
    }

    /// Follow a reference chain, sharing the cached object.
    pub fn resolve_shared(&self, obj: &PDFObject) -> Result<Arc<PDFObject>> {
        let PDFObject::Ref(first) = obj else {
            return Ok(Arc::new(obj.clone()));
        };
        let mut seen = FxHashSet::default();
        let mut current = *first;
        loop {
            if !seen.insert(current.objid) {
                return Err(PdfError::CircularReference(current.objid));
            }
            let resolved = self.getobj(current.objid)?;
            match resolved.as_ref() {
                PDFObject::Ref(next) => current = *next,
                _ => return Ok(resolved),
            }
        }
    }

    /// Resolve a dictionary entry, treating anything unreadable as absent.
    pub fn resolve_entry(&self, dict: &PDFDict, key: &str) -> Option<PDFObject> {
        let value = dict.get_key(key)?;
        match self.resolve(value) {
            Ok(PDFObject::Null) => None,
            Ok(obj) => Some(obj),
            Err(err) => {
                debug!(key, %err, "cannot resolve entry");
                None
            }
        }
    }

    /// Decoded payload of a stream, computed once per stream.
    pub fn decode_stream<'s>(&self, stream: &'s PDFStream) -> &'s [u8] {
        stream.decoded.get_or_init(|| {
            let chain = filter_chain(&stream.attrs, |o| self.resolve(o).ok());
            apply_filters(stream.get_rawdata(), &chain)
        })
    }

    /// The font an indirect font dictionary describes, built once per
    /// document.
    pub fn load_font(&self, objref: PDFObjRef) -> Result<Arc<PDFFont>> {
        if let Ok(cache) = self.font_cache.read()
            && let Some(font) = cache.get(&objref)
        {
            return Ok(Arc::clone(font));
        }
        let obj = self.resolve_shared(&PDFObject::Ref(objref))?;
        let font = Arc::new(PDFFont::new(obj.as_dict()?, self)?);
        match self.font_cache.write() {
            // a racing thread may have built it first; keep one copy
            Ok(mut cache) => Ok(Arc::clone(cache.entry(objref).or_insert(font))),
            Err(_) => Ok(font),
        }
    }

    /// Pages in document order. Each call starts a fresh walk.
    pub fn pages(&self) -> PageIterator<'_> {
        PageIterator::new(self)
    }

    pub fn catalog(&self) -> &PDFDict {
        &self.catalog
    }

    pub fn info(&self) -> &PDFDict {
        &self.info
    }

    pub fn is_encrypted(&self) -> bool {
        self.security_handler.is_some()
    }

    pub fn options(&self) -> &OpenOptions {
        &self.options
    }

    pub fn font_resources(&self) -> &dyn FontResources {
        self.options.font_resources.as_ref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Trailers newest first, with whether each came from the fallback scan.
    pub fn trailers(&self) -> impl Iterator<Item = (bool, &PDFDict)> {
        self.xrefs.iter().map(|x| (x.is_fallback, &x.trailer))
    }

    /// Every object number any table lists, ascending.
    pub fn objids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.xrefs.iter().flat_map(XRef::objids).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn xrefs(&self) -> &[XRef] {
        &self.xrefs
    }
}

impl LengthResolver for PDFDocument {
    fn resolve_length(&self, objref: PDFObjRef) -> Option<i64> {
        self.getobj(objref.objid).ok()?.as_int().ok()
    }
}

fn offset_entry(trailer: &PDFDict, key: &str) -> Option<usize> {
    trailer
        .get_key(key)
        .and_then(|v| v.as_int().ok())
        .and_then(|n| usize::try_from(n).ok())
}

fn decrypt_leaves(handler: &dyn SecurityHandler, obj: PDFObject, objid: u32, genno: u16) -> PDFObject {
    match obj {
        PDFObject::String(data) => match handler.decrypt_string(objid, genno, &data) {
            Ok(plain) => PDFObject::String(plain),
            Err(err) => {
                debug!(objid, %err, "cannot decrypt string");
                PDFObject::String(data)
            }
        },
        PDFObject::Array(items) => PDFObject::Array(
            items
                .into_iter()
                .map(|item| decrypt_leaves(handler, item, objid, genno))
                .collect(),
        ),
        PDFObject::Dict(dict) => PDFObject::Dict(decrypt_dict(handler, dict, objid, genno)),
        PDFObject::Stream(mut stream) => {
            stream.attrs = decrypt_dict(handler, std::mem::take(&mut stream.attrs), objid, genno);
            let exempt = stream.attrs.is_name("Type", "XRef")
                || (stream.attrs.is_name("Type", "Metadata") && !handler.encrypts_metadata());
            if !exempt {
                match handler.decrypt_stream(objid, genno, stream.get_rawdata(), &stream.attrs) {
                    Ok(plain) => stream.set_rawdata(plain),
                    Err(err) => warn!(objid, %err, "cannot decrypt stream"),
                }
            }
            PDFObject::Stream(stream)
        }
        other => other,
    }
}

fn decrypt_dict(handler: &dyn SecurityHandler, dict: PDFDict, objid: u32, genno: u16) -> PDFDict {
    dict.into_iter()
        .map(|(k, v)| (k, decrypt_leaves(handler, v, objid, genno)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Assemble a file from object bodies, computing the xref offsets.
    fn build(objects: &[&str], trailer: &str) -> Vec<u8> {
        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
        }
        let xref_pos = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
        for offset in offsets {
            out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        out.extend_from_slice(format!("trailer\n{trailer}\nstartxref\n{xref_pos}\n%%EOF\n").as_bytes());
        out
    }

    #[test]
    fn document_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PDFDocument>();
    }

    #[test]
    fn getobj_returns_cached_arc() {
        let data = build(
            &["<< /Type /Catalog /Pages 2 0 R >>", "<< /Type /Pages /Kids [] /Count 0 >>"],
            "<< /Root 1 0 R /Size 3 >>",
        );
        let doc = PDFDocument::open(data, "").unwrap();
        let a = doc.getobj(2).unwrap();
        let b = doc.getobj(2).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(doc.catalog().is_name("Type", "Catalog"));
    }

    #[test]
    fn reference_cycle_is_detected() {
        let data = build(&["<< /Type /Catalog >>", "3 0 R", "2 0 R"], "<< /Root 1 0 R /Size 4 >>");
        let doc = PDFDocument::open(data, "").unwrap();
        let err = doc.resolve(&PDFObject::Ref(PDFObjRef::new(2, 0))).unwrap_err();
        assert!(matches!(err, PdfError::CircularReference(_)));
    }

    #[test]
    fn indirect_length_resolves_through_document() {
        let data = build(
            &["<< /Type /Catalog >>", "<< /Length 3 0 R >>\nstream\nabcde\nendstream", "5"],
            "<< /Root 1 0 R /Size 4 >>",
        );
        let doc = PDFDocument::open(data, "").unwrap();
        let obj = doc.getobj(2).unwrap();
        assert_eq!(doc.decode_stream(obj.as_stream().unwrap()), b"abcde");
    }

    #[test]
    fn missing_object_is_not_found() {
        let data = build(&["<< /Type /Catalog >>"], "<< /Root 1 0 R /Size 2 >>");
        let doc = PDFDocument::open(data, "").unwrap();
        assert!(matches!(doc.getobj(9), Err(PdfError::ObjectNotFound(9))));
    }

    #[test]
    fn broken_startxref_uses_fallback() {
        let mut data = build(&["<< /Type /Catalog >>"], "<< /Root 1 0 R /Size 2 >>");
        let pos = data.windows(9).rposition(|w| w == b"startxref").unwrap();
        data.truncate(pos);
        data.extend_from_slice(b"startxref\n99999\n%%EOF\n");
        let doc = PDFDocument::open(data.clone(), "").unwrap();
        assert!(doc.trailers().any(|(fallback, _)| fallback));
        assert!(doc.catalog().is_name("Type", "Catalog"));

        let strict = OpenOptions::default().with_fallback(false);
        assert!(matches!(PDFDocument::open_with(data, &strict), Err(PdfError::NoValidXRef)));
    }
}
