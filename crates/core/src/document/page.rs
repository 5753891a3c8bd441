//! PDF pages and the page-tree walk.

use super::catalog::PDFDocument;
use crate::error::{PdfError, Result};
use crate::model::objects::{DictExt, PDFDict, PDFObject};
use crate::utils::Rect;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Attributes a page inherits from its ancestors when it lacks them.
const INHERITABLE: [&str; 4] = ["Resources", "MediaBox", "CropBox", "Rotate"];

/// US Letter, used when no MediaBox is found anywhere in the tree.
const DEFAULT_MEDIABOX: Rect = (0.0, 0.0, 612.0, 792.0);

/// A PDF page object.
#[derive(Debug, Clone)]
pub struct PDFPage {
    /// Page object ID
    pub pageid: u32,
    /// Page attributes with inherited entries copied in
    pub attrs: PDFDict,
    /// Media box (physical page size)
    pub mediabox: Rect,
    /// Crop box, the media box when absent
    pub cropbox: Rect,
    /// Rotation in degrees: 0, 90, 180 or 270
    pub rotate: i64,
    /// Page resources
    pub resources: PDFDict,
    /// Decoded content streams in order
    pub contents: Vec<Arc<[u8]>>,
}

impl PDFPage {
    /// Build a page from its (inheritance-completed) attributes.
    pub fn from_attrs(pageid: u32, attrs: PDFDict, doc: &PDFDocument) -> Self {
        let mediabox = parse_box(&attrs, "MediaBox", doc).unwrap_or_else(|| {
            warn!(pageid, "page has no MediaBox, assuming US Letter");
            DEFAULT_MEDIABOX
        });
        let cropbox = parse_box(&attrs, "CropBox", doc).unwrap_or(mediabox);
        let rotate = doc
            .resolve_entry(&attrs, "Rotate")
            .and_then(|r| r.as_int().ok())
            .map_or(0, normalize_rotation);
        let resources = match doc.resolve_entry(&attrs, "Resources") {
            Some(PDFObject::Dict(dict)) => dict,
            _ => PDFDict::new(),
        };
        let contents = parse_contents(&attrs, doc);

        Self {
            pageid,
            attrs,
            mediabox,
            cropbox,
            rotate,
            resources,
            contents,
        }
    }
}

/// Reduce any multiple of 90 to 0..360; anything else becomes 0.
fn normalize_rotation(rotate: i64) -> i64 {
    let r = rotate.rem_euclid(360);
    if r % 90 == 0 { r } else { 0 }
}

fn parse_box(attrs: &PDFDict, key: &str, doc: &PDFDocument) -> Option<Rect> {
    let obj = doc.resolve_entry(attrs, key)?;
    let arr = obj.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let mut nums = [0.0; 4];
    for (slot, item) in nums.iter_mut().zip(arr) {
        *slot = doc.resolve(item).ok()?.as_num().ok()?;
    }
    Some(crate::utils::normalize_rect((nums[0], nums[1], nums[2], nums[3])))
}

/// Decoded `Contents`: a single stream or an array of streams.
fn parse_contents(attrs: &PDFDict, doc: &PDFDocument) -> Vec<Arc<[u8]>> {
    let Some(contents) = attrs.get_key("Contents") else {
        return Vec::new();
    };
    let resolved = match doc.resolve_shared(contents) {
        Ok(obj) => obj,
        Err(err) => {
            debug!(%err, "cannot resolve page contents");
            return Vec::new();
        }
    };
    let decode = |obj: &PDFObject| -> Option<Arc<[u8]>> {
        let obj = doc.resolve_shared(obj).ok()?;
        let stream = obj.as_stream().ok()?;
        Some(Arc::from(doc.decode_stream(stream)))
    };
    match resolved.as_ref() {
        PDFObject::Array(parts) => parts.iter().filter_map(decode).collect(),
        other => decode(other).into_iter().collect(),
    }
}

/// Depth-first page-tree walk with an explicit stack.
pub struct PageIterator<'a> {
    doc: &'a PDFDocument,
    /// (node, inherited attributes of its parent)
    stack: Vec<(PDFObject, Arc<PDFDict>)>,
    visited: FxHashSet<u32>,
}

impl<'a> PageIterator<'a> {
    pub(crate) fn new(doc: &'a PDFDocument) -> Self {
        let stack = match doc.catalog().get_key("Pages") {
            Some(root) => vec![(root.clone(), Arc::new(PDFDict::new()))],
            None => Vec::new(),
        };
        Self {
            doc,
            stack,
            visited: FxHashSet::default(),
        }
    }
}

impl Iterator for PageIterator<'_> {
    type Item = PDFPage;

    fn next(&mut self) -> Option<PDFPage> {
        while let Some((node, inherited)) = self.stack.pop() {
            let objid = match &node {
                PDFObject::Ref(r) => {
                    if !self.visited.insert(r.objid) {
                        debug!(objid = r.objid, "page tree revisits node");
                        continue;
                    }
                    r.objid
                }
                _ => 0,
            };
            let resolved = match self.doc.resolve_shared(&node) {
                Ok(obj) => obj,
                Err(err) => {
                    warn!(objid, %err, "skipping unreadable page-tree node");
                    continue;
                }
            };
            let Ok(dict) = resolved.as_dict() else {
                continue;
            };

            let kids = self.doc.resolve_entry(dict, "Kids");
            let is_pages = dict.is_name("Type", "Pages")
                || (!dict.is_name("Type", "Page") && kids.is_some());

            if is_pages {
                let mut merged = inherited.as_ref().clone();
                for key in INHERITABLE {
                    if let Some(value) = dict.get_key(key) {
                        merged.insert(key.as_bytes().to_vec(), value.clone());
                    }
                }
                let merged = Arc::new(merged);
                if let Some(PDFObject::Array(kids)) = kids {
                    for kid in kids.into_iter().rev() {
                        self.stack.push((kid, Arc::clone(&merged)));
                    }
                }
                continue;
            }

            let mut attrs = dict.clone();
            for key in INHERITABLE {
                if attrs.get_key(key).is_none()
                    && let Some(value) = inherited.get_key(key)
                {
                    attrs.insert(key.as_bytes().to_vec(), value.clone());
                }
            }
            return Some(PDFPage::from_attrs(objid, attrs, self.doc));
        }
        None
    }
}

impl PDFDocument {
    /// Page at `index` in document order.
    pub fn page(&self, index: usize) -> Result<PDFPage> {
        self.pages()
            .nth(index)
            .ok_or_else(|| PdfError::InvalidArgument(format!("page index {index} out of range")))
    }
}
