//! High-level record extraction.
//!
//! - [`extract_pages`] interprets every page in order with one interpreter
//! - [`extract_pages_parallel`] spreads pages over the rayon pool
//!
//! A page whose content fails to interpret yields a [`PageRecords`] with
//! `error` set; the other pages are still returned.

use crate::config::OpenOptions;
use crate::document::catalog::PDFDocument;
use crate::document::page::PDFPage;
use crate::error::Result;
use crate::interp::interpreter::PageInterpreter;
use crate::interp::record::Record;
use crate::utils::Rect;
use bytes::Bytes;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

/// Records of one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRecords {
    /// Zero-based position in the page tree
    pub index: usize,
    /// Crop box the records were laid out against
    #[serde(rename = "box")]
    pub bbox: Rect,
    pub rotate: i64,
    pub records: Vec<Record>,
    /// Why interpretation stopped, if it did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageRecords {
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Run one page through `interpreter`, turning a failure into an error entry.
pub fn interpret_page(
    interpreter: &mut PageInterpreter<'_>,
    index: usize,
    page: &PDFPage,
) -> PageRecords {
    let (records, error) = match interpreter.process_page(page) {
        Ok(records) => (records, None),
        Err(err) => {
            warn!(page = index, pageid = page.pageid, %err, "page interpretation failed");
            (interpreter.take_records(), Some(err.to_string()))
        }
    };
    PageRecords {
        index,
        bbox: page.cropbox,
        rotate: page.rotate,
        records,
        error,
    }
}

/// Interpret every page of an open document, in order.
pub fn extract_pages_with_document(doc: &PDFDocument) -> Vec<PageRecords> {
    let mut interpreter = PageInterpreter::new(doc);
    doc.pages()
        .enumerate()
        .map(|(index, page)| interpret_page(&mut interpreter, index, &page))
        .collect()
}

/// Like [`extract_pages_with_document`], one rayon task per page.
///
/// Results keep page order. Each worker reuses one interpreter; fonts
/// come from the shared document cache.
pub fn extract_pages_parallel_with_document(doc: &PDFDocument) -> Vec<PageRecords> {
    let pages: Vec<(usize, PDFPage)> = doc.pages().enumerate().collect();
    pages
        .into_par_iter()
        .map_init(
            || PageInterpreter::new(doc),
            |interpreter, (index, page)| interpret_page(interpreter, index, &page),
        )
        .collect()
}

/// Open `data` and interpret all of its pages.
pub fn extract_pages(data: impl Into<Bytes>, options: &OpenOptions) -> Result<Vec<PageRecords>> {
    let doc = PDFDocument::open_with(data, options)?;
    let pages = extract_pages_with_document(&doc);
    info!(pages = pages.len(), "extracted page records");
    Ok(pages)
}

/// Open `data` and interpret its pages on the rayon pool.
pub fn extract_pages_parallel(
    data: impl Into<Bytes>,
    options: &OpenOptions,
) -> Result<Vec<PageRecords>> {
    let doc = PDFDocument::open_with(data, options)?;
    let pages = extract_pages_parallel_with_document(&doc);
    info!(pages = pages.len(), "extracted page records in parallel");
    Ok(pages)
}
