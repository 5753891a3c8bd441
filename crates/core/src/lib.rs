//! pdfgraph - reads PDF files into an object graph and interprets page
//! content into positioned glyph, line, rectangle and image records.
//!
//! ```no_run
//! use pdfgraph_core::{OpenOptions, extract_pages};
//!
//! let data = std::fs::read("doc.pdf").unwrap();
//! for page in extract_pages(data, &OpenOptions::default()).unwrap() {
//!     println!("page {}: {} records", page.index, page.records.len());
//! }
//! ```

pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod font;
pub mod high_level;
pub mod interp;
pub mod model;
pub mod parser;
pub mod utils;

pub use config::OpenOptions;
pub use document::{PDFDocument, PDFPage};
pub use error::{PdfError, Result};
pub use high_level::{PageRecords, extract_pages, extract_pages_parallel};
pub use interp::{PageInterpreter, Record};
pub use model::{PDFDict, PDFObjRef, PDFObject, PDFStream};
