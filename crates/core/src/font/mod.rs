//! Fonts for text showing.
//!
//! - CMap and ToUnicode parsing
//! - Single-byte encodings and `Differences`
//! - The injectable glyph/metric lookup service

pub mod cmap;
pub mod encoding;
pub mod pdffont;
pub mod resources;

pub use cmap::{CMap, UnicodeMap};
pub use encoding::{BaseEncoding, DiffEntry};
pub use pdffont::{FontKind, PDFFont};
pub use resources::{BuiltinResources, FontMetrics, FontResources};
