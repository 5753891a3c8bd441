//! Records emitted while interpreting a page.
//!
//! Coordinates are in device space: after the page's rotation and every
//! `cm` in effect.

use serde::Serialize;

/// One drawing or text event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Record {
    /// A stroked straight segment
    Line {
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        width: f64,
        stroke_color: Vec<f64>,
        fill_color: Vec<f64>,
    },
    /// A filled rectangle
    Rect {
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        stroke_color: Vec<f64>,
        fill_color: Vec<f64>,
    },
    /// A shown glyph: origin corner and advance/height corner
    Glyph {
        font_name: String,
        font_size: f64,
        text: String,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        size: f64,
    },
    /// An image XObject or inline image.
    ///
    /// `raw_bytes` is the stream payload as stored (decrypted but not
    /// run through its filters), so DCT, JPX or Flate data arrives
    /// compressed. Decode it with the stream's own `Filter` chain when
    /// pixels are needed.
    Image {
        raw_bytes: Vec<u8>,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
    },
}

impl Record {
    /// Lowercase kind name, as used in the serialized `type` tag.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Line { .. } => "line",
            Self::Rect { .. } => "rect",
            Self::Glyph { .. } => "glyph",
            Self::Image { .. } => "image",
        }
    }
}
