//! Text operators.
//!
//! Handles: BT, Tf, Td, TD, Tm, T*, and text showing through
//! [`PageInterpreter::show_text`] (Tj, TJ, ', ")
//!
//! The simple state setters (Tc, Tw, Tz, TL, Tr, Ts) write the text state
//! directly from the dispatcher.

use crate::font::pdffont::PDFFont;
use crate::interp::interpreter::PageInterpreter;
use crate::interp::record::Record;
use crate::model::objects::PDFObject;
use crate::utils::{Matrix, apply_matrix_pt, mult_matrix, translation};
use std::sync::Arc;
use tracing::{debug, warn};

#[allow(non_snake_case)]
impl PageInterpreter<'_> {
    /// Load a font from a font dictionary or a reference to one. Fonts
    /// given by reference come from the document's font cache.
    pub(crate) fn load_font(&self, spec: &PDFObject) -> Option<Arc<PDFFont>> {
        let loaded = match spec {
            PDFObject::Ref(objref) => self.doc.load_font(*objref),
            PDFObject::Dict(dict) => PDFFont::new(dict, self.doc).map(Arc::new),
            other => {
                warn!(got = other.type_name(), "font is not a dictionary");
                return None;
            }
        };
        match loaded {
            Ok(font) => Some(font),
            Err(err) => {
                warn!(%err, "cannot load font");
                None
            }
        }
    }

    /// Begin a text object.
    ///
    /// PDF operator: `BT`
    pub fn do_BT(&mut self) {
        self.textstate.reset();
    }

    /// Select a font from `Resources/Font` and set the size.
    ///
    /// PDF operator: `Tf`
    pub fn do_Tf(&mut self, name: &[u8], size: f64) {
        let fontname = String::from_utf8_lossy(name).into_owned();
        let spec = self
            .doc
            .resolve_entry(&self.resources, "Font")
            .and_then(|fonts| fonts.as_dict().ok()?.get(name).cloned());
        self.textstate.font = match spec {
            Some(spec) => self.load_font(&spec),
            None => {
                warn!(font = %fontname, "undefined font");
                None
            }
        };
        self.textstate.fontname = Some(fontname);
        self.textstate.fontsize = size;
    }

    /// Move to the start of the next line, offset from the current one.
    ///
    /// PDF operator: `Td`
    pub fn do_Td(&mut self, tx: f64, ty: f64) {
        let tm = mult_matrix(translation(tx, ty), self.textstate.linematrix);
        self.textstate.matrix = tm;
        self.textstate.linematrix = tm;
    }

    /// `Td` that also sets the leading.
    ///
    /// PDF operator: `TD`
    pub fn do_TD(&mut self, tx: f64, ty: f64) {
        self.textstate.leading = -ty;
        self.do_Td(tx, ty);
    }

    /// PDF operator: `Tm`
    pub const fn do_Tm(&mut self, matrix: Matrix) {
        self.textstate.matrix = matrix;
        self.textstate.linematrix = matrix;
    }

    /// PDF operator: `T*`
    pub fn do_T_star(&mut self) {
        self.do_Td(0.0, -self.textstate.leading);
    }

    /// Show a `TJ` sequence of strings and position adjustments,
    /// emitting a glyph record per decoded character.
    pub fn show_text(&mut self, seq: &[PDFObject]) {
        let Some(font) = self.textstate.font.clone() else {
            debug!(font = ?self.textstate.fontname, "text shown without a font");
            return;
        };
        let size = self.textstate.fontsize;
        let scale = self.textstate.scaling * 0.01;
        let charspace = self.textstate.charspace;
        let rise = self.textstate.rise;
        let vertical = font.is_vertical();
        let wordspace = if font.is_multibyte() {
            0.0
        } else {
            self.textstate.wordspace
        };
        let text_space = (size * scale, 0.0, 0.0, size, 0.0, rise + font.descent() * size);

        let mut tm = self.textstate.matrix;
        for item in seq {
            let bytes = match item {
                PDFObject::String(bytes) => bytes,
                PDFObject::Int(_) | PDFObject::Real(_) => {
                    let adjust = item.as_num().unwrap_or(0.0) * 0.001 * size;
                    let shift = if vertical {
                        translation(0.0, -adjust)
                    } else {
                        translation(-adjust * scale, 0.0)
                    };
                    tm = mult_matrix(shift, tm);
                    continue;
                }
                other => {
                    debug!(got = other.type_name(), "unexpected item in TJ array");
                    continue;
                }
            };

            for cid in font.decode(bytes) {
                let render = mult_matrix(mult_matrix(text_space, tm), self.ctm);
                let w = font.char_width(cid);
                let (x0, y0) = apply_matrix_pt(render, (0.0, 0.0));
                let (x1, y1) = apply_matrix_pt(render, (w, font.height()));
                let ws = if cid == 32 { wordspace } else { 0.0 };
                let glyph_size = if vertical {
                    let ty = font.char_disp(cid) * size + charspace + ws;
                    tm = mult_matrix(translation(0.0, ty), tm);
                    x1 - x0
                } else {
                    let tx = (w * size + charspace + ws) * scale;
                    tm = mult_matrix(translation(tx, 0.0), tm);
                    y1 - y0
                };
                self.records.push(Record::Glyph {
                    font_name: font.fontname.clone(),
                    font_size: size,
                    text: font.to_unicode(cid),
                    x0,
                    y0,
                    x1,
                    y1,
                    size: glyph_size,
                });
            }
        }
        self.textstate.matrix = tm;
    }
}
