//! Graphics state operators.
//!
//! Handles: q, Q, cm, w, J, j, M, d, ri, i, gs
//!
//! - q/Q: Push/pop graphics state
//! - cm: Concatenate transformation matrix
//! - w, J, j, M, d: Line styling (width, cap, join, miter limit, dash)
//! - ri, i: Rendering intent and flatness, kept but not acted on
//! - gs: Set parameters from an `ExtGState` dictionary

use crate::interp::interpreter::PageInterpreter;
use crate::model::objects::PDFObject;
use crate::utils::{Matrix, mult_matrix};
use tracing::{debug, warn};

#[allow(non_snake_case)]
impl PageInterpreter<'_> {
    /// Saves the current graphics state to the stack.
    ///
    /// PDF operator: `q`
    pub fn do_q(&mut self) {
        self.gstack.push(self.get_current_state());
    }

    /// Restores the graphics state from the stack.
    ///
    /// PDF operator: `Q`
    pub fn do_Q(&mut self) {
        match self.gstack.pop() {
            Some(state) => self.set_current_state(state),
            None => debug!("Q without matching q"),
        }
    }

    /// Concatenates a matrix to the current transformation matrix.
    ///
    /// PDF operator: `cm`
    pub fn do_cm(&mut self, matrix: Matrix) {
        self.ctm = mult_matrix(matrix, self.ctm);
    }

    /// PDF operator: `w`
    pub const fn do_w(&mut self, linewidth: f64) {
        self.graphicstate.linewidth = linewidth;
    }

    /// PDF operator: `J`
    pub const fn do_J(&mut self, linecap: i64) {
        self.graphicstate.linecap = Some(linecap);
    }

    /// PDF operator: `j`
    pub const fn do_j(&mut self, linejoin: i64) {
        self.graphicstate.linejoin = Some(linejoin);
    }

    /// PDF operator: `M`
    pub const fn do_M(&mut self, miterlimit: f64) {
        self.graphicstate.miterlimit = Some(miterlimit);
    }

    /// PDF operator: `d`
    pub fn do_d(&mut self, dash_array: Vec<f64>, phase: f64) {
        self.graphicstate.dash = Some((dash_array, phase));
    }

    /// PDF operator: `ri`
    pub fn do_ri(&mut self, intent: &[u8]) {
        self.graphicstate.intent = Some(String::from_utf8_lossy(intent).into_owned());
    }

    /// PDF operator: `i`
    pub const fn do_i(&mut self, flatness: f64) {
        self.graphicstate.flatness = Some(flatness);
    }

    /// Applies the line, dash and font entries of a named `ExtGState`.
    ///
    /// PDF operator: `gs`
    pub fn do_gs(&mut self, name: &[u8]) {
        let Some(PDFObject::Dict(states)) = self.doc.resolve_entry(&self.resources, "ExtGState")
        else {
            warn!(name = %String::from_utf8_lossy(name), "gs without ExtGState resources");
            return;
        };
        let params = match states.get(name).map(|o| self.doc.resolve(o)) {
            Some(Ok(PDFObject::Dict(params))) => params,
            _ => {
                warn!(name = %String::from_utf8_lossy(name), "undefined ExtGState");
                return;
            }
        };

        for (key, value) in &params {
            let value = match self.doc.resolve(value) {
                Ok(v) => v,
                Err(err) => {
                    debug!(%err, "unreadable ExtGState entry");
                    continue;
                }
            };
            match key.as_slice() {
                b"LW" => {
                    if let Ok(w) = value.as_num() {
                        self.do_w(w);
                    }
                }
                b"LC" => {
                    if let Ok(n) = value.as_int() {
                        self.do_J(n);
                    }
                }
                b"LJ" => {
                    if let Ok(n) = value.as_int() {
                        self.do_j(n);
                    }
                }
                b"ML" => {
                    if let Ok(m) = value.as_num() {
                        self.do_M(m);
                    }
                }
                b"D" => {
                    // [[dash array] phase]
                    if let PDFObject::Array(items) = &value
                        && let [PDFObject::Array(dashes), phase] = items.as_slice()
                    {
                        let dashes = dashes.iter().filter_map(|d| d.as_num().ok()).collect();
                        self.do_d(dashes, phase.as_num().unwrap_or(0.0));
                    }
                }
                b"RI" => {
                    if let Ok(intent) = value.as_name() {
                        self.do_ri(intent);
                    }
                }
                b"FL" => {
                    if let Ok(f) = value.as_num() {
                        self.do_i(f);
                    }
                }
                b"Font" => {
                    // [font size], font given by reference
                    if let PDFObject::Array(items) = &value
                        && let [font, size] = items.as_slice()
                    {
                        if let Ok(size) = self.doc.resolve(size).and_then(|s| s.as_num()) {
                            self.textstate.fontsize = size;
                        }
                        self.textstate.font = self.load_font(font);
                        self.textstate.fontname = None;
                    }
                }
                _ => {}
            }
        }
    }
}
