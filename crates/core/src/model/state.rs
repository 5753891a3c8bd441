//! Graphics and text state.
//!
//! Both are plain values: `q` pushes a clone, `Q` pops it back, so a saved
//! state never sees later changes.

use super::color::{Color, PDFColorSpace};
use crate::font::pdffont::PDFFont;
use crate::utils::{MATRIX_IDENTITY, Matrix};
use std::sync::Arc;

/// Text state parameters.
#[derive(Debug, Clone)]
pub struct PDFTextState {
    /// Current font (None until `Tf` finds one)
    pub font: Option<Arc<PDFFont>>,
    /// Resource name given to `Tf`
    pub fontname: Option<String>,
    pub fontsize: f64,
    /// Character spacing (`Tc`)
    pub charspace: f64,
    /// Word spacing (`Tw`), applied to the single-byte space code
    pub wordspace: f64,
    /// Horizontal scaling in percent (`Tz`)
    pub scaling: f64,
    /// Leading (`TL`)
    pub leading: f64,
    /// Rendering mode (`Tr`)
    pub render: i64,
    /// Rise (`Ts`)
    pub rise: f64,
    /// Text matrix
    pub matrix: Matrix,
    /// Text line matrix
    pub linematrix: Matrix,
}

impl Default for PDFTextState {
    fn default() -> Self {
        Self {
            font: None,
            fontname: None,
            fontsize: 0.0,
            charspace: 0.0,
            wordspace: 0.0,
            scaling: 100.0,
            leading: 0.0,
            render: 0,
            rise: 0.0,
            matrix: MATRIX_IDENTITY,
            linematrix: MATRIX_IDENTITY,
        }
    }
}

impl PDFTextState {
    /// Start of a text object (`BT`).
    pub fn reset(&mut self) {
        self.matrix = MATRIX_IDENTITY;
        self.linematrix = MATRIX_IDENTITY;
    }
}

/// Graphics state parameters.
#[derive(Debug, Clone)]
pub struct PDFGraphicState {
    pub linewidth: f64,
    pub linecap: Option<i64>,
    pub linejoin: Option<i64>,
    pub miterlimit: Option<f64>,
    /// Dash pattern: (array, phase)
    pub dash: Option<(Vec<f64>, f64)>,
    /// Rendering intent
    pub intent: Option<String>,
    pub flatness: Option<f64>,

    /// Stroking color and space
    pub scolor: Color,
    pub scs: PDFColorSpace,
    /// Non-stroking color and space
    pub ncolor: Color,
    pub ncs: PDFColorSpace,
}

impl Default for PDFGraphicState {
    fn default() -> Self {
        Self {
            linewidth: 1.0,
            linecap: None,
            linejoin: None,
            miterlimit: None,
            dash: None,
            intent: None,
            flatness: None,
            scolor: Color::gray(0.0),
            scs: PDFColorSpace::default(),
            ncolor: Color::gray(0.0),
            ncs: PDFColorSpace::default(),
        }
    }
}
