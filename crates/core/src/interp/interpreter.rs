//! Page content interpreter.
//!
//! [`PageInterpreter`] runs a page's content stream as a stack machine:
//! operands accumulate until an operator consumes them, and drawing
//! operators append [`Record`]s. The operators themselves live in
//! `interp::ops`, grouped by family.
//!
//! Reference: PDF Reference, Appendix A, Operator Summary

use super::content::{ContentParser, ContentToken, join_parts};
use super::record::Record;
use crate::document::catalog::PDFDocument;
use crate::document::page::PDFPage;
use crate::error::{PdfError, Result};
use crate::model::objects::{PDFDict, PDFObject};
use crate::model::state::{PDFGraphicState, PDFTextState};
use crate::parser::lexer::Keyword;
use crate::utils::{MATRIX_IDENTITY, Matrix, Rect};
use tracing::debug;

/// Saved graphics state for q/Q operators.
pub(crate) type SavedState = (Matrix, PDFTextState, PDFGraphicState);

/// A segment of the path under construction, in user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    CurveTo(f64, f64, f64, f64, f64, f64),
    Close,
    /// A closed `m l l l h` subpath: first point and opposite corner
    Rect(f64, f64, f64, f64),
}

/// Initial CTM for a page: folds in the rotation and moves the crop box
/// origin to (0, 0).
pub fn initial_ctm(rotate: i64, (x0, y0, x1, y1): Rect) -> Matrix {
    match rotate {
        90 => (0.0, -1.0, 1.0, 0.0, -y0, x1),
        180 => (-1.0, 0.0, 0.0, -1.0, x1, y1),
        270 => (0.0, 1.0, -1.0, 0.0, y1, -x0),
        _ => (1.0, 0.0, 0.0, 1.0, -x0, -y0),
    }
}

/// Interprets page content into records.
///
/// One interpreter can process several pages of the same document; fonts
/// loaded through indirect references are kept between pages.
pub struct PageInterpreter<'a> {
    pub(crate) doc: &'a PDFDocument,
    /// Graphics state stack for q/Q operators
    pub(crate) gstack: Vec<SavedState>,
    pub(crate) ctm: Matrix,
    pub(crate) textstate: PDFTextState,
    pub(crate) graphicstate: PDFGraphicState,
    pub(crate) curpath: Vec<PathSegment>,
    /// Resources of the page or form being run
    pub(crate) resources: PDFDict,
    /// Form XObjects being run, innermost last
    pub(crate) form_stack: Vec<u32>,
    /// Open marked-content tags
    pub(crate) marked_content: Vec<Vec<u8>>,
    pub(crate) records: Vec<Record>,
    operators: usize,
}

impl<'a> PageInterpreter<'a> {
    pub fn new(doc: &'a PDFDocument) -> Self {
        Self {
            doc,
            gstack: Vec::new(),
            ctm: MATRIX_IDENTITY,
            textstate: PDFTextState::default(),
            graphicstate: PDFGraphicState::default(),
            curpath: Vec::new(),
            resources: PDFDict::new(),
            form_stack: Vec::new(),
            marked_content: Vec::new(),
            records: Vec::new(),
            operators: 0,
        }
    }

    pub const fn ctm(&self) -> Matrix {
        self.ctm
    }

    pub const fn graphicstate(&self) -> &PDFGraphicState {
        &self.graphicstate
    }

    pub const fn textstate(&self) -> &PDFTextState {
        &self.textstate
    }

    pub fn current_path(&self) -> &[PathSegment] {
        &self.curpath
    }

    /// Number of marked-content sequences currently open.
    pub fn marked_content_depth(&self) -> usize {
        self.marked_content.len()
    }

    /// Tags of the open marked-content sequences, outermost first.
    pub fn marked_content(&self) -> &[Vec<u8>] {
        &self.marked_content
    }

    /// Start from a clean state for a new page.
    pub fn init_state(&mut self, ctm: Matrix, resources: PDFDict) {
        self.gstack.clear();
        self.ctm = ctm;
        self.textstate = PDFTextState::default();
        self.graphicstate = PDFGraphicState::default();
        self.curpath.clear();
        self.resources = resources;
        self.form_stack.clear();
        self.marked_content.clear();
        self.records.clear();
        self.operators = 0;
    }

    /// Interpret one page and return its records.
    pub fn process_page(&mut self, page: &PDFPage) -> Result<Vec<Record>> {
        self.init_state(initial_ctm(page.rotate, page.cropbox), page.resources.clone());
        let content = join_parts(&page.contents);
        self.execute(&content)?;
        Ok(std::mem::take(&mut self.records))
    }

    /// Records emitted so far.
    pub fn take_records(&mut self) -> Vec<Record> {
        std::mem::take(&mut self.records)
    }

    pub(crate) fn get_current_state(&self) -> SavedState {
        (self.ctm, self.textstate.clone(), self.graphicstate.clone())
    }

    pub(crate) fn set_current_state(&mut self, (ctm, textstate, graphicstate): SavedState) {
        self.ctm = ctm;
        self.textstate = textstate;
        self.graphicstate = graphicstate;
    }

    fn count_operator(&mut self) -> Result<()> {
        self.operators += 1;
        let max = self.doc.options().max_operators;
        if self.operators > max {
            return Err(PdfError::BudgetExceeded(max));
        }
        Ok(())
    }

    /// Run a decoded content stream against the current state.
    pub fn execute(&mut self, content: &[u8]) -> Result<()> {
        let mut args: Vec<PDFObject> = Vec::new();
        for token in ContentParser::new(content) {
            match token? {
                ContentToken::Operand(obj) => args.push(obj),
                ContentToken::Operator(op) => {
                    self.count_operator()?;
                    self.dispatch_operator(&op, &mut args)?;
                    args.clear();
                }
                ContentToken::InlineImage { dict, data } => {
                    self.count_operator()?;
                    self.do_inline_image(&dict, data);
                    args.clear();
                }
            }
        }
        Ok(())
    }

    fn dispatch_operator(&mut self, op: &Keyword, args: &mut Vec<PDFObject>) -> Result<()> {
        match op {
            // Graphics state
            Keyword::Qq => self.do_q(),
            Keyword::Q => self.do_Q(),
            Keyword::Cm => match pop_numbers(args) {
                Some([a, b, c, d, e, f]) => self.do_cm((a, b, c, d, e, f)),
                None => missing_operands(op),
            },
            Keyword::Ww => match pop_numbers(args) {
                Some([w]) => self.do_w(w),
                None => missing_operands(op),
            },
            Keyword::J => match pop_int(args) {
                Some(n) => self.do_J(n),
                None => missing_operands(op),
            },
            Keyword::Jj => match pop_int(args) {
                Some(n) => self.do_j(n),
                None => missing_operands(op),
            },
            Keyword::M => match pop_numbers(args) {
                Some([m]) => self.do_M(m),
                None => missing_operands(op),
            },
            Keyword::D => {
                let phase = pop_numbers(args).map(|[p]| p);
                match (args.pop(), phase) {
                    (Some(PDFObject::Array(items)), Some(phase)) => {
                        self.do_d(items.iter().filter_map(|i| i.as_num().ok()).collect(), phase);
                    }
                    _ => missing_operands(op),
                }
            }
            Keyword::Ri => match pop_name(args) {
                Some(intent) => self.do_ri(&intent),
                None => missing_operands(op),
            },
            Keyword::I => match pop_numbers(args) {
                Some([f]) => self.do_i(f),
                None => missing_operands(op),
            },
            Keyword::Gs => match pop_name(args) {
                Some(name) => self.do_gs(&name),
                None => missing_operands(op),
            },

            // Path construction
            Keyword::Mm => match pop_numbers(args) {
                Some([x, y]) => self.do_m(x, y),
                None => missing_operands(op),
            },
            Keyword::L => match pop_numbers(args) {
                Some([x, y]) => self.do_l(x, y),
                None => missing_operands(op),
            },
            Keyword::C => match pop_numbers(args) {
                Some([x1, y1, x2, y2, x3, y3]) => self.do_c(x1, y1, x2, y2, x3, y3),
                None => missing_operands(op),
            },
            Keyword::V => match pop_numbers(args) {
                Some([x2, y2, x3, y3]) => self.do_v(x2, y2, x3, y3),
                None => missing_operands(op),
            },
            Keyword::Y => match pop_numbers(args) {
                Some([x1, y1, x3, y3]) => self.do_y(x1, y1, x3, y3),
                None => missing_operands(op),
            },
            Keyword::H => self.do_h(),
            Keyword::Re => match pop_numbers(args) {
                Some([x, y, w, h]) => self.do_re(x, y, w, h),
                None => missing_operands(op),
            },

            // Path painting
            Keyword::S => self.do_S(),
            Keyword::Ss => self.do_s(),
            Keyword::Ff | Keyword::F | Keyword::FStar => self.do_f(),
            Keyword::B | Keyword::BStar => self.do_B(),
            Keyword::Bb | Keyword::BbStar => self.do_b(),
            Keyword::N => self.do_n(),
            Keyword::WClip | Keyword::WStar => {}

            // Text object and state
            Keyword::BT => self.do_BT(),
            Keyword::ET => {}
            Keyword::Tc => match pop_numbers(args) {
                Some([n]) => self.textstate.charspace = n,
                None => missing_operands(op),
            },
            Keyword::Tw => match pop_numbers(args) {
                Some([n]) => self.textstate.wordspace = n,
                None => missing_operands(op),
            },
            Keyword::Tz => match pop_numbers(args) {
                Some([n]) => self.textstate.scaling = n,
                None => missing_operands(op),
            },
            Keyword::TL => match pop_numbers(args) {
                Some([n]) => self.textstate.leading = n,
                None => missing_operands(op),
            },
            Keyword::Tr => match pop_int(args) {
                Some(n) => self.textstate.render = n,
                None => missing_operands(op),
            },
            Keyword::Ts => match pop_numbers(args) {
                Some([n]) => self.textstate.rise = n,
                None => missing_operands(op),
            },
            Keyword::Tf => {
                let size = pop_numbers(args).map(|[s]| s);
                match (pop_name(args), size) {
                    (Some(name), Some(size)) => self.do_Tf(&name, size),
                    _ => missing_operands(op),
                }
            }

            // Text positioning
            Keyword::Td => match pop_numbers(args) {
                Some([tx, ty]) => self.do_Td(tx, ty),
                None => missing_operands(op),
            },
            Keyword::TD => match pop_numbers(args) {
                Some([tx, ty]) => self.do_TD(tx, ty),
                None => missing_operands(op),
            },
            Keyword::Tm => match pop_numbers(args) {
                Some([a, b, c, d, e, f]) => self.do_Tm((a, b, c, d, e, f)),
                None => missing_operands(op),
            },
            Keyword::TStar => self.do_T_star(),

            // Text showing
            Keyword::Tj => match args.pop() {
                Some(s @ PDFObject::String(_)) => self.show_text(&[s]),
                _ => missing_operands(op),
            },
            Keyword::TJ => match args.pop() {
                Some(PDFObject::Array(seq)) => self.show_text(&seq),
                _ => missing_operands(op),
            },
            Keyword::Quote => match args.pop() {
                Some(s @ PDFObject::String(_)) => {
                    self.do_T_star();
                    self.show_text(&[s]);
                }
                _ => missing_operands(op),
            },
            Keyword::DoubleQuote => {
                let text = args.pop();
                match (text, pop_numbers(args)) {
                    (Some(s @ PDFObject::String(_)), Some([aw, ac])) => {
                        self.textstate.wordspace = aw;
                        self.textstate.charspace = ac;
                        self.do_T_star();
                        self.show_text(&[s]);
                    }
                    _ => missing_operands(op),
                }
            }

            // Color
            Keyword::CS => match pop_name(args) {
                Some(name) => self.do_CS(&name),
                None => missing_operands(op),
            },
            Keyword::Cs => match pop_name(args) {
                Some(name) => self.do_cs(&name),
                None => missing_operands(op),
            },
            Keyword::SC | Keyword::SCN => self.do_SCN(args),
            Keyword::Sc | Keyword::Scn => self.do_scn(args),
            Keyword::G => match pop_numbers(args) {
                Some([g]) => self.do_G(g),
                None => missing_operands(op),
            },
            Keyword::Gg => match pop_numbers(args) {
                Some([g]) => self.do_g(g),
                None => missing_operands(op),
            },
            Keyword::RG => match pop_numbers(args) {
                Some([r, g, b]) => self.do_RG(r, g, b),
                None => missing_operands(op),
            },
            Keyword::Rg => match pop_numbers(args) {
                Some([r, g, b]) => self.do_rg(r, g, b),
                None => missing_operands(op),
            },
            Keyword::K => match pop_numbers(args) {
                Some([c, m, y, k]) => self.do_K(c, m, y, k),
                None => missing_operands(op),
            },
            Keyword::Kk => match pop_numbers(args) {
                Some([c, m, y, k]) => self.do_k(c, m, y, k),
                None => missing_operands(op),
            },

            // XObjects
            Keyword::Do => match pop_name(args) {
                Some(name) => self.do_Do(&name)?,
                None => missing_operands(op),
            },
            // only reachable without a matching BI
            Keyword::ID | Keyword::EI => missing_operands(op),

            // Marked content
            Keyword::BMC => match pop_name(args) {
                Some(tag) => self.do_BMC(tag),
                None => missing_operands(op),
            },
            Keyword::BDC => {
                let _properties = args.pop();
                match pop_name(args) {
                    Some(tag) => self.do_BMC(tag),
                    None => missing_operands(op),
                }
            }
            Keyword::EMC => self.do_EMC(),

            // Recognized, nothing to record
            Keyword::MP
            | Keyword::DP
            | Keyword::BX
            | Keyword::EX
            | Keyword::Sh
            | Keyword::D0
            | Keyword::D1 => {}

            Keyword::Unknown(name) => {
                return Err(PdfError::InterpreterError(format!(
                    "unknown operator {}",
                    String::from_utf8_lossy(name)
                )));
            }
            other => {
                return Err(PdfError::InterpreterError(format!(
                    "{} is not a content operator",
                    String::from_utf8_lossy(other.as_bytes())
                )));
            }
        }
        Ok(())
    }
}

fn missing_operands(op: &Keyword) {
    debug!(operator = %String::from_utf8_lossy(op.as_bytes()), "missing operands, skipped");
}

/// Pop the last `N` operands as numbers, in stream order.
pub(crate) fn pop_numbers<const N: usize>(args: &mut Vec<PDFObject>) -> Option<[f64; N]> {
    let start = args.len().checked_sub(N)?;
    let mut out = [0.0; N];
    for (slot, obj) in out.iter_mut().zip(&args[start..]) {
        *slot = obj.as_num().ok()?;
    }
    args.truncate(start);
    Some(out)
}

pub(crate) fn pop_int(args: &mut Vec<PDFObject>) -> Option<i64> {
    match args.pop()? {
        PDFObject::Int(n) => Some(n),
        PDFObject::Real(n) => Some(n as i64),
        _ => None,
    }
}

pub(crate) fn pop_name(args: &mut Vec<PDFObject>) -> Option<Vec<u8>> {
    match args.pop()? {
        PDFObject::Name(name) => Some(name),
        _ => None,
    }
}
