//! XObject, inline image and marked content operators.
//!
//! Handles: Do, BI/ID/EI, BMC, BDC, EMC
//!
//! Form XObjects run in place with their own matrix and resources.
//! Images, external or inline, become [`Record::Image`]s covering the unit
//! square mapped through the image matrix.

use crate::error::Result;
use crate::interp::interpreter::PageInterpreter;
use crate::interp::record::Record;
use crate::model::objects::{DictExt, PDFDict, PDFObject, PDFStream};
use crate::utils::{MATRIX_IDENTITY, Matrix, apply_matrix_pt, mult_matrix};
use tracing::{debug, warn};

/// Six numbers as a matrix.
fn to_matrix(obj: Option<&PDFObject>) -> Option<Matrix> {
    match obj? {
        PDFObject::Array(items) if items.len() == 6 => {
            let n: Vec<f64> = items.iter().map(|i| i.as_num().ok()).collect::<Option<_>>()?;
            Some((n[0], n[1], n[2], n[3], n[4], n[5]))
        }
        _ => None,
    }
}

/// Image dimensions, zero or missing treated as 1.
fn image_size(dict: &PDFDict, width_keys: &[&str], height_keys: &[&str]) -> (f64, f64) {
    let dim = |keys: &[&str]| {
        dict.get_any(keys)
            .and_then(|v| v.as_num().ok())
            .filter(|&n| n != 0.0)
            .unwrap_or(1.0)
    };
    (dim(width_keys), dim(height_keys))
}

#[allow(non_snake_case)]
impl PageInterpreter<'_> {
    fn emit_image(&mut self, matrix: Option<Matrix>, (w, h): (f64, f64), raw_bytes: Vec<u8>) {
        let m = matrix.unwrap_or((1.0 / w, 0.0, 0.0, 1.0 / h, 0.0, 0.0));
        let ctm = mult_matrix(m, self.ctm);
        let (x0, y0) = apply_matrix_pt(ctm, (0.0, 0.0));
        let (x1, y1) = apply_matrix_pt(ctm, (w, h));
        self.records.push(Record::Image {
            raw_bytes,
            x0,
            y0,
            x1,
            y1,
        });
    }

    /// Invoke a named XObject from `Resources/XObject`.
    ///
    /// PDF operator: `Do`
    pub fn do_Do(&mut self, name: &[u8]) -> Result<()> {
        let label = String::from_utf8_lossy(name).into_owned();
        let Some(entry) = self
            .doc
            .resolve_entry(&self.resources, "XObject")
            .and_then(|x| x.as_dict().ok()?.get(name).cloned())
        else {
            warn!(xobject = %label, "undefined XObject");
            return Ok(());
        };
        let objid = match &entry {
            PDFObject::Ref(r) => Some(r.objid),
            _ => None,
        };
        let resolved = match self.doc.resolve_shared(&entry) {
            Ok(obj) => obj,
            Err(err) => {
                warn!(xobject = %label, %err, "cannot resolve XObject");
                return Ok(());
            }
        };
        let Ok(stream) = resolved.as_stream() else {
            warn!(xobject = %label, "XObject is not a stream");
            return Ok(());
        };

        let subtype = self.doc.resolve_entry(&stream.attrs, "Subtype");
        match subtype.as_ref().and_then(PDFObject::name_str).as_deref() {
            Some("Form") => self.run_form(&label, objid, stream),
            Some("Image") => {
                let size = image_size(&stream.attrs, &["Width"], &["Height"]);
                let matrix = to_matrix(stream.get("Matrix"));
                self.emit_image(matrix, size, stream.get_rawdata().to_vec());
                Ok(())
            }
            other => {
                debug!(xobject = %label, subtype = ?other, "unsupported XObject subtype");
                Ok(())
            }
        }
    }

    fn run_form(&mut self, label: &str, objid: Option<u32>, stream: &PDFStream) -> Result<()> {
        if let Some(id) = objid
            && self.form_stack.contains(&id)
        {
            warn!(xobject = label, objid = id, "recursive form XObject skipped");
            return Ok(());
        }
        let max_depth = self.doc.options().max_xobject_depth;
        if self.form_stack.len() >= max_depth {
            warn!(xobject = label, max_depth, "form XObject nesting too deep, skipped");
            return Ok(());
        }

        let content = self.doc.decode_stream(stream).to_vec();
        let matrix = to_matrix(stream.get("Matrix")).unwrap_or(MATRIX_IDENTITY);
        let resources = match self.doc.resolve_entry(&stream.attrs, "Resources") {
            Some(PDFObject::Dict(own)) => own,
            _ => self.resources.clone(),
        };

        let saved = self.get_current_state();
        let saved_depth = self.gstack.len();
        let saved_resources = std::mem::replace(&mut self.resources, resources);
        let saved_path = std::mem::take(&mut self.curpath);
        self.form_stack.push(objid.unwrap_or(u32::MAX));
        self.ctm = mult_matrix(matrix, self.ctm);

        let result = self.execute(&content);

        self.form_stack.pop();
        self.gstack.truncate(saved_depth);
        self.curpath = saved_path;
        self.resources = saved_resources;
        self.set_current_state(saved);
        result
    }

    /// Emit a record for a `BI ... ID ... EI` image.
    pub fn do_inline_image(&mut self, dict: &PDFDict, data: Vec<u8>) {
        let size = image_size(dict, &["W", "Width"], &["H", "Height"]);
        let matrix = to_matrix(dict.get_key("Matrix"));
        self.emit_image(matrix, size, data);
    }

    /// PDF operators: `BMC`, `BDC`
    pub fn do_BMC(&mut self, tag: Vec<u8>) {
        self.marked_content.push(tag);
    }

    /// PDF operator: `EMC`
    pub fn do_EMC(&mut self) {
        if self.marked_content.pop().is_none() {
            debug!("EMC without matching BMC");
        }
    }
}
