//! Color operators.
//!
//! Handles: CS, cs, SC, SCN, sc, scn, G, g, RG, rg, K, k
//!
//! Upper-case operators act on the stroking color, lower-case ones on the
//! non-stroking (fill) color.

use crate::interp::interpreter::{PageInterpreter, pop_name};
use crate::model::color::{Color, ColorSpaceFamily, PDFColorSpace};
use crate::model::objects::PDFObject;
use smallvec::SmallVec;
use tracing::{debug, warn};

/// Pop a color for `space`: its component count of numbers, plus a
/// trailing pattern name in `Pattern` spaces.
fn pop_color(space: &PDFColorSpace, args: &mut Vec<PDFObject>) -> Option<Color> {
    let pattern = match (space.family, args.last()) {
        (ColorSpaceFamily::Pattern, Some(PDFObject::Name(_))) => {
            pop_name(args).map(|n| String::from_utf8_lossy(&n).into_owned())
        }
        _ => None,
    };
    let start = args.len().checked_sub(space.ncomponents)?;
    let components = args[start..]
        .iter()
        .map(|o| o.as_num().ok())
        .collect::<Option<SmallVec<[f64; 4]>>>()?;
    args.truncate(start);
    Some(Color {
        components,
        pattern,
    })
}

#[allow(non_snake_case)]
impl PageInterpreter<'_> {
    fn lookup_colorspace(&self, name: &[u8]) -> Option<PDFColorSpace> {
        let space = PDFColorSpace::lookup(name, &self.resources, self.doc);
        if space.is_none() {
            warn!(name = %String::from_utf8_lossy(name), "undefined color space");
        }
        space
    }

    /// PDF operator: `CS`
    pub fn do_CS(&mut self, name: &[u8]) {
        if let Some(space) = self.lookup_colorspace(name) {
            self.graphicstate.scolor = space.initial_color();
            self.graphicstate.scs = space;
        }
    }

    /// PDF operator: `cs`
    pub fn do_cs(&mut self, name: &[u8]) {
        if let Some(space) = self.lookup_colorspace(name) {
            self.graphicstate.ncolor = space.initial_color();
            self.graphicstate.ncs = space;
        }
    }

    /// PDF operators: `SC`, `SCN`
    pub fn do_SCN(&mut self, args: &mut Vec<PDFObject>) {
        match pop_color(&self.graphicstate.scs, args) {
            Some(color) => self.graphicstate.scolor = color,
            None => debug!(space = ?self.graphicstate.scs.family, "SCN operands do not match color space"),
        }
    }

    /// PDF operators: `sc`, `scn`
    pub fn do_scn(&mut self, args: &mut Vec<PDFObject>) {
        match pop_color(&self.graphicstate.ncs, args) {
            Some(color) => self.graphicstate.ncolor = color,
            None => debug!(space = ?self.graphicstate.ncs.family, "scn operands do not match color space"),
        }
    }

    fn set_stroke(&mut self, family: ColorSpaceFamily, components: &[f64]) {
        self.graphicstate.scs = PDFColorSpace::device(family);
        self.graphicstate.scolor = Color::from_components(components);
    }

    fn set_fill(&mut self, family: ColorSpaceFamily, components: &[f64]) {
        self.graphicstate.ncs = PDFColorSpace::device(family);
        self.graphicstate.ncolor = Color::from_components(components);
    }

    /// PDF operator: `G`
    pub fn do_G(&mut self, gray: f64) {
        self.set_stroke(ColorSpaceFamily::DeviceGray, &[gray]);
    }

    /// PDF operator: `g`
    pub fn do_g(&mut self, gray: f64) {
        self.set_fill(ColorSpaceFamily::DeviceGray, &[gray]);
    }

    /// PDF operator: `RG`
    pub fn do_RG(&mut self, r: f64, g: f64, b: f64) {
        self.set_stroke(ColorSpaceFamily::DeviceRGB, &[r, g, b]);
    }

    /// PDF operator: `rg`
    pub fn do_rg(&mut self, r: f64, g: f64, b: f64) {
        self.set_fill(ColorSpaceFamily::DeviceRGB, &[r, g, b]);
    }

    /// PDF operator: `K`
    pub fn do_K(&mut self, c: f64, m: f64, y: f64, k: f64) {
        self.set_stroke(ColorSpaceFamily::DeviceCMYK, &[c, m, y, k]);
    }

    /// PDF operator: `k`
    pub fn do_k(&mut self, c: f64, m: f64, y: f64, k: f64) {
        self.set_fill(ColorSpaceFamily::DeviceCMYK, &[c, m, y, k]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_color_takes_name() {
        let space = PDFColorSpace {
            family: ColorSpaceFamily::Pattern,
            ncomponents: 1,
        };
        let mut args = vec![PDFObject::Real(0.5), PDFObject::name("P1")];
        let color = pop_color(&space, &mut args).unwrap();
        assert_eq!(color.to_vec(), vec![0.5]);
        assert_eq!(color.pattern.as_deref(), Some("P1"));
        assert!(args.is_empty());
    }

    #[test]
    fn too_few_components() {
        let space = PDFColorSpace::device(ColorSpaceFamily::DeviceRGB);
        let mut args = vec![PDFObject::Int(1), PDFObject::Int(0)];
        assert!(pop_color(&space, &mut args).is_none());
    }
}
