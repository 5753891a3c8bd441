//! Color spaces and color values.

use crate::document::catalog::PDFDocument;
use crate::model::objects::{PDFDict, PDFObject};
use smallvec::{SmallVec, smallvec};
use tracing::debug;

/// Color space families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpaceFamily {
    DeviceGray,
    DeviceRGB,
    DeviceCMYK,
    CalGray,
    CalRGB,
    Lab,
    ICCBased,
    Indexed,
    Separation,
    DeviceN,
    Pattern,
}

impl ColorSpaceFamily {
    /// Family by name, including the inline-image abbreviations.
    pub fn from_name(name: &[u8]) -> Option<Self> {
        Some(match name {
            b"DeviceGray" | b"G" => Self::DeviceGray,
            b"DeviceRGB" | b"RGB" => Self::DeviceRGB,
            b"DeviceCMYK" | b"CMYK" => Self::DeviceCMYK,
            b"CalGray" => Self::CalGray,
            b"CalRGB" => Self::CalRGB,
            b"Lab" => Self::Lab,
            b"ICCBased" => Self::ICCBased,
            b"Indexed" | b"I" => Self::Indexed,
            b"Separation" => Self::Separation,
            b"DeviceN" => Self::DeviceN,
            b"Pattern" => Self::Pattern,
            _ => return None,
        })
    }

    const fn default_components(self) -> usize {
        match self {
            Self::DeviceRGB | Self::CalRGB | Self::Lab | Self::ICCBased => 3,
            Self::DeviceCMYK => 4,
            _ => 1,
        }
    }
}

/// A color space with its component count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PDFColorSpace {
    pub family: ColorSpaceFamily,
    pub ncomponents: usize,
}

impl Default for PDFColorSpace {
    fn default() -> Self {
        Self::device(ColorSpaceFamily::DeviceGray)
    }
}

impl PDFColorSpace {
    pub const fn device(family: ColorSpaceFamily) -> Self {
        Self {
            family,
            ncomponents: family.default_components(),
        }
    }

    /// Color a space starts out with after `CS`/`cs`.
    pub fn initial_color(&self) -> Color {
        let components = match self.family {
            ColorSpaceFamily::DeviceCMYK => smallvec![0.0, 0.0, 0.0, 1.0],
            ColorSpaceFamily::Separation | ColorSpaceFamily::DeviceN => {
                smallvec![1.0; self.ncomponents]
            }
            ColorSpaceFamily::Indexed => smallvec![0.0],
            ColorSpaceFamily::Pattern => SmallVec::new(),
            _ => smallvec![0.0; self.ncomponents],
        };
        Color {
            components,
            pattern: None,
        }
    }

    /// Build a color space from a resolved name or array.
    pub fn from_object(obj: &PDFObject, doc: &PDFDocument) -> Option<Self> {
        match obj {
            PDFObject::Name(name) => ColorSpaceFamily::from_name(name).map(Self::device),
            PDFObject::Array(items) => {
                let family = ColorSpaceFamily::from_name(items.first()?.as_name().ok()?)?;
                let param = |i: usize| items.get(i).and_then(|p| doc.resolve(p).ok());
                let ncomponents = match family {
                    ColorSpaceFamily::ICCBased => param(1)
                        .and_then(|s| doc.resolve_entry(s.as_dict().ok()?, "N"))
                        .and_then(|n| n.as_int().ok())
                        .and_then(|n| usize::try_from(n).ok())
                        .unwrap_or(3),
                    ColorSpaceFamily::DeviceN => param(1)
                        .and_then(|names| names.as_array().ok().map(Vec::len))
                        .unwrap_or(1),
                    ColorSpaceFamily::Pattern => param(1)
                        .and_then(|base| Self::from_object(&base, doc))
                        .map_or(0, |base| base.ncomponents),
                    ColorSpaceFamily::Indexed | ColorSpaceFamily::Separation => 1,
                    other => other.default_components(),
                };
                Some(Self { family, ncomponents })
            }
            _ => None,
        }
    }

    /// Look `name` up as a device space, then in `Resources/ColorSpace`.
    pub fn lookup(name: &[u8], resources: &PDFDict, doc: &PDFDocument) -> Option<Self> {
        if let Some(family) = ColorSpaceFamily::from_name(name) {
            return Some(Self::device(family));
        }
        let spaces = doc.resolve_entry(resources, "ColorSpace")?;
        let entry = spaces.as_dict().ok()?.get(name)?;
        let resolved = doc.resolve(entry).ok()?;
        let space = Self::from_object(&resolved, doc);
        if space.is_none() {
            debug!(name = %String::from_utf8_lossy(name), "unsupported color space");
        }
        space
    }
}

/// A color: numeric components, plus a pattern name for `Pattern` spaces.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Color {
    pub components: SmallVec<[f64; 4]>,
    pub pattern: Option<String>,
}

impl Color {
    pub fn gray(g: f64) -> Self {
        Self::from_components(&[g])
    }

    pub fn from_components(components: &[f64]) -> Self {
        Self {
            components: SmallVec::from_slice(components),
            pattern: None,
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.components.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_colors() {
        let cmyk = PDFColorSpace::device(ColorSpaceFamily::DeviceCMYK);
        assert_eq!(cmyk.initial_color().to_vec(), vec![0.0, 0.0, 0.0, 1.0]);
        let rgb = PDFColorSpace::device(ColorSpaceFamily::DeviceRGB);
        assert_eq!(rgb.initial_color().to_vec(), vec![0.0; 3]);
        let sep = PDFColorSpace {
            family: ColorSpaceFamily::DeviceN,
            ncomponents: 2,
        };
        assert_eq!(sep.initial_color().to_vec(), vec![1.0, 1.0]);
        let pattern = PDFColorSpace::device(ColorSpaceFamily::Pattern);
        assert!(pattern.initial_color().components.is_empty());
    }

    #[test]
    fn abbreviations() {
        assert_eq!(ColorSpaceFamily::from_name(b"G"), Some(ColorSpaceFamily::DeviceGray));
        assert_eq!(ColorSpaceFamily::from_name(b"Foo"), None);
    }
}
