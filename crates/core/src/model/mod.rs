//! PDF model types: objects, graphics/text state and color spaces.

pub mod color;
pub mod objects;
pub mod state;

pub use color::{Color, ColorSpaceFamily, PDFColorSpace};
pub use objects::{PDFDict, PDFObjRef, PDFObject, PDFStream};
pub use state::{PDFGraphicState, PDFTextState};
