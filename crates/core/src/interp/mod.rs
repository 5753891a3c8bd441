//! Page content interpretation.
//!
//! This module contains:
//! - `content`: content stream tokenizer, inline images included
//! - `interpreter`: the page interpreter and operator dispatch
//! - `ops`: operator implementations by category
//! - `record`: the records a page produces

pub mod content;
pub mod interpreter;
mod ops;
pub mod record;

pub use content::{ContentParser, ContentToken};
pub use interpreter::{PageInterpreter, PathSegment, initial_ctm};
pub use record::Record;
