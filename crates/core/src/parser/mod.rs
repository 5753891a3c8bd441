//! PDF tokenizing and object parsing.
//!
//! - `lexer`: byte-level tokenizer shared by file and content-stream parsing
//! - `object_parser`: objects, indirect definitions and classic xref sections

pub mod lexer;
pub mod object_parser;

pub use lexer::{Keyword, Lexer, Token};
pub use object_parser::{LengthResolver, ObjectParser, ParsedItem};
