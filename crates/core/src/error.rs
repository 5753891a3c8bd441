//! Error types for the pdfgraph engine.

use thiserror::Error;

/// Primary error type for parsing, resolution, decoding and interpretation.
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("invalid token at position {pos}: {msg}")]
    TokenError { pos: usize, msg: String },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },

    #[error("key not found: {0}")]
    KeyError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF object not found: {0}")]
    ObjectNotFound(u32),

    #[error("circular reference detected for obj {0}")]
    CircularReference(u32),

    #[error("no valid xref table found")]
    NoValidXRef,

    #[error("PDF syntax error: {0}")]
    SyntaxError(String),

    #[error("decode error: {0}")]
    DecodeError(String),

    #[error("encryption error: {0}")]
    EncryptionError(String),

    #[error("content stream error: {0}")]
    InterpreterError(String),

    #[error("operation budget of {0} operators exceeded")]
    BudgetExceeded(usize),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience Result type alias for PdfError.
pub type Result<T> = std::result::Result<T, PdfError>;
