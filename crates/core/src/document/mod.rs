//! Document structure: cross-reference tables, object resolution, pages
//! and decryption.
//!
//! - `xref` - classic and stream cross-reference tables
//! - `catalog` - PDFDocument, lazy object resolution and caching
//! - `page` - page-tree walk and page attributes
//! - `security` - standard security handlers
//! - `saslprep` - password preparation for AES-256 revision 6

pub mod catalog;
pub mod page;
pub mod saslprep;
pub mod security;
pub mod xref;

pub use catalog::PDFDocument;
pub use page::{PDFPage, PageIterator};
pub use security::{
    CryptMethod, PASSWORD_PADDING, SecurityHandler, StandardSecurityHandlerV2,
    StandardSecurityHandlerV4, StandardSecurityHandlerV5, create_security_handler,
};
pub use xref::{XRef, XRefEntry};
