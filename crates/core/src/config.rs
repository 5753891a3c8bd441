//! Options for opening and interpreting a document.

use crate::font::resources::{BuiltinResources, FontResources};
use std::fmt;
use std::sync::Arc;

/// Default per-page operator budget.
pub const DEFAULT_MAX_OPERATORS: usize = 2_000_000;
/// Default nesting limit for Form XObjects.
pub const DEFAULT_MAX_XOBJECT_DEPTH: usize = 32;

/// Settings for [`PDFDocument::open_with`](crate::document::catalog::PDFDocument::open_with)
/// and the page interpreter.
#[derive(Clone)]
pub struct OpenOptions {
    /// Password tried as user password, then as owner password
    pub password: String,
    /// Rebuild the xref by scanning for objects when the table is unusable
    pub fallback: bool,
    /// Operators interpreted per page, Form XObjects included
    pub max_operators: usize,
    /// How deep Form XObjects may nest
    pub max_xobject_depth: usize,
    /// Glyph name, metric and CID lookup tables
    pub font_resources: Arc<dyn FontResources>,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            password: String::new(),
            fallback: true,
            max_operators: DEFAULT_MAX_OPERATORS,
            max_xobject_depth: DEFAULT_MAX_XOBJECT_DEPTH,
            font_resources: Arc::new(BuiltinResources),
        }
    }
}

impl fmt::Debug for OpenOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenOptions")
            .field("password", &"<redacted>")
            .field("fallback", &self.fallback)
            .field("max_operators", &self.max_operators)
            .field("max_xobject_depth", &self.max_xobject_depth)
            .finish_non_exhaustive()
    }
}

impl OpenOptions {
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_max_operators(mut self, max_operators: usize) -> Self {
        self.max_operators = max_operators;
        self
    }

    pub fn with_max_xobject_depth(mut self, depth: usize) -> Self {
        self.max_xobject_depth = depth;
        self
    }

    pub fn with_font_resources(mut self, resources: Arc<dyn FontResources>) -> Self {
        self.font_resources = resources;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_builders() {
        let opts = OpenOptions::default();
        assert!(opts.fallback);
        assert_eq!(opts.max_operators, 2_000_000);
        assert_eq!(opts.max_xobject_depth, 32);

        let opts = opts.with_password("pw").with_max_operators(10).with_fallback(false);
        assert_eq!(opts.password, "pw");
        assert_eq!(opts.max_operators, 10);
        assert!(!opts.fallback);
        assert!(!format!("{opts:?}").contains("pw"));
    }
}
