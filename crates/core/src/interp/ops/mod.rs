//! Content stream operator implementations.
//!
//! Operators are grouped by category:
//! - `graphics_state` - State stack and transforms (q, Q, cm, w, J, j, M, d, ri, i, gs)
//! - `color` - Color space and values (G, g, RG, rg, K, k, CS, cs, SC, SCN, sc, scn)
//! - `path` - Path construction and painting (m, l, c, v, y, h, re, S, s, f, F, f\*, B, B\*, b, b\*, n)
//! - `text` - Text state and showing (BT, Tf, Td, TD, Tm, T\*, Tj, TJ, ', ")
//! - `xobject` - XObjects, inline images and marked content (Do, BI, BMC, BDC, EMC)

mod color;
mod graphics_state;
mod path;
mod text;
mod xobject;

// Each file adds an impl block to PageInterpreter; nothing to re-export.
