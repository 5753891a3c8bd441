//! Geometry helpers shared by the page model and the interpreter.

/// A 2D point (x, y).
pub type Point = (f64, f64);

/// A rectangle (x0, y0, x1, y1).
pub type Rect = (f64, f64, f64, f64);

/// A 6-element affine transformation matrix (a, b, c, d, e, f).
/// Transforms point (x, y) to (ax + cy + e, bx + dy + f).
pub type Matrix = (f64, f64, f64, f64, f64, f64);

/// Identity transformation matrix.
pub const MATRIX_IDENTITY: Matrix = (1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

/// Multiplies two matrices: result = m1 * m0.
/// This applies m1 first, then m0 (row-vector convention).
pub fn mult_matrix(m1: Matrix, m0: Matrix) -> Matrix {
    let (a1, b1, c1, d1, e1, f1) = m1;
    let (a0, b0, c0, d0, e0, f0) = m0;
    (
        a0 * a1 + c0 * b1,
        b0 * a1 + d0 * b1,
        a0 * c1 + c0 * d1,
        b0 * c1 + d0 * d1,
        a0 * e1 + c0 * f1 + e0,
        b0 * e1 + d0 * f1 + f0,
    )
}

/// Applies a matrix to a point.
pub fn apply_matrix_pt(m: Matrix, v: Point) -> Point {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    (a * x + c * y + e, b * x + d * y + f)
}

/// Translation matrix.
pub const fn translation(tx: f64, ty: f64) -> Matrix {
    (1.0, 0.0, 0.0, 1.0, tx, ty)
}

/// Orders a rectangle's corners so that x0 <= x1 and y0 <= y1.
pub fn normalize_rect(r: Rect) -> Rect {
    let (x0, y0, x1, y1) = r;
    (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_then_translate() {
        // cm [2 0 0 2 0 0] then cm [1 0 0 1 10 0]: ctm = mult(new, ctm)
        let ctm = mult_matrix((2.0, 0.0, 0.0, 2.0, 0.0, 0.0), MATRIX_IDENTITY);
        let ctm = mult_matrix(translation(10.0, 0.0), ctm);
        assert_eq!(apply_matrix_pt(ctm, (0.0, 0.0)), (20.0, 0.0));
    }

    #[test]
    fn identity_is_neutral() {
        let m = (1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        assert_eq!(mult_matrix(m, MATRIX_IDENTITY), m);
        assert_eq!(mult_matrix(MATRIX_IDENTITY, m), m);
    }

    #[test]
    fn normalize_swaps_corners() {
        assert_eq!(normalize_rect((5.0, 8.0, 1.0, 2.0)), (1.0, 2.0, 5.0, 8.0));
    }
}
