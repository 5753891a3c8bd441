//! Path construction and painting operators.
//!
//! Handles: m, l, c, v, y, h, re, S, s, f, F, f*, B, B*, b, b*, n
//!
//! Construction appends [`PathSegment`]s in user space. Painting turns
//! them into device-space records: strokes become [`Record::Line`]s and
//! fills become [`Record::Rect`]s for each recognized rectangle. Clipping
//! (W, W*) is not applied.

use crate::interp::interpreter::{PageInterpreter, PathSegment};
use crate::interp::record::Record;
use crate::utils::{Point, apply_matrix_pt, normalize_rect};

impl PathSegment {
    /// End point of the segment, if it moves the current point.
    const fn end_point(&self) -> Option<Point> {
        match *self {
            Self::MoveTo(x, y) | Self::LineTo(x, y) | Self::CurveTo(_, _, _, _, x, y) => {
                Some((x, y))
            }
            Self::Rect(x, y, _, _) => Some((x, y)),
            Self::Close => None,
        }
    }
}

#[allow(non_snake_case)]
impl PageInterpreter<'_> {
    fn current_point(&self) -> Option<Point> {
        let mut point = None;
        let mut start = None;
        for seg in &self.curpath {
            match seg {
                PathSegment::MoveTo(x, y) | PathSegment::Rect(x, y, _, _) => {
                    start = Some((*x, *y));
                    point = start;
                }
                PathSegment::Close => point = start,
                other => point = other.end_point(),
            }
        }
        point
    }

    /// PDF operator: `m`
    pub fn do_m(&mut self, x: f64, y: f64) {
        self.curpath.push(PathSegment::MoveTo(x, y));
    }

    /// PDF operator: `l`
    pub fn do_l(&mut self, x: f64, y: f64) {
        self.curpath.push(PathSegment::LineTo(x, y));
    }

    /// PDF operator: `c`
    pub fn do_c(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        self.curpath.push(PathSegment::CurveTo(x1, y1, x2, y2, x3, y3));
    }

    /// Curve whose first control point is the current point.
    ///
    /// PDF operator: `v`
    pub fn do_v(&mut self, x2: f64, y2: f64, x3: f64, y3: f64) {
        let (x1, y1) = self.current_point().unwrap_or((x2, y2));
        self.curpath.push(PathSegment::CurveTo(x1, y1, x2, y2, x3, y3));
    }

    /// Curve whose second control point is its end point.
    ///
    /// PDF operator: `y`
    pub fn do_y(&mut self, x1: f64, y1: f64, x3: f64, y3: f64) {
        self.curpath.push(PathSegment::CurveTo(x1, y1, x3, y3, x3, y3));
    }

    /// Closes the subpath; a closed `m l l l` becomes a rectangle.
    ///
    /// PDF operator: `h`
    pub fn do_h(&mut self) {
        let n = self.curpath.len();
        let rect = match self.curpath.get(n.saturating_sub(4)..) {
            Some(
                &[
                    PathSegment::MoveTo(x0, y0),
                    PathSegment::LineTo(..),
                    PathSegment::LineTo(x2, y2),
                    PathSegment::LineTo(..),
                ],
            ) => Some(PathSegment::Rect(x0, y0, x2, y2)),
            _ => None,
        };
        match rect {
            Some(rect) => {
                self.curpath.truncate(n - 4);
                self.curpath.push(rect);
            }
            None => self.curpath.push(PathSegment::Close),
        }
    }

    /// PDF operator: `re`
    pub fn do_re(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.curpath.extend([
            PathSegment::MoveTo(x, y),
            PathSegment::LineTo(x + w, y),
            PathSegment::LineTo(x + w, y + h),
            PathSegment::LineTo(x, y + h),
        ]);
        self.do_h();
    }

    fn stroke_path(&mut self) {
        let ctm = self.ctm;
        let width = self.graphicstate.linewidth;
        let stroke_color = self.graphicstate.scolor.to_vec();
        let fill_color = self.graphicstate.ncolor.to_vec();
        let line = |(x0, y0): Point, (x1, y1): Point| {
            let (x0, y0) = apply_matrix_pt(ctm, (x0, y0));
            let (x1, y1) = apply_matrix_pt(ctm, (x1, y1));
            Record::Line {
                x0,
                y0,
                x1,
                y1,
                width,
                stroke_color: stroke_color.clone(),
                fill_color: fill_color.clone(),
            }
        };

        let mut point: Option<Point> = None;
        let mut start: Option<Point> = None;
        for seg in &self.curpath {
            match *seg {
                PathSegment::MoveTo(x, y) => {
                    point = Some((x, y));
                    start = point;
                }
                PathSegment::LineTo(x, y) => {
                    if let Some(p) = point {
                        self.records.push(line(p, (x, y)));
                    }
                    point = Some((x, y));
                    start = start.or(point);
                }
                PathSegment::CurveTo(_, _, _, _, x, y) => {
                    point = Some((x, y));
                    start = start.or(point);
                }
                PathSegment::Close => {
                    if let (Some(p), Some(s)) = (point, start)
                        && p != s
                    {
                        self.records.push(line(p, s));
                    }
                    point = start;
                }
                PathSegment::Rect(x0, y0, x1, y1) => {
                    let corners = [(x0, y0), (x1, y0), (x1, y1), (x0, y1)];
                    for i in 0..4 {
                        self.records.push(line(corners[i], corners[(i + 1) % 4]));
                    }
                    point = Some((x0, y0));
                    start = point;
                }
            }
        }
    }

    fn fill_path(&mut self) {
        let stroke_color = self.graphicstate.scolor.to_vec();
        let fill_color = self.graphicstate.ncolor.to_vec();
        for seg in &self.curpath {
            if let PathSegment::Rect(x0, y0, x1, y1) = *seg {
                let (ax, ay) = apply_matrix_pt(self.ctm, (x0, y0));
                let (bx, by) = apply_matrix_pt(self.ctm, (x1, y1));
                let (x0, y0, x1, y1) = normalize_rect((ax, ay, bx, by));
                self.records.push(Record::Rect {
                    x0,
                    y0,
                    x1,
                    y1,
                    stroke_color: stroke_color.clone(),
                    fill_color: fill_color.clone(),
                });
            }
        }
    }

    /// PDF operator: `S`
    pub fn do_S(&mut self) {
        self.stroke_path();
        self.curpath.clear();
    }

    /// PDF operator: `s`
    pub fn do_s(&mut self) {
        self.do_h();
        self.do_S();
    }

    /// PDF operators: `f`, `F`, `f*`
    pub fn do_f(&mut self) {
        self.fill_path();
        self.curpath.clear();
    }

    /// PDF operators: `B`, `B*`
    pub fn do_B(&mut self) {
        self.fill_path();
        self.stroke_path();
        self.curpath.clear();
    }

    /// PDF operators: `b`, `b*`
    pub fn do_b(&mut self) {
        self.do_h();
        self.do_B();
    }

    /// End the path without painting.
    ///
    /// PDF operator: `n`
    pub fn do_n(&mut self) {
        self.curpath.clear();
    }
}
