use std::f64::consts::{FRAC_PI_2, PI};

use crate::error::{GeometryError, Result};
use crate::geometry::{Pline, Polygon};

use super::curve::Curve;
use super::StrategyContext;

/// Curve simplification followed by snapping near-axis edges onto the
/// building's principal axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveRightAngle {
    curve: Curve,
    angle_threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

impl CurveRightAngle {
    /// Creates a new strategy; edges within `angle_threshold` radians of an
    /// axis are snapped.
    #[must_use]
    pub fn new(epsilon: f64, curve_threshold: f64, angle_threshold: f64) -> Self {
        Self {
            curve: Curve::new(epsilon, curve_threshold),
            angle_threshold,
        }
    }

    /// Simplifies `polygon`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if the curve stage fails or the
    /// snapped outline keeps fewer than 3 vertices.
    pub fn execute(&self, polygon: &Polygon, ctx: &StrategyContext) -> Result<Polygon> {
        let curved = self.curve.execute(polygon, ctx)?;
        let pline = curved
            .primitives()
            .cloned()
            .unwrap_or_else(|| Pline::from_points(curved.contour()));

        let aligned = pline.rotated(-ctx.orientation);
        let snapped = merge_collinear(&self.snap(&aligned));
        if snapped.vertices.len() < 2 || (snapped.arc_count() == 0 && snapped.vertices.len() < 3) {
            return Err(GeometryError::Degenerate("snapped outline collapsed".to_owned()).into());
        }

        let result = Polygon::from_primitives(snapped.rotated(ctx.orientation), curved.holes().to_vec());
        if result.contour().len() < 3 {
            return Err(GeometryError::Degenerate("snapped outline collapsed".to_owned()).into());
        }
        Ok(result)
    }

    fn classify(&self, pline: &Pline, i: usize) -> Option<Axis> {
        let n = pline.vertices.len();
        let v0 = &pline.vertices[i];
        if v0.is_arc() {
            return None;
        }
        let d = pline.vertices[(i + 1) % n].point() - v0.point();
        if d.norm() < 1e-12 {
            return None;
        }
        // Angle to the x axis folded into [0, π/2].
        let angle = d.y.atan2(d.x).abs();
        let angle = angle.min(PI - angle);
        if angle <= self.angle_threshold {
            Some(Axis::Horizontal)
        } else if FRAC_PI_2 - angle <= self.angle_threshold {
            Some(Axis::Vertical)
        } else {
            None
        }
    }

    /// Moves the endpoints of every near-axis edge onto one shared,
    /// length-weighted coordinate per run of same-axis edges.
    fn snap(&self, pline: &Pline) -> Pline {
        let n = pline.vertices.len();
        let axes: Vec<Option<Axis>> = (0..n).map(|i| self.classify(pline, i)).collect();
        let mut out = pline.clone();

        // Start scanning after a run boundary so no run wraps around.
        let begin = (0..n)
            .find(|&i| axes[i] != axes[(i + n - 1) % n])
            .unwrap_or(0);
        let mut k = 0;
        while k < n {
            let i = (begin + k) % n;
            let Some(axis) = axes[i] else {
                k += 1;
                continue;
            };
            let mut run = vec![i];
            while run.len() < n && axes[(begin + k + run.len()) % n] == Some(axis) {
                run.push((begin + k + run.len()) % n);
            }

            let (mut weighted, mut total) = (0.0, 0.0);
            for &s in &run {
                let a = pline.vertices[s].point();
                let b = pline.vertices[(s + 1) % n].point();
                let len = (b - a).norm();
                let mid = match axis {
                    Axis::Horizontal => 0.5 * (a.y + b.y),
                    Axis::Vertical => 0.5 * (a.x + b.x),
                };
                weighted += len * mid;
                total += len;
            }
            if total > 0.0 {
                let coord = weighted / total;
                for &s in &run {
                    for idx in [s, (s + 1) % n] {
                        match axis {
                            Axis::Horizontal => out.vertices[idx].y = coord,
                            Axis::Vertical => out.vertices[idx].x = coord,
                        }
                    }
                }
            }
            k += run.len();
        }
        out
    }
}

/// Drops vertices between two straight edges on the same line.
fn merge_collinear(pline: &Pline) -> Pline {
    let mut vertices = pline.vertices.clone();
    loop {
        let n = vertices.len();
        if n < 3 {
            break;
        }
        let removable = (0..n).find(|&i| {
            let prev = &vertices[(i + n - 1) % n];
            let cur = &vertices[i];
            let next = &vertices[(i + 1) % n];
            if prev.is_arc() || cur.is_arc() {
                return false;
            }
            let a = cur.point() - prev.point();
            let b = next.point() - cur.point();
            let cross = a.x * b.y - a.y * b.x;
            cross.abs() <= 1e-9 * a.norm().max(1.0) * b.norm().max(1.0) && a.dot(&b) >= 0.0
        });
        match removable {
            Some(i) => {
                vertices.remove(i);
            }
            None => break,
        }
    }
    vertices.dedup_by(|next, prev| (prev.point() - next.point()).norm() < 1e-12 && !prev.is_arc());
    Pline { vertices }
}
