use std::f64::consts::PI;

use crate::error::{GeometryError, Result};
use crate::geometry::{Pline, PlineVertex, Polygon};
use crate::math::arc_2d::{angle_step, bulge_from_arc, fit_circle, CircleFit};
use crate::math::distance_2d::farthest_from_chord;
use crate::math::polygon_2d::{dedup_ring, ring_area, sharpest_corner};
use crate::math::Point2;

use super::douglas_peucker::DouglasPeucker;
use super::{simplify_holes, StrategyContext};

/// Fewest vertices a run needs before it may become an arc.
const MIN_ARC_POINTS: usize = 5;

/// Replaces near-circular vertex runs with arc primitives and simplifies the
/// remaining straight runs with Douglas–Peucker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Curve {
    epsilon: f64,
    curve_threshold: f64,
}

/// A detected arc over `seq[start..=end]`.
#[derive(Debug, Clone, Copy)]
struct ArcRun {
    start: usize,
    end: usize,
    fit: CircleFit,
    ccw: bool,
}

impl Curve {
    /// Creates a new curve strategy.
    #[must_use]
    pub fn new(epsilon: f64, curve_threshold: f64) -> Self {
        Self {
            epsilon,
            curve_threshold,
        }
    }

    /// Simplifies `polygon` into a mix of arcs and straight edges.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if the outline keeps fewer than
    /// 3 vertices after simplification.
    pub fn execute(&self, polygon: &Polygon, ctx: &StrategyContext) -> Result<Polygon> {
        let ring = dedup_ring(polygon.contour());
        let n = ring.len();
        if n < 3 {
            return Err(GeometryError::Degenerate("contour has fewer than 3 vertices".to_owned()).into());
        }

        // Closed sequence starting and ending at the sharpest corner.
        let start = sharpest_corner(&ring);
        let seq: Vec<Point2> = (0..=n).map(|k| ring[(start + k) % n]).collect();

        let pline = self.build_pline(&seq);
        if pline.vertices.len() < 2 || (pline.arc_count() == 0 && pline.vertices.len() < 3) {
            return Err(GeometryError::Degenerate("curve outline collapsed".to_owned()).into());
        }

        let outline = Polygon::from_primitives(pline.clone(), Vec::new());
        if outline.contour().len() < 3 {
            return Err(GeometryError::Degenerate("curve outline collapsed".to_owned()).into());
        }
        let dp = DouglasPeucker::new(self.epsilon);
        let holes = simplify_holes(
            polygon.holes(),
            ring_area(outline.contour()),
            ctx.min_hole_ratio,
            |h| dp.simplify_ring(h),
        );
        Ok(Polygon::from_primitives(pline, holes))
    }

    /// Builds the primitive outline of a closed sequence whose last point
    /// repeats the first.
    fn build_pline(&self, seq: &[Point2]) -> Pline {
        let dp = DouglasPeucker::new(self.epsilon);
        let last = seq.len() - 1;
        let mut vertices = Vec::new();
        let mut straight_from = 0;
        let mut i = 0;
        while i + MIN_ARC_POINTS - 1 <= last {
            let Some(arc) = self.grow_arc(seq, i) else {
                i += 1;
                continue;
            };
            push_straight(&mut vertices, &dp.simplify_open(&seq[straight_from..=arc.start]));
            let bulge = bulge_from_arc(&seq[arc.start], &seq[arc.end], &arc.fit.center, arc.ccw);
            vertices.push(PlineVertex::new(seq[arc.start].x, seq[arc.start].y, bulge));
            straight_from = arc.end;
            i = arc.end;
        }
        push_straight(&mut vertices, &dp.simplify_open(&seq[straight_from..]));
        Pline { vertices }
    }

    /// Longest arc starting at `start`, if at least `MIN_ARC_POINTS` fit and
    /// the run is not straight.
    fn grow_arc(&self, seq: &[Point2], start: usize) -> Option<ArcRun> {
        let mut end = start + MIN_ARC_POINTS - 1;
        let mut best = self.fit_run(seq, start, end)?;
        while end + 1 < seq.len() {
            match self.fit_run(seq, start, end + 1) {
                Some(arc) => {
                    best = arc;
                    end += 1;
                }
                None => break,
            }
        }
        let (_, deviation) = farthest_from_chord(seq, best.start, best.end)?;
        (deviation > self.curve_threshold).then_some(best)
    }

    /// Fits `seq[start..=end]` and accepts it as an arc when neither its
    /// vertices nor its edge midpoints stray from the circle by the
    /// threshold, and the run turns one way through at most a half circle.
    fn fit_run(&self, seq: &[Point2], start: usize, end: usize) -> Option<ArcRun> {
        let run = &seq[start..=end];
        let fit = fit_circle(run)?;
        if fit.max_error >= self.curve_threshold {
            return None;
        }

        let mut sweep = 0.0;
        let mut sign = 0.0;
        for w in run.windows(2) {
            let mid = Point2::from((w[0].coords + w[1].coords) * 0.5);
            if ((mid - fit.center).norm() - fit.radius).abs() >= self.curve_threshold {
                return None;
            }
            let step = angle_step(&fit.center, &w[0], &w[1]);
            if step.abs() < 1e-12 || (sign != 0.0 && step.signum() != sign) {
                return None;
            }
            sign = step.signum();
            sweep += step;
        }
        if sweep.abs() > PI + 1e-9 {
            return None;
        }

        Some(ArcRun {
            start,
            end,
            fit,
            ccw: sweep > 0.0,
        })
    }
}

/// Appends the straight vertices of `run`, all but its last point.
fn push_straight(vertices: &mut Vec<PlineVertex>, run: &[Point2]) {
    let Some((_, body)) = run.split_last() else {
        return;
    };
    for p in body {
        let fresh = vertices
            .last()
            .map_or(true, |v: &PlineVertex| (v.point() - p).norm() > 1e-12);
        if fresh {
            vertices.push(PlineVertex::line(p.x, p.y));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::TAU;

    use super::*;
    use crate::operations::query::CalculateCost;

    fn circle(n: u32, r: f64) -> Vec<Point2> {
        (0..n)
            .map(|i| {
                let a = TAU * f64::from(i) / f64::from(n);
                Point2::new(r * a.cos(), r * a.sin())
            })
            .collect()
    }

    #[test]
    fn circle_becomes_few_arcs() {
        let reference = Polygon::new(circle(360, 50.0), vec![]);
        let out = Curve::new(1.0, 1.0)
            .execute(&reference, &StrategyContext::default())
            .unwrap();
        assert!(out.primitive_count() <= 10, "{} primitives", out.primitive_count());
        assert!(out.primitives().unwrap().arc_count() >= 2);
        let costs = CalculateCost::new(&out, &reference).execute();
        assert!(costs.error_ratio() < 0.05, "error ratio {}", costs.error_ratio());
        assert!(out.is_simple());
    }

    #[test]
    fn square_stays_straight() {
        let square = Polygon::new(
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(10.0, 0.0),
                Point2::new(10.0, 10.0),
                Point2::new(0.0, 10.0),
            ],
            vec![],
        );
        let out = Curve::new(0.5, 1.0)
            .execute(&square, &StrategyContext::default())
            .unwrap();
        assert_eq!(out.primitive_count(), 4);
        assert_eq!(out.primitives().unwrap().arc_count(), 0);
    }

    #[test]
    fn rounded_corner_keeps_straight_sides() {
        // Square with one corner replaced by a quarter circle of radius 20.
        let mut ring = vec![Point2::new(0.0, 0.0), Point2::new(40.0, 0.0)];
        for k in 0..=18 {
            let a = f64::from(k) * 5.0_f64.to_radians();
            ring.push(Point2::new(20.0 + 20.0 * a.cos(), 20.0 + 20.0 * a.sin()));
        }
        ring.push(Point2::new(0.0, 40.0));
        let poly = Polygon::new(ring, vec![]);
        let out = Curve::new(0.5, 0.5)
            .execute(&poly, &StrategyContext::default())
            .unwrap();
        let pline = out.primitives().unwrap();
        assert_eq!(pline.arc_count(), 1);
        assert!(out.primitive_count() <= 6);
        assert!(out.is_simple());
    }

    #[test]
    fn degenerate_contour_fails() {
        let poly = Polygon::new(vec![Point2::new(0.0, 0.0)], vec![]);
        assert!(Curve::new(1.0, 1.0)
            .execute(&poly, &StrategyContext::default())
            .is_err());
    }

    #[test]
    fn deterministic() {
        let poly = Polygon::new(circle(100, 30.0), vec![]);
        let s = Curve::new(1.0, 0.5);
        let ctx = StrategyContext::default();
        assert_eq!(s.execute(&poly, &ctx).unwrap(), s.execute(&poly, &ctx).unwrap());
    }
}
