use crate::error::{GeometryError, Result};
use crate::geometry::Polygon;
use crate::math::distance_2d::farthest_from_chord;
use crate::math::polygon_2d::{dedup_ring, ring_area};
use crate::math::Point2;

use super::{simplify_holes, StrategyContext};

/// Douglas–Peucker point elimination with perpendicular tolerance `epsilon`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DouglasPeucker {
    epsilon: f64,
}

impl DouglasPeucker {
    /// Creates a new Douglas–Peucker strategy.
    #[must_use]
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    /// The tolerance.
    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Simplifies the outer contour and the holes of `polygon`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if the contour keeps fewer than 3
    /// vertices or no area.
    pub fn execute(&self, polygon: &Polygon, ctx: &StrategyContext) -> Result<Polygon> {
        let contour = self.simplify_ring(polygon.contour());
        if contour.len() < 3 || ring_area(&contour) <= 0.0 {
            return Err(GeometryError::Degenerate(format!(
                "contour collapsed to {} vertices at epsilon {}",
                contour.len(),
                self.epsilon
            ))
            .into());
        }
        let holes = simplify_holes(
            polygon.holes(),
            ring_area(&contour),
            ctx.min_hole_ratio,
            |h| self.simplify_ring(h),
        );
        Ok(Polygon::new(contour, holes))
    }

    /// Simplifies a closed ring.
    ///
    /// The ring is split at its first vertex and the vertex farthest from it;
    /// both halves are simplified as open polylines and rejoined.
    #[must_use]
    pub fn simplify_ring(&self, ring: &[Point2]) -> Vec<Point2> {
        let ring = dedup_ring(ring);
        let n = ring.len();
        if n < 3 {
            return ring;
        }

        let far = (1..n)
            .fold((1, -1.0), |(best, best_d), i| {
                let d = (ring[i] - ring[0]).norm();
                if d > best_d {
                    (i, d)
                } else {
                    (best, best_d)
                }
            })
            .0;

        let first_half = self.simplify_open(&ring[..=far]);
        let mut second: Vec<Point2> = ring[far..].to_vec();
        second.push(ring[0]);
        let second_half = self.simplify_open(&second);

        let mut out = first_half;
        out.extend_from_slice(&second_half[1..second_half.len() - 1]);
        dedup_ring(&out)
    }

    /// Simplifies an open polyline; both endpoints are always kept.
    #[must_use]
    pub fn simplify_open(&self, points: &[Point2]) -> Vec<Point2> {
        let n = points.len();
        if n <= 2 {
            return points.to_vec();
        }

        let mut keep = vec![false; n];
        keep[0] = true;
        keep[n - 1] = true;
        let mut stack = vec![(0, n - 1)];
        while let Some((first, last)) = stack.pop() {
            if let Some((idx, dist)) = farthest_from_chord(points, first, last) {
                if dist > self.epsilon {
                    keep[idx] = true;
                    stack.push((first, idx));
                    stack.push((idx, last));
                }
            }
        }

        points
            .iter()
            .zip(keep)
            .filter_map(|(p, k)| k.then_some(*p))
            .collect()
    }
}
