use crate::math::arc_2d::{arc_subdivision_count, BulgeArc};
use crate::math::{Point2, Rotation2, TOLERANCE};

/// Bulge-encoded polyline vertex for mixed line/arc segments.
///
/// `bulge = tan(sweep_angle / 4)`:
/// - `0` = straight line to next vertex
/// - `> 0` = counter-clockwise arc to next vertex
/// - `< 0` = clockwise arc to next vertex
/// - `|bulge| = 1` = semicircle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlineVertex {
    pub x: f64,
    pub y: f64,
    pub bulge: f64,
}

impl PlineVertex {
    /// Creates a new vertex with the given coordinates and bulge.
    #[must_use]
    pub fn new(x: f64, y: f64, bulge: f64) -> Self {
        Self { x, y, bulge }
    }

    /// Creates a line vertex (bulge = 0).
    #[must_use]
    pub fn line(x: f64, y: f64) -> Self {
        Self { x, y, bulge: 0.0 }
    }

    /// Position of the vertex.
    #[must_use]
    pub fn point(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }

    /// Returns `true` if the segment starting at this vertex is an arc.
    #[must_use]
    pub fn is_arc(&self) -> bool {
        self.bulge.abs() >= 1e-12
    }
}

/// A closed sequence of primitive shapes: straight edges and circular arcs.
///
/// Each segment between consecutive vertices is either a line (bulge=0)
/// or a circular arc (bulge≠0). The last vertex connects back to the first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pline {
    pub vertices: Vec<PlineVertex>,
}

impl Pline {
    /// Creates a `Pline` from points with all-zero bulges (line segments only).
    #[must_use]
    pub fn from_points(points: &[Point2]) -> Self {
        let vertices = points.iter().map(|p| PlineVertex::line(p.x, p.y)).collect();
        Self { vertices }
    }

    /// Converts this polyline to a closed ring by tessellating arcs into
    /// line segments. The closing vertex is not repeated.
    ///
    /// `tolerance` controls the maximum deviation between the arc and its chord approximation.
    #[must_use]
    pub fn to_points(&self, tolerance: f64) -> Vec<Point2> {
        let n = self.vertices.len();
        let mut points = Vec::with_capacity(n * 2);

        for i in 0..self.segment_count() {
            let v0 = &self.vertices[i];
            let v1 = &self.vertices[(i + 1) % n];
            points.push(v0.point());

            let Some(arc) = BulgeArc::from_bulge(&v0.point(), &v1.point(), v0.bulge) else {
                continue;
            };
            let steps = arc_subdivision_count(arc.radius, arc.sweep, tolerance);
            points.extend((1..steps).map(|j| arc.point_at(f64::from(j) / f64::from(steps))));
        }

        points
    }

    /// Returns the number of primitive segments (edges and arcs).
    #[must_use]
    pub fn segment_count(&self) -> usize {
        let n = self.vertices.len();
        if n < 2 {
            0
        } else {
            n
        }
    }

    /// Returns the number of arc segments.
    #[must_use]
    pub fn arc_count(&self) -> usize {
        self.vertices.iter().filter(|v| v.is_arc()).count()
    }

    /// Returns a copy rotated about the origin by `angle` radians.
    ///
    /// Bulges are invariant under rotation.
    #[must_use]
    pub fn rotated(&self, angle: f64) -> Self {
        if angle.abs() < TOLERANCE {
            return self.clone();
        }
        let rot = Rotation2::new(angle);
        let vertices = self
            .vertices
            .iter()
            .map(|v| {
                let p = rot * v.point();
                PlineVertex::new(p.x, p.y, v.bulge)
            })
            .collect();
        Self { vertices }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::math::polygon_2d::ring_area;

    #[test]
    fn line_only_roundtrip() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
        ];
        let pline = Pline::from_points(&pts);
        assert_eq!(pline.segment_count(), 3);
        assert_eq!(pline.arc_count(), 0);
        assert_eq!(pline.to_points(0.1), pts);
    }

    #[test]
    fn two_semicircles_make_a_disc() {
        // Full circle of radius 5 centred at the origin, CCW.
        let pline = Pline {
            vertices: vec![PlineVertex::new(5.0, 0.0, 1.0), PlineVertex::new(-5.0, 0.0, 1.0)],
        };
        assert_eq!(pline.segment_count(), 2);
        assert_eq!(pline.arc_count(), 2);
        let ring = pline.to_points(0.01);
        assert!(ring.len() > 20);
        let expected = std::f64::consts::PI * 25.0;
        assert_abs_diff_eq!(ring_area(&ring), expected, epsilon = expected * 0.01);
    }

    #[test]
    fn rotation_keeps_bulge() {
        let pline = Pline {
            vertices: vec![PlineVertex::new(1.0, 0.0, 0.5), PlineVertex::line(0.0, 1.0)],
        };
        let rotated = pline.rotated(std::f64::consts::FRAC_PI_2);
        assert_abs_diff_eq!(rotated.vertices[0].x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rotated.vertices[0].y, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rotated.vertices[0].bulge, 0.5);
    }
}
