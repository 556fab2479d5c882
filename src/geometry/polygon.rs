use geo::LineString;

use super::pline::Pline;
use crate::math::polygon_2d::{bounding_box, dedup_ring, is_simple_ring, ring_area};
use crate::math::{rotate_points, Point2};

/// Maximum chord deviation used when arcs are flattened into a contour.
pub const ARC_TESSELLATION_TOLERANCE: f64 = 0.05;

/// A footprint polygon: an outer contour with optional holes.
///
/// Contours are closed implicitly; the first vertex is not repeated.
/// Polygons produced by curve-aware strategies also carry their primitive
/// shapes, in which case the contour is the flattened primitive outline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    contour: Vec<Point2>,
    holes: Vec<Vec<Point2>>,
    primitives: Option<Pline>,
}

impl Polygon {
    /// Creates a polygon from an outer contour and holes.
    ///
    /// Consecutive duplicate vertices and a repeated closing vertex are dropped.
    #[must_use]
    pub fn new(contour: Vec<Point2>, holes: Vec<Vec<Point2>>) -> Self {
        Self {
            contour: dedup_ring(&contour),
            holes: holes.iter().map(|h| dedup_ring(h)).collect(),
            primitives: None,
        }
    }

    /// Creates a polygon whose outer boundary is a sequence of primitive shapes.
    #[must_use]
    pub fn from_primitives(primitives: Pline, holes: Vec<Vec<Point2>>) -> Self {
        let contour = dedup_ring(&primitives.to_points(ARC_TESSELLATION_TOLERANCE));
        Self {
            contour,
            holes: holes.iter().map(|h| dedup_ring(h)).collect(),
            primitives: Some(primitives),
        }
    }

    /// The outer contour.
    #[must_use]
    pub fn contour(&self) -> &[Point2] {
        &self.contour
    }

    /// The holes, each a closed ring.
    #[must_use]
    pub fn holes(&self) -> &[Vec<Point2>] {
        &self.holes
    }

    /// The primitive shapes of the outer boundary, if any.
    #[must_use]
    pub fn primitives(&self) -> Option<&Pline> {
        self.primitives.as_ref()
    }

    /// Area of the contour minus the area of its holes.
    #[must_use]
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| ring_area(h)).sum();
        (ring_area(&self.contour) - holes).max(0.0)
    }

    /// Area enclosed by the outer contour alone.
    #[must_use]
    pub fn contour_area(&self) -> f64 {
        ring_area(&self.contour)
    }

    /// Number of primitive shapes: arcs and edges when primitives are present,
    /// otherwise the number of contour vertices.
    #[must_use]
    pub fn primitive_count(&self) -> usize {
        self.primitives
            .as_ref()
            .map_or(self.contour.len(), Pline::segment_count)
    }

    /// Returns `true` if the outer contour is simple with at least 3 vertices.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        is_simple_ring(&self.contour)
    }

    /// Axis-aligned bounding box of the outer contour.
    #[must_use]
    pub fn bounding_box(&self) -> Option<(Point2, Point2)> {
        bounding_box(&self.contour)
    }

    /// Returns a copy rotated about the origin by `angle` radians.
    #[must_use]
    pub fn rotated(&self, angle: f64) -> Self {
        Self {
            contour: rotate_points(&self.contour, angle),
            holes: self.holes.iter().map(|h| rotate_points(h, angle)).collect(),
            primitives: self.primitives.as_ref().map(|p| p.rotated(angle)),
        }
    }

    /// Converts to a `geo` polygon for boolean overlap computations.
    #[must_use]
    pub fn to_geo(&self) -> geo::Polygon<f64> {
        let ring = |pts: &[Point2]| -> LineString<f64> {
            pts.iter().map(|p| (p.x, p.y)).collect::<Vec<_>>().into()
        };
        geo::Polygon::new(
            ring(&self.contour),
            self.holes.iter().map(|h| ring(h)).collect(),
        )
    }
}
