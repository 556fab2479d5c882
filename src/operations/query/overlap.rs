use geo::{Area, BooleanOps};

use crate::geometry::Polygon;
use crate::math::TOLERANCE;

/// Intersection-over-union of two polygons (holes respected), in `[0, 1]`.
///
/// Two empty polygons, or any pair with an empty member, have IOU `0`.
pub struct Iou<'a> {
    a: &'a Polygon,
    b: &'a Polygon,
}

impl<'a> Iou<'a> {
    /// Creates a new `Iou` query.
    #[must_use]
    pub fn new(a: &'a Polygon, b: &'a Polygon) -> Self {
        Self { a, b }
    }

    /// Executes the query.
    #[must_use]
    pub fn execute(&self) -> f64 {
        let area_a = self.a.area();
        let area_b = self.b.area();
        if area_a < TOLERANCE || area_b < TOLERANCE {
            return 0.0;
        }
        if !boxes_overlap(self.a, self.b) {
            return 0.0;
        }

        let inter = self.intersection_area();
        let union = area_a + area_b - inter;
        if union < TOLERANCE {
            return 0.0;
        }
        (inter / union).clamp(0.0, 1.0)
    }

    /// Area shared by both polygons.
    #[must_use]
    pub fn intersection_area(&self) -> f64 {
        if !boxes_overlap(self.a, self.b) {
            return 0.0;
        }
        self.a
            .to_geo()
            .intersection(&self.b.to_geo())
            .unsigned_area()
    }
}

/// Returns `true` if the polygons share interior area.
#[must_use]
pub fn overlaps(a: &Polygon, b: &Polygon) -> bool {
    Iou::new(a, b).intersection_area() > TOLERANCE
}

fn boxes_overlap(a: &Polygon, b: &Polygon) -> bool {
    match (a.bounding_box(), b.bounding_box()) {
        (Some((a_min, a_max)), Some((b_min, b_max))) => {
            a_min.x <= b_max.x && b_min.x <= a_max.x && a_min.y <= b_max.y && b_min.y <= a_max.y
        }
        _ => false,
    }
}
