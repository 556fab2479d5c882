use crate::geometry::{Pline, PlineVertex, Polygon};
use crate::math::Point2;

/// Moves every outline vertex of `polygon` onto the nearest outline vertex of
/// `parent` within `threshold`.
///
/// Returns `None` when nothing moved or when the snapped outline would no
/// longer be simple.
pub(super) fn snap_to_parent(polygon: &Polygon, parent: &[Polygon], threshold: f64) -> Option<Polygon> {
    if threshold <= 0.0 || parent.is_empty() {
        return None;
    }
    let anchors: Vec<Point2> = parent.iter().flat_map(outline_vertices).collect();
    let nearest = |p: Point2| -> Option<Point2> {
        anchors
            .iter()
            .map(|a| (*a, (a - p).norm()))
            .filter(|&(_, d)| d <= threshold && d > 0.0)
            .min_by(|x, y| x.1.total_cmp(&y.1))
            .map(|(a, _)| a)
    };

    let mut moved = false;
    let snapped = match polygon.primitives() {
        Some(pline) => {
            let vertices = pline
                .vertices
                .iter()
                .map(|v| match nearest(v.point()) {
                    Some(a) => {
                        moved = true;
                        PlineVertex::new(a.x, a.y, v.bulge)
                    }
                    None => *v,
                })
                .collect();
            Polygon::from_primitives(Pline { vertices }, polygon.holes().to_vec())
        }
        None => {
            let contour = polygon
                .contour()
                .iter()
                .map(|p| {
                    nearest(*p).map_or(*p, |a| {
                        moved = true;
                        a
                    })
                })
                .collect();
            Polygon::new(contour, polygon.holes().to_vec())
        }
    };

    (moved && snapped.is_simple()).then_some(snapped)
}

/// Corner vertices of a polygon: primitive vertices when present, otherwise
/// the contour.
fn outline_vertices(polygon: &Polygon) -> Vec<Point2> {
    match polygon.primitives() {
        Some(pline) => pline.vertices.iter().map(PlineVertex::point).collect(),
        None => polygon.contour().to_vec(),
    }
}
