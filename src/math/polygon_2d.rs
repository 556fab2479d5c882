use super::intersect_2d::{orientation, segments_intersect};
use super::{Point2, TOLERANCE};

/// Computes the signed area of a closed ring (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Absolute area enclosed by a closed ring.
#[must_use]
pub fn ring_area(points: &[Point2]) -> f64 {
    signed_area_2d(points).abs()
}

/// Returns `true` if a closed ring has at least 3 vertices and no two
/// non-adjacent edges touch, and no adjacent edges fold back onto each other.
#[must_use]
pub fn is_simple_ring(points: &[Point2]) -> bool {
    let n = points.len();
    if n < 3 || ring_area(points) < TOLERANCE {
        return false;
    }

    for i in 0..n {
        let a0 = &points[i];
        let a1 = &points[(i + 1) % n];
        if (a1 - a0).norm() < TOLERANCE {
            return false;
        }

        // Adjacent edges only share their common vertex unless they fold back.
        let a2 = &points[(i + 2) % n];
        if orientation(a0, a1, a2) == 0 && (a2 - a1).dot(&(a0 - a1)) > 0.0 {
            return false;
        }

        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let b0 = &points[j];
            let b1 = &points[(j + 1) % n];
            if segments_intersect(a0, a1, b0, b1) {
                return false;
            }
        }
    }
    true
}

/// Removes consecutive duplicate vertices, including a repeated closing vertex.
#[must_use]
pub fn dedup_ring(points: &[Point2]) -> Vec<Point2> {
    let mut out: Vec<Point2> = Vec::with_capacity(points.len());
    for p in points {
        let fresh = out.last().map_or(true, |last| (last - p).norm() >= TOLERANCE);
        if fresh {
            out.push(*p);
        }
    }
    while out.len() > 1 && (out[0] - out[out.len() - 1]).norm() < TOLERANCE {
        out.pop();
    }
    out
}

/// Removes vertices whose neighbours are collinear with them.
///
/// Repeats until stable so that runs of collinear vertices collapse fully.
#[must_use]
pub fn remove_collinear(points: &[Point2]) -> Vec<Point2> {
    let mut ring = dedup_ring(points);
    loop {
        let n = ring.len();
        if n < 3 {
            return ring;
        }
        let kept: Vec<Point2> = (0..n)
            .filter(|&i| {
                let prev = &ring[(i + n - 1) % n];
                let next = &ring[(i + 1) % n];
                orientation(prev, &ring[i], next) != 0
            })
            .map(|i| ring[i])
            .collect();
        if kept.len() == n {
            return ring;
        }
        ring = kept;
    }
}

/// Axis-aligned bounding box of a point set as `(min, max)`.
///
/// Returns `None` for an empty set.
#[must_use]
pub fn bounding_box(points: &[Point2]) -> Option<(Point2, Point2)> {
    let first = points.first()?;
    let mut min = *first;
    let mut max = *first;
    for p in &points[1..] {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    Some((min, max))
}

/// Even-odd point-in-ring test. Points on the boundary may go either way.
#[must_use]
pub fn point_in_ring(p: &Point2, ring: &[Point2]) -> bool {
    let n = ring.len();
    let mut inside = false;
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (pi, pj) = (&ring[i], &ring[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x_cross = pj.x + (p.y - pj.y) / (pi.y - pj.y) * (pi.x - pj.x);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Index of the vertex with the sharpest turn (largest deviation from a
/// straight continuation). Ties go to the lowest index.
#[must_use]
pub fn sharpest_corner(points: &[Point2]) -> usize {
    let n = points.len();
    let mut best = 0;
    let mut best_turn = -1.0;
    for i in 0..n {
        let a = points[i] - points[(i + n - 1) % n];
        let b = points[(i + 1) % n] - points[i];
        let (la, lb) = (a.norm(), b.norm());
        if la < TOLERANCE || lb < TOLERANCE {
            continue;
        }
        let turn = (a.dot(&b) / (la * lb)).clamp(-1.0, 1.0).acos();
        if turn > best_turn + TOLERANCE {
            best_turn = turn;
            best = i;
        }
    }
    best
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn square() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn signed_area_ccw_square() {
        assert!((signed_area_2d(&square()) - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_cw_square() {
        let cw: Vec<Point2> = square().into_iter().rev().collect();
        assert!((signed_area_2d(&cw) + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_degenerate() {
        assert!(signed_area_2d(&[Point2::new(0.0, 0.0)]).abs() < TOLERANCE);
        assert!(signed_area_2d(&[]).abs() < TOLERANCE);
    }

    #[test]
    fn square_is_simple() {
        assert!(is_simple_ring(&square()));
    }

    #[test]
    fn bowtie_is_not_simple() {
        let bowtie = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ];
        assert!(!is_simple_ring(&bowtie));
    }

    #[test]
    fn too_few_vertices_is_not_simple() {
        assert!(!is_simple_ring(&[Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]));
        assert!(!is_simple_ring(&[Point2::new(0.0, 0.0)]));
    }

    #[test]
    fn pinched_ring_is_not_simple() {
        // Two squares sharing the vertex (1, 1).
        let pinched = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(2.0, 1.0),
            Point2::new(2.0, 2.0),
            Point2::new(1.0, 2.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        assert!(!is_simple_ring(&pinched));
    }

    #[test]
    fn collinear_vertices_removed() {
        let ring = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.5, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
            Point2::new(0.0, 0.0),
        ];
        let cleaned = remove_collinear(&ring);
        assert_eq!(cleaned.len(), 4);
    }

    #[test]
    fn point_in_ring_basic() {
        assert!(point_in_ring(&Point2::new(0.5, 0.5), &square()));
        assert!(!point_in_ring(&Point2::new(1.5, 0.5), &square()));
    }

    #[test]
    fn bounding_box_basic() {
        let (min, max) = bounding_box(&square()).unwrap();
        assert!((min.x).abs() < TOLERANCE && (max.y - 1.0).abs() < TOLERANCE);
        assert!(bounding_box(&[]).is_none());
    }

    #[test]
    fn sharpest_corner_of_l_shape() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        // Vertex 1 is straight; the right-angle corners all tie, so the first wins.
        assert_eq!(sharpest_corner(&pts), 0);
    }
}
