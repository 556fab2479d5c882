use super::Point2;

/// Returns the minimum distance from point `p` to the line segment `a → b`.
#[must_use]
pub fn point_to_segment_dist(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let d = b - a;
    let len_sq = d.norm_squared();

    if len_sq < 1e-20 {
        // Degenerate segment (zero length).
        return (p - a).norm();
    }

    // Project point onto the infinite line, clamp to [0, 1].
    let t = ((p - a).dot(&d) / len_sq).clamp(0.0, 1.0);
    (p - (a + d * t)).norm()
}

/// Returns the index and distance of the point of `points[first + 1..last]`
/// farthest from the segment `points[first] → points[last]`.
///
/// Returns `None` when the range holds no interior point.
#[must_use]
pub fn farthest_from_chord(points: &[Point2], first: usize, last: usize) -> Option<(usize, f64)> {
    if last <= first + 1 {
        return None;
    }
    let a = &points[first];
    let b = &points[last];
    let mut best: Option<(usize, f64)> = None;
    for (i, pt) in points.iter().enumerate().take(last).skip(first + 1) {
        let d = point_to_segment_dist(pt, a, b);
        if best.map_or(true, |(_, bd)| d > bd) {
            best = Some((i, d));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    #[test]
    fn segment_dist_perpendicular_projection() {
        // Point (1, 1) to segment (0,0)→(2,0). Closest at (1,0), dist = 1.
        let d = point_to_segment_dist(
            &Point2::new(1.0, 1.0),
            &Point2::new(0.0, 0.0),
            &Point2::new(2.0, 0.0),
        );
        assert!((d - 1.0).abs() < TOL, "d={d}");
    }

    #[test]
    fn segment_dist_endpoint_closest() {
        let d = point_to_segment_dist(
            &Point2::new(-1.0, 0.0),
            &Point2::new(0.0, 0.0),
            &Point2::new(2.0, 0.0),
        );
        assert!((d - 1.0).abs() < TOL, "d={d}");
    }

    #[test]
    fn segment_dist_degenerate() {
        // Zero-length segment: distance is point-to-point.
        let d = point_to_segment_dist(
            &Point2::new(3.0, 4.0),
            &Point2::new(0.0, 0.0),
            &Point2::new(0.0, 0.0),
        );
        assert!((d - 5.0).abs() < TOL, "d={d}");
    }

    #[test]
    fn farthest_picks_peak() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.5),
            Point2::new(2.0, 3.0),
            Point2::new(3.0, 0.2),
            Point2::new(4.0, 0.0),
        ];
        let (idx, d) = farthest_from_chord(&pts, 0, 4).unwrap_or((0, 0.0));
        assert_eq!(idx, 2);
        assert!((d - 3.0).abs() < TOL, "d={d}");
        assert!(farthest_from_chord(&pts, 1, 2).is_none());
    }
}
