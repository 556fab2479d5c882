use super::{Point2, TOLERANCE};

/// Orientation of `c` relative to the directed line `a → b`.
///
/// Returns `1` for a left turn, `-1` for a right turn and `0` when collinear.
#[must_use]
pub fn orientation(a: &Point2, b: &Point2, c: &Point2) -> i8 {
    let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
    let scale = (b - a).norm().max((c - a).norm()).max(1.0);
    if cross > TOLERANCE * scale {
        1
    } else if cross < -TOLERANCE * scale {
        -1
    } else {
        0
    }
}

/// Returns `true` if `p` lies within the bounding box of segment `a → b`.
fn within_box(a: &Point2, b: &Point2, p: &Point2) -> bool {
    p.x <= a.x.max(b.x) + TOLERANCE
        && p.x >= a.x.min(b.x) - TOLERANCE
        && p.y <= a.y.max(b.y) + TOLERANCE
        && p.y >= a.y.min(b.y) - TOLERANCE
}

/// Returns `true` if the closed segments `a0 → a1` and `b0 → b1` share at
/// least one point, including touching endpoints and collinear overlap.
#[must_use]
pub fn segments_intersect(a0: &Point2, a1: &Point2, b0: &Point2, b1: &Point2) -> bool {
    let o1 = orientation(a0, a1, b0);
    let o2 = orientation(a0, a1, b1);
    let o3 = orientation(b0, b1, a0);
    let o4 = orientation(b0, b1, a1);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == 0 && within_box(a0, a1, b0))
        || (o2 == 0 && within_box(a0, a1, b1))
        || (o3 == 0 && within_box(b0, b1, a0))
        || (o4 == 0 && within_box(b0, b1, a1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn orientation_signs() {
        assert_eq!(orientation(&p(0.0, 0.0), &p(1.0, 0.0), &p(0.5, 1.0)), 1);
        assert_eq!(orientation(&p(0.0, 0.0), &p(1.0, 0.0), &p(0.5, -1.0)), -1);
        assert_eq!(orientation(&p(0.0, 0.0), &p(1.0, 0.0), &p(3.0, 0.0)), 0);
    }

    #[test]
    fn intersect_detects_collinear_overlap() {
        assert!(segments_intersect(
            &p(0.0, 0.0),
            &p(2.0, 0.0),
            &p(1.0, 0.0),
            &p(3.0, 0.0)
        ));
        assert!(!segments_intersect(
            &p(0.0, 0.0),
            &p(1.0, 0.0),
            &p(2.0, 0.0),
            &p(3.0, 0.0)
        ));
    }

    #[test]
    fn intersect_detects_touching_endpoint() {
        assert!(segments_intersect(
            &p(0.0, 0.0),
            &p(1.0, 1.0),
            &p(1.0, 1.0),
            &p(2.0, 0.0)
        ));
    }

    #[test]
    fn intersect_proper_crossing() {
        assert!(segments_intersect(
            &p(0.0, 0.0),
            &p(2.0, 2.0),
            &p(0.0, 2.0),
            &p(2.0, 0.0)
        ));
    }
}
