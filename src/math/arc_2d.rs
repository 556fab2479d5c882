//! Arc helpers for bulge-encoded polylines and circle fitting.
//!
//! A bulge is `tan(sweep / 4)`. Positive bulges turn counter-clockwise,
//! negative ones clockwise, and a bulge of magnitude 1 is a half circle.

use std::f64::consts::TAU;

use super::{Point2, Vector2};

/// A circular arc in center, radius and angle form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BulgeArc {
    pub center: Point2,
    pub radius: f64,
    pub start_angle: f64,
    /// Signed sweep in radians, positive counter-clockwise.
    pub sweep: f64,
}

impl BulgeArc {
    /// Decodes the arc from `start` to `end` with the given bulge.
    ///
    /// Returns `None` for a zero bulge or a zero-length chord.
    #[must_use]
    pub fn from_bulge(start: &Point2, end: &Point2, bulge: f64) -> Option<Self> {
        let chord = end - start;
        let half = chord.norm() * 0.5;
        if half < 1e-12 || bulge.abs() < 1e-12 {
            return None;
        }
        // Left normal of the chord; the center lies on it for bulge < 1.
        let normal = Vector2::new(-chord.y, chord.x) / (2.0 * half);
        let offset = half * (1.0 - bulge * bulge) / (2.0 * bulge);
        let center = start + chord * 0.5 + normal * offset;
        let radius = half * (1.0 + bulge * bulge) / (2.0 * bulge.abs());
        let to_start = start - center;
        Some(Self {
            center,
            radius,
            start_angle: to_start.y.atan2(to_start.x),
            sweep: 4.0 * bulge.atan(),
        })
    }

    /// Point at parameter `t` in `[0, 1]` along the sweep.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point2 {
        let angle = self.start_angle + self.sweep * t;
        self.center + Vector2::new(angle.cos(), angle.sin()) * self.radius
    }
}

/// Converts arc endpoints + center back to bulge value.
///
/// `is_ccw`: true for counter-clockwise arc, false for clockwise.
#[must_use]
pub fn bulge_from_arc(start: &Point2, end: &Point2, center: &Point2, is_ccw: bool) -> f64 {
    let start_angle = (start.y - center.y).atan2(start.x - center.x);
    let end_angle = (end.y - center.y).atan2(end.x - center.x);

    let mut sweep = end_angle - start_angle;
    if is_ccw && sweep < 0.0 {
        sweep += TAU;
    } else if !is_ccw && sweep > 0.0 {
        sweep -= TAU;
    }

    (sweep / 4.0).tan()
}

/// Number of chords needed so that no chord deviates from the arc by more
/// than `tolerance`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn arc_subdivision_count(radius: f64, sweep: f64, tolerance: f64) -> u32 {
    if radius <= tolerance || tolerance <= 0.0 {
        return 4;
    }
    // Sagitta of a chord with half-angle θ/2: r(1 - cos(θ/2)) <= tol.
    let max_angle = 2.0 * (1.0 - tolerance / radius).clamp(-1.0, 1.0).acos();
    if max_angle < 1e-9 {
        return 256;
    }
    // Bounded to [2, 256], so the truncating cast is exact.
    (sweep.abs() / max_angle).ceil().clamp(2.0, 256.0) as u32
}

/// A least-squares circle fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleFit {
    pub center: Point2,
    pub radius: f64,
    /// Largest radial deviation of any fitted point.
    pub max_error: f64,
}

/// Fits a circle to `points` with the algebraic (Kåsa) least-squares method.
///
/// Coordinates are centered on the point mean before solving so that large
/// absolute coordinates do not hurt conditioning. Returns `None` for fewer
/// than 3 points or (near) collinear input.
#[must_use]
pub fn fit_circle(points: &[Point2]) -> Option<CircleFit> {
    if points.len() < 3 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.x).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.y).sum::<f64>() / n;

    let (mut suu, mut svv, mut suv) = (0.0, 0.0, 0.0);
    let (mut suuu, mut svvv, mut suvv, mut svuu) = (0.0, 0.0, 0.0, 0.0);
    for p in points {
        let u = p.x - mean_x;
        let v = p.y - mean_y;
        suu += u * u;
        svv += v * v;
        suv += u * v;
        suuu += u * u * u;
        svvv += v * v * v;
        suvv += u * v * v;
        svuu += v * u * u;
    }

    let m = nalgebra::Matrix2::new(suu, suv, suv, svv);
    let rhs = nalgebra::Vector2::new(0.5 * (suuu + suvv), 0.5 * (svvv + svuu));
    let scale = suu.max(svv).max(1e-300);
    if m.determinant().abs() < 1e-12 * scale * scale {
        return None;
    }
    let uc = m.lu().solve(&rhs)?;

    let center = Point2::new(uc.x + mean_x, uc.y + mean_y);
    let radius = (uc.x * uc.x + uc.y * uc.y + (suu + svv) / n).sqrt();
    let max_error = points
        .iter()
        .map(|p| ((p - center).norm() - radius).abs())
        .fold(0.0, f64::max);

    Some(CircleFit {
        center,
        radius,
        max_error,
    })
}

/// Signed angle swept from `a` to `b` around `center`, in `(-π, π]`.
#[must_use]
pub fn angle_step(center: &Point2, a: &Point2, b: &Point2) -> f64 {
    let va = a - center;
    let vb = b - center;
    let cross = va.x * vb.y - va.y * vb.x;
    let dot = va.dot(&vb);
    cross.atan2(dot)
}
