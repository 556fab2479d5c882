pub mod arc_2d;
pub mod distance_2d;
pub mod intersect_2d;
pub mod polygon_2d;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 2D rotation.
pub type Rotation2 = nalgebra::Rotation2<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Rotates every point of a ring about the origin by `angle` radians.
#[must_use]
pub fn rotate_points(points: &[Point2], angle: f64) -> Vec<Point2> {
    if angle.abs() < TOLERANCE {
        return points.to_vec();
    }
    let rot = Rotation2::new(angle);
    points.iter().map(|p| rot * p).collect()
}
