mod curve;
mod curve_right_angle;
mod douglas_peucker;
mod right_angle;

pub use curve::Curve;
pub use curve_right_angle::CurveRightAngle;
pub use douglas_peucker::DouglasPeucker;
pub use right_angle::RightAngle;

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{GeometryError, Result};
use crate::geometry::Polygon;
use crate::math::polygon_2d::ring_area;
use crate::math::{Point2, TOLERANCE};

/// The simplification strategies, in their fixed evaluation order.
///
/// The discriminant is the tag written to the statistics file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Algorithm {
    DouglasPeucker = 1,
    RightAngle = 2,
    Curve = 3,
    CurveRightAngle = 4,
}

impl Algorithm {
    /// Every algorithm in evaluation order.
    pub const ALL: [Self; 4] = [
        Self::DouglasPeucker,
        Self::RightAngle,
        Self::Curve,
        Self::CurveRightAngle,
    ];

    /// Numeric tag used in statistics records.
    #[must_use]
    pub fn id(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DouglasPeucker => "DP",
            Self::RightAngle => "RightAngle",
            Self::Curve => "Curve",
            Self::CurveRightAngle => "CurveRightAngle",
        };
        f.pad(name)
    }
}

/// Which algorithms a legacy flat-parameter call enables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmSelection {
    Single(Algorithm),
    All,
}

/// Flat scalar parameters of the legacy batch entry point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegacyParams {
    pub algorithm: AlgorithmSelection,
    pub epsilon: f64,
    pub resolution: f64,
    pub curve_threshold: f64,
    pub angle_threshold: f64,
}

impl Default for LegacyParams {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmSelection::All,
            epsilon: 2.0,
            resolution: 5.0,
            curve_threshold: 1.0,
            angle_threshold: 10.0_f64.to_radians(),
        }
    }
}

/// The algorithms eligible for arbitration with their raw parameter vectors.
///
/// Parameter vectors: DP `[epsilon]`, RightAngle `[resolution]` or
/// `[resolution, dx, dy]`, Curve `[epsilon, curve_threshold]`,
/// CurveRightAngle `[epsilon, curve_threshold, angle_threshold]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlgorithmSpec {
    entries: BTreeMap<Algorithm, Vec<f64>>,
}

impl AlgorithmSpec {
    /// Creates an empty spec.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables `algorithm` with the given parameter vector.
    #[must_use]
    pub fn with(mut self, algorithm: Algorithm, params: Vec<f64>) -> Self {
        self.entries.insert(algorithm, params);
        self
    }

    /// Normalizes legacy flat parameters.
    #[must_use]
    pub fn from_legacy(legacy: &LegacyParams) -> Self {
        let params_for = |algorithm: Algorithm| match algorithm {
            Algorithm::DouglasPeucker => vec![legacy.epsilon],
            Algorithm::RightAngle => vec![legacy.resolution],
            Algorithm::Curve => vec![legacy.epsilon, legacy.curve_threshold],
            Algorithm::CurveRightAngle => vec![
                legacy.epsilon,
                legacy.curve_threshold,
                legacy.angle_threshold,
            ],
        };
        let selected: Vec<Algorithm> = match legacy.algorithm {
            AlgorithmSelection::Single(a) => vec![a],
            AlgorithmSelection::All => Algorithm::ALL.to_vec(),
        };
        selected
            .into_iter()
            .fold(Self::new(), |spec, a| spec.with(a, params_for(a)))
    }

    /// Returns `true` if no algorithm is enabled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Enabled algorithms in evaluation order.
    pub fn algorithms(&self) -> impl Iterator<Item = Algorithm> + '_ {
        self.entries.keys().copied()
    }

    /// Parses every entry into a typed strategy, in evaluation order.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::InvalidParameters` if any parameter vector is
    /// malformed.
    pub fn strategies(&self) -> Result<Vec<Strategy>> {
        self.entries
            .iter()
            .map(|(&a, params)| Strategy::from_params(a, params))
            .collect()
    }
}

/// Values every strategy reads besides its own parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyContext {
    /// Dominant orientation of the building in radians.
    pub orientation: f64,
    /// Holes smaller than this fraction of the contour area are dropped.
    pub min_hole_ratio: f64,
}

impl Default for StrategyContext {
    fn default() -> Self {
        Self {
            orientation: 0.0,
            min_hole_ratio: 0.02,
        }
    }
}

/// A simplification strategy with validated parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    DouglasPeucker(DouglasPeucker),
    RightAngle(RightAngle),
    Curve(Curve),
    CurveRightAngle(CurveRightAngle),
}

impl Strategy {
    /// Builds a strategy from a raw parameter vector.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::InvalidParameters` if values are missing,
    /// surplus, non-finite or negative, or if a resolution is not positive.
    pub fn from_params(algorithm: Algorithm, params: &[f64]) -> Result<Self> {
        if let Some(bad) = params.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(invalid(algorithm, &format!("value {bad} is not a finite non-negative number")));
        }
        let strategy = match (algorithm, params) {
            (Algorithm::DouglasPeucker, &[epsilon]) => Self::DouglasPeucker(DouglasPeucker::new(epsilon)),
            (Algorithm::RightAngle, &[resolution]) if resolution > 0.0 => {
                Self::RightAngle(RightAngle::new(resolution))
            }
            (Algorithm::RightAngle, &[resolution, dx, dy]) if resolution > 0.0 => {
                Self::RightAngle(RightAngle::new(resolution).with_offset(dx, dy))
            }
            (Algorithm::Curve, &[epsilon, curve_threshold]) => {
                Self::Curve(Curve::new(epsilon, curve_threshold))
            }
            (Algorithm::CurveRightAngle, &[epsilon, curve_threshold, angle_threshold]) => {
                Self::CurveRightAngle(CurveRightAngle::new(epsilon, curve_threshold, angle_threshold))
            }
            _ => {
                return Err(invalid(
                    algorithm,
                    &format!("unexpected parameter vector {params:?}"),
                ))
            }
        };
        Ok(strategy)
    }

    /// The algorithm tag of this strategy.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::DouglasPeucker(_) => Algorithm::DouglasPeucker,
            Self::RightAngle(_) => Algorithm::RightAngle,
            Self::Curve(_) => Algorithm::Curve,
            Self::CurveRightAngle(_) => Algorithm::CurveRightAngle,
        }
    }

    /// Simplifies one polygon.
    ///
    /// The result is not guaranteed to be simple; callers check.
    ///
    /// # Errors
    ///
    /// Returns a `GeometryError` if the result degenerates below 3 vertices.
    pub fn simplify(&self, polygon: &Polygon, ctx: &StrategyContext) -> Result<Polygon> {
        match self {
            Self::DouglasPeucker(s) => s.execute(polygon, ctx),
            Self::RightAngle(s) => s.execute(polygon, ctx),
            Self::Curve(s) => s.execute(polygon, ctx),
            Self::CurveRightAngle(s) => s.execute(polygon, ctx),
        }
    }
}

fn invalid(algorithm: Algorithm, reason: &str) -> crate::error::MassingError {
    GeometryError::InvalidParameters(format!("{algorithm}: {reason}")).into()
}

/// Simplifies each hole with `simplify` and keeps those that stay
/// non-degenerate and cover at least `min_hole_ratio` of `contour_area`.
pub(crate) fn simplify_holes<F>(
    holes: &[Vec<Point2>],
    contour_area: f64,
    min_hole_ratio: f64,
    simplify: F,
) -> Vec<Vec<Point2>>
where
    F: Fn(&[Point2]) -> Vec<Point2>,
{
    holes
        .iter()
        .map(|h| simplify(h))
        .filter(|h| {
            let area = ring_area(h);
            h.len() >= 3
                && area > TOLERANCE
                && contour_area > TOLERANCE
                && area / contour_area >= min_hole_ratio
        })
        .collect()
}
