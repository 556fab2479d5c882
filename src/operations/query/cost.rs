use crate::building::LayerCosts;
use crate::error::{GeometryError, Result};
use crate::geometry::Polygon;

use super::overlap::Iou;

/// Cost triple of a simplified polygon against one reference polygon.
///
/// The accuracy and area terms are scaled by `height`, the number of slices
/// the reference stands for.
pub struct CalculateCost<'a> {
    simplified: &'a Polygon,
    reference: &'a Polygon,
    height: f64,
}

impl<'a> CalculateCost<'a> {
    /// Creates a new `CalculateCost` query with height 1.
    #[must_use]
    pub fn new(simplified: &'a Polygon, reference: &'a Polygon) -> Self {
        Self {
            simplified,
            reference,
            height: 1.0,
        }
    }

    /// Sets the number of slices the reference stands for.
    #[must_use]
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    /// Executes the query.
    #[must_use]
    pub fn execute(&self) -> LayerCosts {
        let iou = Iou::new(self.simplified, self.reference).execute();
        let reference_area = self.reference.area() * self.height;
        LayerCosts {
            accuracy_cost: (1.0 - iou) * reference_area,
            reference_area,
            primitive_count: self.simplified.primitive_count(),
        }
    }
}

/// For every slice, the raw polygon that best overlaps `representative`.
///
/// Slices with no overlapping polygon contribute nothing.
#[must_use]
pub fn select_references<'a>(
    raw_footprints: &'a [Vec<Polygon>],
    representative: &Polygon,
) -> Vec<&'a Polygon> {
    raw_footprints
        .iter()
        .filter_map(|slice| {
            let mut best: Option<(&Polygon, f64)> = None;
            for poly in slice {
                let iou = Iou::new(poly, representative).execute();
                if iou > 0.0 && best.map_or(true, |(_, b)| iou > b) {
                    best = Some((poly, iou));
                }
            }
            best.map(|(p, _)| p)
        })
        .collect()
}

/// Cost of `simplified` summed over the slices a layer subsumes.
///
/// Each slice is judged against its raw polygon that best overlaps
/// `representative`, at height 1. When no slice overlaps, the representative
/// itself stands for all `layer_height` slices.
#[must_use]
pub fn layer_cost(
    simplified: &Polygon,
    raw_footprints: &[Vec<Polygon>],
    representative: &Polygon,
    layer_height: usize,
) -> LayerCosts {
    let references = select_references(raw_footprints, representative);
    let primitive_count = simplified.primitive_count();
    if references.is_empty() {
        #[allow(clippy::cast_precision_loss)]
        let height = layer_height.max(1) as f64;
        return CalculateCost::new(simplified, representative)
            .with_height(height)
            .execute();
    }

    let mut total = LayerCosts::default();
    for reference in references {
        let slice = CalculateCost::new(simplified, reference).execute();
        total.accuracy_cost += slice.accuracy_cost;
        total.reference_area += slice.reference_area;
    }
    total.primitive_count = primitive_count;
    total
}

/// Weighted sum of the normalized error and the normalized primitive count.
///
/// `alpha = 1` judges accuracy only, `alpha = 0` simplicity only.
///
/// # Errors
///
/// Returns an error if `alpha` is outside `[0, 1]`.
pub fn combined_cost(alpha: f64, costs: &LayerCosts, baseline_primitive_count: usize) -> Result<f64> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(GeometryError::ParameterOutOfRange {
            parameter: "alpha",
            value: alpha,
            min: 0.0,
            max: 1.0,
        }
        .into());
    }
    #[allow(clippy::cast_precision_loss)]
    let simplicity = costs.primitive_count as f64 / baseline_primitive_count.max(1) as f64;
    Ok(alpha * costs.error_ratio() + (1.0 - alpha) * simplicity)
}
