use crate::geometry::Polygon;

slotmap::new_key_type! {
    /// Unique identifier for a layer in a building tree.
    pub struct LayerId;
}

/// The cost triple of a layer's footprint against its reference slices.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayerCosts {
    /// `(1 - IOU) * reference_area`, summed over the reference slices.
    pub accuracy_cost: f64,
    /// Reference area, summed over the reference slices.
    pub reference_area: f64,
    /// Number of primitive shapes (edges and arcs).
    pub primitive_count: usize,
}

impl LayerCosts {
    /// Fraction of the reference area that the approximation gets wrong.
    ///
    /// Zero when the reference area is empty.
    #[must_use]
    pub fn error_ratio(&self) -> f64 {
        if self.reference_area > 0.0 {
            self.accuracy_cost / self.reference_area
        } else {
            0.0
        }
    }

    /// Component-wise sum.
    #[must_use]
    pub fn combined(self, other: Self) -> Self {
        Self {
            accuracy_cost: self.accuracy_cost + other.accuracy_cost,
            reference_area: self.reference_area + other.reference_area,
            primitive_count: self.primitive_count + other.primitive_count,
        }
    }
}

/// A vertically homogeneous group of slices.
///
/// Heights are slice indices; `top_height` is exclusive, so
/// `top_height - bottom_height` is the number of subsumed slices.
#[derive(Debug, Clone)]
pub struct BuildingLayer {
    /// Index of the building this layer belongs to.
    pub building_id: usize,
    /// First slice of the layer.
    pub bottom_height: usize,
    /// One past the last slice of the layer.
    pub top_height: usize,
    /// Polygons approximating the layer, one per disjoint component.
    pub footprint: Vec<Polygon>,
    /// The original per-slice polygons this layer subsumes, bottom to top.
    pub raw_footprints: Vec<Vec<Polygon>>,
    /// Child layers stacked on top of this one.
    pub children: Vec<LayerId>,
    /// Cost of `footprint` against `raw_footprints`.
    pub costs: LayerCosts,
}

impl BuildingLayer {
    /// Creates a childless layer.
    #[must_use]
    pub fn new(
        building_id: usize,
        bottom_height: usize,
        top_height: usize,
        footprint: Vec<Polygon>,
        raw_footprints: Vec<Vec<Polygon>>,
    ) -> Self {
        Self {
            building_id,
            bottom_height,
            top_height,
            footprint,
            raw_footprints,
            children: Vec::new(),
            costs: LayerCosts::default(),
        }
    }

    /// Number of slices spanned by the layer.
    #[must_use]
    pub fn height(&self) -> usize {
        self.top_height.saturating_sub(self.bottom_height)
    }

    /// Sets the cost triple.
    #[must_use]
    pub fn with_costs(mut self, costs: LayerCosts) -> Self {
        self.costs = costs;
        self
    }
}
