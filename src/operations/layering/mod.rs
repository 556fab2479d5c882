mod grow;
mod merge;

use tracing::{debug, warn};

use crate::building::{BuildingLayer, BuildingTree, LayerId, VoxelBuilding};
use crate::error::{GeometryError, LayeringError, Result};
use crate::geometry::Polygon;
use crate::math::TOLERANCE;
use crate::operations::query::{layer_cost, Iou};

use grow::{Grower, LayerNode};
use merge::merge_thin_root;

/// Default IOU between consecutive slices below which a new layer starts.
pub const DEFAULT_LAYERING_THRESHOLD: f64 = 0.7;

/// Default minimum number of slices per layer.
pub const DEFAULT_MIN_SLICES_PER_LAYER: usize = 3;

/// Groups the slices of a voxel building into trees of vertically
/// homogeneous layers, one tree per disjoint bottom component.
///
/// A layer grows upward while each slice's footprint keeps an IOU of at
/// least `threshold` with the slice below. Where the footprint splits or
/// changes too much, the supported components of the next slice each start
/// a child layer.
#[derive(Debug, Clone, Copy)]
pub struct Layering {
    threshold: f64,
    min_slices: usize,
}

impl Default for Layering {
    fn default() -> Self {
        Self::new(DEFAULT_LAYERING_THRESHOLD, DEFAULT_MIN_SLICES_PER_LAYER)
    }
}

impl Layering {
    /// Creates a new layering operation.
    #[must_use]
    pub fn new(threshold: f64, min_slices: usize) -> Self {
        Self {
            threshold,
            min_slices,
        }
    }

    /// Executes the layering.
    ///
    /// An empty building yields no trees. Malformed components are logged
    /// and left out.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::ParameterOutOfRange` if the threshold is
    /// outside `[0, 1]`.
    pub fn execute(&self, building: &VoxelBuilding) -> Result<Vec<BuildingTree>> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "layering_threshold",
                value: self.threshold,
                min: 0.0,
                max: 1.0,
            }
            .into());
        }
        if building.is_empty() {
            return Ok(Vec::new());
        }

        let mut excluded = Vec::new();
        for (s, slice) in building.slices.iter().enumerate() {
            for (c, poly) in slice.iter().enumerate() {
                if let Err(e) = check_component(s, c, poly) {
                    warn!(building = building.building_id, error = %e, "skipping component");
                    excluded.push((s, c));
                }
            }
        }

        let roots = Grower::new(&building.slices, &excluded, self.threshold).roots();
        let mut trees = Vec::with_capacity(roots.len());
        for root in roots {
            let Some(root) = merge_thin_root(root, self.min_slices) else {
                debug!(building = building.building_id, "dropping thin isolated layer");
                continue;
            };
            trees.push(materialize(building, &root));
        }
        Ok(trees)
    }
}

/// Rejects components with fewer than 3 vertices or no area.
fn check_component(slice: usize, component: usize, poly: &Polygon) -> std::result::Result<(), LayeringError> {
    let reason = if poly.contour().len() < 3 {
        format!("{} vertices", poly.contour().len())
    } else if poly.area() < TOLERANCE {
        "zero area".to_owned()
    } else {
        return Ok(());
    };
    Err(LayeringError::MalformedComponent {
        slice,
        component,
        reason,
    })
}

fn materialize(building: &VoxelBuilding, root: &LayerNode) -> BuildingTree {
    let mut tree = BuildingTree::new(to_layer(building, root));
    let mut stack: Vec<(LayerId, &LayerNode)> = vec![(tree.root(), root)];
    while let Some((id, node)) = stack.pop() {
        for child in &node.children {
            // The parent was inserted just before, so this cannot fail.
            if let Ok(child_id) = tree.add_child(id, to_layer(building, child)) {
                stack.push((child_id, child));
            }
        }
    }
    tree
}

fn to_layer(building: &VoxelBuilding, node: &LayerNode) -> BuildingLayer {
    let raw: Vec<Vec<Polygon>> = node
        .members
        .iter()
        .enumerate()
        .map(|(k, &c)| vec![building.slices[node.bottom + k][c].clone()])
        .collect();
    let representative = representative(&raw);
    let costs = layer_cost(&representative, &raw, &representative, node.height());
    BuildingLayer::new(
        building.building_id,
        node.bottom,
        node.top(),
        vec![representative],
        raw,
    )
    .with_costs(costs)
}

/// The slice polygon with the largest summed IOU against all others; the
/// lowest slice wins ties.
fn representative(raw: &[Vec<Polygon>]) -> Polygon {
    let polys: Vec<&Polygon> = raw.iter().flatten().collect();
    let mut best: Option<(&Polygon, f64)> = None;
    for (i, a) in polys.iter().enumerate() {
        let score: f64 = polys
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(_, b)| Iou::new(a, b).execute())
            .sum();
        if best.map_or(true, |(_, s)| score > s + TOLERANCE) {
            best = Some((*a, score));
        }
    }
    best.map(|(p, _)| p.clone()).unwrap_or_default()
}
