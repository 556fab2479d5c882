use crate::geometry::Polygon;

/// One building of the voxel model: its horizontal cross-sections from the
/// ground up, each slice holding the disjoint footprint polygons extracted
/// from the voxel mask at that height.
#[derive(Debug, Clone, Default)]
pub struct VoxelBuilding {
    /// Index of the building in its batch.
    pub building_id: usize,
    /// Per-slice footprint polygons, bottom to top. A slice may be empty.
    pub slices: Vec<Vec<Polygon>>,
}

impl VoxelBuilding {
    /// Creates a voxel building from its slices.
    #[must_use]
    pub fn new(building_id: usize, slices: Vec<Vec<Polygon>>) -> Self {
        Self {
            building_id,
            slices,
        }
    }

    /// Returns `true` if no slice holds a polygon.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slices.iter().all(Vec::is_empty)
    }

    /// Number of slices, including empty ones.
    #[must_use]
    pub fn height(&self) -> usize {
        self.slices.len()
    }
}
