pub mod layer;
pub mod voxel;

pub use layer::{BuildingLayer, LayerCosts, LayerId};
pub use voxel::VoxelBuilding;

use crate::error::LayeringError;
use slotmap::SlotMap;

/// Arena that owns every layer of one building tree.
///
/// Layers reference their children via typed IDs (generational indices),
/// so the tree has a single owner and no shared or cyclic links. Trees are
/// assembled inside the crate and exposed read-only.
#[derive(Debug, Clone)]
pub struct BuildingTree {
    layers: SlotMap<LayerId, BuildingLayer>,
    root: LayerId,
}

impl BuildingTree {
    /// Creates a tree holding only `root`.
    #[must_use]
    pub fn new(root: BuildingLayer) -> Self {
        let mut layers = SlotMap::with_key();
        let root = layers.insert(root);
        Self { layers, root }
    }

    /// ID of the bottom layer.
    #[must_use]
    pub fn root(&self) -> LayerId {
        self.root
    }

    /// The bottom layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the root has been removed, which the crate never does.
    pub fn root_layer(&self) -> Result<&BuildingLayer, LayeringError> {
        self.layer(self.root)
    }

    /// Building the tree belongs to.
    #[must_use]
    pub fn building_id(&self) -> usize {
        self.layers.get(self.root).map_or(0, |l| l.building_id)
    }

    /// Returns a reference to the layer, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is not in this tree.
    pub fn layer(&self, id: LayerId) -> Result<&BuildingLayer, LayeringError> {
        self.layers.get(id).ok_or(LayeringError::LayerNotFound)
    }

    /// Returns a mutable reference to the layer, or an error if not found.
    pub(crate) fn layer_mut(&mut self, id: LayerId) -> Result<&mut BuildingLayer, LayeringError> {
        self.layers.get_mut(id).ok_or(LayeringError::LayerNotFound)
    }

    /// Inserts `layer` as the last child of `parent` and returns its ID.
    pub(crate) fn add_child(
        &mut self,
        parent: LayerId,
        layer: BuildingLayer,
    ) -> Result<LayerId, LayeringError> {
        if !self.layers.contains_key(parent) {
            return Err(LayeringError::LayerNotFound);
        }
        let id = self.layers.insert(layer);
        self.layer_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Number of layers in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// A tree always holds at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layer IDs in depth-first pre-order, children in insertion order.
    #[must_use]
    pub fn depth_first(&self) -> Vec<LayerId> {
        let mut order = Vec::with_capacity(self.layers.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(layer) = self.layers.get(id) else {
                continue;
            };
            order.push(id);
            stack.extend(layer.children.iter().rev());
        }
        order
    }

    /// Number of layers on the longest root-to-leaf path.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self.root, 1)];
        while let Some((id, d)) = stack.pop() {
            let Some(layer) = self.layers.get(id) else {
                continue;
            };
            max_depth = max_depth.max(d);
            stack.extend(layer.children.iter().map(|&c| (c, d + 1)));
        }
        max_depth
    }

    /// Iterates over every layer in depth-first pre-order.
    pub fn layers(&self) -> impl Iterator<Item = &BuildingLayer> + '_ {
        self.depth_first()
            .into_iter()
            .filter_map(move |id| self.layers.get(id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn layer(bottom: usize, top: usize) -> BuildingLayer {
        BuildingLayer::new(7, bottom, top, vec![], vec![vec![]; top - bottom])
    }

    #[test]
    fn children_follow_insertion_order() {
        let mut tree = BuildingTree::new(layer(0, 4));
        let root = tree.root();
        let a = tree.add_child(root, layer(4, 6)).unwrap();
        let b = tree.add_child(root, layer(4, 9)).unwrap();
        let c = tree.add_child(a, layer(6, 8)).unwrap();

        assert_eq!(tree.len(), 4);
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.depth_first(), vec![root, a, c, b]);
        assert_eq!(tree.root_layer().unwrap().children, vec![a, b]);
        assert_eq!(tree.building_id(), 7);
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let mut tree = BuildingTree::new(layer(0, 1));
        assert!(tree.layer(LayerId::default()).is_err());
        assert!(tree.add_child(LayerId::default(), layer(1, 2)).is_err());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn layers_iterates_every_node() {
        let mut tree = BuildingTree::new(layer(0, 2));
        let root = tree.root();
        tree.add_child(root, layer(2, 5)).unwrap();
        let heights: Vec<usize> = tree.layers().map(BuildingLayer::height).collect();
        assert_eq!(heights, vec![2, 3]);
    }
}
