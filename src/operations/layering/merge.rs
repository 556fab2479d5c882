use super::grow::LayerNode;

/// Folds layers thinner than `min_slices` into their neighbours.
///
/// Children are normalized before their parent, after which no layer but
/// the root is thinner than `min_slices`:
///
/// - a thin only child merges into its parent;
/// - a thin childless child with siblings is dropped;
/// - a thin child with siblings absorbs its only child, and if it stays
///   thin above a split, its children take its place under the parent.
///
/// A thin root absorbs a single child, and a thin root with no children is
/// dropped.
pub(super) fn merge_thin_root(mut root: LayerNode, min_slices: usize) -> Option<LayerNode> {
    merge_thin_children(&mut root, min_slices);
    while root.height() < min_slices && root.children.len() == 1 {
        let child = root.children.remove(0);
        root.absorb(child);
    }
    if root.height() < min_slices && root.children.is_empty() {
        return None;
    }
    Some(root)
}

fn merge_thin_children(node: &mut LayerNode, min_slices: usize) {
    for child in &mut node.children {
        merge_thin_children(child, min_slices);
    }

    if node.children.len() > 1 {
        node.children
            .retain(|c| c.height() >= min_slices || !c.children.is_empty());
    }

    if node.children.len() == 1 {
        while node.children.len() == 1 && node.children[0].height() < min_slices {
            let child = node.children.remove(0);
            node.absorb(child);
        }
        return;
    }

    let siblings = std::mem::take(&mut node.children);
    for mut child in siblings {
        while child.height() < min_slices && child.children.len() == 1 {
            let grandchild = child.children.remove(0);
            child.absorb(grandchild);
        }
        if child.height() >= min_slices {
            node.children.push(child);
        } else {
            node.children.extend(child.children);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn node(bottom: usize, height: usize, children: Vec<LayerNode>) -> LayerNode {
        LayerNode {
            bottom,
            members: vec![0; height],
            children,
        }
    }

    #[test]
    fn thin_only_child_merges_into_parent() {
        let grandchild = node(6, 4, vec![]);
        let root = node(0, 5, vec![node(5, 1, vec![grandchild.clone()])]);
        let merged = merge_thin_root(root, 3).unwrap();
        assert_eq!(merged.top(), 6);
        assert_eq!(merged.children, vec![grandchild]);
    }

    #[test]
    fn thin_leaf_with_siblings_is_dropped() {
        let keep = node(5, 4, vec![]);
        let root = node(0, 5, vec![node(5, 1, vec![]), keep.clone()]);
        let merged = merge_thin_root(root, 3).unwrap();
        assert_eq!(merged.children, vec![keep]);
    }

    #[test]
    fn thin_root_absorbs_single_child() {
        let root = node(0, 1, vec![node(1, 5, vec![])]);
        let merged = merge_thin_root(root, 3).unwrap();
        assert_eq!(merged.bottom, 0);
        assert_eq!(merged.top(), 6);
        assert!(merged.children.is_empty());
    }

    #[test]
    fn thin_lonely_root_is_dropped() {
        assert!(merge_thin_root(node(0, 2, vec![]), 3).is_none());
        assert!(merge_thin_root(node(0, 3, vec![]), 3).is_some());
    }

    #[test]
    fn chain_of_thin_layers_combines() {
        let root = node(0, 3, vec![node(3, 1, vec![node(4, 1, vec![node(5, 1, vec![])])])]);
        let merged = merge_thin_root(root, 3).unwrap();
        assert_eq!(merged.top(), 3);
        assert_eq!(merged.children.len(), 1);
        assert_eq!(merged.children[0].bottom, 3);
        assert_eq!(merged.children[0].height(), 3);
    }

    #[test]
    fn thin_child_with_siblings_absorbs_its_only_child() {
        let thin = node(5, 1, vec![node(6, 5, vec![])]);
        let keep = node(5, 6, vec![]);
        let root = node(0, 5, vec![thin, keep.clone()]);
        let merged = merge_thin_root(root, 3).unwrap();
        assert_eq!(merged.children.len(), 2);
        assert_eq!(merged.children[0].bottom, 5);
        assert_eq!(merged.children[0].height(), 6);
        assert!(merged.children[0].children.is_empty());
        assert_eq!(merged.children[1], keep);
    }

    #[test]
    fn thin_split_layer_hands_children_to_parent() {
        let a = node(6, 4, vec![]);
        let b = node(6, 5, vec![]);
        let keep = node(5, 6, vec![]);
        let root = node(0, 5, vec![node(5, 1, vec![a.clone(), b.clone()]), keep.clone()]);
        let merged = merge_thin_root(root, 3).unwrap();
        assert_eq!(merged.children, vec![a, b, keep]);
        assert!(merged.children.iter().all(|c| c.height() >= 3));
    }

    #[test]
    fn dropping_siblings_can_leave_an_only_child_to_merge() {
        let thin_parent = node(5, 1, vec![node(6, 4, vec![])]);
        let root = node(0, 5, vec![node(5, 2, vec![]), thin_parent]);
        let merged = merge_thin_root(root, 3).unwrap();
        assert_eq!(merged.top(), 6);
        assert_eq!(merged.children.len(), 1);
        assert_eq!(merged.children[0].bottom, 6);
    }
}
