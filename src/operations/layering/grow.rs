use crate::geometry::Polygon;
use crate::operations::query::{overlaps, Iou};

/// A layer under construction: a vertical run of one component per slice.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct LayerNode {
    pub bottom: usize,
    /// Component index per slice, from `bottom` upward.
    pub members: Vec<usize>,
    pub children: Vec<LayerNode>,
}

impl LayerNode {
    /// One past the last slice.
    pub fn top(&self) -> usize {
        self.bottom + self.members.len()
    }

    pub fn height(&self) -> usize {
        self.members.len()
    }

    /// Extends this layer with `child`'s slices and adopts its children.
    pub fn absorb(&mut self, child: LayerNode) {
        self.members.extend(child.members);
        self.children = child.children;
    }
}

/// Grows layers bottom-up over the valid components of each slice.
pub(super) struct Grower<'a> {
    slices: &'a [Vec<Polygon>],
    /// `claimed[s][c]` is set once component `c` of slice `s` joins a layer.
    /// Malformed components start out claimed.
    claimed: Vec<Vec<bool>>,
    threshold: f64,
}

impl<'a> Grower<'a> {
    pub fn new(slices: &'a [Vec<Polygon>], excluded: &[(usize, usize)], threshold: f64) -> Self {
        let mut claimed: Vec<Vec<bool>> = slices.iter().map(|s| vec![false; s.len()]).collect();
        for &(s, c) in excluded {
            claimed[s][c] = true;
        }
        Self {
            slices,
            claimed,
            threshold,
        }
    }

    /// Grows every root layer. Slices are visited bottom-up, so a component
    /// supported from below is claimed before it could start a root.
    pub fn roots(mut self) -> Vec<LayerNode> {
        let mut roots = Vec::new();
        for s in 0..self.slices.len() {
            for c in 0..self.slices[s].len() {
                if !self.claimed[s][c] {
                    roots.push(self.grow(s, c));
                }
            }
        }
        roots
    }

    fn grow(&mut self, slice: usize, component: usize) -> LayerNode {
        let slices = self.slices;
        self.claimed[slice][component] = true;
        let mut node = LayerNode {
            bottom: slice,
            members: vec![component],
            children: Vec::new(),
        };

        let (mut s, mut cur) = (slice, component);
        while s + 1 < slices.len() {
            let current = &slices[s][cur];
            let next = s + 1;
            let supported: Vec<usize> = (0..slices[next].len())
                .filter(|&c| !self.claimed[next][c] && overlaps(current, &slices[next][c]))
                .collect();

            if let [only] = supported[..] {
                if Iou::new(current, &slices[next][only]).execute() >= self.threshold {
                    self.claimed[next][only] = true;
                    node.members.push(only);
                    s = next;
                    cur = only;
                    continue;
                }
            }

            for c in supported {
                if !self.claimed[next][c] {
                    let child = self.grow(next, c);
                    node.children.push(child);
                }
            }
            break;
        }
        node
    }
}
