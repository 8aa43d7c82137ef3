//! Minimum spanning tree of a distance map
//!
//! The tree is grown with Dijkstra's algorithm from the deepest voxel of the
//! foreground. Stepping from voxel A to a foreground neighbor B costs
//!
//! ```text
//! offset_length(A -> B) / distance(B)^2
//! ```
//!
//! so paths prefer to run along the medial ridge, where distances are
//! large. The parent of every reached voxel is the neighbor it was reached
//! from. Following parents always ends at the seed.

use crate::error::SkeletonResult;
use morphovox_core::{CancelToken, Connectivity, DistanceMap, Point3, VoxelSize};
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::debug;

const NO_PARENT: u32 = u32::MAX;

/// Options for [`build_spanning_tree`]
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeOptions {
    /// Neighborhood the tree may step through
    pub connectivity: Connectivity,
}

impl TreeOptions {
    /// Create default options (26-connectivity)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set connectivity
    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }
}

/// Shortest-path tree over the foreground voxels
#[derive(Debug, Clone)]
pub struct SpanningTree {
    seed: Option<usize>,
    /// Parent voxel index, [`NO_PARENT`] when unreached, own index at the seed
    parent: Vec<u32>,
    /// Accumulated path cost, `+inf` when unreached
    cost: DistanceMap,
    reached: usize,
}

impl SpanningTree {
    fn empty(distance: &DistanceMap) -> Self {
        Self {
            seed: None,
            parent: vec![NO_PARENT; distance.len()],
            cost: DistanceMap::like(distance, f64::INFINITY),
            reached: 0,
        }
    }

    /// Dimensions of the grid the tree covers
    pub fn dimensions(&self) -> (u32, u32, u32) {
        self.cost.dimensions()
    }

    /// Voxel size of the grid the tree covers
    pub fn voxel_size(&self) -> VoxelSize {
        self.cost.voxel_size()
    }

    /// Root of the tree, `None` when the foreground is empty
    pub fn seed(&self) -> Option<Point3> {
        self.seed.map(|i| self.cost.position_of(i))
    }

    /// Linear index of the root
    pub fn seed_index(&self) -> Option<usize> {
        self.seed
    }

    /// Parent position of `p`.
    ///
    /// The seed is its own parent. Unreached or out-of-grid positions have
    /// none.
    pub fn parent(&self, p: Point3) -> Option<Point3> {
        let i = self.cost.index_of(p.x, p.y, p.z)?;
        self.parent_index(i).map(|j| self.cost.position_of(j))
    }

    /// Parent of the voxel at `index`
    #[inline]
    pub fn parent_index(&self, index: usize) -> Option<usize> {
        match self.parent.get(index) {
            Some(&j) if j != NO_PARENT => Some(j as usize),
            _ => None,
        }
    }

    /// Path cost of every voxel, `+inf` where unreached
    pub fn cost(&self) -> &DistanceMap {
        &self.cost
    }

    /// Whether the voxel at `index` is part of the tree
    #[inline]
    pub fn is_reached(&self, index: usize) -> bool {
        self.parent_index(index).is_some()
    }

    /// Number of voxels in the tree
    pub fn reached_count(&self) -> usize {
        self.reached
    }

    /// Positions from `p` to the seed, both included.
    ///
    /// Empty when `p` is not in the tree.
    pub fn path_to_seed(&self, p: Point3) -> Vec<Point3> {
        let Some(mut i) = self.cost.index_of(p.x, p.y, p.z) else {
            return Vec::new();
        };
        let mut path = Vec::new();
        while let Some(j) = self.parent_index(i) {
            path.push(self.cost.position_of(i));
            if j == i || path.len() > self.reached {
                break;
            }
            i = j;
        }
        path
    }

    /// `(child, parent)` pairs of every tree edge, in child scan order
    pub fn segments(&self) -> impl Iterator<Item = (Point3, Point3)> + '_ {
        self.parent
            .iter()
            .enumerate()
            .filter(|&(i, &j)| j != NO_PARENT && j as usize != i)
            .map(|(i, &j)| (self.cost.position_of(i), self.cost.position_of(j as usize)))
    }
}

/// Build the minimum spanning tree of a distance map
///
/// The seed is the global maximum; among equal maxima the last one in scan
/// order wins. A field whose maximum is not positive yields an empty tree.
/// Voxels in a foreground component not connected to the seed stay
/// unreached.
///
/// The cancel token is checked once per heap pop.
pub fn build_spanning_tree(
    distance: &DistanceMap,
    options: &TreeOptions,
    cancel: &CancelToken,
) -> SkeletonResult<SpanningTree> {
    let mut tree = SpanningTree::empty(distance);
    let (max, seed_pos) = distance.max_with_position();
    if !(max > 0.0) {
        debug!("no foreground, empty spanning tree");
        return Ok(tree);
    }
    let Some(seed) = distance.index_of(seed_pos.x, seed_pos.y, seed_pos.z) else {
        return Ok(tree);
    };

    let size = distance.voxel_size();
    let steps: Vec<_> = distance
        .offsets(options.connectivity)
        .into_iter()
        .map(|o| (o, size.offset_length(o.0 as i64, o.1 as i64, o.2 as i64)))
        .collect();
    let data = distance.data();
    let cost = tree.cost.data_mut();
    let mut finalized = vec![false; data.len()];
    let mut heap = BinaryHeap::new();

    cost[seed] = 0.0;
    tree.parent[seed] = seed as u32;
    heap.push(Reverse((OrderedFloat(0.0), seed as u32)));

    while let Some(Reverse((_, p))) = heap.pop() {
        cancel.check()?;
        let p = p as usize;
        if finalized[p] {
            continue;
        }
        finalized[p] = true;
        tree.reached += 1;

        let pos = distance.position_of(p);
        for &(offset, length) in &steps {
            let Some(q) = distance.offset_index(pos, offset) else {
                continue;
            };
            let dq = data[q];
            if !(dq > 0.0) || finalized[q] {
                continue;
            }
            let candidate = cost[p] + length / (dq * dq);
            if candidate < cost[q] {
                cost[q] = candidate;
                tree.parent[q] = p as u32;
                heap.push(Reverse((OrderedFloat(candidate), q as u32)));
            }
        }
    }

    tree.seed = Some(seed);
    debug!(
        seed = %seed_pos,
        max_distance = max,
        reached = tree.reached,
        foreground = distance.foreground_count(),
        "built spanning tree"
    );
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use morphovox_core::VoxelGrid;

    fn build(distance: &DistanceMap) -> SpanningTree {
        build_spanning_tree(distance, &TreeOptions::default(), &CancelToken::new()).unwrap()
    }

    #[test]
    fn test_line_parents_point_to_peak() {
        let field = VoxelGrid::from_data(5, 1, 1, vec![1.0, 2.0, 3.0, 2.0, 1.0]).unwrap();
        let tree = build(&field);
        assert_eq!(tree.seed(), Some(Point3::new(2, 0, 0)));
        assert_eq!(tree.parent_index(0), Some(1));
        assert_eq!(tree.parent_index(1), Some(2));
        assert_eq!(tree.parent_index(2), Some(2));
        assert_eq!(tree.parent_index(4), Some(3));
        assert_eq!(tree.reached_count(), 5);
        // 1 / 2^2 + 1 / 1^2
        assert!((tree.cost().data()[0] - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_last_maximum_is_seed() {
        let field = VoxelGrid::from_data(4, 1, 1, vec![2.0, 1.0, 1.0, 2.0]).unwrap();
        assert_eq!(build(&field).seed_index(), Some(3));
    }

    #[test]
    fn test_disconnected_component_unreached() {
        let field = VoxelGrid::from_data(5, 1, 1, vec![3.0, 1.0, 0.0, 1.0, 1.0]).unwrap();
        let tree = build(&field);
        assert_eq!(tree.reached_count(), 2);
        assert!(!tree.is_reached(2));
        assert!(!tree.is_reached(3));
        assert_eq!(tree.cost().data()[3], f64::INFINITY);
        assert!(tree.path_to_seed(Point3::new(4, 0, 0)).is_empty());
    }

    #[test]
    fn test_empty_field() {
        let field = DistanceMap::new(3, 3, 3).unwrap();
        let tree = build(&field);
        assert_eq!(tree.seed(), None);
        assert_eq!(tree.reached_count(), 0);
        assert_eq!(tree.segments().count(), 0);
    }

    #[test]
    fn test_path_and_segments() {
        let field = VoxelGrid::from_data(4, 1, 1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let tree = build(&field);
        let path = tree.path_to_seed(Point3::new(0, 0, 0));
        let xs: Vec<u32> = path.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0, 1, 2, 3]);
        assert_eq!(tree.segments().count(), 3);
        assert_eq!(tree.parent(Point3::new(3, 0, 0)), Some(Point3::new(3, 0, 0)));
        assert_eq!(tree.parent(Point3::new(9, 0, 0)), None);
    }

    #[test]
    fn test_cancelled() {
        let field = VoxelGrid::from_data(3, 1, 1, vec![1.0, 2.0, 1.0]).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let out = build_spanning_tree(&field, &TreeOptions::default(), &cancel);
        assert!(out.is_err_and(|e| e.is_cancelled()));
    }
}
