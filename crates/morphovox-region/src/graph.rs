//! Watershed graph
//!
//! The flooding algorithm does not walk the voxel grid directly. It works on
//! a graph with one node per foreground voxel (distance > 0), built once
//! and never mutated:
//!
//! - nodes are numbered in scan order (z, then y, then x)
//! - adjacency links every in-bounds foreground neighbor of the chosen
//!   connectivity and is stored as a compressed index list
//! - a voxel → node lookup maps background voxels to no node
//! - nodes are sorted by strictly decreasing height; equal heights keep
//!   scan order, and each distinct height forms one level
//!
//! Seeds are copied into the nodes as their initial labels.

use crate::error::RegionResult;
use morphovox_core::{
    CancelToken, Connectivity, DistanceMap, LabelGrid, Point3, VoxelSequence, VoxelSize,
};
use tracing::{debug, warn};

const NO_NODE: u32 = u32::MAX;

/// One foreground voxel of the graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatershedNode {
    /// Linear voxel index
    pub voxel: u32,
    /// Distance value of the voxel
    pub height: f64,
    /// Seed label, 0 if the voxel is not a seed
    pub initial_label: u32,
}

/// A set of nodes sharing one height
#[derive(Debug, Clone, Copy)]
pub struct Level<'a> {
    /// Common height of the nodes
    pub height: f64,
    /// Node ids in scan order
    pub nodes: &'a [u32],
}

/// Flooding graph of a distance map
#[derive(Debug, Clone)]
pub struct WatershedGraph {
    dimensions: (u32, u32, u32),
    voxel_size: VoxelSize,
    connectivity: Connectivity,
    nodes: Vec<WatershedNode>,
    lookup: Vec<u32>,
    /// `adjacency[adj_start[n]..adj_start[n + 1]]` are the neighbors of `n`
    adj_start: Vec<u32>,
    adjacency: Vec<u32>,
    /// Node ids sorted by decreasing height
    order: Vec<u32>,
    /// `(height, start, end)` ranges into `order`
    levels: Vec<(f64, usize, usize)>,
    max_seed_label: u32,
}

impl WatershedGraph {
    /// Build the graph of a distance map.
    ///
    /// Seed voxels that lie on background are ignored with a warning.
    ///
    /// # Errors
    ///
    /// Returns a core `DimensionMismatch` error if the seed grid does not
    /// match the distance map, and a cancelled core error when `cancel`
    /// fires. The token is checked once per z-slice.
    pub fn build(
        distance: &DistanceMap,
        seeds: Option<&LabelGrid>,
        connectivity: Connectivity,
        cancel: &CancelToken,
    ) -> RegionResult<Self> {
        if let Some(seeds) = seeds {
            distance.check_same_dimensions(seeds)?;
        }
        let (w, h, _) = distance.dimensions();
        let plane = (w * h) as usize;
        let data = distance.data();

        let mut lookup = vec![NO_NODE; data.len()];
        let mut nodes = Vec::new();
        let mut ignored_seeds = 0usize;
        let mut max_seed_label = 0u32;
        for (i, &v) in data.iter().enumerate() {
            if i % plane == 0 {
                cancel.check()?;
            }
            let seed = seeds.map_or(0, |s| s.data()[i]);
            if v > 0.0 {
                lookup[i] = nodes.len() as u32;
                nodes.push(WatershedNode {
                    voxel: i as u32,
                    height: v,
                    initial_label: seed,
                });
                max_seed_label = max_seed_label.max(seed);
            } else if seed > 0 {
                ignored_seeds += 1;
            }
        }
        if ignored_seeds > 0 {
            warn!(ignored_seeds, "seeds on background voxels are ignored");
        }

        let offsets = distance.offsets(connectivity);
        let mut adj_start = Vec::with_capacity(nodes.len() + 1);
        let mut adjacency = Vec::with_capacity(nodes.len() * offsets.len() / 2);
        adj_start.push(0u32);
        let mut slice = usize::MAX;
        for node in &nodes {
            let i = node.voxel as usize;
            if i / plane != slice {
                slice = i / plane;
                cancel.check()?;
            }
            adjacency.extend(
                distance
                    .neighbors(i, &offsets)
                    .map(|(n, _)| lookup[n])
                    .filter(|&n| n != NO_NODE),
            );
            adj_start.push(adjacency.len() as u32);
        }

        let mut order: Vec<u32> = (0..nodes.len() as u32).collect();
        order.sort_by(|&a, &b| {
            nodes[b as usize]
                .height
                .total_cmp(&nodes[a as usize].height)
        });

        let mut levels: Vec<(f64, usize, usize)> = Vec::new();
        for (k, &n) in order.iter().enumerate() {
            let height = nodes[n as usize].height;
            match levels.last_mut() {
                Some(level) if level.0 == height => level.2 = k + 1,
                _ => levels.push((height, k, k + 1)),
            }
        }

        debug!(
            nodes = nodes.len(),
            edges = adjacency.len() / 2,
            levels = levels.len(),
            max_seed_label,
            "built watershed graph"
        );

        Ok(Self {
            dimensions: distance.dimensions(),
            voxel_size: distance.voxel_size(),
            connectivity,
            nodes,
            lookup,
            adj_start,
            adjacency,
            order,
            levels,
            max_seed_label,
        })
    }

    /// Build the graph of frame `t` of a sequence.
    ///
    /// # Errors
    ///
    /// Returns a core `IndexOutOfBounds` error if `t` is outside either
    /// sequence.
    pub fn for_frame(
        distance: &VoxelSequence<f64>,
        seeds: Option<&VoxelSequence<u32>>,
        t: usize,
        connectivity: Connectivity,
        cancel: &CancelToken,
    ) -> RegionResult<Self> {
        let frame = distance.frame(t)?;
        let seed_frame = seeds.map(|s| s.frame(t)).transpose()?;
        Self::build(frame, seed_frame, connectivity, cancel)
    }

    /// Dimensions of the source grid
    pub fn dimensions(&self) -> (u32, u32, u32) {
        self.dimensions
    }

    /// Voxel size of the source grid
    pub fn voxel_size(&self) -> VoxelSize {
        self.voxel_size
    }

    /// Connectivity used for adjacency
    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Number of nodes (foreground voxels)
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All nodes in scan order
    pub fn nodes(&self) -> &[WatershedNode] {
        &self.nodes
    }

    /// Height of a node
    #[inline]
    pub fn height(&self, node: usize) -> f64 {
        self.nodes[node].height
    }

    /// Linear voxel index of a node
    #[inline]
    pub fn voxel(&self, node: usize) -> usize {
        self.nodes[node].voxel as usize
    }

    /// Voxel position of a node
    pub fn position(&self, node: usize) -> Point3 {
        let (w, h, _) = self.dimensions;
        let i = self.voxel(node) as u32;
        Point3::new(i % w, (i / w) % h, i / (w * h))
    }

    /// Node of a voxel, `None` for background or out-of-range indices
    #[inline]
    pub fn node_at(&self, voxel: usize) -> Option<usize> {
        match self.lookup.get(voxel) {
            Some(&n) if n != NO_NODE => Some(n as usize),
            _ => None,
        }
    }

    /// Neighbor node ids of a node
    #[inline]
    pub fn neighbors(&self, node: usize) -> &[u32] {
        let start = self.adj_start[node] as usize;
        let end = self.adj_start[node + 1] as usize;
        &self.adjacency[start..end]
    }

    /// Seed label of a node
    #[inline]
    pub fn initial_label(&self, node: usize) -> Option<u32> {
        match self.nodes[node].initial_label {
            0 => None,
            l => Some(l),
        }
    }

    /// Height levels from highest to lowest
    pub fn levels(&self) -> impl Iterator<Item = Level<'_>> + '_ {
        self.levels.iter().map(move |&(height, start, end)| Level {
            height,
            nodes: &self.order[start..end],
        })
    }

    /// Number of distinct heights
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Largest seed label, 0 without seeds
    pub fn max_seed_label(&self) -> u32 {
        self.max_seed_label
    }

    /// Whether any node carries a seed label
    pub fn is_seeded(&self) -> bool {
        self.max_seed_label > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morphovox_core::VoxelGrid;

    fn line_field() -> DistanceMap {
        VoxelGrid::from_data(6, 1, 1, vec![0.0, 1.0, 2.0, 2.0, 1.0, 0.0]).unwrap()
    }

    #[test]
    fn test_nodes_and_lookup() {
        let graph =
            WatershedGraph::build(&line_field(), None, Connectivity::Six, &CancelToken::new())
                .unwrap();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.node_at(0), None);
        assert_eq!(graph.node_at(1), Some(0));
        assert_eq!(graph.voxel(3), 4);
        assert_eq!(graph.position(2), Point3::new(3, 0, 0));
        assert_eq!(graph.neighbors(0), &[1]);
        assert_eq!(graph.neighbors(1), &[0, 2]);
    }

    #[test]
    fn test_levels_decreasing_scan_order_ties() {
        let graph =
            WatershedGraph::build(&line_field(), None, Connectivity::Six, &CancelToken::new())
                .unwrap();
        let levels: Vec<(f64, Vec<u32>)> = graph
            .levels()
            .map(|l| (l.height, l.nodes.to_vec()))
            .collect();
        assert_eq!(levels, vec![(2.0, vec![1, 2]), (1.0, vec![0, 3])]);
    }

    #[test]
    fn test_adjacency_symmetric() {
        let mut field = DistanceMap::new(5, 4, 3).unwrap();
        for (i, v) in field.data_mut().iter_mut().enumerate() {
            *v = ((i * 7) % 5) as f64;
        }
        let graph = WatershedGraph::build(
            &field,
            None,
            Connectivity::TwentySix,
            &CancelToken::new(),
        )
        .unwrap();
        for n in 0..graph.node_count() {
            for &m in graph.neighbors(n) {
                assert!(graph.neighbors(m as usize).contains(&(n as u32)));
            }
        }
    }

    #[test]
    fn test_seeds_on_background_ignored() {
        let mut seeds: LabelGrid = VoxelGrid::new(6, 1, 1).unwrap();
        seeds.set(0, 0, 0, 4).unwrap();
        seeds.set(2, 0, 0, 3).unwrap();
        let graph = WatershedGraph::build(
            &line_field(),
            Some(&seeds),
            Connectivity::Six,
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(graph.max_seed_label(), 3);
        assert_eq!(graph.initial_label(1), Some(3));
        assert_eq!(graph.initial_label(0), None);
    }

    #[test]
    fn test_seed_dimension_mismatch() {
        let seeds: LabelGrid = VoxelGrid::new(5, 1, 1).unwrap();
        let out = WatershedGraph::build(
            &line_field(),
            Some(&seeds),
            Connectivity::Six,
            &CancelToken::new(),
        );
        assert!(out.is_err());
    }
}
