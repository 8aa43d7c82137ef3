//! Watershed flooding
//!
//! Immersion flooding of a [`WatershedGraph`] from the highest level to
//! the lowest. Each level is processed in three phases:
//!
//! 1. **Mark**: unlabeled nodes of the level become pending. A pending node
//!    next to a basin or watershed-line node is queued with frontier
//!    distance 1.
//! 2. **Extend**: a FIFO queue with a [`QueueItem::LayerEnd`] marker grows
//!    the labeled region one geodesic layer at a time. A node touching one
//!    basin joins it, a node touching two or more becomes a watershed line
//!    and records the contact, a node touching only lines becomes a line.
//! 3. **New basins**: pending nodes the extension did not reach are local
//!    maxima. Without seeds they open a fresh basin that floods their
//!    pending component. With seeds they are deferred: they stay out of
//!    later batches until the extension of a lower level reaches them.
//!
//! A node that becomes a basin or a line keeps its label for the rest of
//! the pass.

use crate::error::RegionResult;
use crate::graph::WatershedGraph;
use morphovox_core::{CancelToken, LabelGrid, Point3, VoxelGrid};
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, trace, warn};

/// Output label of watershed-line voxels
pub const WATERSHED_LINE_LABEL: u32 = u32::MAX;

/// Flooding state of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeLabel {
    /// Not reached yet
    #[default]
    Unlabeled,
    /// Reached at the current level, label not decided
    Pending,
    /// Left over from a higher level, waiting for a flood to reach it
    Deferred,
    /// Member of a basin
    Basin(u32),
    /// Separates two or more basins
    WatershedLine,
}

impl NodeLabel {
    /// Whether the label is final
    #[inline]
    pub fn is_labeled(self) -> bool {
        matches!(self, NodeLabel::Basin(_) | NodeLabel::WatershedLine)
    }

    /// Output grid value: basin id, [`WATERSHED_LINE_LABEL`] or 0
    #[inline]
    pub fn to_output(self) -> u32 {
        match self {
            NodeLabel::Basin(l) => l,
            NodeLabel::WatershedLine => WATERSHED_LINE_LABEL,
            NodeLabel::Unlabeled | NodeLabel::Pending | NodeLabel::Deferred => 0,
        }
    }
}

/// Entry of the extension queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueItem {
    /// Node to process
    Node(u32),
    /// End of a geodesic layer
    LayerEnd,
}

/// Two basins meeting at a watershed line
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BasinContact {
    /// Smaller basin id
    pub a: u32,
    /// Larger basin id
    pub b: u32,
    /// Height of the first line node separating them
    pub saddle_height: f64,
}

/// Result of a watershed flood
#[derive(Debug, Clone)]
pub struct WatershedResult {
    /// Per-voxel labels: 0 background or unreached, basin id, or
    /// [`WATERSHED_LINE_LABEL`]
    pub labels: LabelGrid,
    /// Basin contacts sorted by `(a, b)`
    pub contacts: Vec<BasinContact>,
    watershed_voxel_count: usize,
    unreached_voxel_count: usize,
}

impl WatershedResult {
    /// Number of distinct basins with at least one voxel
    pub fn basin_count(&self) -> usize {
        self.basin_sizes().len()
    }

    /// Number of watershed-line voxels
    pub fn watershed_voxel_count(&self) -> usize {
        self.watershed_voxel_count
    }

    /// Foreground voxels left unlabeled because no seed reached them
    pub fn unreached_voxel_count(&self) -> usize {
        self.unreached_voxel_count
    }

    /// Voxel count per basin id
    pub fn basin_sizes(&self) -> BTreeMap<u32, usize> {
        let mut sizes = BTreeMap::new();
        for &l in self.labels.data() {
            if l != 0 && l != WATERSHED_LINE_LABEL {
                *sizes.entry(l).or_insert(0) += 1;
            }
        }
        sizes
    }

    /// Label at a position, `None` outside the grid
    pub fn label_at(&self, p: Point3) -> Option<u32> {
        self.labels.get_at(p).ok()
    }

    /// Whether the voxel at `p` is on a watershed line
    pub fn is_watershed_line(&self, p: Point3) -> bool {
        self.label_at(p) == Some(WATERSHED_LINE_LABEL)
    }
}

/// Flooding state machine over a graph
pub struct WatershedFlooder<'g> {
    graph: &'g WatershedGraph,
    allow_new_basins: bool,
    labels: Vec<NodeLabel>,
    /// Geodesic distance to the labeled region within the current level,
    /// 0 when not reached
    frontier: Vec<u32>,
    queue: VecDeque<QueueItem>,
    next_label: u32,
    /// Deferred nodes the current level's extension reached
    revived: Vec<u32>,
    contacts: BTreeMap<(u32, u32), f64>,
}

impl<'g> WatershedFlooder<'g> {
    /// Prepare a flood. Seed nodes start as basins with their seed label.
    ///
    /// With `allow_new_basins`, unreached maxima open fresh basins numbered
    /// after the largest seed label. Without it, only seeds grow.
    pub fn new(graph: &'g WatershedGraph, allow_new_basins: bool) -> Self {
        let labels = (0..graph.node_count())
            .map(|n| match graph.initial_label(n) {
                Some(l) => NodeLabel::Basin(l),
                None => NodeLabel::Unlabeled,
            })
            .collect();
        Self {
            graph,
            allow_new_basins,
            labels,
            frontier: vec![0; graph.node_count()],
            queue: VecDeque::new(),
            next_label: graph.max_seed_label(),
            revived: Vec::new(),
            contacts: BTreeMap::new(),
        }
    }

    /// Current label of a node
    pub fn label(&self, node: usize) -> NodeLabel {
        self.labels[node]
    }

    /// Flood every level.
    ///
    /// # Errors
    ///
    /// Returns a cancelled core error when `cancel` fires. The token is
    /// checked before each level.
    pub fn run(mut self, cancel: &CancelToken) -> RegionResult<WatershedResult> {
        let graph = self.graph;
        for level in graph.levels() {
            cancel.check()?;
            trace!(height = level.height, nodes = level.nodes.len(), "flooding level");
            self.flood_level(level.nodes, level.height);
        }
        self.finish()
    }

    fn flood_level(&mut self, batch: &[u32], height: f64) {
        let graph = self.graph;

        // Mark
        for &p in batch {
            if self.labels[p as usize] == NodeLabel::Unlabeled {
                self.labels[p as usize] = NodeLabel::Pending;
            }
        }
        for &p in batch {
            let p = p as usize;
            if self.labels[p] == NodeLabel::Pending
                && graph
                    .neighbors(p)
                    .iter()
                    .any(|&q| self.labels[q as usize].is_labeled())
            {
                self.frontier[p] = 1;
                self.queue.push_back(QueueItem::Node(p as u32));
            }
        }

        // Extend
        let mut layer = 1u32;
        self.queue.push_back(QueueItem::LayerEnd);
        let mut basins: Vec<u32> = Vec::new();
        while let Some(item) = self.queue.pop_front() {
            let p = match item {
                QueueItem::LayerEnd => {
                    if self.queue.is_empty() {
                        break;
                    }
                    layer += 1;
                    self.queue.push_back(QueueItem::LayerEnd);
                    continue;
                }
                QueueItem::Node(p) => p as usize,
            };

            basins.clear();
            let mut touches_line = false;
            for &q in graph.neighbors(p) {
                let q = q as usize;
                match self.labels[q] {
                    NodeLabel::Basin(l) if self.frontier[q] <= layer => {
                        if !basins.contains(&l) {
                            basins.push(l);
                        }
                    }
                    NodeLabel::WatershedLine if self.frontier[q] <= layer => {
                        touches_line = true;
                    }
                    NodeLabel::Pending if self.frontier[q] == 0 => {
                        self.frontier[q] = layer + 1;
                        self.queue.push_back(QueueItem::Node(q as u32));
                    }
                    NodeLabel::Deferred => {
                        self.labels[q] = NodeLabel::Pending;
                        self.revived.push(q as u32);
                        self.frontier[q] = layer + 1;
                        self.queue.push_back(QueueItem::Node(q as u32));
                    }
                    _ => {}
                }
            }

            if self.labels[p] != NodeLabel::Pending {
                continue;
            }
            match basins.len() {
                0 if touches_line => self.labels[p] = NodeLabel::WatershedLine,
                0 => {}
                1 => self.labels[p] = NodeLabel::Basin(basins[0]),
                _ => {
                    self.labels[p] = NodeLabel::WatershedLine;
                    basins.sort_unstable();
                    for (i, &a) in basins.iter().enumerate() {
                        for &b in &basins[i + 1..] {
                            self.contacts.entry((a, b)).or_insert(height);
                        }
                    }
                }
            }
        }

        let mut revived = std::mem::take(&mut self.revived);
        for &p in batch.iter().chain(&revived) {
            self.frontier[p as usize] = 0;
        }

        // New basins
        for &p in batch.iter().chain(&revived) {
            let p = p as usize;
            if self.labels[p] != NodeLabel::Pending {
                continue;
            }
            if self.allow_new_basins {
                self.next_label += 1;
                self.fill_pending(p, self.next_label);
            } else {
                self.labels[p] = NodeLabel::Deferred;
            }
        }
        revived.clear();
        self.revived = revived;
    }

    /// Label the pending component of `start` with `label`.
    fn fill_pending(&mut self, start: usize, label: u32) {
        let graph = self.graph;
        let mut stack = VecDeque::new();
        self.labels[start] = NodeLabel::Basin(label);
        stack.push_back(start);
        while let Some(q) = stack.pop_front() {
            for &r in graph.neighbors(q) {
                let r = r as usize;
                if self.labels[r] == NodeLabel::Pending {
                    self.labels[r] = NodeLabel::Basin(label);
                    stack.push_back(r);
                }
            }
        }
    }

    fn finish(self) -> RegionResult<WatershedResult> {
        let graph = self.graph;
        let (w, h, d) = graph.dimensions();
        let mut data = vec![0u32; (w as usize) * (h as usize) * (d as usize)];
        let mut watershed_voxel_count = 0;
        let mut unreached_voxel_count = 0;
        for (n, label) in self.labels.iter().enumerate() {
            match label {
                NodeLabel::WatershedLine => watershed_voxel_count += 1,
                NodeLabel::Deferred => unreached_voxel_count += 1,
                _ => {}
            }
            data[graph.voxel(n)] = label.to_output();
        }
        if unreached_voxel_count > 0 {
            warn!(
                unreached_voxel_count,
                "foreground voxels not reached by any seed"
            );
        }

        let contacts: Vec<BasinContact> = self
            .contacts
            .into_iter()
            .map(|((a, b), saddle_height)| BasinContact {
                a,
                b,
                saddle_height,
            })
            .collect();

        let labels =
            VoxelGrid::from_data(w, h, d, data)?.with_voxel_size(graph.voxel_size())?;
        debug!(
            watershed_voxels = watershed_voxel_count,
            contacts = contacts.len(),
            next_label = self.next_label,
            "flood finished"
        );
        Ok(WatershedResult {
            labels,
            contacts,
            watershed_voxel_count,
            unreached_voxel_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morphovox_core::{Connectivity, DistanceMap};

    fn flood(field: &DistanceMap, seeds: Option<&LabelGrid>, allow_new: bool) -> WatershedResult {
        let cancel = CancelToken::new();
        let graph = WatershedGraph::build(field, seeds, Connectivity::TwentySix, &cancel).unwrap();
        WatershedFlooder::new(&graph, allow_new).run(&cancel).unwrap()
    }

    #[test]
    fn test_two_peaks_on_a_line() {
        // Peaks at x = 1 and x = 5, saddle at x = 3
        let field =
            VoxelGrid::from_data(7, 1, 1, vec![1.0, 3.0, 2.0, 1.5, 2.0, 3.0, 1.0]).unwrap();
        let result = flood(&field, None, true);
        assert_eq!(
            result.labels.data(),
            &[1, 1, 1, WATERSHED_LINE_LABEL, 2, 2, 2]
        );
        assert_eq!(result.basin_count(), 2);
        assert_eq!(
            result.contacts,
            vec![BasinContact {
                a: 1,
                b: 2,
                saddle_height: 1.5
            }]
        );
    }

    #[test]
    fn test_supervised_single_seed_takes_all() {
        let field =
            VoxelGrid::from_data(7, 1, 1, vec![1.0, 3.0, 2.0, 1.5, 2.0, 3.0, 1.0]).unwrap();
        let mut seeds: LabelGrid = VoxelGrid::new(7, 1, 1).unwrap();
        seeds.set(1, 0, 0, 9).unwrap();
        let result = flood(&field, Some(&seeds), false);
        assert_eq!(result.labels.data(), &[9; 7]);
        assert_eq!(result.watershed_voxel_count(), 0);
        assert_eq!(result.unreached_voxel_count(), 0);
    }

    #[test]
    fn test_supervised_unreached_component() {
        // Two components, seed only in the first
        let field = VoxelGrid::from_data(5, 1, 1, vec![1.0, 2.0, 0.0, 2.0, 1.0]).unwrap();
        let mut seeds: LabelGrid = VoxelGrid::new(5, 1, 1).unwrap();
        seeds.set(0, 0, 0, 1).unwrap();
        let result = flood(&field, Some(&seeds), false);
        assert_eq!(result.labels.data(), &[1, 1, 0, 0, 0]);
        assert_eq!(result.unreached_voxel_count(), 2);
    }

    #[test]
    fn test_supervised_seed_below_every_peak() {
        // The seed sits at the lowest voxel, every higher voxel waits for it
        let field = VoxelGrid::from_data(6, 1, 1, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let mut seeds: LabelGrid = VoxelGrid::new(6, 1, 1).unwrap();
        seeds.set(0, 0, 0, 3).unwrap();
        let result = flood(&field, Some(&seeds), false);
        assert_eq!(result.labels.data(), &[3; 6]);
        assert_eq!(result.unreached_voxel_count(), 0);
    }

    #[test]
    fn test_supervised_deferred_count() {
        // A seeded ramp and a separate unseeded ramp with distinct levels
        let mut values: Vec<f64> = (0..30).map(|x| 1.0 + x as f64).collect();
        values.push(0.0);
        values.extend((0..30).map(|x| 1.5 + x as f64));
        let field = VoxelGrid::from_data(61, 1, 1, values).unwrap();
        let mut seeds: LabelGrid = VoxelGrid::new(61, 1, 1).unwrap();
        seeds.set(29, 0, 0, 1).unwrap();
        let result = flood(&field, Some(&seeds), false);
        assert_eq!(result.unreached_voxel_count(), 30);
        assert!(result.labels.data()[..30].iter().all(|&l| l == 1));
        assert!(result.labels.data()[30..].iter().all(|&l| l == 0));
    }

    #[test]
    fn test_new_basins_numbered_after_seeds() {
        let field = VoxelGrid::from_data(5, 1, 1, vec![1.0, 2.0, 0.0, 2.0, 1.0]).unwrap();
        let mut seeds: LabelGrid = VoxelGrid::new(5, 1, 1).unwrap();
        seeds.set(1, 0, 0, 4).unwrap();
        let result = flood(&field, Some(&seeds), true);
        assert_eq!(result.labels.data(), &[4, 4, 0, 5, 5]);
    }

    #[test]
    fn test_node_label_output() {
        assert_eq!(NodeLabel::Basin(3).to_output(), 3);
        assert_eq!(NodeLabel::WatershedLine.to_output(), WATERSHED_LINE_LABEL);
        assert_eq!(NodeLabel::Pending.to_output(), 0);
        assert_eq!(NodeLabel::Deferred.to_output(), 0);
        assert!(!NodeLabel::Unlabeled.is_labeled());
    }
}
