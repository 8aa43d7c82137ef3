//! Topological classification of a spanning tree
//!
//! Turns a [`SpanningTree`] into a skeleton by tracing tree paths from the
//! voxels farthest from the seed. Endness, the path cost normalized by the
//! squared distance, orders the voxels; the most remote unclaimed voxel
//! becomes a leaf and its path is walked towards the seed:
//!
//! - every voxel on the path joins the skeleton
//! - every `distance × path_step_factor` of path length a sphere of radius
//!   `distance × visit_radius_scale` claims the voxels around the path, so
//!   they cannot start another leaf. The seed gets a sphere too.
//! - the walk stops at the first voxel that is already skeletal, or at the
//!   seed
//!
//! A walk that joins the middle of an earlier path makes the join voxel a
//! branch point. Joining the end of a path (the seed when only one walk
//! ended there) just extends that path. Joining a stretch an earlier walk
//! marked past a saddle does not stop the walk: it takes over that stretch
//! on to the seed.
//!
//! Walks also watch the distance along the path for a saddle: a dip whose
//! depth is below `1 / visit_radius_scale` of the distance on both sides.
//! Past the first saddle a walk is inside another peak's lobe. It keeps
//! marking the skeleton but claims nothing more, so that lobe still gets a
//! leaf of its own. When the two lobes' paths meet, the saddle between them
//! is the branch point.
//!
//! Claims carry the id of the leaf whose walk made them.

use crate::error::{SkeletonError, SkeletonResult};
use crate::tree::SpanningTree;
use morphovox_core::{CancelToken, DistanceMap, LabelGrid, MaskGrid, Point3, VoxelGrid};
use tracing::debug;

/// Options for [`classify`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassifyOptions {
    /// Sphere radius as a multiple of the local distance. A dip along a
    /// walk is a saddle when both sides rise above this multiple of it.
    pub visit_radius_scale: f64,
    /// Path length between spheres as a multiple of the last sphere's distance
    pub path_step_factor: f64,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            visit_radius_scale: 1.5,
            path_step_factor: 1.1,
        }
    }
}

impl ClassifyOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the visit radius scale
    pub fn with_visit_radius_scale(mut self, scale: f64) -> Self {
        self.visit_radius_scale = scale;
        self
    }

    /// Set the path step factor
    pub fn with_path_step_factor(mut self, factor: f64) -> Self {
        self.path_step_factor = factor;
        self
    }

    /// Check that both factors are finite and positive
    pub fn validate(&self) -> SkeletonResult<()> {
        for (name, v) in [
            ("visit_radius_scale", self.visit_radius_scale),
            ("path_step_factor", self.path_step_factor),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(SkeletonError::InvalidParameters(format!(
                    "{name} must be finite and > 0, got {v}"
                )));
            }
        }
        Ok(())
    }
}

/// Skeleton masks and claims of one volume
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonClassification {
    /// Leaf id that claimed each voxel, 0 if unclaimed
    pub claims: LabelGrid,
    /// Voxels on a traced path
    pub skeleton: MaskGrid,
    /// Path start points
    pub leaves: MaskGrid,
    /// Voxels where a path joined an earlier one
    pub branches: MaskGrid,
}

fn mask_points(mask: &MaskGrid) -> Vec<Point3> {
    mask.data()
        .iter()
        .enumerate()
        .filter(|&(_, &m)| m)
        .map(|(i, _)| mask.position_of(i))
        .collect()
}

impl SkeletonClassification {
    /// Leaf positions in scan order
    pub fn leaf_points(&self) -> Vec<Point3> {
        mask_points(&self.leaves)
    }

    /// Branch positions in scan order
    pub fn branch_points(&self) -> Vec<Point3> {
        mask_points(&self.branches)
    }

    /// Number of skeleton voxels
    pub fn skeleton_voxel_count(&self) -> usize {
        self.skeleton.data().iter().filter(|&&s| s).count()
    }

    /// Number of leaves
    pub fn leaf_count(&self) -> usize {
        self.leaves.data().iter().filter(|&&l| l).count()
    }

    /// Number of branch points
    pub fn branch_count(&self) -> usize {
        self.branches.data().iter().filter(|&&b| b).count()
    }
}

/// First saddle along a walk
struct SaddleWatch {
    scale: f64,
    /// Highest distance since the last reset
    peak: f64,
    /// Lowest voxel after the peak
    low: Option<(usize, f64)>,
    saddle: Option<usize>,
}

impl SaddleWatch {
    fn new(start: f64, scale: f64) -> Self {
        Self {
            scale,
            peak: start,
            low: None,
            saddle: None,
        }
    }

    fn step(&mut self, v: usize, dv: f64) {
        if self.saddle.is_some() {
            return;
        }
        match self.low {
            Some((l, dl)) if self.peak > self.scale * dl && dv > self.scale * dl => {
                self.saddle = Some(l);
            }
            _ if dv > self.peak => {
                self.peak = dv;
                self.low = None;
            }
            Some((_, dl)) if dv >= dl => {}
            _ => self.low = Some((v, dv)),
        }
    }
}

struct Classifier<'a> {
    distance: &'a DistanceMap,
    claims: Vec<u32>,
    skeleton: Vec<bool>,
    leaves: Vec<bool>,
    branches: Vec<bool>,
    /// Number of path ends and passes through each skeleton voxel
    arms: Vec<u8>,
    /// Saddle an earlier walk crossed to reach this voxel unclaimed
    past_saddle: Vec<Option<u32>>,
}

impl Classifier<'_> {
    /// Claim the unclaimed foreground voxels within a physical radius
    fn visit_sphere(&mut self, centre: usize, radius: f64, claim: u32) {
        let distance = self.distance;
        let c = distance.position_of(centre);
        let size = distance.voxel_size();
        let (w, h, d) = distance.dimensions();
        let span = |pos: u32, spacing: f64, len: u32| {
            let k = (radius / spacing) as i64;
            let lo = (pos as i64).saturating_sub(k).max(0);
            let hi = (pos as i64).saturating_add(k).min(len as i64 - 1);
            (lo as u32, hi as u32)
        };
        let (x0, x1) = span(c.x, size.x, w);
        let (y0, y1) = span(c.y, size.y, h);
        let (z0, z1) = span(c.z, size.z, d);
        let r2 = radius * radius;
        let data = distance.data();

        for z in z0..=z1 {
            for y in y0..=y1 {
                for x in x0..=x1 {
                    let dd = size.offset_length_squared(
                        x as i64 - c.x as i64,
                        y as i64 - c.y as i64,
                        z as i64 - c.z as i64,
                    );
                    if dd > r2 {
                        continue;
                    }
                    let q = ((z * h + y) * w + x) as usize;
                    if data[q] > 0.0 && self.claims[q] == 0 {
                        self.claims[q] = claim;
                    }
                }
            }
        }
    }

    /// End a walk on the skeletal voxel `at`
    fn join(&mut self, at: usize, saddle: Option<usize>) {
        self.arms[at] = self.arms[at].saturating_add(1);
        if self.leaves[at] && self.arms[at] == 2 {
            self.leaves[at] = false;
        }
        if self.arms[at] >= 3 {
            self.branches[at] = true;
        } else if let Some(s) = saddle {
            self.branches[s] = true;
        }
    }

    /// Walk from a new leaf towards the seed
    fn trace(&mut self, tree: &SpanningTree, leaf: usize, claim: u32, options: &ClassifyOptions) {
        let distance = self.distance;
        let data = distance.data();
        let size = distance.voxel_size();
        let scale = options.visit_radius_scale;

        self.visit_sphere(leaf, scale * data[leaf], claim);
        self.leaves[leaf] = true;
        self.skeleton[leaf] = true;
        self.arms[leaf] = 1;

        let mut watch = SaddleWatch::new(data[leaf], scale);
        // Following an earlier walk's unclaimed stretch to the seed
        let mut through = false;
        let mut last = leaf;
        let mut length = 0.0;
        let mut cur = leaf;
        while let Some(par) = tree.parent_index(cur) {
            if par == cur {
                if watch.saddle.is_none() {
                    self.visit_sphere(cur, scale * data[cur], claim);
                }
                if cur != leaf && !through {
                    self.arms[cur] = 1;
                }
                break;
            }
            let (dx, dy, dz) = distance
                .position_of(cur)
                .offset_to(&distance.position_of(par));
            length += size.offset_length(dx, dy, dz);
            if self.skeleton[par] && !through {
                let Some(s) = self.past_saddle[par] else {
                    self.join(par, watch.saddle);
                    break;
                };
                self.branches[s as usize] = true;
                self.arms[par] = self.arms[par].saturating_add(1);
                through = true;
            }
            if through {
                self.past_saddle[par] = None;
            }
            if !self.skeleton[par] {
                self.skeleton[par] = true;
                self.arms[par] = 2;
            }
            watch.step(par, data[par]);
            if let Some(s) = watch.saddle {
                self.past_saddle[par] = Some(s as u32);
            } else if length > data[last] * options.path_step_factor {
                self.visit_sphere(par, scale * data[par], claim);
                last = par;
                length = 0.0;
            }
            cur = par;
        }
    }
}

/// Classify the voxels of a spanning tree into skeleton, leaves and branches
///
/// # Errors
///
/// Returns `SkeletonError::TreeMismatch` if the tree was built on a grid of
/// other dimensions, `InvalidParameters` for bad options and a cancelled
/// core error when `cancel` fires. The token is checked once per voxel.
pub fn classify(
    distance: &DistanceMap,
    tree: &SpanningTree,
    options: &ClassifyOptions,
    cancel: &CancelToken,
) -> SkeletonResult<SkeletonClassification> {
    options.validate()?;
    if tree.dimensions() != distance.dimensions() {
        return Err(SkeletonError::TreeMismatch {
            tree: tree.dimensions(),
            distance: distance.dimensions(),
        });
    }

    let data = distance.data();
    let cost = tree.cost().data();
    let endness = |i: usize| cost[i] / (data[i] * data[i]);
    let mut order: Vec<usize> = (0..data.len())
        .filter(|&i| data[i] > 0.0 && tree.is_reached(i))
        .collect();
    order.sort_by(|&a, &b| endness(b).total_cmp(&endness(a)));

    let n = data.len();
    let mut classifier = Classifier {
        distance,
        claims: vec![0; n],
        skeleton: vec![false; n],
        leaves: vec![false; n],
        branches: vec![false; n],
        arms: vec![0; n],
        past_saddle: vec![None; n],
    };
    let mut next_claim = 0u32;
    for &v in &order {
        cancel.check()?;
        if classifier.claims[v] != 0 {
            continue;
        }
        next_claim += 1;
        classifier.trace(tree, v, next_claim, options);
    }

    let (w, h, d) = distance.dimensions();
    let size = distance.voxel_size();
    let grid = |values: Vec<bool>| -> SkeletonResult<MaskGrid> {
        Ok(VoxelGrid::from_data(w, h, d, values)?.with_voxel_size(size)?)
    };
    let result = SkeletonClassification {
        claims: VoxelGrid::from_data(w, h, d, classifier.claims)?.with_voxel_size(size)?,
        skeleton: grid(classifier.skeleton)?,
        leaves: grid(classifier.leaves)?,
        branches: grid(classifier.branches)?,
    };
    debug!(
        leaves = result.leaf_count(),
        branches = result.branch_count(),
        skeleton_voxels = result.skeleton_voxel_count(),
        "classified skeleton"
    );
    Ok(result)
}
