//! Skeletonization pipeline
//!
//! [`skeletonize`] builds the spanning tree of a distance map and classifies
//! it in one call. [`skeletonize_sequence`] does the same for every frame of
//! a time series.

use crate::classify::{ClassifyOptions, SkeletonClassification, classify};
use crate::error::SkeletonResult;
use crate::tree::{SpanningTree, TreeOptions, build_spanning_tree};
use morphovox_core::{CancelToken, Connectivity, DistanceMap, Point3, VoxelSequence};
use tracing::debug;

/// Options for [`skeletonize`]
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkeletonOptions {
    /// Spanning tree options
    pub tree: TreeOptions,
    /// Classification options
    pub classify: ClassifyOptions,
}

impl SkeletonOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tree connectivity
    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.tree.connectivity = connectivity;
        self
    }

    /// Set the visit radius scale
    pub fn with_visit_radius_scale(mut self, scale: f64) -> Self {
        self.classify.visit_radius_scale = scale;
        self
    }

    /// Set the path step factor
    pub fn with_path_step_factor(mut self, factor: f64) -> Self {
        self.classify.path_step_factor = factor;
        self
    }

    /// Check option values
    pub fn validate(&self) -> SkeletonResult<()> {
        self.classify.validate()
    }
}

/// Spanning tree and classification of one volume
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub tree: SpanningTree,
    pub classification: SkeletonClassification,
}

impl Skeleton {
    /// Root of the tree
    pub fn seed(&self) -> Option<Point3> {
        self.tree.seed()
    }

    /// Leaf positions in scan order
    pub fn leaf_points(&self) -> Vec<Point3> {
        self.classification.leaf_points()
    }

    /// Branch positions in scan order
    pub fn branch_points(&self) -> Vec<Point3> {
        self.classification.branch_points()
    }
}

/// Skeletonize a distance map
///
/// # Errors
///
/// Returns an error for invalid options or cancellation. An empty
/// foreground is not an error; it gives an empty skeleton.
pub fn skeletonize(
    distance: &DistanceMap,
    options: &SkeletonOptions,
    cancel: &CancelToken,
) -> SkeletonResult<Skeleton> {
    options.validate()?;
    let tree = build_spanning_tree(distance, &options.tree, cancel)?;
    let classification = classify(distance, &tree, &options.classify, cancel)?;
    debug!(
        reached = tree.reached_count(),
        leaves = classification.leaf_count(),
        branches = classification.branch_count(),
        "skeletonized"
    );
    Ok(Skeleton {
        tree,
        classification,
    })
}

/// Skeletonize every frame of a sequence
///
/// With the `parallel` feature frames run on the rayon thread pool. The
/// first error aborts the whole sequence.
pub fn skeletonize_sequence(
    distance: &VoxelSequence<f64>,
    options: &SkeletonOptions,
    cancel: &CancelToken,
) -> SkeletonResult<Vec<Skeleton>> {
    options.validate()?;

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        distance
            .frames()
            .par_iter()
            .map(|frame| skeletonize(frame, options, cancel))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        distance
            .iter()
            .map(|frame| skeletonize(frame, options, cancel))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SkeletonError;

    #[test]
    fn test_options_builder() {
        let options = SkeletonOptions::new()
            .with_connectivity(Connectivity::Six)
            .with_visit_radius_scale(2.0)
            .with_path_step_factor(0.5);
        assert_eq!(options.tree.connectivity, Connectivity::Six);
        assert_eq!(options.classify.visit_radius_scale, 2.0);
        assert_eq!(options.classify.path_step_factor, 0.5);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_invalid_options_rejected() {
        let field = DistanceMap::new_with_value(3, 3, 1, 1.0).unwrap();
        let options = SkeletonOptions::new().with_path_step_factor(-1.0);
        let out = skeletonize(&field, &options, &CancelToken::new());
        assert!(matches!(out, Err(SkeletonError::InvalidParameters(_))));
    }

    #[test]
    fn test_empty_field() {
        let field = DistanceMap::new(4, 4, 2).unwrap();
        let skeleton = skeletonize(&field, &SkeletonOptions::default(), &CancelToken::new())
            .unwrap();
        assert_eq!(skeleton.seed(), None);
        assert!(skeleton.leaf_points().is_empty());
        assert_eq!(skeleton.classification.skeleton_voxel_count(), 0);
    }
}
