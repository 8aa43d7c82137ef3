//! Watershed segmentation
//!
//! This module ties seed detection, graph construction and flooding
//! together. The distance map is treated as a relief flooded from its
//! maxima downwards, so each basin is one object and watershed lines run
//! along the necks between objects.
//!
//! Which seeds are used depends on the options:
//!
//! | explicit seeds | `allow_new_basins` | behavior |
//! |---|---|---|
//! | yes | true | seeds grow, unreached maxima open new basins |
//! | yes | false | only seeds grow (supervised) |
//! | no | true | every maximum opens a basin (unsupervised) |
//! | no | false | seeds from [`select_seeds`], then supervised |

use crate::error::{RegionError, RegionResult};
use crate::flood::{WatershedFlooder, WatershedResult};
use crate::graph::WatershedGraph;
use crate::seeds::{SeedOptions, seeds_to_grid, select_seeds};
use morphovox_core::{CancelToken, Connectivity, DistanceMap, LabelGrid, VoxelSequence};
use tracing::debug;

/// Options for watershed segmentation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WatershedOptions {
    /// Let unreached maxima open new basins
    pub allow_new_basins: bool,
    /// Neighborhood used for adjacency
    pub connectivity: Connectivity,
    /// Seed detection, used without explicit seeds and new basins
    pub seeds: SeedOptions,
}

impl Default for WatershedOptions {
    fn default() -> Self {
        Self {
            allow_new_basins: true,
            connectivity: Connectivity::TwentySix,
            seeds: SeedOptions::default(),
        }
    }
}

impl WatershedOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether new basins may be created
    pub fn with_allow_new_basins(mut self, allow: bool) -> Self {
        self.allow_new_basins = allow;
        self
    }

    /// Set connectivity
    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Set seed detection options
    pub fn with_seed_options(mut self, seeds: SeedOptions) -> Self {
        self.seeds = seeds;
        self
    }

    /// Check option values
    pub fn validate(&self) -> RegionResult<()> {
        self.seeds.validate()
    }
}

/// Perform watershed segmentation of a distance map
///
/// Returns a label grid where 0 is background, positive values are basin
/// ids and [`WATERSHED_LINE_LABEL`](crate::WATERSHED_LINE_LABEL) marks
/// watershed lines.
///
/// # Errors
///
/// Returns an error for invalid options, a seed grid whose dimensions
/// differ from the distance map, or cancellation.
pub fn watershed_segmentation(
    distance: &DistanceMap,
    seeds: Option<&LabelGrid>,
    options: &WatershedOptions,
    cancel: &CancelToken,
) -> RegionResult<WatershedResult> {
    options.validate()?;

    let detected;
    let seeds = match seeds {
        Some(s) => Some(s),
        None if options.allow_new_basins => None,
        None => {
            let found = select_seeds(distance, &options.seeds, cancel)?;
            let (w, h, d) = distance.dimensions();
            detected = seeds_to_grid(&found, w, h, d)?;
            Some(&detected)
        }
    };

    let graph = WatershedGraph::build(distance, seeds, options.connectivity, cancel)?;
    let result = WatershedFlooder::new(&graph, options.allow_new_basins).run(cancel)?;
    debug!(
        basins = result.basin_count(),
        watershed_voxels = result.watershed_voxel_count(),
        supervised = graph.is_seeded() && !options.allow_new_basins,
        "watershed segmentation"
    );
    Ok(result)
}

fn frame_seeds<'a>(
    seeds: Option<&'a VoxelSequence<u32>>,
    t: usize,
) -> RegionResult<Option<&'a LabelGrid>> {
    Ok(seeds.map(|s| s.frame(t)).transpose()?)
}

/// Watershed segmentation of every frame of a sequence
///
/// Frames are independent. With the `parallel` feature they are processed
/// on the rayon thread pool. The first error aborts the whole sequence.
///
/// # Errors
///
/// Returns `RegionError::InvalidParameters` if a seed sequence is given
/// with a different frame count, plus any per-frame error.
pub fn watershed_sequence(
    distance: &VoxelSequence<f64>,
    seeds: Option<&VoxelSequence<u32>>,
    options: &WatershedOptions,
    cancel: &CancelToken,
) -> RegionResult<Vec<WatershedResult>> {
    if let Some(s) = seeds
        && s.len() != distance.len()
    {
        return Err(RegionError::InvalidParameters(format!(
            "seed sequence has {} frames, distance sequence has {}",
            s.len(),
            distance.len()
        )));
    }

    let run = |t: usize| -> RegionResult<WatershedResult> {
        let frame = distance.frame(t)?;
        watershed_segmentation(frame, frame_seeds(seeds, t)?, options, cancel)
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        (0..distance.len()).into_par_iter().map(run).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        (0..distance.len()).map(run).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morphovox_core::VoxelGrid;

    #[test]
    fn test_options_builder() {
        let options = WatershedOptions::new()
            .with_allow_new_basins(false)
            .with_connectivity(Connectivity::Six)
            .with_seed_options(SeedOptions::new().with_sigma(0.5));
        assert!(!options.allow_new_basins);
        assert_eq!(options.connectivity, Connectivity::Six);
        assert_eq!(options.seeds.sigma, 0.5);
        assert!(options.validate().is_ok());
        let bad = options.with_seed_options(SeedOptions::new().with_local_max_radius(-1.0));
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_sequence_frame_count_mismatch() {
        let frame = DistanceMap::new_with_value(3, 3, 1, 1.0).unwrap();
        let distance = VoxelSequence::new(vec![frame.clone(), frame]).unwrap();
        let seeds = VoxelSequence::single(VoxelGrid::new(3, 3, 1).unwrap());
        let out = watershed_sequence(
            &distance,
            Some(&seeds),
            &WatershedOptions::default(),
            &CancelToken::new(),
        );
        assert!(matches!(out, Err(RegionError::InvalidParameters(_))));
    }
}
