//! morphovox-region - Watershed segmentation of voxel distance maps
//!
//! This crate provides:
//!
//! - **Seed detection** - local maxima of a smoothed distance map
//! - **Watershed graph** - foreground voxels as nodes, sorted into height
//!   levels
//! - **Flooding** - level-by-level immersion producing basins, watershed
//!   lines and basin contacts
//! - **Pipelines** - single-volume and per-frame sequence segmentation
//!
//! # Examples
//!
//! ```
//! use morphovox_core::{CancelToken, DistanceMap};
//! use morphovox_region::{WatershedOptions, watershed_segmentation};
//!
//! let mut distance = DistanceMap::new(7, 1, 1).unwrap();
//! for (x, v) in [1.0, 3.0, 2.0, 1.5, 2.0, 3.0, 1.0].into_iter().enumerate() {
//!     distance.set(x as u32, 0, 0, v).unwrap();
//! }
//! let result = watershed_segmentation(
//!     &distance,
//!     None,
//!     &WatershedOptions::default(),
//!     &CancelToken::new(),
//! )
//! .unwrap();
//! assert_eq!(result.basin_count(), 2);
//! assert_eq!(result.watershed_voxel_count(), 1);
//! ```
//!
//! # Features
//!
//! - `parallel`: process sequence frames on the rayon thread pool
//! - `serde`: `Serialize`/`Deserialize` for options, seeds and contacts

pub mod error;
pub mod flood;
pub mod graph;
pub mod seeds;
pub mod watershed;

pub use error::{RegionError, RegionResult};
pub use flood::{
    BasinContact, NodeLabel, QueueItem, WATERSHED_LINE_LABEL, WatershedFlooder, WatershedResult,
};
pub use graph::{Level, WatershedGraph, WatershedNode};
pub use seeds::{Seed, SeedOptions, find_local_maxima, seeds_from_grid, seeds_to_grid, select_seeds};
pub use watershed::{WatershedOptions, watershed_segmentation, watershed_sequence};
