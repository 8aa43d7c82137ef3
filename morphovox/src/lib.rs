//! morphovox - Watershed segmentation and skeletons of voxel volumes
//!
//! # Overview
//!
//! morphovox works on distance maps: dense 3D grids (depth 1 for 2D
//! images) whose foreground voxels hold the physical distance to the
//! nearest background voxel. It provides:
//!
//! - Exact Euclidean distance transforms of binary masks
//! - Gaussian smoothing and local-maxima seed detection
//! - Immersion watershed with basin labels, watershed lines and basin
//!   contacts, supervised by seeds or unsupervised
//! - Minimum spanning tree skeletons with leaf and branch detection
//!
//! Every long-running operation takes a [`CancelToken`] and returns a
//! cancelled error instead of a partial result when it fires.
//!
//! # Example
//!
//! ```
//! use morphovox::morph::{DistanceOptions, distance_transform};
//! use morphovox::region::{WatershedOptions, watershed_segmentation};
//! use morphovox::skeleton::{SkeletonOptions, skeletonize};
//! use morphovox::{CancelToken, MaskGrid, VoxelGrid};
//!
//! let cancel = CancelToken::new();
//! let mut mask: MaskGrid = VoxelGrid::new(16, 9, 1).unwrap();
//! for y in 1..8 {
//!     for x in 1..15 {
//!         mask.set(x, y, 0, true).unwrap();
//!     }
//! }
//! let distance = distance_transform(&mask, &DistanceOptions::default(), &cancel).unwrap();
//!
//! let regions = watershed_segmentation(&distance, None, &WatershedOptions::default(), &cancel)
//!     .unwrap();
//! assert!(regions.basin_count() >= 1);
//!
//! let skeleton = skeletonize(&distance, &SkeletonOptions::default(), &cancel).unwrap();
//! assert!(skeleton.seed().is_some());
//! ```

// Re-export core types (primary data structures used everywhere)
pub use morphovox_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use morphovox_filter as filter;
pub use morphovox_morph as morph;
pub use morphovox_region as region;
pub use morphovox_skeleton as skeleton;
