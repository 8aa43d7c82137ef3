//! morphovox-skeleton - Spanning tree skeletons of voxel distance maps
//!
//! This crate provides:
//!
//! - **Spanning tree** - Dijkstra shortest paths from the deepest voxel,
//!   with steps weighted by the inverse squared distance
//! - **Classification** - leaves, branches and skeleton voxels traced along
//!   the tree, plus the claim grid that assigns voxels to leaves
//! - **Pipelines** - single-volume and per-frame sequence skeletonization
//!
//! # Examples
//!
//! ```
//! use morphovox_core::{CancelToken, DistanceMap, Point3};
//! use morphovox_skeleton::{SkeletonOptions, skeletonize};
//!
//! let mut distance = DistanceMap::new(9, 1, 1).unwrap();
//! for x in 0..9u32 {
//!     distance.set(x, 0, 0, 5.0 - (x as f64 - 4.0).abs()).unwrap();
//! }
//! let skeleton = skeletonize(&distance, &SkeletonOptions::default(), &CancelToken::new())
//!     .unwrap();
//! assert_eq!(skeleton.tree.reached_count(), 9);
//! // One path from the left end to the peak; the peak's sphere claims the rest
//! assert_eq!(skeleton.leaf_points(), vec![Point3::new(0, 0, 0)]);
//! assert_eq!(skeleton.classification.skeleton_voxel_count(), 5);
//! ```
//!
//! # Features
//!
//! - `parallel`: process sequence frames on the rayon thread pool
//! - `serde`: `Serialize`/`Deserialize` for options

pub mod classify;
mod error;
pub mod skeleton;
pub mod tree;

pub use classify::{ClassifyOptions, SkeletonClassification, classify};
pub use error::{SkeletonError, SkeletonResult};
pub use skeleton::{Skeleton, SkeletonOptions, skeletonize, skeletonize_sequence};
pub use tree::{SpanningTree, TreeOptions, build_spanning_tree};
