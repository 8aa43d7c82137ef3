//! morphovox-morph - Distance transforms for voxel masks
//!
//! This crate turns a binary foreground mask into the distance map consumed
//! by the watershed and skeleton crates:
//!
//! - Exact Euclidean distance transform with anisotropic voxel spacing
//! - Per-frame processing of mask sequences

pub mod distance;
mod error;

pub use distance::{DistanceOptions, distance_transform, distance_transform_sequence};
pub use error::{MorphError, MorphResult};
