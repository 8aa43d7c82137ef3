//! morphovox-core - Basic data structures for volumetric morphology
//!
//! This crate provides the fundamental data structures used throughout
//! morphovox:
//!
//! - [`VoxelGrid`] - Dense 3D voxel array with physical spacing
//!   ([`DistanceMap`], [`LabelGrid`], [`MaskGrid`] aliases)
//! - [`VoxelSize`] - Anisotropic voxel spacing
//! - [`Point3`] - Integer voxel position
//! - [`Connectivity`] - 6/18/26 neighborhoods (4/8 in 2D)
//! - [`VoxelSequence`] - Time series of grids
//! - [`CancelToken`] - Cooperative cancellation
//!
//! # Features
//!
//! - `serde`: `Serialize`/`Deserialize` for [`Point3`], [`VoxelSize`] and
//!   [`Connectivity`]

pub mod cancel;
pub mod error;
pub mod grid;
pub mod neighborhood;
pub mod point;
pub mod sequence;
pub mod size;

pub use cancel::CancelToken;
pub use error::{Error, Result};
pub use grid::{DistanceMap, LabelGrid, MaskGrid, VoxelGrid};
pub use neighborhood::{Connectivity, Offset};
pub use point::Point3;
pub use sequence::VoxelSequence;
pub use size::VoxelSize;
