//! morphovox-filter - Smoothing filters for voxel grids
//!
//! This crate provides:
//!
//! - 1-D convolution [`Kernel`]s (Gaussian, custom weights)
//! - Separable convolution along x, y and z with replicate border
//! - [`gaussian_smooth`], a Gaussian blur that is isotropic in physical
//!   units on anisotropic grids

pub mod convolve;
mod error;
pub mod kernel;

pub use error::{FilterError, FilterResult};
pub use kernel::Kernel;

pub use convolve::{Axis, convolve_axis, convolve_sep, gaussian_smooth};
