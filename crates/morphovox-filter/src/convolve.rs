//! Separable convolution of voxel grids
//!
//! Each pass filters along one axis with a 1-D [`Kernel`]. Samples outside
//! the grid take the value of the nearest border voxel (replicate border).
//! Output grids keep the dimensions and voxel size of the input.

use crate::{FilterError, FilterResult, Kernel};
use morphovox_core::{CancelToken, DistanceMap};
use tracing::debug;

/// Grid axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Convolve along a single axis.
///
/// The cancel token is checked once per z-slice.
pub fn convolve_axis(
    grid: &DistanceMap,
    kernel: &Kernel,
    axis: Axis,
    cancel: &CancelToken,
) -> FilterResult<DistanceMap> {
    let (w, h, d) = grid.dimensions();
    let (w, h, d) = (w as usize, h as usize, d as usize);
    let (extent, stride) = match axis {
        Axis::X => (w, 1),
        Axis::Y => (h, w),
        Axis::Z => (d, w * h),
    };

    let mut out = grid.clone();
    if kernel.radius() == 0 {
        let k = kernel.get(0).unwrap_or(1.0);
        out.data_mut().iter_mut().for_each(|v| *v *= k);
        return Ok(out);
    }

    let src = grid.data();
    let weights = kernel.data();
    let r = kernel.radius() as i64;
    let last = extent as i64 - 1;
    let dst = out.data_mut();

    for z in 0..d {
        cancel.check()?;
        for y in 0..h {
            for x in 0..w {
                let i = (z * h + y) * w + x;
                let pos = match axis {
                    Axis::X => x,
                    Axis::Y => y,
                    Axis::Z => z,
                };
                // Index of the line start along the axis
                let base = i - pos * stride;
                let mut sum = 0.0;
                for (k, &wk) in weights.iter().enumerate() {
                    let s = (pos as i64 + k as i64 - r).clamp(0, last) as usize;
                    sum += src[base + s * stride] * wk;
                }
                dst[i] = sum;
            }
        }
    }

    Ok(out)
}

/// Convolve with one kernel per axis, x first.
///
/// `kernel_z` is skipped for a 2D grid or when `None`.
pub fn convolve_sep(
    grid: &DistanceMap,
    kernel_x: &Kernel,
    kernel_y: &Kernel,
    kernel_z: Option<&Kernel>,
    cancel: &CancelToken,
) -> FilterResult<DistanceMap> {
    let tmp = convolve_axis(grid, kernel_x, Axis::X, cancel)?;
    let mut out = convolve_axis(&tmp, kernel_y, Axis::Y, cancel)?;
    if let Some(kz) = kernel_z.filter(|_| !grid.is_2d()) {
        out = convolve_axis(&out, kz, Axis::Z, cancel)?;
    }
    Ok(out)
}

/// Gaussian smoothing with physically isotropic blur.
///
/// `sigma` is given in x-voxel units. The y and z widths are scaled by the
/// spacing ratio, so that the blur has the same physical extent along
/// every axis. `sigma == 0` returns a copy.
///
/// # Errors
///
/// Returns `FilterError::InvalidParameters` for a negative or non-finite
/// sigma, and a cancelled core error when `cancel` fires.
pub fn gaussian_smooth(
    grid: &DistanceMap,
    sigma: f64,
    cancel: &CancelToken,
) -> FilterResult<DistanceMap> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(FilterError::InvalidParameters(format!(
            "sigma must be finite and >= 0, got {sigma}"
        )));
    }
    if sigma == 0.0 {
        return Ok(grid.clone());
    }

    let size = grid.voxel_size();
    let physical = sigma * size.x;
    let kx = Kernel::gaussian_auto(sigma)?;
    let ky = Kernel::gaussian_auto(physical / size.y)?;
    let kz = if grid.is_2d() {
        None
    } else {
        Some(Kernel::gaussian_auto(physical / size.z)?)
    };
    debug!(
        sigma,
        radius_x = kx.radius(),
        radius_y = ky.radius(),
        radius_z = kz.as_ref().map_or(0, Kernel::radius),
        "gaussian smoothing"
    );

    convolve_sep(grid, &kx, &ky, kz.as_ref(), cancel)
}
