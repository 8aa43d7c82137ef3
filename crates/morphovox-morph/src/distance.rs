//! Euclidean distance transform
//!
//! Computes, for every foreground voxel of a mask, the physical distance to
//! the nearest background voxel. Background voxels get 0, so the output is
//! directly usable as a watershed or skeleton height map.
//!
//! The transform is exact. It runs the Felzenszwalb–Huttenlocher lower
//! envelope of parabolas once per axis (x, then y, then z) on squared
//! distances, with the parabola positions scaled by the voxel spacing of
//! that axis.
//!
//! # Examples
//!
//! ```
//! use morphovox_core::{CancelToken, MaskGrid, VoxelGrid};
//! use morphovox_morph::{DistanceOptions, distance_transform};
//!
//! let mut mask: MaskGrid = VoxelGrid::new_with_value(5, 5, 1, true).unwrap();
//! mask.set(2, 2, 0, false).unwrap();
//! let dist = distance_transform(&mask, &DistanceOptions::default(), &CancelToken::new()).unwrap();
//! assert_eq!(dist.get(2, 2, 0).unwrap(), 0.0);
//! assert!((dist.get(0, 0, 0).unwrap() - 8f64.sqrt()).abs() < 1e-12);
//! ```

use crate::{MorphError, MorphResult};
use morphovox_core::{CancelToken, DistanceMap, MaskGrid, VoxelSequence};
use tracing::debug;

/// Options for [`distance_transform`]
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistanceOptions {
    /// Treat the voxels just outside the grid as background.
    ///
    /// When false, distances only measure to background voxels inside the
    /// grid and a mask without background is rejected.
    pub border_is_background: bool,
}

impl DistanceOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the outside of the grid counts as background
    pub fn with_border_is_background(mut self, value: bool) -> Self {
        self.border_is_background = value;
        self
    }
}

/// Scratch buffers for one 1-D pass
struct Envelope {
    /// Input squared distances, padded by one sample on each side
    f: Vec<f64>,
    /// Output squared distances
    d: Vec<f64>,
    /// Parabola vertices
    v: Vec<usize>,
    /// Envelope boundaries
    z: Vec<f64>,
}

impl Envelope {
    fn new(len: usize) -> Self {
        let n = len + 2;
        Self {
            f: vec![0.0; n],
            d: vec![0.0; n],
            v: vec![0; n],
            z: vec![0.0; n + 1],
        }
    }

    /// Squared-distance transform of `f[lo..hi]` with sample spacing `step`.
    fn transform(&mut self, lo: usize, hi: usize, step: f64) {
        let f = &self.f;
        let pos = |q: usize| q as f64 * step;

        let Some(first) = (lo..hi).find(|&q| f[q].is_finite()) else {
            self.d[lo..hi].fill(f64::INFINITY);
            return;
        };

        let mut k = 0usize;
        self.v[0] = first;
        self.z[0] = f64::NEG_INFINITY;
        self.z[1] = f64::INFINITY;

        for q in first + 1..hi {
            if !f[q].is_finite() {
                continue;
            }
            let fq = f[q] + pos(q) * pos(q);
            let parabola_cut =
                |r: usize| (fq - (f[r] + pos(r) * pos(r))) / (2.0 * (pos(q) - pos(r)));
            // z[0] is -inf, so k never underflows
            let mut s = parabola_cut(self.v[k]);
            while s <= self.z[k] {
                k -= 1;
                s = parabola_cut(self.v[k]);
            }
            k += 1;
            self.v[k] = q;
            self.z[k] = s;
            self.z[k + 1] = f64::INFINITY;
        }

        k = 0;
        for p in lo..hi {
            while self.z[k + 1] < pos(p) {
                k += 1;
            }
            let r = self.v[k];
            let dp = pos(p) - pos(r);
            self.d[p] = dp * dp + f[r];
        }
    }
}

/// Run one axis pass over `data` in place.
fn pass(
    data: &mut [f64],
    dims: (usize, usize, usize),
    axis: usize,
    step: f64,
    border: bool,
    cancel: &CancelToken,
) -> MorphResult<()> {
    let (w, h, d) = dims;
    let (extent, stride, outer, inner) = match axis {
        0 => (w, 1, d, h),
        1 => (h, w, d, w),
        _ => (d, w * h, h, w),
    };
    let mut env = Envelope::new(extent);
    let (lo, hi) = if border { (0, extent + 2) } else { (1, extent + 1) };

    for a in 0..outer {
        cancel.check()?;
        for b in 0..inner {
            let base = match axis {
                0 => (a * h + b) * w,
                1 => a * w * h + b,
                _ => a * w + b,
            };
            env.f[0] = 0.0;
            env.f[extent + 1] = 0.0;
            for i in 0..extent {
                env.f[i + 1] = data[base + i * stride];
            }
            env.transform(lo, hi, step);
            for i in 0..extent {
                data[base + i * stride] = env.d[i + 1];
            }
        }
    }
    Ok(())
}

/// Exact Euclidean distance from each foreground voxel to the background
///
/// Distances are physical, using the mask's voxel size. Background voxels
/// are 0, foreground voxels are at least the smallest voxel spacing.
///
/// # Errors
///
/// Returns `MorphError::InvalidParameters` if the mask has no background
/// voxel and `border_is_background` is false, and a cancelled core error
/// when `cancel` fires.
pub fn distance_transform(
    mask: &MaskGrid,
    options: &DistanceOptions,
    cancel: &CancelToken,
) -> MorphResult<DistanceMap> {
    let background = mask.data().iter().filter(|&&v| !v).count();
    if background == 0 && !options.border_is_background {
        return Err(MorphError::InvalidParameters(
            "mask has no background voxels".into(),
        ));
    }

    let mut out = mask.map(|&fg| if fg { f64::INFINITY } else { 0.0 });
    let (w, h, d) = out.dimensions();
    let dims = (w as usize, h as usize, d as usize);
    let size = mask.voxel_size();
    let border = options.border_is_background;

    pass(out.data_mut(), dims, 0, size.x, border, cancel)?;
    pass(out.data_mut(), dims, 1, size.y, border, cancel)?;
    if d > 1 {
        pass(out.data_mut(), dims, 2, size.z, border, cancel)?;
    }

    out.data_mut().iter_mut().for_each(|v| *v = v.sqrt());
    debug!(
        width = w,
        height = h,
        depth = d,
        foreground = mask.len() - background,
        "distance transform"
    );
    Ok(out)
}

/// Distance transform of every frame of a mask sequence
pub fn distance_transform_sequence(
    masks: &VoxelSequence<bool>,
    options: &DistanceOptions,
    cancel: &CancelToken,
) -> MorphResult<VoxelSequence<f64>> {
    let frames = masks
        .iter()
        .map(|mask| distance_transform(mask, options, cancel))
        .collect::<MorphResult<Vec<_>>>()?;
    Ok(VoxelSequence::new(frames)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use morphovox_core::{VoxelGrid, VoxelSize};

    fn brute_force(mask: &MaskGrid) -> Vec<f64> {
        let size = mask.voxel_size();
        let bg: Vec<_> = mask
            .positions()
            .filter(|&p| !mask.get_at(p).unwrap())
            .collect();
        mask.positions()
            .map(|p| {
                bg.iter()
                    .map(|q| {
                        let (dx, dy, dz) = p.offset_to(q);
                        size.offset_length(dx, dy, dz)
                    })
                    .fold(f64::INFINITY, f64::min)
            })
            .collect()
    }

    #[test]
    fn test_matches_brute_force() {
        let mut mask: MaskGrid = VoxelGrid::new_with_value(7, 6, 5, true).unwrap();
        for &(x, y, z) in &[(0, 0, 0), (6, 5, 4), (3, 2, 2), (1, 4, 3)] {
            mask.set(x, y, z, false).unwrap();
        }
        mask.set_voxel_size(VoxelSize::new(1.0, 0.7, 2.5).unwrap())
            .unwrap();
        let dist = distance_transform(&mask, &DistanceOptions::default(), &CancelToken::new())
            .unwrap();
        for (a, b) in dist.data().iter().zip(brute_force(&mask)) {
            assert!((a - b).abs() < 1e-9, "{a} vs {b}");
        }
    }

    #[test]
    fn test_no_background() {
        let mask: MaskGrid = VoxelGrid::new_with_value(5, 5, 1, true).unwrap();
        assert!(
            distance_transform(&mask, &DistanceOptions::default(), &CancelToken::new()).is_err()
        );
        let options = DistanceOptions::new().with_border_is_background(true);
        let dist = distance_transform(&mask, &options, &CancelToken::new()).unwrap();
        assert_eq!(dist.get(2, 2, 0).unwrap(), 3.0);
        assert_eq!(dist.get(0, 0, 0).unwrap(), 1.0);
        assert_eq!(dist.get(4, 1, 0).unwrap(), 1.0);
    }

    #[test]
    fn test_all_background() {
        let mask: MaskGrid = VoxelGrid::new(4, 4, 2).unwrap();
        let dist = distance_transform(&mask, &DistanceOptions::default(), &CancelToken::new())
            .unwrap();
        assert!(dist.data().iter().all(|&v| v == 0.0));
    }
}
