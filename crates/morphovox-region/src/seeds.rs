//! Seed detection
//!
//! Seeds start a supervised flood. They are found as local maxima of a
//! smoothed copy of the distance map, so that each roughly convex object
//! gets one seed near its centre. Every accepted maximum yields exactly one
//! seed with a fresh label, numbered from 1 in decreasing order of the
//! smoothed value.

use crate::error::{RegionError, RegionResult};
use morphovox_core::{CancelToken, DistanceMap, LabelGrid, Offset, Point3, VoxelGrid};
use morphovox_filter::gaussian_smooth;
use tracing::debug;

/// Options for seed detection
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeedOptions {
    /// Gaussian sigma in x-voxel units (0 disables smoothing)
    pub sigma: f64,
    /// Radius of the maxima window and of suppression, in voxels
    pub local_max_radius: f64,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            local_max_radius: 2.0,
        }
    }
}

impl SeedOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the smoothing sigma
    pub fn with_sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    /// Set the local maximum radius
    pub fn with_local_max_radius(mut self, radius: f64) -> Self {
        self.local_max_radius = radius;
        self
    }

    /// Check that both parameters are finite and non-negative
    pub fn validate(&self) -> RegionResult<()> {
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(RegionError::InvalidParameters(format!(
                "seed sigma must be finite and >= 0, got {}",
                self.sigma
            )));
        }
        check_radius(self.local_max_radius)
    }
}

fn check_radius(radius: f64) -> RegionResult<()> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(RegionError::InvalidParameters(format!(
            "local maximum radius must be finite and >= 0, got {radius}"
        )));
    }
    Ok(())
}

/// A labeled seed voxel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Seed {
    /// Seed position
    pub position: Point3,
    /// Basin label, never 0
    pub label: u32,
}

impl Seed {
    /// Create a seed
    pub fn new(position: Point3, label: u32) -> Self {
        Self { position, label }
    }
}

/// Offsets within a ball of `radius` voxels, origin excluded.
fn window(radius: f64, planar: bool) -> Vec<Offset> {
    let r = radius.floor() as i32;
    let r2 = radius * radius;
    let rz = if planar { 0 } else { r };
    let mut out = Vec::new();
    for dz in -rz..=rz {
        for dy in -r..=r {
            for dx in -r..=r {
                let d2 = (dx * dx + dy * dy + dz * dz) as f64;
                if d2 > 0.0 && d2 <= r2 {
                    out.push((dx, dy, dz));
                }
            }
        }
    }
    out
}

/// Local maxima of a grid
///
/// A candidate is a positive voxel with no strictly greater voxel within
/// `radius` voxels. Candidates are then taken in decreasing value (scan
/// order on ties) and a candidate within `radius` of an already accepted
/// one is dropped, so a plateau keeps one maximum per radius.
///
/// The cancel token is checked once per z-slice.
pub fn find_local_maxima(
    grid: &DistanceMap,
    radius: f64,
    cancel: &CancelToken,
) -> RegionResult<Vec<Point3>> {
    check_radius(radius)?;
    let offsets = window(radius, grid.is_2d());
    let data = grid.data();
    let plane = (grid.width() * grid.height()) as usize;

    let mut candidates = Vec::new();
    for (i, &v) in data.iter().enumerate() {
        if i % plane == 0 {
            cancel.check()?;
        }
        if v.is_nan() || v <= 0.0 {
            continue;
        }
        if grid.neighbors(i, &offsets).all(|(n, _)| data[n] <= v) {
            candidates.push(i);
        }
    }
    candidates.sort_by(|&a, &b| data[b].total_cmp(&data[a]));

    let r2 = radius * radius;
    let mut accepted: Vec<Point3> = Vec::new();
    for i in candidates {
        let p = grid.position_of(i);
        let suppressed = accepted.iter().any(|q| {
            let (dx, dy, dz) = p.offset_to(q);
            ((dx * dx + dy * dy + dz * dz) as f64) <= r2
        });
        if !suppressed {
            accepted.push(p);
        }
    }
    Ok(accepted)
}

/// Seeds of a distance map
///
/// Smooths a copy of `distance`, restricts it to the original foreground
/// and labels each local maximum `1..=n`.
pub fn select_seeds(
    distance: &DistanceMap,
    options: &SeedOptions,
    cancel: &CancelToken,
) -> RegionResult<Vec<Seed>> {
    options.validate()?;
    let mut smooth = gaussian_smooth(distance, options.sigma, cancel)?;
    for (s, &d) in smooth.data_mut().iter_mut().zip(distance.data()) {
        if d.is_nan() || d <= 0.0 {
            *s = 0.0;
        }
    }

    let maxima = find_local_maxima(&smooth, options.local_max_radius, cancel)?;
    debug!(
        seeds = maxima.len(),
        sigma = options.sigma,
        radius = options.local_max_radius,
        "selected seeds"
    );
    Ok(maxima
        .into_iter()
        .zip(1u32..)
        .map(|(p, label)| Seed::new(p, label))
        .collect())
}

/// Paint seeds into a zeroed label grid
///
/// # Errors
///
/// Returns `RegionError::InvalidSeed` for a seed outside the grid and
/// `RegionError::InvalidParameters` for a seed with label 0.
pub fn seeds_to_grid(
    seeds: &[Seed],
    width: u32,
    height: u32,
    depth: u32,
) -> RegionResult<LabelGrid> {
    let mut grid: LabelGrid = VoxelGrid::new(width, height, depth)?;
    for seed in seeds {
        let p = seed.position;
        if !grid.contains(p) {
            return Err(RegionError::InvalidSeed {
                x: p.x,
                y: p.y,
                z: p.z,
            });
        }
        if seed.label == 0 {
            return Err(RegionError::InvalidParameters(format!(
                "seed at {p} has label 0"
            )));
        }
        grid.set_at(p, seed.label)?;
    }
    Ok(grid)
}

/// Seeds of a label grid, in scan order
pub fn seeds_from_grid(grid: &LabelGrid) -> Vec<Seed> {
    grid.data()
        .iter()
        .enumerate()
        .filter(|&(_, &l)| l > 0)
        .map(|(i, &l)| Seed::new(grid.position_of(i), l))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_sizes() {
        assert_eq!(window(1.0, true).len(), 4);
        assert_eq!(window(1.5, true).len(), 8);
        assert_eq!(window(1.0, false).len(), 6);
        assert!(window(0.0, false).is_empty());
    }

    #[test]
    fn test_plateau_suppression() {
        // 1 x 9 plateau: maxima every radius + 1 voxels
        let grid = VoxelGrid::from_data(9, 1, 1, vec![1.0; 9]).unwrap();
        let maxima = find_local_maxima(&grid, 2.0, &CancelToken::new()).unwrap();
        let xs: Vec<u32> = maxima.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0, 3, 6]);
    }

    #[test]
    fn test_maxima_ordered_by_value() {
        let values = vec![0.0, 1.0, 0.5, 0.2, 0.5, 3.0, 0.0];
        let grid = VoxelGrid::from_data(7, 1, 1, values).unwrap();
        let maxima = find_local_maxima(&grid, 1.0, &CancelToken::new()).unwrap();
        assert_eq!(maxima, vec![Point3::new(5, 0, 0), Point3::new(1, 0, 0)]);
    }

    #[test]
    fn test_seeds_to_grid_errors() {
        let out = seeds_to_grid(&[Seed::new(Point3::new(4, 0, 0), 1)], 4, 4, 1);
        assert!(matches!(out, Err(RegionError::InvalidSeed { x: 4, .. })));
        let zero = seeds_to_grid(&[Seed::new(Point3::new(1, 1, 0), 0)], 4, 4, 1);
        assert!(matches!(zero, Err(RegionError::InvalidParameters(_))));
    }

    #[test]
    fn test_seed_grid_round_trip() {
        let seeds = vec![
            Seed::new(Point3::new(3, 0, 1), 2),
            Seed::new(Point3::new(0, 2, 1), 7),
        ];
        let grid = seeds_to_grid(&seeds, 4, 3, 2).unwrap();
        let back = seeds_from_grid(&grid);
        // Scan order: (0, 2, 1) comes after (3, 0, 1)
        assert_eq!(back, seeds);
    }
}
