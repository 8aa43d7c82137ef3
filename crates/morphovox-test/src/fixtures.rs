//! Synthetic distance fields
//!
//! Each field is `max(0, max_i (r_i - dist(p, shape_i)))` over a set of
//! shapes, which is the distance map of a union of balls or capsules up to
//! the clamp at zero. The formulas are fixed so that test expectations
//! (leaf positions, line voxels, basin sizes) stay reproducible.

use morphovox_core::{DistanceMap, MaskGrid, Point3, Result, VoxelGrid};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Cone (ball in 3D) centred at `(x, y, z)` with radius `r`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cone {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub r: f64,
}

impl Cone {
    pub const fn new(x: f64, y: f64, z: f64, r: f64) -> Self {
        Self { x, y, z, r }
    }

    /// Cone in the z = 0 plane
    pub const fn new_2d(x: f64, y: f64, r: f64) -> Self {
        Self { x, y, z: 0.0, r }
    }

    fn value(&self, x: f64, y: f64, z: f64) -> f64 {
        let (dx, dy, dz) = (x - self.x, y - self.y, z - self.z);
        self.r - (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Capsule around the planar segment `(ax, ay)`-`(bx, by)` with radius `r`.
///
/// A zero-length segment is a cone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ridge {
    pub ax: f64,
    pub ay: f64,
    pub bx: f64,
    pub by: f64,
    pub r: f64,
}

impl Ridge {
    pub const fn new(ax: f64, ay: f64, bx: f64, by: f64, r: f64) -> Self {
        Self { ax, ay, bx, by, r }
    }

    fn value(&self, x: f64, y: f64) -> f64 {
        let (vx, vy) = (self.bx - self.ax, self.by - self.ay);
        let len2 = vx * vx + vy * vy;
        let t = if len2 == 0.0 {
            0.0
        } else {
            (((x - self.ax) * vx + (y - self.ay) * vy) / len2).clamp(0.0, 1.0)
        };
        let (px, py) = (self.ax + t * vx, self.ay + t * vy);
        let (dx, dy) = (x - px, y - py);
        self.r - (dx * dx + dy * dy).sqrt()
    }
}

fn build_field<F>(width: u32, height: u32, depth: u32, f: F) -> Result<DistanceMap>
where
    F: Fn(f64, f64, f64) -> f64,
{
    let mut grid = DistanceMap::new(width, height, depth)?;
    for z in 0..depth {
        for y in 0..height {
            for x in 0..width {
                let v = f(x as f64, y as f64, z as f64).max(0.0);
                grid.set(x, y, z, v)?;
            }
        }
    }
    Ok(grid)
}

/// Union of cones
pub fn cone_field(width: u32, height: u32, depth: u32, cones: &[Cone]) -> Result<DistanceMap> {
    build_field(width, height, depth, |x, y, z| {
        cones.iter().fold(0.0, |acc, c| f64::max(acc, c.value(x, y, z)))
    })
}

/// Union of planar capsules (depth 1)
pub fn ridge_field(width: u32, height: u32, ridges: &[Ridge]) -> Result<DistanceMap> {
    build_field(width, height, 1, |x, y, _| {
        ridges.iter().fold(0.0, |acc, r| f64::max(acc, r.value(x, y)))
    })
}

/// Flat field of `value` with a background ring of width 1.
pub fn plateau_field(width: u32, height: u32, depth: u32, value: f64) -> Result<DistanceMap> {
    let planar = depth == 1;
    build_field(width, height, depth, |x, y, z| {
        let on_border = x == 0.0
            || y == 0.0
            || x == (width - 1) as f64
            || y == (height - 1) as f64
            || (!planar && (z == 0.0 || z == (depth - 1) as f64));
        if on_border { 0.0 } else { value }
    })
}

/// Mask holding `count` random balls, with one voxel of background border.
///
/// Uses a seeded `StdRng`, so a given `seed` always yields the same mask.
pub fn random_blobs(
    width: u32,
    height: u32,
    depth: u32,
    count: usize,
    max_radius: f64,
    seed: u64,
) -> Result<MaskGrid> {
    let mut rng = StdRng::seed_from_u64(seed);
    let planar = depth == 1;
    let blobs: Vec<Cone> = (0..count)
        .map(|_| {
            let x = rng.random_range(0.0..width as f64);
            let y = rng.random_range(0.0..height as f64);
            let z = if planar {
                0.0
            } else {
                rng.random_range(0.0..depth as f64)
            };
            let r = rng.random_range(1.0..max_radius.max(1.5));
            Cone::new(x, y, z, r)
        })
        .collect();

    let mut mask: MaskGrid = VoxelGrid::new(width, height, depth)?;
    for z in 0..depth {
        for y in 0..height {
            for x in 0..width {
                let border = x == 0
                    || y == 0
                    || x + 1 == width
                    || y + 1 == height
                    || (!planar && (z == 0 || z + 1 == depth));
                let inside = blobs
                    .iter()
                    .any(|b| b.value(x as f64, y as f64, z as f64) > 0.0);
                mask.set(x, y, z, inside && !border)?;
            }
        }
    }
    Ok(mask)
}

/// Positions of all `true` voxels in scan order.
pub fn mask_points(mask: &MaskGrid) -> Vec<Point3> {
    mask.data()
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v)
        .map(|(i, _)| mask.position_of(i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cone_apex() {
        let field = cone_field(21, 21, 1, &[Cone::new_2d(10.0, 10.0, 10.5)]).unwrap();
        assert_eq!(field.get(10, 10, 0).unwrap(), 10.5);
        assert_eq!(field.get(0, 0, 0).unwrap(), 0.0);
        assert_eq!(field.max_with_position().1, Point3::new_2d(10, 10));
    }

    #[test]
    fn test_ridge_constant_along_segment() {
        let field = ridge_field(20, 9, &[Ridge::new(4.0, 4.0, 15.0, 4.0, 3.0)]).unwrap();
        assert_eq!(field.get(6, 4, 0).unwrap(), 3.0);
        assert_eq!(field.get(13, 4, 0).unwrap(), 3.0);
        assert_eq!(field.get(13, 5, 0).unwrap(), 2.0);
    }

    #[test]
    fn test_plateau_border() {
        let field = plateau_field(12, 8, 1, 2.0).unwrap();
        assert_eq!(field.foreground_count(), 10 * 6);
        assert_eq!(field.get(0, 3, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_random_blobs_reproducible() {
        let a = random_blobs(24, 24, 1, 5, 6.0, 7).unwrap();
        let b = random_blobs(24, 24, 1, 5, 6.0, 7).unwrap();
        assert_eq!(a, b);
        assert!(!a.get(0, 0, 0).unwrap());
    }
}
