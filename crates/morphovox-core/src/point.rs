//! Point3 - integer voxel position

/// Integer voxel position `(x, y, z)`.
///
/// Positions address one 3D volume. The time frame of a sequence is chosen
/// separately, see [`VoxelSequence`](crate::VoxelSequence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point3 {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl Point3 {
    /// Create a new position.
    #[inline]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Position in a 2D image (z = 0).
    #[inline]
    pub const fn new_2d(x: u32, y: u32) -> Self {
        Self { x, y, z: 0 }
    }

    /// Signed voxel offset from `self` to `other`.
    #[inline]
    pub fn offset_to(&self, other: &Point3) -> (i64, i64, i64) {
        (
            other.x as i64 - self.x as i64,
            other.y as i64 - self.y as i64,
            other.z as i64 - self.z as i64,
        )
    }

    /// Largest per-axis offset to `other` (chessboard distance), in voxels.
    pub fn chessboard_distance(&self, other: &Point3) -> u32 {
        let (dx, dy, dz) = self.offset_to(other);
        dx.unsigned_abs()
            .max(dy.unsigned_abs())
            .max(dz.unsigned_abs()) as u32
    }
}

impl From<(u32, u32, u32)> for Point3 {
    fn from((x, y, z): (u32, u32, u32)) -> Self {
        Self { x, y, z }
    }
}

impl std::fmt::Display for Point3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
