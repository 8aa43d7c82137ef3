//! Voxel neighborhoods
//!
//! Neighbor offsets for the three 3D connectivities. On a grid of depth 1
//! the z offsets are dropped, so the same connectivity value reduces to the
//! matching 2D neighborhood (6 → 4, 18 and 26 → 8).
//!
//! Every offset list is closed under negation, which is what makes
//! adjacency built from it symmetric.

/// Voxel adjacency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Connectivity {
    /// Face neighbors only
    Six,
    /// Face and edge neighbors
    Eighteen,
    /// Face, edge and corner neighbors
    #[default]
    TwentySix,
}

/// Signed voxel offset `(dx, dy, dz)`
pub type Offset = (i32, i32, i32);

impl Connectivity {
    /// Maximum number of neighbors in 3D.
    pub fn max_neighbors(self) -> usize {
        match self {
            Connectivity::Six => 6,
            Connectivity::Eighteen => 18,
            Connectivity::TwentySix => 26,
        }
    }

    /// Offsets of this neighborhood, in `dz, dy, dx` nested order.
    ///
    /// When `planar` is true only offsets with `dz == 0` are returned.
    pub fn offsets(self, planar: bool) -> Vec<Offset> {
        let mut out = Vec::with_capacity(self.max_neighbors());
        let zs: &[i32] = if planar { &[0] } else { &[-1, 0, 1] };
        for &dz in zs {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let nonzero = (dx != 0) as u32 + (dy != 0) as u32 + (dz != 0) as u32;
                    let keep = match self {
                        Connectivity::Six => nonzero == 1,
                        Connectivity::Eighteen => nonzero == 1 || nonzero == 2,
                        Connectivity::TwentySix => nonzero >= 1,
                    };
                    if keep {
                        out.push((dx, dy, dz));
                    }
                }
            }
        }
        out
    }
}
