//! Voxel grid regression test
//!
//! Exercises grid indexing, neighborhoods on anisotropic grids and frame
//! sequences.

use morphovox_core::{
    CancelToken, Connectivity, DistanceMap, Error, LabelGrid, Point3, VoxelGrid, VoxelSequence,
    VoxelSize,
};
use morphovox_test::RegParams;

#[test]
fn voxelgrid_reg() {
    let mut rp = RegParams::new("voxelgrid");

    let size = VoxelSize::new(0.5, 0.5, 2.0).unwrap();
    let mut grid = DistanceMap::new(6, 5, 4)
        .unwrap()
        .with_voxel_size(size)
        .unwrap();
    rp.compare_values(120.0, grid.len() as f64, 0.0);

    // Scan order is x fastest, then y, then z
    for (i, p) in grid.positions().enumerate().take(40) {
        rp.check(grid.index_of(p.x, p.y, p.z) == Some(i), "index/position");
    }
    grid.set(5, 4, 3, 1.5).unwrap();
    rp.compare_values(119.0, grid.index_of(5, 4, 3).unwrap() as f64, 0.0);
    rp.check(
        grid.get(6, 0, 0) == Err(Error::PositionOutOfBounds { x: 6, y: 0, z: 0 }),
        "out of bounds get",
    );

    // Map keeps voxel size
    let labels: LabelGrid = grid.map(|&d| if d > 0.0 { 1 } else { 0 });
    rp.check(labels.voxel_size() == size, "map keeps voxel size");
    rp.compare_values(1.0, labels.data().iter().sum::<u32>() as f64, 0.0);

    // Physical length of the corner step
    let step = size.offset_length(1, 1, 1);
    rp.compare_values((0.25f64 + 0.25 + 4.0).sqrt(), step, 1e-12);

    // Interior voxel has a full neighborhood, corner has 7 for 26-connectivity
    for (conn, full) in [
        (Connectivity::Six, 6),
        (Connectivity::Eighteen, 18),
        (Connectivity::TwentySix, 26),
    ] {
        let offsets = grid.offsets(conn);
        let center = grid.index_of(2, 2, 2).unwrap();
        rp.compare_values(full as f64, grid.neighbors(center, &offsets).count() as f64, 0.0);
    }
    let offsets = grid.offsets(Connectivity::TwentySix);
    rp.compare_values(7.0, grid.neighbors(0, &offsets).count() as f64, 0.0);

    assert!(rp.cleanup(), "voxelgrid regression test failed");
}

#[test]
fn voxelgrid_sequence_reg() {
    let mut rp = RegParams::new("voxelgrid_sequence");

    let frames: Vec<DistanceMap> = (0..3)
        .map(|t| DistanceMap::new_with_value(4, 4, 2, t as f64).unwrap())
        .collect();
    let mut seq = VoxelSequence::new(frames).unwrap();
    rp.compare_values(3.0, seq.len() as f64, 0.0);
    rp.check(seq.dimensions() == (4, 4, 2), "sequence dimensions");

    let values: Vec<f64> = seq.iter().map(|f| f.get(0, 0, 0).unwrap()).collect();
    rp.check(values == vec![0.0, 1.0, 2.0], "frames keep time order");

    let wrong = DistanceMap::new(4, 4, 3).unwrap();
    rp.check(
        matches!(seq.push(wrong), Err(Error::DimensionMismatch { .. })),
        "mismatched frame rejected",
    );
    rp.check(seq.frame(3).is_err(), "frame index out of range");

    let token = CancelToken::new();
    rp.check(token.check().is_ok(), "fresh token");
    token.clone().cancel();
    rp.check(token.check() == Err(Error::Cancelled), "cancel shared");

    let p: Point3 = (1, 2, 3).into();
    let grid: LabelGrid = VoxelGrid::new(2, 3, 4).unwrap();
    rp.check(grid.contains(p) && !grid.contains(Point3::new(2, 0, 0)), "contains");

    assert!(rp.cleanup(), "voxelgrid sequence regression test failed");
}

#[cfg(feature = "serde")]
#[test]
fn voxelgrid_serde_reg() {
    let mut rp = RegParams::new("voxelgrid_serde");

    let size = VoxelSize::new(0.2, 0.2, 1.0).unwrap();
    let json = serde_json::to_string(&size).unwrap();
    let back: VoxelSize = serde_json::from_str(&json).unwrap();
    rp.check(back == size, "voxel size round trip");

    let conn: Connectivity = serde_json::from_str("\"Six\"").unwrap();
    rp.check(conn == Connectivity::Six, "connectivity from json");

    assert!(rp.cleanup(), "voxelgrid serde regression test failed");
}
