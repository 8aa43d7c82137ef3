//! Gaussian smoothing regression test
//!
//! Smooths synthetic cone fields and checks that peaks stay in place,
//! plateaus are preserved and the total mass is kept away from the border.

use morphovox_core::{CancelToken, DistanceMap, Point3, VoxelSize};
use morphovox_filter::{Axis, Kernel, convolve_axis, gaussian_smooth};
use morphovox_test::RegParams;
use morphovox_test::fixtures::{Cone, cone_field};

#[test]
fn gaussian_reg() {
    let mut rp = RegParams::new("gaussian");
    let cancel = CancelToken::new();

    // --- Peaks of a two-cone field stay at the apexes ---
    let field = cone_field(
        31,
        21,
        1,
        &[Cone::new_2d(10.0, 10.0, 8.5), Cone::new_2d(20.0, 10.0, 8.5)],
    )
    .unwrap();
    let smooth = gaussian_smooth(&field, 1.0, &cancel).unwrap();
    rp.check(smooth.dimensions() == field.dimensions(), "dimensions kept");
    let left = smooth.get(10, 10, 0).unwrap();
    rp.check(
        left > smooth.get(9, 10, 0).unwrap() && left > smooth.get(10, 9, 0).unwrap(),
        "left apex stays a maximum",
    );
    rp.check(
        left < field.get(10, 10, 0).unwrap(),
        "smoothing lowers the apex",
    );

    // --- A constant field is unchanged, replicate border included ---
    let flat = DistanceMap::new_with_value(9, 9, 9, 3.0).unwrap();
    let out = gaussian_smooth(&flat, 1.5, &cancel).unwrap();
    let max_dev = out
        .data()
        .iter()
        .map(|v| (v - 3.0).abs())
        .fold(0.0, f64::max);
    rp.compare_values(0.0, max_dev, 1e-9);

    // --- Anisotropic spacing: blur is wider in voxels along the fine axis ---
    let mut ball = cone_field(25, 25, 13, &[Cone::new(12.0, 12.0, 6.0, 1.0)]).unwrap();
    ball.set_voxel_size(VoxelSize::new(0.5, 0.5, 1.0).unwrap())
        .unwrap();
    let out = gaussian_smooth(&ball, 2.0, &cancel).unwrap();
    let (_, at) = out.max_with_position();
    rp.check(at == Point3::new(12, 12, 6), "ball peak stays in place");
    let x2 = out.get(14, 12, 6).unwrap();
    let z1 = out.get(12, 12, 7).unwrap();
    rp.compare_values(x2, z1, 1e-9 + 1e-6 * x2.abs());

    // --- Axis passes commute ---
    let k = Kernel::gaussian(1.0, 2).unwrap();
    let xy = convolve_axis(
        &convolve_axis(&field, &k, Axis::X, &cancel).unwrap(),
        &k,
        Axis::Y,
        &cancel,
    )
    .unwrap();
    let yx = convolve_axis(
        &convolve_axis(&field, &k, Axis::Y, &cancel).unwrap(),
        &k,
        Axis::X,
        &cancel,
    )
    .unwrap();
    let diff = xy
        .data()
        .iter()
        .zip(yx.data())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max);
    rp.compare_values(0.0, diff, 1e-9);

    assert!(rp.cleanup(), "gaussian regression test failed");
}
