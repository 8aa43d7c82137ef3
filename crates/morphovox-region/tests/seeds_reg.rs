//! Seed detection regression test
//!
//! Smoothed local maxima of cone fields: one seed per cone, labels in
//! decreasing order of height.

use morphovox_core::{CancelToken, DistanceMap, Point3};
use morphovox_region::{
    SeedOptions, find_local_maxima, seeds_from_grid, seeds_to_grid, select_seeds,
};
use morphovox_test::RegParams;
use morphovox_test::fixtures::{Cone, cone_field};

#[test]
fn seeds_cones_reg() {
    let mut rp = RegParams::new("seeds_cones");
    let cancel = CancelToken::new();

    // --- Two cones of different size, 12 voxels apart ---
    let field = cone_field(
        31,
        21,
        1,
        &[Cone::new_2d(10.0, 10.0, 8.5), Cone::new_2d(22.0, 10.0, 6.5)],
    )
    .unwrap();
    let seeds = select_seeds(&field, &SeedOptions::default(), &cancel).unwrap();
    rp.compare_values(2.0, seeds.len() as f64, 0.0);
    rp.check(
        seeds[0].position == Point3::new_2d(10, 10) && seeds[0].label == 1,
        "larger cone first",
    );
    rp.check(
        seeds[1].position == Point3::new_2d(22, 10) && seeds[1].label == 2,
        "smaller cone second",
    );

    // Without smoothing the apexes are still the only maxima
    let raw = select_seeds(&field, &SeedOptions::new().with_sigma(0.0), &cancel).unwrap();
    rp.check(raw == seeds, "unsmoothed seeds match");

    // Seeds survive a trip through a label grid
    let grid = seeds_to_grid(&seeds, 31, 21, 1).unwrap();
    rp.compare_values(2.0, grid.data().iter().filter(|&&l| l > 0).count() as f64, 0.0);
    rp.check(seeds_from_grid(&grid) == seeds, "grid round trip");

    // --- A ball in 3D ---
    let ball = cone_field(15, 15, 15, &[Cone::new(7.0, 7.0, 7.0, 6.5)]).unwrap();
    let seeds = select_seeds(&ball, &SeedOptions::default(), &cancel).unwrap();
    rp.compare_values(1.0, seeds.len() as f64, 0.0);
    rp.check(seeds[0].position == Point3::new(7, 7, 7), "ball centre");

    assert!(rp.cleanup(), "seeds cones regression test failed");
}

#[test]
fn seeds_edge_cases_reg() {
    let mut rp = RegParams::new("seeds_edge_cases");
    let cancel = CancelToken::new();

    // No foreground, no seeds
    let empty = DistanceMap::new(10, 10, 1).unwrap();
    let seeds = select_seeds(&empty, &SeedOptions::default(), &cancel).unwrap();
    rp.check(seeds.is_empty(), "empty field has no seeds");

    // Radius 0 keeps every voxel that has no greater neighbor at all
    let field = cone_field(9, 9, 1, &[Cone::new_2d(4.0, 4.0, 3.5)]).unwrap();
    let maxima = find_local_maxima(&field, 0.0, &cancel).unwrap();
    rp.compare_values(
        field.foreground_count() as f64,
        maxima.len() as f64,
        0.0,
    );

    // Invalid options
    let bad = SeedOptions::new().with_sigma(f64::NAN);
    rp.check(select_seeds(&field, &bad, &cancel).is_err(), "NaN sigma");
    rp.check(
        find_local_maxima(&field, -1.0, &cancel).is_err(),
        "negative radius",
    );

    // Cancellation
    let cancelled = CancelToken::new();
    cancelled.cancel();
    let out = select_seeds(&field, &SeedOptions::default(), &cancelled);
    rp.check(
        out.as_ref().is_err_and(|e| e.is_cancelled()),
        "cancelled selection",
    );

    assert!(rp.cleanup(), "seeds edge cases regression test failed");
}
