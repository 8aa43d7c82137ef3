//! morphovox-test - Regression test framework for morphovox
//!
//! This crate provides a regression test framework supporting three modes:
//!
//! - **Generate**: Create golden files for comparison
//! - **Compare**: Compare results with golden files
//! - **Display**: Run tests without comparison (visual inspection)
//!
//! It also ships synthetic distance fields in [`fixtures`], so every crate
//! tests against the same cones, ridges and plateaus.
//!
//! # Usage
//!
//! ```ignore
//! use morphovox_test::RegParams;
//!
//! let mut rp = RegParams::new("watershed");
//! rp.compare_values(2.0, basin_count as f64, 0.0);
//! rp.write_grid_and_check(&result.labels)?;
//! assert!(rp.cleanup());
//! ```
//!
//! Golden files live in `tests/golden` at the workspace root, named
//! `<test>_golden.<index>.<ext>`. Outputs are written to `tests/regout`.
//!
//! # Environment Variables
//!
//! - `REGTEST_MODE`: Set to "generate", "compare", or "display"
//! - `RUST_LOG`: tracing filter for the test subscriber (default `warn`)

mod error;
pub mod fixtures;
mod params;

pub use error::{TestError, TestResult};
pub use params::{RegParams, RegTestMode, grid_to_text};

use std::sync::Once;

static LOGGING: Once = Once::new();

/// Install a `tracing` subscriber writing to the test output.
///
/// Safe to call from every test; only the first call has an effect.
pub fn init_logging() {
    LOGGING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Get the path to the workspace root
fn workspace_root() -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    // morphovox-test is at crates/morphovox-test, so go up two directories
    format!("{}/../..", manifest_dir)
}

/// Get the path to the golden files directory
pub fn golden_dir() -> String {
    format!("{}/tests/golden", workspace_root())
}

/// Get the path to the regout (regression output) directory
pub fn regout_dir() -> String {
    format!("{}/tests/regout", workspace_root())
}
