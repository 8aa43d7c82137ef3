//! Regression test parameters and operations

use crate::error::TestResult;
use crate::{golden_dir, init_logging, regout_dir};
use morphovox_core::VoxelGrid;
use std::fmt::{Debug, Display};
use std::fs;
use std::path::Path;

/// Text form of a grid.
///
/// The first line holds the dimensions. Each row of a z-slice follows as
/// space separated values and every slice ends with an empty line.
pub fn grid_to_text<T: Display>(grid: &VoxelGrid<T>) -> String {
    let (w, h, d) = grid.dimensions();
    let mut text = format!("{w} {h} {d}\n");
    for slice in grid.data().chunks(w as usize * h as usize) {
        for row in slice.chunks(w as usize) {
            let values: Vec<String> = row.iter().map(ToString::to_string).collect();
            text.push_str(&values.join(" "));
            text.push('\n');
        }
        text.push('\n');
    }
    text
}

/// Regression test mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegTestMode {
    /// Generate golden files
    Generate,
    /// Compare with golden files (default)
    #[default]
    Compare,
    /// Display mode - run without comparison
    Display,
}

impl RegTestMode {
    /// Parse mode from environment variable or string
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("REGTEST_MODE").unwrap_or_default())
    }

    fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "generate" => Self::Generate,
            "display" => Self::Display,
            _ => Self::Compare,
        }
    }
}

/// Regression test parameters
///
/// This structure tracks the state of a regression test, including
/// the test name, current index, mode, and success status.
pub struct RegParams {
    /// Name of the test (e.g., "watershed")
    pub test_name: String,
    /// Current test index (incremented before each test)
    index: usize,
    /// Test mode (generate, compare, or display)
    pub mode: RegTestMode,
    /// Overall success status
    success: bool,
    /// Recorded failures
    failures: Vec<String>,
}

impl RegParams {
    /// Create new regression test parameters
    ///
    /// Installs the test `tracing` subscriber on first use and reads the
    /// mode from the `REGTEST_MODE` environment variable.
    pub fn new(test_name: &str) -> Self {
        init_logging();

        let mode = RegTestMode::from_env();

        // Ensure directories exist
        let _ = fs::create_dir_all(golden_dir());
        let _ = fs::create_dir_all(regout_dir());

        eprintln!();
        eprintln!("////////////////////////////////////////////////");
        eprintln!("////////////////   {}_reg   ///////////////", test_name);
        eprintln!("////////////////////////////////////////////////");
        eprintln!("Mode: {:?}", mode);

        Self {
            test_name: test_name.to_string(),
            index: 0,
            mode,
            success: true,
            failures: Vec::new(),
        }
    }

    /// Get the current test index
    pub fn index(&self) -> usize {
        self.index
    }

    fn fail(&mut self, msg: String) {
        eprintln!("{}", msg);
        self.failures.push(msg);
        self.success = false;
    }

    /// Compare two floating-point values
    ///
    /// # Arguments
    ///
    /// * `expected` - Expected value (typically from golden/reference)
    /// * `actual` - Actual computed value
    /// * `delta` - Maximum allowed difference
    ///
    /// # Returns
    ///
    /// `true` if values match within delta, `false` otherwise.
    pub fn compare_values(&mut self, expected: f64, actual: f64, delta: f64) -> bool {
        self.index += 1;
        let diff = (expected - actual).abs();

        if diff > delta || diff.is_nan() {
            let msg = format!(
                "Failure in {}_reg: value comparison for index {}\n\
                 difference = {} but allowed delta = {}\n\
                 expected = {}, actual = {}",
                self.test_name, self.index, diff, delta, expected, actual
            );
            self.fail(msg);
            false
        } else {
            true
        }
    }

    /// Check a boolean condition
    pub fn check(&mut self, condition: bool, what: &str) -> bool {
        self.index += 1;
        if !condition {
            let msg = format!(
                "Failure in {}_reg: check for index {} - {}",
                self.test_name, self.index, what
            );
            self.fail(msg);
        }
        condition
    }

    /// Compare two grids for exact equality
    ///
    /// Dimensions must match and every voxel must be equal. The first
    /// differing voxel is reported.
    pub fn compare_grids<T: PartialEq + Debug>(
        &mut self,
        grid1: &VoxelGrid<T>,
        grid2: &VoxelGrid<T>,
    ) -> bool {
        self.index += 1;

        if grid1.dimensions() != grid2.dimensions() {
            let msg = format!(
                "Failure in {}_reg: grid comparison for index {} - dimension mismatch {:?} vs {:?}",
                self.test_name,
                self.index,
                grid1.dimensions(),
                grid2.dimensions()
            );
            self.fail(msg);
            return false;
        }

        let mismatch = grid1
            .data()
            .iter()
            .zip(grid2.data())
            .position(|(a, b)| a != b);
        if let Some(i) = mismatch {
            let msg = format!(
                "Failure in {}_reg: grid comparison for index {} - voxel mismatch at {}: {:?} vs {:?}",
                self.test_name,
                self.index,
                grid1.position_of(i),
                grid1.data()[i],
                grid2.data()[i]
            );
            self.fail(msg);
            return false;
        }

        true
    }

    /// Write a grid as text and check it against its golden file
    ///
    /// Values are written with `Display`, see [`grid_to_text`].
    pub fn write_grid_and_check<T: Display>(&mut self, grid: &VoxelGrid<T>) -> TestResult<()> {
        self.write_data_and_check(grid_to_text(grid).as_bytes(), "txt")
    }

    /// Write data to file and check against golden file
    ///
    /// # Arguments
    ///
    /// * `data` - Data to write
    /// * `ext` - File extension (e.g., "txt", "json")
    pub fn write_data_and_check(&mut self, data: &[u8], ext: &str) -> TestResult<()> {
        self.index += 1;

        let local_path = format!(
            "{}/{}.{:02}.{}",
            regout_dir(),
            self.test_name,
            self.index,
            ext
        );

        fs::write(&local_path, data)?;
        self.check_file(&local_path, ext)
    }

    /// Check a file against its golden counterpart
    ///
    /// In generate mode, copies the file to golden.
    /// In compare mode, compares with golden file; a missing golden file
    /// is reported and skipped.
    /// In display mode, does nothing.
    fn check_file(&mut self, local_path: &str, ext: &str) -> TestResult<()> {
        let golden_path = format!(
            "{}/{}_golden.{:02}.{}",
            golden_dir(),
            self.test_name,
            self.index,
            ext
        );

        match self.mode {
            RegTestMode::Generate => {
                fs::copy(local_path, &golden_path)?;
                eprintln!("Generated: {}", golden_path);
            }
            RegTestMode::Compare => {
                if !Path::new(&golden_path).exists() {
                    eprintln!("No golden file, skipped: {}", golden_path);
                    return Ok(());
                }

                let local_data = fs::read(local_path)?;
                let golden_data = fs::read(&golden_path)?;

                if local_data != golden_data {
                    let msg = format!(
                        "Failure in {}_reg, index {}: comparing {} with {}",
                        self.test_name, self.index, local_path, golden_path
                    );
                    self.fail(msg);
                }
            }
            RegTestMode::Display => {}
        }

        Ok(())
    }

    /// Clean up and report results
    ///
    /// # Returns
    ///
    /// `true` if all tests passed, `false` if any failed.
    pub fn cleanup(self) -> bool {
        if self.success {
            eprintln!("SUCCESS: {}_reg", self.test_name);
        } else {
            eprintln!("FAILURE: {}_reg", self.test_name);
            for failure in &self.failures {
                eprintln!("  {}", failure);
            }
        }
        eprintln!();

        self.success
    }

    /// Check if all tests have passed so far
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Get list of failures
    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}
