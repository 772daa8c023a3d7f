//! Tuning knobs for frontier execution.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Configuration shared by the morsel dispatcher, sparse frontiers and the
/// vertex-compute driver.
///
/// Every field has a default, so a partial JSON document is accepted:
///
/// ```rust
/// use halo_frontier::FrontierConfig;
///
/// let cfg = FrontierConfig::from_json(r#"{ "max_threads": 8 }"#).unwrap();
/// assert_eq!(cfg.max_threads, 8);
/// assert_eq!(cfg.min_frontier_morsel_size, FrontierConfig::MIN_FRONTIER_MORSEL_SIZE);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontierConfig {
    /// Number of worker threads that scan a frontier concurrently.
    pub max_threads: usize,
    /// Lower bound on the number of offsets handed out per morsel.
    pub min_frontier_morsel_size: u64,
    /// Morsel count aimed for when `max_threads²` is smaller.
    pub min_number_of_frontier_morsels: u64,
    /// Pinned-set size at which a sparse frontier gives up and disables itself.
    pub sparse_sample_size: usize,
    /// Target count above which the shortest-path early-termination scan is skipped.
    pub early_termination_threshold: u64,
}

impl FrontierConfig {
    /// Default morsel floor.
    pub const MIN_FRONTIER_MORSEL_SIZE: u64 = 512;
    /// Default minimum number of morsels per table scan.
    pub const MIN_NUMBER_OF_FRONTIER_MORSELS: u64 = 128;
    /// Default sparse sample size.
    pub const SPARSE_SAMPLE_SIZE: usize = 1000;
    /// Default early-termination threshold.
    pub const EARLY_TERMINATION_THRESHOLD: u64 = 100;

    /// Parses a configuration from a JSON document.
    ///
    /// # Errors
    /// Returns the `serde_json` error for malformed input or mistyped fields.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    /// Fails if the file cannot be read or does not parse.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading frontier config {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("parsing frontier config {}", path.display()))
    }

    /// Returns a copy with `max_threads` replaced.
    #[must_use]
    pub fn with_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    /// Checks the invariants the dispatcher and driver rely on.
    ///
    /// # Panics
    /// Panics if `max_threads` or `min_frontier_morsel_size` is zero.
    pub fn validate(&self) {
        assert!(self.max_threads != 0, "max_threads must be > 0");
        assert!(
            self.min_frontier_morsel_size != 0,
            "min_frontier_morsel_size must be > 0"
        );
    }
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            max_threads: std::thread::available_parallelism().map_or(1, |n| n.get()),
            min_frontier_morsel_size: Self::MIN_FRONTIER_MORSEL_SIZE,
            min_number_of_frontier_morsels: Self::MIN_NUMBER_OF_FRONTIER_MORSELS,
            sparse_sample_size: Self::SPARSE_SAMPLE_SIZE,
            early_termination_threshold: Self::EARLY_TERMINATION_THRESHOLD,
        }
    }
}
