use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::layout::ColumnBreakpoints;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// JSON file holding the image table served to the gallery.
    pub catalog_path: PathBuf,
    /// Rows fetched per page.
    pub page_limit: usize,
    /// How long typing must pause before a search is committed.
    #[serde(with = "humantime_serde")]
    pub search_debounce: Duration,
    /// Distance from the document bottom that triggers the next page.
    pub scroll_threshold: f32,
    /// Minimum horizontal travel for a touch swipe in the lightbox.
    pub swipe_threshold: f32,
    /// Number of leading tiles flagged as load-priority.
    pub priority_tiles: usize,
    /// Optional deterministic seed for the first-page shuffle.
    pub shuffle_seed: Option<u64>,
    /// Maximum number of page fetches allowed in flight at once.
    pub max_concurrent_fetches: usize,
    /// Artificial delay added to every catalog response.
    #[serde(with = "humantime_serde")]
    pub simulated_latency: Duration,
    /// Responsive column layout.
    pub columns: ColumnBreakpoints,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(self.page_limit > 0, "page-limit must be greater than zero");
        ensure!(
            !self.search_debounce.is_zero(),
            "search-debounce must be greater than zero"
        );
        ensure!(
            self.scroll_threshold >= 0.0,
            "scroll-threshold must not be negative"
        );
        ensure!(
            self.swipe_threshold > 0.0,
            "swipe-threshold must be positive"
        );
        ensure!(
            self.max_concurrent_fetches > 0,
            "max-concurrent-fetches must be greater than zero"
        );
        self.columns
            .validate()
            .context("invalid columns configuration")?;
        Ok(self)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("catalog.json"),
            page_limit: 14,
            search_debounce: Duration::from_millis(500),
            scroll_threshold: 200.0,
            swipe_threshold: 50.0,
            priority_tiles: 7,
            shuffle_seed: None,
            max_concurrent_fetches: 4,
            simulated_latency: Duration::ZERO,
            columns: ColumnBreakpoints::default(),
        }
    }
}
