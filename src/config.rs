//! Tile grid configuration.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Cells per axis used when no granularity is configured.
pub const DEFAULT_GRANULARITY: u32 = 20;

/// Largest accepted grid resolution per axis.
pub const MAX_GRANULARITY: u32 = 4096;

/// Cell count at which tile classification switches to the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

/// Settings for building a [`TileIndexedRegion`](crate::TileIndexedRegion).
///
/// ```toml
/// granularity = 32
/// parallel_threshold = 10000
/// ```
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct GridConfig {
    /// Grid resolution per axis, from 1 to [`MAX_GRANULARITY`].
    pub granularity: u32,
    /// Minimum number of cells before classification runs in parallel.
    pub parallel_threshold: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            granularity: DEFAULT_GRANULARITY,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl GridConfig {
    pub fn with_granularity(granularity: u32) -> Self {
        Self {
            granularity,
            ..Self::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse grid config")
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read grid config file")?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_granularity() {
        assert_eq!(GridConfig::default().granularity, 20);
        assert_eq!(GridConfig::with_granularity(7).granularity, 7);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = GridConfig::from_toml_str("granularity = 50").unwrap();
        assert_eq!(config.granularity, 50);
        assert_eq!(config.parallel_threshold, DEFAULT_PARALLEL_THRESHOLD);

        let config = GridConfig::from_toml_str("").unwrap();
        assert_eq!(config, GridConfig::default());
    }

    #[test]
    fn test_parse_rejects_negative_granularity() {
        assert!(GridConfig::from_toml_str("granularity = -3").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = GridConfig::load_from_file("/nonexistent/geofence/grid.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read grid config file"));
    }

    #[test]
    fn test_zero_granularity_is_kept_verbatim() {
        // Rejected later by region construction, never swapped for the default
        let config = GridConfig::from_toml_str("granularity = 0").unwrap();
        assert_eq!(config.granularity, 0);
    }
}
