//! Error types for region and group construction.

/// Errors raised while building a [`TileIndexedRegion`](crate::TileIndexedRegion).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegionError {
    #[error("granularity must be at least 1, got {0}")]
    InvalidGranularity(u32),

    #[error("granularity {granularity} exceeds the maximum of {max}")]
    GranularityTooLarge { granularity: u32, max: u32 },

    #[error("vertex ({x}, {y}) is not a finite coordinate")]
    NonFiniteCoordinate { x: f64, y: f64 },
}

/// Errors raised while mutating a [`RegionGroup`](crate::RegionGroup).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupError {
    #[error("key {0} is already present in the group")]
    DuplicateKey(String),
}
