//! Geofence - tile-indexed point-in-polygon regions and keyed region groups.
//!
//! This library answers in-memory geometric queries: whether a point lies in
//! a polygon region, and which named geofences of a group hold a point.

pub mod config;
pub mod error;
pub mod geofence;

pub use config::GridConfig;
pub use error::{GroupError, RegionError};
pub use geofence::{GroupEntry, IndexedRegionGroup, RegionGroup, TileClass, TileIndexedRegion};
