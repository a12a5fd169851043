//! Geofence membership queries.
//!
//! Single polygons are wrapped in a tile index for fast point tests, and
//! keyed whitelist/blacklist combinations of them are layered into a
//! group that answers "which geofences hold this point".

pub mod geometry;
mod group;
mod index;
mod tile;

pub use group::{GroupEntry, RegionGroup};
pub use index::IndexedRegionGroup;
pub use tile::{TileClass, TileIndexedRegion};
