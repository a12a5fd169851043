//! Named geofences layered into one membership query.

use geo::Coord;
use hashbrown::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;

use super::index::IndexedRegionGroup;
use super::TileIndexedRegion;
use crate::error::GroupError;

/// Inclusion and exclusion regions for one key.
#[derive(Debug, Clone, Default)]
pub struct GroupEntry {
    whitelist: Vec<Arc<TileIndexedRegion>>,
    blacklist: Vec<Arc<TileIndexedRegion>>,
}

impl GroupEntry {
    pub fn new(
        whitelist: Vec<Arc<TileIndexedRegion>>,
        blacklist: Vec<Arc<TileIndexedRegion>>,
    ) -> Self {
        Self {
            whitelist,
            blacklist,
        }
    }

    pub fn whitelist(&self) -> &[Arc<TileIndexedRegion>] {
        &self.whitelist
    }

    pub fn blacklist(&self) -> &[Arc<TileIndexedRegion>] {
        &self.blacklist
    }

    /// True when the whitelist is empty, or any whitelist region holds the point.
    pub fn is_whitelisted(&self, point: impl Into<Coord<f64>>) -> bool {
        let coord = point.into();
        self.whitelist.is_empty() || self.whitelist.iter().any(|r| r.contains(coord))
    }

    /// True when any blacklist region holds the point.
    pub fn is_blacklisted(&self, point: impl Into<Coord<f64>>) -> bool {
        let coord = point.into();
        self.blacklist.iter().any(|r| r.contains(coord))
    }

    pub fn contains(&self, point: impl Into<Coord<f64>>) -> bool {
        let coord = point.into();
        self.is_whitelisted(coord) && !self.is_blacklisted(coord)
    }
}

/// A set of keyed geofences.
///
/// Queries take `&self` and touch no shared mutable state. Mutation needs
/// `&mut self`, so concurrent writers must be serialized by the caller, or
/// the group published as an [`IndexedRegionGroup`] snapshot.
#[derive(Debug, Clone)]
pub struct RegionGroup<K> {
    entries: HashMap<K, GroupEntry>,
}

impl<K> Default for RegionGroup<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K> RegionGroup<K>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. Fails if `key` is already present; use
    /// [`replace`](Self::replace) to overwrite.
    pub fn add(
        &mut self,
        key: K,
        whitelist: Vec<Arc<TileIndexedRegion>>,
        blacklist: Vec<Arc<TileIndexedRegion>>,
    ) -> Result<(), GroupError> {
        if self.entries.contains_key(&key) {
            return Err(GroupError::DuplicateKey(format!("{:?}", key)));
        }

        debug!(
            "Adding group entry {:?}: {} whitelist, {} blacklist regions",
            key,
            whitelist.len(),
            blacklist.len()
        );
        self.entries
            .insert(key, GroupEntry::new(whitelist, blacklist));
        Ok(())
    }

    /// Insert or overwrite an entry, returning the previous one.
    pub fn replace(
        &mut self,
        key: K,
        whitelist: Vec<Arc<TileIndexedRegion>>,
        blacklist: Vec<Arc<TileIndexedRegion>>,
    ) -> Option<GroupEntry> {
        self.entries
            .insert(key, GroupEntry::new(whitelist, blacklist))
    }

    pub fn remove(&mut self, key: &K) -> Option<GroupEntry> {
        self.entries.remove(key)
    }

    /// All keys whose entry contains the point.
    pub fn query_members(&self, point: impl Into<Coord<f64>>) -> HashSet<K> {
        let coord = point.into();
        self.entries
            .iter()
            .filter(|(_, entry)| entry.contains(coord))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Membership of a single key, or `None` if the key is unknown.
    pub fn is_member(&self, key: &K, point: impl Into<Coord<f64>>) -> Option<bool> {
        self.entries.get(key).map(|entry| entry.contains(point))
    }

    pub fn entry(&self, key: &K) -> Option<&GroupEntry> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &GroupEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze the group into an R-tree backed snapshot.
    pub fn snapshot(&self) -> IndexedRegionGroup<K> {
        IndexedRegionGroup::build(self)
    }
}
