//! R-tree backed snapshot of a region group.

use geo::Coord;
use hashbrown::HashSet;
use rstar::{RTree, RTreeObject, AABB};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tracing::info;

use super::{RegionGroup, TileIndexedRegion};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Whitelist,
    Blacklist,
}

/// Wrapper for R-tree indexing of group regions
#[derive(Debug, Clone)]
struct IndexedRegion {
    region: Arc<TileIndexedRegion>,
    entry: usize,
    role: Role,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedRegion {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedRegion {
    /// `None` for empty regions, which contain no point.
    fn new(region: &Arc<TileIndexedRegion>, entry: usize, role: Role) -> Option<Self> {
        let bounds = region.bounds()?;
        Some(Self {
            region: Arc::clone(region),
            entry,
            role,
            envelope: AABB::from_corners(
                [bounds.min().x, bounds.min().y],
                [bounds.max().x, bounds.max().y],
            ),
        })
    }
}

/// Immutable snapshot of a [`RegionGroup`].
///
/// Only regions whose bounding box holds the query point are tested, so a
/// query costs a tree descent plus the hits rather than a scan of every
/// region. Answers are identical to [`RegionGroup::query_members`].
#[derive(Clone)]
pub struct IndexedRegionGroup<K> {
    keys: Vec<K>,
    /// Entries with an empty whitelist, members unless blacklisted
    open_entries: Vec<usize>,
    tree: RTree<IndexedRegion>,
}

impl<K> IndexedRegionGroup<K>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn build(group: &RegionGroup<K>) -> Self {
        let mut keys = Vec::with_capacity(group.len());
        let mut open_entries = Vec::new();
        let mut indexed = Vec::new();

        for (entry_idx, (key, entry)) in group.iter().enumerate() {
            keys.push(key.clone());
            if entry.whitelist().is_empty() {
                open_entries.push(entry_idx);
            }

            let whitelist = entry
                .whitelist()
                .iter()
                .filter_map(|r| IndexedRegion::new(r, entry_idx, Role::Whitelist));
            let blacklist = entry
                .blacklist()
                .iter()
                .filter_map(|r| IndexedRegion::new(r, entry_idx, Role::Blacklist));
            indexed.extend(whitelist.chain(blacklist));
        }

        let tree = RTree::bulk_load(indexed);

        info!(
            "Region group snapshot built: {} entries, {} indexed regions, {} without whitelist",
            keys.len(),
            tree.size(),
            open_entries.len()
        );

        Self {
            keys,
            open_entries,
            tree,
        }
    }

    /// All keys whose entry contains the point.
    pub fn query_members(&self, point: impl Into<Coord<f64>>) -> HashSet<K> {
        let coord = point.into();
        let query_envelope = AABB::from_point([coord.x, coord.y]);

        let mut whitelisted: HashSet<usize> = self.open_entries.iter().copied().collect();
        let mut blacklisted: HashSet<usize> = HashSet::new();

        // R-tree narrows to envelope hits, then the tile index decides
        for ir in self.tree.locate_in_envelope_intersecting(&query_envelope) {
            let hits = match ir.role {
                Role::Whitelist => &mut whitelisted,
                Role::Blacklist => &mut blacklisted,
            };
            if !hits.contains(&ir.entry) && ir.region.contains(coord) {
                hits.insert(ir.entry);
            }
        }

        whitelisted
            .difference(&blacklisted)
            .map(|idx| self.keys[*idx].clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of non-empty regions in the tree.
    pub fn region_count(&self) -> usize {
        self.tree.size()
    }
}

impl<K: Debug> Debug for IndexedRegionGroup<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexedRegionGroup")
            .field("keys", &self.keys)
            .field("open_entries", &self.open_entries)
            .field("regions", &self.tree.size())
            .finish()
    }
}

impl<K> From<&RegionGroup<K>> for IndexedRegionGroup<K>
where
    K: Eq + Hash + Clone + Debug,
{
    fn from(group: &RegionGroup<K>) -> Self {
        Self::build(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Arc<TileIndexedRegion> {
        Arc::new(
            TileIndexedRegion::new(vec![
                (min_x, min_y),
                (max_x, min_y),
                (max_x, max_y),
                (min_x, max_y),
            ])
            .unwrap(),
        )
    }

    fn zones() -> RegionGroup<&'static str> {
        let downtown = rectangle(0.0, 0.0, 10.0, 10.0);
        let harbor = Arc::new(
            TileIndexedRegion::new(vec![(8.0, 2.0), (20.0, 0.0), (18.0, 12.0), (12.0, 6.0)])
                .unwrap(),
        );
        let park = rectangle(3.0, 3.0, 5.0, 5.0);
        let flat = Arc::new(TileIndexedRegion::new(vec![(0.0, 0.0), (30.0, 0.0)]).unwrap());

        let mut group = RegionGroup::new();
        group.add("downtown", vec![downtown.clone()], vec![park.clone()]).unwrap();
        group.add("coast", vec![downtown, harbor.clone()], vec![]).unwrap();
        group.add("anywhere", vec![], vec![]).unwrap();
        group.add("dry", vec![], vec![harbor]).unwrap();
        group.add("nowhere", vec![flat], vec![]).unwrap();
        group.add("parks", vec![park], vec![]).unwrap();
        group
    }

    fn keys(values: &[&'static str]) -> HashSet<&'static str> {
        values.iter().copied().collect()
    }

    #[test]
    fn test_snapshot_skips_empty_regions() {
        let snapshot = zones().snapshot();
        assert_eq!(snapshot.len(), 6);
        // downtown x2, park x2, harbor x2; the flat region is dropped
        assert_eq!(snapshot.region_count(), 6);
    }

    #[test]
    fn test_snapshot_queries() {
        let snapshot = IndexedRegionGroup::from(&zones());

        assert_eq!(
            snapshot.query_members((1.0, 1.0)),
            keys(&["downtown", "coast", "anywhere", "dry"])
        );
        assert_eq!(
            snapshot.query_members((4.0, 4.0)),
            keys(&["coast", "anywhere", "dry", "parks"])
        );
        assert_eq!(
            snapshot.query_members((15.0, 5.0)),
            keys(&["coast", "anywhere"])
        );
        assert_eq!(
            snapshot.query_members((100.0, 100.0)),
            keys(&["anywhere", "dry"])
        );
    }

    #[test]
    fn test_snapshot_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<IndexedRegionGroup<String>>();
        assert_send_sync::<RegionGroup<String>>();
    }

    proptest! {
        #[test]
        fn test_snapshot_matches_group(
            points in prop::collection::vec((-5.0f64..25.0, -5.0f64..15.0), 32),
        ) {
            let group = zones();
            let snapshot = group.snapshot();
            for point in points {
                prop_assert_eq!(snapshot.query_members(point), group.query_members(point));
            }
        }
    }
}
