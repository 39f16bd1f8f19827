//! Multi-resolution cache of "active" address ranges
//!
//! For every granularity level `L` the cache holds the address ranges touched
//! by at least one block, rounded out to pages of `2^(12 + L)` bytes and
//! coalesced into maximal runs. Level 0 is always present (4 KiB pages); the
//! coarsest level is the first whose page size reaches 1/100 of the maximum
//! heap height.
//!
//! The cache is immutable once built. The owner rebuilds it from the full
//! block log whenever the log changes.

use crate::constants::{BASE_PAGE_SHIFT, REGION_FRACTION};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Region start → exclusive region end. No two entries touch or overlap.
pub type RegionMap = BTreeMap<u64, u64>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRegionCache {
    levels: Vec<RegionMap>,
}

impl ActiveRegionCache {
    /// Build the cache from `(address, size)` spans.
    pub fn build<I>(max_height: u64, spans: I) -> Self
    where
        I: IntoIterator<Item = (u64, u64)>,
    {
        let level_count = Self::level_count_for(max_height);
        let mut levels = vec![RegionMap::new(); level_count];

        let mut span_count = 0usize;
        for (address, size) in spans {
            span_count += 1;
            for (level, map) in levels.iter_mut().enumerate() {
                insert_span(map, Self::page_size(level), address, size);
            }
        }
        for (level, map) in levels.iter_mut().enumerate() {
            coalesce(map);
            debug!(
                "level {} ({:#x} byte pages): {} runs",
                level,
                Self::page_size(level),
                map.len()
            );
        }
        info!(
            "built active region cache: {} levels from {} blocks",
            level_count, span_count
        );
        ActiveRegionCache { levels }
    }

    /// Smallest `n >= 1` such that `page_size(n) >= max_height / 100`.
    pub fn level_count_for(max_height: u64) -> usize {
        let target = max_height as f64 / REGION_FRACTION;
        let mut count = 1usize;
        while (Self::page_size(count) as f64) < target {
            count += 1;
        }
        count
    }

    /// Page size of a level: `2^(12 + level)` bytes.
    pub fn page_size(level: usize) -> u64 {
        let shift = BASE_PAGE_SHIFT as usize + level;
        if shift >= 64 {
            u64::MAX
        } else {
            1u64 << shift
        }
    }

    pub fn levels(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, level: usize) -> Option<&RegionMap> {
        self.levels.get(level)
    }

    /// The finest level whose page size is at least `min_size`, clamped to
    /// the levels present, together with that level's page size.
    pub fn active_regions(&self, min_size: u64) -> (&RegionMap, u64) {
        let level = Self::level_for_size(min_size).min(self.levels.len().saturating_sub(1));
        match self.levels.get(level) {
            Some(map) => (map, Self::page_size(level)),
            None => (&EMPTY_REGIONS, Self::page_size(0)),
        }
    }

    fn level_for_size(min_size: u64) -> usize {
        if min_size <= Self::page_size(0) {
            return 0;
        }
        let bits = 64 - (min_size - 1).leading_zeros();
        (bits - BASE_PAGE_SHIFT) as usize
    }
}

impl Default for ActiveRegionCache {
    /// An empty cache with the 4 KiB level only.
    fn default() -> Self {
        ActiveRegionCache {
            levels: vec![RegionMap::new()],
        }
    }
}

static EMPTY_REGIONS: RegionMap = BTreeMap::new();

fn round_down(address: u64, page_size: u64) -> u64 {
    address & !(page_size - 1)
}

/// Record the run of pages covering `[address, address + size]`.
fn insert_span(map: &mut RegionMap, page_size: u64, address: u64, size: u64) {
    let start = round_down(address, page_size);
    let end = round_down(address.saturating_add(size), page_size).saturating_add(page_size);
    map.entry(start)
        .and_modify(|current| *current = (*current).max(end))
        .or_insert(end);
}

/// Merge touching and overlapping runs in place.
fn coalesce(map: &mut RegionMap) {
    let mut merged = RegionMap::new();
    let mut current: Option<(u64, u64)> = None;

    for (&start, &end) in map.iter() {
        current = match current {
            Some((run_start, run_end)) if start <= run_end => Some((run_start, run_end.max(end))),
            Some((run_start, run_end)) => {
                merged.insert(run_start, run_end);
                Some((start, end))
            }
            None => Some((start, end)),
        };
    }
    if let Some((run_start, run_end)) = current {
        merged.insert(run_start, run_end);
    }
    *map = merged;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_disjoint(map: &RegionMap) {
        let mut previous_end: Option<u64> = None;
        for (&start, &end) in map {
            assert!(start < end);
            if let Some(previous) = previous_end {
                assert!(
                    previous < start,
                    "runs ending at {:#x} and starting at {:#x} touch",
                    previous,
                    start
                );
            }
            previous_end = Some(end);
        }
    }

    #[test]
    fn test_level_count() {
        assert_eq!(ActiveRegionCache::level_count_for(0), 1);
        assert_eq!(ActiveRegionCache::level_count_for(6000), 1);
        assert_eq!(ActiveRegionCache::level_count_for(100 * 8192), 1);
        assert_eq!(ActiveRegionCache::level_count_for(100 * 8192 + 100), 2);
        assert_eq!(ActiveRegionCache::level_count_for(u64::MAX), 46);
    }

    #[test]
    fn test_shared_page_coalesced() {
        let blocks = [(0x200000, 0x200), (0x200204, 0x200), (0x200408, 0x200)];
        let cache = ActiveRegionCache::build(6000, blocks);
        assert_eq!(cache.levels(), 1);

        let level = cache.level(0).unwrap();
        assert_eq!(level.len(), 1);
        assert_eq!(level.get(&0x200000), Some(&0x201000));
    }

    #[test]
    fn test_adjacent_pages_merge() {
        let blocks = [(0x1000, 0x10), (0x2000, 0x10), (0x5000, 0x10)];
        let cache = ActiveRegionCache::build(0x100000, blocks);
        let level = cache.level(0).unwrap();
        let runs: Vec<_> = level.iter().map(|(&s, &e)| (s, e)).collect();
        assert_eq!(runs, vec![(0x1000, 0x3000), (0x5000, 0x6000)]);
        for map in (0..cache.levels()).filter_map(|l| cache.level(l)) {
            assert_disjoint(map);
        }
    }

    #[test]
    fn test_block_spanning_pages() {
        let cache = ActiveRegionCache::build(1 << 24, [(0x1800, 0x2000)]);
        let level = cache.level(0).unwrap();
        assert_eq!(level.get(&0x1000), Some(&0x4000));
        assert_eq!(level.len(), 1);
    }

    #[test]
    fn test_top_of_address_space_saturates() {
        let cache = ActiveRegionCache::build(0x1000, [(u64::MAX - 0x10, 0x100)]);
        let level = cache.level(0).unwrap();
        assert_eq!(level.get(&(u64::MAX & !0xFFF)), Some(&u64::MAX));
    }

    #[test]
    fn test_query_picks_finest_sufficient_level() {
        let cache = ActiveRegionCache::build(1 << 30, [(0x10_0000, 0x10)]);
        assert!(cache.levels() >= 4);

        let (_, size) = cache.active_regions(0);
        assert_eq!(size, 0x1000);
        let (_, size) = cache.active_regions(0x1000);
        assert_eq!(size, 0x1000);
        let (_, size) = cache.active_regions(0x1001);
        assert_eq!(size, 0x2000);
        let (_, size) = cache.active_regions(0x8000);
        assert_eq!(size, 0x8000);

        let coarsest = ActiveRegionCache::page_size(cache.levels() - 1);
        let (_, size) = cache.active_regions(u64::MAX);
        assert_eq!(size, coarsest);
    }

    #[test]
    fn test_default_is_empty() {
        let cache = ActiveRegionCache::default();
        let (regions, size) = cache.active_regions(1 << 40);
        assert!(regions.is_empty());
        assert_eq!(size, 0x1000);
    }
}
