//! Point and window queries over the block log

use super::block::HeapBlock;
use super::recorder::HeapHistory;
use crate::constants::{EVENT_SEARCH_WINDOW, REGION_FRACTION, VISIBLE_BLOCK_FRACTION};
use crate::fixed::FRACTION_SCALE;
use crate::regions::{ActiveRegionCache, RegionMap};
use crate::viewport::VisibleBounds;
use tracing::debug;

/// Block indices ordered by `(address, index)`, plus the largest block size,
/// which bounds how far below a query address a containing block can start.
#[derive(Debug, Clone, Default)]
pub struct AddressIndex {
    order: Vec<usize>,
    max_size: u64,
}

impl AddressIndex {
    pub fn build(blocks: &[HeapBlock]) -> Self {
        let mut order: Vec<usize> = (0..blocks.len()).collect();
        order.sort_by_key(|&index| (blocks[index].address, index));
        let max_size = blocks.iter().map(|b| b.size as u64).max().unwrap_or(0);
        debug!("rebuilt address index over {} blocks", order.len());
        AddressIndex { order, max_size }
    }

    /// Lowest log index among blocks containing `(tick, address)`.
    pub fn find(&self, blocks: &[HeapBlock], tick: u32, address: u64) -> Option<usize> {
        let upper = self
            .order
            .partition_point(|&index| blocks[index].address <= address);
        let floor = address.saturating_sub(self.max_size);

        self.order[..upper]
            .iter()
            .rev()
            .take_while(|&&index| blocks[index].address >= floor)
            .copied()
            .filter(|&index| blocks[index].contains(tick, address))
            .min()
    }
}

impl HeapHistory {
    /// Linear scan for the first block containing `(tick, address)`.
    pub fn get_block_at_slow(&self, address: u64, tick: u32) -> Option<(&HeapBlock, usize)> {
        self.blocks
            .iter()
            .enumerate()
            .find(|(_, block)| block.contains(tick, address))
            .map(|(index, block)| (block, index))
    }

    /// Indexed lookup; always agrees with [`HeapHistory::get_block_at_slow`].
    pub fn get_block_at(&self, address: u64, tick: u32) -> Option<(&HeapBlock, usize)> {
        let index = self
            .address_index
            .get_or_init(|| AddressIndex::build(&self.blocks))
            .find(&self.blocks, tick, address)?;
        self.blocks.get(index).map(|block| (block, index))
    }

    /// Label of the event at `tick`, or of the closest event less than
    /// [`EVENT_SEARCH_WINDOW`] ticks away. Ties go to the later event.
    pub fn get_event_at_tick(&self, tick: u32) -> Option<&str> {
        if let Some(event) = self.events.get(&tick) {
            return Some(&event.label);
        }
        let reach = EVENT_SEARCH_WINDOW - 1;
        let low = tick.saturating_sub(reach);
        let high = tick.saturating_add(reach);

        let mut best: Option<(u32, &str)> = None;
        for (&event_tick, event) in self.events.range(low..=high) {
            let distance = event_tick.abs_diff(tick);
            if best.map_or(true, |(minimum, _)| distance <= minimum) {
                best = Some((distance, &event.label));
            }
        }
        best.map(|(_, label)| label)
    }

    /// Blocks below this size (in bytes) are culled at the current zoom.
    pub fn minimum_block_size(&self) -> u64 {
        let height = self.viewport.height_raw() / FRACTION_SCALE;
        (height / VISIBLE_BLOCK_FRACTION) as u64
    }

    /// Whether `block` is big enough and close enough to the window to draw.
    pub fn is_block_active(block: &HeapBlock, min_size: u64, bounds: &VisibleBounds) -> bool {
        (block.size as u64) >= min_size
            && block.address <= bounds.max_address
            && block.end_address() >= bounds.min_address
            && block.end_tick >= bounds.min_tick
            && block.start_tick <= bounds.max_tick
    }

    /// Blocks to draw for the current window, in log order.
    pub fn active_blocks(&self, all: bool) -> impl Iterator<Item = &HeapBlock> + '_ {
        let min_size = self.minimum_block_size();
        let bounds = self.viewport.visible_bounds();
        self.blocks
            .iter()
            .filter(move |block| all || Self::is_block_active(block, min_size, &bounds))
    }

    /// The region cache for the current log, built on first use.
    pub fn active_region_cache(&self) -> &ActiveRegionCache {
        self.region_cache.get_or_init(|| {
            ActiveRegionCache::build(
                self.extent.height(),
                self.blocks.iter().map(|b| (b.address, b.size as u64)),
            )
        })
    }

    /// Coalesced active regions at a granularity of about 1/100 of the
    /// visible height, with the chosen page size.
    pub fn active_regions(&self) -> (&RegionMap, u64) {
        let height = self.viewport.height_raw() / FRACTION_SCALE;
        let min_size = (height / REGION_FRACTION) as u64;
        self.active_region_cache().active_regions(min_size)
    }

    /// Zoom-out caps `(max_height, max_width)` in raw units: the window the
    /// viewport was last reset to.
    pub fn zoom_caps(&self) -> (f64, f64) {
        self.viewport.max_extents()
    }
}
