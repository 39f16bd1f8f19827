//! The event log and its recording API

use super::annotation::{Annotation, Rgb};
use super::block::{ConflictKind, HeapBlock, HeapConflict, Tag};
use super::queries::AddressIndex;
use crate::constants::{REALLOC_FREE_TAG, REALLOC_MALLOC_TAG};
use crate::regions::ActiveRegionCache;
use crate::viewport::{GlobalExtent, Viewport, ViewportError};
use rustc_hash::FxHashSet;
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Append-only heap event log plus the display window over it.
///
/// Every malloc/free record advances the tick by one, even when the record
/// ends up filtered or in conflict. The sorted block index and the active
/// region cache are derived from the log and dropped on every successful
/// malloc; queries rebuild them on demand.
#[derive(Debug)]
pub struct HeapHistory {
    pub(crate) current_tick: u32,
    pub(crate) viewport: Viewport,
    pub(crate) extent: GlobalExtent,
    pub(crate) blocks: Vec<HeapBlock>,
    /// `(address, heap_id)` → index into `blocks`
    pub(crate) live_blocks: BTreeMap<(u64, u8), usize>,
    pub(crate) conflicts: Vec<HeapConflict>,
    pub(crate) events: BTreeMap<u32, Annotation>,
    pub(crate) addresses: BTreeMap<u64, Annotation>,
    pub(crate) filter_ranges: Vec<(u64, u64)>,
    tags: FxHashSet<Tag>,
    pub(crate) address_index: OnceCell<AddressIndex>,
    pub(crate) region_cache: OnceCell<ActiveRegionCache>,
}

impl HeapHistory {
    pub fn new() -> Self {
        let extent = GlobalExtent::empty();
        HeapHistory {
            current_tick: 0,
            viewport: Viewport::from_extent(&extent),
            extent,
            blocks: Vec::new(),
            live_blocks: BTreeMap::new(),
            conflicts: Vec::new(),
            events: BTreeMap::new(),
            addresses: BTreeMap::new(),
            filter_ranges: Vec::new(),
            tags: FxHashSet::default(),
            address_index: OnceCell::new(),
            region_cache: OnceCell::new(),
        }
    }

    /// Return the shared copy of `tag`, inserting it on first use.
    pub(crate) fn intern(&mut self, tag: &str) -> Tag {
        if let Some(existing) = self.tags.get(tag) {
            return Rc::clone(existing);
        }
        let interned: Tag = Rc::from(tag);
        self.tags.insert(Rc::clone(&interned));
        interned
    }

    fn is_filtered(&self, address: u64) -> bool {
        !self.filter_ranges.is_empty()
            && !self
                .filter_ranges
                .iter()
                .any(|&(low, high)| address >= low && address <= high)
    }

    fn invalidate_caches(&mut self) {
        self.address_index.take();
        self.region_cache.take();
    }

    fn record_conflict(&mut self, address: u64, heap_id: u8, kind: ConflictKind) {
        let conflict = HeapConflict {
            tick: self.current_tick,
            address,
            heap_id,
            kind,
        };
        debug!("conflict: {}", conflict);
        self.conflicts.push(conflict);
    }

    /// Move to the next tick. Fails once the next tick would collide with
    /// [`HeapBlock::ALIVE`].
    fn advance_tick(&mut self) -> bool {
        match self.current_tick.checked_add(1) {
            Some(tick) if tick != HeapBlock::ALIVE => {
                self.current_tick = tick;
                true
            }
            _ => {
                warn!("tick space exhausted at {}, dropping record", self.current_tick);
                false
            }
        }
    }

    pub fn record_malloc(&mut self, address: u64, size: u32, tag: &str, heap_id: u8) {
        if !self.advance_tick() {
            return;
        }
        if self.is_filtered(address) {
            trace!("filtered malloc at {:#x}", address);
            return;
        }
        if self.live_blocks.contains_key(&(address, heap_id)) {
            self.record_conflict(address, heap_id, ConflictKind::Allocation);
            return;
        }

        let tag = self.intern(tag);
        self.blocks
            .push(HeapBlock::new(self.current_tick, size, address, tag));
        self.live_blocks
            .insert((address, heap_id), self.blocks.len() - 1);
        self.invalidate_caches();

        self.extent.include_block(address, size);
        self.extent.extend_to_tick(self.current_tick);
    }

    pub fn record_free(&mut self, address: u64, tag: &str, heap_id: u8) {
        if !self.advance_tick() {
            return;
        }
        if self.is_filtered(address) {
            trace!("filtered free at {:#x}", address);
            return;
        }
        let Some(index) = self.live_blocks.remove(&(address, heap_id)) else {
            self.record_conflict(address, heap_id, ConflictKind::Free);
            return;
        };

        let tag = self.intern(tag);
        let tick = self.current_tick;
        if let Some(block) = self.blocks.get_mut(index) {
            block.end_tick = tick;
            block.free_tag = Some(tag);
        }
        self.extent.extend_to_tick(tick);
    }

    /// Free every live block of `heap_id` whose address lies in `[low, high]`,
    /// one tick per block.
    pub fn record_free_range(&mut self, low: u64, high: u64, tag: &str, heap_id: u8) {
        if low > high {
            debug!("ignoring inverted free range {:#x}..{:#x}", low, high);
            return;
        }
        let targets: Vec<u64> = self
            .live_blocks
            .range((low, heap_id)..=(high, heap_id))
            .filter(|((_, id), _)| *id == heap_id)
            .map(|((address, _), _)| *address)
            .collect();
        trace!("range free {:#x}..{:#x} hits {} blocks", low, high, targets.len());
        for address in targets {
            self.record_free(address, tag, heap_id);
        }
    }

    /// A tagged free of `old_address` followed by a tagged malloc of
    /// `new_address`.
    pub fn record_realloc(&mut self, old_address: u64, new_address: u64, size: u32, heap_id: u8) {
        self.record_free(old_address, REALLOC_FREE_TAG, heap_id);
        self.record_malloc(new_address, size, REALLOC_MALLOC_TAG, heap_id);
    }

    /// Attach a labelled marker to the current tick.
    pub fn record_event(&mut self, label: &str, color: Rgb) {
        self.events.insert(
            self.current_tick,
            Annotation {
                color,
                label: label.to_string(),
            },
        );
    }

    pub fn record_address(&mut self, address: u64, label: &str, color: Rgb) {
        self.addresses.insert(
            address,
            Annotation {
                color,
                label: label.to_string(),
            },
        );
    }

    /// Once any range is recorded, malloc/free records outside every range
    /// are dropped.
    pub fn record_filter_range(&mut self, low: u64, high: u64) {
        self.filter_ranges.push((low, high));
    }

    /// Mark blocks of exactly `size` bytes for the highlight palette.
    pub fn highlight_by_size(&mut self, size: u32) {
        for block in &mut self.blocks {
            block.highlighted = block.size == size;
        }
    }

    pub fn clear_highlight(&mut self) {
        for block in &mut self.blocks {
            block.highlighted = false;
        }
    }

    pub fn current_tick(&self) -> u32 {
        self.current_tick
    }

    pub fn blocks(&self) -> &[HeapBlock] {
        &self.blocks
    }

    pub fn conflicts(&self) -> &[HeapConflict] {
        &self.conflicts
    }

    pub fn live_block_count(&self) -> usize {
        self.live_blocks.len()
    }

    pub fn events(&self) -> &BTreeMap<u32, Annotation> {
        &self.events
    }

    pub fn addresses(&self) -> &BTreeMap<u64, Annotation> {
        &self.addresses
    }

    pub fn filter_ranges(&self) -> &[(u64, u64)] {
        &self.filter_ranges
    }

    pub fn global_extent(&self) -> &GlobalExtent {
        &self.extent
    }

    pub fn minimum_address(&self) -> u64 {
        self.extent.min_address
    }

    pub fn maximum_address(&self) -> u64 {
        self.extent.max_address
    }

    pub fn minimum_tick(&self) -> u32 {
        self.extent.min_tick
    }

    pub fn maximum_tick(&self) -> u32 {
        self.extent.max_tick
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_viewport(&mut self, extent: &GlobalExtent) {
        self.viewport.reset(extent);
    }

    pub fn reset_viewport_to_global(&mut self) {
        self.viewport.reset(&self.extent);
    }

    pub fn pan(&mut self, dx: f64, dy: f64) -> Result<(), ViewportError> {
        self.viewport.pan(dx, dy)
    }

    pub fn zoom_to_point(
        &mut self,
        px: f64,
        py: f64,
        factor_x: f64,
        factor_y: f64,
        max_height: f64,
        max_width: f64,
    ) -> Result<(), ViewportError> {
        self.viewport
            .zoom_to_point(px, py, factor_x, factor_y, max_height, max_width)
    }

    pub fn map_heap_to_display(&self, tick: u32, address: u64) -> (f32, f32) {
        self.viewport.map_heap_to_display(tick, address)
    }

    pub fn map_display_to_heap(&self, x: f64, y: f64) -> Option<(u32, u64)> {
        self.viewport.map_display_to_heap(x, y)
    }
}

impl Default for HeapHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_start_at_one() {
        let mut history = HeapHistory::new();
        history.record_malloc(0x1000, 0x10, "", 0);
        assert_eq!(history.blocks()[0].start_tick, 1);
        assert_eq!(history.current_tick(), 1);
        assert_eq!(history.maximum_tick(), 2);
    }

    #[test]
    fn test_free_at_last_tick_is_recorded() {
        let mut history = HeapHistory::new();
        history.record_malloc(0x1000, 0x10, "", 0);
        history.current_tick = HeapBlock::ALIVE - 2;

        history.record_free(0x1000, "", 0);
        assert_eq!(history.current_tick(), HeapBlock::ALIVE - 1);
        assert!(history.blocks()[0].was_freed());
        assert_eq!(history.blocks()[0].end_tick, HeapBlock::ALIVE - 1);

        // No tick is left; later records are dropped and the block stays live.
        history.record_malloc(0x2000, 0x10, "", 0);
        history.record_free(0x2000, "", 0);
        assert_eq!(history.current_tick(), HeapBlock::ALIVE - 1);
        assert_eq!(history.blocks().len(), 1);
        assert!(history.conflicts().is_empty());
    }

    #[test]
    fn test_tags_are_interned() {
        let mut history = HeapHistory::new();
        history.record_malloc(0x1000, 0x10, "parser", 0);
        history.record_malloc(0x2000, 0x10, "parser", 0);
        let blocks = history.blocks();
        assert!(Rc::ptr_eq(&blocks[0].alloc_tag, &blocks[1].alloc_tag));
    }

    #[test]
    fn test_free_conflict() {
        let mut history = HeapHistory::new();
        history.record_free(0x1000, "", 0);
        assert_eq!(history.conflicts().len(), 1);
        assert_eq!(history.conflicts()[0].kind, ConflictKind::Free);
        assert_eq!(history.conflicts()[0].tick, 1);
        assert!(history.blocks().is_empty());
    }

    #[test]
    fn test_heap_ids_are_separate() {
        let mut history = HeapHistory::new();
        history.record_malloc(0x1000, 0x10, "", 0);
        history.record_malloc(0x1000, 0x10, "", 1);
        assert!(history.conflicts().is_empty());
        assert_eq!(history.live_block_count(), 2);

        history.record_free(0x1000, "", 1);
        assert!(!history.blocks()[0].was_freed());
        assert!(history.blocks()[1].was_freed());
    }

    #[test]
    fn test_filter_drops_but_advances_tick() {
        let mut history = HeapHistory::new();
        history.record_filter_range(0x1000, 0x1FFF);
        history.record_malloc(0x5000, 0x10, "", 0);
        history.record_free(0x5000, "", 0);
        assert!(history.blocks().is_empty());
        assert!(history.conflicts().is_empty());
        assert_eq!(history.current_tick(), 2);

        history.record_malloc(0x1FFF, 0x10, "", 0);
        assert_eq!(history.blocks().len(), 1);
        assert_eq!(history.blocks()[0].start_tick, 3);
    }

    #[test]
    fn test_range_free_only_hits_heap() {
        let mut history = HeapHistory::new();
        history.record_malloc(0x1000, 0x10, "", 0);
        history.record_malloc(0x1100, 0x10, "", 1);
        history.record_malloc(0x1200, 0x10, "", 0);
        history.record_malloc(0x3000, 0x10, "", 0);

        history.record_free_range(0x1000, 0x2000, "arena reset", 0);
        assert_eq!(history.current_tick(), 6);
        assert!(history.blocks()[0].was_freed());
        assert!(!history.blocks()[1].was_freed());
        assert!(history.blocks()[2].was_freed());
        assert!(!history.blocks()[3].was_freed());
        assert_eq!(history.blocks()[2].end_tick, 6);
        assert_eq!(history.blocks()[0].free_tag.as_deref(), Some("arena reset"));

        history.record_free_range(0x2000, 0x1000, "", 0);
        assert_eq!(history.current_tick(), 6);
    }

    #[test]
    fn test_realloc() {
        let mut history = HeapHistory::new();
        history.record_malloc(0x1000, 0x10, "", 0);
        history.record_realloc(0x1000, 0x2000, 0x40, 0);
        assert_eq!(history.current_tick(), 3);
        assert_eq!(history.blocks()[0].end_tick, 2);
        assert_eq!(history.blocks()[0].free_tag.as_deref(), Some(REALLOC_FREE_TAG));
        assert_eq!(history.blocks()[1].start_tick, 3);
        assert_eq!(history.blocks()[1].size, 0x40);
        assert_eq!(&*history.blocks()[1].alloc_tag, REALLOC_MALLOC_TAG);
    }

    #[test]
    fn test_annotations() {
        let mut history = HeapHistory::new();
        history.record_malloc(0x1000, 0x10, "", 0);
        history.record_event("phase 1", Rgb(0xFF0000));
        history.record_address(0x1000, "arena", Rgb::DEFAULT);
        assert_eq!(history.events().get(&1).map(|a| a.label.as_str()), Some("phase 1"));
        assert_eq!(history.addresses()[&0x1000].color, Rgb::DEFAULT);
    }

    #[test]
    fn test_highlight() {
        let mut history = HeapHistory::new();
        history.record_malloc(0x1000, 0x10, "", 0);
        history.record_malloc(0x2000, 0x20, "", 0);
        history.highlight_by_size(0x20);
        assert!(!history.blocks()[0].highlighted);
        assert!(history.blocks()[1].highlighted);
        history.clear_highlight();
        assert!(history.blocks().iter().all(|b| !b.highlighted));
    }

    #[test]
    fn test_extent_tracks_blocks() {
        let mut history = HeapHistory::new();
        history.record_malloc(0x2000, 0x100, "", 0);
        history.record_malloc(0x1000, 0x10, "", 0);
        assert_eq!(history.minimum_address(), 0x1000);
        assert_eq!(history.maximum_address(), 0x2100);
        assert_eq!(history.minimum_tick(), 0);
        history.record_free(0x2000, "", 0);
        assert_eq!(history.maximum_tick(), (3.0 * 1.05 + 1.0) as u32);
    }
}
