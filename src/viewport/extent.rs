//! Native bounding box of the recorded heap history

use crate::constants::TICK_HEADROOM;

/// Running bounding box `{min_address, max_address, min_tick, max_tick}`.
///
/// Grows monotonically while blocks are recorded. A fresh extent is "empty":
/// its minimum address sits above its maximum address until the first block
/// arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalExtent {
    pub min_address: u64,
    pub max_address: u64,
    pub min_tick: u32,
    pub max_tick: u32,
}

impl GlobalExtent {
    pub const fn new(min_address: u64, max_address: u64, min_tick: u32, max_tick: u32) -> Self {
        GlobalExtent {
            min_address,
            max_address,
            min_tick,
            max_tick,
        }
    }

    pub const fn empty() -> Self {
        GlobalExtent::new(u64::MAX, 0, 0, 1)
    }

    pub fn is_empty(&self) -> bool {
        self.min_address > self.max_address
    }

    pub fn height(&self) -> u64 {
        self.max_address.saturating_sub(self.min_address)
    }

    /// Grow the address range to cover `[address, address + size]`.
    pub fn include_block(&mut self, address: u64, size: u32) {
        let end = address.saturating_add(size as u64);
        self.max_address = self.max_address.max(end);
        self.min_address = self.min_address.min(address);
        self.min_tick = 0;
    }

    /// Keep the maximum tick a few percent ahead of `tick`.
    pub fn extend_to_tick(&mut self, tick: u32) {
        let padded = tick as f64 * TICK_HEADROOM + 1.0;
        self.max_tick = if padded >= u32::MAX as f64 {
            u32::MAX
        } else {
            padded as u32
        };
    }

    /// The extent a viewport can be reset to; an empty extent becomes a
    /// minimal window at the origin.
    pub fn display_bounds(&self) -> GlobalExtent {
        if self.is_empty() {
            GlobalExtent::new(0, 1, self.min_tick, self.max_tick.max(self.min_tick + 1))
        } else {
            *self
        }
    }
}

impl Default for GlobalExtent {
    fn default() -> Self {
        Self::empty()
    }
}
