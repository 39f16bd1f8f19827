//! Geometry produced from the history for the rendering layers

use super::block::HeapBlock;
use super::recorder::HeapHistory;
use crate::constants::LIVE_BLOCK_TICK_EXTENSION;
use crate::layers::color::{block_colors, Color};
use crate::layers::HeapVertex;
use tracing::trace;

const ACTIVE_REGION_COLOR: Color = [0.0, 0.7, 0.0];

/// Append two triangles covering `[left, right] × [bottom, top]`, lighter
/// on the lower-left and upper-right corners.
fn push_quad(
    out: &mut Vec<HeapVertex>,
    (left, right): (u32, u32),
    (bottom, top): (u64, u64),
    (light, dark): (Color, Color),
) {
    out.push(HeapVertex::new(left, bottom, light));
    out.push(HeapVertex::new(right, bottom, dark));
    out.push(HeapVertex::new(left, top, dark));
    out.push(HeapVertex::new(right, bottom, dark));
    out.push(HeapVertex::new(right, top, light));
    out.push(HeapVertex::new(left, top, dark));
}

impl HeapHistory {
    /// Live blocks are drawn past the end of the log.
    fn live_block_end(&self) -> u32 {
        let end = self.extent.max_tick as f64 * LIVE_BLOCK_TICK_EXTENSION;
        if end >= u32::MAX as f64 {
            u32::MAX - 1
        } else {
            end as u32
        }
    }

    pub fn block_to_vertices(&self, block: &HeapBlock, out: &mut Vec<HeapVertex>) {
        let right = if block.was_freed() {
            block.end_tick
        } else {
            self.live_block_end()
        };
        push_quad(
            out,
            (block.start_tick, right),
            (block.address, block.end_address()),
            block_colors(block, self.extent.max_tick),
        );
    }

    /// Append the geometry of every block worth drawing in the current window
    /// (every block when `all` is set) and return how many blocks that was.
    pub fn heap_block_vertices_for_active_window(
        &self,
        all: bool,
        out: &mut Vec<HeapVertex>,
    ) -> usize {
        let mut count = 0;
        for block in self.active_blocks(all) {
            self.block_to_vertices(block, out);
            count += 1;
        }
        trace!("{} of {} blocks active", count, self.blocks.len());
        count
    }

    /// One rectangle per coalesced active region, spanning every tick.
    pub fn active_regions_to_vertices(&self, out: &mut Vec<HeapVertex>) {
        let (regions, page_size) = self.active_regions();
        trace!("{} regions at granularity {:#x}", regions.len(), page_size);
        for (&start, &end) in regions {
            push_quad(
                out,
                (0, self.extent.max_tick),
                (start, end),
                (ACTIVE_REGION_COLOR, ACTIVE_REGION_COLOR),
            );
        }
    }

    /// A bottom/top vertex pair at each event tick.
    pub fn events_to_vertices(&self, out: &mut Vec<HeapVertex>) {
        for (&tick, event) in &self.events {
            let color = event.color.to_floats();
            out.push(HeapVertex::new(tick, 0, color));
            out.push(HeapVertex::new(tick, 1, color));
        }
    }

    /// A left/right vertex pair at each annotated address.
    pub fn addresses_to_vertices(&self, out: &mut Vec<HeapVertex>) {
        for (&address, annotation) in &self.addresses {
            let color = annotation.color.to_floats();
            out.push(HeapVertex::new(0, address, color));
            out.push(HeapVertex::new(1, address, color));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::Rgb;

    #[test]
    fn test_live_block_extends_past_log() {
        let mut history = HeapHistory::new();
        history.record_malloc(0x1000, 0x20, "", 0);
        history.record_malloc(0x2000, 0x20, "", 0);
        history.record_malloc(0x3000, 0x20, "", 0);
        let mut out = Vec::new();
        history.block_to_vertices(&history.blocks()[0], &mut out);
        assert_eq!(out.len(), 6);

        let max_tick = history.maximum_tick();
        assert_eq!(out[0].tick, 1);
        assert_eq!(out[1].tick, (max_tick as f64 * 1.1) as u32);
        assert_eq!(out[2].address, 0x1020);
        assert_eq!(out[4].color, out[0].color);
    }

    #[test]
    fn test_freed_block_ends_at_free() {
        let mut history = HeapHistory::new();
        history.record_malloc(0x1000, 0x20, "", 0);
        history.record_free(0x1000, "", 0);
        let mut out = Vec::new();
        history.block_to_vertices(&history.blocks()[0], &mut out);
        assert_eq!(out[1].tick, 2);
        assert_eq!(out[4].tick, 2);
    }

    #[test]
    fn test_annotation_vertices() {
        let mut history = HeapHistory::new();
        history.record_malloc(0x1000, 0x20, "", 0);
        history.record_event("e", Rgb(0xFF0000));
        history.record_address(0x1010, "a", Rgb(0x0000FF));

        let mut out = Vec::new();
        history.events_to_vertices(&mut out);
        assert_eq!(out.len(), 2);
        assert_eq!((out[0].tick, out[0].address), (1, 0));
        assert_eq!((out[1].tick, out[1].address), (1, 1));
        assert_eq!(out[0].color, [1.0, 0.0, 0.0]);

        out.clear();
        history.addresses_to_vertices(&mut out);
        assert_eq!((out[0].tick, out[0].address), (0, 0x1010));
        assert_eq!((out[1].tick, out[1].address), (1, 0x1010));
    }
}
