//! Linear brightness color scale for heap blocks
//!
//! Blocks allocated later are drawn brighter. Every palette yields a
//! `(base, lighter)` pair so the two triangles of a block get a gradient.

use crate::history::HeapBlock;

pub type Color = [f32; 3];

/// Map `tick ∈ [0, max_tick]` linearly onto `[low, high]`.
pub fn hue_scaled(tick: u32, max_tick: u32, low: f32, high: f32) -> f32 {
    let scaled = if max_tick == 0 {
        0.0
    } else {
        tick as f64 / max_tick as f64
    };
    low + (scaled * (high - low) as f64) as f32
}

/// Green hues for live blocks.
pub fn allocated_colors(tick: u32, max_tick: u32) -> (Color, Color) {
    let value = hue_scaled(tick, max_tick, 0.4, 0.9);
    let lighter = value + 0.1;
    ([0.0, value, 0.0], [0.0, lighter, 0.0])
}

/// Gray hues for freed blocks.
pub fn freed_colors(tick: u32, max_tick: u32) -> (Color, Color) {
    let value = hue_scaled(tick, max_tick, 0.0, 0.7);
    let lighter = value + 0.2;
    ([value, value, value], [lighter, lighter, lighter])
}

/// Yellow hues for highlighted live blocks.
pub fn allocated_highlight_colors(tick: u32, max_tick: u32) -> (Color, Color) {
    let value = hue_scaled(tick, max_tick, 0.4, 0.9);
    let lighter = value + 0.1;
    ([value, value, 0.0], [lighter, lighter, 0.0])
}

/// Red-orange hues for highlighted freed blocks.
pub fn freed_highlight_colors(tick: u32, max_tick: u32) -> (Color, Color) {
    let value = hue_scaled(tick, max_tick, 0.0, 0.6);
    let lighter = value + 0.1;
    ([value + 0.3, value, 0.0], [lighter + 0.3, lighter, 0.0])
}

/// Pick the palette for `block` and scale it by its allocation tick.
pub fn block_colors(block: &HeapBlock, max_tick: u32) -> (Color, Color) {
    match (block.highlighted, block.was_freed()) {
        (false, false) => allocated_colors(block.start_tick, max_tick),
        (false, true) => freed_colors(block.start_tick, max_tick),
        (true, false) => allocated_highlight_colors(block.start_tick, max_tick),
        (true, true) => freed_highlight_colors(block.start_tick, max_tick),
    }
}
