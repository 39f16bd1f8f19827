// Tunable constants for the heap history viewer

/// Ceiling for the high limb of the horizontal window center (raw units).
pub const TICK_CENTER_CEILING: i32 = 0x17;

/// Ceiling for the top limb of the vertical window center (raw units).
pub const ADDRESS_CENTER_CEILING: i32 = 0x17;

/// Bias toward the cursor applied on every zoom step so that repeated zooms
/// converge on the point under the cursor.
pub const ZOOM_EPSILON: f64 = 0.05;

/// Maximum tick distance for the approximate event lookup.
pub const EVENT_SEARCH_WINDOW: u32 = 300;

/// A not-too-intrusive gray for annotations without a color.
pub const DEFAULT_ANNOTATION_COLOR: u32 = 0xB0B0B0;

/// The global extent's maximum tick is kept this much larger than the
/// current tick to leave room on the right-hand side.
pub const TICK_HEADROOM: f64 = 1.05;

/// Live blocks are drawn up to this multiple of the maximum tick.
pub const LIVE_BLOCK_TICK_EXTENSION: f64 = 1.1;

/// log2 of the finest active region granularity (4 KiB pages).
pub const BASE_PAGE_SHIFT: u32 = 12;

/// Active regions target 1/REGION_FRACTION of the height.
pub const REGION_FRACTION: f64 = 100.0;

/// Blocks smaller than 1/VISIBLE_BLOCK_FRACTION of the visible height are
/// culled from the block layer.
pub const VISIBLE_BLOCK_FRACTION: f64 = 1000.0;

/// Tags attached to the two halves of a realloc.
pub const REALLOC_FREE_TAG: &str = "Free'd on reallocation";
pub const REALLOC_MALLOC_TAG: &str = "Reallocated block";
