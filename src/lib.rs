//! # Introduction
//!
//! heapviz records the malloc/free history of a program and lets you explore
//! it as a two-dimensional diagram: time (ticks) runs left to right, heap
//! addresses bottom to top, and every allocation is a rectangle spanning its
//! lifetime. The diagram is navigated by panning and zooming in a terminal UI
//! built with [ratatui](https://docs.rs/ratatui).
//!
//! ## Pipeline
//!
//! ```text
//! JSON events → HeapHistory → Viewport → Layers → TUI
//! ```
//!
//! 1. [`history`]: the append-only block log, conflict tracking, annotations,
//!    point queries and the JSON loader.
//! 2. [`fixed`]: split-integer fixed-point numbers wide enough to address a
//!    64-bit heap at sub-byte resolution.
//! 3. [`viewport`]: the visible window, pan/zoom, and the heap ↔ display
//!    mappings.
//! 4. [`regions`]: multi-resolution coalesced page maps of where the heap was
//!    ever in use.
//! 5. [`layers`]: per-layer vertex generation and projection.
//! 6. [`ui`]: ratatui-based TUI; not part of the stable library API.
//!
//! Supporting modules: [`constants`] holds the tunables and [`logging`]
//! installs the `tracing` subscriber used by the binary.

pub mod constants;
pub mod fixed;
pub mod history;
pub mod layers;
pub mod logging;
pub mod regions;
pub mod ui;
pub mod viewport;
