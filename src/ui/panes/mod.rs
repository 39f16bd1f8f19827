//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`diagram`]: the heap diagram canvas with all four layers
//! - [`details`]: window bounds, history totals and the current selection
//! - [`status`]: status bar with keybindings
//!
//! Each pane module exports a `render_*` function that takes the frame, its
//! area and borrowed render data; panes hold no state of their own.

pub mod details;
pub mod diagram;
pub mod status;

pub use details::{render_details_pane, Selection};
pub use diagram::{render_diagram_pane, DiagramRenderData};
pub use status::render_status_bar;
