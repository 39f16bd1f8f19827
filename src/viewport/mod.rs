//! The pannable, zoomable window into the heap history
//!
//! - [`extent`]: [`GlobalExtent`], the native bounding box of everything recorded
//! - [`window`]: [`Viewport`], the visible rectangle in fixed-point coordinates
//! - [`shader`]: [`ShaderUniforms`] and the per-vertex projection shared by the
//!   viewport and the rendering layers
//!
//! # Coordinate spaces
//!
//! ```text
//! heap space      (tick: u32, address: u64)
//! window space    (Fixed64 tick, Fixed96 address), 4 fractional bits
//! display space   [-1, 1]², y grows upward
//! screen space    [0, 1]², origin top-left, y grows downward
//! ```
//!
//! Heap → display goes through [`Viewport::map_heap_to_display`]; pointer
//! input (screen space) comes back through [`Viewport::map_display_to_heap`].

pub mod extent;
pub mod shader;
pub mod window;

pub use extent::GlobalExtent;
pub use shader::{project_address, project_position, project_tick, ShaderUniforms};
pub use window::{Axis, Viewport, VisibleBounds};

use crate::fixed::{Fixed64, Fixed96};
use std::fmt;

/// Reasons a viewport update is rejected. The viewport is unchanged whenever
/// one of these is returned.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewportError {
    /// The maximum tick would fall below the minimum tick
    InvertedTickRange { min: Fixed64, max: Fixed64 },

    /// The maximum address would fall below the minimum address
    InvertedAddressRange { min: Fixed96, max: Fixed96 },

    /// Zoom factors must be finite and positive
    InvalidZoomFactor { x: f64, y: f64 },

    /// A pan/zoom argument was NaN or infinite
    NonFiniteInput,

    /// The window would shrink below one whole tick or byte
    DegenerateWindow,
}

impl fmt::Display for ViewportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewportError::InvertedTickRange { min, max } => {
                write!(f, "Invalid tick range: max {} is below min {}", max, min)
            }
            ViewportError::InvertedAddressRange { min, max } => {
                write!(f, "Invalid address range: max {} is below min {}", max, min)
            }
            ViewportError::InvalidZoomFactor { x, y } => {
                write!(f, "Invalid zoom factors ({}, {})", x, y)
            }
            ViewportError::NonFiniteInput => write!(f, "Pan/zoom input is not finite"),
            ViewportError::DegenerateWindow => {
                write!(f, "Window would be smaller than one tick or byte")
            }
        }
    }
}

impl std::error::Error for ViewportError {}
