//! The visible rectangle of the heap diagram

use super::extent::GlobalExtent;
use super::shader::{project_position, ShaderUniforms};
use super::ViewportError;
use crate::constants::{ADDRESS_CENTER_CEILING, TICK_CENTER_CEILING, ZOOM_EPSILON};
use crate::fixed::{load_address_left_shift4, load_tick_left_shift4, Fixed64, Fixed96};
use tracing::{trace, warn};

/// Smallest window extent a zoom may produce, in raw units (one tick/byte).
const MIN_EXTENT_RAW: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Tick,
    Address,
}

/// Integral heap-space rectangle covered by the viewport, clipped to the
/// representable tick and address range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleBounds {
    pub min_tick: u32,
    pub max_tick: u32,
    pub min_address: u64,
    pub max_address: u64,
}

/// The currently visible window in fixed-point coordinates.
///
/// `max_tick >= min_tick` and `max_address >= min_address` hold at all times;
/// every mutator validates the new bounds before committing any of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    min_tick: Fixed64,
    max_tick: Fixed64,
    min_address: Fixed96,
    max_address: Fixed96,
    max_width: Fixed64,
    max_height: Fixed96,
}

impl Viewport {
    /// Create a viewport from fixed-point bounds. The maximum extents start
    /// out as the window's own size.
    pub fn new(
        min_tick: Fixed64,
        max_tick: Fixed64,
        min_address: Fixed96,
        max_address: Fixed96,
    ) -> Result<Self, ViewportError> {
        validate(min_tick, max_tick, min_address, max_address)?;
        Ok(Viewport {
            min_tick,
            max_tick,
            min_address,
            max_address,
            max_width: max_tick - min_tick,
            max_height: max_address - min_address,
        })
    }

    /// A viewport covering `extent` (or a minimal window if it is empty).
    pub fn from_extent(extent: &GlobalExtent) -> Self {
        let mut viewport = Viewport {
            min_tick: Fixed64::ZERO,
            max_tick: Fixed64::ZERO,
            min_address: Fixed96::ZERO,
            max_address: Fixed96::ZERO,
            max_width: Fixed64::ZERO,
            max_height: Fixed96::ZERO,
        };
        viewport.reset(extent);
        viewport
    }

    /// Load the bounds from a native extent and record it as the maximum
    /// pannable/zoomable extent.
    pub fn reset(&mut self, extent: &GlobalExtent) {
        let extent = extent.display_bounds();
        let max_tick = extent.max_tick.max(extent.min_tick);
        let max_address = extent.max_address.max(extent.min_address);

        self.min_tick = load_tick_left_shift4(extent.min_tick);
        self.max_tick = load_tick_left_shift4(max_tick);
        self.min_address = load_address(extent.min_address);
        self.max_address = load_address(max_address);
        self.max_width = self.max_tick - self.min_tick;
        self.max_height = self.max_address - self.min_address;
        trace!(
            "viewport reset to ticks {}..{} addresses {:#x}..{:#x}",
            extent.min_tick,
            max_tick,
            extent.min_address,
            max_address
        );
    }

    pub fn min_tick(&self) -> Fixed64 {
        self.min_tick
    }

    pub fn max_tick(&self) -> Fixed64 {
        self.max_tick
    }

    pub fn min_address(&self) -> Fixed96 {
        self.min_address
    }

    pub fn max_address(&self) -> Fixed96 {
        self.max_address
    }

    pub fn set_tick_range(&mut self, min: Fixed64, max: Fixed64) -> Result<(), ViewportError> {
        self.commit(min, max, self.min_address, self.max_address)
    }

    pub fn set_address_range(&mut self, min: Fixed96, max: Fixed96) -> Result<(), ViewportError> {
        self.commit(self.min_tick, self.max_tick, min, max)
    }

    /// Current width in raw (left-shifted) units.
    pub fn width_raw(&self) -> f64 {
        (self.max_tick - self.min_tick).to_raw_f64()
    }

    /// Current height in raw (left-shifted) units.
    pub fn height_raw(&self) -> f64 {
        (self.max_address - self.min_address).to_raw_f64()
    }

    /// The extent recorded by the last reset as `(height, width)` in raw units.
    pub fn max_extents(&self) -> (f64, f64) {
        (self.max_height.to_raw_f64(), self.max_width.to_raw_f64())
    }

    /// Shift the window by a fraction of its current size on each axis.
    pub fn pan(&mut self, dx: f64, dy: f64) -> Result<(), ViewportError> {
        if !dx.is_finite() || !dy.is_finite() {
            return Err(ViewportError::NonFiniteInput);
        }
        let pan_x = Fixed64::from_raw_f64(dx * self.width_raw());
        let pan_y = Fixed96::from_raw_f64(dy * self.height_raw());

        let (min_tick, max_tick) =
            clamp_horizontal_center(self.min_tick + pan_x, self.max_tick + pan_x);
        let (min_address, max_address) =
            clamp_vertical_center(self.min_address + pan_y, self.max_address + pan_y);
        trace!("pan by ({}, {})", dx, dy);
        self.commit(min_tick, max_tick, min_address, max_address)
    }

    /// Scale the window by `factor_x`/`factor_y` while keeping the point at
    /// screen fraction `(px, py)` (origin top-left) under the cursor.
    ///
    /// The target size is capped at `max_height` / `max_width` raw units and
    /// at the extent recorded by the last reset. An axis that would shrink
    /// below one tick or one byte keeps its current size; if no axis can
    /// shrink the zoom is rejected with [`ViewportError::DegenerateWindow`].
    pub fn zoom_to_point(
        &mut self,
        px: f64,
        py: f64,
        factor_x: f64,
        factor_y: f64,
        max_height: f64,
        max_width: f64,
    ) -> Result<(), ViewportError> {
        if !(factor_x.is_finite() && factor_x > 0.0 && factor_y.is_finite() && factor_y > 0.0) {
            return Err(ViewportError::InvalidZoomFactor {
                x: factor_x,
                y: factor_y,
            });
        }
        if ![px, py, max_height, max_width].iter().all(|v| v.is_finite()) {
            return Err(ViewportError::NonFiniteInput);
        }

        let width = self.width_raw();
        let height = self.height_raw();
        let (max_recorded_height, max_recorded_width) = self.max_extents();
        let target_width = zoom_target(width, factor_x, max_width.min(max_recorded_width));
        let target_height = zoom_target(height, factor_y, max_height.min(max_recorded_height));
        let unchanged = target_width == width && target_height == height;
        if unchanged && (factor_x < 1.0 || factor_y < 1.0) {
            return Err(ViewportError::DegenerateWindow);
        }
        let extra_width = target_width - width;
        let extra_height = target_height - height;

        let px = bias_toward_cursor(px);
        let py = bias_toward_cursor(py);

        let left = Fixed64::from_raw_f64(px * extra_width);
        let right = Fixed64::from_raw_f64((1.0 - px) * extra_width);
        let top = Fixed96::from_raw_f64(py * extra_height);
        let bottom = Fixed96::from_raw_f64((1.0 - py) * extra_height);

        let (min_tick, max_tick) =
            clamp_horizontal_center(self.min_tick - left, self.max_tick + right);
        let (min_address, max_address) =
            clamp_vertical_center(self.min_address - bottom, self.max_address + top);
        trace!(
            "zoom by ({}, {}) toward ({}, {})",
            factor_x,
            factor_y,
            px,
            py
        );
        self.commit(min_tick, max_tick, min_address, max_address)
    }

    /// The per-frame values consumed by [`project_position`].
    pub fn uniforms(&self) -> ShaderUniforms {
        ShaderUniforms {
            tick_base: self.min_tick,
            heap_base: self.min_address,
            scale_x: self.x_scale() as f32,
            scale_y: self.y_scale() as f32,
        }
    }

    /// Map a heap coordinate into display space `[-1, 1]²`.
    pub fn map_heap_to_display(&self, tick: u32, address: u64) -> (f32, f32) {
        project_position(tick, address, &self.uniforms())
    }

    /// Map a screen fraction (origin top-left, `[0, 1]²` inside the window)
    /// back to a heap coordinate.
    ///
    /// Returns `None` when the result would be a negative or unrepresentable
    /// tick/address.
    pub fn map_display_to_heap(&self, x: f64, y: f64) -> Option<(u32, u64)> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let relative_x = x * self.width_raw();
        let relative_y = (1.0 - y) * self.height_raw();

        let tick = Fixed64::from_raw_f64(relative_x) + self.min_tick;
        let address = Fixed96::from_raw_f64(relative_y) + self.min_address;
        if tick.is_negative() || tick.hi > 0xF {
            return None;
        }
        if address.is_negative() || address.hi > 0xF {
            return None;
        }
        Some((tick.to_tick_saturating(), address.to_address_saturating()))
    }

    pub fn scaling_factor(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Tick => self.x_scale(),
            Axis::Address => self.y_scale(),
        }
    }

    /// `sqrt(1 / width)` in raw units.
    pub fn x_scale(&self) -> f64 {
        let width = (self.max_tick - self.min_tick).to_bits().max(1);
        (1.0 / width as f64).sqrt()
    }

    /// `sqrt(1 / height)` in raw units. Heights wider than 64 bits are shifted
    /// down by the top limb's bit length first.
    pub fn y_scale(&self) -> f64 {
        let height = self.max_address - self.min_address;
        let upper = height.upper_bits();
        if upper == 0 {
            let low = height.low_bits().max(1);
            return (1.0 / low as f64).sqrt();
        }
        let high_bit = 32 - upper.leading_zeros();
        let shifted = (height.low_bits() >> high_bit) | ((upper as u64) << (64 - high_bit));
        let factor = (1.0 / shifted as f64) * (1.0 / (1u64 << high_bit) as f64);
        factor.sqrt()
    }

    /// The integral heap rectangle currently visible.
    pub fn visible_bounds(&self) -> VisibleBounds {
        VisibleBounds {
            min_tick: self.min_tick.to_tick_saturating(),
            max_tick: self.max_tick.to_tick_saturating(),
            min_address: self.min_address.to_address_saturating(),
            max_address: self.max_address.to_address_saturating(),
        }
    }

    fn commit(
        &mut self,
        min_tick: Fixed64,
        max_tick: Fixed64,
        min_address: Fixed96,
        max_address: Fixed96,
    ) -> Result<(), ViewportError> {
        if let Err(err) = validate(min_tick, max_tick, min_address, max_address) {
            warn!("rejected viewport update: {}", err);
            return Err(err);
        }
        self.min_tick = min_tick;
        self.max_tick = max_tick;
        self.min_address = min_address;
        self.max_address = max_address;
        Ok(())
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport::from_extent(&GlobalExtent::empty())
    }
}

fn load_address(address: u64) -> Fixed96 {
    load_address_left_shift4(address as u32, (address >> 32) as u32)
}

fn validate(
    min_tick: Fixed64,
    max_tick: Fixed64,
    min_address: Fixed96,
    max_address: Fixed96,
) -> Result<(), ViewportError> {
    if (max_tick - min_tick).is_negative() {
        return Err(ViewportError::InvertedTickRange {
            min: min_tick,
            max: max_tick,
        });
    }
    if (max_address - min_address).is_negative() {
        return Err(ViewportError::InvertedAddressRange {
            min: min_address,
            max: max_address,
        });
    }
    Ok(())
}

/// New extent for one axis, or the current one when shrinking it would drop
/// below [`MIN_EXTENT_RAW`].
fn zoom_target(current: f64, factor: f64, cap: f64) -> f64 {
    let target = (current * factor).min(cap);
    if target < MIN_EXTENT_RAW && target < current {
        return current;
    }
    target
}

fn bias_toward_cursor(fraction: f64) -> f64 {
    if fraction > 0.5 {
        fraction + ZOOM_EPSILON
    } else {
        fraction - ZOOM_EPSILON
    }
}

/// Keep the horizontal center between tick 0 and the ceiling; the window
/// width is preserved when a bound has to move.
fn clamp_horizontal_center(min: Fixed64, max: Fixed64) -> (Fixed64, Fixed64) {
    let half = (max - min).to_raw_f64() / 2.0;
    let half_fixed = Fixed64::from_raw_f64(half);
    let center = min + half_fixed;

    if center.hi < 0 {
        (Fixed64::from_raw_f64(-half), Fixed64::from_raw_f64(half))
    } else if center.hi > TICK_CENTER_CEILING {
        let ceiling = Fixed64::new(0, TICK_CENTER_CEILING);
        (ceiling - half_fixed, ceiling + half_fixed)
    } else {
        (min, max)
    }
}

fn clamp_vertical_center(min: Fixed96, max: Fixed96) -> (Fixed96, Fixed96) {
    let half = (max - min).to_raw_f64() / 2.0;
    let half_fixed = Fixed96::from_raw_f64(half);
    let center = min + half_fixed;

    if center.hi < 0 {
        (Fixed96::from_raw_f64(-half), Fixed96::from_raw_f64(half))
    } else if center.hi > ADDRESS_CENTER_CEILING {
        let ceiling = Fixed96::new(0, 0, ADDRESS_CENTER_CEILING);
        (ceiling - half_fixed, ceiling + half_fixed)
    } else {
        (min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(min_tick: u32, max_tick: u32, min_address: u64, max_address: u64) -> Viewport {
        Viewport::from_extent(&GlobalExtent::new(min_address, max_address, min_tick, max_tick))
    }

    #[test]
    fn test_reset_loads_shifted_bounds() {
        let viewport = window(0, 100, 0x1000, 0x2000);
        assert_eq!(viewport.min_tick(), Fixed64::ZERO);
        assert_eq!(viewport.max_tick(), Fixed64::new(100 << 4, 0));
        assert_eq!(viewport.width_raw(), 1600.0);
        assert_eq!(viewport.height_raw(), (0x1000 << 4) as f64);
        assert_eq!(viewport.max_extents(), ((0x1000 << 4) as f64, 1600.0));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut viewport = window(0, 100, 0x1000, 0x2000);
        let before = viewport.clone();

        let result = viewport.set_tick_range(Fixed64::from_f64(50.0), Fixed64::from_f64(10.0));
        assert!(matches!(result, Err(ViewportError::InvertedTickRange { .. })));
        assert_eq!(viewport, before);

        let result = viewport.set_address_range(Fixed96::from_f64(10.0), Fixed96::ZERO);
        assert!(matches!(result, Err(ViewportError::InvertedAddressRange { .. })));
        assert_eq!(viewport, before);
    }

    #[test]
    fn test_negative_minimum_allowed() {
        let mut viewport = window(0, 100, 0, 0x1000);
        assert!(viewport
            .set_tick_range(Fixed64::from_f64(-50.0), Fixed64::from_f64(50.0))
            .is_ok());
        assert_eq!(viewport.min_tick().to_f64(), -50.0);
    }

    #[test]
    fn test_pan_keeps_size() {
        let mut viewport = window(0, 1000, 0x10000, 0x20000);
        let width = viewport.width_raw();
        let height = viewport.height_raw();
        viewport.pan(0.25, -0.5).unwrap();
        assert_eq!(viewport.width_raw(), width);
        assert_eq!(viewport.height_raw(), height);
        assert_eq!(viewport.min_tick().to_f64(), 250.0);
        assert_eq!(viewport.min_address().to_f64(), (0x10000 - 0x8000) as f64);
    }

    #[test]
    fn test_pan_clamps_center_at_origin() {
        let mut viewport = window(0, 1000, 0, 0x1000);
        viewport.pan(-5.0, 0.0).unwrap();
        assert_eq!(viewport.min_tick().to_f64(), -500.0);
        assert_eq!(viewport.max_tick().to_f64(), 500.0);
        assert_eq!(viewport.width_raw(), 16000.0);
    }

    #[test]
    fn test_pan_clamps_center_at_ceiling() {
        let mut viewport = window(0, 1000, 0, 0x1000);
        viewport.pan(1e9, 0.0).unwrap();
        let center = viewport.min_tick() + Fixed64::from_raw_f64(viewport.width_raw() / 2.0);
        assert_eq!(center, Fixed64::new(0, TICK_CENTER_CEILING));
        assert_eq!(viewport.width_raw(), 16000.0);
    }

    #[test]
    fn test_pan_rejects_nan() {
        let mut viewport = window(0, 1000, 0, 0x1000);
        let before = viewport.clone();
        assert_eq!(viewport.pan(f64::NAN, 0.0), Err(ViewportError::NonFiniteInput));
        assert_eq!(viewport, before);
    }

    #[test]
    fn test_zoom_in_respects_cursor() {
        let mut viewport = window(0, 1000, 0, 0x10000);
        let (max_height, max_width) = viewport.max_extents();
        viewport
            .zoom_to_point(0.5, 0.5, 0.5, 0.5, max_height, max_width)
            .unwrap();
        assert_eq!(viewport.width_raw(), 8000.0);
        // A centered cursor is biased left/down by the epsilon.
        assert_eq!(viewport.min_tick().to_raw_f64(), 3600.0);
        assert_eq!(viewport.max_tick().to_raw_f64(), 11600.0);
    }

    #[test]
    fn test_zoom_out_capped() {
        let mut viewport = window(0, 1000, 0, 0x10000);
        let (max_height, max_width) = viewport.max_extents();
        viewport
            .zoom_to_point(0.2, 0.8, 4.0, 4.0, max_height, max_width)
            .unwrap();
        assert_eq!(viewport.width_raw(), max_width);
        assert_eq!(viewport.height_raw(), max_height);
    }

    #[test]
    fn test_zoom_rejects_bad_factor() {
        let mut viewport = window(0, 1000, 0, 0x10000);
        let before = viewport.clone();
        assert!(viewport.zoom_to_point(0.5, 0.5, 0.0, 1.0, 1e9, 1e9).is_err());
        assert!(viewport
            .zoom_to_point(0.5, 0.5, f64::INFINITY, 1.0, 1e9, 1e9)
            .is_err());
        assert_eq!(
            viewport.zoom_to_point(0.5, 0.5, 1e-9, 1.0, 1e9, 1e9),
            Err(ViewportError::DegenerateWindow)
        );
        assert_eq!(viewport, before);
    }

    #[test]
    fn test_display_round_trip() {
        let viewport = window(0, 1000, 0x10000, 0x20000);
        assert_eq!(viewport.map_display_to_heap(0.0, 1.0), Some((0, 0x10000)));
        assert_eq!(viewport.map_display_to_heap(0.5, 0.5), Some((500, 0x18000)));
        assert_eq!(viewport.map_display_to_heap(1.0, 0.0), Some((1000, 0x20000)));
        assert_eq!(viewport.map_display_to_heap(f64::NAN, 0.0), None);
    }

    #[test]
    fn test_display_to_heap_rejects_negative() {
        let viewport = window(0, 1000, 0, 0x1000);
        assert_eq!(viewport.map_display_to_heap(-0.5, 0.5), None);
        assert_eq!(viewport.map_display_to_heap(0.5, 1.5), None);
    }

    #[test]
    fn test_scaling_factors() {
        let viewport = window(0, 4, 0, 16);
        assert_eq!(viewport.x_scale(), 0.125);
        assert_eq!(viewport.y_scale(), 0.0625);
        assert_eq!(viewport.scaling_factor(Axis::Address), viewport.y_scale());
    }

    #[test]
    fn test_tall_window_scale() {
        let viewport = window(0, 1, 0, u64::MAX);
        let expected = (1.0 / (u64::MAX as f64 * 16.0)).sqrt();
        assert!((viewport.y_scale() - expected).abs() / expected < 1e-9);
    }

    #[test]
    fn test_visible_bounds_clip_negative() {
        let mut viewport = window(0, 1000, 0, 0x1000);
        viewport.pan(-5.0, 0.0).unwrap();
        let bounds = viewport.visible_bounds();
        assert_eq!(bounds.min_tick, 0);
        assert_eq!(bounds.max_tick, 500);
    }
}
