// Viewport mapping and navigation through the public API

use heapviz::fixed::{Fixed64, Fixed96};
use heapviz::viewport::{GlobalExtent, Viewport, ViewportError};

const TOLERANCE: f32 = 1e-4;

fn assert_close(actual: (f32, f32), expected: (f32, f32)) {
    assert!(
        (actual.0 - expected.0).abs() < TOLERANCE && (actual.1 - expected.1).abs() < TOLERANCE,
        "expected {:?}, got {:?}",
        expected,
        actual
    );
}

fn window(min_tick: u32, max_tick: u32, min_address: u64, max_address: u64) -> Viewport {
    Viewport::from_extent(&GlobalExtent::new(
        min_address,
        max_address,
        min_tick,
        max_tick,
    ))
}

#[test]
fn test_full_address_space_corners() {
    let viewport = window(0, u32::MAX, 0, u64::MAX);

    assert_close(viewport.map_heap_to_display(0, 0), (-1.0, -1.0));
    assert_close(viewport.map_heap_to_display(u32::MAX, u64::MAX), (1.0, 1.0));
    assert_close(
        viewport.map_heap_to_display(u32::MAX / 2, u64::MAX / 2),
        (0.0, 0.0),
    );
}

#[test]
fn test_small_window_corners() {
    let viewport = window(100, 200, 0x7fff_0000_0000, 0x7fff_0000_1000);

    assert_close(viewport.map_heap_to_display(100, 0x7fff_0000_0000), (-1.0, -1.0));
    assert_close(viewport.map_heap_to_display(200, 0x7fff_0000_1000), (1.0, 1.0));
    assert_close(viewport.map_heap_to_display(150, 0x7fff_0000_0800), (0.0, 0.0));
}

#[test]
fn test_origin_centered_window() {
    let mut viewport = window(0, 100, 0, 0x1000);
    viewport
        .set_tick_range(Fixed64::from_f64(-50.0), Fixed64::from_f64(50.0))
        .expect("negative minimum is a valid window");
    viewport
        .set_address_range(Fixed96::from_f64(-2048.0), Fixed96::from_f64(2048.0))
        .expect("negative minimum is a valid window");

    assert_close(viewport.map_heap_to_display(0, 0), (0.0, 0.0));
    assert_close(viewport.map_heap_to_display(50, 0x800), (1.0, 1.0));

    assert_eq!(viewport.map_display_to_heap(0.1, 0.5), None);
    assert_eq!(viewport.map_display_to_heap(0.5, 0.9), None);
    assert_eq!(viewport.map_display_to_heap(0.75, 0.25), Some((25, 0x400)));
}

#[test]
fn test_rejected_updates_leave_window_unchanged() {
    let mut viewport = window(0, 100, 0x1000, 0x2000);
    let before = viewport.clone();

    let result = viewport.set_address_range(Fixed96::from_f64(0x2000 as f64), Fixed96::ZERO);
    assert!(matches!(result, Err(ViewportError::InvertedAddressRange { .. })));

    let result = viewport.pan(f64::INFINITY, 0.0);
    assert_eq!(result, Err(ViewportError::NonFiniteInput));

    let (max_height, max_width) = viewport.max_extents();
    let result = viewport.zoom_to_point(0.5, 0.5, 0.0, 1.0, max_height, max_width);
    assert!(matches!(result, Err(ViewportError::InvalidZoomFactor { .. })));

    let result = viewport.zoom_to_point(0.5, 0.5, 1e-9, 1e-9, max_height, max_width);
    assert_eq!(result, Err(ViewportError::DegenerateWindow));

    assert_eq!(viewport, before);
}

#[test]
fn test_zoom_in_then_out_is_capped() {
    let mut viewport = window(0, 1000, 0x10000, 0x20000);
    let (max_height, max_width) = viewport.max_extents();
    let (cap_height, cap_width) = (max_height * 1.5, max_width * 1.5);

    viewport
        .zoom_to_point(0.25, 0.75, 0.5, 0.5, cap_height, cap_width)
        .expect("zoom in");
    assert!((viewport.width_raw() - max_width * 0.5).abs() <= 2.0);
    assert!((viewport.height_raw() - max_height * 0.5).abs() <= 2.0);

    for _ in 0..10 {
        viewport
            .zoom_to_point(0.5, 0.5, 4.0, 4.0, cap_height, cap_width)
            .expect("zoom out");
    }
    assert!((viewport.width_raw() - max_width).abs() <= 2.0);
    assert!((viewport.height_raw() - max_height).abs() <= 2.0);
}

#[test]
fn test_zoom_out_stops_at_reset_extent() {
    let mut viewport = window(0, 100, 0x1000, 0x2000);
    let (max_height, max_width) = viewport.max_extents();

    viewport
        .zoom_to_point(0.5, 0.5, 4.0, 4.0, 1e30, 1e30)
        .expect("zoom out");
    assert_eq!(viewport.width_raw(), max_width);
    assert_eq!(viewport.height_raw(), max_height);

    // A tighter caller cap still wins.
    viewport
        .zoom_to_point(0.5, 0.5, 1.0, 1.0, max_height, max_width / 2.0)
        .expect("shrink to caller cap");
    assert!((viewport.width_raw() - max_width / 2.0).abs() <= 2.0);
}

#[test]
fn test_degenerate_axis_keeps_its_extent() {
    let mut viewport = window(0, 1000, 0x1000, 0x1000);
    assert_eq!(viewport.height_raw(), 0.0);
    let width = viewport.width_raw();

    viewport
        .zoom_to_point(0.5, 0.5, 0.5, 0.5, 1e30, 1e30)
        .expect("tick axis can still shrink");
    assert!((viewport.width_raw() - width * 0.5).abs() <= 2.0);
    assert_eq!(viewport.height_raw(), 0.0);

    let before = viewport.clone();
    let result = viewport.zoom_to_point(0.5, 0.5, 1.0, 0.5, 1e30, 1e30);
    assert_eq!(result, Err(ViewportError::DegenerateWindow));
    assert_eq!(viewport, before);
}

#[test]
fn test_zoom_keeps_cursor_side() {
    let mut viewport = window(0, 1000, 0, 0x10000);
    let (max_height, max_width) = viewport.max_extents();

    viewport
        .zoom_to_point(0.9, 0.5, 0.5, 1.0, max_height, max_width)
        .expect("zoom in");

    // The right edge moves much less than the left edge.
    let left_moved = viewport.min_tick().to_f64();
    let right_moved = 1000.0 - viewport.max_tick().to_f64();
    assert!(left_moved > right_moved * 5.0);
}

#[test]
fn test_pan_past_origin_is_clamped() {
    let mut viewport = window(0, 100, 0x1000, 0x2000);
    let width = viewport.width_raw();

    viewport.pan(-10.0, 0.0).expect("pan left");
    assert!((viewport.width_raw() - width).abs() <= 2.0);
    assert!(viewport.min_tick().is_negative());

    let (x, _) = viewport.map_heap_to_display(0, 0x1000);
    assert!(x.abs() < 0.01);
}
