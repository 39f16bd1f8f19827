//! Per-vertex projection from heap space into display space
//!
//! This is the host-side reference for the vertex stage: it only uses the
//! limb arithmetic from [`crate::fixed`] and 32-bit floats, so a shader port
//! can be checked against it vertex by vertex.

use crate::fixed::{
    load_address_left_shift4, load_tick_left_shift4, mul_float64, mul_float96, sub64, sub96,
    Fixed64, Fixed96,
};

/// The per-frame values a vertex stage needs.
///
/// `scale_x` / `scale_y` hold the square roots of the heap-to-screen scale;
/// each is applied twice so that neither multiplication collapses to zero for
/// very tall or very wide windows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderUniforms {
    pub tick_base: Fixed64,
    pub heap_base: Fixed96,
    pub scale_x: f32,
    pub scale_y: f32,
}

/// Horizontal display coordinate of a tick.
pub fn project_tick(tick: u32, uniforms: &ShaderUniforms) -> f32 {
    let tick = load_tick_left_shift4(tick);
    let translated = sub64(tick, uniforms.tick_base);
    let scaled = mul_float64(translated, uniforms.scale_x) * uniforms.scale_x;
    2.0 * scaled - 1.0
}

/// Vertical display coordinate of an address.
pub fn project_address(address: u64, uniforms: &ShaderUniforms) -> f32 {
    let address = load_address_left_shift4(address as u32, (address >> 32) as u32);
    let translated = sub96(address, uniforms.heap_base);
    let scaled = mul_float96(translated, uniforms.scale_y) * uniforms.scale_y;
    2.0 * scaled - 1.0
}

pub fn project_position(tick: u32, address: u64, uniforms: &ShaderUniforms) -> (f32, f32) {
    (
        project_tick(tick, uniforms),
        project_address(address, uniforms),
    )
}
