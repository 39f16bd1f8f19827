//! The four diagram layers

use super::{project_vertex, DiagramLayer, HeapVertex, Primitive, ScreenVertex};
use crate::history::HeapHistory;
use crate::viewport::{project_address, project_tick, ShaderUniforms};

/// Flag on the unused axis: 0 selects the low end of a line, anything else
/// the high end.
fn line_end(flag: u64) -> f32 {
    if flag != 0 {
        1.0
    } else {
        -1.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BlockLayer;

impl DiagramLayer for BlockLayer {
    fn name(&self) -> &'static str {
        "blocks"
    }

    fn primitive(&self) -> Primitive {
        Primitive::Triangles
    }

    fn load_vertices(&self, history: &HeapHistory, all: bool, out: &mut Vec<HeapVertex>) {
        history.heap_block_vertices_for_active_window(all, out);
    }

    fn project(&self, vertex: &HeapVertex, uniforms: &ShaderUniforms) -> ScreenVertex {
        project_vertex(vertex, uniforms)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ActiveRegionLayer;

impl DiagramLayer for ActiveRegionLayer {
    fn name(&self) -> &'static str {
        "active regions"
    }

    fn primitive(&self) -> Primitive {
        Primitive::Triangles
    }

    fn load_vertices(&self, history: &HeapHistory, _all: bool, out: &mut Vec<HeapVertex>) {
        history.active_regions_to_vertices(out);
    }

    fn project(&self, vertex: &HeapVertex, uniforms: &ShaderUniforms) -> ScreenVertex {
        project_vertex(vertex, uniforms)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EventLayer;

impl DiagramLayer for EventLayer {
    fn name(&self) -> &'static str {
        "events"
    }

    fn primitive(&self) -> Primitive {
        Primitive::Lines
    }

    fn load_vertices(&self, history: &HeapHistory, _all: bool, out: &mut Vec<HeapVertex>) {
        history.events_to_vertices(out);
    }

    fn project(&self, vertex: &HeapVertex, uniforms: &ShaderUniforms) -> ScreenVertex {
        ScreenVertex {
            x: project_tick(vertex.tick, uniforms),
            y: line_end(vertex.address),
            color: vertex.color,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AddressLayer;

impl DiagramLayer for AddressLayer {
    fn name(&self) -> &'static str {
        "addresses"
    }

    fn primitive(&self) -> Primitive {
        Primitive::Lines
    }

    fn load_vertices(&self, history: &HeapHistory, _all: bool, out: &mut Vec<HeapVertex>) {
        history.addresses_to_vertices(out);
    }

    fn project(&self, vertex: &HeapVertex, uniforms: &ShaderUniforms) -> ScreenVertex {
        ScreenVertex {
            x: line_end(vertex.tick as u64),
            y: project_address(vertex.address, uniforms),
            color: vertex.color,
        }
    }
}
