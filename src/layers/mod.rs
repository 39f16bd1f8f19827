//! Render-ready geometry for the heap diagram
//!
//! Each layer turns the history into a flat vertex list and knows how its
//! vertex stage projects one vertex into display space:
//! - [`BlockLayer`]: two triangles per heap block
//! - [`ActiveRegionLayer`]: two triangles per coalesced active region
//! - [`EventLayer`]: one vertical line per tick annotation
//! - [`AddressLayer`]: one horizontal line per address annotation
//!
//! A [`LayerBuffer`] owns the vertices of one layer; nothing is shared
//! between buffers, so several diagrams can coexist.

pub mod color;
pub mod kinds;

pub use kinds::{ActiveRegionLayer, AddressLayer, BlockLayer, EventLayer};

use crate::history::HeapHistory;
use crate::viewport::{project_position, ShaderUniforms};

/// A vertex in heap space. Event and address layers use the unused axis as
/// a 0/1 flag selecting the bottom/top (left/right) end of their line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeapVertex {
    pub tick: u32,
    pub address: u64,
    pub color: [f32; 3],
}

impl HeapVertex {
    pub fn new(tick: u32, address: u64, color: [f32; 3]) -> Self {
        HeapVertex {
            tick,
            address,
            color,
        }
    }
}

/// A vertex after projection into display space `[-1, 1]²`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenVertex {
    pub x: f32,
    pub y: f32,
    pub color: [f32; 3],
}

/// How consecutive vertices are assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// Every 3 vertices form a triangle
    Triangles,
    /// Every 2 vertices form a line segment
    Lines,
}

impl Primitive {
    pub fn vertices_per_item(self) -> usize {
        match self {
            Primitive::Triangles => 3,
            Primitive::Lines => 2,
        }
    }
}

pub trait DiagramLayer {
    fn name(&self) -> &'static str;

    fn primitive(&self) -> Primitive;

    /// Append this layer's vertices for the current window to `out`.
    fn load_vertices(&self, history: &HeapHistory, all: bool, out: &mut Vec<HeapVertex>);

    /// Host-side copy of the layer's vertex stage.
    fn project(&self, vertex: &HeapVertex, uniforms: &ShaderUniforms) -> ScreenVertex;
}

/// The full vertex transform used by the block and region layers.
pub fn project_vertex(vertex: &HeapVertex, uniforms: &ShaderUniforms) -> ScreenVertex {
    let (x, y) = project_position(vertex.tick, vertex.address, uniforms);
    ScreenVertex {
        x,
        y,
        color: vertex.color,
    }
}

/// One layer plus the vertex buffer it owns.
#[derive(Debug, Clone)]
pub struct LayerBuffer<L: DiagramLayer> {
    layer: L,
    vertices: Vec<HeapVertex>,
}

impl<L: DiagramLayer> LayerBuffer<L> {
    pub fn new(layer: L) -> Self {
        LayerBuffer {
            layer,
            vertices: Vec::new(),
        }
    }

    pub fn layer(&self) -> &L {
        &self.layer
    }

    /// Replace the buffer contents with the layer's current geometry.
    pub fn refresh(&mut self, history: &HeapHistory, all: bool) {
        self.vertices.clear();
        self.layer.load_vertices(history, all, &mut self.vertices);
    }

    pub fn vertices(&self) -> &[HeapVertex] {
        &self.vertices
    }

    pub fn projected<'a>(
        &'a self,
        uniforms: &'a ShaderUniforms,
    ) -> impl Iterator<Item = ScreenVertex> + 'a {
        self.vertices
            .iter()
            .map(move |vertex| self.layer.project(vertex, uniforms))
    }

    /// Number of triangles or lines in the buffer.
    pub fn item_count(&self) -> usize {
        self.vertices.len() / self.layer.primitive().vertices_per_item()
    }
}
