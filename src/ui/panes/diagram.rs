//! The heap diagram itself, drawn on a braille canvas
//!
//! The canvas spans display space `[-1, 1]²`, so projected layer vertices can
//! be painted without further transformation. Axis-aligned quads are drawn as
//! rectangle outlines; anything far outside the canvas is clamped so the
//! canvas never has to rasterize huge shapes.

use crate::layers::{
    ActiveRegionLayer, AddressLayer, BlockLayer, DiagramLayer, EventLayer, LayerBuffer,
    ScreenVertex,
};
use crate::ui::theme::{color_from_floats, DEFAULT_THEME};
use crate::viewport::ShaderUniforms;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Context, Line, Points, Rectangle},
        Block, Borders,
    },
    Frame,
};

const CLAMP: f64 = 2.0;

/// Everything the diagram pane draws, in back-to-front order.
pub struct DiagramRenderData<'a> {
    pub regions: &'a LayerBuffer<ActiveRegionLayer>,
    pub blocks: &'a LayerBuffer<BlockLayer>,
    pub events: &'a LayerBuffer<EventLayer>,
    pub addresses: &'a LayerBuffer<AddressLayer>,
    pub uniforms: ShaderUniforms,
    /// Display-space position of the last click
    pub cursor: Option<(f64, f64)>,
    pub title: String,
}

fn clamp(value: f32) -> f64 {
    (value as f64).clamp(-CLAMP, CLAMP)
}

/// Paint every 6-vertex quad as the bounding rectangle of its vertices.
fn paint_quads(ctx: &mut Context<'_>, vertices: &[ScreenVertex]) {
    for quad in vertices.chunks_exact(6) {
        let (mut min_x, mut min_y) = (f64::MAX, f64::MAX);
        let (mut max_x, mut max_y) = (f64::MIN, f64::MIN);
        for vertex in quad {
            min_x = min_x.min(clamp(vertex.x));
            max_x = max_x.max(clamp(vertex.x));
            min_y = min_y.min(clamp(vertex.y));
            max_y = max_y.max(clamp(vertex.y));
        }
        ctx.draw(&Rectangle {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
            color: color_from_floats(quad[0].color),
        });
    }
}

fn paint_lines(ctx: &mut Context<'_>, vertices: &[ScreenVertex]) {
    for pair in vertices.chunks_exact(2) {
        ctx.draw(&Line {
            x1: clamp(pair[0].x),
            y1: clamp(pair[0].y),
            x2: clamp(pair[1].x),
            y2: clamp(pair[1].y),
            color: color_from_floats(pair[0].color),
        });
    }
}

fn project<L: DiagramLayer>(
    buffer: &LayerBuffer<L>,
    uniforms: &ShaderUniforms,
) -> Vec<ScreenVertex> {
    buffer.projected(uniforms).collect()
}

/// Render the diagram pane
pub fn render_diagram_pane(frame: &mut Frame, area: Rect, data: DiagramRenderData) {
    let border_style = Style::default()
        .fg(DEFAULT_THEME.border_focused)
        .add_modifier(Modifier::BOLD);

    let regions = project(data.regions, &data.uniforms);
    let blocks = project(data.blocks, &data.uniforms);
    let events = project(data.events, &data.uniforms);
    let addresses = project(data.addresses, &data.uniforms);

    let canvas = Canvas::default()
        .block(
            Block::default()
                .title(data.title)
                .borders(Borders::ALL)
                .border_style(border_style),
        )
        .marker(Marker::Braille)
        .x_bounds([-1.0, 1.0])
        .y_bounds([-1.0, 1.0])
        .paint(move |ctx| {
            paint_quads(ctx, &regions);
            ctx.layer();
            paint_quads(ctx, &blocks);
            ctx.layer();
            paint_lines(ctx, &events);
            paint_lines(ctx, &addresses);
            if let Some((x, y)) = data.cursor {
                ctx.draw(&Points {
                    coords: &[(x, y)],
                    color: DEFAULT_THEME.secondary,
                });
            }
        });

    frame.render_widget(canvas, area);
}
