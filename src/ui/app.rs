//! Main TUI application state and logic

use crate::history::HeapHistory;
use crate::layers::{ActiveRegionLayer, AddressLayer, BlockLayer, EventLayer, LayerBuffer};
use crate::ui::panes::{self, DiagramRenderData, Selection};
use crate::viewport::ViewportError;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;
use tracing::debug;

/// Fraction of the window moved by one arrow key press
const PAN_STEP: f64 = 0.1;
const ZOOM_IN: f64 = 0.8;
const ZOOM_OUT: f64 = 1.25;

/// The main application state
pub struct App {
    /// The loaded heap history
    pub history: HeapHistory,

    /// Name shown in the diagram title
    pub source_name: String,

    /// Vertex buffers for the four diagram layers
    pub regions: LayerBuffer<ActiveRegionLayer>,
    pub blocks: LayerBuffer<BlockLayer>,
    pub events: LayerBuffer<EventLayer>,
    pub addresses: LayerBuffer<AddressLayer>,

    /// Draw every block instead of only those large enough to see
    pub show_all: bool,

    /// What the last click hit
    pub selection: Selection,

    /// Display-space position of the last click
    pub cursor: Option<(f64, f64)>,

    /// Block size currently highlighted, if any
    pub highlighted_size: Option<u32>,

    /// Area the diagram was last drawn into, borders included
    pub diagram_area: Rect,

    /// Cell where the current left-button drag last was
    pub drag_origin: Option<(u16, u16)>,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,

    /// Whether the status message reports a failure
    pub is_error: bool,
}

impl App {
    /// Create a new app over an already loaded history
    pub fn new(history: HeapHistory, source_name: String) -> Self {
        let mut app = App {
            history,
            source_name,
            regions: LayerBuffer::new(ActiveRegionLayer),
            blocks: LayerBuffer::new(BlockLayer),
            events: LayerBuffer::new(EventLayer),
            addresses: LayerBuffer::new(AddressLayer),
            show_all: false,
            selection: Selection::default(),
            cursor: None,
            highlighted_size: None,
            diagram_area: Rect::default(),
            drag_origin: None,
            should_quit: false,
            status_message: String::from("Ready!"),
            is_error: false,
        };
        app.refresh_layers();
        app
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(50))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_key_event(key);
                    }
                    Event::Mouse(mouse) => self.handle_mouse_event(mouse),
                    _ => {}
                }
            }
        }

        Ok(())
    }

    /// Rebuild every layer's vertices for the current window.
    pub fn refresh_layers(&mut self) {
        self.regions.refresh(&self.history, self.show_all);
        self.blocks.refresh(&self.history, self.show_all);
        self.events.refresh(&self.history, self.show_all);
        self.addresses.refresh(&self.history, self.show_all);
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(75), Constraint::Percentage(25)])
            .split(main_chunks[0]);

        self.diagram_area = columns[0];

        let title = format!(
            " {} │ {} of {} blocks ",
            self.source_name,
            self.blocks.item_count() / 2,
            self.history.blocks().len()
        );
        panes::render_diagram_pane(
            frame,
            columns[0],
            DiagramRenderData {
                regions: &self.regions,
                blocks: &self.blocks,
                events: &self.events,
                addresses: &self.addresses,
                uniforms: self.history.viewport().uniforms(),
                cursor: self.cursor,
                title,
            },
        );

        panes::render_details_pane(
            frame,
            columns[1],
            &self.history,
            &self.selection,
            self.show_all,
        );

        panes::render_status_bar(
            frame,
            main_chunks[1],
            &self.status_message,
            self.is_error,
            self.highlighted_size.is_some(),
        );
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Left => self.pan(-PAN_STEP, 0.0),
            KeyCode::Right => self.pan(PAN_STEP, 0.0),
            KeyCode::Up => self.pan(0.0, PAN_STEP),
            KeyCode::Down => self.pan(0.0, -PAN_STEP),
            KeyCode::Char('+') | KeyCode::Char('=') => self.zoom(0.5, 0.5, ZOOM_IN, ZOOM_IN),
            KeyCode::Char('-') => self.zoom(0.5, 0.5, ZOOM_OUT, ZOOM_OUT),
            KeyCode::Char('x') => self.zoom(0.5, 0.5, ZOOM_IN, 1.0),
            KeyCode::Char('X') => self.zoom(0.5, 0.5, ZOOM_OUT, 1.0),
            KeyCode::Char('y') => self.zoom(0.5, 0.5, 1.0, ZOOM_IN),
            KeyCode::Char('Y') => self.zoom(0.5, 0.5, 1.0, ZOOM_OUT),
            KeyCode::Char('r') => {
                self.history.reset_viewport_to_global();
                self.refresh_layers();
                self.set_status("Reset to the full history".to_string());
            }
            KeyCode::Char('a') => {
                self.show_all = !self.show_all;
                self.refresh_layers();
                self.set_status(if self.show_all {
                    "Drawing all blocks".to_string()
                } else {
                    "Drawing visible blocks only".to_string()
                });
            }
            KeyCode::Char('h') => self.highlight_selection(),
            KeyCode::Char('c') => {
                self.history.clear_highlight();
                self.highlighted_size = None;
                self.refresh_layers();
                self.set_status("Highlight cleared".to_string());
            }
            _ => {}
        }
    }

    /// Handle mouse events inside the diagram
    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.drag_origin = Some((mouse.column, mouse.row));
                if let Some((x, y)) = self.screen_fraction(mouse.column, mouse.row) {
                    self.select(x, y);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let Some((column, row)) = self.drag_origin else {
                    return;
                };
                let inner = self.diagram_inner();
                if inner.width == 0 || inner.height == 0 {
                    return;
                }
                let dx = -(mouse.column as f64 - column as f64) / inner.width as f64;
                let dy = (mouse.row as f64 - row as f64) / inner.height as f64;
                self.drag_origin = Some((mouse.column, mouse.row));
                if dx != 0.0 || dy != 0.0 {
                    self.pan(dx, dy);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.drag_origin = None;
            }
            MouseEventKind::ScrollUp => {
                if let Some((x, y)) = self.screen_fraction(mouse.column, mouse.row) {
                    self.zoom(x, y, ZOOM_IN, ZOOM_IN);
                }
            }
            MouseEventKind::ScrollDown => {
                if let Some((x, y)) = self.screen_fraction(mouse.column, mouse.row) {
                    self.zoom(x, y, ZOOM_OUT, ZOOM_OUT);
                }
            }
            _ => {}
        }
    }

    /// The diagram area without its border.
    fn diagram_inner(&self) -> Rect {
        let area = self.diagram_area;
        Rect {
            x: area.x.saturating_add(1),
            y: area.y.saturating_add(1),
            width: area.width.saturating_sub(2),
            height: area.height.saturating_sub(2),
        }
    }

    /// Convert a terminal cell to a window fraction (origin top-left),
    /// sampling the cell center.
    fn screen_fraction(&self, column: u16, row: u16) -> Option<(f64, f64)> {
        let inner = self.diagram_inner();
        let inside_x = column >= inner.x && column < inner.x + inner.width;
        let inside_y = row >= inner.y && row < inner.y + inner.height;
        if !inside_x || !inside_y {
            return None;
        }
        let x = ((column - inner.x) as f64 + 0.5) / inner.width as f64;
        let y = ((row - inner.y) as f64 + 0.5) / inner.height as f64;
        Some((x, y))
    }

    fn select(&mut self, x: f64, y: f64) {
        self.cursor = Some((x * 2.0 - 1.0, 1.0 - y * 2.0));
        let Some((tick, address)) = self.history.map_display_to_heap(x, y) else {
            self.selection = Selection::default();
            self.set_status("Nothing there".to_string());
            return;
        };

        let block = self
            .history
            .get_block_at_slow(address, tick)
            .map(|(_, index)| index);
        let event = self.history.get_event_at_tick(tick).map(str::to_string);
        debug!("click at tick {} address {:#x}: block {:?}", tick, address, block);

        self.set_status(match block.and_then(|index| self.history.blocks().get(index)) {
            Some(found) => found.describe(),
            None => format!("tick {}, address {:#x}", tick, address),
        });
        self.selection = Selection {
            point: Some((tick, address)),
            block,
            event,
        };
    }

    fn highlight_selection(&mut self) {
        let size = self
            .selection
            .block
            .and_then(|index| self.history.blocks().get(index))
            .map(|block| block.size);
        match size {
            Some(size) => {
                self.history.highlight_by_size(size);
                self.highlighted_size = Some(size);
                self.refresh_layers();
                self.set_status(format!("Highlighting {:#x} byte blocks", size));
            }
            None => self.set_error("Select a block first".to_string()),
        }
    }

    fn pan(&mut self, dx: f64, dy: f64) {
        let result = self.history.pan(dx, dy);
        self.apply_view_change(result);
    }

    fn zoom(&mut self, x: f64, y: f64, factor_x: f64, factor_y: f64) {
        let (max_height, max_width) = self.history.zoom_caps();
        let result = self
            .history
            .zoom_to_point(x, y, factor_x, factor_y, max_height, max_width);
        self.apply_view_change(result);
    }

    fn apply_view_change(&mut self, result: Result<(), ViewportError>) {
        match result {
            Ok(()) => {
                self.refresh_layers();
                let bounds = self.history.viewport().visible_bounds();
                self.set_status(format!(
                    "ticks {}..{}, addresses {:#x}..{:#x}",
                    bounds.min_tick, bounds.max_tick, bounds.min_address, bounds.max_address
                ));
            }
            Err(e) => self.set_error(format!("Cannot move the window: {}", e)),
        }
    }

    fn set_status(&mut self, message: String) {
        self.status_message = message;
        self.is_error = false;
    }

    fn set_error(&mut self, message: String) {
        self.status_message = message;
        self.is_error = true;
    }
}
