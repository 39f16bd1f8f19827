//! Side pane with the selection and window state

use crate::history::HeapHistory;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// What the user last clicked on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Heap coordinate under the click
    pub point: Option<(u32, u64)>,
    /// Log index of the block under the click
    pub block: Option<usize>,
    /// Label of the nearest event
    pub event: Option<String>,
}

fn field<'a>(name: &'a str, value: String) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{:<10}", name), Style::default().fg(DEFAULT_THEME.label)),
        Span::styled(value, Style::default().fg(DEFAULT_THEME.fg)),
    ])
}

fn heading(text: &str) -> Line<'_> {
    Line::from(Span::styled(
        text,
        Style::default()
            .fg(DEFAULT_THEME.primary)
            .add_modifier(Modifier::BOLD),
    ))
}

/// Render the details pane
pub fn render_details_pane(
    frame: &mut Frame,
    area: Rect,
    history: &HeapHistory,
    selection: &Selection,
    show_all: bool,
) {
    let bounds = history.viewport().visible_bounds();
    let (_, page_size) = history.active_regions();
    let culling = if show_all { " (all shown)" } else { "" };

    let mut lines = vec![
        heading("Window"),
        field("ticks", format!("{} - {}", bounds.min_tick, bounds.max_tick)),
        field(
            "addresses",
            format!("{:#x} - {:#x}", bounds.min_address, bounds.max_address),
        ),
        field("regions", format!("{:#x} byte pages", page_size)),
        field(
            "min size",
            format!("{} bytes{}", history.minimum_block_size(), culling),
        ),
        Line::from(""),
        heading("History"),
        field("ticks", history.current_tick().to_string()),
        field(
            "blocks",
            format!("{} ({} live)", history.blocks().len(), history.live_block_count()),
        ),
        field("conflicts", history.conflicts().len().to_string()),
        field("events", history.events().len().to_string()),
        Line::from(""),
        heading("Selection"),
    ];

    match selection.point {
        Some((tick, address)) => {
            lines.push(field("tick", tick.to_string()));
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:<10}", "address"),
                    Style::default().fg(DEFAULT_THEME.label),
                ),
                Span::styled(
                    format!("{:#x}", address),
                    Style::default().fg(DEFAULT_THEME.address),
                ),
            ]));
        }
        None => lines.push(Line::from(Span::styled(
            "(click the diagram)",
            Style::default().fg(DEFAULT_THEME.comment),
        ))),
    }

    if let Some(block) = selection.block.and_then(|index| history.blocks().get(index)) {
        let state = if block.was_freed() {
            Span::styled("freed", Style::default().fg(DEFAULT_THEME.comment))
        } else {
            Span::styled("live", Style::default().fg(DEFAULT_THEME.success))
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:<10}", "block"),
                Style::default().fg(DEFAULT_THEME.label),
            ),
            state,
        ]));
        lines.push(field("size", format!("{:#x}", block.size)));
        lines.push(field("alloc", block.start_tick.to_string()));
        if block.was_freed() {
            lines.push(field("free", block.end_tick.to_string()));
        }
        if !block.alloc_tag.is_empty() {
            lines.push(field("tag", block.alloc_tag.to_string()));
        }
    }

    if let Some(event) = &selection.event {
        lines.push(field("event", event.clone()));
    }

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" Details ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(DEFAULT_THEME.border_normal)),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}
