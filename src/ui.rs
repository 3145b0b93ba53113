use std::time::Instant;

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

use crate::app::{App, Focus, SUGGESTIONS};
use crate::geo;
use crate::map::{DotCanvas, TerminalSurface};

/// Render the full dashboard frame.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Search bar
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_search_bar(frame, app, chunks[0]);
    render_map(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);
}

fn render_search_bar(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Search;
    let border_color = if focused { Color::Yellow } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(Span::styled(
            " Search Canadian cities ",
            Style::default().fg(Color::Yellow),
        ));

    let hint = if app.search_input.is_empty() && !focused {
        Span::styled(
            "press / to search (e.g. Toronto, Vancouver...)",
            Style::default().fg(Color::DarkGray),
        )
    } else {
        Span::styled(
            format!("{}{}", app.search_input, if focused { "█" } else { "" }),
            Style::default().fg(Color::White),
        )
    };

    let suggestions: Vec<Span> = SUGGESTIONS
        .iter()
        .enumerate()
        .flat_map(|(i, s)| {
            [
                Span::styled(format!("  [{}] ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(*s, Style::default().fg(Color::Gray)),
            ]
        })
        .collect();

    let mut spans = vec![hint];
    if !focused {
        spans.extend(suggestions);
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Map ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.controller.is_degraded() {
        render_placeholder(frame, inner);
    } else if let Some(surface) = app.controller.surface() {
        let widget = MapWidget {
            surface,
            now: Instant::now(),
        };
        frame.render_widget(widget, inner);
    }

    if let Some(selection) = app.controller.selection() {
        render_info_panel(frame, selection, inner);
    }
}

/// Shown when no map provider is available; the rest of the dashboard
/// keeps working.
fn render_placeholder(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Map Preview",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "map data unavailable",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let paragraph = Paragraph::new(lines).alignment(ratatui::layout::Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Selection card overlaid on the map's top-left corner.
fn render_info_panel(frame: &mut Frame, selection: &crate::map::LocationSelection, map_area: Rect) {
    let width = 34.min(map_area.width.saturating_sub(1));
    let height = 4.min(map_area.height);
    if width < 10 || height < 4 {
        return;
    }
    let area = Rect::new(map_area.x + 1, map_area.y, width, height);

    // First comma segment of the display name is the locality.
    let title = selection.name.split(',').next().unwrap_or("Location").trim();
    let coords = match geo::normalize(Some(&selection.coordinates)) {
        Some(point) => format!("{:.4}, {:.4}", point.lat, point.lng),
        None => "coordinates unavailable".to_string(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let lines = vec![
        Line::from(Span::styled(
            title.to_string(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(coords, Style::default().fg(Color::Gray))),
    ];

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Stamp one braille layer into the buffer with a single color, skipping
/// empty cells so lower layers show through.
fn render_layer(canvas: &DotCanvas, color: Color, area: Rect, buf: &mut Buffer) {
    for (row_idx, row_str) in canvas.rows().enumerate() {
        if row_idx >= area.height as usize {
            break;
        }
        let y = area.y + row_idx as u16;

        for (col_idx, ch) in row_str.chars().enumerate() {
            if col_idx >= area.width as usize {
                break;
            }
            if ch == '\u{2800}' {
                continue;
            }
            buf[(area.x + col_idx as u16, y)].set_char(ch).set_fg(color);
        }
    }
}

struct MapWidget<'a> {
    surface: &'a TerminalSurface,
    now: Instant,
}

impl Widget for MapWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let layers = self.surface.render(area.width, area.height, self.now);

        render_layer(&layers.basemap, Color::Cyan, area, buf);
        render_layer(&layers.overlays, Color::Yellow, area, buf);

        for (cx, cy) in &layers.markers {
            if *cx < area.width && *cy < area.height {
                buf[(area.x + cx, area.y + cy)]
                    .set_char('◎')
                    .set_fg(Color::Red);
            }
        }
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let viewport = app.controller.viewport();

    let mut spans = vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{}x", viewport.zoom_level),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!(
                "{:.1}°{}, {:.1}°{}",
                viewport.center.lat.abs(),
                if viewport.center.lat >= 0.0 { "N" } else { "S" },
                viewport.center.lng.abs(),
                if viewport.center.lng >= 0.0 { "E" } else { "W" }
            ),
            Style::default().fg(Color::Cyan),
        ),
    ];

    if app.controller.is_animating() {
        spans.push(Span::styled(" | flying...", Style::default().fg(Color::Yellow)));
    }

    if let Some(status) = &app.status {
        spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(status.clone(), Style::default().fg(Color::Magenta)));
    }

    spans.push(Span::styled(
        " | /:search +/-:zoom r:reset q:quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
