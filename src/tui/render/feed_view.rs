use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::Paragraph;

use crate::tui::app::App;

use super::helpers::{RowOptions, header_line, log_row, scroll_offset};

/// Render the newest logs, grouped under date headers
pub fn render_feed_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let items = app.feed_items();
    if items.is_empty() {
        let empty = Paragraph::new(" No logs yet")
            .style(Style::default().fg(app.theme.dim).bg(app.theme.background));
        frame.render_widget(empty, area);
        return;
    }

    let cursor = app.feed_cursor.min(items.len() - 1);
    let width = area.width as usize;
    let mut lines: Vec<Line> = Vec::new();
    let mut current_date = "";
    let mut cursor_line = None;

    for (idx, log) in items.iter().enumerate() {
        if log.date_string != current_date {
            current_date = &log.date_string;
            if !lines.is_empty() {
                lines.push(Line::from(""));
            }
            lines.push(header_line(app, current_date.to_string()));
        }
        let selected = idx == cursor;
        if selected {
            cursor_line = Some(lines.len());
        }
        let opts = RowOptions {
            selected,
            ..RowOptions::default()
        };
        lines.push(log_row(app, log, opts, width, None));
    }

    let scroll = scroll_offset(cursor_line, area.height as usize);
    let paragraph = Paragraph::new(lines)
        .style(Style::default().bg(app.theme.background))
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}
