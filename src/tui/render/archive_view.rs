use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::Paragraph;

use crate::tui::app::App;

use super::helpers::{RowOptions, log_row, scroll_offset};

/// Render the filtered history. Updates follow their ticket, marked ↳.
pub fn render_archive_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let items = app.archive_items();
    if items.is_empty() {
        let message = if app.applied.is_active() {
            " No logs match the applied filters"
        } else {
            " No logs yet"
        };
        let empty = Paragraph::new(message)
            .style(Style::default().fg(app.theme.dim).bg(app.theme.background));
        frame.render_widget(empty, area);
        return;
    }

    let cursor = app.archive_cursor.min(items.len() - 1);
    app.archive_cursor = cursor;
    let width = area.width as usize;
    let search_re = app.search_re();

    let lines: Vec<Line> = items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let opts = RowOptions {
                selected: idx == cursor,
                child: item.is_child,
                show_date: true,
            };
            log_row(app, &item.record, opts, width, search_re.as_ref())
        })
        .collect();

    let scroll = scroll_offset(Some(cursor), area.height as usize);
    let paragraph = Paragraph::new(lines)
        .style(Style::default().bg(app.theme.background))
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}
