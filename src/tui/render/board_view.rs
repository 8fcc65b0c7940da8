use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::ops::group::TicketGroup;
use crate::tui::app::App;
use crate::util::unicode;

use super::helpers::{RowOptions, log_row, pad_to_width, scroll_offset, spans_width};

/// Render open tickets. Expanded tickets list their updates, newest first.
pub fn render_board_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let groups = app.board_groups();
    if groups.is_empty() {
        let empty = Paragraph::new(" No open tickets")
            .style(Style::default().fg(app.theme.dim).bg(app.theme.background));
        frame.render_widget(empty, area);
        return;
    }

    let cursor = app.board_cursor.min(groups.len() - 1);
    app.board_cursor = cursor;
    let width = area.width as usize;
    let mut lines: Vec<Line> = Vec::new();
    let mut cursor_line = None;

    for (idx, group) in groups.iter().enumerate() {
        let selected = idx == cursor;
        if selected {
            cursor_line = Some(lines.len());
        }
        let expanded = app.board_expanded.contains(&group.custom_id());
        lines.push(ticket_row(app, group, selected, expanded, width));

        if expanded {
            for child in &group.children {
                let opts = RowOptions {
                    child: true,
                    show_date: true,
                    ..RowOptions::default()
                };
                lines.push(log_row(app, child, opts, width, None));
            }
        }
    }

    let scroll = scroll_offset(cursor_line, area.height as usize);
    let paragraph = Paragraph::new(lines)
        .style(Style::default().bg(app.theme.background))
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

/// `▎▶ #12  [Work] Roof: Call roofer          2025-04-01  3 updates  1 file`
fn ticket_row<'a>(
    app: &App,
    group: &TicketGroup,
    selected: bool,
    expanded: bool,
    width: usize,
) -> Line<'a> {
    let theme = &app.theme;
    let ticket = &group.ticket;
    let bg = if selected {
        theme.selection_bg
    } else {
        theme.background
    };
    let mut spans: Vec<Span> = Vec::new();

    if selected {
        spans.push(Span::styled(
            "\u{258E}",
            Style::default()
                .fg(theme.selection_border)
                .bg(theme.selection_bg),
        ));
    } else {
        spans.push(Span::styled(" ", Style::default().bg(theme.background)));
    }

    // Expand/collapse indicator
    let indicator = match (group.children.is_empty(), expanded) {
        (true, _) => "  ",
        (false, true) => "\u{25BC} ",
        (false, false) => "\u{25B6} ",
    };
    spans.push(Span::styled(indicator, Style::default().fg(theme.dim).bg(bg)));

    spans.push(Span::styled(
        format!("#{:<4} ", group.custom_id()),
        Style::default()
            .fg(theme.selection_id)
            .bg(bg)
            .add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled(
        format!("[{}] ", ticket.display_categories()),
        Style::default()
            .fg(theme.category_color(&ticket.categories))
            .bg(bg),
    ));

    let mut info = format!("  {}  {}", ticket.date_string, plural(group.child_count(), "update"));
    if group.attachment_count() > 0 {
        info.push_str(&format!("  {}", plural(group.attachment_count(), "file")));
    }

    let mut text = String::new();
    if let Some(subject) = &ticket.subject {
        text.push_str(subject);
        text.push_str(": ");
    }
    text.push_str(ticket.entry.lines().next().unwrap_or(""));
    let available =
        width.saturating_sub(spans_width(&spans) + unicode::display_width(&info) + 1);
    let text = unicode::truncate_to_width(&text, available);
    let text_style = if selected {
        Style::default()
            .fg(theme.text_bright)
            .bg(bg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.text_bright).bg(bg)
    };
    spans.push(Span::styled(text, text_style));

    // Date and counts, right-justified with 1-space buffer
    let content_width = spans_width(&spans);
    let info_start = width.saturating_sub(unicode::display_width(&info) + 1);
    if content_width < info_start {
        spans.push(Span::styled(
            " ".repeat(info_start - content_width),
            Style::default().bg(bg),
        ));
    }
    spans.push(Span::styled(info, Style::default().fg(theme.dim).bg(bg)));

    pad_to_width(&mut spans, width, Style::default().bg(bg));
    Line::from(spans)
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", n, noun)
    }
}
