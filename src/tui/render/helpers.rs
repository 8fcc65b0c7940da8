use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use regex::Regex;

use crate::model::LogRecord;
use crate::tui::app::App;
use crate::util::unicode;

use super::push_highlighted_spans;

/// Marker drawn before an update shown under its ticket
pub(super) const CHILD_MARKER: &str = "  \u{21B3} ";

/// Compute total display width of a slice of spans
pub(super) fn spans_width(spans: &[Span]) -> usize {
    spans
        .iter()
        .map(|s| unicode::display_width(&s.content))
        .sum()
}

/// First row to draw so that `cursor_line` stays on screen
pub(super) fn scroll_offset(cursor_line: Option<usize>, visible_height: usize) -> u16 {
    let line = cursor_line.unwrap_or(0);
    let offset = if visible_height == 0 {
        0
    } else {
        line.saturating_sub(visible_height - 1)
    };
    offset.min(u16::MAX as usize) as u16
}

/// Layout options for a log row
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct RowOptions {
    pub selected: bool,
    pub child: bool,
    /// Prefix the time with the date
    pub show_date: bool,
}

/// One log as a full-width line:
/// `▎09:00 Open   #5 [Work] Roof: Call roofer              +1`
pub(super) fn log_row<'a>(
    app: &App,
    log: &LogRecord,
    opts: RowOptions,
    width: usize,
    search_re: Option<&Regex>,
) -> Line<'a> {
    let theme = &app.theme;
    let bg = if opts.selected {
        theme.selection_bg
    } else {
        theme.background
    };
    let mut spans: Vec<Span> = Vec::new();

    // Column 0 reservation
    if opts.selected {
        spans.push(Span::styled(
            "\u{258E}",
            Style::default()
                .fg(theme.selection_border)
                .bg(theme.selection_bg),
        ));
    } else {
        spans.push(Span::styled(" ", Style::default().bg(theme.background)));
    }

    if opts.child {
        spans.push(Span::styled(
            CHILD_MARKER,
            Style::default().fg(theme.dim).bg(bg),
        ));
    }

    let when = if opts.show_date {
        format!("{} {} ", log.date_string, log.time_part())
    } else {
        format!("{} ", log.time_part())
    };
    spans.push(Span::styled(when, Style::default().fg(theme.dim).bg(bg)));

    spans.push(Span::styled(
        format!("{:<6} ", log.log_type.as_str()),
        Style::default()
            .fg(theme.type_color(log.log_type))
            .bg(bg)
            .add_modifier(Modifier::BOLD),
    ));

    let label = log.id_label();
    if !label.is_empty() {
        spans.push(Span::styled(
            format!("{} ", label),
            Style::default().fg(theme.selection_id).bg(bg),
        ));
    }

    spans.push(Span::styled(
        format!("[{}] ", log.display_categories()),
        Style::default()
            .fg(theme.category_color(&log.categories))
            .bg(bg),
    ));

    let suffix = match log.attachments.len() {
        0 => String::new(),
        n => format!(" +{}", n),
    };

    // Text: subject and the first entry line, cut to what fits
    let mut text = String::new();
    if let Some(subject) = &log.subject {
        text.push_str(subject);
        text.push_str(": ");
    }
    let mut entry_lines = log.entry.lines();
    text.push_str(entry_lines.next().unwrap_or(""));
    if entry_lines.next().is_some() {
        text.push_str(" \u{2026}");
    }
    let prefix_width = spans_width(&spans);
    let available = width.saturating_sub(prefix_width + unicode::display_width(&suffix) + 1);
    let text = unicode::truncate_to_width(&text, available);

    let text_style = if opts.selected {
        Style::default()
            .fg(theme.text_bright)
            .bg(bg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.text_bright).bg(bg)
    };
    let hl_style = Style::default()
        .fg(theme.search_match_fg)
        .bg(theme.search_match_bg)
        .add_modifier(Modifier::BOLD);
    push_highlighted_spans(&mut spans, &text, text_style, hl_style, search_re);

    // Attachment count, right-justified with 1-space buffer
    if !suffix.is_empty() {
        let content_width = spans_width(&spans);
        let start = width.saturating_sub(unicode::display_width(&suffix) + 1);
        if content_width < start {
            spans.push(Span::styled(
                " ".repeat(start - content_width),
                Style::default().bg(bg),
            ));
        }
        spans.push(Span::styled(suffix, Style::default().fg(theme.dim).bg(bg)));
    }

    pad_to_width(&mut spans, width, Style::default().bg(bg));
    Line::from(spans)
}

/// Fill the rest of the row so the selection background spans the width
pub(super) fn pad_to_width(spans: &mut Vec<Span>, width: usize, style: Style) {
    let used = spans_width(spans);
    if used < width {
        spans.push(Span::styled(" ".repeat(width - used), style));
    }
}

/// A bold section header such as a date
pub(super) fn header_line<'a>(app: &App, text: String) -> Line<'a> {
    Line::from(Span::styled(
        format!(" {}", text),
        Style::default()
            .fg(app.theme.text)
            .bg(app.theme.background)
            .add_modifier(Modifier::BOLD),
    ))
}
