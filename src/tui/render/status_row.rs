use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::ops::filter::FilterCriteria;
use crate::tui::app::{App, Mode, View};
use crate::util::unicode;

const KEY_HINTS: &str = "/ search  c cat  x ctx  t today  [ ] day  a apply  y brief  q quit";

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let (mut spans, hint): (Vec<Span>, &str) = match &app.mode {
        Mode::Search => {
            // Search prompt: /pattern▌
            let spans = vec![
                Span::styled(
                    format!("/{}", app.search_input),
                    Style::default().fg(app.theme.text_bright).bg(bg),
                ),
                Span::styled("\u{258C}", Style::default().fg(app.theme.highlight).bg(bg)), // ▌ cursor
            ];
            (spans, "Enter search  Esc cancel")
        }
        Mode::ConfirmClose { label, .. } => {
            let spans = vec![Span::styled(
                format!("Close {}? (y/n)", label),
                Style::default()
                    .fg(app.theme.yellow)
                    .bg(bg)
                    .add_modifier(Modifier::BOLD),
            )];
            (spans, "")
        }
        Mode::Navigate => navigate_line(app),
    };

    let content_width: usize = spans.iter().map(|s| unicode::display_width(&s.content)).sum();
    let hint_width = unicode::display_width(hint);
    if !hint.is_empty() && content_width + hint_width < width {
        let padding = width - content_width - hint_width;
        spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
        spans.push(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg)));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

/// Status message first, then pending filter edits, then key hints
fn navigate_line<'a>(app: &App) -> (Vec<Span<'a>>, &'static str) {
    let bg = app.theme.background;

    if let Some(status) = &app.status {
        let color = if status.error {
            app.theme.red
        } else {
            app.theme.green
        };
        return (
            vec![Span::styled(
                status.text.clone(),
                Style::default().fg(color).bg(bg),
            )],
            "",
        );
    }

    if app.filters_pending() {
        return (
            vec![
                Span::styled(
                    "pending: ",
                    Style::default().fg(app.theme.highlight).bg(bg),
                ),
                Span::styled(
                    describe(&app.pending),
                    Style::default().fg(app.theme.text).bg(bg),
                ),
            ],
            "a apply  Esc discard",
        );
    }

    let hint = if app.workspace.config.ui.show_key_hints {
        KEY_HINTS
    } else {
        ""
    };
    let mut spans = Vec::new();
    if app.view == View::Board {
        spans.push(Span::styled(
            "Enter expand  C close  u update",
            Style::default().fg(app.theme.dim).bg(bg),
        ));
    }
    (spans, hint)
}

/// `Work · 2025-04-01 · context` or `all logs`
fn describe(criteria: &FilterCriteria) -> String {
    let mut parts = Vec::new();
    if !criteria.search.is_empty() {
        parts.push(format!("\"{}\"", criteria.search));
    }
    parts.push(criteria.category.to_string());
    parts.push(criteria.date.clone().unwrap_or_else(|| "any date".into()));
    if criteria.show_context {
        parts.push("context".into());
    }
    parts.join(" \u{00B7} ")
}
