use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::ops::filter::{CategoryFilter, DateMatch};
use crate::tui::app::{App, View};
use crate::util::unicode;

/// Render the tab bar: view tabs, with separator line below
pub fn render_tab_bar(frame: &mut Frame, app: &App, area: Rect) {
    // Split into tab row and separator row
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // tabs
            Constraint::Length(1), // separator
        ])
        .split(area);

    let sep_cols = render_tabs(frame, app, chunks[0]);
    render_separator(frame, app, chunks[1], &sep_cols);
}

/// Render tabs and return the column positions of each separator character.
fn render_tabs(frame: &mut Frame, app: &App, area: Rect) -> Vec<usize> {
    let mut spans: Vec<Span> = Vec::new();
    let mut sep_cols: Vec<usize> = Vec::new();
    let sep = Span::styled(
        "\u{2502}",
        Style::default().fg(app.theme.dim).bg(app.theme.background),
    );

    // Leading icon
    let bg_style = Style::default().bg(app.theme.background);
    spans.push(Span::styled(" ", bg_style));
    spans.push(Span::styled(
        "\u{25B6}",
        Style::default().fg(app.theme.purple).bg(app.theme.background),
    ));
    spans.push(Span::styled(" ", bg_style));

    for (i, view) in View::ALL.iter().enumerate() {
        let label = match view {
            View::Board => format!(" {} {} ", i + 1, board_label(app)),
            _ => format!(" {} {} ", i + 1, view.label()),
        };
        spans.push(Span::styled(label, tab_style(app, app.view == *view)));
        sep_cols.push(spans.iter().map(|s| unicode::display_width(&s.content)).sum());
        spans.push(sep.clone());
    }

    // Store name, right-aligned
    let name = &app.workspace.config.store.name;
    let used: usize = spans.iter().map(|s| unicode::display_width(&s.content)).sum();
    let width = area.width as usize;
    let name_width = unicode::display_width(name);
    if used + name_width + 2 <= width {
        spans.push(Span::styled(" ".repeat(width - used - name_width - 1), bg_style));
        spans.push(Span::styled(
            name.clone(),
            Style::default().fg(app.theme.dim).bg(app.theme.background),
        ));
    }

    let line = Line::from(spans);
    let tabs = Paragraph::new(line).style(Style::default().bg(app.theme.background));
    frame.render_widget(tabs, area);
    sep_cols
}

/// "Board" with the number of open tickets
fn board_label(app: &App) -> String {
    match app.board_groups().len() {
        0 => "Board".to_string(),
        n => format!("Board ({})", n),
    }
}

fn render_separator(frame: &mut Frame, app: &App, area: Rect, sep_cols: &[usize]) {
    let width = area.width as usize;
    let bg = app.theme.background;
    let dim = app.theme.dim;

    let indicator_spans = filter_indicator(app);
    let indicator_width: usize = indicator_spans
        .iter()
        .map(|s| unicode::display_width(&s.content))
        .sum();
    // +2: one space before indicator, one space after (right edge buffer)
    let separator_end = if indicator_spans.is_empty() {
        width
    } else {
        width.saturating_sub(indicator_width + 2)
    };

    let mut spans: Vec<Span> = Vec::new();
    let mut sep_text = String::with_capacity(separator_end * 3);
    for col in 0..separator_end {
        if sep_cols.contains(&col) {
            sep_text.push('\u{2534}');
        } else {
            sep_text.push('\u{2500}');
        }
    }
    spans.push(Span::styled(sep_text, Style::default().fg(dim).bg(bg)));
    if !indicator_spans.is_empty() {
        spans.push(Span::styled(" ", Style::default().bg(bg)));
        spans.extend(indicator_spans);
        spans.push(Span::styled(" ", Style::default().bg(bg)));
    }

    let line = Line::from(spans);
    let sep_widget = Paragraph::new(line).style(Style::default().bg(bg));
    frame.render_widget(sep_widget, area);
}

/// Applied criteria for the filtered views: `filter: "roof" Work 2025-04-01 +context`
fn filter_indicator<'a>(app: &App) -> Vec<Span<'a>> {
    let bg = app.theme.background;
    let applied = &app.applied;
    let mut parts: Vec<Span> = Vec::new();

    match app.view {
        View::Feed => {}
        View::Archive => {
            if !applied.search.is_empty() {
                parts.push(Span::styled(
                    format!("\"{}\"", applied.search),
                    Style::default().fg(app.theme.text_bright).bg(bg),
                ));
            }
            if applied.category != CategoryFilter::All {
                parts.push(category_span(app, applied.category));
            }
            if let Some(date) = &applied.date {
                let text = match applied.date_match {
                    DateMatch::Exact => format!("{} (exact)", date),
                    DateMatch::ExactOrClosed => date.clone(),
                };
                parts.push(Span::styled(text, Style::default().fg(app.theme.cyan).bg(bg)));
            }
            if applied.show_context {
                parts.push(Span::styled(
                    "+context",
                    Style::default().fg(app.theme.green).bg(bg),
                ));
            }
        }
        View::Board => {
            if applied.category != CategoryFilter::All {
                parts.push(category_span(app, applied.category));
            }
        }
    }

    if parts.is_empty() {
        return parts;
    }
    let mut spans = vec![Span::styled(
        "filter:",
        Style::default().fg(app.theme.purple).bg(bg),
    )];
    for part in parts {
        spans.push(Span::styled(" ", Style::default().bg(bg)));
        spans.push(part);
    }
    spans
}

fn category_span<'a>(app: &App, category: CategoryFilter) -> Span<'a> {
    let color = match category {
        CategoryFilter::Home => app.theme.yellow,
        _ => app.theme.blue,
    };
    Span::styled(
        category.as_str(),
        Style::default().fg(color).bg(app.theme.background),
    )
}

/// Style for a tab: highlighted if current, normal otherwise
fn tab_style(app: &App, is_current: bool) -> Style {
    if is_current {
        Style::default()
            .fg(app.theme.text_bright)
            .bg(app.theme.selection_bg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.text).bg(app.theme.background)
    }
}
