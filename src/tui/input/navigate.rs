use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::{App, Mode, View};

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    match (key.modifiers, key.code) {
        (_, KeyCode::Char('q')) => app.should_quit = true,
        (m, KeyCode::Char('c')) if m.contains(KeyModifiers::CONTROL) => app.should_quit = true,

        // Views
        (_, KeyCode::Tab) => app.view = app.view.next(),
        (_, KeyCode::BackTab) => app.view = app.view.prev(),
        (_, KeyCode::Char(c @ '1'..='3')) => {
            let idx = c as usize - '1' as usize;
            app.view = View::ALL[idx];
        }

        // Cursor
        (_, KeyCode::Char('j') | KeyCode::Down) => app.move_cursor(1),
        (_, KeyCode::Char('k') | KeyCode::Up) => app.move_cursor(-1),
        (_, KeyCode::Char('g') | KeyCode::Home) => app.cursor_to_start(),
        (_, KeyCode::Char('G') | KeyCode::End) => app.cursor_to_end(),

        // Filters (pending until applied)
        (_, KeyCode::Char('/')) => {
            app.search_input = app.pending.search.clone();
            app.mode = Mode::Search;
        }
        (_, KeyCode::Char('c')) => app.pending.category = app.pending.category.next(),
        (_, KeyCode::Char('x')) => app.pending.show_context = !app.pending.show_context,
        (_, KeyCode::Char('t')) => app.toggle_today(),
        (_, KeyCode::Char('[')) => app.shift_date(-1),
        (_, KeyCode::Char(']')) => app.shift_date(1),
        (_, KeyCode::Char('D')) => app.pending.date = None,
        (_, KeyCode::Char('a')) => app.apply_filters(),
        (_, KeyCode::Esc) => app.discard_pending(),

        // Actions
        (_, KeyCode::Enter) => app.toggle_expand(),
        (_, KeyCode::Char('C')) => app.request_close(),
        (_, KeyCode::Char('y')) => app.copy_brief(),
        (_, KeyCode::Char('u')) => app.update_hint(),

        _ => {}
    }
}
