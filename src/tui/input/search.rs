use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::{App, Mode};
use crate::util::unicode;

pub(super) fn handle_search(app: &mut App, key: KeyEvent) {
    match (key.modifiers, key.code) {
        // Cancel search
        (_, KeyCode::Esc) => {
            app.mode = Mode::Navigate;
            app.search_input.clear();
        }

        // Execute search
        (_, KeyCode::Enter) => {
            let query = std::mem::take(&mut app.search_input);
            app.submit_search(&query);
            app.mode = Mode::Navigate;
        }

        (_, KeyCode::Backspace) => unicode::pop_grapheme(&mut app.search_input),

        (m, KeyCode::Char('u')) if m.contains(KeyModifiers::CONTROL) => app.search_input.clear(),

        (m, _) if m.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {}

        (_, KeyCode::Char(c)) => app.search_input.push(c),

        _ => {}
    }
}
