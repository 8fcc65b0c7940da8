use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::{App, Mode};

pub(super) fn handle_confirm_close(app: &mut App, key: KeyEvent, id: &str, label: &str) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_close(id, label),
        _ => {
            app.mode = Mode::Navigate;
            app.set_status("Cancelled");
        }
    }
}
