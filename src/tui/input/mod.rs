mod confirm;
mod navigate;
mod search;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Mode};

/// Handle a key event in the current mode
pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Ignore bare modifier key presses (Shift, Ctrl, Alt, etc.)
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }
    app.status = None;

    let key = normalize_key(key);
    match app.mode.clone() {
        Mode::Navigate => navigate::handle_navigate(app, key),
        Mode::Search => search::handle_search(app, key),
        Mode::ConfirmClose { id, label } => confirm::handle_confirm_close(app, key, &id, &label),
    }
}

/// Some terminals report Shift+c as lowercase `c` with SHIFT set
fn normalize_key(mut key: KeyEvent) -> KeyEvent {
    if let KeyCode::Char(c) = key.code
        && key.modifiers.contains(KeyModifiers::SHIFT)
        && c.is_ascii_lowercase()
    {
        key.code = KeyCode::Char(c.to_ascii_uppercase());
    }
    key
}
