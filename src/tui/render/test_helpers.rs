use std::path::PathBuf;

use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use crate::io::memory_store::MemoryStore;
use crate::model::{Category, LogDraft, LogRecord, LogType, StoreConfig, Workspace};
use crate::tui::app::App;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// Render the whole screen at the default test size
pub fn render_app(app: &mut App) -> String {
    render_to_string(TERM_W, TERM_H, |frame, _| super::render(frame, app))
}

/// A workspace that never touches the disk
pub fn test_workspace() -> Workspace {
    Workspace {
        root: PathBuf::from("/tmp/test-daylog"),
        dir: PathBuf::from("/tmp/test-daylog/daylog"),
        config: StoreConfig::default(),
    }
}

/// An App showing `logs` as its snapshot, with no live query
pub fn test_app(logs: Vec<LogRecord>) -> App {
    let mut app = App::new(test_workspace(), Box::new(MemoryStore::new()));
    app.logs = logs;
    app
}

/// An App subscribed to an in-memory store. Writes through the returned
/// handle reach the App on its next `sync`.
pub fn mounted_app() -> (App, MemoryStore) {
    let store = MemoryStore::new();
    let mut app = App::new(test_workspace(), Box::new(store.clone()));
    app.mount().unwrap();
    (app, store)
}

pub fn draft(log_type: LogType, entry: &str) -> LogDraft {
    LogDraft {
        log_type,
        categories: vec![Category::Work],
        subject: None,
        entry: entry.to_string(),
        task_ref: None,
        date_string: "2025-04-01".into(),
        timestamp: "2025-04-01T09:00".into(),
        attachments: Vec::new(),
        links: Vec::new(),
    }
}
