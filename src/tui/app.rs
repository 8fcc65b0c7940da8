use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use regex::Regex;

use crate::io::clipboard;
use crate::io::file_store::FileStore;
use crate::io::logging;
use crate::io::store::{LogStore, Query, StoreError, Subscription};
use crate::io::workspace_io::{discover_workspace, load_workspace};
use crate::model::{LogRecord, LogType, Workspace};
use crate::ops::brief;
use crate::ops::filter::{DateMatch, FilterCriteria, filter_logs};
use crate::ops::group::{GroupedLog, TicketGroup, group_tickets, task_board};
use crate::ops::log_ops;

use super::input;
use super::render;
use super::theme::Theme;

/// Which view is currently displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// The newest logs, unfiltered
    Feed,
    /// Filtered history, tickets grouped with their updates
    Archive,
    /// Open tickets
    Board,
}

impl View {
    pub const ALL: [View; 3] = [View::Feed, View::Archive, View::Board];

    pub fn label(self) -> &'static str {
        match self {
            View::Feed => "Feed",
            View::Archive => "Archive",
            View::Board => "Board",
        }
    }

    pub fn next(self) -> View {
        match self {
            View::Feed => View::Archive,
            View::Archive => View::Board,
            View::Board => View::Feed,
        }
    }

    pub fn prev(self) -> View {
        match self {
            View::Feed => View::Board,
            View::Archive => View::Feed,
            View::Board => View::Archive,
        }
    }
}

/// Current interaction mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Typing into the search prompt
    Search,
    /// Waiting for y/n on closing a ticket
    ConfirmClose { id: String, label: String },
}

/// A transient message in the status row, cleared by the next key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub error: bool,
}

pub struct App {
    pub workspace: Workspace,
    store: Box<dyn LogStore>,
    subscription: Option<Subscription>,
    /// Latest snapshot, newest first
    pub logs: Vec<LogRecord>,
    pub view: View,
    pub mode: Mode,
    /// Criteria being edited; not yet reflected in the archive
    pub pending: FilterCriteria,
    /// Criteria the archive is currently showing
    pub applied: FilterCriteria,
    pub search_input: String,
    pub feed_cursor: usize,
    pub archive_cursor: usize,
    pub board_cursor: usize,
    /// Ticket numbers whose updates are shown on the board
    pub board_expanded: HashSet<u64>,
    pub status: Option<StatusMessage>,
    pub theme: Theme,
    pub should_quit: bool,
}

impl App {
    pub fn new(workspace: Workspace, store: Box<dyn LogStore>) -> Self {
        let theme = Theme::from_config(&workspace.config.ui);
        let criteria = FilterCriteria {
            date_match: DateMatch::from_config(workspace.config.archive.match_closed_date),
            ..FilterCriteria::default()
        };
        App {
            workspace,
            store,
            subscription: None,
            logs: Vec::new(),
            view: View::Feed,
            mode: Mode::Navigate,
            pending: criteria.clone(),
            applied: criteria,
            search_input: String::new(),
            feed_cursor: 0,
            archive_cursor: 0,
            board_cursor: 0,
            board_expanded: HashSet::new(),
            status: None,
            theme,
            should_quit: false,
        }
    }

    /// Start the live query over every log and take the first snapshot
    pub fn mount(&mut self) -> Result<(), StoreError> {
        self.subscription = Some(self.store.subscribe(Query::all())?);
        self.sync();
        Ok(())
    }

    /// End the live query
    pub fn unmount(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.stop();
        }
    }

    /// Pick up the newest snapshot, if one arrived. Returns whether the
    /// logs changed.
    pub fn sync(&mut self) -> bool {
        let Some(snapshot) = self.subscription.as_ref().and_then(|s| s.try_latest()) else {
            return false;
        };
        tracing::debug!(count = snapshot.len(), "snapshot received");
        self.logs = snapshot;
        self.clamp_cursors();
        true
    }

    // -----------------------------------------------------------------------
    // Derived lists
    // -----------------------------------------------------------------------

    pub fn feed_items(&self) -> &[LogRecord] {
        let limit = self.workspace.config.feed.limit.min(self.logs.len());
        &self.logs[..limit]
    }

    pub fn archive_items(&self) -> Vec<GroupedLog> {
        let visible = filter_logs(&self.logs, &self.applied);
        group_tickets(&visible, self.workspace.config.archive.ticket_order)
    }

    pub fn board_groups(&self) -> Vec<TicketGroup> {
        task_board(
            &self.logs,
            self.applied.category,
            self.workspace.config.board.ticket_order,
        )
    }

    fn item_count(&self, view: View) -> usize {
        match view {
            View::Feed => self.feed_items().len(),
            View::Archive => self.archive_items().len(),
            View::Board => self.board_groups().len(),
        }
    }

    pub fn cursor(&self) -> usize {
        match self.view {
            View::Feed => self.feed_cursor,
            View::Archive => self.archive_cursor,
            View::Board => self.board_cursor,
        }
    }

    fn cursor_mut(&mut self) -> &mut usize {
        match self.view {
            View::Feed => &mut self.feed_cursor,
            View::Archive => &mut self.archive_cursor,
            View::Board => &mut self.board_cursor,
        }
    }

    fn clamp_cursors(&mut self) {
        let last = |n: usize| n.saturating_sub(1);
        self.feed_cursor = self.feed_cursor.min(last(self.item_count(View::Feed)));
        self.archive_cursor = self
            .archive_cursor
            .min(last(self.item_count(View::Archive)));
        self.board_cursor = self.board_cursor.min(last(self.item_count(View::Board)));
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let count = self.item_count(self.view);
        let cursor = self.cursor_mut();
        *cursor = cursor
            .saturating_add_signed(delta)
            .min(count.saturating_sub(1));
    }

    pub fn cursor_to_start(&mut self) {
        *self.cursor_mut() = 0;
    }

    pub fn cursor_to_end(&mut self) {
        let count = self.item_count(self.view);
        *self.cursor_mut() = count.saturating_sub(1);
    }

    /// The log under the cursor in the current view
    pub fn selected_log(&self) -> Option<LogRecord> {
        match self.view {
            View::Feed => self.feed_items().get(self.feed_cursor).cloned(),
            View::Archive => self
                .archive_items()
                .into_iter()
                .nth(self.archive_cursor)
                .map(|item| item.record),
            View::Board => self
                .board_groups()
                .into_iter()
                .nth(self.board_cursor)
                .map(|group| group.ticket),
        }
    }

    // -----------------------------------------------------------------------
    // Filters
    // -----------------------------------------------------------------------

    /// Whether edited criteria differ from what the archive shows
    pub fn filters_pending(&self) -> bool {
        self.pending != self.applied
    }

    pub fn apply_filters(&mut self) {
        if !self.filters_pending() {
            return;
        }
        self.applied = self.pending.clone();
        self.archive_cursor = 0;
        self.clamp_cursors();
        tracing::debug!(criteria = ?self.applied, "filters applied");
        self.set_status("Filters applied");
    }

    /// Drop edits that were never applied
    pub fn discard_pending(&mut self) {
        if self.filters_pending() {
            self.pending = self.applied.clone();
            self.set_status("Pending filters discarded");
        }
    }

    /// Search runs as soon as it is submitted; other pending edits stay pending
    pub fn submit_search(&mut self, text: &str) {
        let search = text.trim().to_string();
        self.pending.search = search.clone();
        self.applied.search = search;
        self.archive_cursor = 0;
        self.clamp_cursors();
    }

    pub fn toggle_today(&mut self) {
        let today = log_ops::today();
        self.pending.date = if self.pending.date.as_deref() == Some(today.as_str()) {
            None
        } else {
            Some(today)
        };
    }

    /// Move the pending date by `days`, starting from today when unset
    pub fn shift_date(&mut self, days: i64) {
        let base = self
            .pending
            .date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let shifted = base + chrono::Duration::days(days);
        self.pending.date = Some(shifted.format("%Y-%m-%d").to_string());
    }

    /// Case-insensitive literal regex for the applied search
    pub fn search_re(&self) -> Option<Regex> {
        if self.applied.search.is_empty() {
            return None;
        }
        Regex::new(&format!("(?i){}", regex::escape(&self.applied.search))).ok()
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            error: false,
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            error: true,
        });
    }

    pub fn toggle_expand(&mut self) {
        if self.view != View::Board {
            return;
        }
        let Some(number) = self
            .board_groups()
            .get(self.board_cursor)
            .map(|g| g.custom_id())
        else {
            return;
        };
        if !self.board_expanded.remove(&number) {
            self.board_expanded.insert(number);
        }
    }

    /// Ask before closing the selected ticket
    pub fn request_close(&mut self) {
        match self.selected_log() {
            Some(log) if log.log_type == LogType::Open => {
                let label = if log.id_label().is_empty() {
                    "this ticket".to_string()
                } else {
                    log.id_label()
                };
                self.mode = Mode::ConfirmClose { id: log.id, label };
            }
            Some(_) => self.set_error("Only open tickets can be closed"),
            None => {}
        }
    }

    pub fn confirm_close(&mut self, id: &str, label: &str) {
        self.mode = Mode::Navigate;
        match log_ops::close_log(self.store.as_ref(), id, None) {
            Ok(log) => {
                tracing::info!(id = %log.id, "ticket closed");
                self.set_status(format!("Closed {}", label));
                self.sync();
            }
            Err(e) => {
                tracing::warn!(error = %e, "close failed");
                self.set_error(e.to_string());
            }
        }
    }

    /// The brief for what the archive currently shows
    pub fn brief_text(&self) -> (String, usize) {
        let items = self.archive_items();
        let text = brief::format_brief(
            &items,
            self.applied.date.as_deref(),
            self.workspace.config.brief.header.as_deref(),
        );
        (text, items.len())
    }

    pub fn copy_brief(&mut self) {
        let (text, count) = self.brief_text();
        match clipboard::copy_text(&text) {
            Ok(()) => self.set_status(format!("Brief copied to clipboard ({} logs)", count)),
            Err(e) => {
                tracing::warn!(error = %e, "clipboard copy failed");
                self.set_error(e.to_string());
            }
        }
    }

    /// Show the command that logs an update against the selected ticket
    pub fn update_hint(&mut self) {
        let number = match self.selected_log() {
            Some(log) if log.log_type == LogType::Open => log.custom_id,
            _ => None,
        };
        match number {
            Some(n) => self.set_status(format!("dl update {} \"...\"", n)),
            None => self.set_error("Select an open ticket to log an update"),
        }
    }
}

/// Run the TUI application
pub fn run(dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let start = match dir {
        Some(d) => std::fs::canonicalize(d)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", d, e))?,
        None => std::env::current_dir()?,
    };
    let root: PathBuf = discover_workspace(&start)?;
    let workspace = load_workspace(&root)?;
    logging::init_file(&workspace.dir);

    let store = FileStore::open(&workspace);
    let mut app = App::new(workspace, Box::new(store));
    app.mount()?;
    tracing::info!(root = %root.display(), "terminal ui started");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app);

    app.unmount();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        app.sync();
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(250))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
