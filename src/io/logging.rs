use std::env;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Filter directive env var, e.g. `DAYLOG_LOG=daylog=debug`
pub const LOG_ENV: &str = "DAYLOG_LOG";
/// `json` for JSON lines, anything else for compact text
pub const LOG_FORMAT_ENV: &str = "DAYLOG_LOG_FORMAT";
const DEFAULT_FILTER: &str = "daylog=info,warn";

/// File the TUI logs into, inside `daylog/`
pub const TUI_LOG_FILE: &str = "daylog.log";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn json_format() -> bool {
    env::var(LOG_FORMAT_ENV).is_ok_and(|f| f == "json")
}

/// Log to stderr (CLI commands). Safe to call more than once.
pub fn init_stderr() {
    let registry = tracing_subscriber::registry().with(filter());
    let result = if json_format() {
        registry
            .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init()
    };
    let _ = result;
}

/// Log to `dir/daylog.log` so the terminal UI is not drawn over. Falls back
/// to no logging when the file cannot be opened.
pub fn init_file(dir: &Path) {
    let path = dir.join(TUI_LOG_FILE);
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(f) => f,
        Err(_) => return,
    };
    let writer = Mutex::new(file);
    let registry = tracing_subscriber::registry().with(filter());
    let result = if json_format() {
        registry
            .with(fmt::layer().json().with_ansi(false).with_writer(writer))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_ansi(false).with_writer(writer))
            .try_init()
    };
    let _ = result;
}
