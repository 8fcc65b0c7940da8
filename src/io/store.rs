//! The persistence seam: a document collection of logs with partial updates,
//! simple ordered queries and live subscriptions.
//!
//! Two implementations live next to this module: [`FileStore`] keeps the
//! documents in `daylog/logs.json`, [`MemoryStore`] keeps them in process.
//!
//! [`FileStore`]: crate::io::file_store::FileStore
//! [`MemoryStore`]: crate::io::memory_store::MemoryStore

use std::any::Any;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::io::lock::LockError;
use crate::model::document::{LogDocument, LogDraft, LogPatch};
use crate::model::log::{LogRecord, LogType};
use crate::ops::ids;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("log not found: {0}")]
    NotFound(String),
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed document file {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("could not watch {path}: {source}")]
    Watch {
        path: PathBuf,
        source: notify::Error,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("no ticket number left after #{0}")]
    IdsExhausted(u64),
}

/// Sort order of a query. Both orders are descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderBy {
    #[default]
    TimestampDesc,
    /// Only documents that carry a ticket number are returned
    CustomIdDesc,
}

/// An equality filter on the date, an order and an optional limit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub date_eq: Option<String>,
    pub order: OrderBy,
    pub limit: Option<usize>,
}

impl Query {
    /// Every log, newest first
    pub fn all() -> Self {
        Query::default()
    }

    /// The `limit` newest logs
    pub fn recent(limit: usize) -> Self {
        Query {
            limit: Some(limit),
            ..Query::default()
        }
    }

    /// Logs whose `dateString` equals `date`, newest first
    pub fn on_date(date: &str) -> Self {
        Query {
            date_eq: Some(date.to_string()),
            ..Query::default()
        }
    }

    /// The single log holding the highest ticket number
    pub fn max_custom_id() -> Self {
        Query {
            date_eq: None,
            order: OrderBy::CustomIdDesc,
            limit: Some(1),
        }
    }
}

/// A full result set pushed to subscribers
pub type Snapshot = Vec<LogRecord>;

/// A live query. The first snapshot is available immediately; every later
/// write to the store pushes a fresh one. Dropping (or [`stop`]ping) the
/// subscription ends it.
///
/// [`stop`]: Subscription::stop
pub struct Subscription {
    rx: Receiver<Snapshot>,
    _guard: Option<Box<dyn Any + Send>>,
}

impl Subscription {
    pub(crate) fn new(rx: Receiver<Snapshot>, guard: Option<Box<dyn Any + Send>>) -> Self {
        Subscription { rx, _guard: guard }
    }

    /// Newest pending snapshot, skipping any older ones. Never blocks.
    pub fn try_latest(&self) -> Option<Snapshot> {
        let mut latest = None;
        while let Ok(snapshot) = self.rx.try_recv() {
            latest = Some(snapshot);
        }
        latest
    }

    /// Wait up to `timeout` for a snapshot, then drain to the newest one.
    pub fn wait(&self, timeout: Duration) -> Option<Snapshot> {
        match self.rx.recv_timeout(timeout) {
            Ok(first) => Some(self.try_latest().unwrap_or(first)),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// End the subscription
    pub fn stop(self) {}
}

/// The persistence collaborator.
pub trait LogStore {
    /// Insert a new log. `Open` logs receive the next ticket number inside
    /// the store's write critical section.
    fn create(&self, draft: LogDraft) -> Result<LogRecord, StoreError>;

    /// Apply a partial update, returning the updated log
    fn update(&self, id: &str, patch: &LogPatch) -> Result<LogRecord, StoreError>;

    /// Remove a log permanently
    fn delete(&self, id: &str) -> Result<(), StoreError>;

    fn get(&self, id: &str) -> Result<Option<LogRecord>, StoreError>;

    fn query(&self, query: &Query) -> Result<Vec<LogRecord>, StoreError>;

    /// Start a live query
    fn subscribe(&self, query: Query) -> Result<Subscription, StoreError>;
}

/// Run a query over `(id, document)` pairs. Ties in the sort key fall back to
/// the id, newest first.
pub fn apply_query<'a, I>(documents: I, query: &Query) -> Vec<LogRecord>
where
    I: IntoIterator<Item = (&'a str, &'a LogDocument)>,
{
    let mut records: Vec<LogRecord> = documents
        .into_iter()
        .filter(|(_, doc)| {
            query
                .date_eq
                .as_deref()
                .is_none_or(|date| doc.date_string == date)
        })
        .filter(|(_, doc)| query.order != OrderBy::CustomIdDesc || doc.custom_id.is_some())
        .map(|(id, doc)| LogRecord::from_document(id, doc))
        .collect();

    match query.order {
        OrderBy::TimestampDesc => {
            records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)))
        }
        OrderBy::CustomIdDesc => {
            records.sort_by(|a, b| b.custom_id.cmp(&a.custom_id).then_with(|| b.id.cmp(&a.id)))
        }
    }

    if let Some(limit) = query.limit {
        records.truncate(limit);
    }
    records
}

/// Build the stored document for a draft, assigning a ticket number to
/// `Open` logs from the documents already present.
pub fn prepare_document<'a, I>(
    draft: LogDraft,
    existing: I,
    now: DateTime<Utc>,
) -> Result<LogDocument, StoreError>
where
    I: IntoIterator<Item = &'a LogDocument>,
{
    let custom_id = (draft.log_type == LogType::Open)
        .then(|| ids::next_custom_id(existing.into_iter().map(|d| d.custom_id)))
        .transpose()?;
    Ok(LogDocument::from_draft(draft, now, custom_id))
}

/// Generate a document id: creation time in hex plus a disambiguating
/// counter, so ids sort in creation order.
pub fn generate_id<F>(now: DateTime<Utc>, taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    let millis = now.timestamp_millis().max(0) as u64;
    (0u32..)
        .map(|n| format!("{:011x}{:04x}", millis, n))
        .find(|id| !taken(id))
        .unwrap_or_else(|| format!("{:011x}", millis))
}
