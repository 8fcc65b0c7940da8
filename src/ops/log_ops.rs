use std::path::PathBuf;

use chrono::{Local, NaiveDate, NaiveTime};

use crate::io::blob::{BlobError, BlobStore};
use crate::io::store::{LogStore, Query, StoreError};
use crate::model::document::{LogDraft, LogPatch};
use crate::model::log::{Category, Link, LogRecord, LogType, normalize_categories};

/// Input rejected before anything is written
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("entry text is required")]
    EmptyEntry,
    #[error("select at least one category (work, home)")]
    NoCategory,
    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),
    #[error("invalid time '{0}' (expected HH:MM)")]
    InvalidTime(String),
    #[error("too many attachments: {count} (max {max})")]
    TooManyAttachments { count: usize, max: usize },
}

/// Error type for log mutations
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{source} ({orphaned} uploaded file(s) left unreferenced)")]
    Upload { source: BlobError, orphaned: usize },
    #[error("no log matches '{0}'")]
    NotFound(String),
    #[error("'{reference}' matches {count} logs, use a longer id")]
    Ambiguous { reference: String, count: usize },
    #[error("log {0} is not an open ticket")]
    NotOpen(String),
}

/// A new log as entered by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogInput {
    pub log_type: LogType,
    pub categories: Vec<Category>,
    pub subject: Option<String>,
    pub entry: String,
    /// Ticket number a Done log updates; dropped for other types
    pub task_ref: Option<u64>,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`, single-digit hours accepted
    pub time: String,
    /// Local files to upload
    pub attachments: Vec<PathBuf>,
    pub links: Vec<Link>,
}

impl LogInput {
    /// A Done log for `task_ref`, dated now
    pub fn update_for(task_ref: u64, entry: &str, categories: Vec<Category>) -> Self {
        let now = Local::now();
        LogInput {
            log_type: LogType::Done,
            categories,
            subject: None,
            entry: entry.to_string(),
            task_ref: Some(task_ref),
            date: now.format("%Y-%m-%d").to_string(),
            time: now.format("%H:%M").to_string(),
            attachments: Vec::new(),
            links: Vec::new(),
        }
    }
}

/// Today's date in local time
pub fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

pub fn parse_date(date: &str) -> Result<String, ValidationError> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| ValidationError::InvalidDate(date.to_string()))
}

/// Parse a time and re-emit it zero-padded, so timestamps keep sorting as
/// strings.
pub fn parse_time(time: &str) -> Result<String, ValidationError> {
    NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| ValidationError::InvalidTime(time.to_string()))
}

fn check_entry(entry: &str) -> Result<String, ValidationError> {
    let trimmed = entry.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyEntry);
    }
    Ok(trimmed.to_string())
}

fn check_categories(categories: &[Category]) -> Result<Vec<Category>, ValidationError> {
    if categories.is_empty() {
        return Err(ValidationError::NoCategory);
    }
    Ok(normalize_categories(categories.to_vec()))
}

fn clean_subject(subject: Option<String>) -> Option<String> {
    subject
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Validate an input and build the draft the store receives. Attachments
/// are left empty until uploaded.
pub fn validate(input: &LogInput, max_files: usize) -> Result<LogDraft, ValidationError> {
    let entry = check_entry(&input.entry)?;
    let categories = check_categories(&input.categories)?;
    let date = parse_date(&input.date)?;
    let time = parse_time(&input.time)?;
    if input.attachments.len() > max_files {
        return Err(ValidationError::TooManyAttachments {
            count: input.attachments.len(),
            max: max_files,
        });
    }
    let task_ref = if input.log_type == LogType::Done {
        input.task_ref
    } else {
        None
    };
    Ok(LogDraft {
        log_type: input.log_type,
        categories,
        subject: clean_subject(input.subject.clone()),
        entry,
        task_ref,
        timestamp: format!("{}T{}", date, time),
        date_string: date,
        attachments: Vec::new(),
        links: input.links.clone(),
    })
}

/// Validate, upload attachments, then write the log.
///
/// Uploads run in parallel and must all succeed. Files uploaded before a
/// failure are left behind and logged.
pub fn create_log(
    store: &dyn LogStore,
    blobs: &BlobStore,
    input: &LogInput,
    max_files: usize,
) -> Result<LogRecord, LogError> {
    let mut draft = validate(input, max_files)?;

    if !input.attachments.is_empty() {
        draft.attachments = blobs.upload_all(&input.attachments).map_err(|partial| {
            for orphan in &partial.orphaned {
                tracing::warn!(url = %orphan.url, "orphaned upload");
            }
            LogError::Upload {
                orphaned: partial.orphaned.len(),
                source: partial.error,
            }
        })?;
    }

    let uploaded: Vec<String> = draft.attachments.iter().map(|a| a.url.clone()).collect();
    store.create(draft).map_err(|e| {
        for url in &uploaded {
            tracing::warn!(url = %url, "orphaned upload");
        }
        LogError::Store(e)
    })
}

/// Fields of an existing log to change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogEdit {
    pub log_type: Option<LogType>,
    pub categories: Option<Vec<Category>>,
    /// `Some(None)` clears the subject
    pub subject: Option<Option<String>>,
    pub entry: Option<String>,
    pub task_ref: Option<Option<u64>>,
    pub date: Option<String>,
    pub time: Option<String>,
}

/// Turn an edit of `current` into a store patch.
///
/// The timestamp is recombined from the (new or kept) date and time. A task
/// reference only survives on Done logs, and a closing date only on Closed
/// ones.
pub fn edit_patch(current: &LogRecord, edit: &LogEdit) -> Result<LogPatch, ValidationError> {
    let mut patch = LogPatch {
        log_type: edit.log_type,
        subject: edit.subject.clone().map(clean_subject),
        ..Default::default()
    };
    if let Some(entry) = &edit.entry {
        patch.entry = Some(check_entry(entry)?);
    }
    if let Some(categories) = &edit.categories {
        patch.categories = Some(check_categories(categories)?);
    }

    let date = edit.date.as_deref().map(parse_date).transpose()?;
    let time = edit.time.as_deref().map(parse_time).transpose()?;
    if date.is_some() || time.is_some() {
        let new_date = date.clone().unwrap_or_else(|| current.date_string.clone());
        let new_time = time.unwrap_or_else(|| current.time_part().to_string());
        patch.timestamp = Some(format!("{}T{}", new_date, new_time));
        patch.date_string = date;
    }

    let final_type = edit.log_type.unwrap_or(current.log_type);
    if final_type == LogType::Done {
        patch.task_ref = edit.task_ref;
    } else if current.task_ref.is_some() || edit.task_ref.is_some() {
        patch.task_ref = Some(None);
    }
    if final_type != LogType::Closed && current.closed_date.is_some() {
        patch.closed_date = Some(None);
    }
    Ok(patch)
}

pub fn edit_log(store: &dyn LogStore, id: &str, edit: &LogEdit) -> Result<LogRecord, LogError> {
    let current = store
        .get(id)?
        .ok_or_else(|| LogError::NotFound(id.to_string()))?;
    let patch = edit_patch(&current, edit)?;
    if patch.is_empty() {
        return Ok(current);
    }
    Ok(store.update(id, &patch)?)
}

/// Close an open ticket on `date` (today when `None`). The ticket keeps its
/// number.
pub fn close_log(store: &dyn LogStore, id: &str, date: Option<&str>) -> Result<LogRecord, LogError> {
    let current = store
        .get(id)?
        .ok_or_else(|| LogError::NotFound(id.to_string()))?;
    if current.log_type != LogType::Open {
        return Err(LogError::NotOpen(id.to_string()));
    }
    let closed_date = match date {
        Some(d) => parse_date(d)?,
        None => today(),
    };
    let patch = LogPatch {
        log_type: Some(LogType::Closed),
        closed_date: Some(Some(closed_date)),
        ..Default::default()
    };
    Ok(store.update(id, &patch)?)
}

pub fn delete_log(store: &dyn LogStore, id: &str) -> Result<(), LogError> {
    store.delete(id).map_err(|e| match e {
        StoreError::NotFound(id) => LogError::NotFound(id),
        other => LogError::Store(other),
    })
}

/// Find a log by full id, unique id prefix, or `#N` ticket number. For a
/// ticket number shared by several logs, the newest wins.
pub fn resolve_log(store: &dyn LogStore, reference: &str) -> Result<LogRecord, LogError> {
    let reference = reference.trim();
    if let Some(number) = reference.strip_prefix('#') {
        let number: u64 = number
            .parse()
            .map_err(|_| LogError::NotFound(reference.to_string()))?;
        return store
            .query(&Query::all())?
            .into_iter()
            .find(|r| r.custom_id == Some(number))
            .ok_or_else(|| LogError::NotFound(reference.to_string()));
    }

    if reference.is_empty() {
        return Err(LogError::NotFound(reference.to_string()));
    }
    if let Some(record) = store.get(reference)? {
        return Ok(record);
    }
    let mut matches: Vec<LogRecord> = store
        .query(&Query::all())?
        .into_iter()
        .filter(|r| r.id.starts_with(reference))
        .collect();
    match matches.len() {
        0 => Err(LogError::NotFound(reference.to_string())),
        1 => Ok(matches.remove(0)),
        count => Err(LogError::Ambiguous {
            reference: reference.to_string(),
            count,
        }),
    }
}
