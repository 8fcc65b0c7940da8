use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::log::{
    Attachment, Category, CategoryOrigin, LegacyCategory, Link, LogRecord, LogType,
    normalize_categories,
};

/// A log as it is persisted: every shape any revision ever wrote.
///
/// Fields this crate does not know about are kept in `extra` so partial
/// updates never drop them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogDocument {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub log_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    /// Legacy singular category: `Work`, `Home` or `Both`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default)]
    pub entry: String,
    /// Number or numeric string, depending on which form wrote it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_ref: Option<Value>,
    #[serde(default)]
    pub date_string: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
    /// Legacy single image attachment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Fields of a log about to be created. The store fills in `id`,
/// `created_at` and, for `Open` logs, `custom_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDraft {
    pub log_type: LogType,
    pub categories: Vec<Category>,
    pub subject: Option<String>,
    pub entry: String,
    pub task_ref: Option<u64>,
    pub date_string: String,
    pub timestamp: String,
    pub attachments: Vec<Attachment>,
    pub links: Vec<Link>,
}

/// A partial update. `None` leaves a field untouched; for optional fields
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogPatch {
    pub log_type: Option<LogType>,
    pub categories: Option<Vec<Category>>,
    pub subject: Option<Option<String>>,
    pub entry: Option<String>,
    pub task_ref: Option<Option<u64>>,
    pub date_string: Option<String>,
    pub timestamp: Option<String>,
    pub closed_date: Option<Option<String>>,
    pub attachments: Option<Vec<Attachment>>,
    pub links: Option<Vec<Link>>,
}

impl LogPatch {
    pub fn is_empty(&self) -> bool {
        *self == LogPatch::default()
    }
}

impl LogDocument {
    /// Build the canonical document for a new log
    pub fn from_draft(draft: LogDraft, created_at: DateTime<Utc>, custom_id: Option<u64>) -> Self {
        LogDocument {
            log_type: Some(draft.log_type.as_str().to_string()),
            categories: Some(category_names(&draft.categories)),
            subject: draft.subject,
            entry: draft.entry,
            task_ref: draft.task_ref.map(Value::from),
            date_string: draft.date_string,
            timestamp: draft.timestamp,
            custom_id,
            attachments: Some(draft.attachments),
            links: Some(draft.links),
            created_at: Some(created_at),
            ..Default::default()
        }
    }

    /// Apply a partial update in place
    pub fn apply(&mut self, patch: &LogPatch) {
        if let Some(t) = patch.log_type {
            self.log_type = Some(t.as_str().to_string());
        }
        if let Some(cats) = &patch.categories {
            self.categories = Some(category_names(cats));
        }
        if let Some(subject) = &patch.subject {
            self.subject.clone_from(subject);
        }
        if let Some(entry) = &patch.entry {
            self.entry.clone_from(entry);
        }
        if let Some(task_ref) = patch.task_ref {
            self.task_ref = task_ref.map(Value::from);
        }
        if let Some(date) = &patch.date_string {
            self.date_string.clone_from(date);
        }
        if let Some(ts) = &patch.timestamp {
            self.timestamp.clone_from(ts);
        }
        if let Some(closed) = &patch.closed_date {
            self.closed_date.clone_from(closed);
        }
        if let Some(attachments) = &patch.attachments {
            self.attachments = Some(attachments.clone());
        }
        if let Some(links) = &patch.links {
            self.links = Some(links.clone());
        }
    }

    /// The stored type, read leniently
    pub fn parsed_type(&self) -> LogType {
        match self.log_type.as_deref() {
            Some(raw) => LogType::parse(raw).unwrap_or_else(|| {
                tracing::warn!(log_type = raw, "unknown log type, reading as Note");
                LogType::Note
            }),
            None => LogType::Note,
        }
    }
}

fn category_names(categories: &[Category]) -> Vec<String> {
    normalize_categories(categories.to_vec())
        .into_iter()
        .map(|c| c.as_str().to_string())
        .collect()
}

/// Read a `taskRef` stored as a number or a numeric string
fn parse_task_ref(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl LogRecord {
    /// Normalize a stored document into the canonical record shape.
    pub fn from_document(id: &str, doc: &LogDocument) -> LogRecord {
        let (categories, category_origin) = match (&doc.categories, &doc.category) {
            (Some(list), _) => {
                let labels: Vec<String> = list
                    .iter()
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                let cats: Vec<Category> =
                    labels.iter().filter_map(|s| Category::parse(s)).collect();
                let origin = if cats.len() == labels.len() {
                    CategoryOrigin::Explicit
                } else {
                    CategoryOrigin::Unrecognized(labels)
                };
                (normalize_categories(cats), origin)
            }
            (None, Some(legacy)) => match LegacyCategory::parse(legacy) {
                Some(l) => (l.expand(), CategoryOrigin::Legacy(l)),
                None if legacy.trim().is_empty() => (Vec::new(), CategoryOrigin::Missing),
                None => (
                    Vec::new(),
                    CategoryOrigin::Unrecognized(vec![legacy.trim().to_string()]),
                ),
            },
            (None, None) => (Vec::new(), CategoryOrigin::Missing),
        };

        let mut attachments = doc.attachments.clone().unwrap_or_default();
        if let Some(url) = doc.image_url.as_deref().filter(|u| !u.is_empty()) {
            attachments.push(Attachment {
                name: "image".to_string(),
                url: url.to_string(),
                kind: "image".to_string(),
            });
        }

        LogRecord {
            id: id.to_string(),
            custom_id: doc.custom_id,
            log_type: doc.parsed_type(),
            categories,
            category_origin,
            subject: doc.subject.clone().filter(|s| !s.is_empty()),
            entry: doc.entry.clone(),
            task_ref: doc.task_ref.as_ref().and_then(parse_task_ref),
            date_string: doc.date_string.clone(),
            timestamp: doc.timestamp.clone(),
            closed_date: doc.closed_date.clone().filter(|d| !d.is_empty()),
            attachments,
            links: doc.links.clone().unwrap_or_default(),
            created_at: doc.created_at,
        }
    }
}
