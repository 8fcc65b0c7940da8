use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role a log plays in the ticket hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogType {
    /// A ticket that is still being worked on (carries a `custom_id`)
    Open,
    /// A progress update, optionally referencing a ticket via `task_ref`
    Done,
    /// A ticket that has been closed (keeps its `custom_id`)
    Closed,
    /// A free-standing note
    Note,
}

impl LogType {
    pub fn as_str(self) -> &'static str {
        match self {
            LogType::Open => "Open",
            LogType::Done => "Done",
            LogType::Closed => "Closed",
            LogType::Note => "Note",
        }
    }

    /// Parse a stored or user-supplied type name (case-insensitive).
    ///
    /// `Do` is the name earlier revisions used for open work.
    pub fn parse(s: &str) -> Option<LogType> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" | "do" => Some(LogType::Open),
            "done" => Some(LogType::Done),
            "closed" => Some(LogType::Closed),
            "note" => Some(LogType::Note),
            _ => None,
        }
    }

    /// Tickets are the parent nodes of the hierarchy
    pub fn is_ticket(self) -> bool {
        matches!(self, LogType::Open | LogType::Closed)
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Life area a log belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Work,
    Home,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Work => "Work",
            Category::Home => "Home",
        }
    }

    pub fn parse(s: &str) -> Option<Category> {
        match s.trim().to_ascii_lowercase().as_str() {
            "work" => Some(Category::Work),
            "home" => Some(Category::Home),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The singular `category` field written by earlier revisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegacyCategory {
    Work,
    Home,
    Both,
}

impl LegacyCategory {
    pub fn parse(s: &str) -> Option<LegacyCategory> {
        match s.trim().to_ascii_lowercase().as_str() {
            "work" => Some(LegacyCategory::Work),
            "home" => Some(LegacyCategory::Home),
            "both" => Some(LegacyCategory::Both),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LegacyCategory::Work => "Work",
            LegacyCategory::Home => "Home",
            LegacyCategory::Both => "Both",
        }
    }

    pub fn expand(self) -> Vec<Category> {
        match self {
            LegacyCategory::Work => vec![Category::Work],
            LegacyCategory::Home => vec![Category::Home],
            LegacyCategory::Both => vec![Category::Work, Category::Home],
        }
    }
}

/// Where a record's categories came from. Only used for display: the
/// canonical `categories` list is what filtering looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryOrigin {
    /// A `categories` list was stored
    Explicit,
    /// Only the legacy singular `category` was stored
    Legacy(LegacyCategory),
    /// Labels outside Work/Home were stored; shown as written
    Unrecognized(Vec<String>),
    /// Neither field was stored
    Missing,
}

/// A file attached to a log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
    /// MIME-ish content type, e.g. `image/png`
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// A titled hyperlink attached to a log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub title: String,
    pub url: String,
}

/// A single log in canonical shape.
///
/// Built from a stored document by [`LogRecord::from_document`]; legacy
/// field shapes never reach code downstream of the store.
///
/// [`LogRecord::from_document`]: crate::model::LogRecord::from_document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Opaque store-assigned identifier
    pub id: String,
    /// Ticket number, assigned when an `Open` log is created
    pub custom_id: Option<u64>,
    pub log_type: LogType,
    /// Work before Home, no duplicates
    pub categories: Vec<Category>,
    pub category_origin: CategoryOrigin,
    pub subject: Option<String>,
    pub entry: String,
    /// `custom_id` of the ticket a `Done` log updates
    pub task_ref: Option<u64>,
    /// `YYYY-MM-DD`
    pub date_string: String,
    /// `YYYY-MM-DDTHH:MM`
    pub timestamp: String,
    pub closed_date: Option<String>,
    pub attachments: Vec<Attachment>,
    pub links: Vec<Link>,
    pub created_at: Option<DateTime<Utc>>,
}

impl LogRecord {
    pub fn has_category(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    /// Categories as shown on badges: `Work & Home`, a legacy label, the
    /// stored labels when they are not recognized, or `Work` when nothing
    /// was recorded.
    pub fn display_categories(&self) -> String {
        match &self.category_origin {
            CategoryOrigin::Explicit => self
                .categories
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(" & "),
            CategoryOrigin::Legacy(legacy) => legacy.as_str().to_string(),
            CategoryOrigin::Unrecognized(labels) => labels.join(" & "),
            CategoryOrigin::Missing => "Work".to_string(),
        }
    }

    /// The `HH:MM` part of the timestamp
    pub fn time_part(&self) -> &str {
        self.timestamp
            .split_once('T')
            .map(|(_, time)| time)
            .unwrap_or("")
    }

    /// `#5`, `(Ref: #3)` or both, for list rows
    pub fn id_label(&self) -> String {
        let mut parts = Vec::new();
        if let Some(id) = self.custom_id {
            parts.push(format!("#{}", id));
        }
        if let Some(r) = self.task_ref {
            parts.push(format!("(Ref: #{})", r));
        }
        parts.join(" ")
    }
}

/// Normalize a category list: known values only, Work before Home, deduplicated.
pub fn normalize_categories(mut categories: Vec<Category>) -> Vec<Category> {
    categories.sort();
    categories.dedup();
    categories
}
