use std::collections::HashSet;
use std::fmt;

use crate::model::log::{Category, LogRecord, LogType};

/// Category restriction of a filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Work,
    Home,
}

impl CategoryFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            CategoryFilter::All => "All",
            CategoryFilter::Work => "Work",
            CategoryFilter::Home => "Home",
        }
    }

    pub fn parse(s: &str) -> Option<CategoryFilter> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Some(CategoryFilter::All),
            "work" => Some(CategoryFilter::Work),
            "home" => Some(CategoryFilter::Home),
            _ => None,
        }
    }

    /// All → Work → Home → All
    pub fn next(self) -> CategoryFilter {
        match self {
            CategoryFilter::All => CategoryFilter::Work,
            CategoryFilter::Work => CategoryFilter::Home,
            CategoryFilter::Home => CategoryFilter::All,
        }
    }

    pub fn matches(self, log: &LogRecord) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Work => log.has_category(Category::Work),
            CategoryFilter::Home => log.has_category(Category::Home),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which date fields a date filter compares against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateMatch {
    /// `date_string` only
    Exact,
    /// `date_string`, or `closed_date` so a ticket shows on the day it closed
    #[default]
    ExactOrClosed,
}

impl DateMatch {
    pub fn from_config(match_closed_date: bool) -> DateMatch {
        if match_closed_date {
            DateMatch::ExactOrClosed
        } else {
            DateMatch::Exact
        }
    }
}

/// Applied filter criteria
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Case-insensitive substring of entry or subject; empty matches all
    pub search: String,
    pub category: CategoryFilter,
    /// `YYYY-MM-DD`
    pub date: Option<String>,
    /// Widen the result to every open ticket and the updates of the
    /// matching ones
    pub show_context: bool,
    pub date_match: DateMatch,
}

impl FilterCriteria {
    /// Whether any restriction is set
    pub fn is_active(&self) -> bool {
        !self.search.is_empty()
            || self.category != CategoryFilter::All
            || self.date.is_some()
            || self.show_context
    }

    fn text_matches(&self, needle: &str, log: &LogRecord) -> bool {
        needle.is_empty()
            || log.entry.to_lowercase().contains(needle)
            || log
                .subject
                .as_deref()
                .is_some_and(|s| s.to_lowercase().contains(needle))
    }

    fn date_matches(&self, log: &LogRecord) -> bool {
        let Some(date) = self.date.as_deref() else {
            return true;
        };
        log.date_string == date
            || (self.date_match == DateMatch::ExactOrClosed
                && log.closed_date.as_deref() == Some(date))
    }
}

/// Select the visible logs. Input order is kept.
pub fn filter_logs(logs: &[LogRecord], criteria: &FilterCriteria) -> Vec<LogRecord> {
    let needle = criteria.search.to_lowercase();
    let text_category =
        |log: &LogRecord| criteria.text_matches(&needle, log) && criteria.category.matches(log);

    let open_tickets: HashSet<u64> = logs
        .iter()
        .filter(|log| log.log_type == LogType::Open && text_category(log))
        .filter_map(|log| log.custom_id)
        .collect();

    logs.iter()
        .filter(|log| {
            if !criteria.show_context {
                return text_category(log) && criteria.date_matches(log);
            }
            criteria.date_matches(log)
                || log.log_type == LogType::Open
                || (log.log_type == LogType::Done
                    && log.task_ref.is_some_and(|r| open_tickets.contains(&r)))
        })
        .cloned()
        .collect()
}
