use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Configuration from daylog/config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub store: StoreInfo,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
    #[serde(default)]
    pub brief: BriefConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreInfo {
    pub name: String,
}

impl Default for StoreInfo {
    fn default() -> Self {
        StoreInfo {
            name: "daylog".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Default: see src/templates/config.toml
    #[serde(default = "default_feed_limit")]
    pub limit: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            limit: default_feed_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default = "default_archive_order")]
    pub ticket_order: TicketOrder,
    /// Count a Closed ticket as visible on the day it closed
    #[serde(default = "default_true")]
    pub match_closed_date: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        ArchiveConfig {
            ticket_order: default_archive_order(),
            match_closed_date: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default = "default_board_order")]
    pub ticket_order: TicketOrder,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            ticket_order: default_board_order(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        UploadConfig {
            max_files: default_max_files(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BriefConfig {
    /// Replaces the first line of the brief template
    #[serde(default)]
    pub header: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub show_key_hints: bool,
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

/// How tickets are ordered when grouped with their children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TicketOrder {
    /// Input order, Open and Closed interleaved
    Original,
    /// Open tickets (input order), then Closed tickets (input order)
    OpenThenClosed,
    /// Open tickets by ascending ticket number, then Closed the same way
    #[serde(rename = "custom-id")]
    CustomIdAscending,
}

impl TicketOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            TicketOrder::Original => "original",
            TicketOrder::OpenThenClosed => "open-then-closed",
            TicketOrder::CustomIdAscending => "custom-id",
        }
    }

    pub fn parse(s: &str) -> Option<TicketOrder> {
        match s {
            "original" => Some(TicketOrder::Original),
            "open-then-closed" => Some(TicketOrder::OpenThenClosed),
            "custom-id" => Some(TicketOrder::CustomIdAscending),
            _ => None,
        }
    }
}

impl fmt::Display for TicketOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default: see src/templates/config.toml
fn default_true() -> bool {
    true
}

/// Default: see src/templates/config.toml
fn default_feed_limit() -> usize {
    20
}

/// Default: see src/templates/config.toml
fn default_max_files() -> usize {
    5
}

fn default_archive_order() -> TicketOrder {
    TicketOrder::OpenThenClosed
}

fn default_board_order() -> TicketOrder {
    TicketOrder::CustomIdAscending
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: StoreConfig = toml::from_str("").unwrap();
        assert_eq!(config.store.name, "daylog");
        assert_eq!(config.feed.limit, 20);
        assert_eq!(config.uploads.max_files, 5);
        assert!(config.archive.match_closed_date);
        assert_eq!(config.archive.ticket_order, TicketOrder::OpenThenClosed);
        assert_eq!(config.board.ticket_order, TicketOrder::CustomIdAscending);
    }

    #[test]
    fn ticket_order_names_round_trip() {
        let config: StoreConfig = toml::from_str(
            "[board]\nticket_order = \"original\"\n[archive]\nticket_order = \"custom-id\"\n",
        )
        .unwrap();
        assert_eq!(config.board.ticket_order, TicketOrder::Original);
        assert_eq!(config.archive.ticket_order, TicketOrder::CustomIdAscending);
        for order in [
            TicketOrder::Original,
            TicketOrder::OpenThenClosed,
            TicketOrder::CustomIdAscending,
        ] {
            assert_eq!(TicketOrder::parse(order.as_str()), Some(order));
        }
    }
}
