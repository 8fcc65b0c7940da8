use std::fs;
use std::path::Path;

use crate::io::workspace_io::WorkspaceError;
use crate::model::config::{StoreConfig, TicketOrder};

/// Error type for `dl config set`
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown config key: {0}")]
    UnknownKey(String),
    #[error("invalid value for {key}: {value:?} (expected {expected})")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

/// Keys `dl config set` understands, with the kind of value each takes
pub const SETTABLE_KEYS: &[(&str, &str)] = &[
    ("store.name", "string"),
    ("feed.limit", "positive integer"),
    ("archive.ticket_order", "original | open-then-closed | custom-id"),
    ("archive.match_closed_date", "true | false"),
    ("board.ticket_order", "original | open-then-closed | custom-id"),
    ("uploads.max_files", "positive integer"),
    ("brief.header", "string"),
];

/// Read the config, returning both the parsed config and the raw
/// toml_edit Document for round-trip-safe editing.
pub fn read_config(dir: &Path) -> Result<(StoreConfig, toml_edit::DocumentMut), WorkspaceError> {
    let config_path = dir.join("config.toml");
    let config_text = fs::read_to_string(&config_path).map_err(|e| WorkspaceError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    let config: StoreConfig = toml::from_str(&config_text)?;
    let doc: toml_edit::DocumentMut = config_text.parse()?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), WorkspaceError> {
    let config_path = dir.join("config.toml");
    fs::write(&config_path, doc.to_string()).map_err(|e| WorkspaceError::ReadError {
        path: config_path,
        source: e,
    })?;
    Ok(())
}

/// Validate `value` for `key` and set it in the document.
pub fn set_value(doc: &mut toml_edit::DocumentMut, key: &str, value: &str) -> Result<(), ConfigError> {
    let expected = SETTABLE_KEYS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, e)| *e)
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
    let invalid = || ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    };

    let item = match key {
        "feed.limit" | "uploads.max_files" => {
            let n: i64 = value.parse().map_err(|_| invalid())?;
            if n <= 0 {
                return Err(invalid());
            }
            toml_edit::value(n)
        }
        "archive.match_closed_date" => {
            let b: bool = value.parse().map_err(|_| invalid())?;
            toml_edit::value(b)
        }
        "archive.ticket_order" | "board.ticket_order" => {
            let order = TicketOrder::parse(value).ok_or_else(invalid)?;
            toml_edit::value(order.as_str())
        }
        _ => toml_edit::value(value),
    };

    let (table, field) = key.split_once('.').ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
    if !doc.contains_key(table) {
        doc[table] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc[table][field] = item;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_config() -> &'static str {
        r#"[store]
name = "journal"

# how many logs the feed shows
[feed]
limit = 20

[board]
ticket_order = "custom-id"
"#
    }

    #[test]
    fn test_round_trip_config() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        fs::write(&config_path, sample_config()).unwrap();

        let (_config, doc) = read_config(tmp.path()).unwrap();
        write_config(tmp.path(), &doc).unwrap();

        let written = fs::read_to_string(&config_path).unwrap();
        assert_eq!(written, sample_config());
    }

    #[test]
    fn test_set_ticket_order_keeps_comments() {
        let mut doc: toml_edit::DocumentMut = sample_config().parse().unwrap();
        set_value(&mut doc, "board.ticket_order", "open-then-closed").unwrap();
        let result = doc.to_string();
        assert!(result.contains("# how many logs the feed shows"));
        let config: StoreConfig = toml::from_str(&result).unwrap();
        assert_eq!(config.board.ticket_order, TicketOrder::OpenThenClosed);
    }

    #[test]
    fn test_set_creates_missing_table() {
        let mut doc: toml_edit::DocumentMut = sample_config().parse().unwrap();
        set_value(&mut doc, "archive.match_closed_date", "false").unwrap();
        set_value(&mut doc, "uploads.max_files", "3").unwrap();
        let config: StoreConfig = toml::from_str(&doc.to_string()).unwrap();
        assert!(!config.archive.match_closed_date);
        assert_eq!(config.uploads.max_files, 3);
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut doc: toml_edit::DocumentMut = sample_config().parse().unwrap();
        assert!(matches!(
            set_value(&mut doc, "feed.limit", "0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            set_value(&mut doc, "board.ticket_order", "newest"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            set_value(&mut doc, "ui.theme", "dark"),
            Err(ConfigError::UnknownKey(_))
        ));
    }
}
