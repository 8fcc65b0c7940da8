use std::path::PathBuf;

use super::config::StoreConfig;

/// A discovered daylog directory and its configuration
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Directory containing `daylog/`
    pub root: PathBuf,
    /// Path to the `daylog/` directory
    pub dir: PathBuf,
    /// Parsed config.toml
    pub config: StoreConfig,
}

impl Workspace {
    /// The JSON document file holding every log
    pub fn logs_path(&self) -> PathBuf {
        self.dir.join("logs.json")
    }

    /// Directory uploaded attachments are copied into
    pub fn blobs_dir(&self) -> PathBuf {
        self.dir.join("blobs")
    }
}
