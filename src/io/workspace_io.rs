use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::StoreConfig;
use crate::model::workspace::Workspace;

const CONFIG_TEMPLATE: &str = include_str!("../templates/config.toml");

/// Error type for workspace I/O operations
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("not a daylog directory: no daylog/ directory found")]
    NotAWorkspace,
    #[error("daylog/ already exists in {0} (use --force to reinitialize)")]
    AlreadyInitialized(PathBuf),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("could not edit config.toml: {0}")]
    ConfigEditError(#[from] toml_edit::TomlError),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Discover the daylog workspace by walking up from the given directory,
/// looking for a `daylog/` subdirectory.
pub fn discover_workspace(start: &Path) -> Result<PathBuf, WorkspaceError> {
    let mut current = start.to_path_buf();
    loop {
        let dir = current.join("daylog");
        if dir.is_dir() && dir.join("config.toml").exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(WorkspaceError::NotAWorkspace);
        }
    }
}

/// Load the workspace rooted at the given directory.
pub fn load_workspace(root: &Path) -> Result<Workspace, WorkspaceError> {
    let dir = root.join("daylog");
    if !dir.is_dir() {
        return Err(WorkspaceError::NotAWorkspace);
    }

    let config_path = dir.join("config.toml");
    let config_text = fs::read_to_string(&config_path).map_err(|e| WorkspaceError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    let config: StoreConfig = toml::from_str(&config_text)?;

    Ok(Workspace {
        root: root.to_path_buf(),
        dir,
        config,
    })
}

/// Create `daylog/` with a commented config, an empty document file and the
/// blobs directory.
pub fn init_workspace(root: &Path, name: &str, force: bool) -> Result<Workspace, WorkspaceError> {
    let dir = root.join("daylog");
    if dir.join("config.toml").exists() && !force {
        return Err(WorkspaceError::AlreadyInitialized(root.to_path_buf()));
    }
    fs::create_dir_all(dir.join("blobs"))?;

    let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
    fs::write(dir.join("config.toml"), CONFIG_TEMPLATE.replace("{name}", &escaped))?;

    let logs_path = dir.join("logs.json");
    if !logs_path.exists() {
        fs::write(&logs_path, "{\n  \"documents\": []\n}\n")?;
    }

    tracing::info!(path = %dir.display(), "initialized workspace");
    load_workspace(root)
}

/// Pick a default workspace name from the directory name
pub fn infer_name(root: &Path) -> String {
    root.file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("daylog")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_then_discover() {
        let tmp = TempDir::new().unwrap();
        init_workspace(tmp.path(), "journal", false).unwrap();

        let root = discover_workspace(tmp.path()).unwrap();
        assert_eq!(root, tmp.path());

        // Discover from subdirectory
        let sub = tmp.path().join("daylog/blobs");
        let root = discover_workspace(&sub).unwrap();
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn test_discover_not_found() {
        let tmp = TempDir::new().unwrap();
        assert!(discover_workspace(tmp.path()).is_err());
    }

    #[test]
    fn test_load_reads_template_config() {
        let tmp = TempDir::new().unwrap();
        init_workspace(tmp.path(), "my \"log\"", false).unwrap();

        let ws = load_workspace(tmp.path()).unwrap();
        assert_eq!(ws.config.store.name, "my \"log\"");
        assert_eq!(ws.config.feed.limit, 20);
        assert!(ws.logs_path().exists());
        assert!(ws.blobs_dir().is_dir());
    }

    #[test]
    fn test_init_refuses_existing_without_force() {
        let tmp = TempDir::new().unwrap();
        init_workspace(tmp.path(), "a", false).unwrap();
        assert!(matches!(
            init_workspace(tmp.path(), "b", false),
            Err(WorkspaceError::AlreadyInitialized(_))
        ));
        let ws = init_workspace(tmp.path(), "b", true).unwrap();
        assert_eq!(ws.config.store.name, "b");
    }
}
