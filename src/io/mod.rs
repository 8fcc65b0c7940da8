pub mod blob;
pub mod clipboard;
pub mod config_io;
pub mod file_store;
pub mod lock;
pub mod logging;
pub mod memory_store;
pub mod recovery;
pub mod store;
pub mod watcher;
pub mod workspace_io;
