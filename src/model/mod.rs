pub mod config;
pub mod document;
pub mod log;
pub mod workspace;

pub use config::*;
pub use document::*;
pub use log::*;
pub use workspace::*;
