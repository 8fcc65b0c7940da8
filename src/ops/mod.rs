pub mod brief;
pub mod filter;
pub mod group;
pub mod ids;
pub mod log_ops;
