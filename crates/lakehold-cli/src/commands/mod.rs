//! CLI command implementations.

pub mod attach;
