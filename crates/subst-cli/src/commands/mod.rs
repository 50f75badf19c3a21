//! CLI commands

pub mod discover;
pub mod render;
pub mod version;
