//! CLI command implementations.

pub mod clean;
pub mod config;
pub mod profile;
pub mod status;

/// Error type shared by the commands.
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;
