//! Subcommand implementations.

pub mod check;
pub mod index;
pub mod init;
pub mod list_rules;
pub mod output;
