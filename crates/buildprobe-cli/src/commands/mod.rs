//! Subcommand implementations.

pub mod extract;
pub mod fetch;
pub mod projects;
pub mod run;
