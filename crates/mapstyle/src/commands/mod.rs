//! Command implementations for the mapstyle CLI
//!
//! Each command module handles the CLI interface and delegates to
//! mapstyle-core for the actual work.

pub mod attributes;
pub mod build;
pub mod templates;
