//! Command handlers for the lectern CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod accounts;
pub mod ask;
pub mod materials;
pub mod serve;

// Re-export command types for convenience
pub use accounts::AccountsCommand;
pub use ask::AskCommand;
pub use materials::MaterialsCommand;
pub use serve::ServeCommand;

use lectern_classroom::Classroom;
use lectern_core::{config::AppConfig, AppResult, EnvSecrets};
use std::sync::Arc;

/// Open the classroom services for `config`, reading secrets from the
/// process environment.
pub fn open_classroom(config: &AppConfig) -> AppResult<Classroom> {
    Classroom::open(config, Arc::new(EnvSecrets))
}
