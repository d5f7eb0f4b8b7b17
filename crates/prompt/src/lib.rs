//! Prompt system for Lectern.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions, one per locale
//! - Built-in defaults with on-disk overrides
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{list_prompts, load_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptInputSpec, PromptOutputSpec};
