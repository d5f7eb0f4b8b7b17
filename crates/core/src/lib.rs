//! Lectern Core Library
//!
//! This crate provides the foundational utilities shared by every Lectern crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management and secret resolution

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, EnvSecrets, GroundingMode, Locale, SecretSource, StaticSecrets};
pub use error::{AppError, AppResult};
