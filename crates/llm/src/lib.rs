//! Answer generation clients for Lectern.
//!
//! This crate provides a provider-agnostic abstraction over the external
//! generation service. Every provider implements [`LlmClient`]; the
//! [`ClientProvider`] seam builds a client per request so the API key can be
//! read from configuration at request time.
//!
//! # Providers
//! - **Gemini**: Google Generative Language API (default)
//! - **Ollama**: Local LLM runtime, handy for development
//!
//! # Example
//! ```no_run
//! use lectern_llm::{LlmClient, LlmRequest, providers::GeminiClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GeminiClient::new("api-key");
//! let request = LlmRequest::new("Hello, world!", "gemini-1.5-pro-latest");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{Attachment, LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{ClientProvider, ProviderFactory};
pub use providers::{GeminiClient, OllamaClient};
pub use types::ProviderType;
