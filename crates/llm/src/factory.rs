//! LLM provider factory.
//!
//! Builds clients from the configured provider name. The answer exchange
//! builds a fresh client for every request through [`ClientProvider`], since
//! the API key is looked up at request time.

use crate::client::LlmClient;
use crate::providers::{GeminiClient, OllamaClient};
use crate::types::ProviderType;
use lectern_core::{AppError, AppResult};
use std::sync::Arc;

/// Builds a client for one request.
pub trait ClientProvider: Send + Sync {
    /// Which provider this factory targets.
    fn provider(&self) -> ProviderType;

    /// Build a client using `api_key`.
    fn connect(&self, api_key: Option<&str>) -> AppResult<Arc<dyn LlmClient>>;
}

/// Default [`ClientProvider`] sharing one HTTP connection pool.
#[derive(Clone)]
pub struct ProviderFactory {
    provider: ProviderType,
    endpoint: Option<String>,
    http: reqwest::Client,
}

impl ProviderFactory {
    /// Create a factory for `provider`, optionally with a custom endpoint.
    pub fn new(provider: ProviderType, endpoint: Option<String>) -> Self {
        Self {
            provider,
            endpoint,
            http: reqwest::Client::new(),
        }
    }

    /// Parse the provider name and create a factory.
    pub fn from_name(provider: &str, endpoint: Option<String>) -> AppResult<Self> {
        let provider_type = ProviderType::parse(provider)
            .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;
        Ok(Self::new(provider_type, endpoint))
    }

    fn base_url(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.provider.default_endpoint())
    }
}

impl ClientProvider for ProviderFactory {
    fn provider(&self) -> ProviderType {
        self.provider
    }

    fn connect(&self, api_key: Option<&str>) -> AppResult<Arc<dyn LlmClient>> {
        match self.provider {
            ProviderType::Gemini => {
                let api_key = api_key.ok_or_else(|| {
                    AppError::Config("Gemini provider requires API key".to_string())
                })?;
                Ok(Arc::new(GeminiClient::with_client(
                    self.base_url(),
                    api_key,
                    self.http.clone(),
                )))
            }
            ProviderType::Ollama => Ok(Arc::new(OllamaClient::with_client(
                self.base_url(),
                self.http.clone(),
            ))),
        }
    }
}
