//! Configuration management for Lectern.
//!
//! Configuration is merged from several sources, later ones winning:
//! - Built-in defaults
//! - The YAML config file (`<data_dir>/config.yaml` or `LECTERN_CONFIG`)
//! - Environment variables (`LECTERN_*`)
//! - Command-line flags (`AppConfig::with_overrides`)
//!
//! Secrets (API keys, the URL signing secret) are never stored in the config
//! itself. The config names the environment variable and a [`SecretSource`]
//! resolves it when needed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default validity window for signed file references, in seconds.
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3600;

/// Default cap on inline attachments (the Gemini inline data limit).
pub const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 20 * 1024 * 1024;

/// Source of secret values such as API keys.
///
/// Implementations are consulted on every lookup, so rotating a value in the
/// environment takes effect on the next request without a restart.
pub trait SecretSource: Send + Sync {
    /// Look up a secret by name. Empty values count as missing.
    fn secret(&self, name: &str) -> Option<String>;
}

/// Reads secrets from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecrets;

impl SecretSource for EnvSecrets {
    fn secret(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.trim().is_empty())
    }
}

/// Fixed secret values, mostly useful in tests and embedded setups.
#[derive(Debug, Clone, Default)]
pub struct StaticSecrets {
    values: HashMap<String, String>,
}

impl StaticSecrets {
    /// Create an empty secret set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret value.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl SecretSource for StaticSecrets {
    fn secret(&self, name: &str) -> Option<String> {
        self.values
            .get(name)
            .filter(|v| !v.trim().is_empty())
            .cloned()
    }
}

/// Language used for prompts and user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Arabic
    #[default]
    Ar,
    /// English
    En,
}

impl Locale {
    /// Parse a locale tag such as "ar", "ar-EG" or "en".
    pub fn parse(s: &str) -> Option<Self> {
        let primary = s.split(['-', '_']).next().unwrap_or_default();
        match primary.to_lowercase().as_str() {
            "ar" => Some(Self::Ar),
            "en" => Some(Self::En),
            _ => None,
        }
    }

    /// Canonical language tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ar => "ar",
            Self::En => "en",
        }
    }
}

/// How the file reference is handed to the generation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GroundingMode {
    /// Only the signed URL string is embedded in the prompt.
    #[default]
    Reference,
    /// The referenced file is read from this service's own storage and
    /// attached to the request. Only links it signed are accepted.
    Inline,
}

/// Object storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Bucket holding uploaded materials
    pub bucket: String,

    /// Environment variable holding the URL signing secret
    #[serde(rename = "signingSecretEnv")]
    pub signing_secret_env: String,

    /// Validity window of every signed reference
    #[serde(rename = "signedUrlTtlSecs")]
    pub signed_url_ttl_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "materials".to_string(),
            signing_secret_env: "LECTERN_SIGNING_SECRET".to_string(),
            signed_url_ttl_secs: DEFAULT_SIGNED_URL_TTL_SECS,
        }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Provider identifier ("gemini", "ollama")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Optional custom endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Environment variable holding the provider API key
    #[serde(rename = "apiKeyEnv", skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// How the material is handed to the model
    pub grounding: GroundingMode,

    /// Largest file attached in inline grounding mode
    #[serde(rename = "maxAttachmentBytes")]
    pub max_attachment_bytes: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-1.5-pro-latest".to_string(),
            endpoint: None,
            api_key_env: Some("GOOGLE_GEMINI_API_KEY".to_string()),
            grounding: GroundingMode::Reference,
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the database, stored objects, prompts and config
    pub data_dir: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Socket address the HTTP server binds to
    pub bind: String,

    /// Externally reachable base URL, used when signing file references
    pub public_base_url: String,

    /// Language for prompts and messages
    pub locale: Locale,

    /// Origins allowed by CORS
    pub allowed_origins: Vec<String>,

    /// Object storage settings
    pub storage: StorageConfig,

    /// Answer generation settings
    pub generation: GenerationConfig,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit JSON log lines
    pub log_json: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    server: Option<ServerSection>,
    storage: Option<StorageConfig>,
    generation: Option<GenerationConfig>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerSection {
    bind: Option<String>,
    #[serde(rename = "publicBaseUrl")]
    public_base_url: Option<String>,
    locale: Option<Locale>,
    #[serde(rename = "allowedOrigins")]
    allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".lectern"),
            config_file: None,
            bind: "127.0.0.1:8080".to_string(),
            public_base_url: "http://127.0.0.1:8080".to_string(),
            locale: Locale::Ar,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            storage: StorageConfig::default(),
            generation: GenerationConfig::default(),
            log_level: None,
            verbose: false,
            no_color: false,
            log_json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment and the config file.
    ///
    /// Environment variables:
    /// - `LECTERN_DATA_DIR`: Data directory
    /// - `LECTERN_CONFIG`: Path to config file
    /// - `LECTERN_BIND`: Listen address
    /// - `LECTERN_PUBLIC_URL`: Base URL used in signed references
    /// - `LECTERN_LOCALE`: Prompt/message language
    /// - `LECTERN_PROVIDER`: Generation provider
    /// - `LECTERN_MODEL`: Model identifier
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use lectern_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Data dir: {:?}", config.data_dir);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(&EnvSecrets)
    }

    /// Load configuration reading variables from `env`.
    pub fn load_from(env: &dyn SecretSource) -> AppResult<Self> {
        Self::load_with_paths(env, None, None)
    }

    /// Load configuration with the data directory and config file chosen by
    /// the caller (e.g. command-line flags), which win over the environment.
    pub fn load_with_paths(
        env: &dyn SecretSource,
        data_dir: Option<PathBuf>,
        config_file: Option<PathBuf>,
    ) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(data_dir) = data_dir.or_else(|| env.secret("LECTERN_DATA_DIR").map(PathBuf::from)) {
            config.data_dir = data_dir;
        }

        if let Some(config_file) =
            config_file.or_else(|| env.secret("LECTERN_CONFIG").map(PathBuf::from))
        {
            config.config_file = Some(config_file);
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.data_dir.join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file does not exist: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        if let Some(bind) = env.secret("LECTERN_BIND") {
            config.bind = bind;
        }

        if let Some(url) = env.secret("LECTERN_PUBLIC_URL") {
            config.public_base_url = url;
        }

        if let Some(locale) = env.secret("LECTERN_LOCALE") {
            config.locale = Locale::parse(&locale).ok_or_else(|| {
                AppError::Config(format!("Unsupported locale: {}", locale))
            })?;
        }

        if let Some(provider) = env.secret("LECTERN_PROVIDER") {
            config.generation.provider = provider;
        }

        if let Some(model) = env.secret("LECTERN_MODEL") {
            config.generation.model = model;
        }

        if let Some(level) = env.secret("RUST_LOG") {
            config.log_level = Some(level);
        }

        if env.secret("NO_COLOR").is_some() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(server) = config_file.server {
            if let Some(bind) = server.bind {
                result.bind = bind;
            }
            if let Some(url) = server.public_base_url {
                result.public_base_url = url;
            }
            if let Some(locale) = server.locale {
                result.locale = locale;
            }
            if let Some(origins) = server.allowed_origins {
                result.allowed_origins = origins;
            }
        }

        if let Some(storage) = config_file.storage {
            result.storage = storage;
        }

        if let Some(generation) = config_file.generation {
            result.generation = generation;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.log_json = json;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        data_dir: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(data_dir) = data_dir {
            self.data_dir = data_dir;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.generation.provider = provider;
        }

        if let Some(model) = model {
            self.generation.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Path of the SQLite metadata database.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("lectern.db")
    }

    /// Root directory of the local object store.
    pub fn storage_root(&self) -> PathBuf {
        self.data_dir.join("storage")
    }

    /// Directory holding prompt overrides.
    pub fn prompts_dir(&self) -> PathBuf {
        self.data_dir.join("prompts")
    }

    /// Ensure the data directory exists.
    pub fn ensure_data_dir(&self) -> AppResult<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir).map_err(|e| {
                AppError::Config(format!(
                    "Failed to create data directory {:?}: {}",
                    self.data_dir, e
                ))
            })?;
        }
        Ok(())
    }

    /// Resolve the generation API key through `secrets`.
    ///
    /// Returns `Ok(None)` when no key variable is configured or the variable
    /// is unset; callers decide whether their provider needs one.
    pub fn resolve_api_key(&self, secrets: &dyn SecretSource) -> Option<String> {
        self.generation
            .api_key_env
            .as_deref()
            .and_then(|name| secrets.secret(name))
    }

    /// Resolve the URL signing secret through `secrets`.
    pub fn resolve_signing_secret(&self, secrets: &dyn SecretSource) -> AppResult<String> {
        secrets
            .secret(&self.storage.signing_secret_env)
            .ok_or_else(|| {
                AppError::Config(format!(
                    "URL signing secret not found in environment variable: {}",
                    self.storage.signing_secret_env
                ))
            })
    }

    /// Validate configuration values that cannot be checked by serde.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["gemini", "google", "ollama"];
        let provider = self.generation.provider.to_lowercase();

        if !known_providers.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.generation.provider,
                known_providers.join(", ")
            )));
        }

        if self.generation.model.trim().is_empty() {
            return Err(AppError::Config("Model identifier cannot be empty".to_string()));
        }

        if self.generation.max_attachment_bytes == 0 {
            return Err(AppError::Config(
                "maxAttachmentBytes must be greater than zero".to_string(),
            ));
        }

        if self.storage.signed_url_ttl_secs == 0 {
            return Err(AppError::Config(
                "signedUrlTtlSecs must be greater than zero".to_string(),
            ));
        }

        if self.storage.bucket.is_empty() || self.storage.bucket.contains('/') {
            return Err(AppError::Config(format!(
                "Invalid storage bucket name: {:?}",
                self.storage.bucket
            )));
        }

        Ok(())
    }
}
