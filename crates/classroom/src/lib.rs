//! Course materials, accounts and the material Q&A exchange.
//!
//! Teachers upload files to object storage, students resolve a material to a
//! signed file reference and ask questions that are answered by the
//! configured generation service.

pub mod catalog;
pub mod db;
pub mod exchange;
pub mod identity;
pub mod material;
pub mod resolver;
pub mod storage;
pub mod store;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogError, DeleteOutcome};
pub use db::Database;
pub use exchange::{
    AnalysisKind, Answer, AnswerExchange, ExchangeError, ExchangeSettings, MissingField, Question,
};
pub use identity::{IdentityError, IdentityStore, Profile, RequestContext, Role, Session, SignUp};
pub use material::{Material, MaterialListing, NewMaterial, SignedFileReference, StoredFile};
pub use resolver::{MaterialResolver, ResolveError};
pub use storage::{LocalObjectStorage, ObjectStorage, SignatureError, SignedLocation, UrlSigner};
pub use store::{MaterialStore, SqliteMaterialStore};

use lectern_core::{AppConfig, AppResult, SecretSource};
use lectern_llm::{ClientProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Duration;

/// Every service, wired against one database and one bucket.
#[derive(Clone)]
pub struct Classroom {
    pub identity: IdentityStore,
    pub catalog: Catalog,
    pub resolver: MaterialResolver,
    pub exchange: AnswerExchange,
    pub storage: Arc<LocalObjectStorage>,
}

impl Classroom {
    /// Open the data directory described by `config`.
    pub fn open(config: &AppConfig, secrets: Arc<dyn SecretSource>) -> AppResult<Self> {
        config.ensure_data_dir()?;
        let db = Database::open(&config.database_path())?;
        let clients = Arc::new(ProviderFactory::from_name(
            &config.generation.provider,
            config.generation.endpoint.clone(),
        )?);
        Self::assemble(config, db, secrets, clients)
    }

    /// Wire services from explicit parts, e.g. an in-memory database or a
    /// stub generation provider.
    pub fn assemble(
        config: &AppConfig,
        db: Database,
        secrets: Arc<dyn SecretSource>,
        clients: Arc<dyn ClientProvider>,
    ) -> AppResult<Self> {
        let signing_secret = config.resolve_signing_secret(secrets.as_ref())?;
        let signer = UrlSigner::new(signing_secret, &config.public_base_url)?;
        let storage = Arc::new(LocalObjectStorage::new(
            &config.storage_root(),
            config.storage.bucket.clone(),
            signer,
        ));

        let store: Arc<dyn MaterialStore> = Arc::new(SqliteMaterialStore::new(db.clone()));
        let ttl = Duration::from_secs(config.storage.signed_url_ttl_secs);

        tracing::debug!(
            "Classroom ready: bucket={}, ttl={}s, provider={}, model={}",
            config.storage.bucket,
            ttl.as_secs(),
            clients.provider().as_str(),
            config.generation.model
        );

        Ok(Self {
            identity: IdentityStore::new(db),
            catalog: Catalog::new(store.clone(), storage.clone()),
            resolver: MaterialResolver::new(store, storage.clone(), ttl),
            exchange: AnswerExchange::new(
                clients,
                secrets,
                storage.clone(),
                storage.signer().clone(),
                ExchangeSettings::from_config(config),
            ),
            storage,
        })
    }
}
