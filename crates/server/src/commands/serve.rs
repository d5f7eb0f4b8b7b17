//! Serve command handler.
//!
//! Runs the HTTP API until interrupted.

use clap::Args;
use lectern::{router, serve, AppState};
use lectern_core::{config::AppConfig, AppResult};

/// Run the HTTP server
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to listen on (default from config: 127.0.0.1:8080)
    #[arg(short, long, env = "LECTERN_BIND")]
    pub bind: Option<String>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing serve command");

        let classroom = super::open_classroom(config)?;
        let address = self.bind.as_deref().unwrap_or(config.bind.as_str());

        tracing::info!(
            "Serving bucket '{}' with {} ({}), locale {}, grounding {:?}",
            config.storage.bucket,
            config.generation.provider,
            config.generation.model,
            config.locale.as_str(),
            config.generation.grounding
        );

        let app = router(
            AppState::new(classroom, config.locale),
            &config.allowed_origins,
        );
        serve(app, address).await
    }
}
