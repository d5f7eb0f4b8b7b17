//! Ask command handler.
//!
//! Resolves a material and asks a question about it from the terminal.

use clap::Args;
use lectern_classroom::{ExchangeError, Question};
use lectern_core::{config::AppConfig, AppError, AppResult};

/// Ask a question about a material
#[derive(Args, Debug)]
pub struct AskCommand {
    /// Material identifier
    pub material_id: String,

    /// The question to ask
    pub question: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command for material {}", self.material_id);
        tracing::debug!("Ask command options: {:?}", self);

        let classroom = super::open_classroom(config)?;

        let reference = classroom
            .resolver
            .resolve(&self.material_id)
            .await
            .map_err(|e| AppError::Other(e.to_string()))?;
        tracing::debug!("Reference expires at {}", reference.expires_at);

        let question = Question::new(self.question.clone(), "cli", reference.url.clone());
        let answer = classroom
            .exchange
            .ask(&question)
            .await
            .map_err(|e| match e {
                ExchangeError::ServiceMisconfigured(detail) => AppError::Config(detail),
                other => AppError::Llm(other.to_string()),
            })?;

        if self.json {
            let output = serde_json::json!({
                "materialId": self.material_id,
                "question": self.question,
                "reply": answer.text,
                "referenceExpiresAt": reference.expires_at,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", answer.text);
        }

        Ok(())
    }
}
