//! Materials command handler.
//!
//! Administrative access to the material catalog: list, upload and delete
//! on behalf of a teacher account.

use clap::{Args, Subcommand};
use lectern_classroom::{
    CatalogError, Classroom, MaterialListing, NewMaterial, RequestContext, Session,
};
use lectern_core::{config::AppConfig, AppError, AppResult};
use std::path::PathBuf;

/// Course material management
#[derive(Args, Debug)]
pub struct MaterialsCommand {
    #[command(subcommand)]
    pub action: MaterialsAction,
}

#[derive(Subcommand, Debug)]
pub enum MaterialsAction {
    /// List materials, newest first
    List(MaterialsListCommand),
    /// Upload a file as a new material
    Upload(MaterialsUploadCommand),
    /// Delete a material and its stored file
    Delete(MaterialsDeleteCommand),
}

/// List materials
#[derive(Args, Debug)]
pub struct MaterialsListCommand {
    /// Only materials uploaded by this teacher (email)
    #[arg(long)]
    pub teacher: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Upload a material
#[derive(Args, Debug)]
pub struct MaterialsUploadCommand {
    /// File to upload
    pub file: PathBuf,

    /// Owning teacher (email)
    #[arg(long)]
    pub teacher: String,

    /// Subject name shown to students
    #[arg(long)]
    pub subject: String,

    /// Short description
    #[arg(long)]
    pub description: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Delete a material
#[derive(Args, Debug)]
pub struct MaterialsDeleteCommand {
    /// Material identifier
    pub material_id: String,

    /// Owning teacher (email)
    #[arg(long)]
    pub teacher: String,
}

impl MaterialsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let classroom = super::open_classroom(config)?;
        match &self.action {
            MaterialsAction::List(cmd) => cmd.execute(&classroom),
            MaterialsAction::Upload(cmd) => cmd.execute(&classroom).await,
            MaterialsAction::Delete(cmd) => cmd.execute(&classroom).await,
        }
    }
}

impl MaterialsListCommand {
    fn execute(&self, classroom: &Classroom) -> AppResult<()> {
        tracing::info!("Executing materials list command");

        let listings = match &self.teacher {
            Some(email) => {
                let ctx = teacher_context(classroom, email)?;
                let session = ctx
                    .require_teacher()
                    .map_err(|e| AppError::Auth(e.to_string()))?;
                classroom.catalog.list_for_teacher(&session.user_id)
            }
            None => classroom.catalog.list_all(),
        }
        .map_err(catalog_error)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&listings)?);
            return Ok(());
        }

        if listings.is_empty() {
            println!("No materials.");
            return Ok(());
        }
        for listing in &listings {
            print_listing(listing);
        }
        Ok(())
    }
}

impl MaterialsUploadCommand {
    async fn execute(&self, classroom: &Classroom) -> AppResult<()> {
        tracing::info!("Executing materials upload command: {}", self.file.display());

        let file_name = self
            .file
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| AppError::Other(format!("Invalid file name: {}", self.file.display())))?
            .to_string();
        let bytes = tokio::fs::read(&self.file).await?;

        let ctx = teacher_context(classroom, &self.teacher)?;
        let material = classroom
            .catalog
            .upload(
                &ctx,
                NewMaterial {
                    subject_name: self.subject.clone(),
                    description: self.description.clone(),
                    file_name,
                    bytes,
                },
            )
            .await
            .map_err(catalog_error)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&material)?);
        } else {
            println!("Uploaded {} ({})", material.subject_name, material.id);
        }
        Ok(())
    }
}

impl MaterialsDeleteCommand {
    async fn execute(&self, classroom: &Classroom) -> AppResult<()> {
        tracing::info!("Executing materials delete command: {}", self.material_id);

        let ctx = teacher_context(classroom, &self.teacher)?;
        let outcome = classroom
            .catalog
            .delete(&ctx, &self.material_id)
            .await
            .map_err(catalog_error)?;

        println!("Deleted {}", outcome.material_id);
        if let Some(warning) = outcome.storage_warning {
            eprintln!("Warning: stored file was not removed: {}", warning);
        }
        Ok(())
    }
}

/// Act as the teacher registered under `email`.
fn teacher_context(classroom: &Classroom, email: &str) -> AppResult<RequestContext> {
    let profile = classroom
        .identity
        .profile_by_email(email)
        .map_err(|e| AppError::Auth(e.to_string()))?
        .ok_or_else(|| AppError::Auth(format!("No account for {}", email)))?;
    Ok(RequestContext::authenticated(Session::local(&profile)))
}

fn catalog_error(err: CatalogError) -> AppError {
    match err {
        CatalogError::Identity(e) => AppError::Auth(e.to_string()),
        CatalogError::Store(detail) => AppError::Database(detail),
        CatalogError::Storage(detail) => AppError::Storage(detail),
        other => AppError::Other(other.to_string()),
    }
}

fn print_listing(listing: &MaterialListing) {
    let material = &listing.material;
    println!(
        "{}  {}  [{}]  {}",
        material.id,
        material.created_at.format("%Y-%m-%d %H:%M"),
        listing.file_extension.as_deref().unwrap_or("-"),
        material.subject_name
    );
    if let Some(teacher) = &listing.teacher_name {
        println!("    by {}", teacher);
    }
    if !material.description.is_empty() {
        println!("    {}", material.description);
    }
}
