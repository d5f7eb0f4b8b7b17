//! Accounts command handler.
//!
//! Provisioning that has no public endpoint: teacher accounts and student
//! enrollment codes.

use clap::{Args, Subcommand};
use lectern_classroom::{Database, IdentityError, IdentityStore};
use lectern_core::{config::AppConfig, AppError, AppResult};

/// Account provisioning
#[derive(Args, Debug)]
pub struct AccountsCommand {
    #[command(subcommand)]
    pub action: AccountsAction,
}

#[derive(Subcommand, Debug)]
pub enum AccountsAction {
    /// Create a teacher account
    AddTeacher(AddTeacherCommand),
    /// Issue a single-use student enrollment code
    AddCode(AddCodeCommand),
    /// List registered profiles
    List(ListAccountsCommand),
}

/// Create a teacher account
#[derive(Args, Debug)]
pub struct AddTeacherCommand {
    #[arg(long)]
    pub email: String,

    /// Full name shown on materials
    #[arg(long)]
    pub name: String,

    #[arg(long, env = "LECTERN_TEACHER_PASSWORD")]
    pub password: String,
}

/// Issue an enrollment code
#[derive(Args, Debug)]
pub struct AddCodeCommand {
    pub code: String,
}

/// List profiles
#[derive(Args, Debug)]
pub struct ListAccountsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AccountsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        // Accounts only touch the database, so no signing secret is needed.
        let identity = IdentityStore::new(Database::open(&config.database_path())?);

        match &self.action {
            AccountsAction::AddTeacher(cmd) => {
                tracing::info!("Executing accounts add-teacher command");
                let profile = identity
                    .add_teacher(&cmd.email, &cmd.name, &cmd.password)
                    .map_err(identity_error)?;
                println!("Created teacher {} ({})", profile.email, profile.id);
            }
            AccountsAction::AddCode(cmd) => {
                tracing::info!("Executing accounts add-code command");
                let code = identity
                    .add_enrollment_code(&cmd.code)
                    .map_err(identity_error)?;
                println!("Enrollment code {} is ready", code);
            }
            AccountsAction::List(cmd) => {
                tracing::info!("Executing accounts list command");
                let profiles = identity.list_profiles().map_err(identity_error)?;
                if cmd.json {
                    println!("{}", serde_json::to_string_pretty(&profiles)?);
                } else if profiles.is_empty() {
                    println!("No accounts.");
                } else {
                    for profile in &profiles {
                        println!(
                            "{:<8} {:<32} {}",
                            profile.role.as_str(),
                            profile.email,
                            profile.full_name
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

fn identity_error(err: IdentityError) -> AppError {
    match err {
        IdentityError::Store(e) => e,
        other => AppError::Auth(other.to_string()),
    }
}
