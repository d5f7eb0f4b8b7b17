//! Accounts, sessions and enrollment codes.
//!
//! Students register themselves with a one-time enrollment code. Teachers
//! and codes are provisioned by an administrator from the command line.

use crate::db::Database;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{SecondsFormat, Utc};
use lectern_core::AppError;
use rand_core::OsRng;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MIN_PASSWORD_LEN: usize = 6;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "student" => Some(Self::Student),
            "teacher" => Some(Self::Teacher),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
        }
    }
}

/// A user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub updated_at: String,
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(skip_serializing)]
    pub token: String,
    pub user_id: String,
    pub full_name: String,
    pub role: Role,
}

impl Session {
    /// A session without a token, for administrative tools acting as `profile`.
    pub fn local(profile: &Profile) -> Self {
        Self {
            token: String::new(),
            user_id: profile.id.clone(),
            full_name: profile.full_name.clone(),
            role: profile.role,
        }
    }
}

/// The caller of one request, resolved from its bearer token.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub session: Option<Session>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(session: Session) -> Self {
        Self {
            session: Some(session),
        }
    }

    /// The session, or `Unauthenticated`.
    pub fn require_session(&self) -> Result<&Session, IdentityError> {
        self.session.as_ref().ok_or(IdentityError::Unauthenticated)
    }

    /// The session of a teacher, or `Unauthenticated`/`Forbidden`.
    pub fn require_teacher(&self) -> Result<&Session, IdentityError> {
        let session = self.require_session()?;
        if session.role != Role::Teacher {
            return Err(IdentityError::Forbidden);
        }
        Ok(session)
    }

    /// Identifier used when logging who asked a question.
    pub fn actor(&self) -> &str {
        self.session
            .as_ref()
            .map(|s| s.user_id.as_str())
            .unwrap_or("anonymous")
    }
}

/// Student self-registration request.
#[derive(Debug, Clone)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub enrollment_code: String,
}

/// Identity failures.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("enrollment code is invalid or already used")]
    InvalidEnrollmentCode,

    #[error("email is already registered")]
    EmailTaken,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("not signed in")]
    Unauthenticated,

    #[error("not allowed for this role")]
    Forbidden,

    #[error(transparent)]
    Store(#[from] AppError),
}

/// SQLite-backed accounts and sessions.
#[derive(Clone)]
pub struct IdentityStore {
    db: Database,
}

impl IdentityStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Register a student, consuming an enrollment code.
    pub fn sign_up(&self, request: SignUp) -> Result<Profile, IdentityError> {
        let email = normalize_email(&request.email)?;
        let full_name = required(&request.full_name, "full name")?;
        let code = request.enrollment_code.trim().to_lowercase();
        if code.is_empty() {
            return Err(IdentityError::InvalidInput(
                "enrollment code is required".to_string(),
            ));
        }
        check_password(&request.password)?;
        let password_hash = hash_password(&request.password)?;

        let profile = Profile {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            full_name,
            role: Role::Student,
            updated_at: now(),
        };

        let outcome = self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;

            let code_free: Option<bool> = tx
                .query_row(
                    "SELECT is_used = 0 FROM student_codes WHERE code = ?1",
                    params![code],
                    |row| row.get(0),
                )
                .optional()?;
            if code_free != Some(true) {
                return Ok(Err(IdentityError::InvalidEnrollmentCode));
            }

            if email_exists(&tx, &profile.email)? {
                return Ok(Err(IdentityError::EmailTaken));
            }

            insert_profile(&tx, &profile, &password_hash)?;
            tx.execute(
                "UPDATE student_codes SET is_used = 1, used_by = ?1, used_at = ?2 WHERE code = ?3",
                params![profile.id, profile.updated_at, code],
            )?;
            tx.commit()?;
            Ok(Ok(()))
        })?;
        outcome?;

        tracing::info!("Registered student {}", profile.id);
        Ok(profile)
    }

    /// Create a teacher account.
    pub fn add_teacher(
        &self,
        email: &str,
        full_name: &str,
        password: &str,
    ) -> Result<Profile, IdentityError> {
        let email = normalize_email(email)?;
        let full_name = required(full_name, "full name")?;
        check_password(password)?;
        let password_hash = hash_password(password)?;

        let profile = Profile {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            full_name,
            role: Role::Teacher,
            updated_at: now(),
        };

        let inserted = self.db.with_conn(|conn| {
            if email_exists(conn, &profile.email)? {
                return Ok(false);
            }
            insert_profile(conn, &profile, &password_hash)?;
            Ok(true)
        })?;
        if !inserted {
            return Err(IdentityError::EmailTaken);
        }

        tracing::info!("Registered teacher {}", profile.id);
        Ok(profile)
    }

    /// Issue an enrollment code. Returns the stored (normalized) code.
    pub fn add_enrollment_code(&self, code: &str) -> Result<String, IdentityError> {
        let code = code.trim().to_lowercase();
        if code.is_empty() {
            return Err(IdentityError::InvalidInput(
                "enrollment code cannot be empty".to_string(),
            ));
        }

        let inserted = self.db.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO student_codes (code, created_at) VALUES (?1, ?2)",
                params![code, now()],
            )
        })?;
        if inserted == 0 {
            return Err(IdentityError::InvalidInput(format!(
                "enrollment code already exists: {}",
                code
            )));
        }
        Ok(code)
    }

    /// Exchange credentials for a session token.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let email = email.trim().to_lowercase();

        let account: Option<(String, String, String, String)> = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, full_name, role, password_hash FROM profiles WHERE email = ?1",
                params![email],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()
        })?;

        let Some((user_id, full_name, role, password_hash)) = account else {
            return Err(IdentityError::InvalidCredentials);
        };
        if !verify_password(&password_hash, password) {
            return Err(IdentityError::InvalidCredentials);
        }
        let role = parse_role(&role)?;

        let token = uuid::Uuid::new_v4().to_string();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (token, user_id, created_at) VALUES (?1, ?2, ?3)",
                params![token, user_id, now()],
            )
        })?;

        tracing::info!("User {} signed in", user_id);
        Ok(Session {
            token,
            user_id,
            full_name,
            role,
        })
    }

    /// Revoke a session token. Unknown tokens are ignored.
    pub fn sign_out(&self, token: &str) -> Result<(), IdentityError> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])
        })?;
        Ok(())
    }

    /// Look up the session for a token.
    pub fn session(&self, token: &str) -> Result<Option<Session>, IdentityError> {
        let row: Option<(String, String, String)> = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT p.id, p.full_name, p.role FROM sessions s \
                 JOIN profiles p ON p.id = s.user_id WHERE s.token = ?1",
                params![token],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
        })?;

        row.map(|(user_id, full_name, role)| {
            Ok(Session {
                token: token.to_string(),
                user_id,
                full_name,
                role: parse_role(&role)?,
            })
        })
        .transpose()
    }

    /// Look up a profile by email.
    pub fn profile_by_email(&self, email: &str) -> Result<Option<Profile>, IdentityError> {
        let email = email.trim().to_lowercase();
        let row: Option<(String, String, String, String, String)> = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, email, full_name, role, updated_at FROM profiles WHERE email = ?1",
                params![email],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .optional()
        })?;

        row.map(|(id, email, full_name, role, updated_at)| {
            Ok(Profile {
                id,
                email,
                full_name,
                role: parse_role(&role)?,
                updated_at,
            })
        })
        .transpose()
    }

    /// All profiles, teachers first.
    pub fn list_profiles(&self) -> Result<Vec<Profile>, IdentityError> {
        let rows: Vec<(String, String, String, String, String)> = self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, email, full_name, role, updated_at FROM profiles \
                 ORDER BY role DESC, full_name",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })?;
            rows.collect()
        })?;

        rows.into_iter()
            .map(|(id, email, full_name, role, updated_at)| {
                Ok(Profile {
                    id,
                    email,
                    full_name,
                    role: parse_role(&role)?,
                    updated_at,
                })
            })
            .collect()
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn required(value: &str, field: &str) -> Result<String, IdentityError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(IdentityError::InvalidInput(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

fn normalize_email(email: &str) -> Result<String, IdentityError> {
    let email = required(email, "email")?.to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(IdentityError::InvalidInput(format!("invalid email: {}", email))),
    }
}

fn check_password(password: &str) -> Result<(), IdentityError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(IdentityError::InvalidInput(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn parse_role(role: &str) -> Result<Role, IdentityError> {
    Role::parse(role)
        .ok_or_else(|| AppError::Database(format!("Unknown role in profiles table: {}", role)).into())
}

fn email_exists(conn: &rusqlite::Connection, email: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM profiles WHERE email = ?1)",
        params![email],
        |row| row.get(0),
    )
}

fn insert_profile(
    conn: &rusqlite::Connection,
    profile: &Profile,
    password_hash: &str,
) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO profiles (id, email, full_name, role, password_hash, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            profile.id,
            profile.email,
            profile.full_name,
            profile.role.as_str(),
            password_hash,
            profile.updated_at,
        ],
    )
}

/// Hash a password with argon2 and a random salt.
fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Auth(format!("Failed to hash password: {}", e)).into())
}

/// Verify a candidate password against an argon2 hash string.
fn verify_password(hash: &str, candidate: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok()
}
