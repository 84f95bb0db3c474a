//! Registration and login against the user table.
//!
//! Everything here blocks (Argon2 and SQLite) and is called from
//! `spawn_blocking`.

use argon2::password_hash;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use imgvault_db::models::UserRow;
use imgvault_db::{Database, DbError};

use crate::error::ApiError;
use crate::password::{hash_password, verify_password};

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("username already taken")]
    DuplicateUsername,

    #[error("unknown user")]
    UnknownUser,

    #[error("password mismatch")]
    BadPassword,

    #[error("password hashing failed: {0}")]
    Hash(password_hash::Error),

    #[error(transparent)]
    Store(DbError),
}

impl From<DbError> for CredentialError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::DuplicateUsername => CredentialError::DuplicateUsername,
            other => CredentialError::Store(other),
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::Validation(msg) => ApiError::Validation(msg.to_string()),
            // Unknown users and wrong passwords look the same from outside.
            CredentialError::UnknownUser | CredentialError::BadPassword => {
                ApiError::Unauthenticated("Invalid credentials")
            }
            CredentialError::DuplicateUsername => {
                warn!("Registration rejected: username already taken");
                ApiError::Storage("Error registering user")
            }
            CredentialError::Hash(e) => {
                error!("Password hashing failed: {}", e);
                ApiError::Storage("Internal error")
            }
            CredentialError::Store(e) => e.into(),
        }
    }
}

/// Create a user. The password is stored only as an Argon2 hash.
pub fn register(db: &Database, username: &str, password: &str) -> Result<Uuid, CredentialError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(CredentialError::Validation("Username and password are required"));
    }

    if db.get_user_by_username(username)?.is_some() {
        return Err(CredentialError::DuplicateUsername);
    }

    let password_hash = hash_password(password).map_err(CredentialError::Hash)?;
    let user_id = Uuid::new_v4();

    // A concurrent registration can still win the race; the unique
    // constraint reports it as DuplicateUsername.
    db.create_user(&user_id.to_string(), username, &password_hash)?;

    Ok(user_id)
}

/// Resolve a username/password pair to the stored user.
pub fn authenticate(db: &Database, username: &str, password: &str) -> Result<UserRow, CredentialError> {
    if username.is_empty() || password.is_empty() {
        return Err(CredentialError::Validation("Username and password are required"));
    }

    let user = db
        .get_user_by_username(username)?
        .ok_or(CredentialError::UnknownUser)?;

    if !verify_password(password, &user.password_hash).map_err(CredentialError::Hash)? {
        return Err(CredentialError::BadPassword);
    }

    Ok(user)
}
