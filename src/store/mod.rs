/// Credential store
///
/// The persistence seam for identities and the session register. The rest of
/// the crate only sees the `CredentialStore` trait; `PgCredentialStore` backs
/// production and `MemoryCredentialStore` backs tests and local development.

mod memory;
mod postgres;

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;

/// A stored identity record.
///
/// `refresh_token` is the session register: the digest of the one currently
/// valid refresh token, or `None` when the identity has no active session.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an identity. The password arrives already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up an identity by username or email, whichever matches.
    async fn find_by_username_or_email(&self, identifier: &str)
        -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Create an identity; username and email are unique.
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError>;

    /// Register a refresh token, overwriting any previous one (login).
    async fn set_refresh_token(&self, id: Uuid, token: &str) -> Result<(), AppError>;

    /// Replace the registered refresh token only if it still equals `current`.
    ///
    /// Returns `false` when the stored value no longer matches, which means a
    /// concurrent rotation already replaced it. The compare and the write are
    /// a single atomic step in every implementation.
    async fn replace_refresh_token(
        &self,
        id: Uuid,
        current: &str,
        next: &str,
    ) -> Result<bool, AppError>;

    /// Drop the registered refresh token (logout). A no-op when none is set.
    async fn clear_refresh_token(&self, id: Uuid) -> Result<(), AppError>;
}
