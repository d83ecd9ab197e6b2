/// Session lifecycle
///
/// Orchestrates the four session operations: login (credential check + pair
/// issuance), authenticate (the request gate), rotation (refresh), and
/// logout. The register stores a SHA-256 digest of the refresh token, never
/// the token itself; a refresh token is honored only when its digest equals
/// the registered value, making it a capability rather than a bare signed
/// claim.

use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::auth::password::verify_password;
use crate::auth::tokens::{decode_token, issue_access, issue_refresh, TokenKind};
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError};
use crate::store::{CredentialStore, User};

/// The authenticated principal, as attached to request extensions.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
        }
    }
}

/// A freshly issued access + refresh token pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Digest a refresh token for the session register.
///
/// Never store bearer material at rest.
fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn issue_pair(user_id: &Uuid, config: &AuthSettings) -> Result<TokenPair, AppError> {
    Ok(TokenPair {
        access_token: issue_access(user_id, config)?,
        refresh_token: issue_refresh(user_id, config)?,
    })
}

/// Authenticate with a username or email plus password.
///
/// An unknown identifier and a wrong password are indistinguishable to the
/// caller; both are `InvalidCredentials`. The new refresh token is registered
/// durably before the pair is returned.
///
/// # Errors
/// `InvalidCredentials`, or storage/codec failures.
pub async fn login<C: CredentialStore>(
    store: &C,
    config: &AuthSettings,
    identifier: &str,
    password: &str,
) -> Result<(Identity, TokenPair), AppError> {
    let user = store
        .find_by_username_or_email(identifier)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(password, &user.password_hash)? {
        return Err(AuthError::InvalidCredentials.into());
    }

    let pair = issue_pair(&user.id, config)?;
    store
        .set_refresh_token(user.id, &token_digest(&pair.refresh_token))
        .await?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok((Identity::from(&user), pair))
}

/// The request gate: resolve an access token to an identity.
///
/// Read-only and idempotent; never touches the session register. Every
/// failure kind renders the same external response.
///
/// # Errors
/// `MissingToken`, `TokenExpired`, `TokenInvalid`, or `UnknownIdentity`.
pub async fn authenticate<C: CredentialStore>(
    store: &C,
    config: &AuthSettings,
    token: Option<&str>,
) -> Result<Identity, AppError> {
    let token = token.ok_or(AuthError::MissingToken)?;

    let claims = decode_token(token, TokenKind::Access, config)?;
    let user_id = claims.user_id()?;

    let user = store
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::UnknownIdentity)?;

    Ok(Identity::from(&user))
}

/// Rotate a session: exchange a registered refresh token for a fresh pair.
///
/// The presented token must verify under the refresh secret AND match the
/// register. The swap is conditional on the registered value still being the
/// presented one, so of two concurrent rotations with the same token exactly
/// one succeeds; the loser observes `TokenMismatch`. A successful rotation
/// always retires the old refresh token, valid or not.
///
/// # Errors
/// `MissingToken`, `TokenExpired`, `TokenInvalid`, `UnknownIdentity`, or
/// `TokenMismatch`.
pub async fn rotate_session<C: CredentialStore>(
    store: &C,
    config: &AuthSettings,
    presented: Option<&str>,
) -> Result<TokenPair, AppError> {
    let presented = presented.ok_or(AuthError::MissingToken)?;

    let claims = decode_token(presented, TokenKind::Refresh, config)?;
    let user_id = claims.user_id()?;

    let user = store
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::UnknownIdentity)?;

    let presented_digest = token_digest(presented);
    if user.refresh_token.as_deref() != Some(presented_digest.as_str()) {
        tracing::warn!(user_id = %user.id, "Presented refresh token is not the registered one");
        return Err(AuthError::TokenMismatch.into());
    }

    let pair = issue_pair(&user.id, config)?;
    let replaced = store
        .replace_refresh_token(user.id, &presented_digest, &token_digest(&pair.refresh_token))
        .await?;
    if !replaced {
        // A concurrent rotation swapped the register between our read and
        // the conditional write.
        tracing::warn!(user_id = %user.id, "Lost rotation race");
        return Err(AuthError::TokenMismatch.into());
    }

    tracing::info!(user_id = %user.id, "Session rotated");

    Ok(pair)
}

/// End the session by clearing the register entry.
///
/// Idempotent: logging out an already-anonymous identity is a no-op.
pub async fn logout<C: CredentialStore>(store: &C, user_id: Uuid) -> Result<(), AppError> {
    store.clear_refresh_token(user_id).await?;
    tracing::info!(user_id = %user_id, "User logged out");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::store::{MemoryCredentialStore, NewUser};

    fn test_config() -> AuthSettings {
        AuthSettings {
            access_token_secret: "access-test-secret-at-least-32-chars".to_string(),
            refresh_token_secret: "refresh-test-secret-at-least-32-chars".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
        }
    }

    async fn store_with_user(username: &str, password: &str) -> (MemoryCredentialStore, Identity) {
        let store = MemoryCredentialStore::new();
        let user = store
            .create_user(NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                full_name: "Test User".to_string(),
                password_hash: hash_password(password).unwrap(),
            })
            .await
            .unwrap();
        let identity = Identity::from(&user);
        (store, identity)
    }

    fn auth_kind(err: AppError) -> AuthError {
        match err {
            AppError::Auth(kind) => kind,
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn login_then_authenticate_resolves_same_identity() {
        let config = test_config();
        let (store, identity) = store_with_user("bob", "Secret1pass").await;

        let (logged_in, pair) = login(&store, &config, "bob", "Secret1pass").await.unwrap();
        assert_eq!(logged_in.id, identity.id);

        let resolved = authenticate(&store, &config, Some(&pair.access_token))
            .await
            .unwrap();
        assert_eq!(resolved.id, identity.id);
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_collapse() {
        let config = test_config();
        let (store, _) = store_with_user("bob", "Secret1pass").await;

        let unknown = login(&store, &config, "nobody", "Secret1pass").await;
        let wrong = login(&store, &config, "bob", "WrongSecret1").await;

        assert_eq!(auth_kind(unknown.unwrap_err()), AuthError::InvalidCredentials);
        assert_eq!(auth_kind(wrong.unwrap_err()), AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let config = test_config();
        let store = MemoryCredentialStore::new();

        let err = authenticate(&store, &config, None).await.unwrap_err();
        assert_eq!(auth_kind(err), AuthError::MissingToken);
    }

    #[tokio::test]
    async fn deleted_identity_is_not_a_distinct_error_class() {
        let config = test_config();
        let store = MemoryCredentialStore::new();

        // A validly-signed token whose subject was never (or is no longer)
        // in the store.
        let ghost = Uuid::new_v4();
        let token = issue_access(&ghost, &config).unwrap();

        let err = authenticate(&store, &config, Some(&token)).await.unwrap_err();
        assert_eq!(auth_kind(err), AuthError::UnknownIdentity);
    }

    #[tokio::test]
    async fn rotation_retires_the_presented_token() {
        let config = test_config();
        let (store, _) = store_with_user("bob", "Secret1pass").await;

        let (_, first) = login(&store, &config, "bob", "Secret1pass").await.unwrap();

        let second = rotate_session(&store, &config, Some(&first.refresh_token))
            .await
            .unwrap();

        // Reuse after rotation fails even though the token has not expired.
        let reuse = rotate_session(&store, &config, Some(&first.refresh_token)).await;
        assert_eq!(auth_kind(reuse.unwrap_err()), AuthError::TokenMismatch);

        // The replacement token keeps working.
        assert!(rotate_session(&store, &config, Some(&second.refresh_token))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn login_invalidates_the_previous_refresh_token() {
        let config = test_config();
        let (store, _) = store_with_user("bob", "Secret1pass").await;

        let (_, first) = login(&store, &config, "bob", "Secret1pass").await.unwrap();
        let (_, _second) = login(&store, &config, "bob", "Secret1pass").await.unwrap();

        let reuse = rotate_session(&store, &config, Some(&first.refresh_token)).await;
        assert_eq!(auth_kind(reuse.unwrap_err()), AuthError::TokenMismatch);
    }

    #[tokio::test]
    async fn logout_clears_the_register() {
        let config = test_config();
        let (store, identity) = store_with_user("bob", "Secret1pass").await;

        let (_, pair) = login(&store, &config, "bob", "Secret1pass").await.unwrap();
        logout(&store, identity.id).await.unwrap();

        let err = rotate_session(&store, &config, Some(&pair.refresh_token)).await;
        assert_eq!(auth_kind(err.unwrap_err()), AuthError::TokenMismatch);

        // Logging out again is a no-op, not an error.
        logout(&store, identity.id).await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_rotations_admit_exactly_one_winner() {
        let config = test_config();
        let (store, _) = store_with_user("bob", "Secret1pass").await;

        let (_, pair) = login(&store, &config, "bob", "Secret1pass").await.unwrap();

        let (a, b) = tokio::join!(
            rotate_session(&store, &config, Some(&pair.refresh_token)),
            rotate_session(&store, &config, Some(&pair.refresh_token)),
        );

        let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1);

        let loser = if a.is_err() { a } else { b };
        assert_eq!(auth_kind(loser.unwrap_err()), AuthError::TokenMismatch);
    }
}
