/// Token Codec
///
/// Signs and verifies the two token kinds used by session authentication.
/// Access and refresh tokens share the claim shape but are signed with
/// independent secrets and lifetimes, so one kind can never be presented in
/// place of the other. The codec holds no state; every call reads the
/// injected settings.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn secret<'a>(&self, config: &'a AuthSettings) -> &'a str {
        match self {
            TokenKind::Access => &config.access_token_secret,
            TokenKind::Refresh => &config.refresh_token_secret,
        }
    }

    fn expiry_seconds(&self, config: &AuthSettings) -> i64 {
        match self {
            TokenKind::Access => config.access_token_expiry,
            TokenKind::Refresh => config.refresh_token_expiry,
        }
    }
}

/// Generate a new access token for a user
///
/// # Errors
/// Returns error if token signing fails
pub fn issue_access(user_id: &Uuid, config: &AuthSettings) -> Result<String, AppError> {
    issue(user_id, TokenKind::Access, config)
}

/// Generate a new refresh token for a user
///
/// # Errors
/// Returns error if token signing fails
pub fn issue_refresh(user_id: &Uuid, config: &AuthSettings) -> Result<String, AppError> {
    issue(user_id, TokenKind::Refresh, config)
}

fn issue(user_id: &Uuid, kind: TokenKind, config: &AuthSettings) -> Result<String, AppError> {
    let claims = Claims::new(*user_id, kind.expiry_seconds(config));

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(kind.secret(config).as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
}

/// Validate a token of the given kind and extract its claims.
///
/// Expiry is checked with zero leeway. The failure kind distinguishes an
/// elapsed expiry from signature/format problems for internal callers; both
/// render the same external response.
///
/// # Errors
/// `TokenExpired` when the expiry has elapsed, `TokenInvalid` for bad
/// signatures or malformed token material.
pub fn decode_token(token: &str, kind: TokenKind, config: &AuthSettings) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(kind.secret(config).as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::TokenInvalid,
    })
}
