/// JWT Claims structure
///
/// The payload shared by access and refresh tokens: the identity the token
/// was issued for plus the standard timing claims (RFC 7519).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create new claims for a user, expiring `expiry_seconds` from now.
    pub fn new(user_id: Uuid, expiry_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            iat: now,
            exp: now + expiry_seconds,
        }
    }

    /// Extract the user ID from the claims.
    ///
    /// # Errors
    /// Returns error if the subject is not a valid UUID.
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::TokenInvalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, 3600);

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn user_id_extraction() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, 3600);

        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn invalid_user_id() {
        let mut claims = Claims::new(Uuid::new_v4(), 3600);
        claims.sub = "not-a-uuid".to_string();

        assert_eq!(claims.user_id().unwrap_err(), AuthError::TokenInvalid);
    }
}
