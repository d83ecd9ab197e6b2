use config::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// Session authentication settings
///
/// Access and refresh tokens are signed with independent secrets and carry
/// independent lifetimes. All four values are required at startup.
#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_expiry: i64,  // seconds (e.g., 900 for 15 minutes)
    pub refresh_token_expiry: i64, // seconds (e.g., 604800 for 7 days)
}

impl AuthSettings {
    /// Reject configurations that would weaken token signing.
    ///
    /// # Errors
    /// Returns error if either secret is empty or both secrets are identical.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token_secret.is_empty() {
            return Err(ConfigError::Message(
                "auth.access_token_secret must not be empty".to_string(),
            ));
        }
        if self.refresh_token_secret.is_empty() {
            return Err(ConfigError::Message(
                "auth.refresh_token_secret must not be empty".to_string(),
            ));
        }
        if self.access_token_secret == self.refresh_token_secret {
            return Err(ConfigError::Message(
                "auth.access_token_secret and auth.refresh_token_secret must differ".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;
    let settings = settings.try_deserialize::<Settings>()?;
    settings.auth.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_auth_settings() -> AuthSettings {
        AuthSettings {
            access_token_secret: "access-secret-at-least-32-characters".to_string(),
            refresh_token_secret: "refresh-secret-at-least-32-characters".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
        }
    }

    #[test]
    fn accepts_distinct_nonempty_secrets() {
        assert!(valid_auth_settings().validate().is_ok());
    }

    #[test]
    fn rejects_empty_secret() {
        let mut settings = valid_auth_settings();
        settings.access_token_secret = String::new();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_identical_secrets() {
        let mut settings = valid_auth_settings();
        settings.refresh_token_secret = settings.access_token_secret.clone();
        assert!(settings.validate().is_err());
    }
}
