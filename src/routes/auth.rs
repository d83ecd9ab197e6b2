/// Authentication Routes
///
/// User registration, login, token refresh, logout, current-identity lookup,
/// and password change. Tokens are delivered both in the JSON body and as
/// `httpOnly`/`secure` cookies; the refresh endpoint accepts the token from
/// either place.

use actix_web::cookie::Cookie;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{self, hash_password, verify_password, Identity, TokenPair};
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError, ValidationError};
use crate::store::{CredentialStore, NewUser, User};
use crate::validators::{is_valid_email, is_valid_full_name, is_valid_username};

/// User registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
}

/// User login request: a username or an email plus the password.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

/// Token refresh request body (the cookie takes precedence).
#[derive(Deserialize, Default)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Password change request
#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Response carrying a freshly issued token pair
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenResponse {
    fn new(pair: TokenPair, auth_config: &AuthSettings) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: auth_config.access_token_expiry,
        }
    }
}

/// Login response: the identity plus the token pair
#[derive(Serialize)]
pub struct LoginResponse {
    pub user: Identity,
    #[serde(flatten)]
    pub tokens: TokenResponse,
}

/// Created-user response
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

fn session_cookie(name: &str, value: &str) -> Cookie<'static> {
    Cookie::build(name.to_owned(), value.to_owned())
        .path("/")
        .http_only(true)
        .secure(true)
        .finish()
}

fn removal_cookie(name: &str) -> Cookie<'static> {
    let mut cookie = session_cookie(name, "");
    cookie.make_removal();
    cookie
}

/// POST /auth/register
///
/// Register a new user. Returns the created identity; registration does not
/// start a session, the client logs in afterwards.
///
/// # Errors
/// - 400: Validation errors (invalid username/email/name, weak password)
/// - 409: Username or email already registered
/// - 500: Internal server error
pub async fn register<C: CredentialStore + 'static>(
    form: web::Json<RegisterRequest>,
    store: web::Data<C>,
) -> Result<HttpResponse, AppError> {
    let username = is_valid_username(&form.username)?;
    let email = is_valid_email(&form.email)?;
    let full_name = is_valid_full_name(&form.full_name)?;
    let password_hash = hash_password(&form.password)?;

    let user = store
        .create_user(NewUser {
            username,
            email,
            full_name,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok(HttpResponse::Created().json(UserResponse::from(&user)))
}

/// POST /auth/login
///
/// Authenticate with username or email plus password. On success the new
/// token pair is set as cookies and returned in the body.
///
/// # Security Notes
/// - Unknown identifier and wrong password return the same error
/// - A successful login replaces any previously registered refresh token
///
/// # Errors
/// - 400: Neither username nor email supplied
/// - 401: Invalid credentials
/// - 500: Internal server error
pub async fn login<C: CredentialStore + 'static>(
    form: web::Json<LoginRequest>,
    store: web::Data<C>,
    auth_config: web::Data<AuthSettings>,
) -> Result<HttpResponse, AppError> {
    let identifier = form
        .username
        .as_deref()
        .or(form.email.as_deref())
        .ok_or_else(|| {
            AppError::Validation(ValidationError::EmptyField(
                "username or email".to_string(),
            ))
        })?;

    let (identity, pair) =
        auth::login(store.get_ref(), auth_config.get_ref(), identifier, &form.password).await?;

    Ok(HttpResponse::Ok()
        .cookie(session_cookie("accessToken", &pair.access_token))
        .cookie(session_cookie("refreshToken", &pair.refresh_token))
        .json(LoginResponse {
            user: identity,
            tokens: TokenResponse::new(pair, auth_config.get_ref()),
        }))
}

/// POST /auth/refresh
///
/// Exchange a refresh token (cookie or body) for a fresh pair. The presented
/// token is retired whether or not it had time left; a retired or otherwise
/// invalid token forces a new login.
///
/// # Errors
/// - 401: Missing, expired, invalid, or superseded refresh token
/// - 500: Internal server error
pub async fn refresh<C: CredentialStore + 'static>(
    request: HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
    store: web::Data<C>,
    auth_config: web::Data<AuthSettings>,
) -> Result<HttpResponse, AppError> {
    let presented = request
        .cookie("refreshToken")
        .map(|c| c.value().to_string())
        .or_else(|| body.and_then(|b| b.into_inner().refresh_token));

    let pair =
        auth::rotate_session(store.get_ref(), auth_config.get_ref(), presented.as_deref()).await?;

    Ok(HttpResponse::Ok()
        .cookie(session_cookie("accessToken", &pair.access_token))
        .cookie(session_cookie("refreshToken", &pair.refresh_token))
        .json(TokenResponse::new(pair, auth_config.get_ref())))
}

/// POST /auth/logout
///
/// Clear the session register entry and instruct the client to drop both
/// cookies. Requires a valid access token; calling it when already logged
/// out succeeds.
pub async fn logout<C: CredentialStore + 'static>(
    identity: web::ReqData<Identity>,
    store: web::Data<C>,
) -> Result<HttpResponse, AppError> {
    auth::logout(store.get_ref(), identity.id).await?;

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie("accessToken"))
        .cookie(removal_cookie("refreshToken"))
        .json(serde_json::json!({ "message": "Logged out" })))
}

/// GET /auth/me
///
/// Return the identity the request gate resolved for this request.
pub async fn current_user(identity: web::ReqData<Identity>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(identity.into_inner()))
}

/// POST /auth/change-password
///
/// Replace the caller's password after verifying the old one. Does not
/// touch the session register; existing tokens stay valid.
///
/// # Errors
/// - 400: New password fails strength validation
/// - 401: Old password is wrong
/// - 500: Internal server error
pub async fn change_password<C: CredentialStore + 'static>(
    identity: web::ReqData<Identity>,
    form: web::Json<ChangePasswordRequest>,
    store: web::Data<C>,
) -> Result<HttpResponse, AppError> {
    let user = store
        .find_by_id(identity.id)
        .await?
        .ok_or(AuthError::UnknownIdentity)?;

    if !verify_password(&form.old_password, &user.password_hash)? {
        return Err(AuthError::InvalidCredentials.into());
    }

    let password_hash = hash_password(&form.new_password)?;
    store.update_password(user.id, &password_hash).await?;

    tracing::info!(user_id = %user.id, "Password changed");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Password updated" })))
}
