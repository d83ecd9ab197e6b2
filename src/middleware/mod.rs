/// Middleware module
///
/// Custom middleware for authentication and request-level concerns.

mod auth_middleware;

pub use auth_middleware::AuthMiddleware;
