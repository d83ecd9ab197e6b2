use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;

use crate::configuration::AuthSettings;
use crate::logger::RequestLogger;
use crate::middleware::AuthMiddleware;
use crate::routes::{
    change_password, current_user, health_check, login, logout, refresh, register,
};
use crate::store::CredentialStore;

/// Assemble and start the server.
///
/// Generic over the credential store so the test suite can mount the
/// in-memory implementation behind the exact same routing and middleware.
pub fn run<C>(
    listener: TcpListener,
    store: C,
    auth_config: AuthSettings,
) -> Result<Server, std::io::Error>
where
    C: CredentialStore + Clone + 'static,
{
    let store_data = web::Data::new(store.clone());
    let auth_config_data = web::Data::new(auth_config.clone());

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(RequestLogger)

            // Shared state
            .app_data(store_data.clone())
            .app_data(auth_config_data.clone())

            // Public routes (no authentication required)
            .route("/health_check", web::get().to(health_check))
            .route("/auth/register", web::post().to(register::<C>))
            .route("/auth/login", web::post().to(login::<C>))
            .route("/auth/refresh", web::post().to(refresh::<C>))

            // Protected routes (require a valid access token)
            .service(
                web::scope("/auth")
                    .wrap(AuthMiddleware::new(store.clone(), auth_config.clone()))
                    .route("/logout", web::post().to(logout::<C>))
                    .route("/me", web::get().to(current_user))
                    .route("/change-password", web::post().to(change_password::<C>)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
