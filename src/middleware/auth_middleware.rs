/// Session Authentication Middleware
///
/// The request gate for protected routes: extracts an access token from the
/// `accessToken` cookie or the Authorization header, resolves it to an
/// identity, and injects the identity into request extensions for handlers.
/// Verification is read-only; the middleware never touches the session
/// register.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::authenticate;
use crate::configuration::AuthSettings;
use crate::store::CredentialStore;

pub struct AuthMiddleware<C> {
    store: C,
    auth_config: AuthSettings,
}

impl<C> AuthMiddleware<C> {
    pub fn new(store: C, auth_config: AuthSettings) -> Self {
        Self { store, auth_config }
    }
}

impl<C, S, B> Transform<S, ServiceRequest> for AuthMiddleware<C>
where
    C: CredentialStore + Clone + 'static,
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<C, S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            store: self.store.clone(),
            auth_config: self.auth_config.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<C, S> {
    service: Rc<S>,
    store: C,
    auth_config: AuthSettings,
}

/// Cookie first, then `Authorization: Bearer`.
fn extract_access_token(req: &ServiceRequest) -> Option<String> {
    if let Some(cookie) = req.request().cookie("accessToken") {
        return Some(cookie.value().to_string());
    }

    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

impl<C, S, B> Service<ServiceRequest> for AuthMiddlewareService<C, S>
where
    C: CredentialStore + Clone + 'static,
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = extract_access_token(&req);
        let service = self.service.clone();
        let store = self.store.clone();
        let auth_config = self.auth_config.clone();

        Box::pin(async move {
            match authenticate(&store, &auth_config, token.as_deref()).await {
                Ok(identity) => {
                    tracing::debug!(user_id = %identity.id, "Access token verified");
                    req.extensions_mut().insert(identity);
                    service.call(req).await
                }
                Err(e) => Err(e.into()),
            }
        })
    }
}
