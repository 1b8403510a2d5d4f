//! Identity middleware for the PanenHub server.
//! This middleware can be placed on any route or service.
//!
//! If the request carries an `Authorization: Bearer <token>` header, the token is checked with the configured
//! [`IdentityProvider`], and the resulting [`AuthenticatedUser`] is stored in the request extensions. A token that
//! does not verify is answered with 401 straight away.
//!
//! Requests without a token pass through untouched. Handlers that need a user take an [`AuthenticatedUser`]
//! argument, which fails with 401 when no user was stored.

use std::{pin::Pin, rc::Rc, sync::Arc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorServiceUnavailable, ErrorUnauthorized},
    http::header::AUTHORIZATION,
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;

use crate::{
    auth::{bearer_token, AuthenticatedUser, IdentityProvider},
    errors::AuthError,
};

pub struct IdentityMiddlewareFactory<I> {
    provider: Arc<I>,
}

impl<I> IdentityMiddlewareFactory<I> {
    pub fn new(provider: Arc<I>) -> Self {
        IdentityMiddlewareFactory { provider }
    }
}

impl<S, B, I> Transform<S, ServiceRequest> for IdentityMiddlewareFactory<I>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    I: IdentityProvider + 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = IdentityMiddlewareService<S, I>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(IdentityMiddlewareService { provider: Arc::clone(&self.provider), service: Rc::new(service) })
    }
}

pub struct IdentityMiddlewareService<S, I> {
    provider: Arc<I>,
    service: Rc<S>,
}

impl<S, B, I> Service<ServiceRequest> for IdentityMiddlewareService<S, I>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    I: IdentityProvider + 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let provider = Arc::clone(&self.provider);
        Box::pin(async move {
            let header = req.headers().get(AUTHORIZATION).map(|v| v.to_str().map(str::to_string));
            let token = match header {
                None => return service.call(req).await,
                Some(Ok(value)) => bearer_token(&value).map(str::to_string),
                Some(Err(_)) => None,
            };
            let Some(token) = token else {
                debug!("🔐️ Malformed Authorization header");
                return Err(ErrorUnauthorized("Malformed Authorization header"));
            };
            match provider.verify_token(&token).await {
                Ok(user) => {
                    trace!("🔐️ Request authenticated as {}", user.user_id);
                    req.extensions_mut().insert::<AuthenticatedUser>(user);
                    service.call(req).await
                },
                Err(AuthError::ProviderUnavailable(e)) => {
                    warn!("🔐️ Could not verify token. {e}");
                    Err(ErrorServiceUnavailable("The identity provider is unavailable"))
                },
                Err(e) => {
                    debug!("🔐️ {e}");
                    Err(ErrorUnauthorized("Invalid bearer token"))
                },
            }
        })
    }
}
