//! Bearer-token authentication.
//!
//! The server does not issue or sign tokens. Users sign in with the managed auth service, and the server asks that
//! service who a token belongs to ([`IdentityProvider::verify_token`]). The [`crate::middleware::IdentityMiddlewareFactory`]
//! does this once per request and stores the result in the request extensions, where handlers pick it up with the
//! [`AuthenticatedUser`] extractor.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use groupbuy_engine::{campaign_objects::Actor, db_types::UserId};
use log::*;
use reqwest::{header::AUTHORIZATION, Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

/// The user a bearer token belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub email: Option<String>,
}

impl AuthenticatedUser {
    pub fn new<U: Into<UserId>>(user_id: U, email: Option<String>) -> Self {
        Self { user_id: user_id.into(), email }
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id.clone(), self.email.clone())
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<AuthenticatedUser>().cloned();
        ready(user.ok_or(ServerError::AuthenticationError(AuthError::MissingToken)))
    }
}

/// Resolves bearer tokens to users.
#[allow(async_fn_in_trait)]
pub trait IdentityProvider {
    async fn verify_token(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[derive(Debug, Deserialize)]
struct AuthServiceUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Verifies tokens against the Supabase auth API (`GET <url>/auth/v1/user`).
#[derive(Clone)]
pub struct SupabaseAuth {
    config: AuthConfig,
    client: Client,
}

impl std::fmt::Debug for SupabaseAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SupabaseAuth({})", self.config.url)
    }
}

impl SupabaseAuth {
    pub fn new(config: AuthConfig) -> Result<Self, ServerError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| ServerError::InitializeError(format!("Could not build the auth client. {e}")))?;
        Ok(Self { config, client })
    }

    fn user_url(&self) -> String {
        format!("{}/auth/v1/user", self.config.url)
    }
}

impl IdentityProvider for SupabaseAuth {
    async fn verify_token(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if !self.config.is_configured() {
            warn!("🔐️ The auth service is not configured. Rejecting token.");
            return Err(AuthError::ProviderUnavailable("The auth service is not configured".into()));
        }
        let response = self
            .client
            .get(self.user_url())
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header("apikey", self.config.api_key.reveal())
            .send()
            .await
            .map_err(|e| {
                error!("🔐️ Could not reach the auth service. {e}");
                AuthError::ProviderUnavailable(e.to_string())
            })?;
        match response.status() {
            StatusCode::OK => {
                let user = response.json::<AuthServiceUser>().await.map_err(|e| {
                    error!("🔐️ Unexpected response from the auth service. {e}");
                    AuthError::ProviderUnavailable(e.to_string())
                })?;
                trace!("🔐️ Token verified for {}", user.id);
                Ok(AuthenticatedUser::new(user.id, user.email))
            },
            status if status.is_client_error() => {
                debug!("🔐️ Auth service rejected token ({status})");
                Err(AuthError::InvalidToken(format!("The auth service rejected the token ({status})")))
            },
            status => {
                error!("🔐️ Auth service returned {status}");
                Err(AuthError::ProviderUnavailable(format!("The auth service returned {status}")))
            },
        }
    }
}
