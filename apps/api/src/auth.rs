//! Bearer-token verification against the Supabase identity provider.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

/// The caller, as confirmed by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthedUser {
    pub id: Uuid,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthedUser, AppError>;
}

/// Verifies tokens with `GET {supabase_url}/auth/v1/user`.
#[derive(Clone)]
pub struct SupabaseAuth {
    client: Client,
    user_endpoint: String,
    anon_key: String,
}

#[derive(Debug, Deserialize)]
struct SupabaseUser {
    id: Uuid,
}

impl SupabaseAuth {
    pub fn new(supabase_url: &str, anon_key: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            user_endpoint: format!("{}/auth/v1/user", supabase_url.trim_end_matches('/')),
            anon_key,
        })
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    async fn verify(&self, token: &str) -> Result<AuthedUser, AppError> {
        let response = self
            .client
            .get(&self.user_endpoint)
            .bearer_auth(token)
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("identity provider unreachable: {e}")))?;

        let status = response.status();
        if status.is_client_error() {
            warn!(status = status.as_u16(), "Token rejected by identity provider");
            return Err(AppError::Unauthorized("invalid token".into()));
        }
        if !status.is_success() {
            return Err(AppError::Internal(anyhow::anyhow!(
                "identity provider returned {status}"
            )));
        }

        let user: SupabaseUser = response
            .json()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("malformed identity response: {e}")))?;

        Ok(AuthedUser { id: user.id })
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AppError> {
    let header = header.ok_or_else(|| AppError::Unauthorized("missing auth".into()))?;
    let (scheme, token) = header
        .split_once(' ')
        .ok_or_else(|| AppError::Unauthorized("malformed authorization header".into()))?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::Unauthorized(
            "malformed authorization header".into(),
        ));
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::Unauthorized("missing auth".into()));
    }
    Ok(token)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = bearer_token(header).inspect_err(|_| {
            warn!("Authentication failed: missing or malformed Authorization header");
        })?;

        state.identity.verify(token).await
    }
}
