use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::services::AppState;

/// Closed role set. The identity provider's `role` claim is parsed into
/// this enum exactly once, at the trust boundary; everything downstream
/// receives the already-validated value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Coach,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Coach => "coach",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "student" | "learner" => Ok(Role::Student),
            "coach" => Ok(Role::Coach),
            _ => Err(format!("Unknown role: {}", value)),
        }
    }
}

/// Claims we read out of a verified OIDC access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OidcClaims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

/// The authenticated caller, stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub role: Role,
}

impl AuthUser {
    pub fn from_claims(claims: &OidcClaims) -> Result<Self, String> {
        Ok(Self {
            id: claims.sub.clone(),
            role: Role::from_str(&claims.role)?,
        })
    }
}

/// Verification keys fetched from the identity provider's JWKS endpoint,
/// cached by `kid`. On an unknown `kid` the document is refetched once
/// (key rotation), then the token is rejected.
pub struct JwksCache {
    http: reqwest::Client,
    jwks_url: String,
    keys: RwLock<HashMap<String, DecodingKey>>,
}

impl JwksCache {
    pub fn new(jwks_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            jwks_url,
            keys: RwLock::new(HashMap::new()),
        }
    }

    pub async fn decoding_key(&self, kid: &str) -> Option<DecodingKey> {
        if let Some(key) = self.keys.read().await.get(kid) {
            return Some(key.clone());
        }

        if let Err(err) = self.refresh().await {
            tracing::warn!("JWKS refresh failed: {}", err);
            return None;
        }

        self.keys.read().await.get(kid).cloned()
    }

    async fn refresh(&self) -> anyhow::Result<()> {
        let jwks: JwkSet = self
            .http
            .get(&self.jwks_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut fresh = HashMap::new();
        for jwk in &jwks.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                continue;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    fresh.insert(kid, key);
                }
                Err(err) => tracing::warn!("Skipping unusable JWK {}: {}", kid, err),
            }
        }

        tracing::info!("JWKS refreshed: {} verification keys", fresh.len());
        *self.keys.write().await = fresh;
        Ok(())
    }
}

/// Bearer-token authentication against the OIDC provider. Inserts
/// `AuthUser` into request extensions on success.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let header = decode_header(token).map_err(|e| {
        tracing::warn!("Malformed JWT header: {}", e);
        StatusCode::UNAUTHORIZED
    })?;
    let kid = header.kid.ok_or_else(|| {
        tracing::warn!("JWT without kid rejected");
        StatusCode::UNAUTHORIZED
    })?;

    let key = state
        .jwks
        .decoding_key(&kid)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[state.config.oidc_audience.as_str()]);
    validation.set_issuer(&[state.config.oidc_issuer.as_str()]);

    let claims = decode::<OidcClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::warn!("JWT validation failed: {}", e);
            StatusCode::UNAUTHORIZED
        })?;

    let user = AuthUser::from_claims(&claims).map_err(|e| {
        tracing::warn!("Rejected token: {}", e);
        StatusCode::FORBIDDEN
    })?;

    tracing::debug!("Authenticated user: {} (role: {})", user.id, user.role.as_str());

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
