//! Session resolution from bearer tokens
//!
//! Tokens are issued by the external auth service. This module only checks
//! the signature and expiry and turns the claims into a [`SessionUser`].

use anyhow::Result;
use axum::http::HeaderMap;
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{context::SessionUser, settings::SessionConfig};

/// JWT claims issued by the auth service
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    pub email: String,
    /// Expiration time
    pub exp: u64,
}

/// Verifies bearer tokens and yields the session user
#[derive(Clone)]
pub struct SessionVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionVerifier {
    /// Build a verifier from configuration, preferring RS256 when a public key is set
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        if let Some(public_key) = &config.jwt_public_key {
            let pem = read_pem(public_key)?;
            let decoding_key = DecodingKey::from_rsa_pem(pem.as_bytes())
                .map_err(|e| anyhow::anyhow!("Failed to create decoding key: {}", e))?;
            return Ok(Self {
                decoding_key,
                validation: Validation::new(Algorithm::RS256),
            });
        }

        match &config.jwt_secret {
            Some(secret) if !secret.is_empty() => Ok(Self::hs256(secret.as_bytes())),
            _ => anyhow::bail!(
                "Either CLINIC__SESSION__JWT_PUBLIC_KEY or CLINIC__SESSION__JWT_SECRET must be set"
            ),
        }
    }

    /// Verifier for tokens signed with a shared HS256 secret
    pub fn hs256(secret: &[u8]) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Resolve the session carried by `Authorization: Bearer <token>`.
    ///
    /// Returns `None` for a missing, malformed, expired or forged token.
    pub fn get_session(&self, headers: &HeaderMap) -> Option<SessionUser> {
        let Some(authorization) = headers.typed_get::<Authorization<Bearer>>() else {
            debug!("Request without bearer token");
            return None;
        };

        let token = authorization.token();
        match jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(SessionUser {
                id: data.claims.sub,
                email: data.claims.email,
            }),
            Err(e) => {
                warn!("Rejected bearer token: {}", e);
                None
            }
        }
    }
}

/// Accept either an inline PEM or a path to one
fn read_pem(value: &str) -> Result<String> {
    if value.starts_with("-----BEGIN") {
        return Ok(value.to_string());
    }

    let pem = std::fs::read_to_string(value)
        .map_err(|e| anyhow::anyhow!("Failed to read public key file {}: {}", value, e))?;
    Ok(pem.trim().to_string())
}
