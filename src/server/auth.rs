//! Caller identity.
//!
//! The credential is the bearer token of the `Authorization` header. In
//! `jwt` mode it must be an HS256 token signed with the configured secret.
//! In `mock` mode a missing credential resolves to [`MOCK_SUBJECT`] and a
//! `mock:<subject>` token to that subject, so several owners can be
//! modelled without a token issuer.

use crate::libs::config::{AuthMode, ServerConfig};
use crate::libs::error::{RpcError, RpcResult};
use crate::libs::messages::Message;
use crate::msg_error_anyhow;
use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const MOCK_SUBJECT: &str = "mock-user";
const MOCK_PREFIX: &str = "mock:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: usize,
}

/// The resolved caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub email: Option<String>,
}

pub struct Authenticator {
    mode: AuthMode,
    key: Option<DecodingKey>,
}

impl Authenticator {
    pub fn mock() -> Self {
        Self {
            mode: AuthMode::Mock,
            key: None,
        }
    }

    pub fn jwt(secret: &str) -> Self {
        Self {
            mode: AuthMode::Jwt,
            key: Some(DecodingKey::from_secret(secret.as_bytes())),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        match config.auth_mode {
            AuthMode::Mock => Ok(Self::mock()),
            AuthMode::Jwt => {
                let secret = config
                    .jwt_secret
                    .as_deref()
                    .filter(|secret| !secret.is_empty())
                    .ok_or_else(|| msg_error_anyhow!(Message::JwtSecretMissing))?;
                Ok(Self::jwt(secret))
            }
        }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn authenticate(&self, credential: Option<&str>) -> RpcResult<Identity> {
        let credential = credential.map(str::trim).filter(|token| !token.is_empty());

        match (self.mode, credential) {
            (AuthMode::Mock, None) => Ok(Identity {
                subject: MOCK_SUBJECT.to_string(),
                email: None,
            }),
            (AuthMode::Mock, Some(token)) => match token.strip_prefix(MOCK_PREFIX) {
                Some(subject) if !subject.trim().is_empty() => Ok(Identity {
                    subject: subject.trim().to_string(),
                    email: None,
                }),
                _ => Err(RpcError::Unauthorized("mock credentials must look like 'mock:<subject>'".into())),
            },
            (AuthMode::Jwt, None) => Err(RpcError::Unauthorized("missing bearer token".into())),
            (AuthMode::Jwt, Some(token)) => {
                let key = self
                    .key
                    .as_ref()
                    .ok_or_else(|| RpcError::Internal("jwt mode without a key".into()))?;
                let data = decode::<Claims>(token, key, &Validation::new(Algorithm::HS256))
                    .map_err(|e| RpcError::Unauthorized(format!("invalid token: {}", e)))?;
                if data.claims.sub.trim().is_empty() {
                    return Err(RpcError::Unauthorized("token has no subject".into()));
                }
                Ok(Identity {
                    subject: data.claims.sub,
                    email: data.claims.email,
                })
            }
        }
    }
}

/// Mints an HS256 token for `subject` valid for `ttl`.
pub fn sign_token(secret: &str, subject: &str, email: Option<&str>, ttl: Duration) -> Result<String> {
    let claims = Claims {
        sub: subject.to_string(),
        email: email.map(str::to_string),
        exp: (Utc::now() + ttl).timestamp().max(0) as usize,
    };
    let token = encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))?;
    Ok(token)
}
