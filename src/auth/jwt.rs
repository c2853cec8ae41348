use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{config::JwtConfig, state::AppState};

/// JWT payload. `exp` is only present when a token lifetime is configured.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<usize>,
}

/// Why a token was refused. Every variant is a terminal rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("signature mismatch")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_minutes: Option<i64>,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl_minutes: cfg.ttl_minutes,
        }
    }

    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = match self.ttl_minutes {
            Some(minutes) => {
                let exp = minutes
                    .checked_mul(60)
                    .and_then(|secs| now.checked_add(TimeDuration::seconds(secs)))
                    .ok_or_else(|| anyhow::anyhow!("token lifetime of {minutes} minutes is out of range"))?;
                Some(exp.unix_timestamp() as usize)
            }
            None => None,
        };
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation())?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims.sub)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        if self.ttl_minutes.is_some() {
            validation.set_required_spec_claims(&["exp"]);
            validation.validate_exp = true;
        } else {
            validation.required_spec_claims.clear();
            validation.validate_exp = false;
        }
        validation
    }
}
