//! Bearer token issuing and verification.
//!
//! Tokens are HS256 JWTs whose claims are the caller-supplied JSON object plus
//! `iat` and `exp`. Nothing is persisted, a token is valid as long as its
//! signature checks out, `exp` lies in the future and any `nbf` has passed.

use crate::types::Record;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{json, Value};
use thiserror::Error;

pub type Claims = Record;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("no signing secret configured")]
    MissingSecret,
    #[error("token payload must be a JSON object")]
    PayloadNotObject,
    #[error("token payload already has an \"exp\" claim")]
    ExpiryAlreadySet,
    #[error("\"{0}\" claim must be a number of seconds")]
    NonNumericClaim(&'static str),
    #[error("token has expired")]
    Expired,
    #[error("jwt processing error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

#[derive(Clone)]
pub struct TokenService {
    secret: Option<String>,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: Option<String>) -> Self {
        Self::with_ttl(secret, Duration::hours(1))
    }

    pub fn with_ttl(secret: Option<String>, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    fn secret(&self) -> Result<&[u8], TokenError> {
        self.secret
            .as_deref()
            .map(str::as_bytes)
            .ok_or(TokenError::MissingSecret)
    }

    pub fn issue(&self, payload: Value) -> Result<String, TokenError> {
        let secret = self.secret()?;
        let Value::Object(mut claims) = payload else {
            return Err(TokenError::PayloadNotObject);
        };
        if claims.contains_key("exp") {
            return Err(TokenError::ExpiryAlreadySet);
        }

        if claims.get("nbf").is_some_and(|nbf| !nbf.is_number()) {
            return Err(TokenError::NonNumericClaim("nbf"));
        }
        // A zero `iat` counts as absent.
        let issued_at = match claims.get("iat") {
            None => None,
            Some(Value::Number(iat)) => iat
                .as_f64()
                .filter(|iat| *iat != 0.0)
                .map(|iat| iat.floor() as i64),
            Some(_) => return Err(TokenError::NonNumericClaim("iat")),
        }
        .unwrap_or_else(|| Utc::now().timestamp());
        claims.insert("iat".into(), json!(issued_at));
        claims.insert("exp".into(), json!(issued_at + self.ttl.num_seconds()));

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret),
        )?;
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let secret = self.secret()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)?;

        // The decoder still accepts a token in the second `exp` names.
        let expires_at = data.claims.get("exp").and_then(Value::as_f64);
        if expires_at.is_some_and(|exp| exp <= Utc::now().timestamp() as f64) {
            return Err(TokenError::Expired);
        }
        Ok(data.claims)
    }
}
