//! Token Authentication Stub
//!
//! Issues and verifies HS256 tokens and reads the current user from the
//! `token` cookie. Nothing in the chat flow depends on it; it exists for
//! callers that want an identity next to the chat API.

use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error};

/// Cookie carrying the session token
pub const TOKEN_COOKIE: &str = "token";

/// Token lifetime
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Caller-supplied claims plus issue and expiry times
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    #[serde(flatten)]
    pub payload: Map<String, Value>,
    pub iat: i64,
    pub exp: i64,
}

/// Sign `payload` with `secret`, valid for 24 hours.
pub fn create_token(
    payload: Map<String, Value>,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        payload,
        iat: now.timestamp(),
        exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .inspect_err(|e| error!(error = %e, "Error creating token"))
}

/// Decode and check a token. Any failure yields `None`.
pub fn verify_token(token: &str, secret: &str) -> Option<Claims> {
    let validation = Validation::new(Algorithm::HS256);

    match decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation) {
        Ok(data) => Some(data.claims),
        Err(e) => {
            debug!(error = %e, "Token verification failed");
            None
        }
    }
}

/// Claims of the user identified by the `token` cookie, if any.
pub fn get_user(headers: &HeaderMap, secret: &str) -> Option<Claims> {
    let token = token_from_cookies(headers)?;
    verify_token(&token, secret)
}

fn token_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
