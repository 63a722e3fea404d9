use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use tracing::warn;

use crate::session::registry::{DEFAULT_IDLE_TTL, DEFAULT_MAX_SESSIONS};

/// Used when `JWT_SECRET` is unset. Fine for local development only.
pub const DEV_JWT_SECRET: &str = "your-secret-key";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    pub default_temperature: f32,
    pub session_idle_ttl_secs: u64,
    pub max_sessions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 3000,
                host: "0.0.0.0".to_string(),
                cors_allowed_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
                max_upload_bytes: 10 * 1024 * 1024,
            },
            auth: AuthConfig {
                secret: DEV_JWT_SECRET.to_string(),
            },
            chat: ChatConfig {
                default_temperature: crate::session::DEFAULT_TEMPERATURE,
                session_idle_ttl_secs: DEFAULT_IDLE_TTL.as_secs(),
                max_sessions: DEFAULT_MAX_SESSIONS,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                warn!("JWT_SECRET not set, using the development secret");
                defaults.auth.secret
            }
        };

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| defaults.server.port.to_string())
                    .parse()
                    .context("PORT must be a valid port number")?,
                host: env::var("HOST").unwrap_or(defaults.server.host),
                cors_allowed_origins: match env::var("ALLOWED_ORIGINS") {
                    Ok(origins) => origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect(),
                    Err(_) => defaults.server.cors_allowed_origins,
                },
                max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                    .unwrap_or_else(|_| defaults.server.max_upload_bytes.to_string())
                    .parse()
                    .context("MAX_UPLOAD_BYTES must be a byte count")?,
            },
            auth: AuthConfig { secret },
            chat: ChatConfig {
                default_temperature: env::var("DEFAULT_TEMPERATURE")
                    .unwrap_or_else(|_| defaults.chat.default_temperature.to_string())
                    .parse()
                    .context("DEFAULT_TEMPERATURE must be a number")?,
                session_idle_ttl_secs: env::var("SESSION_IDLE_TTL_SECS")
                    .unwrap_or_else(|_| defaults.chat.session_idle_ttl_secs.to_string())
                    .parse()
                    .context("SESSION_IDLE_TTL_SECS must be a number of seconds")?,
                max_sessions: env::var("MAX_SESSIONS")
                    .unwrap_or_else(|_| defaults.chat.max_sessions.to_string())
                    .parse()
                    .context("MAX_SESSIONS must be a count")?,
            },
        })
    }
}
