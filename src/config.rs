use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// Longest session a token may be issued for.
pub const MAX_SESSION_TTL_DAYS: i64 = 365;
const DEFAULT_SESSION_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_days: i64,
    /// Marks the session cookie `Secure`; on in production only.
    pub secure_cookie: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    /// Base for the durable URLs handed back to clients.
    pub public_url: String,
    /// Bound on a single profile picture upload.
    pub upload_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        anyhow::ensure!(!secret.trim().is_empty(), "JWT_SECRET must not be empty");

        let session = SessionConfig {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "chat-auth".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "chat-auth-users".into()),
            ttl_days: parse_ttl_days(std::env::var("SESSION_TTL_DAYS").ok().as_deref())?,
            secure_cookie: std::env::var("APP_ENV")
                .map(|v| v == "production")
                .unwrap_or(false),
        };

        let endpoint = std::env::var("S3_ENDPOINT").context("S3_ENDPOINT must be set")?;
        let bucket = std::env::var("S3_BUCKET").context("S3_BUCKET must be set")?;
        let public_url = std::env::var("S3_PUBLIC_URL")
            .unwrap_or_else(|_| format!("{}/{}", endpoint.trim_end_matches('/'), bucket));
        let storage = StorageConfig {
            access_key: std::env::var("S3_ACCESS_KEY").context("S3_ACCESS_KEY must be set")?,
            secret_key: std::env::var("S3_SECRET_KEY").context("S3_SECRET_KEY must be set")?,
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
            upload_timeout: Duration::from_secs(
                std::env::var("UPLOAD_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(30),
            ),
            endpoint,
            bucket,
            public_url,
        };

        Ok(Self {
            database_url,
            session,
            storage,
        })
    }
}

fn parse_ttl_days(raw: Option<&str>) -> anyhow::Result<i64> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(DEFAULT_SESSION_TTL_DAYS);
    };
    let days: i64 = raw
        .parse()
        .with_context(|| format!("SESSION_TTL_DAYS must be a whole number of days, got {raw:?}"))?;
    anyhow::ensure!(
        (1..=MAX_SESSION_TTL_DAYS).contains(&days),
        "SESSION_TTL_DAYS must be between 1 and {MAX_SESSION_TTL_DAYS}, got {days}"
    );
    Ok(days)
}
