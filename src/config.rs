use std::path::PathBuf;

use anyhow::Context;
use rand::{distributions::Alphanumeric, Rng};
use serde::Deserialize;
use tracing::warn;

/// Upper bound for token lifetimes: ten years.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365 * 10;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub static_dir: PathBuf,
    pub seed_demo_user: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let secret = match std::env::var("JWT_SECRET") {
            Ok(s) if !s.trim().is_empty() => s,
            _ => {
                warn!("JWT_SECRET not set; using a random per-process secret");
                random_secret()
            }
        };
        let jwt = JwtConfig {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "travel-assistant".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "travel-assistant-users".into()),
            ttl_minutes: ttl_var("JWT_TTL_MINUTES", 60)?,
            refresh_ttl_minutes: ttl_var("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14)?,
        };
        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_var("APP_PORT", 3000)?,
            jwt,
            static_dir: std::env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./public")),
            seed_demo_user: parse_var("SEED_DEMO_USER", true)?,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {name}: {raw:?}")),
        Err(_) => Ok(default),
    }
}

/// Token lifetime in minutes, within `1..=MAX_TTL_MINUTES`.
fn ttl_var(name: &str, default: i64) -> anyhow::Result<i64> {
    let minutes = parse_var(name, default)?;
    if !(1..=MAX_TTL_MINUTES).contains(&minutes) {
        anyhow::bail!("{name} must be between 1 and {MAX_TTL_MINUTES} minutes, got {minutes}");
    }
    Ok(minutes)
}

fn random_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}
