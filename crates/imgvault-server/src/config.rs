use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

/// Startup configuration, read once and passed to everything that needs it.
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub public_dir: PathBuf,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("IMGVAULT_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("IMGVAULT_JWT_SECRET is unset or still a placeholder");
        }

        let db_path = lookup("IMGVAULT_DB_PATH").unwrap_or_else(|| "imgvault.db".into());
        let host = lookup("IMGVAULT_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("IMGVAULT_PORT")
            .or_else(|| lookup("PORT"))
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("IMGVAULT_PORT is not a valid port")?;
        let public_dir = lookup("IMGVAULT_PUBLIC_DIR").unwrap_or_else(|| "public".into());
        let timeout_secs: u64 = lookup("IMGVAULT_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".into())
            .parse()
            .context("IMGVAULT_REQUEST_TIMEOUT_SECS is not a number of seconds")?;

        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        Ok(Self {
            jwt_secret,
            db_path: db_path.into(),
            addr,
            public_dir: public_dir.into(),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
