//! Runtime configuration.
//!
//! Sources, highest priority first:
//! 1. Process environment (`DB_HOST` -> `db_host`, `JWT_SECRET` -> `jwt_secret`, ...)
//! 2. `config.toml` in the working directory, when present
//! 3. Built-in defaults
//!
//! `.env` is loaded into the process environment before the figment is built.

use crate::error::PortalError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Environment keys read by [`Config::figment`].
const ENV_KEYS: &[&str] = &[
    "db_host",
    "db_port",
    "db_database",
    "db_user",
    "db_password",
    "db_ssl_mode",
    "jwt_secret",
    "jwt_expire",
    "port",
    "loglevel",
    "sql_dir",
    "sql_files",
    "deploy_strict",
    "verify_timeout_secs",
];

const PLACEHOLDER_SECRETS: &[&str] = &["change-me", "changeme", "secret"];

const DEFAULT_JWT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub db_host: String,
    pub db_port: u16,
    pub db_database: String,
    pub db_user: String,
    pub db_password: String,
    /// One of `disable`, `allow`, `prefer`, `require`, `verify-ca`, `verify-full`.
    pub db_ssl_mode: String,
    /// HS256 signing key. Required by the server; the scripts never read it.
    pub jwt_secret: String,
    /// `"7d"`, `"12h"`, `"30m"`, `"45s"` or bare seconds.
    pub jwt_expire: String,
    pub port: u16,
    pub loglevel: String,
    pub sql_dir: PathBuf,
    /// Deploy order; names are resolved against `sql_dir`.
    pub sql_files: Vec<String>,
    pub deploy_strict: bool,
    pub verify_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_host: "localhost".to_string(),
            db_port: 5432,
            db_database: "jobportal".to_string(),
            db_user: "postgres".to_string(),
            db_password: String::new(),
            db_ssl_mode: "prefer".to_string(),
            jwt_secret: String::new(),
            jwt_expire: "7d".to_string(),
            port: 5000,
            loglevel: "info".to_string(),
            sql_dir: PathBuf::from("sql"),
            sql_files: vec![
                "schema.sql".to_string(),
                "seed_data.sql".to_string(),
                "sample_jobs.sql".to_string(),
            ],
            deploy_strict: false,
            verify_timeout_secs: 15,
        }
    }
}

impl Config {
    /// Load `.env`, then extract from the full provider chain.
    pub fn load() -> Result<Self, PortalError> {
        dotenvy::dotenv().ok();
        Self::from_figment(Self::figment())
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::raw().only(ENV_KEYS))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, PortalError> {
        let cfg: Self = figment.extract()?;
        cfg.ssl_mode()?;
        cfg.jwt_ttl()?;
        Ok(cfg)
    }

    pub fn ssl_mode(&self) -> Result<PgSslMode, PortalError> {
        PgSslMode::from_str(&self.db_ssl_mode).map_err(|e| PortalError::InvalidConfig {
            field: "db_ssl_mode".to_string(),
            reason: e.to_string(),
        })
    }

    /// Connection options for the configured Postgres instance.
    pub fn pg_connect_options(&self) -> Result<PgConnectOptions, PortalError> {
        let mut opts = PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .database(&self.db_database)
            .username(&self.db_user)
            .ssl_mode(self.ssl_mode()?);
        if !self.db_password.is_empty() {
            opts = opts.password(&self.db_password);
        }
        Ok(opts)
    }

    pub fn deploy_files(&self) -> Vec<PathBuf> {
        self.sql_files.iter().map(|f| self.sql_dir.join(f)).collect()
    }

    pub fn jwt_ttl(&self) -> Result<Duration, PortalError> {
        parse_expiry(&self.jwt_expire).ok_or_else(|| PortalError::InvalidConfig {
            field: "jwt_expire".to_string(),
            reason: format!("unrecognised duration `{}`", self.jwt_expire),
        })
    }

    pub fn verify_timeout(&self) -> Duration {
        Duration::from_secs(self.verify_timeout_secs.max(1))
    }

    /// The signing key, refusing an unset or placeholder value.
    pub fn signing_secret(&self) -> Result<&str, PortalError> {
        let secret = self.jwt_secret.trim();
        if secret.is_empty() || PLACEHOLDER_SECRETS.contains(&secret) {
            return Err(PortalError::InvalidConfig {
                field: "jwt_secret".to_string(),
                reason: "set JWT_SECRET to a private random value".to_string(),
            });
        }
        Ok(secret)
    }

    /// Connection target without credentials, for log lines.
    pub fn db_target(&self) -> String {
        format!("{}:{}/{}", self.db_host, self.db_port, self.db_database)
    }
}

/// Parse `"7d"`, `"12h"`, `"30m"`, `"45s"` or plain seconds. Empty input means the default.
pub fn parse_expiry(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(DEFAULT_JWT_TTL);
    }
    let split = raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let amount: u64 = digits.parse().ok()?;
    let secs = match unit.trim() {
        "" | "s" => amount,
        "m" => amount.checked_mul(60)?,
        "h" => amount.checked_mul(60 * 60)?,
        "d" => amount.checked_mul(24 * 60 * 60)?,
        _ => return None,
    };
    (secs > 0).then(|| Duration::from_secs(secs))
}
