//! Layered configuration: built-in defaults, an optional TOML file and
//! `DISPATCH__` environment overrides, in that order.

use std::path::Path;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "config/dispatchd.toml",
    "dispatchd.toml",
    "/etc/dispatchd/config.toml",
];

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub bind_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_expire_minutes: i64,
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("database.url", "postgresql://localhost/dispatch")?
            .set_default("database.max_connections", 10)?
            .set_default("database.connection_timeout_seconds", 30)?
            .set_default("api.bind_address", "0.0.0.0:8080")?
            .set_default("auth.jwt_secret", "")?
            .set_default("auth.access_token_expire_minutes", 30)?;

        if let Some(path) = config_path {
            if !Path::new(path).exists() {
                bail!("config file does not exist: {path}");
            }
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        } else {
            for path in DEFAULT_CONFIG_PATHS {
                if Path::new(path).exists() {
                    builder = builder.add_source(File::new(path, FileFormat::Toml));
                    break;
                }
            }
        }

        // e.g. DISPATCH__DATABASE__URL, DISPATCH__AUTH__JWT_SECRET
        builder = builder.add_source(Environment::with_prefix("DISPATCH").separator("__"));

        let config: AppConfig = builder
            .build()?
            .try_deserialize()
            .context("failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.database.url.starts_with("postgres://")
            && !self.database.url.starts_with("postgresql://")
        {
            bail!("database.url must be a postgres:// or postgresql:// url");
        }
        if self.database.max_connections == 0 {
            bail!("database.max_connections must be greater than zero");
        }
        if self.auth.jwt_secret.is_empty() {
            bail!("auth.jwt_secret must be set (file or DISPATCH__AUTH__JWT_SECRET)");
        }
        if self.auth.access_token_expire_minutes <= 0 {
            bail!("auth.access_token_expire_minutes must be positive");
        }
        Ok(())
    }
}
