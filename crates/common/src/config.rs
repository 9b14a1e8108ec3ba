//! Configuration management following 12-factor app principles
//!
//! Process-level settings are loaded from environment variables. Settings that
//! belong to one collaborator (storage, LLM, render) live next to that
//! collaborator as its own `*Config::from_env()`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Log filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str =
    "info,stencil_app=debug,stencil_artifacts=debug,stencil_artworks=debug";

/// Which persistence backend the application is composed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceProvider {
    Postgres,
    Memory,
}

impl std::str::FromStr for PersistenceProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow::anyhow!(
                "Unknown persistence provider: {}. Supported providers: postgres, memory",
                other
            )),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database connection URL, required for the postgres provider
    pub database_url: Option<String>,

    /// Persistence backend for artworks
    pub persistence_provider: PersistenceProvider,

    /// Runtime configuration
    pub rust_log: String,
    pub log_format: String,
    pub port: u16,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("persistence_provider", &self.persistence_provider)
            .field("rust_log", &self.rust_log)
            .field("log_format", &self.log_format)
            .field("port", &self.port)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let persistence_provider: PersistenceProvider = env::var("PERSISTENCE_PROVIDER")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()?;

        let database_url = env::var("DATABASE_URL").ok();
        if persistence_provider == PersistenceProvider::Postgres && database_url.is_none() {
            return Err(anyhow::anyhow!(
                "DATABASE_URL is required for the postgres persistence provider"
            ));
        }

        let config = Self {
            database_url,
            persistence_provider,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()),
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
        };

        Ok(config)
    }
}
