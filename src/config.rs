//! Application configuration
//!
//! Every setting can come from the command line or the environment. The
//! store location is read from `--database` / `STARSHIPS_DATABASE` first and
//! falls back to the `DATABASE_PATH` variable that hosting setups commonly
//! provide.

use crate::seed::{DEFAULT_CATALOG_URL, DEFAULT_TIMEOUT_SECS, SwapiConfig, default_user_agent};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

pub const DATABASE_FALLBACK_ENV: &str = "DATABASE_PATH";
pub const DEFAULT_DATABASE: &str = "data/starships.db";

/// Where the record store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Memory,
    File(PathBuf),
}

impl DataSource {
    /// Parses `:memory:`, `file:<path>` or a bare path.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err("database location must not be empty".to_string());
        }
        if raw.eq_ignore_ascii_case(":memory:") || raw.eq_ignore_ascii_case("memory") {
            return Ok(Self::Memory);
        }

        let path = raw.strip_prefix("file:").unwrap_or(raw);
        if path.is_empty() {
            return Err("file: data source needs a path".to_string());
        }
        Ok(Self::File(PathBuf::from(path)))
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "starship_inventory", version, about = "Starship inventory web service")]
pub struct AppConfig {
    /// Store location (`:memory:`, `file:<path>` or a path)
    #[arg(long, env = "STARSHIPS_DATABASE")]
    pub database: Option<String>,

    /// Address to bind
    #[arg(long, env = "APP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "APP_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Catalog root used to find the first page of starships
    #[arg(long, env = "SEED_CATALOG_URL", default_value = DEFAULT_CATALOG_URL)]
    pub seed_catalog_url: String,

    /// Per-request timeout for the seed fetch, in seconds
    #[arg(long, env = "SEED_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub seed_timeout_secs: u64,

    /// Skip the remote catalog and seed an empty store with the built-in records
    #[arg(long, env = "SEED_OFFLINE")]
    pub offline_seed: bool,
}

impl AppConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolves the store location: primary setting, then the fallback
    /// environment variable, then the default path.
    pub fn data_source(&self) -> Result<DataSource, String> {
        let fallback = std::env::var(DATABASE_FALLBACK_ENV).ok();
        resolve_data_source(self.database.as_deref(), fallback.as_deref())
    }

    pub fn swapi(&self) -> SwapiConfig {
        SwapiConfig {
            catalog_url: self.seed_catalog_url.clone(),
            timeout: Duration::from_secs(self.seed_timeout_secs),
            user_agent: default_user_agent(),
        }
    }
}

fn resolve_data_source(primary: Option<&str>, fallback: Option<&str>) -> Result<DataSource, String> {
    let raw = primary
        .filter(|v| !v.trim().is_empty())
        .or(fallback.filter(|v| !v.trim().is_empty()))
        .unwrap_or(DEFAULT_DATABASE);
    DataSource::parse(raw)
}
