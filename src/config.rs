use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use log::info;

use crate::error::ConfigError;
use crate::store::DEFAULT_TTL;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATA: &str = "data";
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3000/exec";

/// Runtime settings, read from `LIBRETTO_*` environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// CSV directory or `.xlsx` workbook
    pub data_path: PathBuf,
    pub cache_ttl: Duration,
    /// Served under `/static` when set
    pub static_dir: Option<PathBuf>,
    /// Where the query client sends its requests
    pub endpoint: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_path: PathBuf::from(DEFAULT_DATA),
            cache_ttl: DEFAULT_TTL,
            static_dir: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl Config {
    /// Load from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load through an arbitrary lookup, so tests need not touch the environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        Ok(Config {
            host: lookup("LIBRETTO_HOST").unwrap_or(defaults.host),
            port: try_load(&lookup, "LIBRETTO_PORT", defaults.port)?,
            data_path: lookup("LIBRETTO_DATA")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            cache_ttl: Duration::from_secs(try_load(
                &lookup,
                "LIBRETTO_CACHE_TTL",
                defaults.cache_ttl.as_secs(),
            )?),
            static_dir: lookup("LIBRETTO_STATIC_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            endpoint: lookup("LIBRETTO_ENDPOINT").unwrap_or(defaults.endpoint),
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn try_load<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key: key.to_string(),
            reason: e.to_string(),
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
