use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Origin used for relative `/api/*` paths when nothing else is configured
pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Absolute host every `/api/*` call is redirected to. `None` keeps calls relative.
    pub api_base: Option<String>,
    /// Origin that relative paths resolve against
    pub origin: String,
    /// Directory holding the durable storage file
    pub data_dir: Option<PathBuf>,
    pub timeout: Duration,
}

impl Config {
    /// Build a config from any variable source; blank values count as unset
    pub fn from_vars<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let timeout = match var("OFFTRACK_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .parse()
                    .with_context(|| format!("OFFTRACK_TIMEOUT_SECS is not a number: '{raw}'"))?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Config {
            api_base: var("OFFTRACK_API_BASE"),
            origin: var("OFFTRACK_ORIGIN").unwrap_or_else(|| DEFAULT_ORIGIN.to_string()),
            data_dir: var("OFFTRACK_DATA_DIR").map(PathBuf::from),
            timeout,
        })
    }

    /// Where the storage file lives, if any data directory can be resolved
    pub fn storage_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join("offtrack")))
    }
}

/// Load configuration from `.env` and environment
pub fn load_config() -> Result<Config> {
    // Load `.env` file if present
    dotenv::dotenv().ok();
    Config::from_vars(|key| std::env::var(key).ok())
}
