//! Application configuration loading from config.toml
//!
//! Settings come from a TOML file (every key is optional) and can be
//! overridden through environment variables, which `main` loads from `.env`
//! with `dotenvy` before calling [`load_app_configuration`].

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming the config file
pub const CONFIG_PATH_VAR: &str = "SALES_CONFIG";
/// Environment variable overriding `[database] url`
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
/// Environment variable overriding `[reference] product_master`
pub const PRODUCT_MASTER_VAR: &str = "PRODUCT_MASTER_PATH";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Sales database settings
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Product reference data settings
    #[serde(default)]
    pub reference: ReferenceConfig,
}

/// `[database]` section
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `SeaORM` connection URL of the sales database
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Seconds to wait for a connection before failing the request
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// `[reference]` section
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceConfig {
    /// Path of the product master CSV
    #[serde(default = "default_product_master")]
    pub product_master: PathBuf,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            product_master: default_product_master(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://data/penjualan.db?mode=ro".to_string()
}

const fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_product_master() -> PathBuf {
    PathBuf::from("data/product_master.csv")
}

impl AppConfig {
    /// Applies `DATABASE_URL` and `PRODUCT_MASTER_PATH` when they are set.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(DATABASE_URL_VAR).ok(),
            std::env::var(PRODUCT_MASTER_VAR).ok().map(PathBuf::from),
        )
    }

    /// Replaces the database URL and/or product master path.
    #[must_use]
    pub fn with_overrides(
        mut self,
        database_url: Option<String>,
        product_master: Option<PathBuf>,
    ) -> Self {
        if let Some(url) = database_url {
            self.database.url = url;
        }
        if let Some(path) = product_master {
            self.reference.product_master = path;
        }
        self
    }
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path);
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path.display()),
    })
}

/// Loads the application configuration.
///
/// The file is `explicit_path`, else `$SALES_CONFIG`, else `./config.toml`.
/// When no file was named and `./config.toml` does not exist the defaults are
/// used. Environment overrides are applied last.
///
/// # Arguments
/// * `explicit_path` - Config file named on the command line, if any
///
/// # Returns
/// The merged `AppConfig`
///
/// # Errors
/// Returns an error if a named file is missing or any file fails to parse.
pub fn load_app_configuration(explicit_path: Option<&Path>) -> Result<AppConfig> {
    let named = explicit_path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var(CONFIG_PATH_VAR).ok().map(PathBuf::from));

    let config = match named {
        Some(path) => load_config(&path)?,
        None if Path::new("config.toml").exists() => load_config("config.toml")?,
        None => {
            info!("No config.toml found, using default configuration");
            AppConfig::default()
        }
    };

    Ok(config.with_env_overrides())
}
