/// Application settings loaded from config.toml and the environment
pub mod app;

/// Per-request access to the sales database
pub mod database;

pub use app::{AppConfig, DatabaseConfig, ReferenceConfig, load_app_configuration, load_config};
pub use database::SalesStore;
