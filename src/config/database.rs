//! Database access for the sales store.
//!
//! The sales table is owned by an external loader and only read here. Each
//! request opens its own single-connection handle through [`SalesStore::acquire`]
//! and hands it back with [`SalesStore::release`] once the request is done,
//! whether it succeeded or failed. A handle dropped without release (for
//! example when the request future is cancelled) is closed by its destructor.

use crate::config::app::DatabaseConfig;
use crate::errors::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Connection settings for the sales database.
#[derive(Debug, Clone)]
pub struct SalesStore {
    url: String,
    connect_timeout: Duration,
}

impl SalesStore {
    /// Creates a store for `url`; acquisition gives up after `connect_timeout`.
    pub fn new(url: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            url: url.into(),
            connect_timeout,
        }
    }

    /// Creates a store from the `[database]` configuration section.
    #[must_use]
    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self::new(
            config.url.clone(),
            Duration::from_secs(config.connect_timeout_secs),
        )
    }

    /// Connection URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Opens a dedicated connection for one request.
    ///
    /// # Errors
    /// Returns [`crate::errors::Error::Database`] if the store cannot be reached.
    #[instrument(skip(self))]
    pub async fn acquire(&self) -> Result<DatabaseConnection> {
        let mut options = ConnectOptions::new(self.url.clone());
        options
            .max_connections(1)
            .min_connections(0)
            .connect_timeout(self.connect_timeout)
            .acquire_timeout(self.connect_timeout)
            .sqlx_logging(false);

        let db = Database::connect(options).await?;
        debug!("Acquired sales store connection");
        Ok(db)
    }

    /// Closes a connection returned by [`SalesStore::acquire`].
    ///
    /// A failure to close is logged and otherwise ignored so it never masks the
    /// outcome of the request that used the connection.
    pub async fn release(&self, db: DatabaseConnection) {
        match db.close().await {
            Ok(()) => debug!("Released sales store connection"),
            Err(e) => warn!("Failed to close sales store connection: {}", e),
        }
    }
}
