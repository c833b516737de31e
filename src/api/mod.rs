//! Request surface of the sales endpoints.
//!
//! [`SalesApi`] is what a routing layer calls for `GET /sales` and
//! `GET /sales/summary`: it validates the parameters, opens a store connection
//! for the request, runs the core query and releases the connection on every
//! path. [`Response`] turns the outcome into a status code and JSON body.

mod params;

pub use params::{SalesParams, SummaryParams};

use crate::{
    config::SalesStore,
    core::{
        product_index::ProductIndex,
        sales::{self, SalesPage},
        summary::{self, Summary},
    },
    errors::{Error, ErrorKind, Result},
};
use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Shared state for serving sales requests.
#[derive(Debug, Clone)]
pub struct SalesApi {
    store: SalesStore,
    index: Arc<ProductIndex>,
}

impl SalesApi {
    /// Creates the api over `store`, enriching rows from `index`.
    #[must_use]
    pub const fn new(store: SalesStore, index: Arc<ProductIndex>) -> Self {
        Self { store, index }
    }

    /// `GET /sales`
    ///
    /// # Errors
    /// Invalid pagination fails before the store is touched; store failures
    /// are returned as internal errors.
    #[instrument(skip(self))]
    pub async fn sales(&self, params: SalesParams) -> Result<SalesPage> {
        let query = params.into_query()?;

        let db = self.store.acquire().await?;
        let outcome = sales::query_sales(&db, &self.index, &query).await;
        self.store.release(db).await;

        outcome
            .inspect(|page| info!("Served {} sales rows", page.count))
            .inspect_err(|e| error!("Sales query failed: {}", e))
    }

    /// `GET /sales/summary`
    ///
    /// # Errors
    /// An unknown dimension fails before the store is touched; store failures
    /// are returned as internal errors.
    #[instrument(skip(self))]
    pub async fn summary(&self, params: SummaryParams) -> Result<Summary> {
        let request = params.into_request()?;

        let db = self.store.acquire().await?;
        let outcome = summary::summarize(&db, &self.index, &request).await;
        self.store.release(db).await;

        outcome
            .inspect(|summary| {
                info!(
                    "Served summary by {} with {} groups",
                    summary.dimension,
                    summary.groups.len()
                );
            })
            .inspect_err(|e| error!("Summary query failed: {}", e))
    }
}

/// HTTP status for an error.
#[must_use]
pub const fn status_code(err: &Error) -> u16 {
    match err.kind() {
        ErrorKind::InvalidArgument => 400,
        ErrorKind::Internal => 500,
    }
}

/// Status code and JSON body of a finished request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// HTTP status
    pub status: u16,
    /// Response body; `{ "detail": ... }` for errors
    pub body: JsonValue,
}

impl Response {
    /// Renders a request outcome.
    pub fn from_outcome<T: Serialize>(outcome: Result<T>) -> Self {
        match outcome.and_then(|value| serde_json::to_value(value).map_err(Error::from)) {
            Ok(body) => Self { status: 200, body },
            Err(err) => Self::from_error(&err),
        }
    }

    /// Renders an error.
    #[must_use]
    pub fn from_error(err: &Error) -> Self {
        let detail = match err {
            Error::InvalidArgument { message } => message.clone(),
            other => other.to_string(),
        };
        let status = status_code(err);
        if status >= 500 {
            warn!("Responding {} with detail: {}", status, detail);
        }
        Self {
            status,
            body: json!({ "detail": detail }),
        }
    }
}
