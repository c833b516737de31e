//! Request parameters of the sales endpoints, with their documented defaults.

use crate::{
    core::{
        filter::SalesFilter,
        sales::{DEFAULT_LIMIT, QueryFilter},
        summary::{DEFAULT_TOP, Dimension, SummaryRequest},
    },
    errors::Result,
};
use serde::Deserialize;

/// Query parameters of `GET /sales`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SalesParams {
    /// Product code
    pub kode_barang: Option<String>,
    /// Location
    pub lokasi: Option<String>,
    /// Month
    pub bulan: Option<i64>,
    /// Year
    pub tahun: Option<i64>,
    /// Minimum unit weight
    pub min_berat: Option<f64>,
    /// Maximum unit weight
    pub max_berat: Option<f64>,
    /// Page size, clamped to 2000
    pub limit: i64,
    /// Rows to skip
    pub offset: i64,
}

impl Default for SalesParams {
    fn default() -> Self {
        Self {
            kode_barang: None,
            lokasi: None,
            bulan: None,
            tahun: None,
            min_berat: None,
            max_berat: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// An empty `?lokasi=` means no location filter.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl SalesParams {
    /// Validates the parameters into a row query.
    ///
    /// # Errors
    /// Returns an invalid-argument error for a negative limit or offset.
    pub fn into_query(self) -> Result<QueryFilter> {
        let filter = SalesFilter {
            kode_barang: non_blank(self.kode_barang),
            lokasi: non_blank(self.lokasi),
            bulan: self.bulan,
            tahun: self.tahun,
            min_berat: self.min_berat,
            max_berat: self.max_berat,
        };
        QueryFilter::new(filter, self.limit, self.offset)
    }
}

/// Query parameters of `GET /sales/summary`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SummaryParams {
    /// `product`, `lokasi` or `bulan`
    pub by: String,
    /// Number of groups; out-of-range values fall back to 10
    pub top: i64,
    /// Year constraint
    pub tahun: Option<i64>,
    /// Month constraint
    pub bulan: Option<i64>,
}

impl Default for SummaryParams {
    fn default() -> Self {
        Self {
            by: Dimension::Product.as_str().to_string(),
            top: i64::try_from(DEFAULT_TOP).unwrap_or(10),
            tahun: None,
            bulan: None,
        }
    }
}

impl SummaryParams {
    /// Resolves the dimension and clamps `top`.
    ///
    /// # Errors
    /// Returns an invalid-argument error when `by` names no known dimension.
    pub fn into_request(self) -> Result<SummaryRequest> {
        let dimension: Dimension = self.by.parse()?;
        Ok(SummaryRequest::new(dimension, self.top, self.tahun, self.bulan))
    }
}
