//! Summary aggregation - top-N groups of sales by product, location or period.
//!
//! All three dimensions share one query skeleton: restrict the population by
//! the optional year/month, group, sum `BERAT_TOTAL`, count rows, rank and only
//! then truncate to `top`. Everything happens inside the store so ranking always
//! sees the full filtered population.

use crate::{
    core::{
        filter::{self, SalesFilter},
        product_index::{ProductIndex, ProductInfo},
    },
    entities::{Sales, SalesColumn},
    errors::{Error, Result},
};
use sea_orm::{
    ConnectionTrait, EntityTrait, FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Select,
    sea_query::{Alias, Asterisk, Expr, Func, SimpleExpr},
};
use serde::Serialize;
use std::{fmt, str::FromStr};
use tracing::debug;

/// Group count used when the requested `top` is out of range.
pub const DEFAULT_TOP: u64 = 10;
/// Largest accepted `top`.
pub const MAX_TOP: u64 = 1000;

const TOTAL_ALIAS: &str = "total_gram";
const COUNT_ALIAS: &str = "tx_count";

/// Grouping dimension of a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dimension {
    /// Group by product code, ranked by total weight
    #[serde(rename = "product")]
    Product,
    /// Group by location, ranked by total weight
    #[serde(rename = "lokasi")]
    Location,
    /// Group by (year, month), most recent first
    #[serde(rename = "bulan")]
    Period,
}

/// How groups are ordered before truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ranking {
    Weight,
    Recency,
}

impl Dimension {
    /// Every dimension, in the order they are documented to clients
    pub const ALL: [Self; 3] = [Self::Product, Self::Location, Self::Period];

    /// Name used in requests and responses
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Location => "lokasi",
            Self::Period => "bulan",
        }
    }

    /// Group key columns, the names they are selected as and the SQL type
    /// they are read back as.
    const fn keys(self) -> &'static [(SalesColumn, &'static str, &'static str)] {
        match self {
            Self::Product => &[(SalesColumn::KodeBarang, "kode_barang", "TEXT")],
            Self::Location => &[(SalesColumn::Lokasi, "lokasi", "TEXT")],
            Self::Period => &[
                (SalesColumn::Tahun, "tahun", "INTEGER"),
                (SalesColumn::Bulan, "bulan", "INTEGER"),
            ],
        }
    }

    const fn ranking(self) -> Ranking {
        match self {
            Self::Product | Self::Location => Ranking::Weight,
            Self::Period => Ranking::Recency,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|dimension| dimension.as_str() == value)
            .ok_or_else(|| {
                let choices: Vec<_> = Self::ALL.iter().map(|d| d.as_str()).collect();
                Error::invalid_argument(format!(
                    "unknown 'by' param, choose {}",
                    choices.join("|")
                ))
            })
    }
}

/// Clamps a requested group count.
///
/// Values outside `1..=MAX_TOP` fall back to [`DEFAULT_TOP`] instead of failing.
#[must_use]
pub fn clamp_top(requested: i64) -> u64 {
    u64::try_from(requested)
        .ok()
        .filter(|top| (1..=MAX_TOP).contains(top))
        .unwrap_or(DEFAULT_TOP)
}

/// One summary request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRequest {
    dimension: Dimension,
    tahun: Option<i64>,
    bulan: Option<i64>,
    top: u64,
}

impl SummaryRequest {
    /// Builds a request, resetting an out-of-range `top` to the default.
    #[must_use]
    pub fn new(dimension: Dimension, top: i64, tahun: Option<i64>, bulan: Option<i64>) -> Self {
        let clamped = clamp_top(top);
        if i64::try_from(clamped).ok() != Some(top) {
            debug!("Requested top {} reset to {}", top, clamped);
        }
        Self {
            dimension,
            tahun,
            bulan,
            top: clamped,
        }
    }

    /// Grouping dimension
    #[must_use]
    pub const fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Effective number of groups
    #[must_use]
    pub const fn top(&self) -> u64 {
        self.top
    }
}

/// Totals for one product code.
#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize)]
pub struct ProductTotals {
    /// Product code
    #[serde(rename = "KODE_BARANG")]
    pub kode_barang: Option<String>,
    /// Sum of `BERAT_TOTAL` in grams
    pub total_gram: Option<f64>,
    /// Number of transactions
    pub tx_count: i64,
}

/// Product totals paired with reference data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductGroup {
    /// Aggregates
    #[serde(flatten)]
    pub totals: ProductTotals,
    /// Reference data, `null` when the code is unmapped
    pub product_info: Option<ProductInfo>,
}

/// Totals for one location.
#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize)]
pub struct LocationGroup {
    /// Location
    #[serde(rename = "LOKASI")]
    pub lokasi: Option<String>,
    /// Sum of `BERAT_TOTAL` in grams
    pub total_gram: Option<f64>,
    /// Number of transactions
    pub tx_count: i64,
}

/// Totals for one (year, month).
#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize)]
pub struct PeriodGroup {
    /// Year
    #[serde(rename = "TAHUN")]
    pub tahun: Option<i64>,
    /// Month
    #[serde(rename = "BULAN")]
    pub bulan: Option<i64>,
    /// Sum of `BERAT_TOTAL` in grams
    pub total_gram: Option<f64>,
    /// Number of transactions
    pub tx_count: i64,
}

/// One ranked group of a summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SummaryGroup {
    /// Product dimension group
    Product(ProductGroup),
    /// Location dimension group
    Location(LocationGroup),
    /// Period dimension group
    Period(PeriodGroup),
}

impl SummaryGroup {
    /// Summed total weight of the group
    #[must_use]
    pub const fn total_gram(&self) -> Option<f64> {
        match self {
            Self::Product(group) => group.totals.total_gram,
            Self::Location(group) => group.total_gram,
            Self::Period(group) => group.total_gram,
        }
    }

    /// Number of transactions in the group
    #[must_use]
    pub const fn tx_count(&self) -> i64 {
        match self {
            Self::Product(group) => group.totals.tx_count,
            Self::Location(group) => group.tx_count,
            Self::Period(group) => group.tx_count,
        }
    }
}

/// Response body of a summary request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Dimension the groups were built on
    #[serde(rename = "by")]
    pub dimension: Dimension,
    /// Ranked groups, at most `top` of them
    #[serde(rename = "top")]
    pub groups: Vec<SummaryGroup>,
}

/// Filter, group, aggregate, rank and truncate.
fn grouped_select(request: &SummaryRequest) -> Select<Sales> {
    let keys = request.dimension.keys();
    let predicate = filter::build(&SalesFilter::period(request.tahun, request.bulan));

    let mut select = Sales::find().select_only();
    // Period columns may be stored as REAL; keys are read back with a fixed type.
    for &(column, alias, sql_type) in keys {
        let key = SimpleExpr::from(Func::cast_as(Expr::col(column), Alias::new(sql_type)));
        select = select.column_as(key, alias).group_by(column);
    }

    // CAST keeps the sum REAL even when the loader stored integral weights.
    let total_weight = SimpleExpr::from(Func::cast_as(
        Func::sum(Expr::col(SalesColumn::BeratTotal)),
        Alias::new("REAL"),
    ));
    select = select
        .column_as(total_weight, TOTAL_ALIAS)
        .column_as(Expr::col(Asterisk).count(), COUNT_ALIAS);

    if !predicate.is_empty() {
        select = select.filter(predicate.condition());
    }

    match request.dimension.ranking() {
        Ranking::Weight => {
            select = select.order_by_desc(SimpleExpr::from(Expr::col(Alias::new(TOTAL_ALIAS))));
            for &(column, _, _) in keys {
                select = select.order_by_asc(column);
            }
        }
        Ranking::Recency => {
            for &(column, _, _) in keys {
                select = select.order_by_desc(column);
            }
        }
    }

    select.limit(request.top)
}

/// Computes the summary described by `request`.
///
/// Product groups are enriched from `index`; other dimensions are not.
///
/// # Arguments
/// * `db` - Connection to the sales store
/// * `index` - Product reference data for product groups
/// * `request` - Dimension, optional year/month and group count
///
/// # Returns
/// A `Summary` holding at most `request.top()` ranked groups
///
/// # Errors
/// Returns an error if the aggregation query fails.
pub async fn summarize<C>(db: &C, index: &ProductIndex, request: &SummaryRequest) -> Result<Summary>
where
    C: ConnectionTrait,
{
    let select = grouped_select(request);

    let groups: Vec<SummaryGroup> = match request.dimension {
        Dimension::Product => select
            .into_model::<ProductTotals>()
            .all(db)
            .await?
            .into_iter()
            .map(|totals| {
                let product_info = totals
                    .kode_barang
                    .as_deref()
                    .and_then(|code| index.lookup(code))
                    .cloned();
                SummaryGroup::Product(ProductGroup {
                    totals,
                    product_info,
                })
            })
            .collect(),
        Dimension::Location => select
            .into_model::<LocationGroup>()
            .all(db)
            .await?
            .into_iter()
            .map(SummaryGroup::Location)
            .collect(),
        Dimension::Period => select
            .into_model::<PeriodGroup>()
            .all(db)
            .await?
            .into_iter()
            .map(SummaryGroup::Period)
            .collect(),
    };

    debug!(
        "Summary by {} produced {} groups (top {})",
        request.dimension,
        groups.len(),
        request.top
    );
    Ok(Summary {
        dimension: request.dimension,
        groups,
    })
}
