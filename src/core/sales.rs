//! Sales row queries - filtered, paginated and enriched with product reference data.
//!
//! Rows are selected with `SELECT *` so that any extra columns the loader or
//! later patch scripts added to the table are passed through untouched. Each row
//! is decoded into a [`SalesRecord`] and paired with its [`ProductInfo`]; a
//! product code missing from the index simply yields `product_info: null`.

use crate::{
    core::{
        filter::{self, SalesFilter},
        product_index::{ProductIndex, ProductInfo},
    },
    entities::{Sales, SalesColumn},
    errors::{Error, Result},
};
use sea_orm::{
    ConnectionTrait, FromQueryResult, JsonValue,
    sea_query::{Asterisk, Order, Query},
};
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use tracing::debug;

/// Largest number of rows a single request may return.
pub const MAX_LIMIT: u64 = 2000;
/// Page size used when the client does not ask for one.
pub const DEFAULT_LIMIT: i64 = 100;

/// A validated row query: filters plus pagination.
///
/// Construction is the validation step, so a `QueryFilter` always carries a
/// non-negative offset and a limit within `[0, MAX_LIMIT]`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryFilter {
    filter: SalesFilter,
    limit: u64,
    offset: u64,
}

impl QueryFilter {
    /// Validates pagination and clamps `limit` to [`MAX_LIMIT`].
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `limit` or `offset` is negative.
    pub fn new(filter: SalesFilter, limit: i64, offset: i64) -> Result<Self> {
        let (Ok(limit), Ok(offset)) = (u64::try_from(limit), u64::try_from(offset)) else {
            return Err(Error::invalid_argument("limit and offset must be >= 0"));
        };

        let clamped = limit.min(MAX_LIMIT);
        if clamped != limit {
            debug!("Clamped requested limit {} to {}", limit, clamped);
        }

        Ok(Self {
            filter,
            limit: clamped,
            offset,
        })
    }

    /// Row filters
    #[must_use]
    pub const fn filter(&self) -> &SalesFilter {
        &self.filter
    }

    /// Effective limit after clamping
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Number of rows to skip
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }
}

/// One transaction row as stored, including any pass-through columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    /// Product code
    #[serde(rename = "KODE_BARANG", default)]
    pub kode_barang: Option<String>,
    /// Location
    #[serde(rename = "LOKASI", default)]
    pub lokasi: Option<String>,
    /// Month (1-12)
    #[serde(rename = "BULAN", default, deserialize_with = "deserialize_whole_number")]
    pub bulan: Option<i64>,
    /// Year
    #[serde(rename = "TAHUN", default, deserialize_with = "deserialize_whole_number")]
    pub tahun: Option<i64>,
    /// Unit weight in grams
    #[serde(rename = "BERAT_SATUAN", default)]
    pub berat_satuan: Option<f64>,
    /// Total weight in grams
    #[serde(rename = "BERAT_TOTAL", default)]
    pub berat_total: Option<f64>,
    /// Transaction date, exactly as the loader stored it
    #[serde(rename = "TANGGAL", default)]
    pub tanggal: Option<String>,
    /// Every other column of the row, unchanged
    #[serde(flatten)]
    pub extra: serde_json::Map<String, JsonValue>,
}

/// Accepts whole numbers stored as REAL (`5.0`), which is how the loader
/// writes an integer column that contained a NULL.
#[allow(clippy::cast_possible_truncation)]
fn deserialize_whole_number<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<JsonValue>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match &value {
        JsonValue::Null => Ok(None),
        JsonValue::Number(number) => number
            .as_i64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                    .map(|f| f as i64)
            })
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a whole number, got {value}"))),
        _ => Err(D::Error::custom(format!("expected a whole number, got {value}"))),
    }
}

/// A sales row paired with its product reference data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    /// The stored row
    #[serde(flatten)]
    pub record: SalesRecord,
    /// Reference data for the row's product code, `null` when unmapped
    pub product_info: Option<ProductInfo>,
}

impl EnrichedRecord {
    /// Looks the record's product code up in `index`.
    #[must_use]
    pub fn enrich(record: SalesRecord, index: &ProductIndex) -> Self {
        let product_info = record
            .kode_barang
            .as_deref()
            .and_then(|code| index.lookup(code))
            .cloned();
        Self {
            record,
            product_info,
        }
    }
}

/// Response body of a row query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesPage {
    /// Number of rows in `data` (not the size of the matching population)
    pub count: usize,
    /// Enriched rows, most recent first
    pub data: Vec<EnrichedRecord>,
}

/// Runs `query` against the sales table, newest transactions first.
///
/// # Arguments
/// * `db` - Connection to the sales store
/// * `index` - Product reference data used to enrich each row
/// * `query` - Validated filters and pagination
///
/// # Returns
/// A `SalesPage` whose `count` is the number of rows returned
///
/// # Errors
/// Returns an error if the statement fails or a row cannot be decoded.
pub async fn query_sales<C>(db: &C, index: &ProductIndex, query: &QueryFilter) -> Result<SalesPage>
where
    C: ConnectionTrait,
{
    let predicate = filter::build(&query.filter);

    let mut select = Query::select();
    select.column(Asterisk).from(Sales);
    if !predicate.is_empty() {
        select.cond_where(predicate.condition());
    }
    select
        .order_by(SalesColumn::Tanggal, Order::Desc)
        .limit(query.limit)
        .offset(query.offset);

    let statement = db.get_database_backend().build(&select);
    debug!(
        "Running sales query with {} clauses, limit {}, offset {}",
        predicate.len(),
        query.limit,
        query.offset
    );

    let rows = JsonValue::find_by_statement(statement).all(db).await?;
    let data = rows
        .into_iter()
        .map(|row| -> Result<EnrichedRecord> {
            let record: SalesRecord = serde_json::from_value(row)?;
            Ok(EnrichedRecord::enrich(record, index))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("Sales query returned {} rows", data.len());
    Ok(SalesPage {
        count: data.len(),
        data,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::errors::ErrorKind;
    use crate::test_utils::*;

    #[test]
    fn test_negative_limit_is_rejected() {
        let err = QueryFilter::new(SalesFilter::default(), -1, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_negative_offset_is_rejected() {
        let err = QueryFilter::new(SalesFilter::default(), 10, -5).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_limit_is_clamped() {
        let filter = SalesFilter {
            tahun: Some(2023),
            min_berat: Some(5.0),
            ..SalesFilter::default()
        };
        let query = QueryFilter::new(filter, 1_000_000, 0).unwrap();
        assert_eq!(query.limit(), MAX_LIMIT);
        assert_eq!(filter::build(query.filter()).len(), 2);

        assert_eq!(QueryFilter::new(SalesFilter::default(), 2000, 0).unwrap().limit(), 2000);
        assert_eq!(QueryFilter::new(SalesFilter::default(), 0, 0).unwrap().limit(), 0);
        assert_eq!(QueryFilter::new(SalesFilter::default(), 37, 4).unwrap().offset(), 4);
    }

    #[test]
    fn test_record_accepts_whole_number_reals() {
        let record: SalesRecord = serde_json::from_value(serde_json::json!({
            "KODE_BARANG": "CN001",
            "BULAN": 5.0,
            "TAHUN": 2023,
            "TANGGAL": "17/05/2023",
        }))
        .unwrap();
        assert_eq!(record.bulan, Some(5));
        assert_eq!(record.tahun, Some(2023));
        assert_eq!(record.tanggal.as_deref(), Some("17/05/2023"));

        let record: SalesRecord =
            serde_json::from_value(serde_json::json!({ "BULAN": null })).unwrap();
        assert_eq!(record.bulan, None);

        let err = serde_json::from_value::<SalesRecord>(serde_json::json!({ "BULAN": 5.5 }));
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_rows_are_newest_first() -> Result<()> {
        let db = setup_test_db().await?;
        insert_sale(&db, &sale("CN001", "Surabaya", "2023-01-10 00:00:00", 2.0, 4.0)).await?;
        insert_sale(&db, &sale("CN001", "Surabaya", "2023-03-01 00:00:00", 2.0, 2.0)).await?;
        insert_sale(&db, &sale("KL002", "Malang", "2023-02-15 00:00:00", 5.0, 5.0)).await?;

        let query = QueryFilter::new(SalesFilter::default(), 100, 0)?;
        let page = query_sales(&db, &test_index(), &query).await?;

        let months: Vec<_> = page
            .data
            .iter()
            .map(|row| row.record.tanggal.as_deref().unwrap()[5..7].to_string())
            .collect();
        assert_eq!(months, vec!["03", "02", "01"]);
        assert_eq!(page.count, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_filters_restrict_rows() -> Result<()> {
        let db = setup_test_db().await?;
        insert_sale(&db, &sale("CN001", "Surabaya", "2023-01-10 00:00:00", 2.0, 4.0)).await?;
        insert_sale(&db, &sale("CN001", "Malang", "2023-01-11 00:00:00", 6.0, 6.0)).await?;
        insert_sale(&db, &sale("KL002", "Malang", "2023-01-12 00:00:00", 8.0, 8.0)).await?;

        let filter = SalesFilter {
            lokasi: Some("Malang".to_string()),
            min_berat: Some(5.0),
            max_berat: Some(7.0),
            ..SalesFilter::default()
        };
        let page = query_sales(&db, &test_index(), &QueryFilter::new(filter, 100, 0)?).await?;

        assert_eq!(page.count, 1);
        assert_eq!(page.data[0].record.kode_barang.as_deref(), Some("CN001"));
        assert_eq!(page.data[0].record.berat_satuan, Some(6.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_limit_and_offset_paginate() -> Result<()> {
        let db = setup_test_db().await?;
        for day in 1..=9 {
            let tanggal = format!("2023-04-0{day} 00:00:00");
            insert_sale(&db, &sale("CN001", "Surabaya", &tanggal, 1.0, 1.0)).await?;
        }

        let page = query_sales(&db, &test_index(), &QueryFilter::new(SalesFilter::default(), 3, 2)?)
            .await?;
        let days: Vec<_> = page
            .data
            .iter()
            .map(|row| row.record.tanggal.as_deref().unwrap()[8..10].to_string())
            .collect();

        assert_eq!(page.count, 3);
        assert_eq!(days, vec!["07", "06", "05"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_oversized_limit_returns_at_most_max() -> Result<()> {
        let db = setup_test_db().await?;
        insert_bulk_sales(&db, 2100).await?;

        let page = query_sales(
            &db,
            &test_index(),
            &QueryFilter::new(SalesFilter::default(), 1_000_000, 0)?,
        )
        .await?;

        assert_eq!(page.count, 2000);
        assert_eq!(page.data.len(), 2000);
        Ok(())
    }

    #[tokio::test]
    async fn test_enrichment_is_total() -> Result<()> {
        let db = setup_test_db().await?;
        insert_sale(&db, &sale("CN001", "Surabaya", "2023-01-10 00:00:00", 2.0, 2.0)).await?;
        insert_sale(&db, &sale("UNKNOWN", "Surabaya", "2023-01-11 00:00:00", 2.0, 2.0)).await?;
        insert_sale(
            &db,
            &SaleFixture {
                kode_barang: None,
                ..sale("", "Surabaya", "2023-01-12 00:00:00", 2.0, 2.0)
            },
        )
        .await?;

        let page = query_sales(&db, &test_index(), &QueryFilter::new(SalesFilter::default(), 10, 0)?)
            .await?;

        assert_eq!(page.count, 3);
        assert!(page.data[0].product_info.is_none());
        assert!(page.data[1].product_info.is_none());
        let info = page.data[2].product_info.as_ref().unwrap();
        assert_eq!(info.category.as_deref(), Some("cincin"));
        Ok(())
    }

    #[tokio::test]
    async fn test_pass_through_columns_are_kept() -> Result<()> {
        let db = setup_test_db().await?;
        insert_sale(
            &db,
            &SaleFixture {
                keterangan: Some("promo lebaran".to_string()),
                ..sale("CN001", "Surabaya", "2023-01-10 00:00:00", 2.0, 2.0)
            },
        )
        .await?;

        let page = query_sales(&db, &test_index(), &QueryFilter::new(SalesFilter::default(), 10, 0)?)
            .await?;
        let json = serde_json::to_value(&page)?;

        assert_eq!(json["count"], 1);
        assert_eq!(json["data"][0]["KETERANGAN"], "promo lebaran");
        assert_eq!(json["data"][0]["KODE_BARANG"], "CN001");
        assert_eq!(json["data"][0]["product_info"]["kadar"], "22K");
        Ok(())
    }

    #[tokio::test]
    async fn test_stored_dates_are_returned_verbatim() -> Result<()> {
        let db = setup_test_db().await?;
        insert_sale(&db, &sale("CN001", "Surabaya", "2023-05-18 10:30:00", 2.0, 2.0)).await?;
        insert_sale(
            &db,
            &SaleFixture {
                tanggal: Some("17/05/2023".to_string()),
                ..sale("KL002", "Malang", "2023-05-17", 3.0, 3.0)
            },
        )
        .await?;

        let page = query_sales(&db, &test_index(), &QueryFilter::new(SalesFilter::default(), 10, 0)?)
            .await?;
        let json = serde_json::to_value(&page)?;

        assert_eq!(json["data"][0]["TANGGAL"], "2023-05-18 10:30:00");
        assert_eq!(json["data"][1]["TANGGAL"], "17/05/2023");
        assert_eq!(json["data"][1]["KODE_BARANG"], "KL002");
        Ok(())
    }

    #[tokio::test]
    async fn test_real_typed_month_column_is_read() -> Result<()> {
        let db = setup_test_db_with(CREATE_SALES_TABLE_REAL_PERIOD).await?;
        insert_sale(&db, &sale("CN001", "Surabaya", "2023-05-18 10:30:00", 2.0, 2.0)).await?;
        insert_sale(
            &db,
            &SaleFixture {
                bulan: None,
                ..sale("KL002", "Malang", "2023-05-17 00:00:00", 3.0, 3.0)
            },
        )
        .await?;

        let filter = SalesFilter {
            bulan: Some(5),
            ..SalesFilter::default()
        };
        let filtered = query_sales(&db, &test_index(), &QueryFilter::new(filter, 10, 0)?).await?;
        assert_eq!(filtered.count, 1);
        assert_eq!(filtered.data[0].record.bulan, Some(5));

        let page = query_sales(&db, &test_index(), &QueryFilter::new(SalesFilter::default(), 10, 0)?)
            .await?;
        assert_eq!(page.count, 2);
        assert_eq!(page.data[0].record.tahun, Some(2023));
        assert_eq!(page.data[1].record.bulan, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_table_is_internal_error() -> Result<()> {
        let db = setup_empty_db().await?;

        let err = query_sales(&db, &test_index(), &QueryFilter::new(SalesFilter::default(), 10, 0)?)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(matches!(err, Error::Database(_)));
        Ok(())
    }
}
