//! Sales entity - One row per sales transaction in the external `penjualan` table.
//!
//! The table is produced by an out-of-band loader from a flat export, so column
//! names are upper case and every column may be NULL. This crate only reads it;
//! the entity exists so queries can name columns through typed identifiers.
//! `rowid` is SQLite's implicit row key and is never part of `SELECT *`.
use sea_orm::entity::prelude::*;

/// Sales transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "penjualan")]
pub struct Model {
    /// Implicit `SQLite` row key
    #[sea_orm(primary_key, column_name = "rowid")]
    pub rowid: i64,
    /// Product code, key into the product reference index
    #[sea_orm(column_name = "KODE_BARANG")]
    pub kode_barang: Option<String>,
    /// Store location that recorded the sale
    #[sea_orm(column_name = "LOKASI")]
    pub lokasi: Option<String>,
    /// Month of the sale (1-12)
    #[sea_orm(column_name = "BULAN")]
    pub bulan: Option<i64>,
    /// Year of the sale
    #[sea_orm(column_name = "TAHUN")]
    pub tahun: Option<i64>,
    /// Weight of a single unit in grams
    #[sea_orm(column_name = "BERAT_SATUAN")]
    pub berat_satuan: Option<f64>,
    /// Total weight of the transaction in grams
    #[sea_orm(column_name = "BERAT_TOTAL")]
    pub berat_total: Option<f64>,
    /// Transaction date as written by the loader
    #[sea_orm(column_name = "TANGGAL")]
    pub tanggal: Option<String>,
}

/// Sales rows are not related to other tables in the store
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
