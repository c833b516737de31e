//! Shared test utilities.
//!
//! Provides an in-memory `SQLite` database with the same `penjualan` layout the
//! external loader produces, plus helpers for inserting fixture rows and a small
//! product reference index.

use crate::{core::product_index::ProductIndex, errors::Result};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Statement};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Layout written by the loader. No primary key; `KETERANGAN` stands in for
/// any column the core does not know about.
const CREATE_SALES_TABLE: &str = r#"
    CREATE TABLE penjualan (
        "TANGGAL" TEXT,
        "KODE_BARANG" TEXT,
        "LOKASI" TEXT,
        "BULAN" INTEGER,
        "TAHUN" INTEGER,
        "BERAT_SATUAN" REAL,
        "BERAT_TOTAL" REAL,
        "KETERANGAN" TEXT
    )
"#;

/// Same layout with the period columns typed REAL, as the loader writes them
/// when the source column had missing values.
pub const CREATE_SALES_TABLE_REAL_PERIOD: &str = r#"
    CREATE TABLE penjualan (
        "TANGGAL" TEXT,
        "KODE_BARANG" TEXT,
        "LOKASI" TEXT,
        "BULAN" REAL,
        "TAHUN" REAL,
        "BERAT_SATUAN" REAL,
        "BERAT_TOTAL" REAL,
        "KETERANGAN" TEXT
    )
"#;

const PRODUCT_MASTER: &str = "\
KODE_BARANG,MAIN_PROD,KADAR,NAMA,SAMPLE_COUNT,AVG_BERAT_SATUAN
CN001,cincin,22K,Cincin Polos,12,2.5
KL002,kalung,24K,,3,10.0
";

/// Routes tracing output through the test harness.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with the sales table.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    setup_test_db_with(CREATE_SALES_TABLE).await
}

/// Creates an in-memory `SQLite` database using `create_table` for the sales table.
pub async fn setup_test_db_with(create_table: &str) -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    db.execute_unprepared(create_table).await?;
    Ok(db)
}

/// Creates an in-memory `SQLite` database without the sales table.
pub async fn setup_empty_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    Ok(sea_orm::Database::connect("sqlite::memory:").await?)
}

/// Creates a `SQLite` database file under `dir` with the sales table and
/// returns its connection URL. The setup connection is closed before returning.
pub async fn setup_file_db(dir: &Path) -> Result<String> {
    init_test_tracing();
    let url = format!("sqlite://{}?mode=rwc", dir.join("penjualan.db").display());
    let db = sea_orm::Database::connect(url.as_str()).await?;
    db.execute_unprepared(CREATE_SALES_TABLE).await?;
    db.close().await?;
    Ok(url)
}

/// Product index with CN001 and KL002 mapped.
pub fn test_index() -> ProductIndex {
    ProductIndex::from_reader(PRODUCT_MASTER.as_bytes()).unwrap_or_default()
}

/// A row to insert into the sales table.
#[derive(Debug, Clone)]
pub struct SaleFixture {
    pub kode_barang: Option<String>,
    pub lokasi: Option<String>,
    pub bulan: Option<i64>,
    pub tahun: Option<i64>,
    pub berat_satuan: Option<f64>,
    pub berat_total: Option<f64>,
    pub tanggal: Option<String>,
    pub keterangan: Option<String>,
}

/// Builds a fixture; year and month are taken from `tanggal` (`YYYY-MM-DD ...`).
pub fn sale(
    kode_barang: &str,
    lokasi: &str,
    tanggal: &str,
    berat_satuan: f64,
    berat_total: f64,
) -> SaleFixture {
    SaleFixture {
        kode_barang: Some(kode_barang.to_string()),
        lokasi: Some(lokasi.to_string()),
        bulan: tanggal.get(5..7).and_then(|m| m.parse().ok()),
        tahun: tanggal.get(0..4).and_then(|y| y.parse().ok()),
        berat_satuan: Some(berat_satuan),
        berat_total: Some(berat_total),
        tanggal: Some(tanggal.to_string()),
        keterangan: None,
    }
}

/// Inserts one fixture row.
pub async fn insert_sale<C: ConnectionTrait>(db: &C, fixture: &SaleFixture) -> Result<()> {
    let statement = Statement::from_sql_and_values(
        DbBackend::Sqlite,
        r#"INSERT INTO penjualan
            ("TANGGAL", "KODE_BARANG", "LOKASI", "BULAN", "TAHUN", "BERAT_SATUAN", "BERAT_TOTAL", "KETERANGAN")
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        [
            fixture.tanggal.clone().into(),
            fixture.kode_barang.clone().into(),
            fixture.lokasi.clone().into(),
            fixture.bulan.into(),
            fixture.tahun.into(),
            fixture.berat_satuan.into(),
            fixture.berat_total.into(),
            fixture.keterangan.clone().into(),
        ],
    );
    db.execute(statement).await?;
    Ok(())
}

/// Inserts `count` identical one-gram sales in a single statement.
pub async fn insert_bulk_sales<C: ConnectionTrait>(db: &C, count: i64) -> Result<()> {
    let statement = Statement::from_sql_and_values(
        DbBackend::Sqlite,
        r#"INSERT INTO penjualan
            ("TANGGAL", "KODE_BARANG", "LOKASI", "BULAN", "TAHUN", "BERAT_SATUAN", "BERAT_TOTAL")
            WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < ?)
            SELECT printf('2023-01-01 %02d:%02d:00', (n / 60) % 24, n % 60),
                   'CN001', 'Surabaya', 1, 2023, 1.0, 1.0
            FROM seq"#,
        [count.into()],
    );
    db.execute(statement).await?;
    Ok(())
}
