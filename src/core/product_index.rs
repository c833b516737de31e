//! Product reference index - static descriptive data keyed by product code.
//!
//! The index is built once at startup from the product master CSV export
//! (`KODE_BARANG, MAIN_PROD, KADAR, NAMA, SAMPLE_COUNT, AVG_BERAT_SATUAN`) and is
//! read-only afterwards. It is shared between concurrent requests behind an
//! `Arc` and exposes no way to change its contents; redeploying is the only
//! way to refresh it.

use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs::File, io::Read, path::Path};
use tracing::{debug, info, warn};

/// Descriptive metadata for one product code.
///
/// Serialized with the field names clients of the sales endpoints expect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductInfo {
    /// Jewelry type classification (e.g. "cincin", "kalung")
    #[serde(rename = "main_prod")]
    pub category: Option<String>,
    /// Purity grade (e.g. "22K")
    #[serde(rename = "kadar")]
    pub purity: Option<String>,
    /// Friendly display name
    #[serde(rename = "nama")]
    pub name: Option<String>,
    /// Number of transactions seen when the master file was generated
    pub sample_count: Option<i64>,
    /// Historical average unit weight in grams
    #[serde(rename = "avg_berat_satuan")]
    pub avg_unit_weight: Option<f64>,
}

/// One row of the product master file, before normalization.
#[derive(Debug, Deserialize)]
struct MasterRow {
    #[serde(rename = "KODE_BARANG", default)]
    code: Option<String>,
    #[serde(rename = "MAIN_PROD", default)]
    main_prod: Option<String>,
    #[serde(rename = "KADAR", default)]
    kadar: Option<String>,
    #[serde(rename = "NAMA", default)]
    nama: Option<String>,
    #[serde(rename = "SAMPLE_COUNT", default)]
    sample_count: Option<String>,
    #[serde(rename = "AVG_BERAT_SATUAN", default)]
    avg_berat_satuan: Option<String>,
}

impl From<MasterRow> for ProductInfo {
    fn from(row: MasterRow) -> Self {
        Self {
            category: non_blank(row.main_prod),
            purity: non_blank(row.kadar),
            name: non_blank(row.nama),
            sample_count: non_blank(row.sample_count).and_then(|v| v.trim().parse().ok()),
            avg_unit_weight: non_blank(row.avg_berat_satuan).and_then(|v| v.trim().parse().ok()),
        }
    }
}

/// Blank and whitespace-only values are absent, never empty strings.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Immutable mapping from product code to [`ProductInfo`].
#[derive(Debug, Default, Clone)]
pub struct ProductIndex {
    products: HashMap<String, ProductInfo>,
}

impl ProductIndex {
    /// Loads the index from the product master file at `path`.
    ///
    /// A missing file yields an empty index so the sales endpoints keep working
    /// without enrichment.
    ///
    /// # Arguments
    /// * `path` - Location of the product master CSV
    ///
    /// # Returns
    /// The frozen index, empty when the file does not exist
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or is not valid CSV.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(
                "Product master {} not found, product_info will be null for every row",
                path.display()
            );
            return Ok(Self::default());
        }

        let index = Self::from_reader(File::open(path)?)?;
        info!(
            "Loaded {} products from reference file {}",
            index.len(),
            path.display()
        );
        Ok(index)
    }

    /// Builds the index from CSV data with a header row.
    ///
    /// Rows without a product code are skipped. When a code appears more than
    /// once the last row wins.
    ///
    /// # Errors
    /// Returns an error if the data is not valid CSV.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let mut products = HashMap::new();
        for (row_number, row) in csv_reader.deserialize::<MasterRow>().enumerate() {
            let mut row = row?;
            let Some(code) = non_blank(row.code.take()) else {
                debug!("Skipping reference row {} without KODE_BARANG", row_number + 1);
                continue;
            };
            products.insert(code, ProductInfo::from(row));
        }

        Ok(Self { products })
    }

    /// Returns the reference data for `code`, or `None` for unknown codes.
    #[must_use]
    pub fn lookup(&self, code: &str) -> Option<&ProductInfo> {
        self.products.get(code)
    }

    /// Number of products in the index
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the index holds no products
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
