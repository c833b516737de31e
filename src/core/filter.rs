//! Filter builder - turns optional request filters into a parameterized predicate.
//!
//! Every present filter contributes exactly one clause, in a fixed declaration
//! order, and every filter value travels as a bound parameter. Values never
//! become part of the SQL text.

use crate::entities::SalesColumn;
use sea_orm::{
    Condition, Value,
    sea_query::{Expr, SimpleExpr},
};

/// Optional constraints on sales rows. `None` means "not filtered".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesFilter {
    /// Exact product code
    pub kode_barang: Option<String>,
    /// Exact location
    pub lokasi: Option<String>,
    /// Exact month
    pub bulan: Option<i64>,
    /// Exact year
    pub tahun: Option<i64>,
    /// Minimum unit weight (inclusive)
    pub min_berat: Option<f64>,
    /// Maximum unit weight (inclusive)
    pub max_berat: Option<f64>,
}

impl SalesFilter {
    /// A filter restricted to a year and/or month, as used by summaries.
    #[must_use]
    pub fn period(tahun: Option<i64>, bulan: Option<i64>) -> Self {
        Self {
            tahun,
            bulan,
            ..Self::default()
        }
    }
}

/// Filterable attributes of a sales row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// `KODE_BARANG`
    ProductCode,
    /// `LOKASI`
    Location,
    /// `BULAN`
    Month,
    /// `TAHUN`
    Year,
    /// `BERAT_SATUAN`
    UnitWeight,
}

impl Field {
    /// Store column holding this field
    #[must_use]
    pub const fn column(self) -> SalesColumn {
        match self {
            Self::ProductCode => SalesColumn::KodeBarang,
            Self::Location => SalesColumn::Lokasi,
            Self::Month => SalesColumn::Bulan,
            Self::Year => SalesColumn::Tahun,
            Self::UnitWeight => SalesColumn::BeratSatuan,
        }
    }
}

/// How a clause compares its column against the bound value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `column = value`
    Equal,
    /// `column >= value`
    AtLeast,
    /// `column <= value`
    AtMost,
}

/// A single `column <op> ?` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// Field being constrained
    pub field: Field,
    /// Comparison operator
    pub comparison: Comparison,
    /// Bound value
    pub value: Value,
}

impl Clause {
    fn expr(&self) -> SimpleExpr {
        let column = Expr::col(self.field.column());
        let value = self.value.clone();
        match self.comparison {
            Comparison::Equal => column.eq(value),
            Comparison::AtLeast => column.gte(value),
            Comparison::AtMost => column.lte(value),
        }
    }
}

/// Conjunction of clauses. An empty predicate matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    /// Clauses in declaration order
    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Number of clauses
    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Whether the predicate matches every row
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Values bound by the predicate, in clause order.
    pub fn bound_values(&self) -> impl Iterator<Item = &Value> {
        self.clauses.iter().map(|clause| &clause.value)
    }

    /// The predicate as a `SeaORM` condition (`AND` of every clause).
    #[must_use]
    pub fn condition(&self) -> Condition {
        self.clauses
            .iter()
            .fold(Condition::all(), |condition, clause| condition.add(clause.expr()))
    }
}

/// Builds the predicate for `filter`.
///
/// Clause order is fixed: product code, location, month, year, minimum weight,
/// maximum weight. Weight bounds apply to the unit weight column.
#[must_use]
pub fn build(filter: &SalesFilter) -> Predicate {
    let rules: [(Field, Comparison, Option<Value>); 6] = [
        (
            Field::ProductCode,
            Comparison::Equal,
            filter.kode_barang.clone().map(Value::from),
        ),
        (
            Field::Location,
            Comparison::Equal,
            filter.lokasi.clone().map(Value::from),
        ),
        (Field::Month, Comparison::Equal, filter.bulan.map(Value::from)),
        (Field::Year, Comparison::Equal, filter.tahun.map(Value::from)),
        (
            Field::UnitWeight,
            Comparison::AtLeast,
            filter.min_berat.map(Value::from),
        ),
        (
            Field::UnitWeight,
            Comparison::AtMost,
            filter.max_berat.map(Value::from),
        ),
    ];

    let clauses = rules
        .into_iter()
        .filter_map(|(field, comparison, value)| {
            value.map(|value| Clause {
                field,
                comparison,
                value,
            })
        })
        .collect();

    Predicate { clauses }
}
