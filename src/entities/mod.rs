//! Entity module - SeaORM entity definitions for the tables this crate reads.
//! The sales table is owned by an external loader; entities here only provide
//! typed table and column identifiers for query building.

pub mod sales;

pub use sales::{Column as SalesColumn, Entity as Sales};
