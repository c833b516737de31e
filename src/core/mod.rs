//! Core query logic - framework-agnostic operations over the sales store.
//! Functions here take a connection and already-validated inputs and return
//! plain serializable results; request handling lives in `crate::api`.

/// Optional request filters turned into a bound-parameter predicate
pub mod filter;
/// Product reference data keyed by product code
pub mod product_index;
/// Paginated, enriched sales row queries
pub mod sales;
/// Ranked weight totals grouped by product, location or period
pub mod summary;
