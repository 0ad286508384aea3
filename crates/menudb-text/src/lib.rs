//! menudb-text
//!
//! Tantivy-backed catalog index and the `DocumentSearch` implementation that
//! translates a search pipeline into a single tantivy query.

pub mod index;
pub mod search;
pub mod tantivy_utils;

pub use index::CatalogIndex;
pub use search::TantivyCatalogSearch;
