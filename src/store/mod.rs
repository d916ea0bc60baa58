pub mod dao;
pub mod models;

#[cfg(test)]
pub(crate) mod mock;

pub use dao::{CatalogDao, PgCatalogDao};
pub use models::{AnalyticsRecord, ProductRecord, RankingSource, ROOT_CATEGORY_ID};
