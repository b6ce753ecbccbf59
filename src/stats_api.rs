use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::stats::{CategoryStat, GlobalStat, StatsQuery};

/// Read access to the provider's statistics endpoints.
#[async_trait]
pub trait StatsApi: Send + Sync {
    async fn global_stats(&self, query: &StatsQuery) -> Result<Vec<GlobalStat>, ApiError>;

    /// Stats broken down by category. Implementations reject an empty
    /// `categories` slice before doing any I/O.
    async fn category_stats(
        &self,
        query: &StatsQuery,
        categories: &[String],
    ) -> Result<Vec<CategoryStat>, ApiError>;
}
