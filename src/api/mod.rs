use thiserror::Error;

use crate::models::{
    ComparisonResponse, FilterOptions, FilterSelection, GlobalSummary, RegionDetail,
    RegionProductList,
};

pub mod client;
pub use client::AgroStatsClient;

/// Failure taxonomy for statistics API requests.
///
/// A response body carrying a non-empty `error` field is an [`ApiError::Api`]
/// regardless of the HTTP status the backend attached to it.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API request failed with status {status}")]
    Status { status: reqwest::StatusCode },

    #[error("API error: {0}")]
    Api(String),

    #[error("could not decode API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Read-only statistics queries consumed by the dashboard controller.
#[async_trait::async_trait]
pub trait StatsProvider {
    /// Global counts from `/api/resumen/`.
    async fn summary(&self) -> Result<GlobalSummary, ApiError>;

    /// Available filter values from `/api/filtros/`.
    async fn filter_options(&self) -> Result<FilterOptions, ApiError>;

    /// Detail for one region from `/api/region/{id}/`.
    async fn region_detail(&self, region_id: u32) -> Result<RegionDetail, ApiError>;

    /// Product aggregates for one region, narrowed by the set filter fields.
    async fn region_products(
        &self,
        region_id: u32,
        filters: &FilterSelection,
    ) -> Result<RegionProductList, ApiError>;

    /// Batched statistics for several regions from `/api/comparar-regiones/`.
    async fn compare_regions(&self, region_ids: &[u32]) -> Result<ComparisonResponse, ApiError>;
}

#[async_trait::async_trait]
impl<T: StatsProvider + Send + Sync> StatsProvider for std::sync::Arc<T> {
    async fn summary(&self) -> Result<GlobalSummary, ApiError> {
        (**self).summary().await
    }

    async fn filter_options(&self) -> Result<FilterOptions, ApiError> {
        (**self).filter_options().await
    }

    async fn region_detail(&self, region_id: u32) -> Result<RegionDetail, ApiError> {
        (**self).region_detail(region_id).await
    }

    async fn region_products(
        &self,
        region_id: u32,
        filters: &FilterSelection,
    ) -> Result<RegionProductList, ApiError> {
        (**self).region_products(region_id, filters).await
    }

    async fn compare_regions(&self, region_ids: &[u32]) -> Result<ComparisonResponse, ApiError> {
        (**self).compare_regions(region_ids).await
    }
}
