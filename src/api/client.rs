use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::models::{
    ComparisonResponse, Config, FilterOptions, FilterSelection, GlobalSummary, RegionDetail,
    RegionProductList,
};
use super::{ApiError, StatsProvider};

/// Reqwest-backed client for the agricultural statistics API.
pub struct AgroStatsClient {
    client: Client,
    base_url: Url,
}

impl AgroStatsClient {
    /// Create a new client from the application config.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.http_timeout_secs))
            .user_agent("agromapa/0.1")
            .build()?;

        let base_url = Url::parse(&config.api_base_url)?;

        Ok(Self { client, base_url })
    }

    /// GET an endpoint and decode its JSON body.
    ///
    /// Decoding goes through `Value` first so an `error` field can be
    /// detected before the typed decode, even on 2xx responses.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let mut url = self.base_url.join(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        let value: Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) if status.is_success() => return Err(ApiError::Decode(e)),
            Err(_) => return Err(ApiError::Status { status }),
        };

        if let Some(message) = value.get("error").and_then(Value::as_str) {
            if !message.is_empty() {
                return Err(ApiError::Api(message.to_string()));
            }
        }

        if !status.is_success() {
            return Err(ApiError::Status { status });
        }

        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait::async_trait]
impl StatsProvider for AgroStatsClient {
    async fn summary(&self) -> Result<GlobalSummary, ApiError> {
        self.get_json("/api/resumen/", &[]).await
    }

    async fn filter_options(&self) -> Result<FilterOptions, ApiError> {
        self.get_json("/api/filtros/", &[]).await
    }

    async fn region_detail(&self, region_id: u32) -> Result<RegionDetail, ApiError> {
        self.get_json(&format!("/api/region/{}/", region_id), &[])
            .await
    }

    async fn region_products(
        &self,
        region_id: u32,
        filters: &FilterSelection,
    ) -> Result<RegionProductList, ApiError> {
        // Unset fields are omitted entirely rather than sent empty.
        let mut query = Vec::new();
        if !filters.subsector.is_empty() {
            query.push(("subsector", filters.subsector.clone()));
        }
        if !filters.product.is_empty() {
            query.push(("producto", filters.product.clone()));
        }
        if !filters.year.is_empty() {
            query.push(("año", filters.year.clone()));
        }

        self.get_json(&format!("/api/region/{}/productos/", region_id), &query)
            .await
    }

    async fn compare_regions(&self, region_ids: &[u32]) -> Result<ComparisonResponse, ApiError> {
        let ids = region_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        self.get_json("/api/comparar-regiones/", &[("regiones", ids)])
            .await
    }
}
