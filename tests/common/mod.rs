//! Shared test fixtures: a scriptable mock statistics provider and
//! builders for the API response shapes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use agromapa::api::{ApiError, StatsProvider};
use agromapa::models::{
    ComparisonResponse, ComparisonRow, ComparisonStats, FilterOptions, FilterSelection,
    GlobalSummary, NamedEntry, ProductRow, RegionDetail, RegionProductList,
};

/// Which endpoints should fail with an application error.
#[derive(Debug, Default)]
pub struct Failures {
    pub summary: bool,
    pub filter_options: bool,
    pub region_detail: bool,
    pub region_products: bool,
    pub compare_regions: bool,
}

/// Per-endpoint call counters plus recorded query arguments.
#[derive(Debug, Default)]
pub struct Calls {
    pub summary: AtomicUsize,
    pub filter_options: AtomicUsize,
    pub region_detail: AtomicUsize,
    pub region_products: AtomicUsize,
    pub compare_regions: AtomicUsize,
    /// Every `region_products` call in order: (region id, filters sent).
    pub product_queries: Mutex<Vec<(u32, FilterSelection)>>,
    pub compare_ids: Mutex<Vec<Vec<u32>>>,
}

/// Mock [`StatsProvider`] returning canned responses. Shared through an
/// `Arc` so the test keeps a handle to the counters after the controller
/// takes ownership of its clone.
#[derive(Debug, Default)]
pub struct MockStats {
    pub summary: GlobalSummary,
    pub filter_options: FilterOptions,
    pub products: RegionProductList,
    pub comparison: ComparisonResponse,
    pub failures: Failures,
    pub calls: Calls,
}

impl MockStats {
    pub fn shared(self) -> Arc<MockStats> {
        Arc::new(self)
    }
}

fn canned_error() -> ApiError {
    ApiError::Api("error simulado".to_string())
}

#[async_trait::async_trait]
impl StatsProvider for MockStats {
    async fn summary(&self) -> Result<GlobalSummary, ApiError> {
        self.calls.summary.fetch_add(1, Ordering::SeqCst);
        if self.failures.summary {
            return Err(canned_error());
        }
        Ok(self.summary.clone())
    }

    async fn filter_options(&self) -> Result<FilterOptions, ApiError> {
        self.calls.filter_options.fetch_add(1, Ordering::SeqCst);
        if self.failures.filter_options {
            return Err(canned_error());
        }
        Ok(self.filter_options.clone())
    }

    async fn region_detail(&self, region_id: u32) -> Result<RegionDetail, ApiError> {
        self.calls.region_detail.fetch_add(1, Ordering::SeqCst);
        if self.failures.region_detail {
            return Err(canned_error());
        }
        let name = agromapa::models::find_region(region_id)
            .map(|marker| marker.name.to_string())
            .unwrap_or_else(|| format!("Región {region_id}"));
        Ok(RegionDetail {
            region_id,
            region_nombre: name,
            total_registros: 1200,
            total_productos: 34,
            total_mercados: 3,
            subsectores: vec![],
        })
    }

    async fn region_products(
        &self,
        region_id: u32,
        filters: &FilterSelection,
    ) -> Result<RegionProductList, ApiError> {
        self.calls.region_products.fetch_add(1, Ordering::SeqCst);
        self.calls
            .product_queries
            .lock()
            .unwrap()
            .push((region_id, filters.clone()));
        if self.failures.region_products {
            return Err(canned_error());
        }
        Ok(self.products.clone())
    }

    async fn compare_regions(&self, region_ids: &[u32]) -> Result<ComparisonResponse, ApiError> {
        self.calls.compare_regions.fetch_add(1, Ordering::SeqCst);
        self.calls
            .compare_ids
            .lock()
            .unwrap()
            .push(region_ids.to_vec());
        if self.failures.compare_regions {
            return Err(canned_error());
        }
        Ok(self.comparison.clone())
    }
}

pub fn named(values: &[&str]) -> Vec<NamedEntry> {
    values
        .iter()
        .map(|name| NamedEntry { nombre: name.to_string() })
        .collect()
}

pub fn product_row(name: &str, subsector: &str, price: f64, volume: f64) -> ProductRow {
    ProductRow {
        producto: Some(name.to_string()),
        subsector: Some(subsector.to_string()),
        precio_promedio: Some(price),
        volumen_total: Some(volume),
        total_registros: 10,
    }
}

pub fn comparison_row(name: &str, price: Option<f64>, volume: Option<f64>) -> ComparisonRow {
    ComparisonRow {
        region_nombre: name.to_string(),
        estadisticas: ComparisonStats {
            total_registros: 100,
            productos_unicos: 12,
            total_mercados: 2,
            precio_promedio: price,
            volumen_total: volume,
        },
    }
}
