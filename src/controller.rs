//! Dashboard state controller.
//!
//! Owns the session-wide filter selection and comparison set, issues
//! read-only queries through a [`StatsProvider`], and records per-panel
//! display state for the rendering layer to read. Exactly one controller
//! exists per running dashboard; it is constructed once at startup and
//! passed by reference to whatever renders it.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{error, warn};

use crate::analysis::{self, ComparisonHighlights, FilterChoices};
use crate::api::{ApiError, StatsProvider};
use crate::models::{
    self, ComparisonRow, FilterPatch, FilterSelection, GlobalSummary, RegionDetail,
    RegionProductList,
};

/// Local precondition failures, distinct from API failures which are
/// absorbed into panel state at the operation boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControllerError {
    #[error("no regions selected for comparison")]
    EmptyComparisonSet,
}

/// Display state of one dashboard panel.
///
/// Every fetching operation moves its panel to `Loading` before the call and
/// to `Ready` or `Error` after it, so a panel is never left with neither a
/// result nor a message.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PanelState<T> {
    #[default]
    Empty,
    Loading,
    Ready(T),
    Error(String),
}

impl<T> PanelState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, PanelState::Loading)
    }

    pub fn as_ready(&self) -> Option<&T> {
        match self {
            PanelState::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Panels that issue their own requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Summary,
    Filters,
    RegionInfo,
    Products,
    Comparison,
}

const PANEL_COUNT: usize = 5;

/// A request token captured before awaiting a fetch. A completion whose
/// token is no longer current for its panel discards its result, so the
/// newest request for a panel always wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    panel: Panel,
    seq: u64,
}

#[derive(Debug, Default)]
struct RequestTokens {
    seq: [u64; PANEL_COUNT],
}

impl RequestTokens {
    fn issue(&mut self, panel: Panel) -> RequestToken {
        let slot = &mut self.seq[panel as usize];
        *slot += 1;
        RequestToken { panel, seq: *slot }
    }

    fn is_current(&self, token: RequestToken) -> bool {
        self.seq[token.panel as usize] == token.seq
    }
}

/// Outcome of an `add_to_comparison` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

/// A comparison response together with its derived highlights.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonReport {
    pub rows: Vec<ComparisonRow>,
    pub highlights: ComparisonHighlights,
}

/// The dashboard state controller, generic over the statistics provider so
/// tests can substitute a mock.
pub struct DashboardController<P> {
    provider: P,
    filters: FilterSelection,
    comparison: BTreeSet<u32>,
    selected_region: Option<u32>,
    tokens: RequestTokens,

    // Panel state read by the rendering layer.
    pub summary: PanelState<GlobalSummary>,
    pub filter_options: PanelState<FilterChoices>,
    pub region_info: PanelState<RegionDetail>,
    pub products: PanelState<RegionProductList>,
    pub comparison_panel: PanelState<ComparisonReport>,

    /// Product names available in the selected region, for the product
    /// filter. Refreshed on region selection; failures only log.
    pub region_product_options: Vec<String>,
}

impl<P: StatsProvider> DashboardController<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            filters: FilterSelection::default(),
            comparison: BTreeSet::new(),
            selected_region: None,
            tokens: RequestTokens::default(),
            summary: PanelState::Empty,
            filter_options: PanelState::Empty,
            region_info: PanelState::Empty,
            products: PanelState::Empty,
            comparison_panel: PanelState::Empty,
            region_product_options: Vec::new(),
        }
    }

    pub fn filters(&self) -> &FilterSelection {
        &self.filters
    }

    pub fn selected_region(&self) -> Option<u32> {
        self.selected_region
    }

    /// Comparison set members in ascending id order.
    pub fn comparison_ids(&self) -> Vec<u32> {
        self.comparison.iter().copied().collect()
    }

    pub fn comparison_contains(&self, region_id: u32) -> bool {
        self.comparison.contains(&region_id)
    }

    /// Load the global summary panel.
    pub async fn load_summary(&mut self) {
        let token = self.tokens.issue(Panel::Summary);
        self.summary = PanelState::Loading;

        let result = self.provider.summary().await;
        if !self.tokens.is_current(token) {
            return;
        }

        self.summary = match result {
            Ok(data) => PanelState::Ready(data),
            Err(e) => {
                error!("failed to load global summary: {e}");
                PanelState::Error("No se pudieron cargar las estadísticas generales".to_string())
            }
        };
    }

    /// Load the available filter values and normalize them for display.
    pub async fn load_filter_options(&mut self) {
        let token = self.tokens.issue(Panel::Filters);
        self.filter_options = PanelState::Loading;

        let result = self.provider.filter_options().await;
        if !self.tokens.is_current(token) {
            return;
        }

        self.filter_options = match result {
            Ok(options) => PanelState::Ready(FilterChoices::from_options(options)),
            Err(e) => {
                error!("failed to load filter options: {e}");
                PanelState::Error("No se pudieron cargar los filtros".to_string())
            }
        };
    }

    /// Merge the patch into the filter selection and re-query the selected
    /// region's products, if a region is selected.
    pub async fn set_filter(&mut self, patch: FilterPatch) {
        self.filters.apply(patch);
        self.reload_selected_region_products().await;
    }

    /// Reset all filter fields and re-query identically.
    pub async fn clear_filter(&mut self) {
        self.filters = FilterSelection::default();
        self.reload_selected_region_products().await;
    }

    /// Select a region and load its detail and product list.
    ///
    /// An id with no marker logs and leaves all state untouched.
    pub async fn select_region(&mut self, region_id: u32) {
        if models::find_region(region_id).is_none() {
            warn!(region_id, "ignoring selection of unknown region");
            return;
        }

        self.selected_region = Some(region_id);

        let token = self.tokens.issue(Panel::RegionInfo);
        self.region_info = PanelState::Loading;

        let result = self.provider.region_detail(region_id).await;
        if !self.tokens.is_current(token) {
            return;
        }

        match result {
            Ok(detail) => {
                self.region_info = PanelState::Ready(detail);
            }
            Err(e) => {
                error!(region_id, "failed to load region detail: {e}");
                self.region_info =
                    PanelState::Error("Error cargando la región seleccionada".to_string());
                return;
            }
        }

        self.load_region_products(region_id).await;
        self.load_region_product_options(region_id).await;
    }

    /// Add a region to the comparison set. Idempotent.
    pub fn add_to_comparison(&mut self, region_id: u32) -> AddOutcome {
        if self.comparison.insert(region_id) {
            AddOutcome::Added
        } else {
            AddOutcome::AlreadyPresent
        }
    }

    /// Remove a region from the comparison set. Absent ids are a no-op.
    pub fn remove_from_comparison(&mut self, region_id: u32) {
        self.comparison.remove(&region_id);
    }

    pub fn clear_comparison(&mut self) {
        self.comparison.clear();
    }

    /// Run the batched comparison for every region in the set and derive the
    /// highlight figures. An empty set fails locally without any fetch.
    pub async fn compare_selected(&mut self) -> Result<(), ControllerError> {
        if self.comparison.is_empty() {
            self.comparison_panel =
                PanelState::Error("No hay regiones seleccionadas para comparar".to_string());
            return Err(ControllerError::EmptyComparisonSet);
        }

        let ids = self.comparison_ids();
        let token = self.tokens.issue(Panel::Comparison);
        self.comparison_panel = PanelState::Loading;

        let result = self.provider.compare_regions(&ids).await;
        if !self.tokens.is_current(token) {
            return Ok(());
        }

        self.comparison_panel = match result {
            Ok(response) => {
                let highlights = analysis::comparison_highlights(&response.regiones_comparadas);
                PanelState::Ready(ComparisonReport {
                    rows: response.regiones_comparadas,
                    highlights,
                })
            }
            Err(e) => {
                error!("failed to compare regions: {e}");
                PanelState::Error("Error comparando las regiones seleccionadas".to_string())
            }
        };

        Ok(())
    }

    async fn reload_selected_region_products(&mut self) {
        if let Some(region_id) = self.selected_region {
            self.load_region_products(region_id).await;
        }
    }

    async fn load_region_products(&mut self, region_id: u32) {
        let token = self.tokens.issue(Panel::Products);
        self.products = PanelState::Loading;

        let result = self.provider.region_products(region_id, &self.filters).await;
        if !self.tokens.is_current(token) {
            return;
        }

        self.products = match result {
            Ok(list) => PanelState::Ready(list),
            Err(e) => {
                error!(region_id, "failed to load region products: {e}");
                PanelState::Error("Error cargando productos".to_string())
            }
        };
    }

    /// Refresh the product filter options from the region's unfiltered
    /// product list. Failures here only log; the panel keeps its last list.
    async fn load_region_product_options(&mut self, region_id: u32) {
        let unfiltered = FilterSelection::default();
        match self.provider.region_products(region_id, &unfiltered).await {
            Ok(list) => {
                self.region_product_options = analysis::dedup_names(
                    list.productos.into_iter().filter_map(|row| row.producto),
                );
            }
            Err(e) => {
                warn!(region_id, "failed to load product filter options: {e}");
            }
        }
    }
}
