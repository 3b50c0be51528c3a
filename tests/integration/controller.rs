//! Controller behavior against a mock statistics provider.

use std::sync::atomic::Ordering;

use pretty_assertions::assert_eq;

use agromapa::controller::{
    AddOutcome, ControllerError, DashboardController, PanelState,
};
use agromapa::models::{FilterOptions, FilterPatch, FilterSelection};

use crate::common::{comparison_row, named, product_row, MockStats};

fn controller_with(
    mock: MockStats,
) -> (
    DashboardController<std::sync::Arc<MockStats>>,
    std::sync::Arc<MockStats>,
) {
    let shared = mock.shared();
    (DashboardController::new(shared.clone()), shared)
}

#[tokio::test]
async fn setting_a_filter_field_to_empty_equals_never_setting_it() {
    let (mut controller, _mock) = controller_with(MockStats::default());

    controller
        .set_filter(FilterPatch { product: Some("Tomate".to_string()), ..Default::default() })
        .await;
    controller
        .set_filter(FilterPatch { product: Some(String::new()), ..Default::default() })
        .await;

    assert_eq!(controller.filters(), &FilterSelection::default());
    assert!(controller.filters().is_empty());
}

#[tokio::test]
async fn add_to_comparison_is_idempotent() {
    let (mut controller, _mock) = controller_with(MockStats::default());

    assert_eq!(controller.add_to_comparison(13), AddOutcome::Added);
    assert_eq!(controller.add_to_comparison(13), AddOutcome::AlreadyPresent);

    assert_eq!(controller.comparison_ids(), vec![13]);
}

#[tokio::test]
async fn remove_from_comparison_ignores_absent_ids() {
    let (mut controller, _mock) = controller_with(MockStats::default());

    controller.add_to_comparison(4);
    controller.remove_from_comparison(13);
    controller.remove_from_comparison(4);
    controller.remove_from_comparison(4);

    assert!(controller.comparison_ids().is_empty());
}

#[tokio::test]
async fn compare_on_empty_set_fails_without_network_call() {
    let (mut controller, mock) = controller_with(MockStats::default());

    let result = controller.compare_selected().await;

    assert_eq!(result, Err(ControllerError::EmptyComparisonSet));
    assert_eq!(mock.calls.compare_regions.load(Ordering::SeqCst), 0);
    assert!(matches!(controller.comparison_panel, PanelState::Error(_)));
}

#[tokio::test]
async fn compare_derives_max_min_and_spread_with_first_occurrence_ties() {
    let mock = MockStats {
        comparison: agromapa::models::ComparisonResponse {
            total_regiones: 3,
            regiones_comparadas: vec![
                comparison_row("Región del Maule", Some(100.0), Some(500.0)),
                comparison_row("Región del Biobío", Some(200.0), Some(500.0)),
                comparison_row("Región de Ñuble", Some(150.0), Some(300.0)),
            ],
        },
        ..Default::default()
    };
    let (mut controller, mock) = controller_with(mock);

    controller.add_to_comparison(7);
    controller.add_to_comparison(8);
    controller.add_to_comparison(16);
    controller.compare_selected().await.unwrap();

    assert_eq!(mock.calls.compare_ids.lock().unwrap()[0], vec![7, 8, 16]);

    let report = controller.comparison_panel.as_ready().unwrap();
    let highlights = &report.highlights;
    assert_eq!(highlights.highest_price.as_ref().unwrap().value, 200.0);
    assert_eq!(highlights.highest_price.as_ref().unwrap().region, "Región del Biobío");
    assert_eq!(highlights.lowest_price.as_ref().unwrap().value, 100.0);
    assert_eq!(highlights.lowest_price.as_ref().unwrap().region, "Región del Maule");
    // Volume tie between Maule and Biobío resolves to the first row.
    assert_eq!(highlights.highest_volume.as_ref().unwrap().region, "Región del Maule");
    assert_eq!(highlights.price_spread_percent, Some(100.0));
}

#[tokio::test]
async fn select_region_sends_only_set_filters() {
    let (mut controller, mock) = controller_with(MockStats::default());

    controller
        .set_filter(FilterPatch {
            subsector: Some(String::new()),
            product: Some("Tomate".to_string()),
            year: Some("2024".to_string()),
        })
        .await;
    controller.select_region(13).await;

    let queries = mock.calls.product_queries.lock().unwrap();
    // First product query is the filtered list; the second refreshes the
    // region's product filter options without filters.
    assert_eq!(
        queries[0],
        (
            13,
            FilterSelection {
                subsector: String::new(),
                product: "Tomate".to_string(),
                year: "2024".to_string(),
            }
        )
    );
    assert_eq!(queries[1], (13, FilterSelection::default()));
}

#[tokio::test]
async fn unknown_region_changes_nothing_and_fetches_nothing() {
    let (mut controller, mock) = controller_with(MockStats::default());

    controller.select_region(99).await;

    assert_eq!(controller.selected_region(), None);
    assert_eq!(controller.region_info, PanelState::Empty);
    assert_eq!(mock.calls.region_detail.load(Ordering::SeqCst), 0);
    assert_eq!(mock.calls.region_products.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn filter_years_are_deduplicated_and_sorted_descending() {
    let mock = MockStats {
        filter_options: FilterOptions {
            years: vec![2024, 2023, 2024, 2022],
            subsectores: named(&["Hortalizas", "Cereales", "Hortalizas"]),
            productos: named(&["Tomate", "Lechuga"]),
        },
        ..Default::default()
    };
    let (mut controller, _mock) = controller_with(mock);

    controller.load_filter_options().await;

    let choices = controller.filter_options.as_ready().unwrap();
    assert_eq!(choices.years, vec![2024, 2023, 2022]);
    assert_eq!(choices.subsectors, vec!["Cereales".to_string(), "Hortalizas".to_string()]);
    assert_eq!(choices.products, vec!["Lechuga".to_string(), "Tomate".to_string()]);
}

#[tokio::test]
async fn changing_filters_requeries_the_selected_region() {
    let (mut controller, mock) = controller_with(MockStats::default());

    controller.select_region(7).await;
    let after_select = mock.calls.region_products.load(Ordering::SeqCst);

    controller
        .set_filter(FilterPatch { year: Some("2023".to_string()), ..Default::default() })
        .await;
    controller.clear_filter().await;

    assert_eq!(mock.calls.region_products.load(Ordering::SeqCst), after_select + 2);
}

#[tokio::test]
async fn changing_filters_without_a_selection_queries_nothing() {
    let (mut controller, mock) = controller_with(MockStats::default());

    controller
        .set_filter(FilterPatch { year: Some("2023".to_string()), ..Default::default() })
        .await;

    assert_eq!(mock.calls.region_products.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_fetch_becomes_panel_error_and_controller_stays_usable() {
    let mock = MockStats {
        failures: crate::common::Failures { summary: true, ..Default::default() },
        ..Default::default()
    };
    let (mut controller, _mock) = controller_with(mock);

    controller.load_summary().await;
    assert!(matches!(controller.summary, PanelState::Error(_)));

    // The failure stays inside the summary panel; other operations work.
    controller.select_region(4).await;
    assert!(controller.region_info.as_ready().is_some());
}

#[tokio::test]
async fn region_product_options_are_deduplicated_and_sorted() {
    let mock = MockStats {
        products: agromapa::models::RegionProductList {
            total_resultados: 4,
            filtros_aplicados: None,
            productos: vec![
                product_row("Tomate", "Hortalizas", 1200.0, 300.0),
                product_row("Lechuga", "Hortalizas", 800.0, 120.0),
                product_row("Tomate", "Hortalizas", 1150.0, 250.0),
            ],
        },
        ..Default::default()
    };
    let (mut controller, _mock) = controller_with(mock);

    controller.select_region(5).await;

    assert_eq!(
        controller.region_product_options,
        vec!["Lechuga".to_string(), "Tomate".to_string()]
    );
}
