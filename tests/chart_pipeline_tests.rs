use std::sync::Arc;

use insurance_charts::charts::{
    Chart, ChartKind, ChartState, ChartView, ChoroplethChart, FactorsChart, GroupedBarChart,
    PipelineContext, RateComparisonChart, ScatterplotChart, TREND_YEARS, TrendChart,
};
use insurance_charts::config::{DEFAULT_TOPOLOGY_URL, PipelineConfig};
use insurance_charts::data::MemoryFetcher;
use insurance_charts::data::samples::{COSTS_CSV, CRASHES_CSV};
use insurance_charts::render::{NullRenderer, Renderer};

const TOPOLOGY: &str = r#"{
    "type": "Topology",
    "objects": {
        "states": {
            "type": "GeometryCollection",
            "geometries": [
                {"type": "Polygon", "properties": {"name": "Texas"}},
                {"type": "Polygon", "properties": {"name": "Ohio"}}
            ]
        }
    },
    "arcs": []
}"#;

fn context(fetcher: MemoryFetcher) -> PipelineContext {
    context_with(fetcher, PipelineConfig::default().with_trend_seed(Some(42)))
}

fn context_with(fetcher: MemoryFetcher, config: PipelineConfig) -> PipelineContext {
    PipelineContext::new(Arc::new(fetcher), config).expect("pipeline context")
}

#[tokio::test(flavor = "current_thread")]
async fn grouped_bars_from_files_share_combined_domain() {
    let fetcher = MemoryFetcher::new()
        .with_resource(
            "Data2.csv",
            "State,Avg annual cost\nTexas,\"$1,872\"\nOhio,\"$1,200\"\n",
        )
        .with_resource(
            "Data.csv",
            "State,Total Crashes Liability\nTexas,\"3,000\"\nOhio,\"2,500\"\n",
        );

    let outcome = GroupedBarChart::crashes()
        .run(&context(fetcher), None)
        .await;

    let Some(ChartView::GroupedBar(view)) = outcome.state.view() else {
        panic!("expected grouped bar view, got {:?}", outcome.state);
    };
    assert_eq!(view.categories, vec!["Texas".to_owned(), "Ohio".to_owned()]);
    assert_eq!(view.value_domain.as_tuple(), (0.0, 3000.0));
    assert_eq!(view.bars[0].primary, 1872.0);
    assert_eq!(view.bars[0].secondary, 3000.0);
    assert!(outcome.diagnostics.is_clean());
}

#[tokio::test(flavor = "current_thread")]
async fn population_bars_are_normalized_into_cost_domain() {
    let outcome = GroupedBarChart::population()
        .run(&context(MemoryFetcher::new()), None)
        .await;

    let Some(ChartView::GroupedBar(view)) = outcome.state.view() else {
        panic!("expected grouped bar view, got {:?}", outcome.state);
    };
    assert_eq!(view.bars.len(), 6);
    for bar in &view.bars {
        assert!(bar.secondary <= view.value_domain.max * 1.0001);
    }
    let new_york = view
        .bars
        .iter()
        .find(|bar| bar.state == "New York")
        .expect("new york bar");
    assert_eq!(new_york.secondary_raw, 428.7);
    assert_eq!(outcome.diagnostics.advisories.len(), 2);
}

#[tokio::test(flavor = "current_thread")]
async fn scatterplot_uses_sample_rows_when_files_are_missing() {
    let outcome = ScatterplotChart.run(&context(MemoryFetcher::new()), None).await;

    let Some(ChartView::Scatter(view)) = outcome.state.view() else {
        panic!("expected scatter view, got {:?}", outcome.state);
    };
    let texas = view
        .points
        .iter()
        .find(|point| point.state == "Texas")
        .expect("texas point");
    assert_eq!((texas.x, texas.y), (3000.0, 1872.0));
    assert_eq!(outcome.diagnostics.advisories_for(COSTS_CSV), 1);
    assert_eq!(outcome.diagnostics.advisories_for(CRASHES_CSV), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn all_rows_rejected_yields_no_data_state() {
    let fetcher = MemoryFetcher::new()
        .with_resource("Data2.csv", "State,Avg annual cost\nTexas,$\nOhio,n/a\n")
        .with_resource("Data.csv", "State,Total Crashes Liability\nTexas,1\nOhio,2\n");

    let outcome = ScatterplotChart.run(&context(fetcher), None).await;

    match &outcome.state {
        ChartState::NoData { message } => assert!(message.contains("no usable records")),
        other => panic!("expected no-data state, got {other:?}"),
    }
    assert_eq!(outcome.diagnostics.rejected_rows, 2);

    let mut renderer = NullRenderer::default();
    renderer.render(&outcome.state).expect("render no-data state");
    assert_eq!(renderer.last_mark_count, 0);
    assert!(renderer.last_no_data_message.is_some());
}

#[tokio::test(flavor = "current_thread")]
async fn rate_comparison_keeps_states_missing_optional_inputs() {
    let fetcher = MemoryFetcher::new()
        .with_resource(
            "data/insurance_rates.csv",
            "state,rate\nTexas,1872\nOhio,1200\nUtah,1500\n",
        )
        .with_resource("data/accident_rates.csv", "state,rate\nTexas,152.0\n")
        .with_resource(
            "data/population_density.csv",
            "state,density\nTexas,111.6\nOhio,287.5\nUtah,39.7\n",
        );

    let outcome = RateComparisonChart
        .run(&context(fetcher), Some("Ohio"))
        .await;

    let Some(ChartView::RateComparison(view)) = outcome.state.view() else {
        panic!("expected rate comparison view, got {:?}", outcome.state);
    };
    assert_eq!(view.points.len(), 3);
    let ohio = &view.points[1];
    assert_eq!(ohio.state, "Ohio");
    assert_eq!(ohio.accident_rate, 0.0);
    assert!(ohio.selected);
    assert!(!view.points[0].selected);
    assert!(view.points.iter().all(|point| (4.0..=20.0).contains(&point.radius)));

    let labels: Vec<&str> = view.legend.iter().map(|entry| entry.label.as_str()).collect();
    assert_eq!(labels, vec!["Low", "Medium", "High"]);
    assert_eq!(view.legend[1].value, 111.6);
    assert!(outcome.diagnostics.join_misses.is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn factors_default_to_first_state_and_reject_unknown_selection() {
    let ctx = context(MemoryFetcher::new());

    let outcome = FactorsChart.run(&ctx, None).await;
    let Some(ChartView::Factors(view)) = outcome.state.view() else {
        panic!("expected factors view, got {:?}", outcome.state);
    };
    assert_eq!(view.state, "Alabama");
    assert_eq!(view.title, "Contributing Factors in Alabama");
    assert_eq!(view.factors.len(), 6);
    assert_eq!(view.factors[0].name, "Accident Rate");
    assert_eq!(view.factors[0].value, 19.6);
    assert_eq!(view.value_domain.max, 57.7);

    let unknown = FactorsChart.run(&ctx, Some("Atlantis")).await;
    assert!(matches!(unknown.state, ChartState::NoData { .. }));
}

#[tokio::test(flavor = "current_thread")]
async fn factors_for_state_without_insurance_row_come_from_factors_dataset() {
    let fetcher = MemoryFetcher::new()
        .with_resource("data/insurance_rates.csv", "state,rate\nAlabama,1995\n");
    let ctx = context(fetcher);

    let outcome = FactorsChart.run(&ctx, Some("Texas")).await;
    let Some(ChartView::Factors(view)) = outcome.state.view() else {
        panic!("expected factors view, got {:?}", outcome.state);
    };
    assert_eq!(view.state, "Texas");
    assert_eq!(view.insurance_rate, None);
    assert_eq!(view.factors[0].value, 15.2);
    assert_eq!(view.value_domain.max, 83.7);

    let alabama = FactorsChart.run(&ctx, None).await;
    let Some(ChartView::Factors(view)) = alabama.state.view() else {
        panic!("expected factors view, got {:?}", alabama.state);
    };
    assert_eq!(view.insurance_rate, Some(1995.0));
}

#[tokio::test(flavor = "current_thread")]
async fn choropleth_keeps_first_rate_of_duplicated_state() {
    let rates = "state,rate\nTexas,1000\nTexas,9000\nOhio,1200\n";
    let with_topology = MemoryFetcher::new()
        .with_resource(DEFAULT_TOPOLOGY_URL, TOPOLOGY)
        .with_resource("data/insurance_rates.csv", rates);

    let outcome = ChoroplethChart.run(&context(with_topology), None).await;
    let Some(ChartView::Choropleth(view)) = outcome.state.view() else {
        panic!("expected choropleth view, got {:?}", outcome.state);
    };
    assert_eq!(view.regions[0].name, "Texas");
    assert_eq!(view.regions[0].rate, Some(1000.0));
    assert_eq!(
        view.color_domain.expect("color domain").as_tuple(),
        (1000.0, 1200.0)
    );

    let without_topology =
        MemoryFetcher::new().with_resource("data/insurance_rates.csv", rates);
    let outcome = ChoroplethChart.run(&context(without_topology), None).await;
    let Some(ChartView::Choropleth(view)) = outcome.state.view() else {
        panic!("expected choropleth view, got {:?}", outcome.state);
    };
    let names: Vec<&str> = view.regions.iter().map(|region| region.name.as_str()).collect();
    assert_eq!(names, vec!["Texas", "Ohio"]);
    assert_eq!(view.regions[0].rate, Some(1000.0));
    assert_eq!(view.regions[1].rate, Some(1200.0));
}

#[tokio::test(flavor = "current_thread")]
async fn choropleth_leaves_unrated_regions_neutral() {
    let fetcher = MemoryFetcher::new()
        .with_resource(DEFAULT_TOPOLOGY_URL, TOPOLOGY)
        .with_resource("data/insurance_rates.csv", "state,rate\nTexas,1872\nUtah,1500\n");

    let outcome = ChoroplethChart.run(&context(fetcher), None).await;

    let Some(ChartView::Choropleth(view)) = outcome.state.view() else {
        panic!("expected choropleth view, got {:?}", outcome.state);
    };
    assert_eq!(view.regions.len(), 2);
    assert_eq!(view.regions[0].rate, Some(1872.0));
    assert_eq!(view.regions[1].name, "Ohio");
    assert_eq!(view.regions[1].rate, None);
    let domain = view.color_domain.expect("color domain");
    assert_eq!(domain.as_tuple(), (1500.0, 1872.0));
    assert!(outcome.diagnostics.advisories.is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn choropleth_without_topology_uses_rate_states_and_advises() {
    let outcome = ChoroplethChart.run(&context(MemoryFetcher::new()), None).await;

    let Some(ChartView::Choropleth(view)) = outcome.state.view() else {
        panic!("expected choropleth view, got {:?}", outcome.state);
    };
    assert_eq!(view.regions.len(), 6);
    assert!(view.regions.iter().all(|region| region.rate.is_some()));
    assert_eq!(outcome.diagnostics.advisories_for(DEFAULT_TOPOLOGY_URL), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn seeded_trend_is_reproducible_and_labeled_synthetic() {
    let ctx = context(MemoryFetcher::new());

    let first = TrendChart.run(&ctx, Some("Texas")).await;
    let second = TrendChart.run(&ctx, Some("Texas")).await;
    assert_eq!(first, second);

    let Some(ChartView::Trend(view)) = first.state.view() else {
        panic!("expected trend view, got {:?}", first.state);
    };
    assert!(view.synthetic);
    assert_eq!(view.title, "Insurance Rate Trends in Texas");
    assert_eq!(view.points.len(), TREND_YEARS.len());
    let peak = view
        .points
        .iter()
        .map(|point| point.rate)
        .fold(0.0_f64, f64::max);
    assert!((view.rate_domain.max - peak * 1.1).abs() <= 1e-9);
}

#[tokio::test(flavor = "current_thread")]
async fn every_chart_kind_renders_from_sample_data() {
    let ctx = context(MemoryFetcher::new());
    let mut renderer = NullRenderer::default();

    for kind in ChartKind::ALL {
        let outcome = kind.chart().run(&ctx, None).await;
        assert_eq!(outcome.kind, kind);
        assert!(outcome.state.is_ready(), "{kind} has no data");
        renderer.render(&outcome.state).expect("render outcome");
        assert!(renderer.last_mark_count > 0);
        outcome.to_json_pretty().expect("outcome json");
    }
    assert_eq!(renderer.frames_rendered, ChartKind::ALL.len());
}

#[test]
fn chart_kind_slugs_round_trip() {
    for kind in ChartKind::ALL {
        assert_eq!(kind.slug().parse::<ChartKind>().expect("parse slug"), kind);
        assert_eq!(kind.chart().kind(), kind);
    }
    assert!("pie".parse::<ChartKind>().is_err());
}

#[test]
fn invalid_config_is_rejected_by_context() {
    let config = PipelineConfig::default().with_domain_epsilon(0.0);
    assert!(PipelineContext::new(Arc::new(MemoryFetcher::new()), config).is_err());
}
