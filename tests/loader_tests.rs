use std::path::PathBuf;
use std::sync::Arc;

use insurance_charts::config::PipelineConfig;
use insurance_charts::data::samples::{
    COSTS_CSV, CRASHES_CSV, INSURANCE_RATES_CSV, POPULATION_CSV, sample_for,
};
use insurance_charts::data::{
    DataOrigin, DatasetRequest, FsFetcher, Loader, MemoryFetcher, parse_csv_rows,
};

fn loader(fetcher: MemoryFetcher) -> Loader {
    Loader::new(Arc::new(fetcher))
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "insurance-charts-{name}-{}",
        std::process::id()
    ));
    std::fs::create_dir_all(dir.join("public")).expect("create scratch dir");
    dir
}

#[tokio::test(flavor = "current_thread")]
async fn first_path_with_rows_wins() {
    let fetcher = MemoryFetcher::new()
        .with_resource("Data2.csv", "State,Avg annual cost\nTexas,\"$1,872\"\n")
        .with_resource("public/Data2.csv", "State,Avg annual cost\nOhio,\"$1,200\"\n");
    let request = DatasetRequest::new(COSTS_CSV, &PipelineConfig::default());

    let dataset = loader(fetcher).load(&request).await;

    assert_eq!(dataset.origin, DataOrigin::Path("Data2.csv".to_owned()));
    assert_eq!(dataset.rows.len(), 1);
    assert_eq!(dataset.rows[0].get("Avg annual cost"), Some("$1,872"));
    assert!(dataset.failures.is_empty());
    assert!(dataset.diagnostics.advisories.is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn alternate_path_is_tried_after_failure() {
    let fetcher = MemoryFetcher::new()
        .with_resource("public/Data.csv", "State,Total Crashes Liability\nTexas,\"3,000\"\n");
    let request = DatasetRequest::new(CRASHES_CSV, &PipelineConfig::default());

    let dataset = loader(fetcher).load(&request).await;

    assert_eq!(dataset.origin, DataOrigin::Path("public/Data.csv".to_owned()));
    assert_eq!(dataset.failures.len(), 1);
    assert_eq!(dataset.failures[0].path, "Data.csv");
    assert!(dataset.diagnostics.advisories.is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn header_only_document_counts_as_failed_path() {
    let fetcher = MemoryFetcher::new()
        .with_resource("Population.csv", "State,Population Density (people/sq. mile)\n")
        .with_resource(
            "public/Population.csv",
            "State,Population Density (people/sq. mile)\nTexas,111.6\n",
        );
    let request = DatasetRequest::new(POPULATION_CSV, &PipelineConfig::default());

    let dataset = loader(fetcher).load(&request).await;

    assert_eq!(
        dataset.origin,
        DataOrigin::Path("public/Population.csv".to_owned())
    );
    assert_eq!(dataset.failures[0].reason, "resource has no rows");
}

#[tokio::test(flavor = "current_thread")]
async fn exhausted_paths_fall_back_to_sample_with_one_advisory() {
    let request = DatasetRequest::new(COSTS_CSV, &PipelineConfig::default());

    let dataset = loader(MemoryFetcher::new()).load(&request).await;

    assert!(dataset.is_sample());
    assert_eq!(dataset.failures.len(), 2);
    assert_eq!(dataset.diagnostics.advisories.len(), 1);
    assert_eq!(dataset.diagnostics.advisories_for(COSTS_CSV), 1);
    let expected = sample_for(COSTS_CSV).expect("costs sample").to_rows();
    assert_eq!(dataset.rows, expected);
}

#[tokio::test(flavor = "current_thread")]
async fn unknown_resource_without_sample_is_empty_and_advised() {
    let request = DatasetRequest::new("data/unknown.csv", &PipelineConfig::default());

    let dataset = loader(MemoryFetcher::new()).load(&request).await;

    assert_eq!(dataset.origin, DataOrigin::Unavailable);
    assert!(dataset.rows.is_empty());
    assert_eq!(dataset.diagnostics.advisories.len(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn disabled_sample_fallback_leaves_rows_empty() {
    let config = PipelineConfig::default().with_sample_fallback(false);
    let request = DatasetRequest::new(COSTS_CSV, &config);

    let dataset = loader(MemoryFetcher::new()).load(&request).await;

    assert_eq!(dataset.origin, DataOrigin::Unavailable);
    assert!(dataset.rows.is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn custom_path_chain_overrides_prefixes() {
    let fetcher = MemoryFetcher::new().with_resource("mirror/rates.csv", "state,rate\nTexas,1872\n");
    let request = DatasetRequest::new(INSURANCE_RATES_CSV, &PipelineConfig::default())
        .with_paths(["missing/rates.csv", "mirror/rates.csv"]);

    let dataset = loader(fetcher).load(&request).await;

    assert_eq!(dataset.origin, DataOrigin::Path("mirror/rates.csv".to_owned()));
    assert_eq!(dataset.failures.len(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn load_all_keeps_request_order() {
    let config = PipelineConfig::default();
    let fetcher = MemoryFetcher::new()
        .with_resource("Data.csv", "State,Total Crashes Liability\nTexas,\"3,000\"\n");
    let requests = [
        DatasetRequest::new(COSTS_CSV, &config),
        DatasetRequest::new(CRASHES_CSV, &config),
    ];

    let datasets = loader(fetcher).load_all(&requests).await;

    assert_eq!(datasets.len(), 2);
    assert_eq!(datasets[0].resource, COSTS_CSV);
    assert!(datasets[0].is_sample());
    assert_eq!(datasets[1].resource, CRASHES_CSV);
    assert_eq!(datasets[1].origin, DataOrigin::Path("Data.csv".to_owned()));
}

#[tokio::test(flavor = "current_thread")]
async fn fs_fetcher_reads_under_root_and_falls_back_to_public() {
    let root = scratch_dir("fs-fallback");
    std::fs::write(
        root.join("public").join("Data2.csv"),
        "State,Avg annual cost\nTexas,\"$1,872\"\nOhio,\"$1,200\"\n",
    )
    .expect("write csv");
    let request = DatasetRequest::new("/Data2.csv", &PipelineConfig::default());

    let dataset = Loader::new(Arc::new(FsFetcher::new(&root))).load(&request).await;

    assert_eq!(dataset.origin, DataOrigin::Path("public/Data2.csv".to_owned()));
    assert_eq!(dataset.rows.len(), 2);
    assert_eq!(dataset.failures.len(), 1);
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn csv_rows_tolerate_short_rows_and_trim_headers() {
    let parsed =
        parse_csv_rows(" State , rate \nTexas,1872\nOhio\n").expect("parse csv document");

    assert_eq!(parsed.rows.len(), 2);
    assert_eq!(parsed.rows[0].get("State"), Some("Texas"));
    assert_eq!(parsed.rows[0].get("rate"), Some("1872"));
    assert_eq!(parsed.rows[1].get("rate"), None);
}
