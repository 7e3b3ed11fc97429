use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::core::RawRow;
use crate::data::csv_rows::parse_csv_rows;
use crate::data::samples::{SampleTable, sample_for};
use crate::data::PipelineDiagnostics;
use crate::error::{ChartError, ChartResult};

/// Retrieval of a named resource as text.
///
/// The transport is the host's business; the loader only needs text back or
/// an error explaining why not.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, path: &str) -> ChartResult<String>;
}

/// Reads resources from files under a root directory.
#[derive(Debug, Clone)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ResourceFetcher for FsFetcher {
    async fn fetch(&self, path: &str) -> ChartResult<String> {
        let full_path = self.root.join(path.trim_start_matches('/'));
        tokio::fs::read_to_string(&full_path)
            .await
            .map_err(|e| ChartError::ResourceUnavailable {
                path: path.to_owned(),
                reason: e.to_string(),
            })
    }
}

/// In-memory resources keyed by path (leading `/` ignored).
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    resources: IndexMap<String, String>,
}

impl MemoryFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_resource(mut self, path: &str, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: &str, content: impl Into<String>) {
        self.resources
            .insert(path.trim_start_matches('/').to_owned(), content.into());
    }
}

#[async_trait]
impl ResourceFetcher for MemoryFetcher {
    async fn fetch(&self, path: &str) -> ChartResult<String> {
        self.resources
            .get(path.trim_start_matches('/'))
            .cloned()
            .ok_or_else(|| ChartError::ResourceUnavailable {
                path: path.to_owned(),
                reason: "not found".to_owned(),
            })
    }
}

/// Fetches resources over HTTP; relative paths are joined to `base_url`.
#[cfg(feature = "http-fetch")]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

#[cfg(feature = "http-fetch")]
impl HttpFetcher {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_owned()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        }
    }
}

#[cfg(feature = "http-fetch")]
#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, path: &str) -> ChartResult<String> {
        let url = self.resolve(path);
        let unavailable = |reason: String| ChartError::ResourceUnavailable {
            path: path.to_owned(),
            reason,
        };
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("http status {status}")));
        }
        response.text().await.map_err(|e| unavailable(e.to_string()))
    }
}

/// One tabular resource and the ordered paths it may be found under.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRequest {
    pub resource: String,
    pub paths: Vec<String>,
    pub sample: Option<SampleTable>,
}

impl DatasetRequest {
    /// Request using the configured path chain and the embedded sample, if any.
    #[must_use]
    pub fn new(resource: &str, config: &PipelineConfig) -> Self {
        Self {
            resource: resource.to_owned(),
            paths: config.fallback_paths(resource),
            sample: if config.sample_fallback {
                sample_for(resource)
            } else {
                None
            },
        }
    }

    #[must_use]
    pub fn with_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths = paths.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_sample(mut self, sample: Option<SampleTable>) -> Self {
        self.sample = sample;
        self
    }
}

/// Where the rows of a loaded dataset came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataOrigin {
    Path(String),
    Sample,
    /// Every path failed and no sample exists; rows are empty.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDataset {
    pub resource: String,
    pub rows: Vec<RawRow>,
    pub origin: DataOrigin,
    pub failures: Vec<FetchFailure>,
    pub diagnostics: PipelineDiagnostics,
}

impl LoadedDataset {
    #[must_use]
    pub fn is_sample(&self) -> bool {
        self.origin == DataOrigin::Sample
    }
}

/// Walks fallback chains through a `ResourceFetcher`.
#[derive(Clone)]
pub struct Loader {
    fetcher: Arc<dyn ResourceFetcher>,
}

impl Loader {
    #[must_use]
    pub fn new(fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self { fetcher }
    }

    /// Raw text of a single path, no fallback.
    pub async fn fetch_text(&self, path: &str) -> ChartResult<String> {
        self.fetcher.fetch(path).await
    }

    /// Loads one resource: first path that yields at least one row wins,
    /// then the sample table, then an empty set.
    pub async fn load(&self, request: &DatasetRequest) -> LoadedDataset {
        let resource = request.resource.as_str();
        let mut failures = Vec::new();
        let mut diagnostics = PipelineDiagnostics::default();

        for path in &request.paths {
            let reason = match self.fetcher.fetch(path).await {
                Err(err) => err.to_string(),
                Ok(content) => match parse_csv_rows(&content) {
                    Err(err) => err.to_string(),
                    Ok(parsed) if parsed.rows.is_empty() => "resource has no rows".to_owned(),
                    Ok(parsed) => {
                        diagnostics.skipped_csv_records += parsed.skipped;
                        debug!(
                            resource,
                            path = %path,
                            rows = parsed.rows.len(),
                            failed_paths = failures.len(),
                            "dataset loaded"
                        );
                        return LoadedDataset {
                            resource: resource.to_owned(),
                            rows: parsed.rows,
                            origin: DataOrigin::Path(path.clone()),
                            failures,
                            diagnostics,
                        };
                    }
                },
            };
            warn!(resource, path = %path, reason = %reason, "dataset path failed, falling back");
            failures.push(FetchFailure {
                path: path.clone(),
                reason,
            });
        }

        let (rows, origin) = match request.sample {
            Some(table) => {
                diagnostics.raise_advisory(
                    resource,
                    format!("{resource} could not be loaded; showing sample data"),
                );
                (table.to_rows(), DataOrigin::Sample)
            }
            None => {
                diagnostics.raise_advisory(
                    resource,
                    format!("{resource} could not be loaded and no sample data is available"),
                );
                (Vec::new(), DataOrigin::Unavailable)
            }
        };

        LoadedDataset {
            resource: resource.to_owned(),
            rows,
            origin,
            failures,
            diagnostics,
        }
    }

    /// Loads independent resources concurrently, results in request order.
    pub async fn load_all(&self, requests: &[DatasetRequest]) -> Vec<LoadedDataset> {
        join_all(requests.iter().map(|request| self.load(request))).await
    }
}
