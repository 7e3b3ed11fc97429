//! Thin chart consumers of the shared data pipeline.
//!
//! Every chart names its datasets and metrics, runs load → join → derive and
//! hands a renderer-agnostic view (or an explicit "no data" state) back.

mod choropleth;
mod factors;
mod grouped_bar;
mod rate_comparison;
mod scatterplot;
mod trend;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::core::MetricDomain;
use crate::data::{DatasetRequest, LoadedDataset, Loader, PipelineDiagnostics, ResourceFetcher};
use crate::error::{ChartError, ChartResult};

pub use choropleth::{ChoroplethChart, ChoroplethView, RegionFill, parse_state_names};
pub use factors::{FactorBar, FactorsChart, FactorsView};
pub use grouped_bar::{GroupedBar, GroupedBarChart, GroupedBarView};
pub use rate_comparison::{BubblePoint, DensityLegendEntry, RateComparisonChart, RateComparisonView};
pub use scatterplot::{ScatterPoint, ScatterView, ScatterplotChart};
pub use trend::{TREND_YEARS, TrendChart, TrendPoint, TrendView, generate_trend};

pub(crate) const STATE_FIELD: &str = "State";
pub(crate) const COST_COLUMN: &str = "Avg annual cost";
pub(crate) const CRASH_COLUMN: &str = "Total Crashes Liability";
pub(crate) const DENSITY_COLUMN: &str = "Population Density (people/sq. mile)";

pub const INSURANCE_RATE: &str = "insuranceRate";
pub const CRASH_RATE: &str = "crashRate";
pub const POPULATION_DENSITY: &str = "populationDensity";
pub const ACCIDENT_RATE: &str = "accidentRate";

/// Loader plus configuration shared by every chart run.
#[derive(Clone)]
pub struct PipelineContext {
    pub loader: Loader,
    pub config: PipelineConfig,
}

impl PipelineContext {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>, config: PipelineConfig) -> ChartResult<Self> {
        config.validate()?;
        Ok(Self {
            loader: Loader::new(fetcher),
            config,
        })
    }

    #[must_use]
    pub fn request(&self, resource: &str) -> DatasetRequest {
        DatasetRequest::new(resource, &self.config)
    }

    /// Loads `resource` through the configured fallback chain.
    pub async fn load(&self, resource: &str) -> LoadedDataset {
        self.loader.load(&self.request(resource)).await
    }
}

/// Chart variants served by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartKind {
    GroupedBarCrashes,
    GroupedBarPopulation,
    Scatterplot,
    RateComparison,
    FactorsCorrelation,
    Choropleth,
    Trend,
}

impl ChartKind {
    pub const ALL: [ChartKind; 7] = [
        ChartKind::GroupedBarCrashes,
        ChartKind::GroupedBarPopulation,
        ChartKind::Scatterplot,
        ChartKind::RateComparison,
        ChartKind::FactorsCorrelation,
        ChartKind::Choropleth,
        ChartKind::Trend,
    ];

    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::GroupedBarCrashes => "grouped-bar",
            Self::GroupedBarPopulation => "grouped-bar-population",
            Self::Scatterplot => "scatterplot",
            Self::RateComparison => "rate-comparison",
            Self::FactorsCorrelation => "factors",
            Self::Choropleth => "choropleth",
            Self::Trend => "trend",
        }
    }

    /// Chart implementation for this kind.
    #[must_use]
    pub fn chart(self) -> Box<dyn Chart> {
        match self {
            Self::GroupedBarCrashes => Box::new(GroupedBarChart::crashes()),
            Self::GroupedBarPopulation => Box::new(GroupedBarChart::population()),
            Self::Scatterplot => Box::new(ScatterplotChart),
            Self::RateComparison => Box::new(RateComparisonChart),
            Self::FactorsCorrelation => Box::new(FactorsChart),
            Self::Choropleth => Box::new(ChoroplethChart),
            Self::Trend => Box::new(TrendChart),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ChartKind {
    type Err = ChartError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == input)
            .ok_or_else(|| ChartError::InvalidData(format!("unknown chart kind `{input}`")))
    }
}

/// Renderer-agnostic chart content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChartView {
    GroupedBar(GroupedBarView),
    Scatter(ScatterView),
    RateComparison(RateComparisonView),
    Factors(FactorsView),
    Choropleth(ChoroplethView),
    Trend(TrendView),
}

impl ChartView {
    /// Number of data marks (bars, dots, regions, points) in the view.
    #[must_use]
    pub fn mark_count(&self) -> usize {
        match self {
            Self::GroupedBar(view) => view.bars.len() * 2,
            Self::Scatter(view) => view.points.len(),
            Self::RateComparison(view) => view.points.len(),
            Self::Factors(view) => view.factors.len(),
            Self::Choropleth(view) => view.regions.len(),
            Self::Trend(view) => view.points.len(),
        }
    }

    /// Checks that every value and domain a renderer would consume is finite.
    pub fn validate(&self) -> ChartResult<()> {
        match self {
            Self::GroupedBar(view) => {
                validate_domain("value", view.value_domain)?;
                for bar in &view.bars {
                    ensure_finite(&bar.state, [bar.primary, bar.secondary, bar.secondary_raw])?;
                }
            }
            Self::Scatter(view) => {
                validate_domain("x", view.x_domain)?;
                validate_domain("y", view.y_domain)?;
                for point in &view.points {
                    ensure_finite(&point.state, [point.x, point.y])?;
                }
            }
            Self::RateComparison(view) => {
                validate_domain("accident rate", view.x_domain)?;
                validate_domain("insurance rate", view.y_domain)?;
                validate_domain("density", view.density_domain)?;
                for point in &view.points {
                    ensure_finite(
                        &point.state,
                        [
                            point.insurance_rate,
                            point.accident_rate,
                            point.density,
                            point.radius,
                        ],
                    )?;
                }
                for entry in &view.legend {
                    ensure_finite(&entry.label, [entry.value, entry.radius])?;
                }
            }
            Self::Factors(view) => {
                validate_domain("factor", view.value_domain)?;
                if let Some(rate) = view.insurance_rate {
                    ensure_finite(&view.state, [rate])?;
                }
                for factor in &view.factors {
                    ensure_finite(&factor.name, [factor.value])?;
                }
            }
            Self::Choropleth(view) => {
                if let Some(domain) = view.color_domain {
                    validate_domain("color", domain)?;
                }
                for region in &view.regions {
                    if let Some(rate) = region.rate {
                        ensure_finite(&region.name, [rate])?;
                    }
                }
            }
            Self::Trend(view) => {
                validate_domain("year", view.year_domain)?;
                validate_domain("rate", view.rate_domain)?;
                for point in &view.points {
                    ensure_finite("trend", [point.rate])?;
                }
            }
        }
        Ok(())
    }
}

fn validate_domain(label: &str, domain: MetricDomain) -> ChartResult<()> {
    MetricDomain::new(domain.min, domain.max)
        .map(|_| ())
        .map_err(|e| ChartError::InvalidData(format!("{label} domain: {e}")))
}

fn ensure_finite<const N: usize>(label: &str, values: [f64; N]) -> ChartResult<()> {
    if values.iter().all(|value| value.is_finite()) {
        Ok(())
    } else {
        Err(ChartError::InvalidData(format!(
            "non-finite value for `{label}`"
        )))
    }
}

/// What a chart shows after one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChartState {
    Ready(ChartView),
    /// Explicit empty state; never rendered as a blank chart.
    NoData { message: String },
}

impl ChartState {
    #[must_use]
    pub fn no_data(message: impl Into<String>) -> Self {
        Self::NoData {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    #[must_use]
    pub fn view(&self) -> Option<&ChartView> {
        match self {
            Self::Ready(view) => Some(view),
            Self::NoData { .. } => None,
        }
    }

    pub fn validate(&self) -> ChartResult<()> {
        match self {
            Self::Ready(view) => view.validate(),
            Self::NoData { message } if message.trim().is_empty() => Err(ChartError::InvalidData(
                "no-data state requires a message".to_owned(),
            )),
            Self::NoData { .. } => Ok(()),
        }
    }
}

/// Result of one chart run: what to show and what was recovered from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartOutcome {
    pub kind: ChartKind,
    pub state: ChartState,
    pub diagnostics: PipelineDiagnostics,
}

impl ChartOutcome {
    pub(crate) fn finish(
        kind: ChartKind,
        built: ChartResult<ChartState>,
        diagnostics: PipelineDiagnostics,
    ) -> Self {
        let state = match built {
            Ok(state) => state,
            Err(err) => {
                warn!(chart = %kind, error = %err, "chart data could not be prepared");
                ChartState::no_data(format!("chart data could not be prepared: {err}"))
            }
        };
        if let ChartState::NoData { message } = &state {
            debug!(chart = %kind, message = %message, "chart has no data");
        }
        Self {
            kind,
            state,
            diagnostics,
        }
    }

    pub fn to_json_pretty(&self) -> ChartResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ChartError::InvalidData(format!("failed to serialize outcome: {e}")))
    }
}

/// One chart variant: which datasets it reads and how it shapes them.
#[async_trait]
pub trait Chart: Send + Sync {
    fn kind(&self) -> ChartKind;

    /// Runs the whole pipeline for `selection`. Never fails: problems end up
    /// in the diagnostics or as `ChartState::NoData`.
    async fn run(&self, ctx: &PipelineContext, selection: Option<&str>) -> ChartOutcome;
}

pub(crate) fn merged_diagnostics<'a, I>(datasets: I) -> PipelineDiagnostics
where
    I: IntoIterator<Item = &'a LoadedDataset>,
{
    let mut diagnostics = PipelineDiagnostics::default();
    for dataset in datasets {
        diagnostics.merge(dataset.diagnostics.clone());
    }
    diagnostics
}

pub(crate) fn no_joined_records(resources: &[&str]) -> ChartState {
    ChartState::no_data(format!(
        "no usable records after joining {}",
        resources.join(" and ")
    ))
}
