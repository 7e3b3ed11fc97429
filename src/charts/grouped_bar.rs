use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::core::{BandScale, LinearScale, MetricDomain};
use crate::data::samples::{COSTS_CSV, CRASHES_CSV, POPULATION_CSV};
use crate::data::{
    JoinInput, LoadedDataset, MetricColumn, PipelineDiagnostics, ScaleRequest, SharedAxis,
    derive_scales, join_datasets,
};
use crate::error::ChartResult;

use super::{
    COST_COLUMN, CRASH_COLUMN, CRASH_RATE, Chart, ChartKind, ChartOutcome, ChartState, ChartView,
    DENSITY_COLUMN, INSURANCE_RATE, POPULATION_DENSITY, PipelineContext, STATE_FIELD,
    merged_diagnostics, no_joined_records,
};

const BAND_PADDING: f64 = 0.1;

/// Pair of bars drawn for one state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedBar {
    pub state: String,
    pub primary: f64,
    /// Value plotted against the shared axis (normalized when requested).
    pub secondary: f64,
    /// Cleaned source value, for tooltips.
    pub secondary_raw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedBarView {
    pub title: String,
    pub primary_label: String,
    pub secondary_label: String,
    pub shared_axis: SharedAxis,
    pub categories: Vec<String>,
    pub bars: Vec<GroupedBar>,
    pub value_domain: MetricDomain,
    pub band_padding: f64,
}

impl GroupedBarView {
    pub fn band_scale(&self, range_start: f64, range_end: f64) -> ChartResult<BandScale> {
        BandScale::new(
            self.categories.iter().cloned(),
            range_start,
            range_end,
            self.band_padding,
        )
    }

    pub fn value_scale(&self, range_start: f64, range_end: f64) -> ChartResult<LinearScale> {
        LinearScale::new(self.value_domain, range_start, range_end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Crashes,
    Population,
}

/// Insurance cost next to a second per-state metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupedBarChart {
    comparison: Comparison,
}

impl GroupedBarChart {
    /// Insurance cost vs. crash counts on one `[0, max(both)]` axis.
    #[must_use]
    pub fn crashes() -> Self {
        Self {
            comparison: Comparison::Crashes,
        }
    }

    /// Insurance cost vs. population density rescaled into the cost domain.
    #[must_use]
    pub fn population() -> Self {
        Self {
            comparison: Comparison::Population,
        }
    }

    fn secondary_resource(self) -> &'static str {
        match self.comparison {
            Comparison::Crashes => CRASHES_CSV,
            Comparison::Population => POPULATION_CSV,
        }
    }

    fn secondary_column(self) -> MetricColumn {
        match self.comparison {
            Comparison::Crashes => MetricColumn::required(CRASH_COLUMN, CRASH_RATE),
            Comparison::Population => MetricColumn::required(DENSITY_COLUMN, POPULATION_DENSITY),
        }
    }

    fn shared_axis(self) -> SharedAxis {
        match self.comparison {
            Comparison::Crashes => SharedAxis::CombinedMax,
            Comparison::Population => SharedAxis::Normalize,
        }
    }

    fn secondary_label(self) -> &'static str {
        match self.comparison {
            Comparison::Crashes => "Crash Rate",
            Comparison::Population => "Population Density",
        }
    }

    fn build(
        self,
        config: &PipelineConfig,
        costs: &LoadedDataset,
        secondary: &LoadedDataset,
        diagnostics: &mut PipelineDiagnostics,
    ) -> ChartState {
        let secondary_column = self.secondary_column();
        let secondary_metric = secondary_column.metric.clone();
        let primary = JoinInput::from_dataset(costs, STATE_FIELD)
            .metric(MetricColumn::required(COST_COLUMN, INSURANCE_RATE));
        let secondary_input =
            JoinInput::from_dataset(secondary, STATE_FIELD).metric(secondary_column);

        let records = join_datasets(
            &primary,
            &[secondary_input],
            config.key_normalization,
            diagnostics,
        );
        if records.is_empty() {
            return no_joined_records(&[COSTS_CSV, self.secondary_resource()]);
        }

        let shared_axis = self.shared_axis();
        let derived = derive_scales(
            &records,
            ScaleRequest::shared(INSURANCE_RATE, &secondary_metric, shared_axis),
            config.domain_epsilon,
        );

        let bars = match shared_axis {
            SharedAxis::Normalize => derived
                .normalized
                .iter()
                .map(|normalized| GroupedBar {
                    state: normalized.record.key.clone(),
                    primary: normalized.record.metric_or_zero(INSURANCE_RATE),
                    secondary: normalized.normalized,
                    secondary_raw: normalized.record.metric_or_zero(&secondary_metric),
                })
                .collect(),
            SharedAxis::CombinedMax => records
                .iter()
                .map(|record| GroupedBar {
                    state: record.key.clone(),
                    primary: record.metric_or_zero(INSURANCE_RATE),
                    secondary: record.metric_or_zero(&secondary_metric),
                    secondary_raw: record.metric_or_zero(&secondary_metric),
                })
                .collect(),
        };

        ChartState::Ready(ChartView::GroupedBar(GroupedBarView {
            title: format!("Insurance Rate vs. {}", self.secondary_label()),
            primary_label: "Insurance Rate".to_owned(),
            secondary_label: self.secondary_label().to_owned(),
            shared_axis,
            categories: records.iter().map(|record| record.key.clone()).collect(),
            bars,
            value_domain: derived.shared.unwrap_or(derived.primary),
            band_padding: BAND_PADDING,
        }))
    }
}

#[async_trait]
impl Chart for GroupedBarChart {
    fn kind(&self) -> ChartKind {
        match self.comparison {
            Comparison::Crashes => ChartKind::GroupedBarCrashes,
            Comparison::Population => ChartKind::GroupedBarPopulation,
        }
    }

    async fn run(&self, ctx: &PipelineContext, _selection: Option<&str>) -> ChartOutcome {
        let (costs, secondary) = tokio::join!(
            ctx.load(COSTS_CSV),
            ctx.load(self.secondary_resource())
        );
        let mut diagnostics = merged_diagnostics([&costs, &secondary]);
        let state = self.build(&ctx.config, &costs, &secondary, &mut diagnostics);
        ChartOutcome::finish(self.kind(), Ok(state), diagnostics)
    }
}
