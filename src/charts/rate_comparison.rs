use async_trait::async_trait;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::core::{CombinedRecord, MetricDomain, SqrtScale};
use crate::data::samples::{ACCIDENT_RATES_CSV, INSURANCE_RATES_CSV, POPULATION_DENSITY_CSV};
use crate::data::{
    JoinInput, LoadedDataset, MetricColumn, PipelineDiagnostics, ScaleRequest, derive_scales,
    join_datasets, metric_domain,
};
use crate::error::ChartResult;

use super::{
    ACCIDENT_RATE, Chart, ChartKind, ChartOutcome, ChartState, ChartView, INSURANCE_RATE,
    POPULATION_DENSITY, PipelineContext, merged_diagnostics, no_joined_records,
};

const KEY_FIELD: &str = "state";
/// Bubble radius range for the density encoding.
const RADIUS_RANGE: (f64, f64) = (4.0, 20.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BubblePoint {
    pub state: String,
    pub insurance_rate: f64,
    pub accident_rate: f64,
    pub density: f64,
    pub radius: f64,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityLegendEntry {
    pub label: String,
    pub value: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateComparisonView {
    pub points: Vec<BubblePoint>,
    /// Accident rate per 100,000 residents.
    pub x_domain: MetricDomain,
    /// Insurance rate in dollars.
    pub y_domain: MetricDomain,
    pub density_domain: MetricDomain,
    pub legend: Vec<DensityLegendEntry>,
}

/// Accident rate vs. insurance rate, bubble size by population density.
///
/// Accident and density inputs are optional: a state missing from them
/// stays on the chart with `0` for the missing metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateComparisonChart;

impl RateComparisonChart {
    fn build(
        config: &PipelineConfig,
        insurance: &LoadedDataset,
        accidents: &LoadedDataset,
        density: &LoadedDataset,
        selection: Option<&str>,
        diagnostics: &mut PipelineDiagnostics,
    ) -> ChartResult<ChartState> {
        let primary = JoinInput::from_dataset(insurance, KEY_FIELD)
            .metric(MetricColumn::required("rate", INSURANCE_RATE));
        let secondaries = [
            JoinInput::from_dataset(accidents, KEY_FIELD)
                .metric(MetricColumn::optional("rate", ACCIDENT_RATE))
                .optional(),
            JoinInput::from_dataset(density, KEY_FIELD)
                .metric(MetricColumn::optional("density", POPULATION_DENSITY))
                .optional(),
        ];
        let records = join_datasets(&primary, &secondaries, config.key_normalization, diagnostics);
        if records.is_empty() {
            return Ok(no_joined_records(&[INSURANCE_RATES_CSV]));
        }

        let derived = derive_scales(
            &records,
            ScaleRequest::pair(INSURANCE_RATE, ACCIDENT_RATE),
            config.domain_epsilon,
        );
        let density_domain = metric_domain(&records, POPULATION_DENSITY, config.domain_epsilon);
        let radius = SqrtScale::new(density_domain, RADIUS_RANGE.0, RADIUS_RANGE.1)?;

        let selected_key = selection.map(|state| config.key_normalization.normalize(state));
        let mut points = Vec::with_capacity(records.len());
        for record in &records {
            let density = record.metric_or_zero(POPULATION_DENSITY);
            points.push(BubblePoint {
                state: record.key.clone(),
                insurance_rate: record.metric_or_zero(INSURANCE_RATE),
                accident_rate: record.metric_or_zero(ACCIDENT_RATE),
                density,
                radius: radius.map(density)?,
                selected: selected_key
                    .as_ref()
                    .is_some_and(|key| config.key_normalization.normalize(&record.key) == *key),
            });
        }

        Ok(ChartState::Ready(ChartView::RateComparison(
            RateComparisonView {
                points,
                x_domain: derived.secondary.unwrap_or(derived.primary),
                y_domain: derived.primary,
                density_domain,
                legend: density_legend(&records, radius)?,
            },
        )))
    }
}

/// Low / Medium / High legend entries at the min, median and max density.
fn density_legend(
    records: &[CombinedRecord],
    radius: SqrtScale,
) -> ChartResult<Vec<DensityLegendEntry>> {
    let mut densities: Vec<f64> = records
        .iter()
        .map(|record| record.metric_or_zero(POPULATION_DENSITY))
        .collect();
    densities.sort_by_key(|value| OrderedFloat(*value));

    let (Some(&low), Some(&high)) = (densities.first(), densities.last()) else {
        return Ok(Vec::new());
    };
    let middle = densities.len() / 2;
    let median = if densities.len() % 2 == 0 {
        (densities[middle - 1] + densities[middle]) / 2.0
    } else {
        densities[middle]
    };

    [("Low", low), ("Medium", median), ("High", high)]
        .into_iter()
        .map(|(label, value)| {
            Ok(DensityLegendEntry {
                label: label.to_owned(),
                value,
                radius: radius.map(value)?,
            })
        })
        .collect()
}

#[async_trait]
impl Chart for RateComparisonChart {
    fn kind(&self) -> ChartKind {
        ChartKind::RateComparison
    }

    async fn run(&self, ctx: &PipelineContext, selection: Option<&str>) -> ChartOutcome {
        let (insurance, accidents, density) = tokio::join!(
            ctx.load(INSURANCE_RATES_CSV),
            ctx.load(ACCIDENT_RATES_CSV),
            ctx.load(POPULATION_DENSITY_CSV)
        );
        let mut diagnostics = merged_diagnostics([&insurance, &accidents, &density]);
        let built = Self::build(
            &ctx.config,
            &insurance,
            &accidents,
            &density,
            selection,
            &mut diagnostics,
        );
        ChartOutcome::finish(self.kind(), built, diagnostics)
    }
}
