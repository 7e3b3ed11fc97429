use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::core::{BandScale, CombinedRecord, LinearScale, MetricDomain};
use crate::data::samples::{FACTORS_CSV, INSURANCE_RATES_CSV};
use crate::data::{
    JoinInput, LoadedDataset, MetricColumn, PipelineDiagnostics, join_datasets, value_domain,
};
use crate::error::ChartResult;

use super::{
    Chart, ChartKind, ChartOutcome, ChartState, ChartView, INSURANCE_RATE, PipelineContext,
    merged_diagnostics,
};

const KEY_FIELD: &str = "state";
const BAND_PADDING: f64 = 0.2;

/// Source column and display name of every contributing factor, in bar order.
const FACTOR_COLUMNS: [(&str, &str); 6] = [
    ("accident_rate", "Accident Rate"),
    ("population_density", "Population Density"),
    ("urban_population", "Urban Population %"),
    ("vehicle_theft", "Vehicle Theft Rate"),
    ("average_age", "Average Age"),
    ("natural_disasters", "Natural Disasters"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorBar {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorsView {
    pub state: String,
    pub title: String,
    /// `None` when the state has no row in the insurance dataset.
    pub insurance_rate: Option<f64>,
    pub factors: Vec<FactorBar>,
    pub value_domain: MetricDomain,
    pub band_padding: f64,
}

impl FactorsView {
    pub fn band_scale(&self, range_start: f64, range_end: f64) -> ChartResult<BandScale> {
        BandScale::new(
            self.factors.iter().map(|factor| factor.name.clone()),
            range_start,
            range_end,
            self.band_padding,
        )
    }

    pub fn value_scale(&self, range_start: f64, range_end: f64) -> ChartResult<LinearScale> {
        LinearScale::new(self.value_domain, range_start, range_end)
    }
}

/// Contributing factors of the selected state as horizontal bars.
///
/// Factor values come straight from the factors dataset. Without a selection
/// the first state of the insurance dataset is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FactorsChart;

impl FactorsChart {
    fn build(
        config: &PipelineConfig,
        insurance: &LoadedDataset,
        factors: &LoadedDataset,
        selection: Option<&str>,
        diagnostics: &mut PipelineDiagnostics,
    ) -> ChartState {
        let Some(target) = selection.or_else(|| {
            insurance
                .rows
                .first()
                .and_then(|row| row.get_loose(KEY_FIELD))
        }) else {
            return ChartState::no_data(format!("{INSURANCE_RATES_CSV} has no states"));
        };

        let normalization = config.key_normalization;
        let target_key = normalization.normalize(target);
        let matching = |records: Vec<CombinedRecord>| {
            records
                .into_iter()
                .find(|record| normalization.normalize(&record.key) == target_key)
        };

        let factor_input = FACTOR_COLUMNS.iter().fold(
            JoinInput::from_dataset(factors, KEY_FIELD),
            |input, (column, name)| input.metric(MetricColumn::optional(*column, *name)),
        );
        let Some(record) = matching(join_datasets(&factor_input, &[], normalization, diagnostics))
        else {
            return ChartState::no_data(format!("no contributing factor data for {target}"));
        };

        let rate_input = JoinInput::from_dataset(insurance, KEY_FIELD)
            .metric(MetricColumn::required("rate", INSURANCE_RATE));
        let insurance_rate = matching(join_datasets(&rate_input, &[], normalization, diagnostics))
            .and_then(|rate| rate.metric(INSURANCE_RATE));

        let bars: Vec<FactorBar> = FACTOR_COLUMNS
            .iter()
            .map(|(_, name)| FactorBar {
                name: (*name).to_owned(),
                value: record.metric_or_zero(name),
            })
            .collect();

        ChartState::Ready(ChartView::Factors(FactorsView {
            state: record.key.clone(),
            title: format!("Contributing Factors in {}", record.key),
            insurance_rate,
            value_domain: value_domain(bars.iter().map(|bar| bar.value), config.domain_epsilon),
            factors: bars,
            band_padding: BAND_PADDING,
        }))
    }
}

#[async_trait]
impl Chart for FactorsChart {
    fn kind(&self) -> ChartKind {
        ChartKind::FactorsCorrelation
    }

    async fn run(&self, ctx: &PipelineContext, selection: Option<&str>) -> ChartOutcome {
        let (insurance, factors) =
            tokio::join!(ctx.load(INSURANCE_RATES_CSV), ctx.load(FACTORS_CSV));
        let mut diagnostics = merged_diagnostics([&insurance, &factors]);
        let state = Self::build(&ctx.config, &insurance, &factors, selection, &mut diagnostics);
        ChartOutcome::finish(self.kind(), Ok(state), diagnostics)
    }
}
