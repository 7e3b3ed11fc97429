use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::MetricDomain;
use crate::data::samples::{COSTS_CSV, CRASHES_CSV};
use crate::data::{JoinInput, MetricColumn, ScaleRequest, derive_scales, join_datasets};

use super::{
    COST_COLUMN, CRASH_COLUMN, CRASH_RATE, Chart, ChartKind, ChartOutcome, ChartState, ChartView,
    INSURANCE_RATE, PipelineContext, STATE_FIELD, merged_diagnostics, no_joined_records,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub state: String,
    /// Crash count.
    pub x: f64,
    /// Average annual insurance cost.
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterView {
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<ScatterPoint>,
    pub x_domain: MetricDomain,
    pub y_domain: MetricDomain,
}

/// Crash counts (x) against insurance cost (y), one labeled dot per state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScatterplotChart;

#[async_trait]
impl Chart for ScatterplotChart {
    fn kind(&self) -> ChartKind {
        ChartKind::Scatterplot
    }

    async fn run(&self, ctx: &PipelineContext, _selection: Option<&str>) -> ChartOutcome {
        let (costs, crashes) = tokio::join!(ctx.load(COSTS_CSV), ctx.load(CRASHES_CSV));
        let mut diagnostics = merged_diagnostics([&costs, &crashes]);

        let primary = JoinInput::from_dataset(&costs, STATE_FIELD)
            .metric(MetricColumn::required(COST_COLUMN, INSURANCE_RATE));
        let secondary = JoinInput::from_dataset(&crashes, STATE_FIELD)
            .metric(MetricColumn::required(CRASH_COLUMN, CRASH_RATE));
        let records = join_datasets(
            &primary,
            &[secondary],
            ctx.config.key_normalization,
            &mut diagnostics,
        );

        let state = if records.is_empty() {
            no_joined_records(&[COSTS_CSV, CRASHES_CSV])
        } else {
            let derived = derive_scales(
                &records,
                ScaleRequest::pair(INSURANCE_RATE, CRASH_RATE),
                ctx.config.domain_epsilon,
            );
            ChartState::Ready(ChartView::Scatter(ScatterView {
                x_label: "Crash Rate".to_owned(),
                y_label: "Insurance Rate".to_owned(),
                points: records
                    .iter()
                    .map(|record| ScatterPoint {
                        state: record.key.clone(),
                        x: record.metric_or_zero(CRASH_RATE),
                        y: record.metric_or_zero(INSURANCE_RATE),
                    })
                    .collect(),
                x_domain: derived.secondary.unwrap_or(derived.primary),
                y_domain: derived.primary,
            }))
        };

        ChartOutcome::finish(self.kind(), Ok(state), diagnostics)
    }
}
