use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::core::MetricDomain;
use crate::data::{PipelineDiagnostics, value_domain};
use crate::error::ChartResult;

use super::{Chart, ChartKind, ChartOutcome, ChartState, ChartView, PipelineContext};

pub const TREND_YEARS: [i32; 6] = [2018, 2019, 2020, 2021, 2022, 2023];

const NATIONAL_BASE_RATE: f64 = 1500.0;
const ANNUAL_GROWTH: f64 = 0.08;
const NOISE: f64 = 0.02;
/// Headroom above the highest point of the series.
const RATE_HEADROOM: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub year: i32,
    pub rate: f64,
}

/// Synthetic rate series. `synthetic` is always `true`: there is no
/// historical data behind this chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendView {
    pub title: String,
    pub synthetic: bool,
    pub points: Vec<TrendPoint>,
    pub year_domain: MetricDomain,
    pub rate_domain: MetricDomain,
}

/// Placeholder yearly series: `base * (1 + (year - 2018) * 0.08 + U[0, 0.02))`.
///
/// The national base is fixed at 1500; a selected state draws its base from
/// `[1000, 2000)`.
pub fn generate_trend<R: Rng + ?Sized>(rng: &mut R, selection: Option<&str>) -> Vec<TrendPoint> {
    let base_rate = match selection {
        Some(_) => rng.random_range(1000.0..2000.0_f64).round(),
        None => NATIONAL_BASE_RATE,
    };
    let first_year = TREND_YEARS[0];
    TREND_YEARS
        .iter()
        .map(|&year| TrendPoint {
            year,
            rate: base_rate
                * (1.0
                    + f64::from(year - first_year) * ANNUAL_GROWTH
                    + rng.random_range(0.0..NOISE)),
        })
        .collect()
}

fn build_view(points: Vec<TrendPoint>, selection: Option<&str>, epsilon: f64) -> ChartResult<TrendView> {
    let first = f64::from(TREND_YEARS[0]);
    let last = f64::from(TREND_YEARS[TREND_YEARS.len() - 1]);
    let peak = value_domain(points.iter().map(|point| point.rate), epsilon);
    Ok(TrendView {
        title: match selection {
            Some(state) => format!("Insurance Rate Trends in {state}"),
            None => "Insurance Rate Trends (National Average)".to_owned(),
        },
        synthetic: true,
        year_domain: MetricDomain::new(first, last)?,
        rate_domain: MetricDomain::new(0.0, peak.max * RATE_HEADROOM)?,
        points,
    })
}

/// Rate trend line for the selected state or the national average.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrendChart;

#[async_trait]
impl Chart for TrendChart {
    fn kind(&self) -> ChartKind {
        ChartKind::Trend
    }

    async fn run(&self, ctx: &PipelineContext, selection: Option<&str>) -> ChartOutcome {
        let mut rng = match ctx.config.trend_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let points = generate_trend(&mut rng, selection);
        let built = build_view(points, selection, ctx.config.domain_epsilon)
            .map(|view| ChartState::Ready(ChartView::Trend(view)));
        ChartOutcome::finish(self.kind(), built, PipelineDiagnostics::default())
    }
}
