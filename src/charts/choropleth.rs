use async_trait::async_trait;
use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::MetricDomain;
use crate::data::samples::INSURANCE_RATES_CSV;
use crate::data::{JoinInput, MetricColumn, PipelineDiagnostics, extent, join_datasets};
use crate::error::{ChartError, ChartResult};

use super::{
    Chart, ChartKind, ChartOutcome, ChartState, ChartView, INSURANCE_RATE, PipelineContext,
    merged_diagnostics, no_joined_records,
};

const KEY_FIELD: &str = "state";

/// Fill input of one map region. `rate: None` is drawn with the neutral color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionFill {
    pub name: String,
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoroplethView {
    /// `[min, max]` rate extent for the sequential color scale.
    pub color_domain: Option<MetricDomain>,
    pub regions: Vec<RegionFill>,
}

#[derive(Debug, Deserialize)]
struct Topology {
    objects: TopologyObjects,
}

#[derive(Debug, Deserialize)]
struct TopologyObjects {
    states: GeometryCollection,
}

#[derive(Debug, Deserialize)]
struct GeometryCollection {
    #[serde(default)]
    geometries: Vec<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(default)]
    properties: Option<GeometryProperties>,
}

#[derive(Debug, Deserialize)]
struct GeometryProperties {
    #[serde(default)]
    name: Option<String>,
}

/// State names of a TopoJSON document's `objects.states` collection, in
/// document order. Geometries without a name are skipped.
pub fn parse_state_names(topology_json: &str) -> ChartResult<Vec<String>> {
    let topology: Topology = serde_json::from_str(topology_json)
        .map_err(|e| ChartError::InvalidData(format!("failed to parse topology: {e}")))?;
    Ok(topology
        .objects
        .states
        .geometries
        .into_iter()
        .filter_map(|geometry| geometry.properties.and_then(|properties| properties.name))
        .collect())
}

/// US states filled by insurance rate.
///
/// Regions come from the boundary topology. When it cannot be retrieved the
/// rate dataset's own states are used and an advisory is raised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChoroplethChart;

#[async_trait]
impl Chart for ChoroplethChart {
    fn kind(&self) -> ChartKind {
        ChartKind::Choropleth
    }

    async fn run(&self, ctx: &PipelineContext, _selection: Option<&str>) -> ChartOutcome {
        let topology_url = ctx.config.topology_url.as_str();
        let (topology, rates) = tokio::join!(
            ctx.loader.fetch_text(topology_url),
            ctx.load(INSURANCE_RATES_CSV)
        );
        let mut diagnostics = merged_diagnostics([&rates]);

        let primary = JoinInput::from_dataset(&rates, KEY_FIELD)
            .metric(MetricColumn::required("rate", INSURANCE_RATE));
        let normalization = ctx.config.key_normalization;
        let records = join_datasets(&primary, &[], normalization, &mut diagnostics);
        if records.is_empty() {
            let state = no_joined_records(&[INSURANCE_RATES_CSV]);
            return ChartOutcome::finish(self.kind(), Ok(state), diagnostics);
        }

        // First row per state wins; its display name seeds the fallback regions.
        let mut rate_by_key: IndexMap<String, (String, f64)> = IndexMap::new();
        for record in &records {
            let rate = record.metric_or_zero(INSURANCE_RATE);
            match rate_by_key.entry(normalization.normalize(&record.key).into_owned()) {
                Entry::Vacant(slot) => {
                    slot.insert((record.key.clone(), rate));
                }
                Entry::Occupied(_) => {
                    debug!(state = %record.key, rate, "ignoring duplicate state rate");
                }
            }
        }

        let region_names = match topology.and_then(|json| parse_state_names(&json)) {
            Ok(names) if !names.is_empty() => names,
            Ok(_) => {
                topology_fallback(&mut diagnostics, topology_url, "topology has no state names");
                rate_by_key.values().map(|(name, _)| name.clone()).collect()
            }
            Err(err) => {
                topology_fallback(&mut diagnostics, topology_url, &err.to_string());
                rate_by_key.values().map(|(name, _)| name.clone()).collect()
            }
        };

        let regions: Vec<RegionFill> = region_names
            .into_iter()
            .map(|name| {
                let rate = rate_by_key
                    .get(normalization.normalize(&name).as_ref())
                    .map(|(_, rate)| *rate);
                RegionFill { name, rate }
            })
            .collect();
        debug!(
            regions = regions.len(),
            filled = regions.iter().filter(|region| region.rate.is_some()).count(),
            "choropleth regions joined"
        );

        let state = ChartState::Ready(ChartView::Choropleth(ChoroplethView {
            color_domain: extent(
                rate_by_key.values().map(|(_, rate)| *rate),
                ctx.config.domain_epsilon,
            ),
            regions,
        }));
        ChartOutcome::finish(self.kind(), Ok(state), diagnostics)
    }
}

fn topology_fallback(diagnostics: &mut PipelineDiagnostics, url: &str, reason: &str) {
    diagnostics.raise_advisory(
        url,
        format!("state boundaries unavailable ({reason}); showing states from {INSURANCE_RATES_CSV}"),
    );
}
