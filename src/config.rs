use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::data::KeyNormalization;
use crate::error::{ChartError, ChartResult};

/// Public US state boundary topology joined against the rates dataset.
pub const DEFAULT_TOPOLOGY_URL: &str = "https://cdn.jsdelivr.net/npm/us-atlas@3/states-10m.json";

/// Upper bound used when every value of a metric is zero.
pub const DEFAULT_DOMAIN_EPSILON: f64 = 1e-6;

/// Pipeline configuration shared by every chart.
///
/// Serializable so hosts can keep it next to their data files instead of
/// inventing their own format. Every field has a default, so a partial JSON
/// object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Prefixes tried in order for every resource; `""` is the bare path.
    #[serde(default = "default_path_prefixes")]
    pub path_prefixes: Vec<String>,
    #[serde(default)]
    pub key_normalization: KeyNormalization,
    #[serde(default = "default_domain_epsilon")]
    pub domain_epsilon: f64,
    #[serde(default = "default_topology_url")]
    pub topology_url: String,
    /// Substitute embedded sample rows once a resource's paths are exhausted.
    #[serde(default = "default_sample_fallback")]
    pub sample_fallback: bool,
    /// Seed for the synthetic trend series; `None` draws from OS entropy.
    #[serde(default)]
    pub trend_seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            path_prefixes: default_path_prefixes(),
            key_normalization: KeyNormalization::default(),
            domain_epsilon: default_domain_epsilon(),
            topology_url: default_topology_url(),
            sample_fallback: default_sample_fallback(),
            trend_seed: None,
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the ordered prefix list of the fallback chain.
    #[must_use]
    pub fn with_path_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_key_normalization(mut self, normalization: KeyNormalization) -> Self {
        self.key_normalization = normalization;
        self
    }

    #[must_use]
    pub fn with_domain_epsilon(mut self, epsilon: f64) -> Self {
        self.domain_epsilon = epsilon;
        self
    }

    #[must_use]
    pub fn with_topology_url(mut self, url: impl Into<String>) -> Self {
        self.topology_url = url.into();
        self
    }

    #[must_use]
    pub fn with_sample_fallback(mut self, enabled: bool) -> Self {
        self.sample_fallback = enabled;
        self
    }

    #[must_use]
    pub fn with_trend_seed(mut self, seed: Option<u64>) -> Self {
        self.trend_seed = seed;
        self
    }

    /// Ordered, de-duplicated list of paths tried for `resource`.
    #[must_use]
    pub fn fallback_paths(&self, resource: &str) -> Vec<String> {
        let bare = resource.trim_start_matches('/');
        let paths: IndexSet<String> = self
            .path_prefixes
            .iter()
            .map(|prefix| {
                let prefix = prefix.trim_end_matches('/');
                if prefix.is_empty() {
                    bare.to_owned()
                } else {
                    format!("{prefix}/{bare}")
                }
            })
            .collect();
        paths.into_iter().collect()
    }

    pub fn validate(&self) -> ChartResult<()> {
        if self.path_prefixes.is_empty() {
            return Err(ChartError::InvalidConfig(
                "path_prefixes must contain at least one entry".to_owned(),
            ));
        }
        if !self.domain_epsilon.is_finite() || self.domain_epsilon <= 0.0 {
            return Err(ChartError::InvalidConfig(
                "domain_epsilon must be finite and > 0".to_owned(),
            ));
        }
        if self.topology_url.trim().is_empty() {
            return Err(ChartError::InvalidConfig(
                "topology_url must not be empty".to_owned(),
            ));
        }
        Ok(())
    }

    /// Serializes config to pretty JSON.
    pub fn to_json_pretty(&self) -> ChartResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ChartError::InvalidConfig(format!("failed to serialize config: {e}")))
    }

    /// Deserializes and validates config from JSON.
    pub fn from_json_str(input: &str) -> ChartResult<Self> {
        let config: Self = serde_json::from_str(input)
            .map_err(|e| ChartError::InvalidConfig(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

fn default_path_prefixes() -> Vec<String> {
    vec![String::new(), "public".to_owned()]
}

fn default_domain_epsilon() -> f64 {
    DEFAULT_DOMAIN_EPSILON
}

fn default_topology_url() -> String {
    DEFAULT_TOPOLOGY_URL.to_owned()
}

fn default_sample_fallback() -> bool {
    true
}
