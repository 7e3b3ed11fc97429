use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

/// One parsed CSV line keyed by (trimmed) header name.
///
/// Rows only live for the duration of one load cycle; everything downstream
/// works on `CombinedRecord`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow {
    fields: IndexMap<String, String>,
}

impl RawRow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Looks a column up by exact name, then by ASCII case-insensitive name.
    ///
    /// Source files disagree on `State` vs `state`; this is the only place
    /// that leniency applies.
    #[must_use]
    pub fn get_loose(&self, column: &str) -> Option<&str> {
        self.get(column).or_else(|| {
            self.fields
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(column))
                .map(|(_, value)| value.as_str())
        })
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One successfully joined key with the cleaned metrics of every input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedRecord {
    pub key: String,
    pub metrics: IndexMap<String, f64>,
}

impl CombinedRecord {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            metrics: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    /// Metric value, `0` when the record does not carry it.
    #[must_use]
    pub fn metric_or_zero(&self, name: &str) -> f64 {
        self.metric(name).unwrap_or(0.0)
    }

    /// Converts the record back into a row so it can be fed to another join.
    ///
    /// The key lands under `key_field` and every metric under its own name.
    #[must_use]
    pub fn to_raw_row(&self, key_field: &str) -> RawRow {
        let mut row = RawRow::new();
        row.insert(key_field, self.key.clone());
        for (name, value) in &self.metrics {
            row.insert(name.clone(), value.to_string());
        }
        row
    }
}

/// A `CombinedRecord` carrying a secondary metric rescaled into the primary
/// metric's domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub record: CombinedRecord,
    pub normalized: f64,
}

/// Closed numeric interval used to build position and color scales.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricDomain {
    pub min: f64,
    pub max: f64,
}

impl MetricDomain {
    /// Builds a validated domain.
    ///
    /// Invariants:
    /// - both bounds are finite
    /// - `min < max`
    pub fn new(min: f64, max: f64) -> ChartResult<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(ChartError::InvalidData(
                "domain bounds must be finite".to_owned(),
            ));
        }
        if min >= max {
            return Err(ChartError::InvalidData(format!(
                "domain min must be < max (got [{min}, {max}])"
            )));
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub fn span(self) -> f64 {
        self.max - self.min
    }

    #[must_use]
    pub fn contains(self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    #[must_use]
    pub fn as_tuple(self) -> (f64, f64) {
        (self.min, self.max)
    }
}
