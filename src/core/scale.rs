use indexmap::IndexSet;

use crate::core::types::MetricDomain;
use crate::error::{ChartError, ChartResult};

fn validate_range(range_start: f64, range_end: f64) -> ChartResult<()> {
    if !range_start.is_finite() || !range_end.is_finite() {
        return Err(ChartError::InvalidData(
            "scale range must be finite".to_owned(),
        ));
    }
    Ok(())
}

/// Linear mapping from a metric domain into an abstract output range.
///
/// The range is whatever the renderer wants (pixels, an inverted y axis,
/// a unit interval); the scale has no geometry knowledge of its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: MetricDomain,
    range_start: f64,
    range_end: f64,
}

impl LinearScale {
    pub fn new(domain: MetricDomain, range_start: f64, range_end: f64) -> ChartResult<Self> {
        validate_range(range_start, range_end)?;
        Ok(Self {
            domain,
            range_start,
            range_end,
        })
    }

    #[must_use]
    pub fn domain(self) -> MetricDomain {
        self.domain
    }

    #[must_use]
    pub fn range(self) -> (f64, f64) {
        (self.range_start, self.range_end)
    }

    pub fn map(self, value: f64) -> ChartResult<f64> {
        if !value.is_finite() {
            return Err(ChartError::InvalidData("value must be finite".to_owned()));
        }

        let normalized = (value - self.domain.min) / self.domain.span();
        Ok(self.range_start + normalized * (self.range_end - self.range_start))
    }

    pub fn invert(self, output: f64) -> ChartResult<f64> {
        if !output.is_finite() {
            return Err(ChartError::InvalidData("output must be finite".to_owned()));
        }

        let range_span = self.range_end - self.range_start;
        if range_span == 0.0 {
            return Err(ChartError::InvalidData(
                "cannot invert a zero-width range".to_owned(),
            ));
        }
        let normalized = (output - self.range_start) / range_span;
        Ok(self.domain.min + normalized * self.domain.span())
    }
}

/// Square-root mapping used for bubble radii, so area tracks the value.
///
/// Negative inputs map through `-sqrt(|v|)` to stay finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SqrtScale {
    domain: MetricDomain,
    range_start: f64,
    range_end: f64,
}

impl SqrtScale {
    pub fn new(domain: MetricDomain, range_start: f64, range_end: f64) -> ChartResult<Self> {
        validate_range(range_start, range_end)?;
        Ok(Self {
            domain,
            range_start,
            range_end,
        })
    }

    #[must_use]
    pub fn domain(self) -> MetricDomain {
        self.domain
    }

    pub fn map(self, value: f64) -> ChartResult<f64> {
        if !value.is_finite() {
            return Err(ChartError::InvalidData("value must be finite".to_owned()));
        }

        let lo = signed_sqrt(self.domain.min);
        let hi = signed_sqrt(self.domain.max);
        let normalized = (signed_sqrt(value) - lo) / (hi - lo);
        Ok(self.range_start + normalized * (self.range_end - self.range_start))
    }
}

fn signed_sqrt(value: f64) -> f64 {
    value.signum() * value.abs().sqrt()
}

/// Categorical scale splitting a range into equally sized bands.
///
/// `padding` is used for both inner and outer padding, bands are centered
/// in the range.
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale {
    categories: IndexSet<String>,
    range_start: f64,
    range_end: f64,
    padding: f64,
}

impl BandScale {
    pub fn new<I, S>(categories: I, range_start: f64, range_end: f64, padding: f64) -> ChartResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        validate_range(range_start, range_end)?;
        if !padding.is_finite() || !(0.0..=1.0).contains(&padding) {
            return Err(ChartError::InvalidData(
                "band padding must be finite and in [0, 1]".to_owned(),
            ));
        }

        Ok(Self {
            categories: categories.into_iter().map(Into::into).collect(),
            range_start,
            range_end,
            padding,
        })
    }

    #[must_use]
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Distance between the starts of two adjacent bands.
    #[must_use]
    pub fn step(&self) -> f64 {
        let count = self.categories.len() as f64;
        let slots = (count - self.padding + 2.0 * self.padding).max(1.0);
        (self.range_end - self.range_start) / slots
    }

    #[must_use]
    pub fn bandwidth(&self) -> f64 {
        self.step() * (1.0 - self.padding)
    }

    /// Start of the band for `category`, `None` for unknown categories.
    #[must_use]
    pub fn position(&self, category: &str) -> Option<f64> {
        let index = self.categories.get_index_of(category)?;
        let count = self.categories.len() as f64;
        let step = self.step();
        let used = step * (count - self.padding);
        let offset = (self.range_end - self.range_start - used) * 0.5;
        Some(self.range_start + offset + step * index as f64)
    }
}
