use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::DEFAULT_DOMAIN_EPSILON;
use crate::core::{CombinedRecord, LinearScale, MetricDomain, NormalizedRecord};
use crate::error::{ChartError, ChartResult};

/// How two metrics drawn against one positional axis are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SharedAxis {
    /// Rescale the secondary metric into the primary metric's domain.
    Normalize,
    /// Draw both raw metrics against `[0, max(primary, secondary)]`.
    CombinedMax,
}

fn effective_epsilon(epsilon: f64) -> f64 {
    if epsilon.is_finite() && epsilon > 0.0 {
        epsilon
    } else {
        DEFAULT_DOMAIN_EPSILON
    }
}

/// `[0, max]` over finite `values`; the upper bound falls back to `epsilon`
/// when no value is positive.
#[must_use]
pub fn value_domain<I>(values: I, epsilon: f64) -> MetricDomain
where
    I: IntoIterator<Item = f64>,
{
    let max = values
        .into_iter()
        .filter(|value| value.is_finite())
        .fold(0.0_f64, f64::max);
    MetricDomain {
        min: 0.0,
        max: if max > 0.0 {
            max
        } else {
            effective_epsilon(epsilon)
        },
    }
}

/// `[0, max]` domain of `metric` across `records`.
#[must_use]
pub fn metric_domain(records: &[CombinedRecord], metric: &str, epsilon: f64) -> MetricDomain {
    value_domain(records.iter().filter_map(|record| record.metric(metric)), epsilon)
}

/// `[min, max]` over finite `values`, widened by `epsilon` when flat.
///
/// Used for color scales, which do not start at zero. `None` when there is
/// no finite value.
#[must_use]
pub fn extent<I>(values: I, epsilon: f64) -> Option<MetricDomain>
where
    I: IntoIterator<Item = f64>,
{
    let (min, max) = values
        .into_iter()
        .filter(|value| value.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, value| match acc {
            None => Some((value, value)),
            Some((min, max)) => Some((min.min(value), max.max(value))),
        })?;
    Some(MetricDomain {
        min,
        max: if max > min {
            max
        } else {
            min + effective_epsilon(epsilon)
        },
    })
}

/// Rescales `secondary` into `primary`'s domain for every record.
///
/// `normalized = secondary / max(secondary) * max(primary)`, divided first so
/// a subnormal secondary maximum cannot overflow. Both domains are recomputed
/// from `records` on every call.
#[must_use]
pub fn normalize_into(
    records: &[CombinedRecord],
    primary: &str,
    secondary: &str,
    epsilon: f64,
) -> Vec<NormalizedRecord> {
    let primary_domain = metric_domain(records, primary, epsilon);
    let secondary_domain = metric_domain(records, secondary, epsilon);
    trace!(
        primary,
        secondary,
        primary_max = primary_domain.max,
        secondary_max = secondary_domain.max,
        "normalizing secondary metric"
    );

    records
        .iter()
        .map(|record| NormalizedRecord {
            record: record.clone(),
            normalized: rescale(
                record.metric_or_zero(secondary),
                secondary_domain.max,
                primary_domain.max,
            ),
        })
        .collect()
}

/// `value / from_max * to_max`, saturated to a finite value.
fn rescale(value: f64, from_max: f64, to_max: f64) -> f64 {
    let scaled = value / from_max * to_max;
    if scaled.is_nan() {
        0.0
    } else {
        scaled.clamp(f64::MIN, f64::MAX)
    }
}

/// Metrics a chart wants scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleRequest<'a> {
    pub primary: &'a str,
    pub secondary: Option<(&'a str, Option<SharedAxis>)>,
}

impl<'a> ScaleRequest<'a> {
    #[must_use]
    pub fn single(primary: &'a str) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }

    /// Two metrics on independent axes.
    #[must_use]
    pub fn pair(primary: &'a str, secondary: &'a str) -> Self {
        Self {
            primary,
            secondary: Some((secondary, None)),
        }
    }

    /// Two metrics on one positional axis.
    #[must_use]
    pub fn shared(primary: &'a str, secondary: &'a str, axis: SharedAxis) -> Self {
        Self {
            primary,
            secondary: Some((secondary, Some(axis))),
        }
    }
}

/// Domains handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedScales {
    pub primary_metric: String,
    pub primary: MetricDomain,
    pub secondary_metric: Option<String>,
    pub secondary: Option<MetricDomain>,
    /// Domain of the shared axis when two metrics share one.
    pub shared: Option<MetricDomain>,
    /// Filled only for `SharedAxis::Normalize`.
    pub normalized: Vec<NormalizedRecord>,
}

impl DerivedScales {
    /// Domain a given metric is drawn against.
    ///
    /// On a shared axis both metrics report the shared domain.
    #[must_use]
    pub fn domain_of(&self, metric: &str) -> Option<MetricDomain> {
        let is_primary = metric == self.primary_metric;
        let is_secondary = self.secondary_metric.as_deref() == Some(metric);
        if let Some(shared) = self.shared {
            if is_primary || is_secondary {
                return Some(shared);
            }
        }
        if is_primary {
            Some(self.primary)
        } else if is_secondary {
            self.secondary
        } else {
            None
        }
    }

    pub fn position_scale(
        &self,
        metric: &str,
        range_start: f64,
        range_end: f64,
    ) -> ChartResult<LinearScale> {
        let domain = self.domain_of(metric).ok_or_else(|| {
            ChartError::InvalidData(format!("metric `{metric}` has no derived domain"))
        })?;
        LinearScale::new(domain, range_start, range_end)
    }
}

/// Computes domains (and normalized values when requested) for `records`.
#[must_use]
pub fn derive_scales(
    records: &[CombinedRecord],
    request: ScaleRequest<'_>,
    epsilon: f64,
) -> DerivedScales {
    let primary = metric_domain(records, request.primary, epsilon);
    let mut derived = DerivedScales {
        primary_metric: request.primary.to_owned(),
        primary,
        secondary_metric: None,
        secondary: None,
        shared: None,
        normalized: Vec::new(),
    };

    if let Some((secondary_metric, axis)) = request.secondary {
        let secondary = metric_domain(records, secondary_metric, epsilon);
        derived.secondary_metric = Some(secondary_metric.to_owned());
        derived.secondary = Some(secondary);
        match axis {
            Some(SharedAxis::Normalize) => {
                derived.shared = Some(primary);
                derived.normalized =
                    normalize_into(records, request.primary, secondary_metric, epsilon);
            }
            Some(SharedAxis::CombinedMax) => {
                derived.shared = Some(MetricDomain {
                    min: 0.0,
                    max: primary.max.max(secondary.max),
                });
            }
            None => {}
        }
    }

    derived
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_lower_bound_is_zero_even_for_negative_data() {
        let domain = value_domain([-5.0, 3.0, 7.5], 1e-6);
        assert_eq!(domain.as_tuple(), (0.0, 7.5));
    }

    #[test]
    fn all_zero_metric_gets_epsilon_upper_bound() {
        let domain = value_domain([0.0, 0.0], 1e-6);
        assert_eq!(domain.max, 1e-6);
        assert_eq!(value_domain(std::iter::empty(), 0.5).max, 0.5);
    }

    #[test]
    fn invalid_epsilon_falls_back_to_default() {
        let domain = value_domain([0.0], f64::NAN);
        assert_eq!(domain.max, DEFAULT_DOMAIN_EPSILON);
    }

    #[test]
    fn extent_widens_flat_input() {
        let flat = extent([4.0, 4.0], 0.25).expect("extent");
        assert_eq!(flat.as_tuple(), (4.0, 4.25));
        assert_eq!(
            extent([3.0, 9.0, 5.0], 1e-6).expect("extent").as_tuple(),
            (3.0, 9.0)
        );
        assert!(extent(std::iter::empty(), 1e-6).is_none());
    }
}
