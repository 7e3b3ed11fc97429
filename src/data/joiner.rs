use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

use crate::core::{CombinedRecord, RawRow};
use crate::data::cleaner::{CleanedField, FieldPolicy, clean_field_tracked};
use crate::data::{LoadedDataset, PipelineDiagnostics};

/// How join keys are compared across datasets.
///
/// `Exact` reproduces the historical behavior where `"Texas "` and `"Texas"`
/// never join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeyNormalization {
    #[default]
    Exact,
    /// Ignore surrounding whitespace.
    Trim,
    /// Ignore surrounding whitespace and letter case.
    TrimCaseFold,
}

impl KeyNormalization {
    /// Comparison form of `key`.
    #[must_use]
    pub fn normalize(self, key: &str) -> Cow<'_, str> {
        match self {
            Self::Exact => Cow::Borrowed(key),
            Self::Trim => Cow::Borrowed(key.trim()),
            Self::TrimCaseFold => Cow::Owned(key.trim().to_lowercase()),
        }
    }

    /// Form of `key` stored on the output record.
    #[must_use]
    pub fn display<'a>(self, key: &'a str) -> &'a str {
        match self {
            Self::Exact => key,
            Self::Trim | Self::TrimCaseFold => key.trim(),
        }
    }
}

/// Whether a secondary input must contain every primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputRequirement {
    /// Keys missing here are dropped from the output.
    Required,
    /// Keys missing here keep their row; this input's metrics read as `0`.
    Optional,
}

/// Maps one source column onto one output metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricColumn {
    pub column: String,
    pub metric: String,
    pub policy: FieldPolicy,
}

impl MetricColumn {
    #[must_use]
    pub fn required(column: impl Into<String>, metric: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            metric: metric.into(),
            policy: FieldPolicy::Required,
        }
    }

    #[must_use]
    pub fn optional(column: impl Into<String>, metric: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            metric: metric.into(),
            policy: FieldPolicy::Optional,
        }
    }
}

/// One row set taking part in a join.
#[derive(Debug, Clone)]
pub struct JoinInput<'a> {
    pub name: &'a str,
    pub rows: &'a [RawRow],
    pub key_field: &'a str,
    pub metrics: Vec<MetricColumn>,
    pub requirement: InputRequirement,
}

impl<'a> JoinInput<'a> {
    #[must_use]
    pub fn new(name: &'a str, rows: &'a [RawRow], key_field: &'a str) -> Self {
        Self {
            name,
            rows,
            key_field,
            metrics: Vec::new(),
            requirement: InputRequirement::Required,
        }
    }

    #[must_use]
    pub fn from_dataset(dataset: &'a LoadedDataset, key_field: &'a str) -> Self {
        Self::new(&dataset.resource, &dataset.rows, key_field)
    }

    #[must_use]
    pub fn metric(mut self, metric: MetricColumn) -> Self {
        self.metrics.push(metric);
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.requirement = InputRequirement::Optional;
        self
    }
}

struct KeyIndex<'a> {
    input: &'a JoinInput<'a>,
    first_row_by_key: HashMap<String, usize>,
}

impl<'a> KeyIndex<'a> {
    fn build(input: &'a JoinInput<'a>, normalization: KeyNormalization) -> Self {
        let mut first_row_by_key = HashMap::with_capacity(input.rows.len());
        for (index, row) in input.rows.iter().enumerate() {
            let Some(key) = row.get_loose(input.key_field) else {
                continue;
            };
            let key = normalization.normalize(key);
            if key.is_empty() {
                continue;
            }
            if first_row_by_key.contains_key(key.as_ref()) {
                debug!(
                    dataset = input.name,
                    key = %key,
                    row = index,
                    "ignoring duplicate key, first occurrence wins"
                );
                continue;
            }
            first_row_by_key.insert(key.into_owned(), index);
        }
        Self {
            input,
            first_row_by_key,
        }
    }

    fn lookup(&self, key: &str) -> Option<&'a RawRow> {
        let rows: &'a [RawRow] = self.input.rows;
        self.first_row_by_key.get(key).map(|&index| &rows[index])
    }
}

/// Joins `secondaries` onto `primary` by key lookup.
///
/// Output follows primary row order. A primary row is dropped when its key is
/// empty, when any required secondary lacks the key (one `JoinMiss` per row),
/// or when a required metric of the primary or a matched secondary row cannot
/// be cleaned.
pub fn join_datasets(
    primary: &JoinInput<'_>,
    secondaries: &[JoinInput<'_>],
    normalization: KeyNormalization,
    diagnostics: &mut PipelineDiagnostics,
) -> Vec<CombinedRecord> {
    let indexes: Vec<KeyIndex<'_>> = secondaries
        .iter()
        .map(|input| KeyIndex::build(input, normalization))
        .collect();

    let mut records = Vec::with_capacity(primary.rows.len());
    for (row_index, row) in primary.rows.iter().enumerate() {
        let raw_key = row.get_loose(primary.key_field).unwrap_or_default();
        let key = normalization.normalize(raw_key);
        if key.is_empty() {
            debug!(dataset = primary.name, row = row_index, "rejecting row without key");
            diagnostics.rejected_rows += 1;
            continue;
        }

        let matches: Vec<Option<&RawRow>> =
            indexes.iter().map(|index| index.lookup(&key)).collect();
        let missing_from: SmallVec<[String; 2]> = indexes
            .iter()
            .zip(&matches)
            .filter(|(index, matched)| {
                index.input.requirement == InputRequirement::Required && matched.is_none()
            })
            .map(|(index, _)| index.input.name.to_owned())
            .collect();
        if !missing_from.is_empty() {
            diagnostics.record_join_miss(normalization.display(raw_key), missing_from);
            continue;
        }

        let mut record = CombinedRecord::new(normalization.display(raw_key));
        if !collect_metrics(&mut record, row, &primary.metrics, diagnostics) {
            debug!(dataset = primary.name, key = %key, "rejecting row with unusable required metric");
            diagnostics.rejected_rows += 1;
            continue;
        }

        let mut accepted = true;
        for (index, matched) in indexes.iter().zip(&matches) {
            let input = index.input;
            match matched {
                Some(secondary_row) => {
                    if !collect_metrics(&mut record, secondary_row, &input.metrics, diagnostics) {
                        debug!(
                            dataset = input.name,
                            key = %key,
                            "rejecting row with unusable required metric in secondary"
                        );
                        accepted = false;
                        break;
                    }
                }
                None => {
                    for metric in &input.metrics {
                        record.metrics.insert(metric.metric.clone(), 0.0);
                    }
                }
            }
        }
        if !accepted {
            diagnostics.rejected_rows += 1;
            continue;
        }

        records.push(record);
    }

    debug!(
        primary = primary.name,
        input_rows = primary.rows.len(),
        joined = records.len(),
        "join complete"
    );
    records
}

fn collect_metrics(
    record: &mut CombinedRecord,
    row: &RawRow,
    metrics: &[MetricColumn],
    diagnostics: &mut PipelineDiagnostics,
) -> bool {
    for metric in metrics {
        match clean_field_tracked(row, &metric.column, metric.policy, diagnostics) {
            CleanedField::Rejected => return false,
            cleaned => {
                record
                    .metrics
                    .insert(metric.metric.clone(), cleaned.value().unwrap_or(0.0));
            }
        }
    }
    true
}
