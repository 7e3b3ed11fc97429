use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::RawRow;
use crate::data::PipelineDiagnostics;

/// How a field that cannot be read as a number is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldPolicy {
    /// The row cannot be used without this value.
    Required,
    /// Missing values read as `0`.
    Optional,
}

/// Outcome of cleaning one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CleanedField {
    Parsed(f64),
    /// Optional field that was empty or malformed, resolved to `0`.
    Defaulted,
    /// Required field that was empty or malformed; the row must be dropped.
    Rejected,
}

impl CleanedField {
    /// Numeric value, `None` only for rejected fields.
    #[must_use]
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Parsed(value) => Some(value),
            Self::Defaulted => Some(0.0),
            Self::Rejected => None,
        }
    }

    #[must_use]
    pub fn is_malformed(self) -> bool {
        !matches!(self, Self::Parsed(_))
    }
}

/// Strips currency symbols, group separators and units, then parses.
///
/// Keeps only ASCII digits, `.` and `-`. Returns `None` when nothing is left
/// or the remainder is not a finite number (`"1.2.3"`, `"-"`).
#[must_use]
pub fn clean_numeric(raw: &str) -> Option<f64> {
    let digits: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.' || *ch == '-')
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Cleans `column` of `row` under `policy`. An absent column counts as empty.
#[must_use]
pub fn clean_field(row: &RawRow, column: &str, policy: FieldPolicy) -> CleanedField {
    match row.get(column).and_then(clean_numeric) {
        Some(value) => CleanedField::Parsed(value),
        None => match policy {
            FieldPolicy::Required => CleanedField::Rejected,
            FieldPolicy::Optional => CleanedField::Defaulted,
        },
    }
}

/// Same as `clean_field`, recording malformed fields in `diagnostics`.
pub fn clean_field_tracked(
    row: &RawRow,
    column: &str,
    policy: FieldPolicy,
    diagnostics: &mut PipelineDiagnostics,
) -> CleanedField {
    let cleaned = clean_field(row, column, policy);
    if cleaned.is_malformed() {
        trace!(column, raw = ?row.get(column), ?cleaned, "malformed field");
        diagnostics.malformed_fields += 1;
    }
    cleaned
}
