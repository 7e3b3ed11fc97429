use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::warn;

/// User-visible, non-fatal message about substituted data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub resource: String,
    pub message: String,
}

/// A primary key that had no match in one or more required inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinMiss {
    pub key: String,
    pub missing_from: SmallVec<[String; 2]>,
}

/// Everything one pipeline run recovered from.
///
/// Individual malformed fields are only counted; join misses and advisories
/// are kept in full.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    pub advisories: Vec<Advisory>,
    pub join_misses: Vec<JoinMiss>,
    pub malformed_fields: usize,
    pub rejected_rows: usize,
    pub skipped_csv_records: usize,
}

impl PipelineDiagnostics {
    pub fn raise_advisory(&mut self, resource: impl Into<String>, message: impl Into<String>) {
        let advisory = Advisory {
            resource: resource.into(),
            message: message.into(),
        };
        warn!(
            resource = %advisory.resource,
            message = %advisory.message,
            "advisory raised"
        );
        self.advisories.push(advisory);
    }

    pub fn record_join_miss(&mut self, key: impl Into<String>, missing_from: SmallVec<[String; 2]>) {
        let miss = JoinMiss {
            key: key.into(),
            missing_from,
        };
        warn!(
            key = %miss.key,
            missing_from = ?miss.missing_from,
            "dropping unjoinable record"
        );
        self.join_misses.push(miss);
    }

    /// Folds diagnostics of another stage into this one.
    pub fn merge(&mut self, other: PipelineDiagnostics) {
        self.advisories.extend(other.advisories);
        self.join_misses.extend(other.join_misses);
        self.malformed_fields += other.malformed_fields;
        self.rejected_rows += other.rejected_rows;
        self.skipped_csv_records += other.skipped_csv_records;
    }

    #[must_use]
    pub fn advisories_for(&self, resource: &str) -> usize {
        self.advisories
            .iter()
            .filter(|advisory| advisory.resource == resource)
            .count()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.advisories.is_empty()
            && self.join_misses.is_empty()
            && self.malformed_fields == 0
            && self.rejected_rows == 0
            && self.skipped_csv_records == 0
    }
}
