//! Comparison output - records, columns and the response envelope.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::error::{AcquireError, ExtractError};

/// Placeholder for a selected column a source does not have.
pub const NOT_AVAILABLE: &str = "N/A";

/// Failure category, stable across error message wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Timeout,
    Http,
    InvalidFormat,
    Corrupted,
    PageCountExceeded,
    NoContent,
    Blocked,
    ExtractionFailed,
}

/// Pipeline stage at which a source was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Acquisition,
    Normalization,
    Extraction,
}

/// A source that did not make it into the comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub url: String,
    pub stage: FailureStage,
    pub kind: ErrorKind,
    pub message: String,
}

impl SourceFailure {
    pub fn acquisition(url: impl Into<String>, error: &AcquireError) -> Self {
        Self {
            url: url.into(),
            stage: FailureStage::Acquisition,
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    pub fn normalization(url: impl Into<String>, error: &AcquireError) -> Self {
        Self {
            url: url.into(),
            stage: FailureStage::Normalization,
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    pub fn extraction(url: impl Into<String>, error: &ExtractError) -> Self {
        Self {
            url: url.into(),
            stage: FailureStage::Extraction,
            kind: ErrorKind::ExtractionFailed,
            message: error.to_string(),
        }
    }
}

/// Whether a record carries extracted values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Ok,
    Failed,
}

/// One row of the comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparableRecord {
    /// Source URL
    pub url: String,

    /// Manufacturer or supplier name
    pub entity_name: Option<String>,

    /// Part number, product name or service line
    pub item_identifier: Option<String>,

    /// Column key to value, or [`NOT_AVAILABLE`]
    pub specs: IndexMap<String, String>,

    /// Best-effort contact or inquiry page
    pub contact_url: Option<String>,

    pub status: RecordStatus,

    /// Present when the source never produced attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComparableRecord {
    /// Record for a source that never produced attributes.
    pub fn failed(url: impl Into<String>, columns: &[Column], error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            entity_name: None,
            item_identifier: None,
            specs: columns
                .iter()
                .map(|c| (c.key.clone(), NOT_AVAILABLE.to_string()))
                .collect(),
            contact_url: None,
            status: RecordStatus::Failed,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == RecordStatus::Ok
    }

    /// Number of columns with a real value.
    pub fn filled(&self) -> usize {
        self.specs.values().filter(|v| v.as_str() != NOT_AVAILABLE).count()
    }
}

/// A selected column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub key: String,
    pub display_name: String,

    /// Sources (among those compared) that had this attribute
    pub coverage: usize,
}

/// Overall result quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonStatus {
    /// Every candidate made it through without fallbacks
    Complete,

    /// A comparison was built, but sources were lost or a fallback ran
    Degraded,

    /// Too few documents to compare; raw attributes returned instead
    Uncompared,
}

/// Wall-clock time per pipeline stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTimings {
    #[serde(with = "duration_ms")]
    pub discover: Duration,
    #[serde(with = "duration_ms")]
    pub acquire: Duration,
    #[serde(with = "duration_ms")]
    pub normalize: Duration,
    #[serde(with = "duration_ms")]
    pub extract: Duration,
    #[serde(with = "duration_ms")]
    pub key_normalize: Duration,
    #[serde(with = "duration_ms")]
    pub select: Duration,
    #[serde(with = "duration_ms")]
    pub contact: Duration,
    #[serde(with = "duration_ms")]
    pub total: Duration,
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// The comparison table plus everything needed to judge it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResponse {
    pub request_id: Uuid,
    pub query: String,
    pub status: ComparisonStatus,

    /// Selected columns, in display order
    pub columns: Vec<Column>,

    /// Compared sources first, then extraction failures
    pub records: Vec<ComparableRecord>,

    /// Every source lost along the way
    pub failures: Vec<SourceFailure>,

    /// Human-readable notes about degraded behavior
    pub warnings: Vec<String>,

    /// Present in debug mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timings: Option<StageTimings>,

    pub created_at: DateTime<Utc>,
}

impl ComparisonResponse {
    /// Records that carry extracted values.
    pub fn ok_records(&self) -> impl Iterator<Item = &ComparableRecord> {
        self.records.iter().filter(|r| r.is_ok())
    }

    pub fn column_keys(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.key.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_record_fills_columns() {
        let columns = vec![Column {
            key: "voltage".into(),
            display_name: "Voltage".into(),
            coverage: 3,
        }];
        let record = ComparableRecord::failed("u", &columns, ExtractError::NoAttributes.to_string());

        assert_eq!(record.status, RecordStatus::Failed);
        assert_eq!(record.specs.get("voltage").map(String::as_str), Some(NOT_AVAILABLE));
        assert_eq!(record.filled(), 0);
        assert_eq!(record.error.as_deref(), Some("no attributes extracted"));
    }

    #[test]
    fn test_timings_serialize_as_millis() {
        let timings = StageTimings {
            total: Duration::from_millis(1500),
            ..Default::default()
        };
        let json = serde_json::to_value(&timings).unwrap();
        assert_eq!(json["total"], 1500);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&ComparisonStatus::Uncompared).unwrap();
        assert_eq!(json, "\"uncompared\"");
    }
}
