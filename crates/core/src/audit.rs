//! Audit trail: append-only operation records.
//!
//! Every pipeline step produces exactly one `OperationRecord`. Records are
//! written through an [`AuditLog`] and never updated or deleted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Well-known operation types.
pub mod ops {
    pub const USER_CREATED: &str = "USER_CREATED";
    pub const USER_CREATION_FAILED: &str = "USER_CREATION_FAILED";
    pub const ASSESSMENT_GENERATED: &str = "ASSESSMENT_PROMPT_GENERATED";
    pub const ASSESSMENT_FAILED: &str = "ASSESSMENT_PROMPT_FAILED";
    pub const CONTEXT_FILES_ADDED: &str = "CONTEXT_FILES_ADDED";
    pub const CONTEXT_FILES_FAILED: &str = "CONTEXT_FILES_FAILED";
    pub const CONTEXT_AGGREGATED: &str = "CONTEXT_AGGREGATED";
    pub const CONTEXT_FAILED: &str = "CONTEXT_AGGREGATION_FAILED";
    pub const DESIGNER_PREPARED: &str = "DESIGNER_INPUT_PREPARED";
    pub const DESIGNER_FAILED: &str = "DESIGNER_INPUT_FAILED";
    pub const SEED_GENERATED: &str = "SEED_PROMPT_GENERATED";
    pub const SEED_FAILED: &str = "SEED_GENERATION_FAILED";
    pub const SEED_EXPORTED: &str = "SEED_EXPORTED";
    pub const SEED_EXPORT_FAILED: &str = "SEED_EXPORT_FAILED";
}

/// Outcome of a logged operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Success,
    Failed,
    /// Handed off to the external LLM; the step resumes later.
    PendingExternal,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::PendingExternal => "PENDING_EXTERNAL",
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            "PENDING_EXTERNAL" => Ok(Self::PendingExternal),
            other => Err(crate::Error::Validation(format!(
                "Unknown operation status: {other}"
            ))),
        }
    }
}

/// A persisted, immutable audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub pipeline_name: Option<String>,
    pub operation_type: String,
    pub input_params: Option<serde_json::Value>,
    pub output_ref: Option<serde_json::Value>,
    pub status: OperationStatus,
    pub notes: Option<String>,
}

/// The fields of a record about to be appended. The store assigns `id` and
/// `timestamp`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOperation {
    pub user_id: String,
    pub pipeline_name: Option<String>,
    pub operation_type: String,
    pub input_params: Option<serde_json::Value>,
    pub output_ref: Option<serde_json::Value>,
    pub status: OperationStatus,
    pub notes: Option<String>,
}

impl NewOperation {
    /// A `SUCCESS` operation with no params, outputs or notes.
    pub fn new(user_id: impl Into<String>, operation_type: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            pipeline_name: None,
            operation_type: operation_type.into(),
            input_params: None,
            output_ref: None,
            status: OperationStatus::Success,
            notes: None,
        }
    }

    pub fn pipeline(mut self, name: impl Into<String>) -> Self {
        self.pipeline_name = Some(name.into());
        self
    }

    pub fn input(mut self, params: serde_json::Value) -> Self {
        self.input_params = non_empty(params);
        self
    }

    pub fn output(mut self, output: serde_json::Value) -> Self {
        self.output_ref = non_empty(output);
        self
    }

    pub fn status(mut self, status: OperationStatus) -> Self {
        self.status = status;
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Materialize into a record with the store-assigned fields.
    pub fn into_record(self, id: i64, timestamp: DateTime<Utc>) -> OperationRecord {
        OperationRecord {
            id,
            timestamp,
            user_id: self.user_id,
            pipeline_name: self.pipeline_name,
            operation_type: self.operation_type,
            input_params: self.input_params,
            output_ref: self.output_ref,
            status: self.status,
            notes: self.notes,
        }
    }
}

/// Null and empty objects are stored as absent.
fn non_empty(value: serde_json::Value) -> Option<serde_json::Value> {
    match &value {
        serde_json::Value::Null => None,
        serde_json::Value::Object(map) if map.is_empty() => None,
        _ => Some(value),
    }
}

/// Append-only operation store.
///
/// Implementations: SQLite (durable) and in-memory (tests, dry runs).
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// The store name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Synchronously persist one record and return it with its id.
    async fn append(&self, op: NewOperation) -> crate::Result<OperationRecord>;

    /// All records for a user, newest first.
    async fn for_user(&self, user_id: &str) -> crate::Result<Vec<OperationRecord>>;

    /// Total number of records.
    async fn count(&self) -> crate::Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_wire_format() {
        assert_eq!(
            serde_json::to_string(&OperationStatus::PendingExternal).unwrap(),
            "\"PENDING_EXTERNAL\""
        );
        for s in [
            OperationStatus::Success,
            OperationStatus::Failed,
            OperationStatus::PendingExternal,
        ] {
            assert_eq!(s.as_str().parse::<OperationStatus>().unwrap(), s);
        }
        assert!("PENDING_LLM".parse::<OperationStatus>().is_err());
    }

    #[test]
    fn builder_drops_empty_payloads() {
        let op = NewOperation::new("u1", ops::USER_CREATED)
            .pipeline("p")
            .input(json!({}))
            .output(json!({"user_id": "u1"}));
        assert!(op.input_params.is_none());
        assert_eq!(op.output_ref, Some(json!({"user_id": "u1"})));
        assert_eq!(op.status, OperationStatus::Success);
    }

    #[test]
    fn into_record_keeps_fields() {
        let now = Utc::now();
        let record = NewOperation::new("u1", ops::SEED_FAILED)
            .status(OperationStatus::Failed)
            .notes("bad xml")
            .into_record(7, now);
        assert_eq!(record.id, 7);
        assert_eq!(record.timestamp, now);
        assert_eq!(record.notes.as_deref(), Some("bad xml"));
    }
}
