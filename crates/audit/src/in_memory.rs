//! In-memory audit store, for tests and dry runs.

use crate::sqlite::now_micros;
use async_trait::async_trait;
use spcf_core::{AuditLog, NewOperation, OperationRecord, Result};
use std::sync::Arc;
use tokio::sync::RwLock;

/// An audit log that keeps records in a Vec.
pub struct InMemoryAuditLog {
    records: Arc<RwLock<Vec<OperationRecord>>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append(&self, op: NewOperation) -> Result<OperationRecord> {
        let mut records = self.records.write().await;
        let id = records.last().map_or(1, |r| r.id + 1);
        let record = op.into_record(id, now_micros().0);
        records.push(record.clone());
        Ok(record)
    }

    async fn for_user(&self, user_id: &str) -> Result<Vec<OperationRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spcf_core::{OperationStatus, ops};

    #[tokio::test]
    async fn append_and_read_back() {
        let log = InMemoryAuditLog::new();
        let first = log.append(NewOperation::new("u1", ops::USER_CREATED)).await.unwrap();
        assert_eq!(first.id, 1);

        log.append(NewOperation::new("u2", ops::USER_CREATED)).await.unwrap();
        log.append(
            NewOperation::new("u1", ops::SEED_FAILED)
                .status(OperationStatus::Failed)
                .notes("bad xml"),
        )
        .await
        .unwrap();

        let records = log.for_user("u1").await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].operation_type, ops::SEED_FAILED);
        assert_eq!(records[0].id, 3);
        assert_eq!(records[1], first);
        assert_eq!(log.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn empty_log() {
        let log = InMemoryAuditLog::default();
        assert_eq!(log.name(), "in_memory");
        assert!(log.for_user("u1").await.unwrap().is_empty());
        assert_eq!(log.count().await.unwrap(), 0);
    }
}
