//! Per-user activity summary built from the workspace and the audit log.

use chrono::{DateTime, Utc};
use serde::Serialize;
use spcf_core::{AuditLog, Result, UserId};
use spcf_workspace::WorkspaceManager;
use std::collections::BTreeMap;
use std::fs;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub user_id: UserId,
    /// Files per workspace area, keyed by area name.
    pub file_counts: BTreeMap<String, usize>,
    /// Records per operation type.
    pub operation_counts: BTreeMap<String, usize>,
    pub total_operations: usize,
    pub last_activity: Option<DateTime<Utc>>,
}

/// Summarize one user. Read-only; a missing workspace yields no file counts.
pub async fn summarize(
    log: &dyn AuditLog,
    workspaces: &WorkspaceManager,
    user_id: &UserId,
) -> Result<UserSummary> {
    let mut file_counts = BTreeMap::new();
    if let Ok(paths) = workspaces.resolve(user_id) {
        for (area, dir) in paths.areas() {
            let count = fs::read_dir(dir)
                .map(|entries| {
                    entries
                        .filter_map(|e| e.ok())
                        .filter(|e| e.path().is_file())
                        .count()
                })
                .unwrap_or(0);
            file_counts.insert(area.as_str().to_string(), count);
        }
    }

    let records = log.for_user(user_id.as_str()).await?;
    let mut operation_counts = BTreeMap::new();
    for record in &records {
        *operation_counts
            .entry(record.operation_type.clone())
            .or_insert(0) += 1;
    }

    Ok(UserSummary {
        user_id: user_id.clone(),
        file_counts,
        operation_counts,
        total_operations: records.len(),
        last_activity: records.iter().map(|r| r.timestamp).max(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryAuditLog;
    use spcf_config::FactoryConfig;
    use spcf_core::{NewOperation, ops};
    use std::sync::Arc;

    #[tokio::test]
    async fn counts_files_and_operations() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = WorkspaceManager::new(Arc::new(FactoryConfig::with_root(tmp.path())));
        let id = UserId::parse("abcd1234").unwrap();
        ws.provision(&id).unwrap();
        ws.add_context_file(&id, "a.txt", "A").unwrap();
        ws.add_context_file(&id, "b.md", "B").unwrap();

        let log = InMemoryAuditLog::new();
        log.append(NewOperation::new("abcd1234", ops::USER_CREATED)).await.unwrap();
        log.append(NewOperation::new("abcd1234", ops::CONTEXT_AGGREGATED)).await.unwrap();
        let last = log
            .append(NewOperation::new("abcd1234", ops::CONTEXT_AGGREGATED))
            .await
            .unwrap();
        log.append(NewOperation::new("other", ops::USER_CREATED)).await.unwrap();

        let summary = summarize(&log, &ws, &id).await.unwrap();
        assert_eq!(summary.file_counts["context"], 2);
        assert_eq!(summary.file_counts["seeds"], 0);
        assert_eq!(summary.file_counts.len(), 5);
        assert_eq!(summary.operation_counts[ops::CONTEXT_AGGREGATED], 2);
        assert_eq!(summary.operation_counts[ops::USER_CREATED], 1);
        assert_eq!(summary.total_operations, 3);
        assert_eq!(summary.last_activity, Some(last.timestamp));
    }

    #[tokio::test]
    async fn unknown_user_is_empty_not_error() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = WorkspaceManager::new(Arc::new(FactoryConfig::with_root(tmp.path())));
        let id = UserId::parse("ghost").unwrap();

        let summary = summarize(&InMemoryAuditLog::new(), &ws, &id).await.unwrap();
        assert!(summary.file_counts.is_empty());
        assert_eq!(summary.total_operations, 0);
        assert!(summary.last_activity.is_none());
    }
}
