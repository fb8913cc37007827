//! SQLite audit store.
//!
//! One append-only table, `operations_log`, indexed on `user_id` and
//! `timestamp`. Timestamps are RFC 3339 UTC strings with microseconds, so
//! lexical order matches time order. JSON payloads are stored as text.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use spcf_core::{AuditLog, Error, NewOperation, OperationRecord, OperationStatus, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// A durable audit log backed by a single SQLite file.
pub struct SqliteAuditLog {
    pool: SqlitePool,
}

impl SqliteAuditLog {
    /// Open (or create) the audit database at `url`.
    ///
    /// Pass `"sqlite::memory:"` for an ephemeral database (useful for tests).
    pub async fn new(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| Error::Storage(format!("Invalid SQLite path: {e}")))?;
        Self::connect(options, url).await
    }

    /// Open the audit database file at `path`, creating parent directories.
    ///
    /// The path is handed to SQLite as-is, never parsed as a URL.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::io("creating database directory", parent, e))?;
        }
        let options = SqliteConnectOptions::new().filename(path);
        Self::connect(options, &path.display().to_string()).await
    }

    async fn connect(options: SqliteConnectOptions, location: &str) -> Result<Self> {
        let options = options
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // A single connection serializes appends and keeps `:memory:`
        // databases shared across calls.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| Error::Storage(format!("Failed to open SQLite: {e}")))?;

        let log = Self { pool };
        log.run_migrations().await?;
        info!("SQLite audit log initialized at {location}");
        Ok(log)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS operations_log (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp         TEXT NOT NULL,
                user_id           TEXT NOT NULL,
                pipeline_name     TEXT,
                operation_type    TEXT NOT NULL,
                input_params_json TEXT,
                output_ref_json   TEXT,
                status            TEXT NOT NULL,
                notes             TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("operations_log table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_operations_user_id ON operations_log(user_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("user_id index: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_operations_timestamp ON operations_log(timestamp)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("timestamp index: {e}")))?;

        debug!("SQLite audit migrations complete");
        Ok(())
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<OperationRecord> {
        let column = |e: sqlx::Error| Error::Storage(format!("Reading audit row: {e}"));

        let timestamp: String = row.try_get("timestamp").map_err(column)?;
        let timestamp = DateTime::parse_from_rfc3339(&timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| Error::Storage(format!("Bad timestamp '{timestamp}': {e}")))?;

        let status: String = row.try_get("status").map_err(column)?;
        let input: Option<String> = row.try_get("input_params_json").map_err(column)?;
        let output: Option<String> = row.try_get("output_ref_json").map_err(column)?;

        Ok(OperationRecord {
            id: row.try_get("id").map_err(column)?,
            timestamp,
            user_id: row.try_get("user_id").map_err(column)?,
            pipeline_name: row.try_get("pipeline_name").map_err(column)?,
            operation_type: row.try_get("operation_type").map_err(column)?,
            input_params: input.as_deref().map(serde_json::from_str).transpose()?,
            output_ref: output.as_deref().map(serde_json::from_str).transpose()?,
            status: OperationStatus::from_str(&status)?,
            notes: row.try_get("notes").map_err(column)?,
        })
    }
}

/// Current time, truncated to what the store keeps.
pub(crate) fn now_micros() -> (DateTime<Utc>, String) {
    let text = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
    let parsed = DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());
    (parsed, text)
}

#[async_trait]
impl AuditLog for SqliteAuditLog {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn append(&self, op: NewOperation) -> Result<OperationRecord> {
        let (timestamp, timestamp_text) = now_micros();
        let input = op.input_params.as_ref().map(serde_json::to_string).transpose()?;
        let output = op.output_ref.as_ref().map(serde_json::to_string).transpose()?;

        let result = sqlx::query(
            r#"
            INSERT INTO operations_log
                (timestamp, user_id, pipeline_name, operation_type,
                 input_params_json, output_ref_json, status, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&timestamp_text)
        .bind(&op.user_id)
        .bind(&op.pipeline_name)
        .bind(&op.operation_type)
        .bind(&input)
        .bind(&output)
        .bind(op.status.as_str())
        .bind(&op.notes)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("INSERT failed: {e}")))?;

        let id = result.last_insert_rowid();
        debug!(
            id,
            user_id = %op.user_id,
            operation = %op.operation_type,
            status = %op.status,
            "Operation logged"
        );
        Ok(op.into_record(id, timestamp))
    }

    async fn for_user(&self, user_id: &str) -> Result<Vec<OperationRecord>> {
        let rows = sqlx::query("SELECT * FROM operations_log WHERE user_id = ?1 ORDER BY id DESC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("Query failed: {e}")))?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn count(&self) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM operations_log")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("Count failed: {e}")))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| Error::Storage(format!("Count column: {e}")))?;
        Ok(count as usize)
    }
}
