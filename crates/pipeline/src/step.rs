//! Step recording: run one pipeline step and append its audit record.

use serde_json::Value;
use spcf_core::{AuditLog, NewOperation, OperationStatus, Result};
use tracing::{debug, warn};

/// Audit identity of one step.
pub(crate) struct Step<'a> {
    pub pipeline: &'static str,
    /// The user id, or the human identifier before one exists.
    pub subject: &'a str,
    pub success: &'static str,
    pub failure: &'static str,
    pub input: Value,
}

impl Step<'_> {
    /// Record the outcome of `result`.
    ///
    /// On success one record with `status` is appended before the value is
    /// handed back. On failure a `FAILED` record carrying the error text is
    /// appended and the original error is returned.
    pub async fn record<T>(
        self,
        audit: &dyn AuditLog,
        result: Result<T>,
        status: OperationStatus,
        output: impl FnOnce(&T) -> Value,
    ) -> Result<T> {
        match result {
            Ok(value) => {
                let mut op = NewOperation::new(self.subject, self.success)
                    .pipeline(self.pipeline)
                    .input(self.input)
                    .output(output(&value))
                    .status(status);
                if status == OperationStatus::PendingExternal {
                    op = op.notes("Ready for external designer processing");
                }
                audit.append(op).await?;
                debug!(pipeline = self.pipeline, step = self.success, "Step recorded");
                Ok(value)
            }
            Err(err) => {
                let op = NewOperation::new(self.subject, self.failure)
                    .pipeline(self.pipeline)
                    .input(self.input)
                    .status(OperationStatus::Failed)
                    .notes(format!("Error: {err}"));
                if let Err(log_err) = audit.append(op).await {
                    warn!(
                        pipeline = self.pipeline,
                        step = self.failure,
                        error = %log_err,
                        "Failed to record step failure"
                    );
                }
                warn!(pipeline = self.pipeline, step = self.failure, error = %err, "Step failed");
                Err(err)
            }
        }
    }
}
