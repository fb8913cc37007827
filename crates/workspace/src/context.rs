//! Context aggregation: concatenate a user's context documents.
//!
//! Recognized files (by extension) are read in ascending filename order so
//! the same directory always produces the same string. Each document gets a
//! header naming its file:
//!
//! ```text
//! ### Context from goals.md ###
//! ----------------------------
//! <content>
//! ```

use crate::manager::WorkspaceManager;
use serde::Serialize;
use spcf_core::{Error, Result, UserId};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// The aggregated context plus the files it was built from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedContext {
    pub text: String,
    pub files: Vec<String>,
}

impl AggregatedContext {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ContextAggregator {
    workspaces: WorkspaceManager,
}

impl ContextAggregator {
    pub fn new(workspaces: WorkspaceManager) -> Self {
        Self { workspaces }
    }

    /// Aggregate every recognized context document for `user_id`.
    ///
    /// An empty context area yields an empty string, not an error.
    pub fn aggregate(&self, user_id: &UserId) -> Result<AggregatedContext> {
        let context_dir = self
            .workspaces
            .users_dir()
            .join(user_id.as_str())
            .join(spcf_core::WorkspaceArea::Context.as_str());

        if !context_dir.is_dir() {
            return Err(Error::NotFound(format!(
                "Context directory not found for user_id: {user_id}"
            )));
        }

        let entries = fs::read_dir(&context_dir)
            .map_err(|e| Error::io("listing context directory", &context_dir, e))?;

        let mut files: Vec<(String, PathBuf)> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .filter_map(|p| {
                let name = p.file_name()?.to_str()?.to_string();
                Some((name, p))
            })
            .filter(|(name, _)| self.workspaces.is_context_file(name))
            .collect();

        // Sort for deterministic ordering
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let mut sections = Vec::with_capacity(files.len());
        for (name, path) in &files {
            let content = fs::read_to_string(path)
                .map_err(|e| Error::io("reading context file", path, e))?;
            let header = format!("### Context from {name} ###");
            let separator = "-".repeat(header.len());
            sections.push(format!("{header}\n{separator}\n{content}"));
        }

        debug!(user_id = %user_id, files = files.len(), "Context aggregated");
        Ok(AggregatedContext {
            text: sections.join("\n\n"),
            files: files.into_iter().map(|(name, _)| name).collect(),
        })
    }
}
