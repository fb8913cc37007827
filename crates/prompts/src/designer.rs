//! Designer exchange: composing the designer prompt and accepting its reply.
//!
//! Composing is pure apart from the template read. Sending the prompt to a
//! model happens elsewhere. A reply is validated completely before anything
//! touches the disk, so a rejected reply leaves no artifact behind.

use crate::artifact::{self, ArtifactName};
use crate::seed_doc;
use crate::templates::{CONTEXT_PLACEHOLDER, PROMPT_EXTENSION, TemplateRenderer};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use spcf_core::{Error, Result, SeedGraph, UserId, WorkspaceArea};
use spcf_workspace::WorkspaceManager;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const SEED_PREFIX: &str = "seed_prompt";
pub const EXPORT_PREFIX: &str = "seed_export";
pub const GENERATED_BY: &str = "synai_designer";

/// A persisted designer reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedSeed {
    pub path: PathBuf,
    /// Seed data found in the reply, if it carried any.
    pub graph: Option<SeedGraph>,
}

#[derive(Debug, Clone)]
pub struct DesignerExchange {
    templates: TemplateRenderer,
    workspaces: WorkspaceManager,
}

impl DesignerExchange {
    pub fn new(templates: TemplateRenderer, workspaces: WorkspaceManager) -> Self {
        Self {
            templates,
            workspaces,
        }
    }

    fn fill_target(&self) -> u32 {
        self.templates.config().seed.area_fill_target
    }

    /// Build the designer prompt around an aggregated context.
    pub fn prepare_input(&self, context: &str) -> Result<String> {
        let template = self.templates.load(&self.templates.config().templates.designer)?;
        Ok(template.replace(CONTEXT_PLACEHOLDER, context))
    }

    /// Check a designer reply without storing it.
    pub fn validate(&self, response: &str) -> Result<()> {
        let doc = seed_doc::parse(response)?;
        seed_doc::extract(&doc, self.fill_target())?;
        Ok(())
    }

    /// Validate a designer reply, stamp it, and store it as a seed prompt.
    pub fn process_output(&self, response: &str, user_id: &UserId) -> Result<ProcessedSeed> {
        let doc = seed_doc::parse(response)?;
        let graph = seed_doc::extract(&doc, self.fill_target())?;
        let paths = self.workspaces.resolve(user_id)?;

        let generated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let stamped = seed_doc::stamp_metadata(
            response,
            &doc,
            &[
                ("generated_at", generated_at.as_str()),
                ("generated_by", GENERATED_BY),
                ("user_id", user_id.as_str()),
            ],
        );

        let name = ArtifactName {
            prefix: SEED_PREFIX,
            extension: PROMPT_EXTENSION,
            hash_seed: user_id.as_str(),
            hash_length: self.templates.config().templates.short_hash_length,
        };
        let path = artifact::write_new(paths.area(WorkspaceArea::Seeds), name, |_| stamped.clone())?;

        info!(
            user_id = %user_id,
            path = %path.display(),
            nodes = graph.as_ref().map_or(0, |g| g.nodes.len()),
            "Seed prompt stored"
        );
        Ok(ProcessedSeed { path, graph })
    }

    /// Re-read the seed data from a stored artifact.
    ///
    /// Returns `None` when the file is unreadable, is not designer output,
    /// or carries no seed payload.
    pub fn extract_seed_data(&self, path: &Path) -> Option<SeedGraph> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Seed artifact unreadable");
                return None;
            }
        };

        let doc = match seed_doc::parse(&text) {
            Ok(doc) => doc,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Seed artifact not parseable");
                return None;
            }
        };

        match seed_doc::extract(&doc, self.fill_target()) {
            Ok(graph) => graph,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Seed artifact has malformed seed data");
                None
            }
        }
    }

    /// Write the seed data of `seed_path` as JSON into the user's
    /// interaction dumps.
    pub fn export_seed(&self, user_id: &UserId, seed_path: &Path) -> Result<PathBuf> {
        let graph = self.extract_seed_data(seed_path).ok_or_else(|| {
            Error::NotFound(format!("No seed data in {}", seed_path.display()))
        })?;
        let paths = self.workspaces.resolve(user_id)?;
        let json = serde_json::to_string_pretty(&graph)?;

        let name = ArtifactName {
            prefix: EXPORT_PREFIX,
            extension: "json",
            hash_seed: user_id.as_str(),
            hash_length: self.templates.config().templates.short_hash_length,
        };
        let path = artifact::write_new(paths.area(WorkspaceArea::InteractionDumps), name, |_| json.clone())?;

        info!(user_id = %user_id, path = %path.display(), nodes = graph.nodes.len(), "Seed exported");
        Ok(path)
    }
}
