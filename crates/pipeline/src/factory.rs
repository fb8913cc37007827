//! The factory: named pipelines over the workspace, prompt and audit
//! components.
//!
//! Every step is awaited to completion and recorded before the next one
//! starts. Earlier steps are never rolled back when a later one fails.

use crate::step::Step;
use serde::Serialize;
use serde_json::json;
use spcf_audit::{UserSummary, summarize};
use spcf_config::FactoryConfig;
use spcf_core::{
    AuditLog, OperationRecord, OperationStatus, Result, SeedGraph, User, UserId, WorkspacePaths,
    ops,
};
use spcf_prompts::{DesignerExchange, ProcessedSeed, TemplateRenderer};
use spcf_workspace::{AggregatedContext, ContextAggregator, IdGenerator, WorkspaceManager};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub mod pipelines {
    pub const ONBOARD_NO_CONTEXT: &str = "onboard_new_user_no_context";
    pub const ONBOARD_WITH_CONTEXT: &str = "onboard_user_with_context_to_seed";
    pub const PREPARE_DESIGNER_INPUT: &str = "prepare_designer_input_for_user";
    pub const PROCESS_SEED: &str = "process_seed_from_designer_output";
    pub const FULL_ONBOARDING: &str = "full_user_onboarding_with_context";
    pub const ADD_CONTEXT_FILES: &str = "add_context_files";
    pub const EXPORT_SEED: &str = "export_seed";
}

/// Context documents to place in a new workspace, by filename.
pub type ContextFiles = BTreeMap<String, String>;

/// Result of onboarding a user without context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Onboarded {
    pub user_id: UserId,
    pub workspace: WorkspacePaths,
    pub assessment_path: PathBuf,
}

/// A composed designer prompt waiting for an external model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignerHandoff {
    pub user_id: UserId,
    pub context_files: Vec<String>,
    pub designer_input: String,
}

/// Result of the end-to-end pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullOnboarding {
    pub user_id: UserId,
    pub assessment_path: PathBuf,
    pub context_paths: Vec<PathBuf>,
    pub seed: ProcessedSeed,
}

pub struct Factory {
    config: Arc<FactoryConfig>,
    audit: Arc<dyn AuditLog>,
    workspaces: WorkspaceManager,
    ids: IdGenerator,
    context: ContextAggregator,
    templates: TemplateRenderer,
    designer: DesignerExchange,
}

impl Factory {
    pub fn new(config: FactoryConfig, audit: Arc<dyn AuditLog>) -> Self {
        let config = Arc::new(config);
        let workspaces = WorkspaceManager::new(config.clone());
        let templates = TemplateRenderer::new(config.clone(), workspaces.clone());
        Self {
            ids: IdGenerator::new(&config),
            context: ContextAggregator::new(workspaces.clone()),
            designer: DesignerExchange::new(templates.clone(), workspaces.clone()),
            templates,
            workspaces,
            audit,
            config,
        }
    }

    /// Replace the id generator (e.g. with a deterministic salt source).
    pub fn with_id_generator(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    pub fn audit(&self) -> &dyn AuditLog {
        self.audit.as_ref()
    }

    pub fn workspaces(&self) -> &WorkspaceManager {
        &self.workspaces
    }

    pub fn templates(&self) -> &TemplateRenderer {
        &self.templates
    }

    pub fn designer(&self) -> &DesignerExchange {
        &self.designer
    }

    // ── Steps ───────────────────────────────────────────────────────────

    async fn create_user_step(&self, pipeline: &'static str, identifier: &str) -> Result<User> {
        let created = self.ids.create_id(identifier).and_then(|id| {
            let user = User::new(id, identifier);
            self.workspaces.provision_user(&user)?;
            Ok(user)
        });

        // No id exists when creation fails; record under the identifier.
        let subject = match &created {
            Ok(user) => user.id.to_string(),
            Err(_) => identifier.to_string(),
        };
        let step = Step {
            pipeline,
            subject: &subject,
            success: ops::USER_CREATED,
            failure: ops::USER_CREATION_FAILED,
            input: json!({ "user_identifier": identifier }),
        };
        step.record(self.audit(), created, OperationStatus::Success, |u| {
            json!({ "user_id": u.id })
        })
        .await
    }

    async fn assessment_step(&self, pipeline: &'static str, user_id: &UserId) -> Result<PathBuf> {
        let step = Step {
            pipeline,
            subject: user_id.as_str(),
            success: ops::ASSESSMENT_GENERATED,
            failure: ops::ASSESSMENT_FAILED,
            input: json!({}),
        };
        let result = self.templates.generate_assessment(user_id);
        step.record(self.audit(), result, OperationStatus::Success, |p| {
            json!({ "assessment_path": p })
        })
        .await
    }

    async fn context_step(
        &self,
        pipeline: &'static str,
        user_id: &UserId,
    ) -> Result<AggregatedContext> {
        let step = Step {
            pipeline,
            subject: user_id.as_str(),
            success: ops::CONTEXT_AGGREGATED,
            failure: ops::CONTEXT_FAILED,
            input: json!({}),
        };
        let result = self.context.aggregate(user_id);
        step.record(self.audit(), result, OperationStatus::Success, |c| {
            json!({ "context_length": c.text.len(), "files_count": c.files.len() })
        })
        .await
    }

    async fn designer_input_step(
        &self,
        pipeline: &'static str,
        user_id: &UserId,
        context: &AggregatedContext,
        status: OperationStatus,
    ) -> Result<String> {
        let step = Step {
            pipeline,
            subject: user_id.as_str(),
            success: ops::DESIGNER_PREPARED,
            failure: ops::DESIGNER_FAILED,
            input: json!({ "context_length": context.text.len() }),
        };
        let result = self.designer.prepare_input(&context.text);
        step.record(self.audit(), result, status, |input| {
            json!({
                "designer_input_length": input.len(),
                "context_included": !context.text.is_empty(),
            })
        })
        .await
    }

    async fn seed_step(
        &self,
        pipeline: &'static str,
        user_id: &UserId,
        response: &str,
    ) -> Result<ProcessedSeed> {
        let step = Step {
            pipeline,
            subject: user_id.as_str(),
            success: ops::SEED_GENERATED,
            failure: ops::SEED_FAILED,
            input: json!({ "designer_response_length": response.len() }),
        };
        let result = self.designer.process_output(response, user_id);
        step.record(self.audit(), result, OperationStatus::Success, |seed| {
            json!({
                "seed_path": seed.path,
                "node_count": seed.graph.as_ref().map_or(0, |g| g.nodes.len()),
            })
        })
        .await
    }

    async fn context_files_step(
        &self,
        pipeline: &'static str,
        user_id: &UserId,
        files: &ContextFiles,
    ) -> Result<Vec<PathBuf>> {
        let step = Step {
            pipeline,
            subject: user_id.as_str(),
            success: ops::CONTEXT_FILES_ADDED,
            failure: ops::CONTEXT_FILES_FAILED,
            input: json!({ "filenames": files.keys().collect::<Vec<_>>() }),
        };
        let result = files
            .iter()
            .map(|(name, content)| self.workspaces.add_context_file(user_id, name, content))
            .collect::<Result<Vec<_>>>();
        step.record(self.audit(), result, OperationStatus::Success, |paths| {
            json!({ "files_count": paths.len() })
        })
        .await
    }

    // ── Pipelines ───────────────────────────────────────────────────────

    /// Create a user and render their assessment prompt.
    pub async fn onboard_new_user_no_context(&self, identifier: &str) -> Result<Onboarded> {
        let pipeline = pipelines::ONBOARD_NO_CONTEXT;
        let user = self.create_user_step(pipeline, identifier).await?;
        let assessment_path = self.assessment_step(pipeline, &user.id).await?;

        info!(pipeline, user_id = %user.id, "Pipeline complete");
        Ok(Onboarded {
            workspace: self.workspaces.resolve(&user.id)?,
            user_id: user.id,
            assessment_path,
        })
    }

    /// Create a user and compose the designer prompt from their context.
    ///
    /// The prompt is handed to an external model; its step is recorded as
    /// `PENDING_EXTERNAL`.
    pub async fn onboard_user_with_context_to_seed(&self, identifier: &str) -> Result<DesignerHandoff> {
        let pipeline = pipelines::ONBOARD_WITH_CONTEXT;
        let user = self.create_user_step(pipeline, identifier).await?;
        self.handoff(pipeline, user.id).await
    }

    /// Compose the designer prompt for an existing user, typically after
    /// context documents have been added.
    pub async fn prepare_designer_input_for_user(&self, user_id: &UserId) -> Result<DesignerHandoff> {
        self.handoff(pipelines::PREPARE_DESIGNER_INPUT, user_id.clone()).await
    }

    async fn handoff(&self, pipeline: &'static str, user_id: UserId) -> Result<DesignerHandoff> {
        let context = self.context_step(pipeline, &user_id).await?;
        let designer_input = self
            .designer_input_step(pipeline, &user_id, &context, OperationStatus::PendingExternal)
            .await?;

        info!(pipeline, user_id = %user_id, "Designer input ready for external processing");
        Ok(DesignerHandoff {
            user_id,
            context_files: context.files,
            designer_input,
        })
    }

    /// Store a designer reply as the user's seed prompt.
    pub async fn process_seed_from_designer_output(
        &self,
        user_id: &UserId,
        response: &str,
    ) -> Result<ProcessedSeed> {
        let pipeline = pipelines::PROCESS_SEED;
        let seed = self.seed_step(pipeline, user_id, response).await?;
        info!(pipeline, user_id = %user_id, path = %seed.path.display(), "Pipeline complete");
        Ok(seed)
    }

    /// Run every step with all inputs in hand.
    pub async fn full_user_onboarding_with_context(
        &self,
        identifier: &str,
        context_files: &ContextFiles,
        response: &str,
    ) -> Result<FullOnboarding> {
        let pipeline = pipelines::FULL_ONBOARDING;
        let user = self.create_user_step(pipeline, identifier).await?;
        let assessment_path = self.assessment_step(pipeline, &user.id).await?;
        let context_paths = self.context_files_step(pipeline, &user.id, context_files).await?;
        let context = self.context_step(pipeline, &user.id).await?;
        self.designer_input_step(pipeline, &user.id, &context, OperationStatus::Success)
            .await?;
        let seed = self.seed_step(pipeline, &user.id, response).await?;

        info!(pipeline, user_id = %user.id, "Pipeline complete");
        Ok(FullOnboarding {
            user_id: user.id,
            assessment_path,
            context_paths,
            seed,
        })
    }

    // ── Queries and helpers ─────────────────────────────────────────────

    pub async fn summary(&self, user_id: &UserId) -> Result<UserSummary> {
        summarize(self.audit(), &self.workspaces, user_id).await
    }

    /// The user's audit records, newest first.
    pub async fn operations(&self, user_id: &UserId) -> Result<Vec<OperationRecord>> {
        self.audit.for_user(user_id.as_str()).await
    }

    pub fn list_users(&self) -> Result<Vec<UserId>> {
        self.workspaces.list_users()
    }

    /// Place context documents in an existing workspace as one logged step.
    pub async fn add_context_files(
        &self,
        user_id: &UserId,
        files: &ContextFiles,
    ) -> Result<Vec<PathBuf>> {
        self.context_files_step(pipelines::ADD_CONTEXT_FILES, user_id, files)
            .await
    }

    pub async fn add_context_file(
        &self,
        user_id: &UserId,
        filename: &str,
        content: &str,
    ) -> Result<PathBuf> {
        let files = ContextFiles::from([(filename.to_string(), content.to_string())]);
        let mut paths = self.add_context_files(user_id, &files).await?;
        paths.pop().ok_or_else(|| {
            spcf_core::Error::Validation(format!("No context file written for '{filename}'"))
        })
    }

    pub fn extract_seed_data(&self, path: &Path) -> Option<SeedGraph> {
        self.designer.extract_seed_data(path)
    }

    /// Dump a seed artifact's data as JSON into `interaction_dumps`.
    pub async fn export_seed(&self, user_id: &UserId, seed_path: &Path) -> Result<PathBuf> {
        let step = Step {
            pipeline: pipelines::EXPORT_SEED,
            subject: user_id.as_str(),
            success: ops::SEED_EXPORTED,
            failure: ops::SEED_EXPORT_FAILED,
            input: json!({ "seed_path": seed_path }),
        };
        let result = self.designer.export_seed(user_id, seed_path);
        step.record(self.audit(), result, OperationStatus::Success, |p| {
            json!({ "export_path": p })
        })
        .await
    }
}
