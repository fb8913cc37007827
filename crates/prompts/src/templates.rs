//! Base prompt templates and rendered prompt artifacts.
//!
//! Templates are opaque text with `{NAME}` substitution points. Rendering is
//! plain textual replacement; the result is stored as a collision-safe
//! artifact in one of the user's workspace areas.

use crate::artifact::{self, ArtifactName};
use spcf_config::FactoryConfig;
use spcf_core::{Error, Result, UserId, WorkspaceArea};
use spcf_workspace::WorkspaceManager;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub const USER_ID_PLACEHOLDER: &str = "{USER_ID}";
pub const GENERATION_HASH_PLACEHOLDER: &str = "{GENERATION_HASH}";
pub const CONTEXT_PLACEHOLDER: &str = "{CONTEXT}";

/// Extension of every rendered prompt artifact.
pub const PROMPT_EXTENSION: &str = "xml";

/// Caller supplied substitutions, keyed by placeholder name without braces.
pub type Substitutions = BTreeMap<String, String>;

const DEFAULT_ASSESSMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<synai>
  <persona>assessment</persona>
  <user_id>{USER_ID}</user_id>
  <generation>{GENERATION_HASH}</generation>
  <instructions>
    Conduct an initial, open-ended assessment conversation. Explore the
    person's current situation, values, and what they want to change.
  </instructions>
</synai>
"#;

const DEFAULT_DESIGNER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<synai>
  <persona>designer</persona>
  <instructions>
    Read the context below and produce a seed prompt. Respond with a single
    XML document whose root element is synai. Describe each extracted concept
    as a concept element holding id, content, area (A to H), weight, and an
    optional JSON array of linked concept ids in links.
  </instructions>
  <context>
<!-- BEGIN CONTEXT -->
{CONTEXT}
<!-- END CONTEXT -->
  </context>
</synai>
"#;

#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    config: Arc<FactoryConfig>,
    workspaces: WorkspaceManager,
}

impl TemplateRenderer {
    pub fn new(config: Arc<FactoryConfig>, workspaces: WorkspaceManager) -> Self {
        Self { config, workspaces }
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    fn template_path(&self, template_name: &str) -> Result<PathBuf> {
        let name = template_name.trim();
        if name.is_empty() || name.contains(['/', '\\', '\0']) || name.contains("..") {
            return Err(Error::Validation(format!(
                "Invalid template name: '{template_name}'"
            )));
        }
        Ok(self.config.templates_dir().join(name))
    }

    /// Read a base template by name.
    pub fn load(&self, template_name: &str) -> Result<String> {
        let path = self.template_path(template_name)?;
        if !path.is_file() {
            return Err(Error::NotFound(format!(
                "Base prompt template not found: {}",
                path.display()
            )));
        }
        fs::read_to_string(&path).map_err(|e| Error::io("reading template", &path, e))
    }

    /// Render `template_name` for `user_id` and save it into `area`.
    ///
    /// `area` is a workspace area name; unknown names are a validation error
    /// and nothing is written.
    pub fn render_and_save(
        &self,
        user_id: &UserId,
        template_name: &str,
        substitutions: &Substitutions,
        area: &str,
    ) -> Result<PathBuf> {
        let area: WorkspaceArea = area.parse()?;
        let template = self.load(template_name)?;
        let paths = self.workspaces.resolve(user_id)?;

        let name = ArtifactName {
            prefix: &artifact_prefix(template_name),
            extension: PROMPT_EXTENSION,
            hash_seed: user_id.as_str(),
            hash_length: self.config.templates.short_hash_length,
        };
        let path = artifact::write_new(paths.area(area), name, |hash| {
            render(&template, user_id, hash, substitutions)
        })?;

        info!(
            user_id = %user_id,
            template = template_name,
            area = %area,
            path = %path.display(),
            "Prompt rendered"
        );
        Ok(path)
    }

    /// Render the configured assessment template into the user's prompts area.
    pub fn generate_assessment(&self, user_id: &UserId) -> Result<PathBuf> {
        self.render_and_save(
            user_id,
            &self.config.templates.assessment,
            &Substitutions::new(),
            WorkspaceArea::Prompts.as_str(),
        )
    }

    /// Write the built-in templates under their configured names, skipping
    /// any that already exist. Returns the files written.
    pub fn install_defaults(&self) -> Result<Vec<PathBuf>> {
        let dir = self.config.templates_dir();
        fs::create_dir_all(dir).map_err(|e| Error::io("creating templates directory", dir, e))?;

        let defaults = [
            (&self.config.templates.assessment, DEFAULT_ASSESSMENT),
            (&self.config.templates.designer, DEFAULT_DESIGNER),
        ];

        let mut written = Vec::new();
        for (name, content) in defaults {
            let path = self.template_path(name)?;
            if path.exists() {
                debug!(path = %path.display(), "Template exists, leaving it alone");
                continue;
            }
            fs::write(&path, content).map_err(|e| Error::io("writing template", &path, e))?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Apply all substitutions to `template`.
///
/// Without a `{USER_ID}` point, an XML template gets a `user_id` comment
/// right after its declaration so the artifact still names its owner.
pub fn render(template: &str, user_id: &UserId, generation_hash: &str, substitutions: &Substitutions) -> String {
    let has_user_point = template.contains(USER_ID_PLACEHOLDER);

    // Single pass over the template: substituted values are never rescanned.
    let lookup = |token: &str| match token {
        USER_ID_PLACEHOLDER => Some(user_id.as_str()),
        GENERATION_HASH_PLACEHOLDER => Some(generation_hash),
        _ => substitutions
            .get(&token[1..token.len() - 1])
            .map(String::as_str),
    };

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let token = rest[open..]
            .find('}')
            .map(|close| &rest[open..=open + close])
            .filter(|token| !token[1..].contains('{'));
        match token.and_then(|t| lookup(t).map(|value| (t, value))) {
            Some((token, value)) => {
                out.push_str(value);
                rest = &rest[open + token.len()..];
            }
            None => {
                out.push('{');
                rest = &rest[open + 1..];
            }
        }
    }
    out.push_str(rest);

    if !has_user_point && out.starts_with("<?xml") {
        if let Some(end) = out.find("?>") {
            out.insert_str(end + 2, &format!("\n<!-- user_id: {user_id} -->"));
        }
    }
    out
}

/// Artifact prefix for a template: `synai_assessment.xml` → `assessment_prompt`.
pub fn artifact_prefix(template_name: &str) -> String {
    let stem = Path::new(template_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(template_name);
    let stem = stem.strip_prefix("synai_").unwrap_or(stem);
    format!("{stem}_prompt")
}
