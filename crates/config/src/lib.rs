//! Configuration loading, validation, and management for SPCF.
//!
//! Loads configuration from `<root>/spcf.toml` with environment variable
//! overrides, resolves relative paths against the root, and validates all
//! settings before anything else runs. The core crates only ever see the
//! resulting [`FactoryConfig`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the config file looked up in the project root.
pub const CONFIG_FILE: &str = "spcf.toml";

/// The root configuration structure.
///
/// Maps directly to `spcf.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactoryConfig {
    /// Storage locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Context document recognition
    #[serde(default)]
    pub context: ContextConfig,

    /// User id generation
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Base prompt templates
    #[serde(default)]
    pub templates: TemplatesConfig,

    /// Seed graph metrics
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root of all factory data; users live under `<data_dir>/users`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Audit database; defaults to `<data_dir>/spcf.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,

    /// Directory holding base prompt templates.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_templates_dir() -> PathBuf {
    PathBuf::from("base_prompts")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            db_path: None,
            templates_dir: default_templates_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Recognized context file extensions, without the dot.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_extensions() -> Vec<String> {
    vec!["txt".into(), "md".into()]
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Length of generated user ids, in hex characters.
    #[serde(default = "default_id_length")]
    pub id_length: usize,

    /// How many candidates to try before giving up on a collision.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_id_length() -> usize {
    16
}
fn default_max_attempts() -> u32 {
    5
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            id_length: default_id_length(),
            max_attempts: default_max_attempts(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplatesConfig {
    #[serde(default = "default_assessment_template")]
    pub assessment: String,

    #[serde(default = "default_designer_template")]
    pub designer: String,

    /// Length of the generation hash embedded in artifact filenames.
    #[serde(default = "default_short_hash_length")]
    pub short_hash_length: usize,
}

fn default_assessment_template() -> String {
    "synai_assessment.xml".into()
}
fn default_designer_template() -> String {
    "synai_designer.xml".into()
}
fn default_short_hash_length() -> usize {
    8
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            assessment: default_assessment_template(),
            designer: default_designer_template(),
            short_hash_length: default_short_hash_length(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Node count at which a formulation area counts as filled.
    #[serde(default = "default_area_fill_target")]
    pub area_fill_target: u32,
}

fn default_area_fill_target() -> u32 {
    3
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            area_fill_target: default_area_fill_target(),
        }
    }
}

impl FactoryConfig {
    /// Load configuration for the project rooted at `root`.
    ///
    /// Reads `<root>/spcf.toml` when present, then applies environment
    /// variable overrides (highest priority):
    /// - `SPCF_DATA_DIR`
    /// - `SPCF_DB_PATH`
    /// - `SPCF_BASE_PROMPTS_DIR`
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&root.join(CONFIG_FILE))?;

        if let Ok(dir) = std::env::var("SPCF_DATA_DIR") {
            config.paths.data_dir = PathBuf::from(dir);
        }
        if let Ok(db) = std::env::var("SPCF_DB_PATH") {
            config.paths.db_path = Some(PathBuf::from(db));
        }
        if let Ok(dir) = std::env::var("SPCF_BASE_PROMPTS_DIR") {
            config.paths.templates_dir = PathBuf::from(dir);
        }

        let config = config.rooted_at(root);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path. Relative paths are left
    /// as written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.normalize_extensions();
        config.validate()?;
        Ok(config)
    }

    /// Default configuration with every path anchored under `root`.
    pub fn with_root(root: &Path) -> Self {
        Self::default().rooted_at(root)
    }

    /// Make relative paths absolute against `root`.
    pub fn rooted_at(mut self, root: &Path) -> Self {
        let anchor = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                root.join(p)
            }
        };
        self.paths.data_dir = anchor(&self.paths.data_dir);
        self.paths.templates_dir = anchor(&self.paths.templates_dir);
        self.paths.db_path = self.paths.db_path.as_deref().map(anchor);
        self
    }

    /// Directory holding one subdirectory per user.
    pub fn users_dir(&self) -> PathBuf {
        self.paths.data_dir.join("users")
    }

    /// Audit database location.
    pub fn db_path(&self) -> PathBuf {
        self.paths
            .db_path
            .clone()
            .unwrap_or_else(|| self.paths.data_dir.join("spcf.db"))
    }

    pub fn templates_dir(&self) -> &Path {
        &self.paths.templates_dir
    }

    /// Whether `filename` carries a recognized context extension.
    pub fn is_context_file(&self, filename: &str) -> bool {
        Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.context.extensions.iter().any(|allowed| *allowed == ext)
            })
    }

    /// Strip leading dots and lowercase configured extensions.
    fn normalize_extensions(&mut self) {
        for ext in &mut self.context.extensions {
            *ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(8..=64).contains(&self.identity.id_length) {
            return Err(ConfigError::ValidationError(
                "identity.id_length must be between 8 and 64".into(),
            ));
        }

        if self.identity.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "identity.max_attempts must be at least 1".into(),
            ));
        }

        if !(4..=64).contains(&self.templates.short_hash_length) {
            return Err(ConfigError::ValidationError(
                "templates.short_hash_length must be between 4 and 64".into(),
            ));
        }

        if self.context.extensions.is_empty()
            || self.context.extensions.iter().any(|e| e.is_empty())
        {
            return Err(ConfigError::ValidationError(
                "context.extensions must list at least one non-empty extension".into(),
            ));
        }

        if self.seed.area_fill_target == 0 {
            return Err(ConfigError::ValidationError(
                "seed.area_fill_target must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            context: ContextConfig::default(),
            identity: IdentityConfig::default(),
            templates: TemplatesConfig::default(),
            seed: SeedConfig::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
