//! Workspace manager: provisions and resolves per-user storage areas.
//!
//! Layout under the users directory:
//!
//! ```text
//! <users_dir>/<user_id>/
//!     user.json
//!     context/  prompts/  seeds/  feedback/  interaction_dumps/
//! ```
//!
//! Provisioning builds the whole tree inside a hidden staging directory and
//! renames it into place, so a workspace is either complete or absent.

use spcf_config::FactoryConfig;
use spcf_core::{Error, Result, User, UserId, WorkspaceArea, WorkspacePaths};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Name of the per-user record file at the workspace base.
pub const USER_RECORD_FILE: &str = "user.json";

const STAGING_PREFIX: &str = ".staging-";

#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    config: Arc<FactoryConfig>,
}

impl WorkspaceManager {
    pub fn new(config: Arc<FactoryConfig>) -> Self {
        Self { config }
    }

    pub fn users_dir(&self) -> PathBuf {
        self.config.users_dir()
    }

    /// Whether `filename` has a recognized context extension.
    pub fn is_context_file(&self, filename: &str) -> bool {
        self.config.is_context_file(filename)
    }

    /// Create the full workspace for `user_id`.
    pub fn provision(&self, user_id: &UserId) -> Result<WorkspacePaths> {
        self.provision_inner(user_id, None)
    }

    /// Create the workspace and store `user` as its record, in one step.
    pub fn provision_user(&self, user: &User) -> Result<WorkspacePaths> {
        self.provision_inner(&user.id, Some(user))
    }

    fn provision_inner(&self, user_id: &UserId, record: Option<&User>) -> Result<WorkspacePaths> {
        let users_dir = self.users_dir();
        let final_paths = WorkspacePaths::new(&users_dir, user_id);
        if final_paths.base.exists() {
            return Err(Error::Duplicate(format!(
                "Workspace already exists for user_id: {user_id}"
            )));
        }

        fs::create_dir_all(&users_dir)
            .map_err(|e| Error::io("creating users directory", &users_dir, e))?;

        let nonce = rand::random::<u32>();
        let staging_dir = users_dir.join(format!("{STAGING_PREFIX}{user_id}-{nonce:08x}"));

        Self::stage_and_publish(&staging_dir, &final_paths.base, user_id, record)?;

        info!(user_id = %user_id, base = %final_paths.base.display(), "Workspace provisioned");
        Ok(final_paths)
    }

    /// Build the workspace in `staging_dir` and rename it to `base`. On any
    /// failure the staging directory is removed and `base` is left untouched.
    fn stage_and_publish(
        staging_dir: &Path,
        base: &Path,
        user_id: &UserId,
        record: Option<&User>,
    ) -> Result<()> {
        if let Err(e) = Self::build_staging(staging_dir, user_id, record) {
            let _ = fs::remove_dir_all(staging_dir);
            return Err(e);
        }

        if let Err(e) = fs::rename(staging_dir, base) {
            let _ = fs::remove_dir_all(staging_dir);
            if base.exists() {
                return Err(Error::Duplicate(format!(
                    "Workspace already exists for user_id: {user_id}"
                )));
            }
            return Err(Error::io("publishing workspace", base, e));
        }
        Ok(())
    }

    fn build_staging(staging_dir: &Path, user_id: &UserId, record: Option<&User>) -> Result<()> {
        fs::create_dir(staging_dir)
            .map_err(|e| Error::io("creating staging directory", staging_dir, e))?;

        let staged = WorkspacePaths::rooted_at(user_id.clone(), staging_dir.to_path_buf());
        for (area, path) in staged.areas() {
            fs::create_dir(path)
                .map_err(|e| Error::io(format!("creating {area} area"), path, e))?;
        }

        if let Some(user) = record {
            let path = staging_dir.join(USER_RECORD_FILE);
            let json = serde_json::to_string_pretty(user)?;
            fs::write(&path, json).map_err(|e| Error::io("writing user record", &path, e))?;
        }

        Ok(())
    }

    /// Resolve the paths of an existing workspace.
    pub fn resolve(&self, user_id: &UserId) -> Result<WorkspacePaths> {
        let paths = WorkspacePaths::new(&self.users_dir(), user_id);
        if !paths.base.is_dir() {
            return Err(Error::NotFound(format!(
                "User directory not found for user_id: {user_id}"
            )));
        }
        Ok(paths)
    }

    pub fn exists(&self, user_id: &UserId) -> bool {
        self.users_dir().join(user_id.as_str()).is_dir()
    }

    /// All known users, sorted. Staging leftovers are skipped.
    pub fn list_users(&self) -> Result<Vec<UserId>> {
        let users_dir = self.users_dir();
        if !users_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&users_dir)
            .map_err(|e| Error::io("listing users", &users_dir, e))?;

        let mut users: Vec<UserId> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .filter(|name| !name.starts_with('.'))
            .filter_map(|name| match UserId::parse(&name) {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!(dir = %name, "Skipping directory that is not a user id");
                    None
                }
            })
            .collect();

        users.sort();
        Ok(users)
    }

    /// Read the stored user record, if the workspace has one.
    pub fn read_user(&self, user_id: &UserId) -> Result<Option<User>> {
        let paths = self.resolve(user_id)?;
        let path = paths.base.join(USER_RECORD_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content =
            fs::read_to_string(&path).map_err(|e| Error::io("reading user record", &path, e))?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Place a context document in the user's context area.
    pub fn add_context_file(&self, user_id: &UserId, filename: &str, content: &str) -> Result<PathBuf> {
        let filename = self.sanitize_context_filename(filename)?;
        let paths = self.resolve(user_id)?;
        let path = paths.area(WorkspaceArea::Context).join(filename);
        fs::write(&path, content).map_err(|e| Error::io("writing context file", &path, e))?;
        debug!(user_id = %user_id, file = %filename, bytes = content.len(), "Context file added");
        Ok(path)
    }

    /// Accept only plain filenames with a recognized context extension.
    pub fn sanitize_context_filename<'a>(&self, filename: &'a str) -> Result<&'a str> {
        let name = filename.trim();
        let reject = |why: &str| Err(Error::Validation(format!("Invalid filename '{filename}': {why}")));

        if name.is_empty() {
            return reject("empty");
        }
        if name.contains(['/', '\\', '\0']) {
            return reject("path separators are not allowed");
        }
        if name.contains("..") {
            return reject("parent references are not allowed");
        }
        if name.starts_with('.') {
            return reject("hidden files are not allowed");
        }
        if !self.config.is_context_file(name) {
            return reject(&format!(
                "extension must be one of: {}",
                self.config.context.extensions.join(", ")
            ));
        }
        Ok(name)
    }
}
