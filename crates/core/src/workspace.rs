//! Workspace layout: the fixed set of per-user storage areas.

use crate::error::{Error, Result};
use crate::user::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// One of the five named storage areas inside a user's workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceArea {
    Context,
    Prompts,
    Seeds,
    Feedback,
    InteractionDumps,
}

impl WorkspaceArea {
    /// All areas, in directory-creation order.
    pub const ALL: [WorkspaceArea; 5] = [
        WorkspaceArea::Context,
        WorkspaceArea::Prompts,
        WorkspaceArea::Seeds,
        WorkspaceArea::Feedback,
        WorkspaceArea::InteractionDumps,
    ];

    /// The on-disk directory name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::Prompts => "prompts",
            Self::Seeds => "seeds",
            Self::Feedback => "feedback",
            Self::InteractionDumps => "interaction_dumps",
        }
    }
}

impl fmt::Display for WorkspaceArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkspaceArea {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|area| area.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|a| a.as_str()).collect();
                Error::Validation(format!(
                    "Invalid subfolder: {s}. Valid options are: {}",
                    valid.join(", ")
                ))
            })
    }
}

/// Resolved paths of one user's workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspacePaths {
    pub user_id: UserId,
    pub base: PathBuf,
    pub context: PathBuf,
    pub prompts: PathBuf,
    pub seeds: PathBuf,
    pub feedback: PathBuf,
    pub interaction_dumps: PathBuf,
}

impl WorkspacePaths {
    /// Compute the layout for `user_id` under `users_dir`. Touches nothing on disk.
    pub fn new(users_dir: &Path, user_id: &UserId) -> Self {
        let base = users_dir.join(user_id.as_str());
        Self::rooted_at(user_id.clone(), base)
    }

    /// Compute the layout for a workspace whose base directory is `base`.
    pub fn rooted_at(user_id: UserId, base: PathBuf) -> Self {
        Self {
            context: base.join(WorkspaceArea::Context.as_str()),
            prompts: base.join(WorkspaceArea::Prompts.as_str()),
            seeds: base.join(WorkspaceArea::Seeds.as_str()),
            feedback: base.join(WorkspaceArea::Feedback.as_str()),
            interaction_dumps: base.join(WorkspaceArea::InteractionDumps.as_str()),
            user_id,
            base,
        }
    }

    /// Path of a single area.
    pub fn area(&self, area: WorkspaceArea) -> &Path {
        match area {
            WorkspaceArea::Context => &self.context,
            WorkspaceArea::Prompts => &self.prompts,
            WorkspaceArea::Seeds => &self.seeds,
            WorkspaceArea::Feedback => &self.feedback,
            WorkspaceArea::InteractionDumps => &self.interaction_dumps,
        }
    }

    /// Every area paired with its path.
    pub fn areas(&self) -> impl Iterator<Item = (WorkspaceArea, &Path)> {
        WorkspaceArea::ALL.into_iter().map(move |a| (a, self.area(a)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_names_round_trip() {
        for area in WorkspaceArea::ALL {
            assert_eq!(area.as_str().parse::<WorkspaceArea>().unwrap(), area);
        }
    }

    #[test]
    fn unknown_area_is_validation_error() {
        let err = "downloads".parse::<WorkspaceArea>().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Validation);
        assert!(err.to_string().contains("interaction_dumps"));
    }

    #[test]
    fn paths_hang_off_base() {
        let id = UserId::parse("feedface").unwrap();
        let paths = WorkspacePaths::new(Path::new("/data/users"), &id);
        assert_eq!(paths.base, PathBuf::from("/data/users/feedface"));
        assert_eq!(paths.seeds, PathBuf::from("/data/users/feedface/seeds"));
        assert_eq!(paths.areas().count(), 5);
    }
}
