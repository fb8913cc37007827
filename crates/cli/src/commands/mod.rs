pub mod context;
pub mod export;
pub mod history;
pub mod init;
pub mod onboard;
pub mod prepare;
pub mod seed;
pub mod users;

use spcf_audit::SqliteAuditLog;
use spcf_config::FactoryConfig;
use spcf_core::UserId;
use spcf_pipeline::Factory;
use std::path::PathBuf;
use std::sync::Arc;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Global options shared by every command.
pub struct Env {
    pub root: PathBuf,
    pub db_path: Option<PathBuf>,
}

impl Env {
    pub fn config(&self) -> Result<FactoryConfig, Box<dyn std::error::Error>> {
        let mut config =
            FactoryConfig::load(&self.root).map_err(|e| format!("Failed to load config: {e}"))?;
        if let Some(db) = &self.db_path {
            config.paths.db_path = Some(db.clone());
        }
        Ok(config)
    }

    /// Build a factory backed by the SQLite audit log.
    pub async fn factory(&self) -> Result<Factory, Box<dyn std::error::Error>> {
        let config = self.config()?;
        tracing::debug!(
            users_dir = %config.users_dir().display(),
            db = %config.db_path().display(),
            "Opening factory"
        );
        let audit = SqliteAuditLog::open(&config.db_path()).await?;
        Ok(Factory::new(config, Arc::new(audit)))
    }
}

pub fn parse_user_id(raw: &str) -> Result<UserId, Box<dyn std::error::Error>> {
    Ok(UserId::parse(raw.trim())?)
}

pub fn read_file(path: &std::path::Path) -> Result<String, Box<dyn std::error::Error>> {
    std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()).into())
}

/// Print the short per-user summary shown after most commands.
pub async fn print_summary(factory: &Factory, user_id: &UserId) -> CmdResult {
    let summary = factory.summary(user_id).await?;
    println!("\n📊 User Summary:");
    println!("   Total operations: {}", summary.total_operations);
    for (area, count) in summary.file_counts.iter().filter(|(_, c)| **c > 0) {
        println!("   {area}: {count} file(s)");
    }
    if let Some(last) = summary.last_activity {
        println!("   Last activity: {}", last.to_rfc3339());
    }
    Ok(())
}
