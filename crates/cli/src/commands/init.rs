//! `spcf init`: project setup.

use super::{CmdResult, Env};
use spcf_audit::SqliteAuditLog;
use spcf_config::{CONFIG_FILE, FactoryConfig};
use spcf_prompts::TemplateRenderer;
use spcf_workspace::WorkspaceManager;
use std::sync::Arc;

pub async fn run(env: &Env) -> CmdResult {
    println!("Synai Prompt & Context Factory: Setup");
    println!("======================================\n");

    std::fs::create_dir_all(&env.root)?;
    let config_path = env.root.join(CONFIG_FILE);
    if config_path.exists() {
        println!("  Config exists: {}", config_path.display());
    } else {
        std::fs::write(&config_path, FactoryConfig::default_toml())?;
        println!("✅ Created {}", config_path.display());
    }

    let config = Arc::new(env.config()?);

    let users_dir = config.users_dir();
    std::fs::create_dir_all(&users_dir)?;
    println!("✅ Users directory: {}", users_dir.display());

    let workspaces = WorkspaceManager::new(config.clone());
    let templates = TemplateRenderer::new(config.clone(), workspaces);
    let written = templates.install_defaults()?;
    for path in &written {
        println!("✅ Created template {}", path.display());
    }
    if written.is_empty() {
        println!("  Templates exist in {}", config.templates_dir().display());
    }

    let db_path = config.db_path();
    SqliteAuditLog::open(&db_path).await?;
    println!("✅ Audit database: {}", db_path.display());

    println!("\n📝 Next steps:");
    println!("   spcf onboard <identifier>");
    println!("   spcf onboard <identifier> --with-context");
    Ok(())
}
