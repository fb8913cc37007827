//! `spcf context`: copy documents into a user's context area.

use super::{CmdResult, Env, parse_user_id, read_file};
use spcf_pipeline::ContextFiles;
use std::path::PathBuf;

pub async fn run(env: &Env, user_id: &str, files: &[PathBuf]) -> CmdResult {
    let user_id = parse_user_id(user_id)?;

    let mut documents = ContextFiles::new();
    for path in files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| format!("Not a file path: {}", path.display()))?;
        documents.insert(name.to_string(), read_file(path)?);
    }

    let factory = env.factory().await?;
    for dest in factory.add_context_files(&user_id, &documents).await? {
        println!("✅ Added {}", dest.display());
    }
    Ok(())
}
