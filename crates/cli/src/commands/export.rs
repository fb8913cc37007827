//! `spcf export`: dump a seed prompt's data as JSON.

use super::{CmdResult, Env, parse_user_id};
use std::path::Path;

pub async fn run(env: &Env, user_id: &str, seed_file: &Path) -> CmdResult {
    let user_id = parse_user_id(user_id)?;
    let factory = env.factory().await?;
    let dump = factory.export_seed(&user_id, seed_file).await?;
    println!("📤 Exported seed data to {}", dump.display());
    Ok(())
}
