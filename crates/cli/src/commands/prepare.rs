//! `spcf prepare`: compose the designer prompt for an existing user.

use super::{CmdResult, Env, parse_user_id};
use std::path::Path;

pub async fn run(env: &Env, user_id: &str, output: Option<&Path>) -> CmdResult {
    let user_id = parse_user_id(user_id)?;
    let factory = env.factory().await?;
    let handoff = factory.prepare_designer_input_for_user(&user_id).await?;

    match output {
        Some(path) => {
            std::fs::write(path, &handoff.designer_input)?;
            eprintln!(
                "📄 Designer prompt ({} context file(s)) written to {}",
                handoff.context_files.len(),
                path.display()
            );
        }
        None => println!("{}", handoff.designer_input),
    }
    Ok(())
}
