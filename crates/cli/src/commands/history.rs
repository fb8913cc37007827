//! `spcf history`: a user's audit trail.

use super::{CmdResult, Env, parse_user_id};

pub async fn run(env: &Env, user_id: &str, json: bool) -> CmdResult {
    let user_id = parse_user_id(user_id)?;
    let factory = env.factory().await?;
    let records = factory.operations(&user_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No operations recorded for {user_id}");
        return Ok(());
    }

    for record in &records {
        println!(
            "{:>5}  {}  {:<16}  {:<30}  {}",
            record.id,
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.status.as_str(),
            record.operation_type,
            record.pipeline_name.as_deref().unwrap_or("-"),
        );
        if let Some(notes) = &record.notes {
            println!("       {notes}");
        }
    }
    Ok(())
}
