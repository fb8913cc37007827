//! `spcf users`: list known users.

use super::{CmdResult, Env};

pub async fn run(env: &Env, detailed: bool) -> CmdResult {
    let factory = env.factory().await?;
    let users = factory.list_users()?;

    if users.is_empty() {
        println!("📭 No users found.");
        return Ok(());
    }

    println!("📊 Total users: {}\n", users.len());
    for (i, user_id) in users.iter().enumerate() {
        println!("{}. {user_id}", i + 1);
        if !detailed {
            continue;
        }

        if let Some(user) = factory.workspaces().read_user(user_id)? {
            println!("   Identifier: {}", user.identifier);
            println!("   Created:    {}", user.created_at.to_rfc3339());
        }

        let summary = factory.summary(user_id).await?;
        for (area, count) in summary.file_counts.iter().filter(|(_, c)| **c > 0) {
            println!("   📁 {area}: {count} file(s)");
        }
        println!("   📈 Operations: {}", summary.total_operations);
        for (op, count) in &summary.operation_counts {
            println!("      - {op}: {count}");
        }
        if let Some(last) = summary.last_activity {
            println!("   ⏰ Last activity: {}", last.to_rfc3339());
        }
        println!();
    }
    Ok(())
}
