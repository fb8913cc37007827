//! `spcf seed`: turn a designer reply into a seed prompt.

use super::{CmdResult, Env, parse_user_id, print_summary, read_file};
use std::path::Path;

pub async fn run(env: &Env, user_id: &str, designer_output: &Path, extract_data: bool) -> CmdResult {
    let user_id = parse_user_id(user_id)?;
    let factory = env.factory().await?;

    println!("Processing designer output for user: {user_id}");
    println!("==================================================");

    let reply = read_file(designer_output)?;
    println!("\n📄 Read {} characters from designer output", reply.chars().count());

    let seed = factory
        .process_seed_from_designer_output(&user_id, &reply)
        .await?;
    println!("\n✅ Seed prompt generated successfully!");
    println!("   Saved to: {}", seed.path.display());

    if extract_data {
        println!("\n🔍 Extracting seed data...");
        match factory.extract_seed_data(&seed.path) {
            Some(graph) => println!("{}", serde_json::to_string_pretty(&graph)?),
            None => println!("   No structured data found in seed"),
        }
    }

    print_summary(&factory, &user_id).await
}
