//! `spcf onboard`: create a user through one of the onboarding pipelines.

use super::{CmdResult, Env, print_summary, read_file};
use spcf_pipeline::ContextFiles;
use std::path::PathBuf;

pub struct OnboardArgs {
    pub identifier: String,
    pub with_context: bool,
    pub context: Vec<PathBuf>,
    pub designer_output: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

pub async fn run(env: &Env, args: OnboardArgs) -> CmdResult {
    let factory = env.factory().await?;

    println!("Onboarding user: {}", args.identifier);
    println!("==================================================");

    if let Some(reply_path) = &args.designer_output {
        let mut files = ContextFiles::new();
        for path in &args.context {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| format!("Not a file path: {}", path.display()))?;
            files.insert(name.to_string(), read_file(path)?);
        }
        let reply = read_file(reply_path)?;

        let out = factory
            .full_user_onboarding_with_context(&args.identifier, &files, &reply)
            .await?;
        println!("\n✅ User created with ID: {}", out.user_id);
        println!("   Assessment prompt: {}", out.assessment_path.display());
        println!("   Context files:     {}", out.context_paths.len());
        println!("   Seed prompt:       {}", out.seed.path.display());
        return print_summary(&factory, &out.user_id).await;
    }

    if !args.context.is_empty() {
        return Err("--context requires --designer-output; add files later with `spcf context`".into());
    }

    if args.with_context {
        let handoff = factory
            .onboard_user_with_context_to_seed(&args.identifier)
            .await?;
        let workspace = factory.workspaces().resolve(&handoff.user_id)?;
        println!("\n✅ User created with ID: {}", handoff.user_id);
        println!("\n📁 Context directory created at:");
        println!("   {}", workspace.context.display());
        if let Some(output) = &args.output {
            std::fs::write(output, &handoff.designer_input)?;
            println!("\n📄 Designer prompt written to {}", output.display());
        }
        println!("\n📝 Next steps:");
        println!("   1. Add context files: spcf context {} <FILE>...", handoff.user_id);
        println!("   2. Compose the designer prompt: spcf prepare {}", handoff.user_id);
        println!("   3. Process the designer reply: spcf seed {} <FILE>", handoff.user_id);
        return print_summary(&factory, &handoff.user_id).await;
    }

    let out = factory.onboard_new_user_no_context(&args.identifier).await?;
    println!("\n✅ User created with ID: {}", out.user_id);
    println!("\n📄 Assessment prompt generated at:");
    println!("   {}", out.assessment_path.display());
    print_summary(&factory, &out.user_id).await
}
