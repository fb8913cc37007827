//! SPCF CLI: the main entry point.
//!
//! Commands:
//! - `init`     Write config, base templates, data dirs and the audit DB
//! - `onboard`  Create a user (optionally with context and designer output)
//! - `context`  Add context documents to a user's workspace
//! - `prepare`  Compose the designer prompt for an existing user
//! - `seed`     Store a designer reply as a seed prompt
//! - `users`    List users
//! - `history`  Show a user's audit trail
//! - `export`   Dump a seed prompt's data as JSON

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "spcf",
    about = "Synai Prompt & Context Factory: user workspaces, prompts and seed generation",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root holding spcf.toml
    #[arg(short = 'C', long, global = true, default_value = ".")]
    root: PathBuf,

    /// Override the audit database path
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config, templates, data directory and database
    Init,

    /// Onboard a new user
    Onboard {
        /// Human-readable identifier for the user (e.g. an email)
        identifier: String,

        /// Prepare for context-based seed generation instead of an assessment
        #[arg(long)]
        with_context: bool,

        /// Context documents to add (runs the full pipeline with --designer-output)
        #[arg(long = "context", value_name = "FILE")]
        context: Vec<PathBuf>,

        /// Designer reply to process as the user's seed prompt
        #[arg(long, value_name = "FILE")]
        designer_output: Option<PathBuf>,

        /// Write the composed designer prompt here
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Add context documents to a user's workspace
    Context {
        user_id: String,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Compose the designer prompt from a user's context
    Prepare {
        user_id: String,

        /// Write the prompt to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Process a designer reply into a seed prompt
    Seed {
        user_id: String,

        /// File containing the designer's XML reply
        designer_output: PathBuf,

        /// Print the extracted seed data
        #[arg(long)]
        extract_data: bool,
    },

    /// List users
    Users {
        /// Show file and operation counts per user
        #[arg(long)]
        detailed: bool,
    },

    /// Show a user's operation history, newest first
    History {
        user_id: String,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export the seed data of a seed prompt as JSON into interaction_dumps
    Export { user_id: String, seed_file: PathBuf },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let env = commands::Env {
        root: cli.root,
        db_path: cli.db_path,
    };

    match cli.command {
        Commands::Init => commands::init::run(&env).await?,
        Commands::Onboard {
            identifier,
            with_context,
            context,
            designer_output,
            output,
        } => {
            let args = commands::onboard::OnboardArgs {
                identifier,
                with_context,
                context,
                designer_output,
                output,
            };
            commands::onboard::run(&env, args).await?
        }
        Commands::Context { user_id, files } => commands::context::run(&env, &user_id, &files).await?,
        Commands::Prepare { user_id, output } => {
            commands::prepare::run(&env, &user_id, output.as_deref()).await?
        }
        Commands::Seed {
            user_id,
            designer_output,
            extract_data,
        } => commands::seed::run(&env, &user_id, &designer_output, extract_data).await?,
        Commands::Users { detailed } => commands::users::run(&env, detailed).await?,
        Commands::History { user_id, json } => commands::history::run(&env, &user_id, json).await?,
        Commands::Export { user_id, seed_file } => {
            commands::export::run(&env, &user_id, &seed_file).await?
        }
    }

    Ok(())
}
