//! Main entry point for the Slug Translator CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slug_translator::cli::commands::{self, Commands};
use slug_translator::AppConfig;

/// Slug Translator - translate titles into URL slugs
#[derive(Parser, Debug)]
#[command(name = "slug-translator", version, about, long_about = None)]
struct Args {
    /// Config file basename (defaults to ./slug-translator.{toml,json,yaml})
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Settings store file (overrides configuration)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let debug = args.verbose || matches!(args.command, Some(Commands::Server { debug: true, .. }));
    let log_level = if debug { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("slug_translator={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    if let Some(store) = args.store {
        config.store_path = store;
    }

    // Execute command
    match args.command {
        Some(Commands::Generate {
            text,
            mode,
            target_lang,
        }) => {
            commands::handle_generate(config, text, mode, target_lang).await?;
        }
        Some(Commands::Batch {
            file,
            output,
            mode,
            target_lang,
        }) => {
            commands::handle_batch(config, file, output, mode, target_lang).await?;
        }
        Some(Commands::Server { host, port, debug }) => {
            commands::handle_server(config, host, port, debug).await?;
        }
        Some(Commands::Usage) => {
            commands::handle_usage(config).await?;
        }
        Some(Commands::ResetUsage { translator }) => {
            commands::handle_reset_usage(config, translator).await?;
        }
        Some(Commands::TestTranslator { translator }) => {
            commands::handle_test_translator(config, translator).await?;
        }
        None => {
            println!("Please specify a command. Use --help for more information.");
        }
    }

    Ok(())
}
