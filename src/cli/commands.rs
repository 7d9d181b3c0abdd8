//! CLI command definitions and handlers

use clap::Subcommand;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use crate::core::config::AppConfig;
use crate::core::models::{GenerateOptions, GenerationMode, SlugSource};
use crate::core::orchestrator::SlugOrchestrator;

/// Commands for the slug translator
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate one slug
    Generate {
        /// Source text
        text: String,

        /// Override the configured generation mode
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,

        /// Target language (defaults to the configured one)
        #[arg(short, long)]
        target_lang: Option<String>,
    },

    /// Generate one slug per line of a text file
    Batch {
        /// Input file, one title per line
        #[arg(short, long)]
        file: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the configured generation mode
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,

        /// Target language (defaults to the configured one)
        #[arg(short, long)]
        target_lang: Option<String>,
    },

    /// Start HTTP API server
    Server {
        /// Bind address (overrides configuration)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (overrides configuration)
        #[arg(short, long)]
        port: Option<u16>,

        /// Enable debug mode
        #[arg(long)]
        debug: bool,
    },

    /// Show monthly usage per translator
    Usage,

    /// Reset the monthly counter of one translator
    ResetUsage {
        /// Translator name, e.g. deepl
        translator: String,
    },

    /// Run a test translation with the stored credentials of one translator
    TestTranslator {
        /// Translator name, e.g. deepl
        translator: String,
    },
}

/// Generation mode as accepted on the command line
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum ModeArg {
    /// Machine translation with failover
    Translation,
    /// Local transliteration only
    Pinyin,
}

impl From<ModeArg> for GenerationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Translation => GenerationMode::Translation,
            ModeArg::Pinyin => GenerationMode::Pinyin,
        }
    }
}

fn options(mode: Option<ModeArg>, target_lang: Option<String>) -> GenerateOptions {
    GenerateOptions {
        mode: mode.map(Into::into),
        target_lang,
    }
}

/// Handle generate command
pub async fn handle_generate(
    config: AppConfig,
    text: String,
    mode: Option<ModeArg>,
    target_lang: Option<String>,
) -> anyhow::Result<()> {
    let orchestrator = SlugOrchestrator::from_config(&config)?;
    let generated = orchestrator
        .generate_slug(&text, &options(mode, target_lang))
        .await?;

    if generated.slug.is_empty() {
        anyhow::bail!("Generated slug is empty");
    }

    match generated.source {
        SlugSource::Provider(provider) => info!("Slug generated by {}", provider),
        SlugSource::Pinyin => info!("Slug generated by pinyin fallback"),
    }

    println!("{}", generated.slug);
    Ok(())
}

/// Outcome of a batch run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchSummary {
    /// Lines that produced a slug
    pub processed: usize,
    /// Lines that errored or produced an empty slug
    pub failed: usize,
    /// One entry per non-blank input line, empty on failure
    pub slugs: Vec<String>,
}

/// Generate a slug for every non-blank line of `input`.
/// Blank lines are skipped; a failed line yields an empty entry, so `slugs`
/// lines up with the non-blank input lines.
pub async fn run_batch(
    orchestrator: &SlugOrchestrator,
    input: &Path,
    options: &GenerateOptions,
) -> anyhow::Result<BatchSummary> {
    let content = tokio::fs::read_to_string(input).await?;
    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();

    if lines.is_empty() {
        anyhow::bail!("No input lines found in {}", input.display());
    }

    // Create progress bar
    let pb = ProgressBar::new(lines.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("=>-"),
    );

    let mut summary = BatchSummary::default();

    for line in lines {
        pb.set_message(line.to_string());

        match orchestrator.generate_slug(line, options).await {
            Ok(generated) if !generated.slug.is_empty() => {
                summary.processed += 1;
                summary.slugs.push(generated.slug);
            }
            Ok(_) => {
                summary.failed += 1;
                summary.slugs.push(String::new());
                pb.println(format!("Empty slug for: {}", line));
            }
            Err(e) => {
                summary.failed += 1;
                summary.slugs.push(String::new());
                pb.println(format!("Error processing {}: {}", line, e));
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message("Completed");
    Ok(summary)
}

/// Handle batch command
pub async fn handle_batch(
    config: AppConfig,
    file: PathBuf,
    output: Option<PathBuf>,
    mode: Option<ModeArg>,
    target_lang: Option<String>,
) -> anyhow::Result<()> {
    let start_time = Instant::now();

    info!("Starting batch slug generation");
    info!("Input: {}", file.display());

    let orchestrator = SlugOrchestrator::from_config(&config)?;
    let summary = run_batch(&orchestrator, &file, &options(mode, target_lang)).await?;

    let rendered = summary.slugs.join("\n");
    match &output {
        Some(path) => {
            tokio::fs::write(path, format!("{}\n", rendered)).await?;
            info!("Output: {}", path.display());
        }
        None => println!("{}", rendered),
    }

    let duration = start_time.elapsed();
    info!(
        "Completed: {} processed, {} failed in {:?}",
        summary.processed, summary.failed, duration
    );

    eprintln!("\n✅ Batch completed!");
    eprintln!("   Processed: {}", summary.processed);
    eprintln!("   Failed: {}", summary.failed);
    eprintln!("   Time: {:?}", duration);

    Ok(())
}

/// Handle server command
pub async fn handle_server(
    mut config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
    debug: bool,
) -> anyhow::Result<()> {
    use crate::server::api::run_server;

    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if debug {
        info!("Debug mode enabled");
    }

    info!("Starting HTTP server on {}:{}", config.host, config.port);
    println!("🚀 Server starting on http://{}:{}", config.host, config.port);

    run_server(config).await?;

    Ok(())
}

/// Handle usage command
pub async fn handle_usage(config: AppConfig) -> anyhow::Result<()> {
    let orchestrator = SlugOrchestrator::from_config(&config)?;
    let stats = orchestrator.ledger().stats_snapshot().await?;

    if stats.is_empty() {
        println!("No translators configured");
        return Ok(());
    }

    println!("{:<10} {:>12} {:>12} {:>12}  {}", "translator", "used", "limit", "available", "month");
    for (name, stat) in stats {
        let limit = if stat.limit == 0 {
            "unlimited".to_string()
        } else {
            stat.limit.to_string()
        };
        let available = stat
            .available
            .map(|a| a.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<10} {:>12} {:>12} {:>12}  {}",
            name, stat.chars_used, limit, available, stat.current_month
        );
    }

    Ok(())
}

/// Handle reset usage command
pub async fn handle_reset_usage(config: AppConfig, translator: String) -> anyhow::Result<()> {
    let kind: crate::core::models::ProviderKind = translator.parse()?;
    let orchestrator = SlugOrchestrator::from_config(&config)?;
    orchestrator.ledger().reset(kind.as_str()).await?;

    println!("✅ Usage stats reset for {}", kind);
    Ok(())
}

/// Handle test translator command
pub async fn handle_test_translator(config: AppConfig, translator: String) -> anyhow::Result<()> {
    let orchestrator = SlugOrchestrator::from_config(&config)?;
    let settings = orchestrator.settings().load().await?;
    let credential = settings
        .translators
        .get(&translator)
        .cloned()
        .unwrap_or_default();

    let report = orchestrator.test_translator(&translator, &credential).await;
    if report.success {
        println!("✅ {}: {}", translator, report.message);
        Ok(())
    } else {
        anyhow::bail!("{}: {}", translator, report.message)
    }
}
