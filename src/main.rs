// file: src/main.rs
// description: commandline application entry point with command handling

use anyhow::{Context, Result};
use article_sync::utils::logging::{self, format_error, format_success, format_warning};
use article_sync::{
    Config, Document, DocumentOutcome, HttpPlatform, ImageResolver, MarkdownScanner, PublishCache,
    PublishOrchestrator, RetryPolicy, SkipReason,
};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "article_sync")]
#[command(version = "0.1.0")]
#[command(about = "Batch publisher for markdown articles with idempotent re-runs", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report missing local image references without contacting any platform
    Check {
        #[arg(long, env = "ARTICLE_SOURCE_DIR")]
        source_dir: Option<PathBuf>,
    },

    /// Publish changed documents to a configured platform target
    Post {
        /// Platform target name from the [platforms] config table
        target: String,

        #[arg(long, env = "ARTICLE_SOURCE_DIR")]
        source_dir: Option<PathBuf>,

        /// Re-publish even when the fingerprint matches a cache entry
        #[arg(long)]
        force: bool,
    },

    /// Rewrite front matter to the canonical key="value" style in place
    Normalize {
        #[arg(long, env = "ARTICLE_SOURCE_DIR")]
        source_dir: Option<PathBuf>,
    },

    /// Drop every publish cache entry
    ClearCache {
        #[arg(long, env = "ARTICLE_SOURCE_DIR")]
        source_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_logger(cli.color, cli.verbose);

    let config = if cli.config.exists() {
        info!("Loading configuration from: {}", cli.config.display());
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using built-in defaults",
            cli.config.display()
        );
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    match cli.command {
        Commands::Check { source_dir } => {
            cmd_check(&config, source_dir).await?;
        }
        Commands::Post {
            target,
            source_dir,
            force,
        } => {
            cmd_post(&config, &target, source_dir, force).await?;
        }
        Commands::Normalize { source_dir } => {
            cmd_normalize(&config, source_dir)?;
        }
        Commands::ClearCache { source_dir } => {
            cmd_clear_cache(&config, source_dir).await?;
        }
    }

    Ok(())
}

fn source_dir(config: &Config, requested: Option<PathBuf>) -> PathBuf {
    requested.unwrap_or_else(|| config.source.dir.clone())
}

fn scan(config: &Config, root: &Path) -> Result<Vec<article_sync::ScannedFile>> {
    let scanner = MarkdownScanner::new(config.source.clone());
    scanner
        .scan_directory(root)
        .context("Failed to scan source directory")
}

async fn cmd_check(config: &Config, requested: Option<PathBuf>) -> Result<()> {
    let root = source_dir(config, requested);
    let files = scan(config, &root)?;
    let mut broken_documents = 0usize;

    for file in &files {
        let document = match Document::parse(&file.path) {
            Ok(document) => document,
            Err(err) => {
                broken_documents += 1;
                println!("{}", format_error(&format!("{}: {}", file.relative_path, err)));
                continue;
            }
        };

        let missing = ImageResolver::check(&document);
        if missing.is_empty() {
            println!("{}", format_success(&file.relative_path));
        } else {
            broken_documents += 1;
            println!(
                "{}",
                format_warning(&format!(
                    "{}: {} missing image reference(s)",
                    file.relative_path,
                    missing.len()
                ))
            );
            for problem in missing {
                println!("    {}", problem);
            }
        }
    }

    println!(
        "\nChecked {} documents, {} with problems",
        files.len(),
        broken_documents
    );

    if broken_documents > 0 {
        anyhow::bail!("{} document(s) failed the check", broken_documents);
    }
    Ok(())
}

async fn cmd_post(
    config: &Config,
    target: &str,
    requested: Option<PathBuf>,
    force: bool,
) -> Result<()> {
    let root = source_dir(config, requested);
    let files = scan(config, &root)?;
    if files.is_empty() {
        println!("{}", format_warning("No markdown files found"));
        return Ok(());
    }

    let platform_config = config.platform(target)?.clone();
    let platform = HttpPlatform::new(
        target.to_string(),
        platform_config,
        RetryPolicy::from_config(&config.images),
    );
    let cache = PublishCache::open(root.join(&config.cache.file_name)).await;

    let orchestrator = PublishOrchestrator::new(config, platform, cache);
    let report = orchestrator.run(files, force).await;

    println!();
    for document in &report.documents {
        let line = format!("{}: {}", document.relative_path, document.outcome);
        match &document.outcome {
            DocumentOutcome::Published { .. } => println!("{}", format_success(&line)),
            DocumentOutcome::Skipped {
                reason: SkipReason::Draft,
            } => println!("{}", format_warning(&line)),
            DocumentOutcome::Skipped { .. } => println!("{}", line),
            DocumentOutcome::Failed { .. } => println!("{}", format_error(&line)),
        }
    }

    println!(
        "\n{} published, {} skipped, {} failed",
        report.published(),
        report.skipped(),
        report.failed()
    );

    if report.has_failures() {
        anyhow::bail!("{} document(s) failed to publish", report.failed());
    }
    Ok(())
}

fn cmd_normalize(config: &Config, requested: Option<PathBuf>) -> Result<()> {
    let root = source_dir(config, requested);
    let files = scan(config, &root)?;
    let mut rewritten = 0usize;

    for file in &files {
        match Document::normalize_file(&file.path) {
            Ok(true) => {
                rewritten += 1;
                println!("{}", format_success(&file.relative_path));
            }
            Ok(false) => {}
            Err(err) => {
                println!("{}", format_error(&format!("{}: {}", file.relative_path, err)));
            }
        }
    }

    println!("Normalized {} of {} documents", rewritten, files.len());
    Ok(())
}

async fn cmd_clear_cache(config: &Config, requested: Option<PathBuf>) -> Result<()> {
    let root = source_dir(config, requested);
    let mut cache = PublishCache::open(root.join(&config.cache.file_name)).await;
    let entries = cache.len();

    cache.clear().await.context("Failed to clear publish cache")?;
    println!(
        "{}",
        format_success(&format!("Cleared {} cache entr(ies)", entries))
    );
    Ok(())
}
