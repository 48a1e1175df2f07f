//! CLI for the pagemod tool.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pagemod::prelude::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pagemod")]
#[command(author, version, about = "Convert Next.js pages to React Router in place", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory to search, relative to the base directory [default: src/app]
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Exact file name to convert [default: page.tsx]
    #[arg(long, global = true)]
    filename: Option<String>,

    /// Base directory for the root and for reported paths
    /// [default: the config file's directory, else the current directory]
    #[arg(long, global = true)]
    base: Option<PathBuf>,

    /// YAML or JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Extra glob to skip, relative to the root (repeatable)
    #[arg(long, global = true)]
    exclude: Vec<String>,

    /// Preview changes without writing
    #[arg(long)]
    dry_run: bool,

    /// Print a colorized diff of every changed file
    #[arg(long)]
    diff: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Write rewrites even if they no longer parse
    #[arg(long)]
    no_syntax_guard: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the rules that would run, in order
    Rules,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG overrides; --verbose => debug; else info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "pagemod=debug"
        } else {
            "pagemod=info"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = load_config(&cli)?;

    match cli.command {
        Some(Commands::Rules) => cmd_rules(config),
        None => cmd_convert(&cli, config),
    }
}

fn load_config(cli: &Cli) -> Result<MigrationConfig> {
    let mut config = match &cli.config {
        Some(path) => MigrationConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => MigrationConfig::default(),
    };

    if let Some(root) = &cli.root {
        config.root_directory = root.clone();
    }
    if let Some(filename) = &cli.filename {
        config.target_filename = filename.clone();
    }
    config.exclude_patterns.extend(cli.exclude.iter().cloned());
    if cli.no_syntax_guard {
        config.syntax_guard = false;
    }

    config.validate().context("Invalid options")?;
    Ok(config)
}

fn base_dir(cli: &Cli) -> Result<PathBuf> {
    if let Some(base) = &cli.base {
        return Ok(base.clone());
    }
    if let Some(parent) = cli.config.as_deref().and_then(Path::parent)
        && !parent.as_os_str().is_empty()
    {
        return Ok(parent.to_path_buf());
    }
    std::env::current_dir().context("Failed to determine the current directory")
}

fn cmd_convert(cli: &Cli, config: MigrationConfig) -> Result<()> {
    let base = base_dir(cli)?;
    let target = config.target_filename.clone();

    let mut migrator = Migrator::new(config)
        .context("Invalid migration rules")?
        .base_dir(&base);
    if cli.dry_run {
        migrator = migrator.dry_run();
    }

    let summary = migrator.run().context("Migration failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?
        );
        return Ok(());
    }

    if cli.diff && summary.total_changed > 0 {
        println!("{}", summary.colorized_diff());
    }
    print_report(&summary, &target);
    Ok(())
}

fn print_report(summary: &RunSummary, target: &str) {
    let verb = if summary.dry_run {
        "would convert"
    } else {
        "converted"
    };

    println!(
        "Found {} {} file(s) under {}",
        summary.total_discovered,
        target,
        summary.root.display()
    );
    for path in &summary.changed_paths {
        println!("{verb}: {}", path.display());
    }
    for outcome in summary.with_residue() {
        println!(
            "review: {} (still imports {})",
            outcome.relative_path.display(),
            outcome.residue.join(", ")
        );
    }
    for outcome in summary.failures() {
        eprintln!(
            "failed: {}: {}",
            outcome.relative_path.display(),
            outcome.status.error().unwrap_or_default()
        );
    }

    println!(
        "Done: {} {} of {} file(s)",
        verb, summary.total_changed, summary.total_discovered
    );
    if summary.total_changed > 0 {
        println!("{}", summary.stats);
    }
}

fn cmd_rules(config: MigrationConfig) -> Result<()> {
    let migration = ConfigMigration::new(config).context("Invalid migration rules")?;
    let rules = migration.rules().context("Invalid migration rules")?;

    println!("{}: {}", migration.name(), migration.description());
    for (i, (name, description)) in rules.names().iter().zip(rules.describe()).enumerate() {
        println!("  {:>2}. {:<24} {}", i + 1, name, description);
    }
    Ok(())
}
