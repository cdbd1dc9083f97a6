//! Top500-Harvest main entry point
//!
//! This is the command-line interface for the TOP500 list harvester.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use top500_harvest::config::{load_config_with_hash, Config};
use top500_harvest::crawler::{crawl, ReleaseSelection};
use top500_harvest::output::{load_statistics, print_statistics, DEFAULT_ATTRIBUTE};
use top500_harvest::storage::SqliteStorage;
use top500_harvest::url::PAGES_PER_RELEASE;
use top500_harvest::{BaseUrl, ReleaseId};
use tracing_subscriber::EnvFilter;

/// Top500-Harvest: a polite crawler for the TOP500 supercomputer lists
///
/// Discovers every published release, walks its listing pages and extracts
/// the attribute record of each system from its detail page. Releases are
/// crawled one at a time, newest first.
#[derive(Parser, Debug)]
#[command(name = "top500-harvest")]
#[command(version)]
#[command(about = "A polite crawler for the TOP500 supercomputer lists", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Attribute whose distinct values --stats counts
    #[arg(long, value_name = "NAME", default_value = DEFAULT_ATTRIBUTE)]
    attribute: String,

    /// Only crawl this release (repeatable), e.g. --release 2020/06
    #[arg(long = "release", value_name = "YYYY/MM")]
    releases: Vec<String>,

    /// Only crawl the N newest releases
    #[arg(long, value_name = "N")]
    latest: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let selection = parse_selection(&cli.releases, cli.latest)?;

    if cli.dry_run {
        handle_dry_run(&config, &selection)?;
    } else if cli.stats {
        handle_stats(&config, &cli.attribute)?;
    } else {
        handle_crawl(&config, &config_hash, selection).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("top500_harvest=info,warn"),
            1 => EnvFilter::new("top500_harvest=debug,info"),
            2 => EnvFilter::new("top500_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn parse_selection(releases: &[String], latest: Option<usize>) -> anyhow::Result<ReleaseSelection> {
    let only = releases
        .iter()
        .map(|raw| {
            ReleaseId::parse(raw).with_context(|| format!("Invalid --release value {:?}", raw))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    if latest == Some(0) {
        bail!("--latest must be at least 1");
    }

    Ok(ReleaseSelection { only, latest })
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, selection: &ReleaseSelection) -> anyhow::Result<()> {
    let base_url = BaseUrl::parse(&config.site.base_url)?;

    println!("=== Top500-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", base_url);
    println!("  Release index: {}", base_url.index_url());
    println!("  Robots: {}", base_url.robots_url());

    println!("\nCrawler Configuration:");
    println!("  Page delay: {}ms", config.crawler.page_delay_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Connect timeout: {}s", config.crawler.connect_timeout_secs);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots);
    println!(
        "  Skip failed releases: {}",
        config.crawler.skip_failed_releases
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Summary: {}", config.output.summary_path);
    match &config.output.release_dir {
        Some(dir) => println!("  Release JSON: {}", dir),
        None => println!("  Release JSON: disabled"),
    }

    println!("\nReleases:");
    if selection.only.is_empty() {
        println!("  All releases on the index");
    } else {
        for release in &selection.only {
            println!("  - {}", release);
        }
    }
    if let Some(latest) = selection.latest {
        println!("  Limited to the {} newest", latest);
    }

    if let Some(release) = selection.only.first() {
        println!("\nURL scheme for {}:", release);
        for page in 1..=PAGES_PER_RELEASE {
            println!("  {}", base_url.release_page_url(release, page));
        }
        println!("  {}", base_url.system_url("/system/<id>"));
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config, attribute: &str) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .context("Failed to open the harvest database")?;

    let stats = load_statistics(&storage, attribute)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    config_hash: &str,
    selection: ReleaseSelection,
) -> anyhow::Result<()> {
    tracing::info!("Starting harvest of {}", config.site.base_url);

    let result = crawl(config, config_hash, selection)
        .await
        .context("Harvest failed")?;

    if result.is_complete() {
        tracing::info!(
            "Harvest completed: {} releases, {} systems",
            result.releases.len(),
            result.total_systems()
        );
    } else {
        tracing::warn!(
            "Harvest finished with gaps: {} releases, {} systems, {} failed releases, {} skipped entries",
            result.releases.len(),
            result.total_systems(),
            result.failed_releases.len(),
            result.skipped_entries().count()
        );
    }

    tracing::info!("Summary written to {}", config.output.summary_path);

    Ok(())
}
