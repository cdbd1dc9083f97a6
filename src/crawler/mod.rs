//! Crawler module for harvesting TOP500 releases
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with robots.txt compliance
//! - HTML parsing and record extraction
//! - Pacing between listing pages
//! - Release discovery, aggregation and overall crawl coordination

mod coordinator;
mod discover;
mod document;
mod fetcher;
mod pacing;
mod page;
mod parser;
mod release;
mod session;

pub use coordinator::{Coordinator, ReleaseSelection};
pub use document::{predicates, Document};
pub use fetcher::{build_http_client, Fetcher};
pub use pacing::Pacer;
pub use parser::{parse_release_ids, parse_system_detail, parse_system_links};
pub use session::Crawler;

use crate::config::Config;
use crate::model::CrawlResult;
use crate::output::{sinks_from_config, TracingReporter};
use crate::Result;
use std::sync::Arc;

/// Runs a complete harvest
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client and load robots.txt
/// 2. Open the configured sinks and start a run
/// 3. Discover releases and aggregate the selected ones, newest first
/// 4. Write the final result and summary
///
/// Progress is reported through `tracing`.
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `config_hash` - Hash of the configuration file, recorded with the run
/// * `selection` - Which releases to visit
///
/// # Example
///
/// ```no_run
/// use top500_harvest::config::load_config_with_hash;
/// use top500_harvest::crawler::{crawl, ReleaseSelection};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("config.toml"))?;
/// let result = crawl(&config, &hash, ReleaseSelection::all()).await?;
/// println!("{} systems", result.total_systems());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(
    config: &Config,
    config_hash: &str,
    selection: ReleaseSelection,
) -> Result<CrawlResult> {
    let sinks = sinks_from_config(config, config_hash)?;
    let mut coordinator = Coordinator::from_config(config, Arc::new(TracingReporter))
        .await?
        .with_sinks(sinks)
        .with_selection(selection);

    coordinator.run().await
}
