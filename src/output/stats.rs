//! Statistics over the harvest database
//!
//! Answers the questions usually asked of a finished harvest: how many
//! systems each release holds, and which values one attribute takes across
//! all of them (by default the operating system).

use crate::storage::{ReleaseSummary, RunRecord, Storage};
use crate::Result;

/// Attribute summarized when none is requested
pub const DEFAULT_ATTRIBUTE: &str = "Operating System";

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Most recent run, if any
    pub latest_run: Option<RunRecord>,

    /// Stored releases, newest first
    pub releases: Vec<ReleaseSummary>,

    /// Total number of stored systems
    pub total_systems: u64,

    /// The attribute whose values were counted
    pub attribute: String,

    /// Distinct values of `attribute` with their system counts
    pub attribute_values: Vec<(String, u64)>,
}

impl CrawlStatistics {
    /// Systems that carry `attribute` at all
    pub fn systems_with_attribute(&self) -> u64 {
        self.attribute_values.iter().map(|(_, count)| count).sum()
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `attribute` - Attribute label whose distinct values are counted
pub fn load_statistics(storage: &dyn Storage, attribute: &str) -> Result<CrawlStatistics> {
    Ok(CrawlStatistics {
        latest_run: storage.get_latest_run()?,
        releases: storage.list_releases()?,
        total_systems: storage.count_systems()?,
        attribute: attribute.to_string(),
        attribute_values: storage.attribute_value_counts(attribute)?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Harvest Statistics ===\n");

    if let Some(run) = &stats.latest_run {
        println!("Latest run:");
        println!("  ID: {}", run.id);
        println!("  Started: {}", run.started_at);
        if let Some(finished) = &run.finished_at {
            println!("  Finished: {}", finished);
        }
        println!("  Status: {}", run.status.to_db_string());
        println!();
    }

    println!("Overview:");
    println!("  Releases stored: {}", stats.releases.len());
    println!("  Systems stored: {}", stats.total_systems);
    println!();

    if !stats.releases.is_empty() {
        println!("Releases:");
        for release in &stats.releases {
            println!(
                "  {}: {} systems, {} skipped (run {})",
                release.release, release.system_count, release.skipped_count, release.run_id
            );
        }
        println!();
    }

    println!(
        "{} ({} distinct values):",
        stats.attribute,
        stats.attribute_values.len()
    );
    let carrying = stats.systems_with_attribute();
    for (value, count) in &stats.attribute_values {
        let percentage = if carrying > 0 {
            (*count as f64 / carrying as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", value, count, percentage);
    }
}
