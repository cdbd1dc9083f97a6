//! Crawler coordinator - crawl orchestration logic
//!
//! Runs one full harvest:
//! - Discovering every published release
//! - Aggregating releases one at a time, newest first
//! - Handing each finished release to the configured sinks
//! - Applying the failed-release policy
//! - Reporting the final tally

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, Fetcher};
use crate::crawler::pacing::Pacer;
use crate::crawler::session::Crawler;
use crate::model::{CrawlResult, FailedRelease, ReleaseId};
use crate::output::{CrawlEvent, RecordSink, Reporter};
use crate::url::BaseUrl;
use crate::{HarvestError, Result, StageError};
use std::sync::Arc;

/// Which of the discovered releases a crawl visits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseSelection {
    /// Only these releases; empty means all of them
    pub only: Vec<ReleaseId>,

    /// Keep at most this many of the newest releases
    pub latest: Option<usize>,
}

impl ReleaseSelection {
    /// Every discovered release
    pub fn all() -> Self {
        Self::default()
    }

    /// Orders `discovered` newest first and applies the filters
    ///
    /// Requested releases missing from the index are logged and ignored.
    pub fn apply(&self, discovered: Vec<ReleaseId>) -> Vec<ReleaseId> {
        let mut releases: Vec<ReleaseId> = discovered.into_iter().rev().collect();

        if !self.only.is_empty() {
            for requested in &self.only {
                if !releases.contains(requested) {
                    tracing::warn!("Release {} is not listed on the index, ignoring", requested);
                }
            }
            releases.retain(|release| self.only.contains(release));
        }

        if let Some(latest) = self.latest {
            releases.truncate(latest);
        }

        releases
    }
}

/// Main crawl coordinator structure
pub struct Coordinator {
    crawler: Crawler,
    sinks: Vec<Box<dyn RecordSink>>,
    skip_failed_releases: bool,
    selection: ReleaseSelection,
}

impl Coordinator {
    /// Creates a coordinator around a ready crawler
    ///
    /// # Arguments
    ///
    /// * `crawler` - The crawl stages and their collaborators
    /// * `skip_failed_releases` - Record failed releases and carry on instead
    ///   of aborting the crawl
    pub fn new(crawler: Crawler, skip_failed_releases: bool) -> Self {
        Self {
            crawler,
            sinks: Vec::new(),
            skip_failed_releases,
            selection: ReleaseSelection::all(),
        }
    }

    /// Builds the crawler described by `config`
    ///
    /// Fetches robots.txt when `respect-robots` is set. No sinks are
    /// attached; see [`crate::output::sinks_from_config`].
    pub async fn from_config(config: &Config, reporter: Arc<dyn Reporter>) -> Result<Self> {
        let base_url = BaseUrl::parse(&config.site.base_url)?;
        let client = build_http_client(&config.user_agent, &config.crawler)?;
        let agent = config.user_agent.crawler_name.as_str();

        let fetcher = if config.crawler.respect_robots {
            Fetcher::with_robots(client, &base_url, agent).await
        } else {
            Fetcher::new(client, agent)
        };

        let pacer = Pacer::new(config.crawler.page_delay());
        let crawler = Crawler::new(base_url, fetcher, pacer, reporter);

        Ok(Self::new(crawler, config.crawler.skip_failed_releases))
    }

    pub fn with_sinks(mut self, sinks: Vec<Box<dyn RecordSink>>) -> Self {
        self.sinks.extend(sinks);
        self
    }

    pub fn with_selection(mut self, selection: ReleaseSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn crawler(&self) -> &Crawler {
        &self.crawler
    }

    /// Runs the harvest
    ///
    /// Discovers releases, then aggregates them strictly one after another,
    /// newest first. Every successful release is passed to the sinks as soon
    /// as it is complete.
    ///
    /// # Errors
    ///
    /// * `HarvestError::Discovery` - the release index could not be read
    /// * `HarvestError::Release` - a release failed and failed releases are
    ///   not skipped
    /// * `HarvestError::Output` - a sink could not persist its records
    ///
    /// Sinks are told to abort whenever an error ends the crawl.
    pub async fn run(&mut self) -> Result<CrawlResult> {
        match self.harvest().await {
            Ok(result) => Ok(result),
            Err(e) => {
                self.abort_sinks(&e);
                Err(e)
            }
        }
    }

    async fn harvest(&mut self) -> Result<CrawlResult> {
        let discovered = self
            .crawler
            .discover_releases()
            .await
            .map_err(|e| HarvestError::Discovery(Box::new(e)))?;

        let releases = self.selection.apply(discovered);
        tracing::debug!("Crawling {} releases", releases.len());

        let mut result = CrawlResult::new();

        for release in releases {
            match self.crawler.aggregate_release(&release).await {
                Ok(record) => {
                    for sink in &mut self.sinks {
                        sink.save_release(&release, &record)?;
                    }
                    result.releases.insert(release, record);
                }
                Err(e) => {
                    self.crawler.report(CrawlEvent::ReleaseFailed {
                        release: release.clone(),
                        stage: e.stage,
                        url: e.url.clone(),
                        message: e.source.to_string(),
                    });

                    if !self.skip_failed_releases {
                        return Err(HarvestError::Release {
                            release,
                            source: Box::new(e),
                        });
                    }

                    result.failed_releases.push(failed_release(release, &e));
                }
            }
        }

        for sink in &mut self.sinks {
            sink.save_result(&result)?;
        }

        self.crawler.report(CrawlEvent::CrawlCompleted {
            releases: result.releases.len(),
            systems: result.total_systems(),
            failed: result.failed_releases.len(),
        });

        Ok(result)
    }

    fn abort_sinks(&mut self, error: &HarvestError) {
        let reason = error.to_string();
        for sink in &mut self.sinks {
            if let Err(e) = sink.abort(&reason) {
                tracing::warn!("Sink {} could not record the abort: {}", sink.name(), e);
            }
        }
    }
}

fn failed_release(release: ReleaseId, error: &StageError) -> FailedRelease {
    FailedRelease {
        release,
        stage: error.stage,
        url: error.url.clone(),
        message: error.source.to_string(),
    }
}
