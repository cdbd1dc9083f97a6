//! Shared context for the crawl stages

use crate::crawler::fetcher::Fetcher;
use crate::crawler::pacing::Pacer;
use crate::output::{CrawlEvent, Reporter};
use crate::url::BaseUrl;
use std::sync::Arc;

/// Everything a crawl stage needs: where the site lives, how to fetch from
/// it, how long to pause between listing pages and where to report progress
///
/// The stages themselves live in `discover`, `page` and `release`.
pub struct Crawler {
    pub(crate) base_url: BaseUrl,
    pub(crate) fetcher: Fetcher,
    pub(crate) pacer: Pacer,
    pub(crate) reporter: Arc<dyn Reporter>,
}

impl Crawler {
    pub fn new(
        base_url: BaseUrl,
        fetcher: Fetcher,
        pacer: Pacer,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            base_url,
            fetcher,
            pacer,
            reporter,
        }
    }

    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    pub fn pacer(&self) -> Pacer {
        self.pacer
    }

    pub(crate) fn report(&self, event: CrawlEvent) {
        self.reporter.report(&event);
    }
}
