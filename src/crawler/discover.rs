//! Release discovery

use crate::crawler::parser::parse_release_ids;
use crate::crawler::session::Crawler;
use crate::model::{ReleaseId, Stage};
use crate::output::CrawlEvent;
use crate::StageError;

impl Crawler {
    /// Lists every release linked from the release index
    ///
    /// Fetches `{base}/lists/top500` and returns the distinct release
    /// identifiers found there in ascending (chronological) order. An index
    /// without release links yields an empty list.
    ///
    /// # Errors
    ///
    /// A `StageError` at `Stage::Discovery` if the index cannot be fetched.
    pub async fn discover_releases(&self) -> Result<Vec<ReleaseId>, StageError> {
        let index_url = self.base_url.index_url();
        self.report(CrawlEvent::DiscoveryStarted {
            index_url: index_url.clone(),
        });

        let document = self
            .fetcher
            .fetch(&index_url)
            .await
            .map_err(|e| StageError::new(Stage::Discovery, &index_url, e))?;

        let releases = parse_release_ids(&document);
        self.report(CrawlEvent::ReleasesDiscovered {
            count: releases.len(),
        });

        Ok(releases)
    }
}
