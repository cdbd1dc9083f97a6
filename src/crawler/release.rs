//! Release aggregation

use crate::crawler::session::Crawler;
use crate::model::{ReleaseId, ReleaseRecord};
use crate::output::CrawlEvent;
use crate::url::PAGES_PER_RELEASE;
use crate::StageError;

impl Crawler {
    /// Harvests every system of one release
    ///
    /// Walks listing pages 1 through 5 and merges each page into a single
    /// rank-keyed record. Short releases simply produce empty trailing pages.
    /// A rank seen twice keeps the later record; the collision is recorded on
    /// the release and reported. The configured pacing delay follows every
    /// page.
    ///
    /// # Errors
    ///
    /// The first `StageError` from any page aborts the release.
    pub async fn aggregate_release(&self, release: &ReleaseId) -> Result<ReleaseRecord, StageError> {
        self.report(CrawlEvent::ReleaseStarted {
            release: release.clone(),
        });

        let mut record = ReleaseRecord::new();

        for page in 1..=PAGES_PER_RELEASE {
            let page_url = self.base_url.release_page_url(release, page);
            self.report(CrawlEvent::PageStarted {
                release: release.clone(),
                page,
                url: page_url.clone(),
            });

            let extraction = self.extract_page(&page_url).await?;

            for collision in record.merge(extraction) {
                self.report(CrawlEvent::RankCollision {
                    release: release.clone(),
                    rank: collision.rank,
                    url: collision.url,
                });
            }

            self.pacer.pause().await;
        }

        self.report(CrawlEvent::ReleaseCompleted {
            release: release.clone(),
            systems: record.len(),
            skipped: record.skipped.len(),
        });

        Ok(record)
    }
}
