//! Listing page and system detail extraction

use crate::crawler::parser::{parse_system_detail, parse_system_links};
use crate::crawler::session::Crawler;
use crate::model::{PageExtraction, Rank, SkippedEntry, Stage, SystemRecord};
use crate::output::CrawlEvent;
use crate::StageError;

impl Crawler {
    /// Extracts every system linked from one listing page
    ///
    /// Each `/system...` link is resolved against the base URL and its detail
    /// page extracted in document order. Results are tagged with the rank read
    /// from the detail page, never with their position on the listing.
    ///
    /// A detail page with an unusable structure is skipped and recorded in
    /// [`PageExtraction::skipped`]; the rest of the page carries on. A page
    /// without system links yields an empty extraction.
    ///
    /// # Errors
    ///
    /// * `Stage::ListingPage` - the listing page could not be fetched
    /// * `Stage::SystemDetail` - a detail page could not be fetched
    pub async fn extract_page(&self, page_url: &str) -> Result<PageExtraction, StageError> {
        let links = {
            let document = self
                .fetcher
                .fetch(page_url)
                .await
                .map_err(|e| StageError::new(Stage::ListingPage, page_url, e))?;
            parse_system_links(&document)
        };

        let mut extraction = PageExtraction::default();

        for href in links {
            let url = self.base_url.system_url(&href);

            match self.extract_system_detail(&url).await {
                Ok((rank, record)) => extraction.systems.push((rank, record, url)),
                Err(e) if e.is_extraction() => {
                    let reason = e.source.to_string();
                    self.report(CrawlEvent::EntrySkipped {
                        url: url.clone(),
                        reason: reason.clone(),
                    });
                    extraction.skipped.push(SkippedEntry {
                        url,
                        page_url: page_url.to_string(),
                        reason,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(extraction)
    }

    /// Extracts one system's rank and attributes from its detail page
    ///
    /// # Errors
    ///
    /// A `StageError` at `Stage::SystemDetail` wrapping either the fetch
    /// failure or the `ExtractionError` (missing summary row, bad rank).
    pub async fn extract_system_detail(
        &self,
        url: &str,
    ) -> Result<(Rank, SystemRecord), StageError> {
        self.report(CrawlEvent::SystemStarted {
            url: url.to_string(),
        });

        let document = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|e| StageError::new(Stage::SystemDetail, url, e))?;

        parse_system_detail(&document).map_err(|e| StageError::new(Stage::SystemDetail, url, e))
    }
}
