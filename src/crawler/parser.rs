//! Extraction of releases, system links and system details from documents
//!
//! Every function here is pure: it reads a parsed [`Document`] and never
//! touches the network, so the site's structure can be pinned down with
//! fixture HTML.

use crate::crawler::document::predicates::{
    is_release_link, is_spec_row, is_summary_row, is_system_link,
};
use crate::crawler::document::{descendants_named, first_descendant_named, href, text, Document};
use crate::model::{Rank, ReleaseId, SystemRecord};
use crate::ExtractionError;
use std::collections::BTreeSet;

/// Collects every distinct release linked from the release index
///
/// Each matching href has every `/lists/` occurrence removed, empty path
/// segments dropped, and the rest rejoined with `/`. Candidates that are not
/// valid release identifiers are logged and ignored.
///
/// # Returns
///
/// Distinct release identifiers in ascending (chronological) order. An index
/// without release links yields an empty list.
///
/// # Example
///
/// ```
/// use top500_harvest::crawler::{parse_release_ids, Document};
///
/// let html = r#"<a href="/lists/2020/06">A</a><a href="/lists/2019/11/">B</a><a href="/lists/2020/06/">C</a>"#;
/// let doc = Document::parse("https://www.top500.org/lists/top500", html);
/// let ids: Vec<String> = parse_release_ids(&doc).iter().map(|id| id.to_string()).collect();
/// assert_eq!(ids, vec!["2019/11", "2020/06"]);
/// ```
pub fn parse_release_ids(document: &Document) -> Vec<ReleaseId> {
    let mut releases = BTreeSet::new();

    for link in document.find_all(is_release_link) {
        let Some(href) = href(&link) else { continue };

        let candidate = href
            .replace("/lists/", "")
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/");

        match ReleaseId::parse(&candidate) {
            Ok(release) => {
                releases.insert(release);
            }
            Err(e) => {
                tracing::warn!("Ignoring release link {:?} on {}: {}", href, document.url(), e);
            }
        }
    }

    releases.into_iter().collect()
}

/// Site-relative hrefs of every system detail link, in document order
///
/// Duplicate links are kept: each one is a separate detail visit, and the
/// rank read from the detail page decides where it lands.
pub fn parse_system_links(document: &Document) -> Vec<String> {
    document
        .find_all(is_system_link)
        .iter()
        .filter_map(href)
        .map(str::to_string)
        .collect()
}

/// Extracts a system's rank and attribute record from its detail page
///
/// Every table row holding a `th` label and a `td` value contributes one
/// attribute: the label's text with trailing colons stripped, mapped to the
/// value's text verbatim. The rank is the second cell of the first
/// `tr.sublist.odd` summary row.
///
/// # Errors
///
/// * `MissingSummaryRow` - no summary row on the page
/// * `MissingRankCell` - the summary row has fewer than two cells
/// * `InvalidRank` - the rank cell is not a positive integer
pub fn parse_system_detail(document: &Document) -> Result<(Rank, SystemRecord), ExtractionError> {
    let mut record = SystemRecord::new();

    for row in document.find_all(is_spec_row) {
        let (Some(label), Some(value)) = (
            first_descendant_named(&row, "th"),
            first_descendant_named(&row, "td"),
        ) else {
            continue;
        };

        record.insert(label_key(&text(&label)), text(&value));
    }

    let rank = parse_rank(document)?;
    Ok((rank, record))
}

/// Header text without its surrounding whitespace and trailing colon
fn label_key(raw: &str) -> String {
    raw.trim().trim_end_matches(':').trim_end().to_string()
}

/// Reads the rank from the first summary row
fn parse_rank(document: &Document) -> Result<Rank, ExtractionError> {
    let url = || document.url().to_string();

    let summary = document
        .find_all(is_summary_row)
        .into_iter()
        .next()
        .ok_or_else(|| ExtractionError::MissingSummaryRow { url: url() })?;

    let cell = descendants_named(&summary, "td")
        .into_iter()
        .nth(1)
        .ok_or_else(|| ExtractionError::MissingRankCell { url: url() })?;

    let raw = text(&cell);
    match raw.trim().parse::<Rank>() {
        Ok(rank) if rank > 0 => Ok(rank),
        _ => Err(ExtractionError::InvalidRank {
            url: url(),
            value: raw,
        }),
    }
}
