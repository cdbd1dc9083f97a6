//! Release identifiers
//!
//! A release is identified by the path fragment the site uses for it, e.g.
//! `2020/06`. The canonical string orders lexicographically, which is also
//! chronological order because the year segment is fixed-width.

use crate::ExtractionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of one published release (`"YYYY/MM"`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReleaseId(String);

impl ReleaseId {
    /// Parses and validates a release identifier
    ///
    /// The identifier must be a 4-digit year, a `/`, and a non-empty,
    /// whitespace-free remainder.
    ///
    /// # Example
    ///
    /// ```
    /// use top500_harvest::model::ReleaseId;
    ///
    /// let id = ReleaseId::parse("2020/06").unwrap();
    /// assert_eq!(id.year(), 2020);
    /// assert_eq!(id.file_key(), "2020_06");
    /// assert!(ReleaseId::parse("20/06").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, ExtractionError> {
        let invalid = || ExtractionError::InvalidReleaseId(s.to_string());

        let (year, period) = s.split_once('/').ok_or_else(invalid)?;

        if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        if period.is_empty() || period.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        Ok(Self(s.to_string()))
    }

    /// The canonical `"YYYY/MM"` form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The release year
    pub fn year(&self) -> u16 {
        // Validated as four ASCII digits in `parse`
        self.0[..4].parse().unwrap_or_default()
    }

    /// Everything after the year, usually the two-digit month
    pub fn period(&self) -> &str {
        &self.0[5..]
    }

    /// Key used for per-release artifacts: `/` replaced by `_`
    pub fn file_key(&self) -> String {
        self.0.replace('/', "_")
    }
}

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ReleaseId {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ReleaseId {
    type Error = ExtractionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReleaseId> for String {
    fn from(id: ReleaseId) -> Self {
        id.0
    }
}
