// ABOUTME: Data model for the pipeline: queries, page content, raw and normalized video records.
// ABOUTME: VideoRecord is the stable output schema shared by every extraction strategy.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;
use crate::hashtag::normalize_hashtag;

/// A validated request: whose videos to list and which hashtag to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileQuery {
    profile: String,
    hashtag: String,
}

impl ProfileQuery {
    /// Normalizes both inputs and rejects empties.
    ///
    /// A leading "@" is stripped from the profile and a leading "#" from the
    /// hashtag; the hashtag is lower-cased.
    pub fn new(profile: &str, hashtag: &str) -> Result<Self, ScrapeError> {
        let profile = normalize_profile(profile);
        if profile.is_empty() {
            return Err(ScrapeError::invalid_query(
                profile,
                "ProfileQuery",
                Some(anyhow::anyhow!("profile identifier is required")),
            ));
        }
        let hashtag = normalize_hashtag(hashtag);
        if hashtag.is_empty() {
            return Err(ScrapeError::invalid_query(
                profile,
                "ProfileQuery",
                Some(anyhow::anyhow!("hashtag is required")),
            ));
        }
        Ok(Self { profile, hashtag })
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// The case-folded hashtag, without the "#".
    pub fn hashtag(&self) -> &str {
        &self.hashtag
    }
}

/// Strips surrounding whitespace and a single leading "@".
pub fn normalize_profile(profile: &str) -> String {
    let trimmed = profile.trim();
    trimmed.strip_prefix('@').unwrap_or(trimmed).trim().to_string()
}

/// Which extraction path produced a set of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    StructuredFeed,
    RenderedDom,
    StaticHtml,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::StructuredFeed => "structured-feed",
            Strategy::RenderedDom => "rendered-dom",
            Strategy::StaticHtml => "static-html",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything the transport managed to obtain for one profile.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    /// A structured data object delivered alongside or instead of the page.
    pub feed: Option<serde_json::Value>,
    /// HTML snapshot of the page after scripts ran.
    pub rendered: Option<String>,
    /// The page markup as served.
    pub markup: Option<String>,
}

impl PageContent {
    pub fn from_feed(feed: serde_json::Value) -> Self {
        Self {
            feed: Some(feed),
            ..Default::default()
        }
    }

    pub fn from_rendered(html: impl Into<String>) -> Self {
        Self {
            rendered: Some(html.into()),
            ..Default::default()
        }
    }

    pub fn from_markup(html: impl Into<String>) -> Self {
        Self {
            markup: Some(html.into()),
            ..Default::default()
        }
    }

    /// Returns true if no representation is present at all.
    pub fn is_empty(&self) -> bool {
        self.feed.is_none() && self.rendered.is_none() && self.markup.is_none()
    }
}

/// Extractor output before identity and timestamp normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawVideoRecord {
    /// Position of the item in its source list, counting skipped items.
    pub index: usize,
    /// A bare id or any link whose last path segment is the id.
    pub link: String,
    pub description: String,
    /// Unix seconds, when the source carries one.
    pub create_time: Option<i64>,
    pub stats: VideoStats,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoStats {
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
}

/// A normalized video entry as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: String,
    pub url: String,
    pub description: String,
    pub date_posted: DateTime<Utc>,
    /// True when `date_posted` is the scrape time rather than the posting time.
    pub date_posted_approximate: bool,
    pub stats: VideoStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn query_strips_prefixes_and_folds_hashtag() {
        let q = ProfileQuery::new(" @ExampleUser ", "#QuantumFocus").unwrap();
        assert_eq!(q.profile(), "ExampleUser");
        assert_eq!(q.hashtag(), "quantumfocus");
    }

    #[test]
    fn query_rejects_empty_profile() {
        let err = ProfileQuery::new("@", "focus").unwrap_err();
        assert!(err.is_invalid_query());
    }

    #[test]
    fn query_strips_only_one_hash() {
        let q = ProfileQuery::new("u", "##focus").unwrap();
        assert_eq!(q.hashtag(), "#focus");
    }

    #[test]
    fn query_rejects_empty_hashtag() {
        let err = ProfileQuery::new("exampleuser", " # ").unwrap_err();
        assert!(err.is_invalid_query());
        assert_eq!(err.profile, "exampleuser");
    }

    #[test]
    fn page_content_is_empty() {
        assert!(PageContent::default().is_empty());
        assert!(!PageContent::from_markup("<html></html>").is_empty());
    }

    #[test]
    fn video_record_serializes_camel_case() {
        let record = VideoRecord {
            id: "7".to_string(),
            url: "https://www.tiktok.com/@u/video/7".to_string(),
            description: "hi".to_string(),
            date_posted: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            date_posted_approximate: false,
            stats: VideoStats {
                views: 1,
                likes: 2,
                comments: 3,
            },
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["datePosted"], "2024-03-01T12:00:00Z");
        assert_eq!(json["datePostedApproximate"], false);
        assert_eq!(json["stats"]["comments"], 3);
    }
}
