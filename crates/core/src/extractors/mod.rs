// ABOUTME: Video extraction strategies sharing one output contract.
// ABOUTME: Structured feed, rendered DOM and static HTML extractors behind the Extractor trait.

//! Video extraction module.
//!
//! Each strategy reads one representation of a profile page and produces raw
//! video records. None of them fail: items that cannot be read are skipped and
//! recorded as soft errors, and an empty result means "nothing found this way".
//!
//! Submodules:
//! - `feed`: nested JSON data objects, probed at several known locations.
//! - `tree`: the item walk shared by both DOM-based strategies, and the
//!   selectors each of them compiles once at construction.
//! - `rendered`: the walk over a materialized document (`dom_query`).
//! - `markup`: the walk over raw HTML parsed offline (`scraper`).

pub mod feed;
pub mod markup;
pub mod rendered;
pub mod tree;

use crate::error::SoftError;
use crate::models::{PageContent, RawVideoRecord, Strategy};

pub use feed::{embedded_feed, FeedExtractor};
pub use markup::MarkupExtractor;
pub use rendered::RenderedExtractor;

/// Records produced by one extractor plus the problems it absorbed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub records: Vec<RawVideoRecord>,
    pub soft_errors: Vec<SoftError>,
}

impl Extraction {
    /// A result with no records and a single miss.
    pub fn miss(strategy: Strategy) -> Self {
        Self {
            records: Vec::new(),
            soft_errors: vec![SoftError::miss(strategy.name())],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// One way of pulling video records out of fetched page content.
pub trait Extractor: Send + Sync {
    fn strategy(&self) -> Strategy;

    /// Extracts records for `profile`.
    ///
    /// Returns `None` when `content` does not carry the representation this
    /// extractor reads, so the caller can move on without counting a miss.
    fn extract(&self, content: &PageContent, profile: &str) -> Option<Extraction>;
}
