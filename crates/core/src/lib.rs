// ABOUTME: Main library entry point for the vidscout profile video pipeline.
// ABOUTME: Re-exports the public API: Pipeline, PipelineBuilder, ProfileQuery, VideoRecord, ScrapeReport, ScrapeError.

//! vidscout - lists a profile's videos and keeps the ones tagged with a hashtag.
//!
//! The pipeline reads whichever representation of a profile page the transport
//! managed to obtain (a structured data feed, a rendered page snapshot, or the
//! served markup), normalizes every video into one [`VideoRecord`] schema and
//! filters by hashtag. It performs no I/O of its own: fetching is delegated to a
//! [`ContentSource`].
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use serde_json::json;
//! use vidscout_core::{PageContent, Pipeline, ProfileQuery};
//!
//! let query = ProfileQuery::new("@exampleuser", "#focus").unwrap();
//! let content = PageContent::from_feed(json!({
//!     "ItemModule": { "1": { "id": "1", "desc": "Morning #focus routine" } }
//! }));
//! let report = Pipeline::default().run(&content, &query, Utc::now());
//! assert_eq!(report.filtered_videos.len(), 1);
//! ```

pub mod error;
pub mod extractors;
pub mod hashtag;
pub mod identity;
pub mod metrics;
pub mod models;
pub mod options;
pub mod pipeline;

pub use crate::error::{ErrorCode, ScrapeError, SoftError};
pub use crate::extractors::{Extraction, Extractor};
pub use crate::hashtag::matches;
pub use crate::identity::{build_identity, profile_path, profile_url, Identity, DEFAULT_DOMAIN};
pub use crate::metrics::normalize_count;
pub use crate::models::{
    PageContent, ProfileQuery, RawVideoRecord, Strategy, VideoRecord, VideoStats,
};
pub use crate::options::{ItemSelectors, PipelineBuilder, PipelineOptions};
pub use crate::pipeline::{ContentSource, Pipeline, ScrapeReport, Stage};
