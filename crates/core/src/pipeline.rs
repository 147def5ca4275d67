// ABOUTME: The Pipeline orchestrator: fetch through a ContentSource, extract with ordered fallback, filter by hashtag.
// ABOUTME: Produces a ScrapeReport; only a failed fetch is fatal.

use std::fmt;
use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{ScrapeError, SoftError};
use crate::extractors::{Extraction, Extractor, FeedExtractor, MarkupExtractor, RenderedExtractor};
use crate::hashtag::matches;
use crate::identity::build_identity;
use crate::models::{PageContent, ProfileQuery, RawVideoRecord, Strategy, VideoRecord};
use crate::options::{PipelineBuilder, PipelineOptions};

/// The transport collaborator: turns a profile identifier into page content.
///
/// Implementations own retries, headers, timeouts and rendering. An `Err`
/// means nothing at all could be obtained.
pub trait ContentSource {
    fn fetch(&self, profile: &str) -> impl Future<Output = anyhow::Result<PageContent>> + Send;
}

/// Lifecycle of one scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Fetching,
    Extracting,
    Filtering,
    Done,
    Failed,
}

impl Stage {
    /// Returns true if moving from `self` to `next` is a legal transition.
    ///
    /// `Failed` is only reachable from `Fetching`.
    pub fn can_advance_to(self, next: Stage) -> bool {
        matches!(
            (self, next),
            (Stage::Idle, Stage::Fetching)
                | (Stage::Idle, Stage::Extracting)
                | (Stage::Fetching, Stage::Extracting)
                | (Stage::Fetching, Stage::Failed)
                | (Stage::Extracting, Stage::Filtering)
                | (Stage::Filtering, Stage::Done)
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Idle => "idle",
            Stage::Fetching => "fetching",
            Stage::Extracting => "extracting",
            Stage::Filtering => "filtering",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Tracks the current stage of one call and logs transitions.
struct Run<'a> {
    profile: &'a str,
    stage: Stage,
}

impl<'a> Run<'a> {
    fn new(profile: &'a str) -> Self {
        Self {
            profile,
            stage: Stage::Idle,
        }
    }

    fn advance(&mut self, next: Stage) {
        debug_assert!(
            self.stage.can_advance_to(next),
            "illegal stage transition {} -> {}",
            self.stage,
            next
        );
        tracing::debug!(profile = self.profile, from = %self.stage, to = %next, "pipeline stage");
        self.stage = next;
    }
}

/// The outcome of one scrape.
///
/// `all_videos` holds every extracted record in extraction order and
/// `filtered_videos` the subset whose description carries the hashtag.
/// Records with `date_posted_approximate` set were stamped with the scrape
/// time; that stamp is the only part of a report that differs between runs
/// over identical content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeReport {
    #[serde(rename = "username")]
    pub profile: String,
    pub hashtag: String,
    /// The extractor that produced the records, if any did.
    pub strategy: Option<Strategy>,
    pub total_videos: usize,
    pub all_videos: Vec<VideoRecord>,
    pub filtered_videos: Vec<VideoRecord>,
    pub soft_errors: Vec<SoftError>,
}

impl ScrapeReport {
    /// Returns true if no video matched the hashtag.
    pub fn is_empty(&self) -> bool {
        self.filtered_videos.is_empty()
    }

    /// Consumes the report and returns only the filtered videos.
    pub fn into_videos(self) -> Vec<VideoRecord> {
        self.filtered_videos
    }
}

/// Runs extraction strategies in preference order and filters the result.
#[derive(Debug, Clone)]
pub struct Pipeline {
    opts: PipelineOptions,
    feed: FeedExtractor,
    rendered: RenderedExtractor,
    markup: MarkupExtractor,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineOptions::default())
    }
}

impl Pipeline {
    /// Create a new PipelineBuilder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn new(opts: PipelineOptions) -> Self {
        Self {
            feed: FeedExtractor::new(),
            rendered: RenderedExtractor::new(&opts.selectors),
            markup: MarkupExtractor::new(&opts.selectors),
            opts,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.opts
    }

    /// Structured feed, then rendered document, then served markup.
    fn extractors(&self) -> [&dyn Extractor; 3] {
        [&self.feed, &self.rendered, &self.markup]
    }

    /// Fetches content for `query` and runs the pipeline over it.
    ///
    /// Fails only when `source` yields nothing. "Now" is captured once and
    /// used for every record without a posting time.
    pub async fn scrape<S: ContentSource>(
        &self,
        source: &S,
        query: &ProfileQuery,
    ) -> Result<ScrapeReport, ScrapeError> {
        let mut run = Run::new(query.profile());
        run.advance(Stage::Fetching);

        let content = match source.fetch(query.profile()).await {
            Ok(content) if !content.is_empty() => content,
            Ok(_) => {
                run.advance(Stage::Failed);
                return Err(ScrapeError::source_unavailable(
                    query.profile(),
                    "Fetch",
                    Some(anyhow::anyhow!("source returned no content")),
                ));
            }
            Err(e) => {
                run.advance(Stage::Failed);
                tracing::warn!(profile = query.profile(), error = %e, "fetch failed");
                return Err(ScrapeError::source_unavailable(query.profile(), "Fetch", Some(e)));
            }
        };

        Ok(self.process(&mut run, &content, query, Utc::now()))
    }

    /// Runs extraction and filtering over content already in hand.
    ///
    /// Pure and deterministic for a given `now`; never fails.
    pub fn run(&self, content: &PageContent, query: &ProfileQuery, now: DateTime<Utc>) -> ScrapeReport {
        let mut run = Run::new(query.profile());
        self.process(&mut run, content, query, now)
    }

    fn process(
        &self,
        run: &mut Run<'_>,
        content: &PageContent,
        query: &ProfileQuery,
        now: DateTime<Utc>,
    ) -> ScrapeReport {
        run.advance(Stage::Extracting);
        let mut soft_errors = Vec::new();
        let mut strategy = None;
        let mut all_videos = Vec::new();

        for extractor in self.extractors() {
            let Some(extraction) = extractor.extract(content, query.profile()) else {
                continue;
            };
            let Extraction {
                records,
                soft_errors: absorbed,
            } = extraction;
            soft_errors.extend(absorbed);

            let videos = self.assemble(extractor.strategy(), records, query, now, &mut soft_errors);
            if videos.is_empty() {
                tracing::debug!(
                    profile = query.profile(),
                    strategy = %extractor.strategy(),
                    "no videos, trying next strategy"
                );
                continue;
            }
            strategy = Some(extractor.strategy());
            all_videos = videos;
            break;
        }

        run.advance(Stage::Filtering);
        let filtered_videos: Vec<VideoRecord> = all_videos
            .iter()
            .filter(|v| matches(&v.description, query.hashtag()))
            .cloned()
            .collect();

        run.advance(Stage::Done);
        match strategy {
            Some(s) => tracing::info!(
                profile = query.profile(),
                hashtag = query.hashtag(),
                strategy = %s,
                total = all_videos.len(),
                matched = filtered_videos.len(),
                skipped = soft_errors.len(),
                "scrape complete"
            ),
            None => tracing::info!(
                profile = query.profile(),
                skipped = soft_errors.len(),
                "no videos found"
            ),
        }

        ScrapeReport {
            profile: query.profile().to_string(),
            hashtag: query.hashtag().to_string(),
            strategy,
            total_videos: all_videos.len(),
            all_videos,
            filtered_videos,
            soft_errors,
        }
    }

    /// Turns raw records into output records, dropping those without an id.
    fn assemble(
        &self,
        strategy: Strategy,
        records: Vec<RawVideoRecord>,
        query: &ProfileQuery,
        now: DateTime<Utc>,
        soft_errors: &mut Vec<SoftError>,
    ) -> Vec<VideoRecord> {
        let mut videos = Vec::with_capacity(records.len());
        for raw in records {
            let identity = build_identity(&self.opts.domain, query.profile(), &raw.link);
            if !identity.is_valid() {
                let soft =
                    SoftError::malformed(strategy.name(), raw.index, "no video id in link");
                tracing::debug!(profile = query.profile(), error = %soft, "skipping record");
                soft_errors.push(soft);
                continue;
            }

            let posted = raw
                .create_time
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
            let (date_posted, date_posted_approximate) = match posted {
                Some(dt) => (dt, false),
                None => (now, true),
            };

            videos.push(VideoRecord {
                id: identity.id,
                url: identity.url,
                description: raw.description,
                date_posted,
                date_posted_approximate,
                stats: raw.stats,
            });
        }
        videos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VideoStats;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    const TILES: &str = r#"<html><body>
        <div data-e2e="user-post-item">
          <a href="/@exampleuser/video/900"></a>
          <div data-e2e="video-desc">Deep #focus</div>
          <div data-e2e="video-stats"><strong>1K</strong><strong>2</strong><strong>3</strong></div>
        </div>
    </body></html>"#;

    #[test]
    fn test_stage_transitions() {
        assert!(Stage::Idle.can_advance_to(Stage::Fetching));
        assert!(Stage::Fetching.can_advance_to(Stage::Failed));
        assert!(!Stage::Extracting.can_advance_to(Stage::Failed));
        assert!(!Stage::Done.can_advance_to(Stage::Fetching));
    }

    #[test]
    fn test_feed_wins_over_markup() {
        let query = ProfileQuery::new("exampleuser", "focus").unwrap();
        let content = PageContent {
            feed: Some(json!({ "ItemModule": { "1": { "id": "1", "desc": "#focus from feed" } } })),
            markup: Some(TILES.to_string()),
            ..Default::default()
        };
        let report = Pipeline::default().run(&content, &query, fixed_now());
        assert_eq!(report.strategy, Some(Strategy::StructuredFeed));
        assert_eq!(report.filtered_videos[0].id, "1");
    }

    #[test]
    fn test_empty_feed_falls_back_to_markup() {
        let query = ProfileQuery::new("exampleuser", "focus").unwrap();
        let content = PageContent {
            feed: Some(json!({ "ItemModule": {} })),
            markup: Some(TILES.to_string()),
            ..Default::default()
        };
        let report = Pipeline::default().run(&content, &query, fixed_now());
        assert_eq!(report.strategy, Some(Strategy::StaticHtml));
        assert_eq!(
            report.filtered_videos,
            vec![VideoRecord {
                id: "900".to_string(),
                url: "https://www.tiktok.com/@exampleuser/video/900".to_string(),
                description: "Deep #focus".to_string(),
                date_posted: fixed_now(),
                date_posted_approximate: true,
                stats: VideoStats {
                    views: 1_000,
                    likes: 2,
                    comments: 3,
                },
            }]
        );
        assert_eq!(report.soft_errors, vec![SoftError::miss("structured-feed")]);
    }

    #[test]
    fn test_records_without_ids_fall_through() {
        let query = ProfileQuery::new("u", "focus").unwrap();
        let content = PageContent {
            feed: Some(json!({ "userModule": { "videos": [ { "desc": "#focus" } ] } })),
            ..Default::default()
        };
        let report = Pipeline::default().run(&content, &query, fixed_now());
        assert_eq!(report.strategy, None);
        assert_eq!(report.total_videos, 0);
        assert_eq!(
            report.soft_errors,
            vec![SoftError::malformed("structured-feed", 0, "no video id in link")]
        );
    }

    #[test]
    fn test_links_without_video_id_are_skipped_at_source_position() {
        let query = ProfileQuery::new("exampleuser", "focus").unwrap();
        let html = r#"<html><body>
            <div data-e2e="user-post-item"><span>ad slot</span></div>
            <div data-e2e="user-post-item"><a href="/@exampleuser/video/"></a></div>
            <div data-e2e="user-post-item"><a href="https://www.tiktok.com/"></a></div>
            <div data-e2e="user-post-item">
              <a href="/@exampleuser/video/900"></a>
              <div data-e2e="video-desc">Deep #focus</div>
            </div>
        </body></html>"#;

        let report = Pipeline::default().run(&PageContent::from_markup(html), &query, fixed_now());

        assert_eq!(report.total_videos, 1);
        assert_eq!(report.all_videos[0].id, "900");
        for index in [1, 2] {
            assert!(report.soft_errors.contains(&SoftError::malformed(
                "static-html",
                index,
                "no video id in link"
            )));
        }
        assert!(report
            .soft_errors
            .contains(&SoftError::malformed("static-html", 0, "no link element")));
    }

    #[test]
    fn test_double_hash_query_needs_double_hash() {
        let query = ProfileQuery::new("u", "##focus").unwrap();
        let content = PageContent::from_feed(json!([
            { "id": "1", "desc": "just #focus" },
            { "id": "2", "desc": "##focus twice" }
        ]));
        let report = Pipeline::default().run(&content, &query, fixed_now());
        assert_eq!(report.filtered_videos.len(), 1);
        assert_eq!(report.filtered_videos[0].id, "2");
    }

    #[test]
    fn test_custom_domain() {
        let query = ProfileQuery::new("u", "focus").unwrap();
        let pipeline = Pipeline::builder().domain("m.example.com").build();
        let content = PageContent::from_feed(json!([{ "id": "3", "desc": "#focus" }]));
        let report = pipeline.run(&content, &query, fixed_now());
        assert_eq!(report.filtered_videos[0].url, "https://m.example.com/@u/video/3");
    }

    #[test]
    fn test_report_envelope_keys() {
        let query = ProfileQuery::new("u", "focus").unwrap();
        let report = Pipeline::default().run(&PageContent::default(), &query, fixed_now());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["username"], "u");
        assert_eq!(json["totalVideos"], 0);
        assert_eq!(json["strategy"], serde_json::Value::Null);
        assert!(json["filteredVideos"].as_array().unwrap().is_empty());
    }
}
