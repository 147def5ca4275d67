// ABOUTME: Extracts videos from structured data objects whose layout varies between page versions.
// ABOUTME: Probes an ordered list of known locations and reads exact counts directly from items.

//! Structured-feed extraction.
//!
//! The video list has been observed under several keys depending on the page
//! version, and intermediary scrapers deliver the same items as a bare array.
//! Each known location is a named probe; the first probe that finds a non-empty
//! collection wins even when later locations also hold items.
//!
//! Item fields:
//! - id: `id`, falling back to the `ItemModule` key, then to `webVideoUrl`.
//! - description: `desc`, then `text`.
//! - creation time: `createTime` (unix seconds, number or string), then `createTimeISO`.
//! - counts: `playCount`, `diggCount`, `commentCount` under `stats`, or on the
//!   item itself when there is no `stats` object.

use chrono::DateTime;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::error::SoftError;
use crate::extractors::{Extraction, Extractor};
use crate::metrics::normalize_metric;
use crate::models::{PageContent, RawVideoRecord, Strategy, VideoStats};

/// One item found by a probe, with the map key it was stored under, if any.
#[derive(Debug, Clone, Copy)]
pub struct FeedEntry<'a> {
    pub key: Option<&'a str>,
    pub item: &'a Value,
}

/// A named accessor for one known location of the video list.
pub struct Probe {
    pub name: &'static str,
    pub locate: for<'a> fn(&'a Value) -> Option<Vec<FeedEntry<'a>>>,
}

/// Known locations in priority order.
pub const PROBES: &[Probe] = &[
    Probe {
        name: "ItemModule",
        locate: item_module,
    },
    Probe {
        name: "ItemList.video.list",
        locate: item_list,
    },
    Probe {
        name: "userModule.videos",
        locate: user_module_videos,
    },
    Probe {
        name: "dataset",
        locate: dataset,
    },
];

fn item_module(root: &Value) -> Option<Vec<FeedEntry<'_>>> {
    let map = root.get("ItemModule")?.as_object()?;
    let entries: Vec<_> = map
        .iter()
        .map(|(key, item)| FeedEntry {
            key: Some(key.as_str()),
            item,
        })
        .collect();
    non_empty(entries)
}

fn item_list(root: &Value) -> Option<Vec<FeedEntry<'_>>> {
    list_entries(root.pointer("/ItemList/video/list")?)
}

fn user_module_videos(root: &Value) -> Option<Vec<FeedEntry<'_>>> {
    list_entries(root.pointer("/userModule/videos")?)
}

fn dataset(root: &Value) -> Option<Vec<FeedEntry<'_>>> {
    list_entries(root)
}

fn list_entries(value: &Value) -> Option<Vec<FeedEntry<'_>>> {
    let entries = value
        .as_array()?
        .iter()
        .map(|item| FeedEntry { key: None, item })
        .collect();
    non_empty(entries)
}

fn non_empty<T>(v: Vec<T>) -> Option<Vec<T>> {
    if v.is_empty() {
        None
    } else {
        Some(v)
    }
}

/// Runs the probes in order and returns the winning location's name and items.
pub fn locate_videos(root: &Value) -> Option<(&'static str, Vec<FeedEntry<'_>>)> {
    PROBES
        .iter()
        .find_map(|probe| (probe.locate)(root).map(|entries| (probe.name, entries)))
}

/// Finds and parses the data blob embedded in served markup.
///
/// Returns `None` when the page has no blob or the blob is not valid JSON.
pub fn embedded_feed(markup: &str) -> Option<Value> {
    let doc = Html::parse_document(markup);
    let sel = Selector::parse(r#"script#SIGI_STATE"#).ok()?;
    let script = doc.select(&sel).next()?;
    let raw = script.text().collect::<String>();
    match serde_json::from_str(raw.trim()) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, "embedded data blob is not valid JSON");
            None
        }
    }
}

/// Reads videos from structured data objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedExtractor;

impl FeedExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extracts every item from the first populated location in `root`.
    pub fn extract_value(&self, root: &Value, profile: &str) -> Extraction {
        let name = Strategy::StructuredFeed.name();
        let Some((location, entries)) = locate_videos(root) else {
            tracing::debug!(profile, "no known video location in feed");
            return Extraction::miss(Strategy::StructuredFeed);
        };
        tracing::debug!(profile, location, items = entries.len(), "feed location found");

        let mut extraction = Extraction::default();
        for (index, entry) in entries.into_iter().enumerate() {
            match read_item(index, entry) {
                Ok(record) => extraction.records.push(record),
                Err(reason) => {
                    let soft = SoftError::malformed(name, index, reason);
                    tracing::debug!(profile, error = %soft, "skipping feed item");
                    extraction.soft_errors.push(soft);
                }
            }
        }
        extraction
    }
}

impl Extractor for FeedExtractor {
    fn strategy(&self) -> Strategy {
        Strategy::StructuredFeed
    }

    /// Uses the explicit feed when present, else a blob embedded in the page.
    fn extract(&self, content: &PageContent, profile: &str) -> Option<Extraction> {
        if let Some(feed) = &content.feed {
            return Some(self.extract_value(feed, profile));
        }
        let embedded = [content.markup.as_deref(), content.rendered.as_deref()]
            .into_iter()
            .flatten()
            .find_map(embedded_feed)?;
        Some(self.extract_value(&embedded, profile))
    }
}

fn read_item(index: usize, entry: FeedEntry<'_>) -> Result<RawVideoRecord, &'static str> {
    let item = entry.item.as_object().ok_or("item is not an object")?;

    let link = item
        .get("id")
        .and_then(scalar_string)
        .or_else(|| entry.key.map(str::to_string))
        .or_else(|| item.get("webVideoUrl").and_then(scalar_string))
        .unwrap_or_default();

    let description = ["desc", "text"]
        .iter()
        .find_map(|k| item.get(*k).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string();

    let counts = item
        .get("stats")
        .and_then(Value::as_object)
        .unwrap_or(item);
    let count = |key: &str| counts.get(key).map(normalize_metric).unwrap_or(0);

    Ok(RawVideoRecord {
        index,
        link,
        description,
        create_time: create_time(entry.item),
        stats: VideoStats {
            views: count("playCount"),
            likes: count("diggCount"),
            comments: count("commentCount"),
        },
    })
}

/// Unix seconds from `createTime`, or from `createTimeISO` when that is all there is.
///
/// Zero and negative values count as absent.
fn create_time(item: &Value) -> Option<i64> {
    let secs = match item.get("createTime") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .or_else(|| {
        let iso = item.get("createTimeISO")?.as_str()?;
        DateTime::parse_from_rfc3339(iso).ok().map(|dt| dt.timestamp())
    })?;
    (secs > 0).then_some(secs)
}

fn scalar_string(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}
