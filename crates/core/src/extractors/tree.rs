// ABOUTME: Item walk shared by the rendered-DOM and static-HTML extractors.
// ABOUTME: TreeNode abstracts element access; walk_items applies link/description/stat rules per tile.

//! Shared per-item extraction.
//!
//! Both DOM strategies find the same tiles and read the same sub-elements; they
//! differ only in which tree library answers the queries. [`TreeNode`] is that
//! capability and [`walk_items`] is the algorithm:
//!
//! 1. The first link's `href` is required. Tiles without one are skipped.
//! 2. The description comes from the primary selector, else the fallback
//!    selector, else it is empty. A missing description never skips a tile.
//! 3. Exactly the first three stat elements are read as views, likes, comments.
//!    With fewer than three, all stats stay 0 so no count lands in the wrong slot.
//! 4. Stat text goes through [`try_count`]; unreadable text is 0 and recorded.
//! 5. No creation time is available, so `create_time` is left empty.

use crate::error::SoftError;
use crate::extractors::Extraction;
use crate::metrics::try_count;
use crate::models::{RawVideoRecord, Strategy, VideoStats};
use crate::options::ItemSelectors;

/// Read access to one element of a document tree.
pub trait TreeNode {
    /// A selector compiled for this tree library.
    type Query;

    /// Attribute `attr` of the first descendant matching `query`.
    ///
    /// `Some("")` means the element exists but the attribute is empty.
    fn first_attr(&self, query: &Self::Query, attr: &str) -> Option<String>;

    /// Normalized text of the first descendant matching `query`, if one exists.
    fn first_text(&self, query: &Self::Query) -> Option<String>;

    /// Normalized text of every descendant matching `query`, in document order.
    fn all_text(&self, query: &Self::Query) -> Vec<String>;
}

/// [`ItemSelectors`] compiled once for one tree library.
///
/// A selector that does not compile is `None` and matches nothing.
#[derive(Debug, Clone)]
pub struct CompiledSelectors<Q> {
    pub item: Option<Q>,
    pub link: Option<Q>,
    pub description: Option<Q>,
    pub description_fallback: Option<Q>,
    pub stats: Option<Q>,
}

impl<Q> CompiledSelectors<Q> {
    pub fn compile(selectors: &ItemSelectors, parse: impl Fn(&str) -> Option<Q>) -> Self {
        let compile = |css: &str| {
            let compiled = parse(css);
            if compiled.is_none() {
                tracing::warn!(selector = css, "invalid selector");
            }
            compiled
        };
        Self {
            item: compile(&selectors.item),
            link: compile(&selectors.link),
            description: compile(&selectors.description),
            description_fallback: compile(&selectors.description_fallback),
            stats: compile(&selectors.stats),
        }
    }
}

/// Collapses runs of whitespace into single spaces and trims.
pub(crate) fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Runs the per-item algorithm over already-selected tiles.
pub fn walk_items<N, I>(
    strategy: Strategy,
    items: I,
    selectors: &CompiledSelectors<N::Query>,
) -> Extraction
where
    N: TreeNode,
    I: IntoIterator<Item = N>,
{
    let mut extraction = Extraction::default();
    let name = strategy.name();
    let mut seen = 0usize;

    for (index, item) in items.into_iter().enumerate() {
        seen += 1;

        let href = selectors
            .link
            .as_ref()
            .and_then(|q| item.first_attr(q, "href"));
        let link = match href {
            Some(href) if !href.trim().is_empty() => href,
            Some(_) => {
                extraction
                    .soft_errors
                    .push(SoftError::malformed(name, index, "link has no href"));
                continue;
            }
            None => {
                extraction
                    .soft_errors
                    .push(SoftError::malformed(name, index, "no link element"));
                continue;
            }
        };

        let description = selectors
            .description
            .as_ref()
            .and_then(|q| item.first_text(q))
            .or_else(|| {
                selectors
                    .description_fallback
                    .as_ref()
                    .and_then(|q| item.first_text(q))
            })
            .unwrap_or_default();

        let stats = read_stats(&item, selectors, name, index, &mut extraction.soft_errors);

        extraction.records.push(RawVideoRecord {
            index,
            link,
            description,
            create_time: None,
            stats,
        });
    }

    if seen == 0 {
        extraction.soft_errors.push(SoftError::miss(name));
    }
    for soft in &extraction.soft_errors {
        tracing::debug!(extractor = name, error = %soft, "absorbed extraction error");
    }
    extraction
}

fn read_stats<N: TreeNode>(
    item: &N,
    selectors: &CompiledSelectors<N::Query>,
    extractor: &str,
    index: usize,
    soft_errors: &mut Vec<SoftError>,
) -> VideoStats {
    let texts = selectors
        .stats
        .as_ref()
        .map(|q| item.all_text(q))
        .unwrap_or_default();
    if texts.len() < 3 {
        return VideoStats::default();
    }

    let mut count = |raw: &str| match try_count(raw) {
        Some(n) => n,
        None => {
            soft_errors.push(SoftError::unparseable(extractor, index, raw));
            0
        }
    };

    VideoStats {
        views: count(&texts[0]),
        likes: count(&texts[1]),
        comments: count(&texts[2]),
    }
}
