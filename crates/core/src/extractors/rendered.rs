// ABOUTME: Extracts video tiles from a fully rendered page snapshot using dom_query.
// ABOUTME: Implements TreeNode for dom_query selections over matchers compiled per extractor.

use dom_query::{Document, Matcher, Selection};

use crate::extractors::tree::{normalize_whitespace, walk_items, CompiledSelectors, TreeNode};
use crate::extractors::{Extraction, Extractor};
use crate::models::{PageContent, Strategy};
use crate::options::ItemSelectors;

impl TreeNode for Selection<'_> {
    type Query = Matcher;

    fn first_attr(&self, query: &Matcher, attr: &str) -> Option<String> {
        let first = self.select_matcher(query).first();
        if !first.exists() {
            return None;
        }
        Some(
            first
                .attr(attr)
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
        )
    }

    fn first_text(&self, query: &Matcher) -> Option<String> {
        let first = self.select_matcher(query).first();
        if !first.exists() {
            return None;
        }
        Some(normalize_whitespace(&first.text()))
    }

    fn all_text(&self, query: &Matcher) -> Vec<String> {
        self.select_matcher(query)
            .iter()
            .map(|el| normalize_whitespace(&el.text()))
            .collect()
    }
}

/// Reads tiles out of a materialized document.
#[derive(Debug, Clone)]
pub struct RenderedExtractor {
    selectors: CompiledSelectors<Matcher>,
}

impl Default for RenderedExtractor {
    fn default() -> Self {
        Self::new(&ItemSelectors::default())
    }
}

impl RenderedExtractor {
    pub fn new(selectors: &ItemSelectors) -> Self {
        Self {
            selectors: CompiledSelectors::compile(selectors, |css| Matcher::new(css).ok()),
        }
    }

    /// Walks every tile in `doc`.
    pub fn extract_document(&self, doc: &Document, profile: &str) -> Extraction {
        let Some(item_matcher) = &self.selectors.item else {
            tracing::warn!(profile, "no usable item selector");
            return Extraction::miss(Strategy::RenderedDom);
        };
        let tiles = doc.select_matcher(item_matcher);
        walk_items(Strategy::RenderedDom, tiles.iter(), &self.selectors)
    }
}

impl Extractor for RenderedExtractor {
    fn strategy(&self) -> Strategy {
        Strategy::RenderedDom
    }

    fn extract(&self, content: &PageContent, profile: &str) -> Option<Extraction> {
        let html = content.rendered.as_deref()?;
        let doc = Document::from(html);
        Some(self.extract_document(&doc, profile))
    }
}
