// ABOUTME: Extracts video tiles from raw, non-rendered HTML parsed offline with scraper.
// ABOUTME: Implements TreeNode for scraper element references over selectors parsed per extractor.

use scraper::{ElementRef, Html, Selector};

use crate::extractors::tree::{normalize_whitespace, walk_items, CompiledSelectors, TreeNode};
use crate::extractors::{Extraction, Extractor};
use crate::models::{PageContent, Strategy};
use crate::options::ItemSelectors;

impl TreeNode for ElementRef<'_> {
    type Query = Selector;

    fn first_attr(&self, query: &Selector, attr: &str) -> Option<String> {
        let el = self.select(query).next()?;
        Some(
            el.value()
                .attr(attr)
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
        )
    }

    fn first_text(&self, query: &Selector) -> Option<String> {
        let el = self.select(query).next()?;
        Some(normalize_whitespace(&el.text().collect::<String>()))
    }

    fn all_text(&self, query: &Selector) -> Vec<String> {
        self.select(query)
            .map(|el| normalize_whitespace(&el.text().collect::<String>()))
            .collect()
    }
}

/// Reads tiles out of served markup, the last resort when nothing richer exists.
#[derive(Debug, Clone)]
pub struct MarkupExtractor {
    selectors: CompiledSelectors<Selector>,
}

impl Default for MarkupExtractor {
    fn default() -> Self {
        Self::new(&ItemSelectors::default())
    }
}

impl MarkupExtractor {
    pub fn new(selectors: &ItemSelectors) -> Self {
        Self {
            selectors: CompiledSelectors::compile(selectors, |css| Selector::parse(css).ok()),
        }
    }

    /// Parses `html` and walks every tile.
    pub fn extract_html(&self, html: &str, profile: &str) -> Extraction {
        let Some(item_sel) = &self.selectors.item else {
            tracing::warn!(profile, "no usable item selector");
            return Extraction::miss(Strategy::StaticHtml);
        };
        let doc = Html::parse_document(html);
        walk_items(Strategy::StaticHtml, doc.select(item_sel), &self.selectors)
    }
}

impl Extractor for MarkupExtractor {
    fn strategy(&self) -> Strategy {
        Strategy::StaticHtml
    }

    fn extract(&self, content: &PageContent, profile: &str) -> Option<Extraction> {
        let html = content.markup.as_deref()?;
        Some(self.extract_html(html, profile))
    }
}
