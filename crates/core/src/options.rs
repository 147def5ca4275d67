// ABOUTME: Configuration for the pipeline including ItemSelectors, PipelineOptions, and PipelineBuilder.
// ABOUTME: PipelineBuilder provides a fluent API for constructing Pipeline instances with custom settings.

use crate::identity::DEFAULT_DOMAIN;
use crate::pipeline::Pipeline;

/// CSS selectors used by the DOM and HTML extractors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSelectors {
    /// One match per video tile.
    pub item: String,
    /// Link inside the tile; the first match is used.
    pub link: String,
    /// Description, tried first.
    pub description: String,
    /// Description, tried when the primary selector finds nothing.
    pub description_fallback: String,
    /// Stat values in views, likes, comments order.
    pub stats: String,
}

impl Default for ItemSelectors {
    fn default() -> Self {
        Self {
            item: r#"div[data-e2e="user-post-item"]"#.to_string(),
            link: "a".to_string(),
            description: r#"[data-e2e="video-desc"]"#.to_string(),
            description_fallback: "div.tt-feed-desc-text".to_string(),
            stats: r#"[data-e2e="video-stats"] strong"#.to_string(),
        }
    }
}

/// Configuration options for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Host used when rebuilding canonical video URLs.
    pub domain: String,
    pub selectors: ItemSelectors,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            selectors: ItemSelectors::default(),
        }
    }
}

/// Builder for constructing Pipeline instances with custom configuration.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    opts: PipelineOptions,
}

impl PipelineBuilder {
    /// Create a new PipelineBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: PipelineOptions::default(),
        }
    }

    /// Set the host used for canonical URLs.
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.opts.domain = domain.into();
        self
    }

    /// Replace all item selectors.
    pub fn selectors(mut self, selectors: ItemSelectors) -> Self {
        self.opts.selectors = selectors;
        self
    }

    /// Set the video tile selector.
    pub fn item_selector(mut self, css: impl Into<String>) -> Self {
        self.opts.selectors.item = css.into();
        self
    }

    /// Build the Pipeline with the configured options.
    pub fn build(self) -> Pipeline {
        Pipeline::new(self.opts)
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
