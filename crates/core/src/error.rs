// ABOUTME: Error types for the scraping pipeline: fatal ScrapeError and absorbed SoftError records.
// ABOUTME: ScrapeError carries an ErrorCode with convenience constructors and boolean helpers.

use std::fmt;

use serde::Serialize;

/// Error codes for failures that end a scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidQuery,
    SourceUnavailable,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidQuery => "invalid query",
            ErrorCode::SourceUnavailable => "source unavailable",
        };
        write!(f, "{}", s)
    }
}

/// The fatal error type for scrape operations.
#[derive(Debug, thiserror::Error)]
pub struct ScrapeError {
    pub code: ErrorCode,
    pub profile: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vidscout: {} @{}: {}", self.op, self.profile, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl ScrapeError {
    /// Create an InvalidQuery error.
    pub fn invalid_query(
        profile: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code: ErrorCode::InvalidQuery,
            profile: profile.into(),
            op: op.into(),
            source,
        }
    }

    /// Create a SourceUnavailable error.
    pub fn source_unavailable(
        profile: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code: ErrorCode::SourceUnavailable,
            profile: profile.into(),
            op: op.into(),
            source,
        }
    }

    /// Returns true if this is an InvalidQuery error.
    pub fn is_invalid_query(&self) -> bool {
        self.code == ErrorCode::InvalidQuery
    }

    /// Returns true if this is a SourceUnavailable error.
    pub fn is_source_unavailable(&self) -> bool {
        self.code == ErrorCode::SourceUnavailable
    }
}

/// Non-fatal problems absorbed while extracting.
///
/// These never abort a scrape. They are collected on the report so callers can
/// see why a page yielded fewer videos than expected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SoftError {
    /// An extractor found none of the structure it looks for.
    #[error("{extractor}: no video collection found")]
    ExtractionMiss { extractor: String },

    /// A single item lacked required structure and was skipped.
    #[error("{extractor}: item {index} skipped: {reason}")]
    ItemMalformed {
        extractor: String,
        index: usize,
        reason: String,
    },

    /// A count string had no digits and was read as zero.
    #[error("{extractor}: item {index}: unparseable count {raw:?}")]
    MetricUnparseable {
        extractor: String,
        index: usize,
        raw: String,
    },
}

impl SoftError {
    pub fn miss(extractor: impl Into<String>) -> Self {
        SoftError::ExtractionMiss {
            extractor: extractor.into(),
        }
    }

    pub fn malformed(extractor: impl Into<String>, index: usize, reason: impl Into<String>) -> Self {
        SoftError::ItemMalformed {
            extractor: extractor.into(),
            index,
            reason: reason.into(),
        }
    }

    pub fn unparseable(extractor: impl Into<String>, index: usize, raw: impl Into<String>) -> Self {
        SoftError::MetricUnparseable {
            extractor: extractor.into(),
            index,
            raw: raw.into(),
        }
    }
}
