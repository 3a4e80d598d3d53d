//! Error types for fetching, discovery and chapter extraction.

use std::borrow::Borrow;
use thiserror::Error;

/// Transport failure: the page could not be retrieved.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: could not reach {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} when fetching: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to read response body from {url}: {source}")]
    BodyRead {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Nothing to ingest: chapter addresses could not be derived from the landing page. Fatal.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Could not fetch {what}: {source}")]
    Fetch {
        what: &'static str,
        #[source]
        source: FetchError,
    },

    #[error("Could not find the work id on the landing page {url}.")]
    MissingIdentifier { url: String },

    #[error("Could not find a usable chapter range on the landing page (first: {}, last: {}).", fmt_bound(.first), fmt_bound(.last))]
    MissingRange {
        first: Option<u32>,
        last: Option<u32>,
    },

    #[error("Invalid URL: {input}: {reason}")]
    InvalidAddress { input: String, reason: String },

    #[error("No chapters found on the landing page.")]
    NoChapters,
}

fn fmt_bound(n: impl Borrow<Option<u32>>) -> String {
    n.borrow()
        .map(|n| n.to_string())
        .unwrap_or_else(|| "missing".to_string())
}

/// Why one chapter was skipped. Never fatal to a run.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Network(#[from] FetchError),

    #[error("missing content container at {url}")]
    MissingContent { url: String },

    #[error("no content at {url}")]
    EmptyContent { url: String },
}
