//! Site adapters and scraping. Site detection, chapter discovery, chapter extraction, metadata,
//! and the shared HTTP transport.

mod client;
mod error;

pub mod discovery;
pub mod extract;
pub mod metadata;
pub mod readnovelfull;
pub mod webnoveltranslations;

#[cfg(test)]
pub(crate) use client::testing;
pub use client::{
    Fetch, FetchConfig, FetchConfigError, HttpFetcher, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};
pub use discovery::{CatalogDiscovery, DiscoverChapters, RangeDiscovery};
pub use error::{DiscoveryError, ExtractError, FetchError};
pub use extract::{ChapterExtractor, ExtractedChapter};
pub use metadata::{resolve_metadata, MetadataRules};

use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Selector};
use std::sync::OnceLock;

/// Supported source site. Each site pairs a discovery strategy with its own selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    /// Chapter list loaded from a catalog endpoint keyed by the novel id.
    ReadNovelFull,
    /// Chapter list synthesized from the first/last chapter links.
    WebNovelTranslations,
}

impl Site {
    pub fn name(self) -> &'static str {
        match self {
            Site::ReadNovelFull => "readnovelfull",
            Site::WebNovelTranslations => "webnoveltranslations",
        }
    }

    pub fn profile(self) -> SiteProfile {
        match self {
            Site::ReadNovelFull => readnovelfull::profile(),
            Site::WebNovelTranslations => webnoveltranslations::profile(),
        }
    }
}

/// Everything the pipeline needs to know about one site.
pub struct SiteProfile {
    pub site: Site,
    pub discovery: Box<dyn DiscoverChapters>,
    pub extractor: ChapterExtractor,
    pub metadata: MetadataRules,
}

/// Parse the landing URL and decide which site it belongs to, unless overridden.
pub fn resolve_site(url_input: &str, override_site: Option<Site>) -> Result<(Url, Site), DiscoveryError> {
    let url = Url::parse(url_input).map_err(|e| DiscoveryError::InvalidAddress {
        input: url_input.to_string(),
        reason: e.to_string(),
    })?;
    if let Some(site) = override_site {
        return Ok((url, site));
    }
    let host = url.host_str().ok_or_else(|| DiscoveryError::InvalidAddress {
        input: url_input.to_string(),
        reason: "URL has no host".to_string(),
    })?;
    let site = if host_matches(host, "readnovelfull.com") {
        Site::ReadNovelFull
    } else if host_matches(host, "webnoveltranslations.com") {
        Site::WebNovelTranslations
    } else {
        return Err(DiscoveryError::InvalidAddress {
            input: url_input.to_string(),
            reason: format!(
                "unrecognized site '{}'; use --site readnovelfull or --site webnoveltranslations",
                host
            ),
        });
    };
    Ok((url, site))
}

/// `host` is `domain` or one of its subdomains.
fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{}", domain))
}

/// Parse a CSS selector. A broken selector is logged and behaves like one that matches nothing.
pub(crate) fn parse_selector(sel: &str) -> Option<Selector> {
    match Selector::parse(sel) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::error!(selector = sel, "invalid selector: {}", e);
            None
        }
    }
}

/// Trimmed text of the first element matching `sel`, if any and non-empty.
pub(crate) fn select_text(doc: &scraper::Html, sel: &str) -> Option<String> {
    let selector = parse_selector(sel)?;
    doc.select(&selector)
        .next()
        .map(collapsed_text)
        .filter(|s| !s.is_empty())
}

/// Element text with runs of whitespace collapsed to single spaces.
pub(crate) fn collapsed_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Chapter number from an address ending in `/chapter-{n}/`.
pub(crate) fn chapter_number(url: &str) -> Option<u32> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    let re = RE
        .get_or_init(|| Regex::new(r"/chapter-(\d+)/$").ok())
        .as_ref()?;
    re.captures(url)?.get(1)?.as_str().parse().ok()
}
