//! Chapter-address discovery. Two strategies: a catalog endpoint keyed by a work id, and a
//! numeric range read off the landing page's first/last chapter links.

use super::error::DiscoveryError;
use super::{chapter_number, parse_selector, Fetch};
use crate::model::ChapterAddress;
use reqwest::Url;
use scraper::Html;

/// Produces the full reading order for a work, earliest chapter first.
pub trait DiscoverChapters {
    fn discover(
        &self,
        fetcher: &dyn Fetch,
        landing: &Url,
    ) -> Result<Vec<ChapterAddress>, DiscoveryError>;
}

fn fetch_landing(fetcher: &dyn Fetch, landing: &Url) -> Result<String, DiscoveryError> {
    fetcher
        .get_text(landing.as_str())
        .map_err(|source| DiscoveryError::Fetch {
            what: "landing page",
            source,
        })
}

/// Landing page carries a numeric work id; the chapter list comes from a second resource.
#[derive(Debug, Clone)]
pub struct CatalogDiscovery {
    /// Element holding the work id.
    pub id_selector: &'static str,
    pub id_attribute: &'static str,
    /// Catalog location relative to the landing page; `{id}` is replaced by the work id.
    pub catalog_path: &'static str,
    /// Chapter anchors within the catalog, in reading order.
    pub link_selector: &'static str,
}

impl CatalogDiscovery {
    fn work_id(&self, html: &str) -> Option<String> {
        let doc = Html::parse_document(html);
        let sel = parse_selector(self.id_selector)?;
        doc.select(&sel)
            .filter_map(|el| el.value().attr(self.id_attribute))
            .map(str::trim)
            .find(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
            .map(String::from)
    }

    fn catalog_url(&self, landing: &Url, id: &str) -> Result<Url, DiscoveryError> {
        let path = self.catalog_path.replace("{id}", id);
        landing
            .join(&path)
            .map_err(|e| DiscoveryError::InvalidAddress {
                input: path,
                reason: e.to_string(),
            })
    }

    /// Absolute chapter URLs from the catalog, in document order. Hrefs are resolved against
    /// the site origin; an href that cannot be resolved is skipped.
    fn chapter_urls(&self, html: &str, origin: &Url) -> Vec<String> {
        let doc = Html::parse_document(html);
        let Some(sel) = parse_selector(self.link_selector) else {
            return Vec::new();
        };
        let mut urls = Vec::new();
        for a in doc.select(&sel) {
            let href = match a.value().attr("href").map(str::trim) {
                Some(h) if !h.is_empty() => h,
                _ => continue,
            };
            match origin.join(href) {
                Ok(url) => urls.push(url.to_string()),
                Err(e) => tracing::warn!(href, "Skipping catalog link: {}", e),
            }
        }
        urls
    }
}

/// Root of the landing page's site, e.g. `https://readnovelfull.com/`.
pub(crate) fn site_origin(landing: &Url) -> Result<Url, DiscoveryError> {
    landing.join("/").map_err(|e| DiscoveryError::InvalidAddress {
        input: landing.to_string(),
        reason: e.to_string(),
    })
}

impl DiscoverChapters for CatalogDiscovery {
    fn discover(
        &self,
        fetcher: &dyn Fetch,
        landing: &Url,
    ) -> Result<Vec<ChapterAddress>, DiscoveryError> {
        let html = fetch_landing(fetcher, landing)?;
        let id = self
            .work_id(&html)
            .ok_or_else(|| DiscoveryError::MissingIdentifier {
                url: landing.to_string(),
            })?;
        tracing::info!(work_id = %id, "found work id");

        let catalog = self.catalog_url(landing, &id)?;
        let catalog_html =
            fetcher
                .get_text(catalog.as_str())
                .map_err(|source| DiscoveryError::Fetch {
                    what: "chapter catalog",
                    source,
                })?;
        let urls = self.chapter_urls(&catalog_html, &site_origin(landing)?);
        tracing::info!(count = urls.len(), "catalog lists chapters");
        Ok(ChapterAddress::sequence(urls))
    }
}

/// Landing page links to the first and last chapter; every chapter in between is synthesized
/// from the `{landing}/chapter-{n}/` pattern. Only the landing page is fetched.
#[derive(Debug, Clone)]
pub struct RangeDiscovery {
    pub first_selector: &'static str,
    pub last_selector: &'static str,
}

impl RangeDiscovery {
    fn bound(doc: &Html, sel: &str) -> Option<u32> {
        let selector = parse_selector(sel)?;
        let href = doc.select(&selector).next()?.value().attr("href")?;
        chapter_number(href.trim())
    }

    /// Chapter numbers named by the first/last links.
    fn range(&self, html: &str) -> (Option<u32>, Option<u32>) {
        let doc = Html::parse_document(html);
        (
            Self::bound(&doc, self.first_selector),
            Self::bound(&doc, self.last_selector),
        )
    }
}

/// Address of chapter `n` under the landing page.
pub(crate) fn chapter_url(landing: &Url, n: u32) -> String {
    format!("{}/chapter-{}/", landing.as_str().trim_end_matches('/'), n)
}

/// Most chapters a landing page range may name.
pub const MAX_RANGE_SPAN: u32 = 100_000;

/// Inclusive ascending range of chapter addresses. Inverted or incomplete ranges are an error,
/// as is one of more than [MAX_RANGE_SPAN] chapters.
pub(crate) fn synthesize_range(
    landing: &Url,
    first: Option<u32>,
    last: Option<u32>,
) -> Result<Vec<ChapterAddress>, DiscoveryError> {
    match (first, last) {
        (Some(start), Some(end)) if start <= end && end - start < MAX_RANGE_SPAN => Ok(
            ChapterAddress::sequence((start..=end).map(|n| chapter_url(landing, n))),
        ),
        _ => Err(DiscoveryError::MissingRange { first, last }),
    }
}

impl DiscoverChapters for RangeDiscovery {
    fn discover(
        &self,
        fetcher: &dyn Fetch,
        landing: &Url,
    ) -> Result<Vec<ChapterAddress>, DiscoveryError> {
        let html = fetch_landing(fetcher, landing)?;
        let (first, last) = self.range(&html);
        tracing::info!(?first, ?last, "chapter range");
        let addresses = synthesize_range(landing, first, last)?;
        tracing::info!(count = addresses.len(), "generated chapter links");
        Ok(addresses)
    }
}
