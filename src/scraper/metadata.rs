//! Work title and author from the landing page. Never fails: missing fields fall back to
//! the "Unknown" sentinels.

use super::{select_text, Fetch};
use crate::model::WorkMetadata;
use reqwest::Url;
use scraper::Html;

/// Selectors for one site's landing page.
#[derive(Debug, Clone)]
pub struct MetadataRules {
    pub title_selector: &'static str,
    pub author_selector: &'static str,
}

/// Fields found on a landing page, before defaults are applied.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MetadataFields {
    pub title: Option<String>,
    pub author: Option<String>,
}

impl MetadataFields {
    pub fn into_metadata(self) -> WorkMetadata {
        WorkMetadata::from_parts(self.title, self.author)
    }
}

/// Fetch the landing page and derive title and author.
pub fn resolve_metadata(fetcher: &dyn Fetch, landing: &Url, rules: &MetadataRules) -> WorkMetadata {
    let fields = match fetcher.get_text(landing.as_str()) {
        Ok(html) => extract_fields(&html, rules),
        Err(e) => {
            tracing::warn!("Could not fetch landing page for metadata: {}", e);
            MetadataFields::default()
        }
    };
    if fields.title.is_none() {
        tracing::warn!("Work title not found; using placeholder");
    }
    if fields.author.is_none() {
        tracing::warn!("Work author not found; using placeholder");
    }
    fields.into_metadata()
}

/// JSON-LD `Book` data first, then the site's DOM selectors, field by field.
pub fn extract_fields(html: &str, rules: &MetadataRules) -> MetadataFields {
    let ld = json_ld_book(html);
    let doc = Html::parse_document(html);
    MetadataFields {
        title: ld
            .title
            .or_else(|| select_text(&doc, rules.title_selector)),
        author: ld
            .author
            .or_else(|| select_text(&doc, rules.author_selector)),
    }
}

const LD_JSON_OPEN: &str = "<script type=\"application/ld+json\">";
const LD_JSON_CLOSE: &str = "</script>";

/// Scan every ld+json script for an object with `"@type": "Book"`.
fn json_ld_book(html: &str) -> MetadataFields {
    let mut search_start = 0;
    while let Some(script) = html[search_start..].find(LD_JSON_OPEN) {
        let start = search_start + script + LD_JSON_OPEN.len();
        let end = html[start..]
            .find(LD_JSON_CLOSE)
            .map(|i| start + i)
            .unwrap_or(html.len());
        search_start = end;

        let Ok(v) = serde_json::from_str::<serde_json::Value>(html[start..end].trim()) else {
            continue;
        };
        if v.get("@type").and_then(|t| t.as_str()) != Some("Book") {
            continue;
        }
        let text = |field: Option<&serde_json::Value>| {
            field
                .and_then(|n| n.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        return MetadataFields {
            title: text(v.get("name")),
            author: text(v.get("author").and_then(|a| a.get("name"))),
        };
    }
    MetadataFields::default()
}
