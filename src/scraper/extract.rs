//! Chapter page extraction: one address in, a title and plain-text body out.
//!
//! Every failure is returned as [ExtractError]; the caller decides to skip the chapter.

use super::error::ExtractError;
use super::{chapter_number, parse_selector, select_text, Fetch};
use crate::model::{ChapterAddress, PARAGRAPH_BREAK, UNKNOWN_CHAPTER};
use scraper::{ElementRef, Html, Node};

/// Title and body of one chapter page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedChapter {
    pub title: String,
    /// Paragraphs joined by [PARAGRAPH_BREAK].
    pub body: String,
}

/// Selectors for one site's chapter pages.
#[derive(Debug, Clone)]
pub struct ChapterExtractor {
    /// Primary title selector. `None` derives the title from the address only.
    pub title_selector: Option<&'static str>,
    /// Element containing the chapter text. Mandatory.
    pub content_selector: &'static str,
    /// Paragraph elements inside the content container.
    pub paragraph_selector: &'static str,
}

impl ChapterExtractor {
    /// Fetch and parse one chapter.
    pub fn extract(
        &self,
        fetcher: &dyn Fetch,
        address: &ChapterAddress,
    ) -> Result<ExtractedChapter, ExtractError> {
        let html = fetcher.get_text(&address.url)?;
        self.parse(&html, &address.url)
    }

    /// Parse a fetched chapter page.
    pub fn parse(&self, html: &str, url: &str) -> Result<ExtractedChapter, ExtractError> {
        let doc = Html::parse_document(html);

        let title = self
            .primary_title(&doc)
            .or_else(|| title_from_address(url))
            .unwrap_or_else(|| UNKNOWN_CHAPTER.to_string());

        let container = parse_selector(self.content_selector)
            .and_then(|sel| doc.select(&sel).next())
            .ok_or_else(|| ExtractError::MissingContent {
                url: url.to_string(),
            })?;

        let body = self.body_text(container);
        if body.is_empty() {
            return Err(ExtractError::EmptyContent {
                url: url.to_string(),
            });
        }
        Ok(ExtractedChapter { title, body })
    }

    fn primary_title(&self, doc: &Html) -> Option<String> {
        select_text(doc, self.title_selector?)
    }

    /// Text of every paragraph in the container; when there are none, the container's own lines.
    fn body_text(&self, container: ElementRef<'_>) -> String {
        let paragraphs: Vec<String> = match parse_selector(self.paragraph_selector) {
            Some(sel) => container
                .select(&sel)
                .map(block_text)
                .filter(|p| !p.is_empty())
                .collect(),
            None => Vec::new(),
        };
        if !paragraphs.is_empty() {
            return paragraphs.join(PARAGRAPH_BREAK);
        }
        block_text(container)
            .lines()
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(PARAGRAPH_BREAK)
    }
}

/// "Chapter N" from an address ending in `/chapter-N/`.
fn title_from_address(url: &str) -> Option<String> {
    chapter_number(url).map(|n| format!("Chapter {}", n))
}

/// Text of an element with `<br>` and nested block boundaries kept as `'\n'`. Each line is
/// whitespace-collapsed; blank lines are dropped.
fn block_text(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    for node in el.descendants() {
        match node.value() {
            Node::Text(t) => raw.push_str(t),
            Node::Element(e) if matches!(e.name(), "br" | "p" | "div") => raw.push('\n'),
            _ => {}
        }
    }
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
