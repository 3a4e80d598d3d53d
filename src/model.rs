//! Data model shared by the scrapers, the ingestion driver and the EPUB assembler.
//!
//! Chapter bodies are plain text. Paragraphs are separated by [PARAGRAPH_BREAK]; a single
//! `'\n'` inside a paragraph is a line break.

/// Separator between paragraphs of a chapter body.
pub const PARAGRAPH_BREAK: &str = "\n\n";

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
pub const UNKNOWN_CHAPTER: &str = "Unknown Chapter";

/// One discovered chapter location. `position` is the 0-based index in the discovered sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterAddress {
    pub position: usize,
    pub url: String,
}

impl ChapterAddress {
    /// Number a list of URLs in order.
    pub fn sequence<I, S>(urls: I) -> Vec<ChapterAddress>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        urls.into_iter()
            .enumerate()
            .map(|(position, url)| ChapterAddress {
                position,
                url: url.into(),
            })
            .collect()
    }
}

/// A successfully extracted chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRecord {
    /// 1-based position among successfully extracted chapters.
    pub ordinal: u32,
    pub title: String,
    pub body: String,
    pub source_url: String,
}

impl ChapterRecord {
    /// Non-empty paragraphs of the body, in order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.body
            .split(PARAGRAPH_BREAK)
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// Title and author of the work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkMetadata {
    pub title: String,
    pub author: String,
}

impl WorkMetadata {
    /// Substitute the sentinel for every field that could not be extracted.
    pub fn from_parts(title: Option<String>, author: Option<String>) -> Self {
        Self {
            title: title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            author: author.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        }
    }
}

impl Default for WorkMetadata {
    fn default() -> Self {
        Self::from_parts(None, None)
    }
}
