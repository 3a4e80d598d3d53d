//! webnoveltranslations.com. Chapter addresses follow `{novel}/chapter-{n}/`; the landing page's
//! read buttons give the range. Chapter pages carry no usable title, so titles come from the URL.

use super::{ChapterExtractor, MetadataRules, RangeDiscovery, Site, SiteProfile};

pub fn profile() -> SiteProfile {
    SiteProfile {
        site: Site::WebNovelTranslations,
        // The site's button ids are swapped: "read last" links to the earliest chapter.
        discovery: Box::new(RangeDiscovery {
            first_selector: "a#btn-read-last",
            last_selector: "a#btn-read-first",
        }),
        extractor: ChapterExtractor {
            title_selector: None,
            content_selector: "div.text-left",
            paragraph_selector: "p",
        },
        metadata: MetadataRules {
            title_selector: "h1.post-title",
            author_selector: ".author-content a",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::metadata::extract_fields;
    use crate::scraper::testing::StubFetcher;
    use crate::scraper::DiscoveryError;
    use reqwest::Url;

    const LANDING: &str = "https://webnoveltranslations.com/novel/the-work/";

    #[test]
    fn discovers_range_from_read_buttons() -> Result<(), DiscoveryError> {
        let stub = StubFetcher::new().page(
            LANDING,
            r#"<div id="init-links">
<a href="https://webnoveltranslations.com/novel/the-work/chapter-1/" id="btn-read-last">Read First</a>
<a href="https://webnoveltranslations.com/novel/the-work/chapter-3/" id="btn-read-first">Read Last</a>
</div>"#,
        );
        let landing = Url::parse(LANDING).unwrap();
        let addresses = profile().discovery.discover(&stub, &landing)?;
        let urls: Vec<&str> = addresses.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://webnoveltranslations.com/novel/the-work/chapter-1/",
                "https://webnoveltranslations.com/novel/the-work/chapter-2/",
                "https://webnoveltranslations.com/novel/the-work/chapter-3/",
            ]
        );
        Ok(())
    }

    #[test]
    fn parses_chapter_with_url_title() -> Result<(), crate::scraper::ExtractError> {
        let html = r#"<div class="reading-content"><div class="text-left">
<p>Line one.</p><p>Line two.</p></div></div>"#;
        let ch = profile()
            .extractor
            .parse(html, "https://webnoveltranslations.com/novel/the-work/chapter-2/")?;
        assert_eq!(ch.title, "Chapter 2");
        assert_eq!(ch.body, "Line one.\n\nLine two.");
        Ok(())
    }

    #[test]
    fn landing_metadata() {
        let html = r#"<div class="post-title"><h1 class="post-title">The Work</h1></div>
<div class="author-content"><a href="/novel-author/someone/">Someone</a></div>"#;
        let meta = extract_fields(html, &profile().metadata).into_metadata();
        assert_eq!(meta.title, "The Work");
        assert_eq!(meta.author, "Someone");
    }
}
