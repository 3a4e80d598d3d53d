//! readnovelfull.com. The landing page embeds the novel id in `#rating[data-novel-id]`; the full
//! chapter list is served by the `/ajax/chapter-archive` endpoint.

use super::{CatalogDiscovery, ChapterExtractor, MetadataRules, Site, SiteProfile};

pub fn profile() -> SiteProfile {
    SiteProfile {
        site: Site::ReadNovelFull,
        discovery: Box::new(CatalogDiscovery {
            id_selector: "#rating",
            id_attribute: "data-novel-id",
            catalog_path: "/ajax/chapter-archive?novelId={id}",
            link_selector: ".list-chapter a",
        }),
        extractor: ChapterExtractor {
            title_selector: Some("h2 a.chr-title span.chr-text"),
            content_selector: "div#chr-content",
            paragraph_selector: "p",
        },
        metadata: MetadataRules {
            title_selector: "h3.title",
            author_selector: "ul.info-meta a[href*=\"/authors/\"]",
        },
    }
}
