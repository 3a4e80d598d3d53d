//! novelbind: CLI scraper for serialized web novels (readnovelfull, webnoveltranslations),
//! outputting EPUB.

pub mod cli;
pub mod config;
pub mod epub;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod scraper;

// Re-exports for CLI and consumers.
pub use epub::{assemble, write_package, Package, PackageError, PackageOptions};
pub use ingest::{ingest, ChapterLimit, IngestReport, Pacing};
pub use model::{ChapterAddress, ChapterRecord, WorkMetadata};
pub use scraper::{
    resolve_site, DiscoverChapters, DiscoveryError, ExtractError, Fetch, FetchConfig, FetchError,
    HttpFetcher, Site, SiteProfile,
};
