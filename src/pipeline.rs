//! One run, landing page to package: metadata and discovery, then ingestion and assembly.
//! Writing the package is left to the caller so a dry run can stop after discovery.

use crate::epub::{assemble, Package, PackageOptions};
use crate::ingest::{ingest, ChapterLimit, IngestReport, Pacing};
use crate::model::{ChapterAddress, WorkMetadata};
use crate::scraper::{resolve_metadata, DiscoveryError, Fetch, SiteProfile};
use reqwest::Url;

/// Result of reading the landing page.
#[derive(Debug)]
pub struct Prepared {
    pub landing: Url,
    pub metadata: WorkMetadata,
    /// Never empty.
    pub addresses: Vec<ChapterAddress>,
}

/// Settings for the ingestion half of a run.
pub struct BindOptions<'a> {
    pub limit: ChapterLimit,
    pub pacing: Pacing,
    pub language: String,
    /// Called with (attempted, total) after each chapter.
    pub progress: Option<&'a dyn Fn(usize, usize)>,
}

/// Package plus the ingestion report it was built from.
#[derive(Debug)]
pub struct Bound {
    pub package: Package,
    pub report: IngestReport,
}

/// Resolve metadata and discover the chapter sequence. An empty sequence is
/// [DiscoveryError::NoChapters].
pub fn prepare(
    fetcher: &dyn Fetch,
    landing: &Url,
    profile: &SiteProfile,
) -> Result<Prepared, DiscoveryError> {
    tracing::info!(site = profile.site.name(), "Reading {}", landing);
    let metadata = resolve_metadata(fetcher, landing, &profile.metadata);
    let addresses = profile.discovery.discover(fetcher, landing)?;
    if addresses.is_empty() {
        return Err(DiscoveryError::NoChapters);
    }
    tracing::info!(
        chapters = addresses.len(),
        "Found \"{}\" by {}",
        metadata.title,
        metadata.author
    );
    Ok(Prepared {
        landing: landing.clone(),
        metadata,
        addresses,
    })
}

/// Extract the selected chapters and assemble the package.
pub fn bind(
    fetcher: &dyn Fetch,
    profile: &SiteProfile,
    prepared: &Prepared,
    options: &BindOptions<'_>,
) -> Bound {
    let report = ingest(
        fetcher,
        &profile.extractor,
        &prepared.addresses,
        options.limit,
        &options.pacing,
        options.progress,
    );
    let package = assemble(
        &prepared.metadata,
        &report.records,
        &PackageOptions {
            identifier: prepared.landing.to_string(),
            language: options.language.clone(),
        },
    );
    if package.is_empty() {
        tracing::warn!("No chapters could be extracted; the package will have no content");
    }
    Bound { package, report }
}
