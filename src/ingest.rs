//! Ingestion driver: runs the chapter extractor over the discovered addresses, in order, with a
//! fixed pause between requests. Failed chapters are logged and skipped.

use crate::model::{ChapterAddress, ChapterRecord};
use crate::scraper::{ChapterExtractor, ExtractError, Fetch};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DELAY_MS: u64 = 1000;

/// How many discovered chapters to process, counted from the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChapterLimit {
    #[default]
    All,
    First(usize),
}

impl ChapterLimit {
    /// The prefix of `addresses` this limit selects.
    pub fn apply<'a>(&self, addresses: &'a [ChapterAddress]) -> &'a [ChapterAddress] {
        match *self {
            ChapterLimit::All => addresses,
            ChapterLimit::First(n) => &addresses[..n.min(addresses.len())],
        }
    }
}

impl FromStr for ChapterLimit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(ChapterLimit::All);
        }
        match s.parse::<usize>() {
            Ok(0) => Err("Chapter limit must be a positive number or 'all'.".to_string()),
            Ok(n) => Ok(ChapterLimit::First(n)),
            Err(_) => Err(format!(
                "Invalid chapter limit '{}': use a positive number or 'all'.",
                s
            )),
        }
    }
}

/// Pause between consecutive chapter requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub delay: Duration,
}

impl Pacing {
    pub fn from_millis(ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(ms),
        }
    }

    pub fn none() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }

    fn pause(&self) {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::from_millis(DEFAULT_DELAY_MS)
    }
}

/// A chapter that could not be extracted.
#[derive(Debug)]
pub struct SkippedChapter {
    pub position: usize,
    pub url: String,
    pub reason: ExtractError,
}

/// Result of an ingestion run.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Successful chapters; ordinals are 1..=records.len().
    pub records: Vec<ChapterRecord>,
    pub skipped: Vec<SkippedChapter>,
    /// Number of extractor invocations.
    pub attempted: usize,
}

/// Extract every address selected by `limit`, in order.
///
/// `progress` is called after each attempt with (attempted, total). An empty input or one where
/// every chapter fails yields an empty report.
pub fn ingest(
    fetcher: &dyn Fetch,
    extractor: &ChapterExtractor,
    addresses: &[ChapterAddress],
    limit: ChapterLimit,
    pacing: &Pacing,
    progress: Option<&dyn Fn(usize, usize)>,
) -> IngestReport {
    let selected = limit.apply(addresses);
    let total = selected.len();
    let mut report = IngestReport {
        records: Vec::with_capacity(total),
        ..IngestReport::default()
    };

    for (i, address) in selected.iter().enumerate() {
        if i > 0 {
            pacing.pause();
        }
        report.attempted += 1;
        match extractor.extract(fetcher, address) {
            Ok(chapter) => {
                let ordinal = report.records.len() as u32 + 1;
                tracing::debug!(
                    ordinal,
                    position = address.position + 1,
                    "Scraped chapter: {}",
                    chapter.title
                );
                report.records.push(ChapterRecord {
                    ordinal,
                    title: chapter.title,
                    body: chapter.body,
                    source_url: address.url.clone(),
                });
            }
            Err(reason) => {
                tracing::warn!(
                    position = address.position + 1,
                    "Skipped {}: {}",
                    address.url,
                    reason
                );
                report.skipped.push(SkippedChapter {
                    position: address.position,
                    url: address.url.clone(),
                    reason,
                });
            }
        }
        if let Some(p) = progress {
            p(i + 1, total);
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::testing::StubFetcher;
    use std::cell::RefCell;

    fn extractor() -> ChapterExtractor {
        ChapterExtractor {
            title_selector: Some("h2"),
            content_selector: "div.content",
            paragraph_selector: "p",
        }
    }

    fn chapter_page(title: &str) -> String {
        format!(
            "<h2>{}</h2><div class=\"content\"><p>Text of {}.</p></div>",
            title, title
        )
    }

    fn url(n: usize) -> String {
        format!("https://x.com/work/chapter-{}/", n)
    }

    /// Stub serving chapters 1..=count, except the listed failures.
    fn stub_with(count: usize, failing: &[usize]) -> StubFetcher {
        (1..=count)
            .filter(|n| !failing.contains(n))
            .fold(StubFetcher::new(), |stub, n| {
                stub.page(&url(n), &chapter_page(&format!("Ch{}", n)))
            })
    }

    fn addresses(count: usize) -> Vec<ChapterAddress> {
        ChapterAddress::sequence((1..=count).map(url))
    }

    #[test]
    fn invocations_are_min_of_length_and_cap() {
        for (len, limit, expected) in [
            (6, ChapterLimit::First(4), 4),
            (3, ChapterLimit::First(10), 3),
            (5, ChapterLimit::All, 5),
            (0, ChapterLimit::First(2), 0),
        ] {
            let stub = stub_with(len, &[]);
            let report = ingest(&stub, &extractor(), &addresses(len), limit, &Pacing::none(), None);
            assert_eq!(report.attempted, expected);
            assert_eq!(stub.requests().len(), expected);
        }
    }

    #[test]
    fn ordinals_are_gapless_over_successes() {
        let stub = stub_with(6, &[2, 5]);
        let report = ingest(&stub, &extractor(), &addresses(6), ChapterLimit::All, &Pacing::none(), None);
        let ordinals: Vec<u32> = report.records.iter().map(|r| r.ordinal).collect();
        let titles: Vec<&str> = report.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(ordinals, vec![1, 2, 3, 4]);
        assert_eq!(titles, vec!["Ch1", "Ch3", "Ch4", "Ch6"]);
        let skipped: Vec<usize> = report.skipped.iter().map(|s| s.position).collect();
        assert_eq!(skipped, vec![1, 4]);
        assert_eq!(report.attempted, 6);
    }

    #[test]
    fn all_failures_is_an_empty_report() {
        let stub = StubFetcher::new();
        let report = ingest(&stub, &extractor(), &addresses(3), ChapterLimit::All, &Pacing::none(), None);
        assert!(report.records.is_empty());
        assert_eq!(report.skipped.len(), 3);
        assert!(matches!(report.skipped[0].reason, ExtractError::Network(_)));
    }

    #[test]
    fn empty_input_is_an_empty_report() {
        let stub = StubFetcher::new();
        let report = ingest(&stub, &extractor(), &[], ChapterLimit::All, &Pacing::none(), None);
        assert_eq!(report.attempted, 0);
        assert!(report.records.is_empty());
        assert!(stub.requests().is_empty());
    }

    #[test]
    fn progress_reports_every_attempt() {
        let stub = stub_with(3, &[2]);
        let calls = RefCell::new(Vec::new());
        let cb = |done: usize, total: usize| calls.borrow_mut().push((done, total));
        ingest(&stub, &extractor(), &addresses(3), ChapterLimit::All, &Pacing::none(), Some(&cb));
        assert_eq!(calls.into_inner(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn pacing_waits_between_requests_only() {
        let stub = stub_with(3, &[]);
        let pacing = Pacing::from_millis(20);
        let started = std::time::Instant::now();
        ingest(&stub, &extractor(), &addresses(3), ChapterLimit::All, &pacing, None);
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn only_skips_are_logged_at_info() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let stub = stub_with(3, &[2]);
        tracing::subscriber::with_default(subscriber, || {
            ingest(&stub, &extractor(), &addresses(3), ChapterLimit::All, &Pacing::none(), None)
        });
        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.lines().count(), 1, "unexpected log output: {}", output);
        assert!(output.contains("Skipped https://x.com/work/chapter-2/"));
        assert!(!output.contains("Scraped chapter"));
    }

    #[test]
    fn chapter_limit_parses_all_and_positive_numbers() {
        assert_eq!("all".parse::<ChapterLimit>(), Ok(ChapterLimit::All));
        assert_eq!("ALL".parse::<ChapterLimit>(), Ok(ChapterLimit::All));
        assert_eq!(" 12 ".parse::<ChapterLimit>(), Ok(ChapterLimit::First(12)));
        assert!("0".parse::<ChapterLimit>().is_err());
        assert!("-3".parse::<ChapterLimit>().is_err());
        assert!("ten".parse::<ChapterLimit>().is_err());
    }
}
