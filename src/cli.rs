//! CLI parsing and orchestration. Parses args, merges them with the config file, runs the
//! pipeline and writes the EPUB. Maps errors to exit codes.

use crate::config::{self, Config, DEFAULT_LANGUAGE};
use crate::epub::{write_package, PackageError};
use crate::ingest::{ChapterLimit, Pacing, DEFAULT_DELAY_MS};
use crate::pipeline::{bind, prepare, BindOptions};
use crate::scraper::{
    resolve_site, DiscoveryError, FetchConfig, HttpFetcher, Site, DEFAULT_TIMEOUT_SECS,
    DEFAULT_USER_AGENT,
};
use clap::Parser;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Discovery(#[from] DiscoveryError),

    #[error("{0}")]
    Package(#[from] PackageError),
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) => 1,
            CliRunError::Discovery(_) => 2,
            CliRunError::Package(_) => 3,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "novelbind")]
#[command(about = "Scrape a web novel from readnovelfull or webnoveltranslations and write EPUB")]
#[command(
    after_help = "Config file keys (output_dir, user_agent, delay_ms, timeout_secs, chapter_limit, language, [headers]) are read from ./novelbind.toml or the user config dir. CLI flags override config."
)]
pub struct Args {
    /// Novel landing page URL.
    pub url: String,

    /// Number of chapters to fetch from the start, or "all" (default: all).
    #[arg(value_parser = parse_limit)]
    pub limit: Option<ChapterLimit>,

    /// Output path. Default: {output_dir}/{slugified-title}.epub.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override site detection (readnovelfull or webnoveltranslations).
    #[arg(long, value_parser = parse_site)]
    pub site: Option<Site>,

    /// Pause between chapter requests in milliseconds (default 1000).
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Request timeout in seconds (default 30).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// HTTP User-Agent.
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Package language tag (default "en").
    #[arg(long)]
    pub language: Option<String>,

    /// Read the landing page and list chapters only; print chapter count and output path.
    #[arg(long)]
    pub dry_run: bool,

    /// Warnings and errors only, no progress bar.
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug logging and the full error chain.
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_limit(s: &str) -> Result<ChapterLimit, String> {
    s.parse()
}

fn parse_site(s: &str) -> Result<Site, String> {
    match s.to_lowercase().as_str() {
        "readnovelfull" | "rnf" => Ok(Site::ReadNovelFull),
        "webnoveltranslations" | "wnt" => Ok(Site::WebNovelTranslations),
        _ => Err(format!(
            "Invalid --site value: '{}'. Use 'readnovelfull' or 'webnoveltranslations'.",
            s
        )),
    }
}

/// File name stem for a work title: lowercase, whitespace to `_`, path-unsafe characters
/// dropped; "book" if nothing is left.
fn slugify(title: &str) -> String {
    let s: String = title
        .trim()
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .flat_map(|c| {
            if c.is_whitespace() {
                '_'.to_lowercase()
            } else {
                c.to_lowercase()
            }
        })
        .collect();
    if s.trim_matches('_').is_empty() {
        "book".to_string()
    } else {
        s
    }
}

/// Ensure output path parent exists.
fn validate_output_path(path: &Path) -> Result<(), CliRunError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(CliRunError::InvalidInput(format!(
                "Cannot write output: {}: parent directory does not exist.",
                path.display()
            )));
        }
    }
    Ok(())
}

/// Effective run settings: CLI flags, then config file, then defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    fetch: FetchConfig,
    delay_ms: u64,
    limit: ChapterLimit,
    language: String,
    output_dir: PathBuf,
}

fn resolve_settings(args: &Args, config: Option<&Config>) -> Result<Settings, CliRunError> {
    let config_limit = match config {
        Some(c) => c.chapter_limit().map_err(CliRunError::InvalidInput)?,
        None => None,
    };
    Ok(Settings {
        fetch: FetchConfig {
            user_agent: args
                .user_agent
                .clone()
                .or_else(|| config.and_then(|c| c.user_agent.clone()))
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            timeout_secs: args
                .timeout
                .or_else(|| config.and_then(|c| c.timeout_secs))
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            headers: config.map(Config::header_pairs).unwrap_or_default(),
        },
        delay_ms: args
            .delay_ms
            .or_else(|| config.and_then(|c| c.delay_ms))
            .unwrap_or(DEFAULT_DELAY_MS),
        limit: args.limit.or(config_limit).unwrap_or_default(),
        language: args
            .language
            .clone()
            .or_else(|| config.and_then(|c| c.language.clone()))
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        output_dir: config
            .and_then(|c| c.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from(".")),
    })
}

/// Entry point for the CLI. Returns Ok(()) on success; Err with exit code and message on failure.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    let (landing, site) = resolve_site(&args.url, args.site).map_err(|e| match e {
        DiscoveryError::InvalidAddress { .. } => CliRunError::InvalidInput(format!(
            "Expected a novel URL. Example: https://readnovelfull.com/some-novel.html. {}",
            e
        )),
        other => CliRunError::Discovery(other),
    })?;

    let config = config::load_config().map_err(CliRunError::InvalidInput)?;
    let settings = resolve_settings(args, config.as_ref())?;
    let fetcher = HttpFetcher::new(&settings.fetch)
        .map_err(|e| CliRunError::InvalidInput(e.to_string()))?;
    let profile = site.profile();

    let prepared = prepare(&fetcher, &landing, &profile)?;
    let output_path = match &args.output {
        Some(p) => p.clone(),
        None => settings
            .output_dir
            .join(format!("{}.epub", slugify(&prepared.metadata.title))),
    };

    if args.dry_run {
        println!("Title: {}", prepared.metadata.title);
        println!("Author: {}", prepared.metadata.author);
        println!(
            "Chapters: {} (would fetch {})",
            prepared.addresses.len(),
            settings.limit.apply(&prepared.addresses).len()
        );
        println!("Output: {}", output_path.display());
        return Ok(());
    }

    validate_output_path(&output_path)?;

    let progress_state: RefCell<Option<indicatif::ProgressBar>> = RefCell::new(None);
    let progress_cb = |n: usize, total: usize| {
        if total == 0 {
            return;
        }
        let mut state = progress_state.borrow_mut();
        let pb = state.get_or_insert_with(|| {
            let bar = indicatif::ProgressBar::new(total as u64);
            let style = indicatif::ProgressStyle::with_template(
                "{spinner} {msg} [{bar:40}] {pos}/{len} ({elapsed})",
            )
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .progress_chars("█▉▊▋▌▍▎▏ ");
            bar.set_style(style);
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        pb.set_position(n as u64);
        pb.set_message(format!("Chapter {}/{}", n, total));
    };
    let progress: Option<&dyn Fn(usize, usize)> = if args.quiet { None } else { Some(&progress_cb) };

    let bound = bind(
        &fetcher,
        &profile,
        &prepared,
        &BindOptions {
            limit: settings.limit,
            pacing: Pacing::from_millis(settings.delay_ms),
            language: settings.language.clone(),
            progress,
        },
    );

    if let Some(pb) = progress_state.borrow_mut().take() {
        pb.disable_steady_tick();
        pb.finish_and_clear();
    }

    write_package(&bound.package, &output_path)?;

    tracing::info!(
        chapters = bound.package.chapter_count(),
        skipped = bound.report.skipped.len(),
        "Wrote {}",
        output_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["novelbind", "https://readnovelfull.com/x.html"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn slugify_lowercases_and_underscores() {
        assert_eq!(slugify("Mother of Learning"), "mother_of_learning");
        assert_eq!(slugify("Heaven Official's Blessing"), "heaven_official's_blessing");
    }

    #[test]
    fn slugify_drops_path_unsafe_characters() {
        assert_eq!(slugify("A/B: C?"), "ab_c");
        assert_eq!(slugify(r#"<"Why"> | \ *"#), "why___");
    }

    #[test]
    fn slugify_empty_falls_back_to_book() {
        assert_eq!(slugify(""), "book");
        assert_eq!(slugify("  ?/  "), "book");
    }

    #[test]
    fn parse_site_names_and_aliases() {
        assert_eq!(parse_site("readnovelfull").unwrap(), Site::ReadNovelFull);
        assert_eq!(parse_site("RNF").unwrap(), Site::ReadNovelFull);
        assert_eq!(
            parse_site("webnoveltranslations").unwrap(),
            Site::WebNovelTranslations
        );
        assert_eq!(parse_site("wnt").unwrap(), Site::WebNovelTranslations);
        assert!(parse_site("royalroad").is_err());
    }

    #[test]
    fn positional_limit_parses() {
        assert_eq!(args(&[]).limit, None);
        assert_eq!(args(&["5"]).limit, Some(ChapterLimit::First(5)));
        assert_eq!(args(&["all"]).limit, Some(ChapterLimit::All));
        assert!(Args::try_parse_from(["novelbind", "https://x.com/", "0"]).is_err());
    }

    #[test]
    fn defaults_without_config() {
        let s = resolve_settings(&args(&[]), None).unwrap();
        assert_eq!(s.fetch, FetchConfig::default());
        assert_eq!(s.delay_ms, 1000);
        assert_eq!(s.limit, ChapterLimit::All);
        assert_eq!(s.language, "en");
        assert_eq!(s.output_dir, PathBuf::from("."));
    }

    #[test]
    fn flags_override_config_and_config_overrides_defaults() {
        let config: Config = toml::from_str(
            r#"
            output_dir = "books"
            user_agent = "FromConfig/1.0"
            delay_ms = 300
            timeout_secs = 45
            chapter_limit = "10"
            language = "fr"
            [headers]
            Referer = "https://readnovelfull.com/"
        "#,
        )
        .unwrap();
        let s = resolve_settings(
            &args(&["3", "--delay-ms", "50", "--user-agent", "FromFlag/2.0"]),
            Some(&config),
        )
        .unwrap();
        assert_eq!(s.fetch.user_agent, "FromFlag/2.0");
        assert_eq!(s.fetch.timeout_secs, 45);
        assert_eq!(
            s.fetch.headers,
            vec![("Referer".to_string(), "https://readnovelfull.com/".to_string())]
        );
        assert_eq!(s.delay_ms, 50);
        assert_eq!(s.limit, ChapterLimit::First(3));
        assert_eq!(s.language, "fr");
        assert_eq!(s.output_dir, PathBuf::from("books"));
    }

    #[test]
    fn invalid_config_limit_is_invalid_input() {
        let config: Config = toml::from_str(r#"chapter_limit = "-1""#).unwrap();
        let err = resolve_settings(&args(&[]), Some(&config)).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn validate_output_path_parent_exists() {
        let path = std::env::temp_dir().join("novelbind_cli_test_output.epub");
        assert!(validate_output_path(&path).is_ok());
    }

    #[test]
    fn validate_output_path_parent_missing() {
        let path = PathBuf::from("/nonexistent_dir_novelbind_xyz/output.epub");
        let result = validate_output_path(&path);
        assert!(result.is_err());
        if let Err(CliRunError::InvalidInput(msg)) = result {
            assert!(msg.contains("parent directory does not exist"));
        }
    }

    #[test]
    fn unsupported_url_is_invalid_input() {
        let err = run(&Args::try_parse_from(["novelbind", "https://example.com/novel"]).unwrap())
            .unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("--site"));
    }

    #[test]
    fn cli_run_error_exit_codes() {
        assert_eq!(CliRunError::InvalidInput("x".into()).exit_code(), 1);
        assert_eq!(CliRunError::Discovery(DiscoveryError::NoChapters).exit_code(), 2);
        assert_eq!(
            CliRunError::Discovery(DiscoveryError::MissingRange {
                first: Some(5),
                last: Some(3)
            })
            .exit_code(),
            2
        );
        assert_eq!(
            CliRunError::Package(PackageError::DanglingReference {
                detail: "x".into()
            })
            .exit_code(),
            3
        );
    }
}
