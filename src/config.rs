//! Optional config file loading. Search order: ./novelbind.toml, then
//! $XDG_CONFIG_HOME/novelbind/config.toml (or ~/.config/novelbind/config.toml).

use crate::ingest::ChapterLimit;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "novelbind.toml";
pub const DEFAULT_LANGUAGE: &str = "en";

/// Config file contents. All fields optional; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Default output directory when -o is not set. Paths are relative to CWD.
    pub output_dir: Option<PathBuf>,
    /// HTTP User-Agent header.
    pub user_agent: Option<String>,
    /// Pause between chapter requests, in milliseconds.
    pub delay_ms: Option<u64>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// "all" or a positive number of chapters.
    pub chapter_limit: Option<String>,
    /// Package language tag, e.g. "en".
    pub language: Option<String>,
    /// Extra request headers.
    pub headers: BTreeMap<String, String>,
}

impl Config {
    /// Parsed `chapter_limit`, if set.
    pub fn chapter_limit(&self) -> Result<Option<ChapterLimit>, String> {
        self.chapter_limit
            .as_deref()
            .map(|s| s.parse::<ChapterLimit>().map_err(|e| format!("config chapter_limit: {}", e)))
            .transpose()
    }

    /// Headers in a stable order.
    pub fn header_pairs(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Candidate config paths, most specific first.
pub fn search_paths(cwd: &Path) -> Vec<PathBuf> {
    let mut paths = vec![cwd.join(CONFIG_FILE_NAME)];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("novelbind").join("config.toml"));
    }
    paths
}

/// First existing config in `paths`. Missing files return Ok(None); a present file that cannot
/// be read or parsed is an error.
pub fn load_from(paths: &[PathBuf]) -> Result<Option<Config>, String> {
    for path in paths {
        if path.exists() {
            let s = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
            let config: Config = toml::from_str(&s)
                .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
            tracing::debug!("Loaded config from {}", path.display());
            return Ok(Some(config));
        }
    }
    Ok(None)
}

pub fn load_config() -> Result<Option<Config>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    load_from(&search_paths(&cwd))
}
