//! Newsrank: scoring and incremental pagination for a news relevance dashboard.
//!
//! Newsrank ranks news articles by the relevance of their keywords and lets
//! editors rate articles, feeding those ratings back into the scores. It
//! provides:
//! - Keyword sub-scores (quantity, recency, relevance, trend) and the derived overall score
//! - Article scores as the sum and mean of their keywords' scores
//! - Rating-driven boosts for the rated article and the articles sharing its keywords
//! - Date-scoped, incrementally fetched collections with client-side search, region filter, sort and pagination
//! - Competitor SEO views: top competitor articles, competitor ranking, keyword comparison

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  CLI (main.rs)                                      │  ← Entry point
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │
//! │  - Dashboard and its events                         │
//! │  - Collection drivers (async fetch execution)       │
//! │  - Paged collection caches (pure state machines)    │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ Pipeline      │   │ Scoring       │   │ Storage       │
//! │ (pipeline/)   │   │ (scoring/)    │   │ (storage/)    │
//! │ - Search      │   │ - Sub-scores  │   │ - NewsStore   │
//! │ - Region      │   │ - Impact      │   │ - JSON file   │
//! │ - Sort, pages │   │ - Boosts      │   │ - In-memory   │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!         │                    │                    │
//! ┌─────────────────────────────────────────────────────┐
//! │  Infrastructure & Domain Layers                     │
//! │  - Data directory resolution (infrastructure/)      │
//! │  - Records, date ranges, errors (domain/)           │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Observability (observability/)                     │
//! │  - tracing subscriber, stderr output                │
//! │  - Optional OpenTelemetry span export to a file     │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`app`]: Paged collection caches, drivers and the dashboard facade
//! - [`domain`]: Core records (Article, Keyword, competitor types), date ranges, errors
//! - [`pipeline`]: Record abstraction, filters, comparator and pagination helpers
//! - [`scoring`]: Score model and rating impact engine
//! - [`storage`]: The `NewsStore` backend trait and its local implementations
//! - [`infrastructure`]: Data directory and path helpers
//! - [`observability`]: Tracing initialization
//!
//! # Configuration
//!
//! ```toml
//! # ~/.config/newsrank/config.toml
//! article_page_size = 500
//! keyword_page_size = 1000
//! items_per_page = 10
//! prefetch_threshold_pages = 3
//! data_file = "~/news/dataset.json"
//! trace_level = "newsrank=debug"
//! trace_file = "~/.local/share/newsrank/newsrank-spans.jsonl"
//! ```
//!
//! # Key Design Decisions
//!
//! ## Fetch Once Per Date Range
//!
//! Each collection buffers the records of exactly one date range. Search, region
//! and sort changes are answered from the buffer; only a range change refetches.
//! Further backend pages are pulled in ahead of time as the user pages towards
//! the end of what is buffered.
//!
//! ## Pure Caches, Async Drivers
//!
//! The cache never performs I/O. It returns fetch requests, and a driver runs
//! them without holding the cache lock, so at most one fetch per collection is
//! ever in flight.
//!
//! ## Ratings Patch, Never Refetch
//!
//! A rating rescales the rated article and its keyword neighbours, and the new
//! scores are merged into the buffer in place.

pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod observability;
pub mod pipeline;
pub mod scoring;
pub mod storage;

pub use app::{CacheConfig, Collection, Dashboard, Event, Notice, PageView, PagedCollectionCache};
pub use domain::{Article, DateRange, Keyword, NewsrankError, Preset, Result};
pub use pipeline::{ArticleField, KeywordField, Region, SortDirection};

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Runtime configuration.
///
/// Every field has a default, so a partial TOML file or an empty map is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Articles fetched per backend request. Default: 500
    pub article_page_size: usize,

    /// Keywords fetched per backend request. Default: 1000
    pub keyword_page_size: usize,

    /// Records per displayed page. Default: 10
    pub items_per_page: usize,

    /// Prefetch once the current page is within this many pages of the last
    /// buffered page. Default: 3
    pub prefetch_threshold_pages: usize,

    /// Dataset file. Defaults to `dataset.json` in the data directory.
    pub data_file: Option<PathBuf>,

    /// Filter directive, e.g. `debug` or `newsrank=trace`. `RUST_LOG` wins.
    pub trace_level: Option<String>,

    /// When set, finished spans are appended to this file as JSON lines.
    pub trace_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            article_page_size: 500,
            keyword_page_size: 1000,
            items_per_page: 10,
            prefetch_threshold_pages: 3,
            data_file: None,
            trace_level: None,
            trace_file: None,
        }
    }
}

impl Config {
    /// Reads a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`NewsrankError::Io`] when the file cannot be read and
    /// [`NewsrankError::Config`] when it is not valid TOML for this struct.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = infrastructure::expand_tilde(path);
        let contents = std::fs::read_to_string(&path)?;
        toml::from_str(&contents)
            .map_err(|e| NewsrankError::Config(format!("{}: {e}", path.display())))
    }

    /// Builds a configuration from string key/value pairs.
    ///
    /// Unknown keys are ignored. Values that fail to parse keep the value
    /// already in `self`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use newsrank::Config;
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("items_per_page".to_string(), "25".to_string());
    /// map.insert("prefetch_threshold_pages".to_string(), "many".to_string());
    ///
    /// let config = Config::default().merge_map(&map);
    /// assert_eq!(config.items_per_page, 25);
    /// assert_eq!(config.prefetch_threshold_pages, 3);
    /// ```
    #[must_use]
    pub fn merge_map(self, map: &BTreeMap<String, String>) -> Self {
        let number = |key: &str, current: usize| {
            map.get(key).map_or(current, |raw| {
                raw.trim().parse::<usize>().unwrap_or_else(|_| {
                    tracing::warn!(key, value = %raw, "ignoring unparsable config value");
                    current
                })
            })
        };
        let text = |key: &str| map.get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            article_page_size: number("article_page_size", self.article_page_size),
            keyword_page_size: number("keyword_page_size", self.keyword_page_size),
            items_per_page: number("items_per_page", self.items_per_page),
            prefetch_threshold_pages: number("prefetch_threshold_pages", self.prefetch_threshold_pages),
            data_file: text("data_file").map(PathBuf::from).or(self.data_file),
            trace_level: text("trace_level").or(self.trace_level),
            trace_file: text("trace_file").map(PathBuf::from).or(self.trace_file),
        }
    }

    /// [`Config::default`] overlaid with `map`. See [`Config::merge_map`].
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        Self::default().merge_map(map)
    }

    /// Cache settings for the article collection.
    #[must_use]
    pub const fn article_cache(&self) -> CacheConfig {
        CacheConfig {
            backend_page_size: self.article_page_size,
            items_per_page: self.items_per_page,
            prefetch_threshold_pages: self.prefetch_threshold_pages,
        }
    }

    /// Cache settings for the keyword collection.
    #[must_use]
    pub const fn keyword_cache(&self) -> CacheConfig {
        CacheConfig {
            backend_page_size: self.keyword_page_size,
            items_per_page: self.items_per_page,
            prefetch_threshold_pages: self.prefetch_threshold_pages,
        }
    }

    /// The dataset file, tilde-expanded, or the default location.
    #[must_use]
    pub fn dataset_path(&self) -> PathBuf {
        self.data_file
            .as_ref()
            .map_or_else(infrastructure::default_dataset_path, |path| infrastructure::expand_tilde(path))
    }
}

/// Sets up tracing and opens a dashboard over the configured dataset file.
///
/// # Errors
///
/// Returns the error of [`storage::JsonStore::open`] when the dataset file
/// exists but cannot be read or parsed.
///
/// # Example
///
/// ```no_run
/// use newsrank::{initialize, Config, DateRange};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> newsrank::Result<()> {
/// let dashboard = initialize(&Config::default())?;
/// let (articles, _keywords) = dashboard.set_date_range(DateRange::today()).await;
/// println!("{} articles on page 1", articles.records.len());
/// # Ok(())
/// # }
/// ```
pub fn initialize(config: &Config) -> Result<Dashboard> {
    observability::init_tracing(config);

    let path = config.dataset_path();
    tracing::debug!(path = %path.display(), "initializing newsrank");
    let store = storage::JsonStore::open(&path)?;
    Ok(Dashboard::new(Arc::new(store), config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str("items_per_page = 20\ntrace_level = \"debug\"").expect("valid toml");
        assert_eq!(config.items_per_page, 20);
        assert_eq!(config.article_page_size, 500);
        assert_eq!(config.keyword_cache().backend_page_size, 1000);
        assert_eq!(config.trace_level.as_deref(), Some("debug"));
    }

    #[test]
    fn map_overrides_fall_back_per_field() {
        let map: BTreeMap<String, String> = [
            ("article_page_size", "250"),
            ("keyword_page_size", "-1"),
            ("data_file", "  "),
            ("unrelated", "x"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = Config::from_map(&map);
        assert_eq!(config.article_cache().backend_page_size, 250);
        assert_eq!(config.keyword_page_size, 1000);
        assert_eq!(config.data_file, None);
    }

    #[test]
    fn from_file_reports_bad_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "items_per_page = \"ten\"").expect("write");
        assert!(matches!(Config::from_file(&path), Err(NewsrankError::Config(_))));
        assert!(matches!(
            Config::from_file(dir.path().join("missing.toml")),
            Err(NewsrankError::Io(_))
        ));
    }
}
