//! JSON file-based store.
//!
//! The whole dataset is loaded into memory when the store is opened and written
//! back after every accepted rating. Writes are atomic (write-to-temp + rename)
//! so a crash never leaves a half-written dataset.
//!
//! # Performance Characteristics
//!
//! - **Read**: served from memory after the initial load
//! - **Write**: O(n), the entire dataset is serialized on each rating
//! - **Best for**: local snapshots and demos, a few thousand articles

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::domain::{
    Article, ArticleRating, Competitor, CompetitorArticle, DateRange, Keyword, KeywordComparison,
    NewsrankError, Result,
};
use crate::storage::backend::{NewsStore, PageQuery};
use crate::storage::dataset::Dataset;
use crate::storage::models::{DatasetFile, DATASET_VERSION};

/// [`NewsStore`] backed by a dataset file.
///
/// # File Format
///
/// See [`DatasetFile`]. Unknown versions are rejected.
#[derive(Debug)]
pub struct JsonStore {
    /// Path to the JSON file on disk.
    file_path: PathBuf,

    /// In-memory copy, loaded on open.
    data: RwLock<Dataset>,
}

impl JsonStore {
    /// Opens a dataset file, starting empty if it does not exist yet.
    ///
    /// Parent directories are created automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory creation fails
    /// - The file exists but is not a valid dataset
    /// - File permissions prevent reading
    pub fn open(file_path: impl AsRef<Path>) -> Result<Self> {
        let file_path = file_path.as_ref().to_path_buf();
        tracing::debug!(path = ?file_path, "opening dataset");

        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let data = if file_path.exists() {
            Self::load_from_file(&file_path)?
        } else {
            tracing::debug!("dataset file missing, starting empty");
            Dataset::default()
        };

        tracing::debug!(
            articles = data.articles.len(),
            keywords = data.keywords.len(),
            ratings = data.ratings.len(),
            "dataset loaded"
        );

        Ok(Self {
            file_path,
            data: RwLock::new(data),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn load_from_file(path: &Path) -> Result<Dataset> {
        let contents = std::fs::read_to_string(path)?;
        let file: DatasetFile = serde_json::from_str(&contents)
            .map_err(|e| NewsrankError::Storage(format!("failed to parse dataset: {e}")))?;

        if file.version != DATASET_VERSION {
            return Err(NewsrankError::Storage(format!(
                "unsupported dataset version {} (expected {DATASET_VERSION})",
                file.version
            )));
        }
        Ok(Dataset::from(file))
    }

    /// Writes `data` to a temporary sibling file, then renames it over the target.
    ///
    /// Serialization happens on the caller; the file I/O runs on the blocking pool.
    async fn save_to_file(&self, data: &Dataset) -> Result<()> {
        let json = serde_json::to_string_pretty(&DatasetFile::from(data))
            .map_err(|e| NewsrankError::Storage(format!("failed to serialize dataset: {e}")))?;

        let path = self.file_path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &json))
            .await
            .map_err(|e| NewsrankError::Storage(format!("save task failed: {e}")))??;

        tracing::debug!(path = ?self.file_path, "dataset saved");
        Ok(())
    }
}

fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    tracing::trace!(tmp_path = ?tmp_path, "writing to temporary file");
    std::fs::write(&tmp_path, contents)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[async_trait]
impl NewsStore for JsonStore {
    async fn fetch_articles(&self, query: &PageQuery) -> Result<Vec<Article>> {
        let page = self.data.read().await.articles_page(query);
        tracing::debug!(offset = query.offset, count = page.len(), "articles page read");
        Ok(page)
    }

    async fn fetch_articles_by_keyword(&self, keyword: &str, offset: usize, limit: usize) -> Result<Vec<Article>> {
        Ok(self.data.read().await.articles_by_keyword(keyword, offset, limit))
    }

    async fn fetch_articles_by_keywords(
        &self,
        keywords: &[String],
        exclude_id: Option<&str>,
        range: Option<&DateRange>,
    ) -> Result<Vec<Article>> {
        Ok(self.data.read().await.articles_by_keywords(keywords, exclude_id, range))
    }

    async fn fetch_article(&self, id: &str) -> Result<Option<Article>> {
        Ok(self.data.read().await.article(id))
    }

    async fn fetch_keywords(&self, query: &PageQuery) -> Result<Vec<Keyword>> {
        let page = self.data.read().await.keywords_page(query);
        tracing::debug!(offset = query.offset, count = page.len(), "keywords page read");
        Ok(page)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn persist_rating(&self, article_id: &str, rating: u8) -> Result<ArticleRating> {
        let mut data = self.data.write().await;
        let mut next = data.clone();
        let saved = next.add_rating(article_id, rating)?;
        self.save_to_file(&next)
            .await
            .map_err(|e| NewsrankError::Persistence(e.to_string()))?;
        *data = next;

        tracing::debug!(rating_id = %saved.id, "rating persisted");
        Ok(saved)
    }

    async fn fetch_seo_articles(&self, range: &DateRange) -> Result<Vec<CompetitorArticle>> {
        Ok(self.data.read().await.seo_articles(range))
    }

    async fn fetch_competitors(&self) -> Result<Vec<Competitor>> {
        Ok(self.data.read().await.competitors.clone())
    }

    async fn fetch_keyword_comparisons(&self, competitor_id: &str) -> Result<Vec<KeywordComparison>> {
        Ok(self.data.read().await.keyword_comparisons(competitor_id))
    }
}
