//! In-process store.
//!
//! Holds a [`Dataset`] behind an async lock. Used by tests as the injected fake;
//! it can be switched offline to make every read fail, which is how fetch
//! failures are exercised.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::domain::{
    Article, ArticleRating, Competitor, CompetitorArticle, DateRange, Keyword, KeywordComparison,
    NewsrankError, Result,
};
use crate::storage::backend::{NewsStore, PageQuery};
use crate::storage::dataset::Dataset;

/// [`NewsStore`] over an in-memory [`Dataset`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Dataset>,
    offline: AtomicBool,
    queries: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new(data: Dataset) -> Self {
        Self {
            data: RwLock::new(data),
            offline: AtomicBool::new(false),
            queries: AtomicUsize::new(0),
        }
    }

    /// While offline every query fails with [`NewsrankError::Fetch`] and ratings
    /// are rejected with [`NewsrankError::Persistence`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of queries answered or rejected so far.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Copy of the current dataset.
    pub async fn snapshot(&self) -> Dataset {
        self.data.read().await.clone()
    }

    fn check_online(&self) -> Result<()> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(NewsrankError::Fetch("store is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl NewsStore for MemoryStore {
    async fn fetch_articles(&self, query: &PageQuery) -> Result<Vec<Article>> {
        self.check_online()?;
        Ok(self.data.read().await.articles_page(query))
    }

    async fn fetch_articles_by_keyword(&self, keyword: &str, offset: usize, limit: usize) -> Result<Vec<Article>> {
        self.check_online()?;
        Ok(self.data.read().await.articles_by_keyword(keyword, offset, limit))
    }

    async fn fetch_articles_by_keywords(
        &self,
        keywords: &[String],
        exclude_id: Option<&str>,
        range: Option<&DateRange>,
    ) -> Result<Vec<Article>> {
        self.check_online()?;
        Ok(self.data.read().await.articles_by_keywords(keywords, exclude_id, range))
    }

    async fn fetch_article(&self, id: &str) -> Result<Option<Article>> {
        self.check_online()?;
        Ok(self.data.read().await.article(id))
    }

    async fn fetch_keywords(&self, query: &PageQuery) -> Result<Vec<Keyword>> {
        self.check_online()?;
        Ok(self.data.read().await.keywords_page(query))
    }

    async fn persist_rating(&self, article_id: &str, rating: u8) -> Result<ArticleRating> {
        self.check_online()
            .map_err(|e| NewsrankError::Persistence(e.to_string()))?;
        self.data.write().await.add_rating(article_id, rating)
    }

    async fn fetch_seo_articles(&self, range: &DateRange) -> Result<Vec<CompetitorArticle>> {
        self.check_online()?;
        Ok(self.data.read().await.seo_articles(range))
    }

    async fn fetch_competitors(&self) -> Result<Vec<Competitor>> {
        self.check_online()?;
        Ok(self.data.read().await.competitors.clone())
    }

    async fn fetch_keyword_comparisons(&self, competitor_id: &str) -> Result<Vec<KeywordComparison>> {
        self.check_online()?;
        Ok(self.data.read().await.keyword_comparisons(competitor_id))
    }
}
