//! Backing store abstraction.
//!
//! This module defines the [`NewsStore`] trait, the contract between the ranking
//! core and whatever holds the articles, keywords and ratings. The core never
//! reaches for a global client: a store is always injected, which lets tests
//! substitute [`MemoryStore`](crate::storage::MemoryStore).
//!
//! # Design Philosophy
//!
//! The trait mirrors the queries the dashboard actually issues, not a generic
//! repository. Ordering and paging happen in the store; filtering by search term
//! and region happens client-side in [`crate::pipeline`].

use async_trait::async_trait;

use crate::domain::{
    Article, ArticleRating, Competitor, CompetitorArticle, DateRange, Keyword, KeywordComparison, Result,
};
use crate::pipeline::SortDirection;

/// One backend page request: records inside `range`, ordered by `order_by`,
/// starting at `offset`, at most `limit` of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub range: DateRange,
    /// Backend column, e.g. `average_score` or `trending_score`.
    pub order_by: &'static str,
    pub direction: SortDirection,
    pub offset: usize,
    pub limit: usize,
}

/// Abstraction over the backing news store.
///
/// Implementations must be shareable across tasks; every method takes `&self`.
///
/// # Implementations
///
/// - [`MemoryStore`](crate::storage::MemoryStore): in-process dataset behind a lock
/// - [`JsonStore`](crate::storage::JsonStore): dataset file with atomic writes
///
/// # Examples
///
/// ```no_run
/// use newsrank::domain::DateRange;
/// use newsrank::pipeline::SortDirection;
/// use newsrank::storage::{JsonStore, NewsStore, PageQuery};
///
/// # async fn run() -> newsrank::Result<()> {
/// let store = JsonStore::open("/tmp/newsrank.json")?;
/// let page = store
///     .fetch_articles(&PageQuery {
///         range: DateRange::today(),
///         order_by: "total_score",
///         direction: SortDirection::Desc,
///         offset: 0,
///         limit: 500,
///     })
///     .await?;
/// println!("{} articles", page.len());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait NewsStore: Send + Sync {
    /// One page of articles published inside the query range.
    ///
    /// # Errors
    ///
    /// Returns [`Fetch`](crate::NewsrankError::Fetch) if the query fails.
    async fn fetch_articles(&self, query: &PageQuery) -> Result<Vec<Article>>;

    /// Articles matching `keyword`, in store order, regardless of date.
    ///
    /// # Errors
    ///
    /// Returns [`Fetch`](crate::NewsrankError::Fetch) if the query fails.
    async fn fetch_articles_by_keyword(&self, keyword: &str, offset: usize, limit: usize) -> Result<Vec<Article>>;

    /// Articles sharing at least one of `keywords`, optionally excluding one id and
    /// optionally restricted to `range`.
    ///
    /// # Errors
    ///
    /// Returns [`Fetch`](crate::NewsrankError::Fetch) if the query fails.
    async fn fetch_articles_by_keywords(
        &self,
        keywords: &[String],
        exclude_id: Option<&str>,
        range: Option<&DateRange>,
    ) -> Result<Vec<Article>>;

    /// A single article by id, `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Fetch`](crate::NewsrankError::Fetch) if the query fails.
    async fn fetch_article(&self, id: &str) -> Result<Option<Article>>;

    /// One page of keywords whose scores were calculated inside the query range.
    ///
    /// # Errors
    ///
    /// Returns [`Fetch`](crate::NewsrankError::Fetch) if the query fails.
    async fn fetch_keywords(&self, query: &PageQuery) -> Result<Vec<Keyword>>;

    /// Saves a rating and returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`Persistence`](crate::NewsrankError::Persistence) if the store rejects it.
    async fn persist_rating(&self, article_id: &str, rating: u8) -> Result<ArticleRating>;

    /// Competitor articles published inside `range`, unordered.
    ///
    /// # Errors
    ///
    /// Returns [`Fetch`](crate::NewsrankError::Fetch) if the query fails.
    async fn fetch_seo_articles(&self, range: &DateRange) -> Result<Vec<CompetitorArticle>>;

    /// All tracked competitors, unordered.
    ///
    /// # Errors
    ///
    /// Returns [`Fetch`](crate::NewsrankError::Fetch) if the query fails.
    async fn fetch_competitors(&self) -> Result<Vec<Competitor>>;

    /// Per-keyword scores for us against one competitor, unordered.
    ///
    /// Unknown competitors yield an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`Fetch`](crate::NewsrankError::Fetch) if the query fails.
    async fn fetch_keyword_comparisons(&self, competitor_id: &str) -> Result<Vec<KeywordComparison>>;
}
