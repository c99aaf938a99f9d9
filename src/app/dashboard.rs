//! The dashboard: both paged collections plus rating and competitor views.
//!
//! A [`Dashboard`] owns one [`CollectionDriver`] per collection and the
//! [`RatingImpactEngine`], all sharing a single injected [`NewsStore`].
//! Competitor data is small and read whole, so it bypasses the cache.

use std::sync::Arc;

use crate::app::cache::{PageSlice, PageView, PagedCollectionCache};
use crate::app::driver::{CollectionDriver, StorePages};
use crate::app::events::{Collection, Event, Notice};
use crate::domain::{
    rank_competitors, split_keyword_comparison, top_competitor_articles, Article, Competitor,
    CompetitorArticle, DateRange, Keyword, KeywordComparison, Result,
};
use crate::pipeline::{paginate, total_pages};
use crate::scoring::{BoostPolicy, RatingImpactEngine, RatingOutcome, RatingScaledBoost};
use crate::storage::NewsStore;
use crate::Config;

/// Article and keyword rankings over one shared store.
pub struct Dashboard {
    store: Arc<dyn NewsStore>,
    articles: CollectionDriver<Article>,
    keywords: CollectionDriver<Keyword>,
    engine: RatingImpactEngine,
    items_per_page: usize,
    /// Cap on the articles read for one keyword drill-down.
    keyword_article_limit: usize,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("items_per_page", &self.items_per_page)
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    /// Builds a dashboard with the default boost policy.
    ///
    /// # Parameters
    ///
    /// * `store` - Backend shared by both collections and the rating engine
    /// * `config` - Page sizes and prefetch threshold
    #[must_use]
    pub fn new(store: Arc<dyn NewsStore>, config: &Config) -> Self {
        Self::with_policy(store, config, Arc::new(RatingScaledBoost))
    }

    #[must_use]
    pub fn with_policy(store: Arc<dyn NewsStore>, config: &Config, policy: Arc<dyn BoostPolicy>) -> Self {
        let pages = Arc::new(StorePages::new(store.clone()));
        Self {
            articles: CollectionDriver::new(
                PagedCollectionCache::new(Collection::Articles.as_str(), config.article_cache()),
                pages.clone(),
            ),
            keywords: CollectionDriver::new(
                PagedCollectionCache::new(Collection::Keywords.as_str(), config.keyword_cache()),
                pages,
            ),
            engine: RatingImpactEngine::with_policy(store.clone(), policy),
            store,
            items_per_page: config.items_per_page,
            keyword_article_limit: config.article_page_size,
        }
    }

    #[must_use]
    pub const fn articles(&self) -> &CollectionDriver<Article> {
        &self.articles
    }

    #[must_use]
    pub const fn keywords(&self) -> &CollectionDriver<Keyword> {
        &self.keywords
    }

    /// Points both collections at `range`.
    pub async fn set_date_range(&self, range: DateRange) -> (PageView<Article>, PageView<Keyword>) {
        let articles = self.articles.set_date_range(range).await;
        let keywords = self.keywords.set_date_range(range).await;
        (articles, keywords)
    }

    /// Persists a rating and merges the rescored articles into the article buffer.
    ///
    /// The rated article's related articles are looked up within the article
    /// collection's current date range.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRating`](crate::NewsrankError::InvalidRating) or
    /// [`Persistence`](crate::NewsrankError::Persistence). A failed rescoring is
    /// reported through [`RatingOutcome::recalculation_error`] instead.
    pub async fn on_rating_submitted(&self, article_id: &str, rating: i64) -> Result<RatingOutcome> {
        let range = self.articles.inspect(|cache| cache.range().copied()).await;
        let outcome = self.engine.rate(article_id, rating, range.as_ref()).await?;
        if !outcome.updated.is_empty() {
            self.articles.update_records(outcome.updated.clone()).await;
        }
        Ok(outcome)
    }

    /// Competitor articles in `range`, best SEO score first, one page at a time.
    ///
    /// A store failure yields an empty first page.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPage`](crate::NewsrankError::InvalidPage) for pages outside the view.
    pub async fn top_competitor_articles(&self, range: &DateRange, page: usize) -> Result<PageSlice<CompetitorArticle>> {
        let all = match self.store.fetch_seo_articles(range).await {
            Ok(all) => all,
            Err(error) => {
                tracing::warn!(%error, "competitor articles unavailable");
                Vec::new()
            }
        };
        let ranked = top_competitor_articles(&all, range);
        let records = paginate(&ranked, page, self.items_per_page)?.to_vec();
        Ok(PageSlice {
            records,
            page,
            total_pages: total_pages(ranked.len(), self.items_per_page),
            total_count: ranked.len(),
        })
    }

    /// Articles tagged with `keyword`, in store order and regardless of the
    /// date range, one page at a time.
    ///
    /// At most one backend page of articles is read. A store failure yields an
    /// empty first page.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPage`](crate::NewsrankError::InvalidPage) for pages outside the view.
    pub async fn keyword_articles(&self, keyword: &str, page: usize) -> Result<PageSlice<Article>> {
        let all = match self
            .store
            .fetch_articles_by_keyword(keyword, 0, self.keyword_article_limit)
            .await
        {
            Ok(all) => all,
            Err(error) => {
                tracing::warn!(%error, keyword, "keyword articles unavailable");
                Vec::new()
            }
        };
        let records = paginate(&all, page, self.items_per_page)?.to_vec();
        Ok(PageSlice {
            records,
            page,
            total_pages: total_pages(all.len(), self.items_per_page),
            total_count: all.len(),
        })
    }

    /// Competitors by average keyword position, best first.
    pub async fn competitor_ranking(&self) -> Vec<Competitor> {
        match self.store.fetch_competitors().await {
            Ok(competitors) => rank_competitors(&competitors),
            Err(error) => {
                tracing::warn!(%error, "competitors unavailable");
                Vec::new()
            }
        }
    }

    /// Keywords we lead on and keywords `competitor_id` leads on.
    pub async fn keyword_comparison(&self, competitor_id: &str) -> (Vec<KeywordComparison>, Vec<KeywordComparison>) {
        match self.store.fetch_keyword_comparisons(competitor_id).await {
            Ok(comparisons) => split_keyword_comparison(&comparisons),
            Err(error) => {
                tracing::warn!(%error, competitor_id, "keyword comparison unavailable");
                (Vec::new(), Vec::new())
            }
        }
    }

    /// Applies one [`Event`] and reports what changed.
    ///
    /// # Errors
    ///
    /// Returns page errors from [`Event::GoToPage`] and rating errors from
    /// [`Event::RateArticle`]. Fetch failures become [`Notice::FetchFailed`].
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn handle_event(&self, event: Event) -> Result<Vec<Notice>> {
        let mut notices = Vec::new();
        match event {
            Event::SetDateRange(range) => {
                let (articles, keywords) = self.set_date_range(range).await;
                push_view(&mut notices, Collection::Articles, articles.last_error);
                push_view(&mut notices, Collection::Keywords, keywords.last_error);
            }
            Event::Search { collection, term } => match collection {
                Collection::Articles => {
                    let view = self.articles.set_search(term).await;
                    push_view(&mut notices, collection, view.last_error);
                }
                Collection::Keywords => {
                    let view = self.keywords.set_search(term).await;
                    push_view(&mut notices, collection, view.last_error);
                }
            },
            Event::SetRegion { collection, region } => match collection {
                Collection::Articles => {
                    let view = self.articles.set_region(region).await;
                    push_view(&mut notices, collection, view.last_error);
                }
                Collection::Keywords => {
                    let view = self.keywords.set_region(region).await;
                    push_view(&mut notices, collection, view.last_error);
                }
            },
            Event::SortArticles(field) => {
                let view = self.articles.set_sort(field).await;
                push_view(&mut notices, Collection::Articles, view.last_error);
            }
            Event::SortKeywords(field) => {
                let view = self.keywords.set_sort(field).await;
                push_view(&mut notices, Collection::Keywords, view.last_error);
            }
            Event::GoToPage { collection, page } => {
                let last_error = match collection {
                    Collection::Articles => self.articles.set_current_page(page).await?.last_error,
                    Collection::Keywords => self.keywords.set_current_page(page).await?.last_error,
                };
                push_view(&mut notices, collection, last_error);
            }
            Event::LoadMore(collection) => {
                let fetches = match collection {
                    Collection::Articles => self.articles.fetch_next().await,
                    Collection::Keywords => self.keywords.fetch_next().await,
                };
                if fetches > 0 {
                    let last_error = match collection {
                        Collection::Articles => self.articles.view().await.last_error,
                        Collection::Keywords => self.keywords.view().await.last_error,
                    };
                    push_view(&mut notices, collection, last_error);
                }
            }
            Event::Refresh(collection) => {
                let last_error = match collection {
                    Collection::Articles => self.articles.reset().await.last_error,
                    Collection::Keywords => self.keywords.reset().await.last_error,
                };
                push_view(&mut notices, collection, last_error);
            }
            Event::RateArticle { article_id, rating } => {
                let outcome = self.on_rating_submitted(&article_id, rating).await?;
                if !outcome.updated.is_empty() {
                    notices.push(Notice::Redraw(Collection::Articles));
                }
                notices.push(Notice::RatingSaved(outcome));
            }
        }
        Ok(notices)
    }
}

fn push_view(notices: &mut Vec<Notice>, collection: Collection, last_error: Option<String>) {
    if let Some(message) = last_error {
        notices.push(Notice::FetchFailed { collection, message });
    }
    notices.push(Notice::Redraw(collection));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArticleRating, NewsrankError};
    use crate::pipeline::ArticleField;
    use crate::scoring::RatingState;
    use crate::storage::{Dataset, MemoryStore, PageQuery};
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::collections::BTreeMap;

    /// Delegates to a [`MemoryStore`] but cannot look up related articles.
    struct NoRelatedArticles(Arc<MemoryStore>);

    #[async_trait]
    impl NewsStore for NoRelatedArticles {
        async fn fetch_articles(&self, query: &PageQuery) -> Result<Vec<Article>> {
            self.0.fetch_articles(query).await
        }

        async fn fetch_articles_by_keyword(&self, keyword: &str, offset: usize, limit: usize) -> Result<Vec<Article>> {
            self.0.fetch_articles_by_keyword(keyword, offset, limit).await
        }

        async fn fetch_articles_by_keywords(
            &self,
            _keywords: &[String],
            _exclude_id: Option<&str>,
            _range: Option<&DateRange>,
        ) -> Result<Vec<Article>> {
            Err(NewsrankError::Fetch("related articles query timed out".into()))
        }

        async fn fetch_article(&self, id: &str) -> Result<Option<Article>> {
            self.0.fetch_article(id).await
        }

        async fn fetch_keywords(&self, query: &PageQuery) -> Result<Vec<Keyword>> {
            self.0.fetch_keywords(query).await
        }

        async fn persist_rating(&self, article_id: &str, rating: u8) -> Result<ArticleRating> {
            self.0.persist_rating(article_id, rating).await
        }

        async fn fetch_seo_articles(&self, range: &DateRange) -> Result<Vec<CompetitorArticle>> {
            self.0.fetch_seo_articles(range).await
        }

        async fn fetch_competitors(&self) -> Result<Vec<Competitor>> {
            self.0.fetch_competitors().await
        }

        async fn fetch_keyword_comparisons(&self, competitor_id: &str) -> Result<Vec<KeywordComparison>> {
            self.0.fetch_keyword_comparisons(competitor_id).await
        }
    }

    fn article(id: &str, score: f64, keywords: &[&str]) -> Article {
        Article {
            id: id.into(),
            title: format!("title {id}"),
            total_score: score,
            average_score: score,
            source: "folha".into(),
            published_at: Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).single().expect("valid"),
            country: "Brasil".into(),
            continent: "América do Sul".into(),
            url: String::new(),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        }
    }

    fn seo(id: &str, score: u8, day: u32) -> CompetitorArticle {
        CompetitorArticle {
            id: id.into(),
            title: id.into(),
            competitor_name: "rival".into(),
            seo_score: score,
            published_at: Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).single().expect("valid"),
            main_keywords: Vec::new(),
            source: "rival".into(),
            country: String::new(),
            continent: String::new(),
            url: String::new(),
            keywords: Vec::new(),
            total_score: 0.0,
            average_score: 0.0,
            metrics: BTreeMap::new(),
            checks: BTreeMap::new(),
        }
    }

    fn march_10() -> DateRange {
        let d = NaiveDate::from_ymd_opt(2024, 3, 10).expect("valid");
        DateRange::days(d, d)
    }

    fn config(items_per_page: usize) -> Config {
        Config {
            items_per_page,
            ..Config::default()
        }
    }

    fn dashboard(data: Dataset, items_per_page: usize) -> (Arc<MemoryStore>, Dashboard) {
        let store = Arc::new(MemoryStore::new(data));
        let dashboard = Dashboard::new(store.clone(), &config(items_per_page));
        (store, dashboard)
    }

    #[tokio::test]
    async fn rating_updates_visible_scores_without_refetch() {
        let data = Dataset {
            articles: vec![
                article("a1", 10.0, &["economia", "juros"]),
                article("a2", 20.0, &["economia"]),
                article("a3", 30.0, &["esporte"]),
            ],
            ..Dataset::default()
        };
        let (store, dashboard) = dashboard(data, 10);
        dashboard.set_date_range(march_10()).await;
        let queries = store.query_count();

        let outcome = dashboard.on_rating_submitted("a1", 5).await.expect("persisted");
        assert!(!outcome.is_stale());
        assert_eq!(outcome.updated.len(), 2);

        let view = dashboard.articles().view().await;
        let a1 = view.records.iter().find(|a| a.id == "a1").expect("a1 visible");
        assert!((a1.total_score - 11.0).abs() < 1e-9);
        let a3 = view.records.iter().find(|a| a.id == "a3").expect("a3 visible");
        assert!((a3.total_score - 30.0).abs() < 1e-9);
        assert_eq!(view.buffered_count, 3);

        // fetch_article, persist_rating, fetch_articles_by_keywords; no page refetch.
        assert_eq!(store.query_count(), queries + 3);
    }

    #[tokio::test]
    async fn rejected_rating_leaves_scores_alone() {
        let data = Dataset {
            articles: vec![article("a1", 10.0, &["economia"])],
            ..Dataset::default()
        };
        let (store, dashboard) = dashboard(data, 10);
        dashboard.set_date_range(march_10()).await;
        store.set_offline(true);

        let err = dashboard.on_rating_submitted("a1", 4).await.expect_err("store offline");
        assert!(matches!(err, NewsrankError::Persistence(_)));
        let view = dashboard.articles().view().await;
        assert!((view.records[0].total_score - 10.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn failed_rescoring_keeps_the_rating_and_the_buffer() {
        let inner = Arc::new(MemoryStore::new(Dataset {
            articles: vec![article("a1", 10.0, &["economia"]), article("a2", 20.0, &["economia"])],
            ..Dataset::default()
        }));
        let dashboard = Dashboard::new(Arc::new(NoRelatedArticles(inner.clone())), &config(10));
        dashboard.set_date_range(march_10()).await;
        let before = dashboard.articles().view().await;

        let outcome = dashboard.on_rating_submitted("a1", 5).await.expect("rating persisted");
        assert_eq!(outcome.state, RatingState::Failed);
        assert!(outcome.is_stale());
        assert!(outcome.updated.is_empty());
        assert!(matches!(
            outcome.recalculation_error,
            Some(NewsrankError::Recalculation(ref message)) if message.contains("timed out")
        ));

        let saved = inner.snapshot().await.ratings;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].article_id, "a1");
        assert_eq!(dashboard.articles().view().await, before);
    }

    #[tokio::test]
    async fn keyword_articles_page_through_every_date() {
        let mut old = article("old", 1.0, &["juros"]);
        old.published_at = Utc.with_ymd_and_hms(2023, 1, 5, 12, 0, 0).single().expect("valid");
        let data = Dataset {
            articles: vec![
                article("a1", 10.0, &["juros", "economia"]),
                article("a2", 20.0, &["esporte"]),
                old,
                article("a3", 30.0, &["juros"]),
            ],
            ..Dataset::default()
        };
        let (store, dashboard) = dashboard(data, 2);

        let first = dashboard.keyword_articles("juros", 1).await.expect("page 1");
        let ids: Vec<&str> = first.records.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["a1", "old"]);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.total_count, 3);

        let second = dashboard.keyword_articles("juros", 2).await.expect("page 2");
        assert_eq!(second.records.len(), 1);
        assert!(dashboard.keyword_articles("juros", 3).await.is_err());

        store.set_offline(true);
        let empty = dashboard.keyword_articles("juros", 1).await.expect("empty page 1");
        assert!(empty.records.is_empty());
        assert_eq!(empty.total_pages, 0);
    }

    #[tokio::test]
    async fn competitor_articles_are_ranked_and_paged() {
        let data = Dataset {
            seo_articles: vec![seo("low", 40, 10), seo("high", 90, 10), seo("mid", 70, 10), seo("old", 99, 2)],
            ..Dataset::default()
        };
        let (_store, dashboard) = dashboard(data, 2);

        let first = dashboard.top_competitor_articles(&march_10(), 1).await.expect("page 1");
        let ids: Vec<&str> = first.records.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["high", "mid"]);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.total_count, 3);

        let second = dashboard.top_competitor_articles(&march_10(), 2).await.expect("page 2");
        assert_eq!(second.records.len(), 1);
        assert!(dashboard.top_competitor_articles(&march_10(), 3).await.is_err());
    }

    #[tokio::test]
    async fn competitor_views_degrade_when_offline() {
        let (store, dashboard) = dashboard(Dataset::default(), 10);
        store.set_offline(true);
        assert!(dashboard.competitor_ranking().await.is_empty());
        let (leading, trailing) = dashboard.keyword_comparison("c1").await;
        assert!(leading.is_empty() && trailing.is_empty());
        let page = dashboard.top_competitor_articles(&march_10(), 1).await.expect("empty page 1");
        assert!(page.records.is_empty());
    }

    #[tokio::test]
    async fn events_report_redraws_and_failures() {
        let data = Dataset {
            articles: vec![article("a1", 10.0, &["economia"]), article("a2", 5.0, &["juros"])],
            ..Dataset::default()
        };
        let (store, dashboard) = dashboard(data, 10);

        let notices = dashboard.handle_event(Event::SetDateRange(march_10())).await.expect("handled");
        assert_eq!(notices.len(), 2);
        assert!(notices.iter().all(|n| matches!(n, Notice::Redraw(_))));

        dashboard
            .handle_event(Event::SortArticles(ArticleField::Title))
            .await
            .expect("handled");
        let view = dashboard.articles().view().await;
        assert_eq!(view.records[0].id, "a2");

        let err = dashboard
            .handle_event(Event::GoToPage {
                collection: Collection::Articles,
                page: 5,
            })
            .await
            .expect_err("only one page");
        assert!(matches!(err, NewsrankError::InvalidPage { page: 5, total_pages: 1 }));

        store.set_offline(true);
        let notices = dashboard
            .handle_event(Event::Refresh(Collection::Keywords))
            .await
            .expect("fetch failures are notices");
        assert!(matches!(
            notices.first(),
            Some(Notice::FetchFailed {
                collection: Collection::Keywords,
                ..
            })
        ));
    }
}
