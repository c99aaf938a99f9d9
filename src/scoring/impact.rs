//! Rating impact: the multiplier table and rescoring after a rating.
//!
//! Two things live here. The first is the discrete impact multiplier a keyword's
//! average article rating applies to its overall score. The second is the
//! [`RatingImpactEngine`], which handles one rating submission end to end:
//!
//! ```text
//! Submitted ──persist──▶ Persisted ──▶ Recalculating ──▶ Applied
//!     │                                      │
//!     └── store rejects (PersistenceError)   └── rescoring fails ──▶ Failed
//! ```
//!
//! A rejected rating stops before recalculation. A failed recalculation does not
//! undo the rating; it is reported alongside it so the caller can warn that the
//! displayed scores may be stale.

use std::sync::Arc;

use crate::domain::{Article, ArticleRating, DateRange, NewsrankError, Result};
use crate::storage::NewsStore;

/// Lower bound of the boost applied to a rated article.
pub const RATED_BOOST_MIN: f64 = 0.05;

/// Upper bound of the boost applied to a rated article.
pub const RATED_BOOST_MAX: f64 = 0.10;

/// Upper bound of the boost applied to an article related by shared keywords.
pub const RELATED_BOOST_CAP: f64 = 0.10;

/// Multiplier applied to a keyword's overall score for its average article rating.
///
/// The rating is rounded to the nearest integer. Ratings that round outside
/// `1..=5` (including the unrated `0.0`) have no effect.
///
/// ```
/// use newsrank::scoring::impact_multiplier;
///
/// assert_eq!(impact_multiplier(5.0), 1.5);
/// assert_eq!(impact_multiplier(3.6), 1.25);
/// assert_eq!(impact_multiplier(0.0), 1.0);
/// ```
#[must_use]
pub fn impact_multiplier(avg_rating: f64) -> f64 {
    if !avg_rating.is_finite() {
        return 1.0;
    }
    #[allow(clippy::cast_possible_truncation)]
    let rounded = avg_rating.round() as i64;
    match rounded {
        1 => 0.5,
        2 => 0.75,
        4 => 1.25,
        5 => 1.5,
        _ => 1.0,
    }
}

/// `overall × impact_multiplier(avg_rating)`.
#[must_use]
pub fn weighted_score(overall: f64, avg_rating: f64) -> f64 {
    overall * impact_multiplier(avg_rating)
}

/// Mean rating value, `0.0` when there are no ratings.
#[must_use]
pub fn average_rating(ratings: &[ArticleRating]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: f64 = ratings.iter().map(|r| f64::from(r.rating)).sum();
    #[allow(clippy::cast_precision_loss)]
    let count = ratings.len() as f64;
    sum / count
}

/// Decides how much a rating boosts the rated article and its relatives.
///
/// The engine clamps whatever the policy returns: rated boosts into
/// `[RATED_BOOST_MIN, RATED_BOOST_MAX]`, related boosts into `[0, RELATED_BOOST_CAP]`.
pub trait BoostPolicy: Send + Sync {
    /// Boost for the article that received `rating`.
    fn rated_boost(&self, rating: u8) -> f64;

    /// Boost for an article whose keywords overlap the rated article's by
    /// `overlap_fraction` (shared keywords over the related article's keywords).
    fn related_boost(&self, overlap_fraction: f64, rating: u8) -> f64;
}

/// Default policy: linear in the rating, related articles scaled by overlap.
///
/// A rating of 1 boosts by 5%, a rating of 5 by 10%.
#[derive(Debug, Clone, Copy, Default)]
pub struct RatingScaledBoost;

impl BoostPolicy for RatingScaledBoost {
    fn rated_boost(&self, rating: u8) -> f64 {
        let step = f64::from(rating.clamp(1, 5) - 1) / 4.0;
        RATED_BOOST_MIN + (RATED_BOOST_MAX - RATED_BOOST_MIN) * step
    }

    fn related_boost(&self, overlap_fraction: f64, rating: u8) -> f64 {
        overlap_fraction * self.rated_boost(rating)
    }
}

/// Where a rating submission ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingState {
    Submitted,
    Persisted,
    Recalculating,
    Applied,
    Failed,
}

/// Result of a rating submission whose persistence succeeded.
#[derive(Debug)]
pub struct RatingOutcome {
    pub rating: ArticleRating,
    /// `Applied` or `Failed`.
    pub state: RatingState,
    /// Rated article first, then related articles. Empty when the article has
    /// no keywords or recalculation failed.
    pub updated: Vec<Article>,
    /// Set when `state` is `Failed`.
    pub recalculation_error: Option<NewsrankError>,
}

impl RatingOutcome {
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.state == RatingState::Failed
    }
}

/// Persists ratings and rescores the affected articles.
#[derive(Clone)]
pub struct RatingImpactEngine {
    store: Arc<dyn NewsStore>,
    policy: Arc<dyn BoostPolicy>,
}

impl std::fmt::Debug for RatingImpactEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RatingImpactEngine").finish_non_exhaustive()
    }
}

impl RatingImpactEngine {
    /// Creates an engine with the [`RatingScaledBoost`] policy.
    #[must_use]
    pub fn new(store: Arc<dyn NewsStore>) -> Self {
        Self::with_policy(store, Arc::new(RatingScaledBoost))
    }

    #[must_use]
    pub fn with_policy(store: Arc<dyn NewsStore>, policy: Arc<dyn BoostPolicy>) -> Self {
        Self { store, policy }
    }

    /// Validates and persists a rating.
    ///
    /// # Errors
    ///
    /// - [`NewsrankError::InvalidRating`] when `rating` is outside `1..=5`
    /// - [`NewsrankError::Persistence`] when the store rejects it
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn submit_rating(&self, article_id: &str, rating: i64) -> Result<ArticleRating> {
        let value = u8::try_from(rating)
            .ok()
            .filter(|r| (1..=5).contains(r))
            .ok_or(NewsrankError::InvalidRating(rating))?;

        self.store
            .persist_rating(article_id, value)
            .await
            .map_err(|e| match e {
                NewsrankError::Persistence(_) => e,
                other => NewsrankError::Persistence(other.to_string()),
            })
    }

    /// Rescores the rated article and every article sharing a keyword with it.
    ///
    /// Returns the rated article first, followed by the related articles, all with
    /// boosted scores. An article without keywords yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`NewsrankError::Recalculation`] when the rated article cannot be
    /// found or any store query fails.
    #[tracing::instrument(level = "debug", skip(self, range))]
    pub async fn recalculate_affected(
        &self,
        article_id: &str,
        rating: u8,
        range: Option<&DateRange>,
    ) -> Result<Vec<Article>> {
        let mut rated = self
            .store
            .fetch_article(article_id)
            .await
            .map_err(recalculation)?
            .ok_or_else(|| NewsrankError::Recalculation(format!("article {article_id} not found")))?;

        if rated.keywords.is_empty() {
            tracing::debug!(article_id, "article has no keywords, nothing to rescore");
            return Ok(Vec::new());
        }

        let related = self
            .store
            .fetch_articles_by_keywords(&rated.keywords, Some(article_id), range)
            .await
            .map_err(recalculation)?;

        let boost = self.policy.rated_boost(rating).clamp(RATED_BOOST_MIN, RATED_BOOST_MAX);
        rated.apply_boost(boost);

        let mut updated = Vec::with_capacity(related.len() + 1);
        updated.push(rated);

        for mut article in related {
            if article.id == article_id || article.keywords.is_empty() {
                continue;
            }
            let shared = article.shared_keywords(&updated[0].keywords);
            if shared == 0 {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let overlap = shared as f64 / article.keywords.len() as f64;
            let related_boost = self
                .policy
                .related_boost(overlap, rating)
                .clamp(0.0, RELATED_BOOST_CAP);
            article.apply_boost(related_boost);
            updated.push(article);
        }

        tracing::debug!(
            article_id,
            boost,
            related = updated.len() - 1,
            "rescored articles after rating"
        );
        Ok(updated)
    }

    /// Full submission: persist, then rescore.
    ///
    /// # Errors
    ///
    /// Returns the error of [`submit_rating`](Self::submit_rating). Recalculation
    /// failures do not fail the call; they are reported in the outcome.
    #[tracing::instrument(level = "debug", skip(self, range))]
    pub async fn rate(&self, article_id: &str, rating: i64, range: Option<&DateRange>) -> Result<RatingOutcome> {
        let mut state = RatingState::Submitted;
        tracing::debug!(?state, "rating submitted");

        let saved = self.submit_rating(article_id, rating).await?;
        state = RatingState::Persisted;
        tracing::debug!(?state, rating_id = %saved.id, "rating persisted");

        state = RatingState::Recalculating;
        tracing::debug!(?state, "recalculating affected articles");

        match self.recalculate_affected(article_id, saved.rating, range).await {
            Ok(updated) => {
                state = RatingState::Applied;
                tracing::info!(?state, updated = updated.len(), "rating applied");
                Ok(RatingOutcome {
                    rating: saved,
                    state,
                    updated,
                    recalculation_error: None,
                })
            }
            Err(error) => {
                state = RatingState::Failed;
                tracing::warn!(?state, %error, "rating saved but rescoring failed");
                Ok(RatingOutcome {
                    rating: saved,
                    state,
                    updated: Vec::new(),
                    recalculation_error: Some(error),
                })
            }
        }
    }
}

fn recalculation(error: NewsrankError) -> NewsrankError {
    match error {
        NewsrankError::Recalculation(_) => error,
        other => NewsrankError::Recalculation(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Keyword;
    use crate::scoring::{overall_score, SubScores};
    use crate::storage::{Dataset, MemoryStore};
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    const EPS: f64 = 1e-9;

    #[rstest]
    #[case(1.0, 0.5)]
    #[case(2.0, 0.75)]
    #[case(3.0, 1.0)]
    #[case(4.0, 1.25)]
    #[case(5.0, 1.5)]
    #[case(0.0, 1.0)]
    #[case(6.0, 1.0)]
    #[case(-2.0, 1.0)]
    #[case(4.4, 1.25)]
    #[case(f64::NAN, 1.0)]
    fn multiplier_table(#[case] rating: f64, #[case] expected: f64) {
        assert!((impact_multiplier(rating) - expected).abs() < EPS);
    }

    #[test]
    fn weighted_score_scales_overall_by_impact() {
        let sub = SubScores {
            quantity: 2.0,
            recency: 5.0,
            relevance: 3.0,
            trend: -0.2,
        };
        let overall = overall_score(&sub);
        assert!((weighted_score(overall, 5.0) - overall * 1.5).abs() < EPS);

        let keyword = Keyword::new("k", "ai", sub, 5.0, None);
        assert!((keyword.overall_score - overall * 1.5).abs() < EPS);
    }

    #[test]
    fn default_policy_spans_boost_bounds() {
        let policy = RatingScaledBoost;
        assert!((policy.rated_boost(1) - RATED_BOOST_MIN).abs() < EPS);
        assert!((policy.rated_boost(5) - RATED_BOOST_MAX).abs() < EPS);
        assert!((policy.related_boost(0.5, 5) - 0.05).abs() < EPS);
    }

    #[test]
    fn average_rating_is_zero_when_unrated() {
        assert_eq!(average_rating(&[]), 0.0);
        let ratings = [3u8, 4, 5].map(|r| ArticleRating {
            id: format!("r{r}"),
            article_id: "a".into(),
            rating: r,
        });
        assert!((average_rating(&ratings) - 4.0).abs() < EPS);
    }

    fn article(id: &str, keywords: &[&str], total: f64) -> Article {
        #[allow(clippy::cast_precision_loss)]
        let avg = if keywords.is_empty() { 0.0 } else { total / keywords.len() as f64 };
        Article {
            id: id.into(),
            title: format!("title {id}"),
            total_score: total,
            average_score: avg,
            source: "g1".into(),
            published_at: Utc.with_ymd_and_hms(2024, 4, 2, 8, 0, 0).single().expect("valid"),
            country: "Brasil".into(),
            continent: "América do Sul".into(),
            url: format!("https://g1.globo.com/{id}"),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        }
    }

    fn engine_with(articles: Vec<Article>) -> RatingImpactEngine {
        let store = MemoryStore::new(Dataset {
            articles,
            ..Dataset::default()
        });
        RatingImpactEngine::new(Arc::new(store))
    }

    struct FixedBoost(f64, f64);

    impl BoostPolicy for FixedBoost {
        fn rated_boost(&self, _rating: u8) -> f64 {
            self.0
        }

        fn related_boost(&self, overlap_fraction: f64, _rating: u8) -> f64 {
            overlap_fraction * self.1
        }
    }

    #[tokio::test]
    async fn article_without_keywords_rescoring_is_empty() {
        let engine = engine_with(vec![article("lonely", &[], 0.0)]);
        let outcome = engine.rate("lonely", 4, None).await.expect("rating persisted");
        assert_eq!(outcome.state, RatingState::Applied);
        assert!(outcome.updated.is_empty());
        assert!(outcome.recalculation_error.is_none());
    }

    #[tokio::test]
    async fn rated_and_related_articles_are_boosted() {
        let store = Arc::new(MemoryStore::new(Dataset {
            articles: vec![
                article("rated", &["ai", "chips"], 30.0),
                article("half", &["ai", "cloud"], 20.0),
                article("other", &["football"], 50.0),
            ],
            ..Dataset::default()
        }));
        let engine = RatingImpactEngine::with_policy(store, Arc::new(FixedBoost(0.08, 0.2)));

        let updated = engine.recalculate_affected("rated", 5, None).await.expect("rescored");
        let ids: Vec<_> = updated.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["rated", "half"]);

        assert!((updated[0].total_score - 30.0 * 1.08).abs() < EPS);
        assert!((updated[0].average_score - 15.0 * 1.08).abs() < EPS);
        // Related boost is overlap (1/2) times 0.2, then capped at 0.10.
        assert!((updated[1].total_score - 20.0 * 1.10).abs() < EPS);
    }

    #[tokio::test]
    async fn policy_output_is_clamped() {
        let engine = RatingImpactEngine::with_policy(
            Arc::new(MemoryStore::new(Dataset {
                articles: vec![article("a", &["ai"], 10.0)],
                ..Dataset::default()
            })),
            Arc::new(FixedBoost(0.9, 0.0)),
        );
        let updated = engine.recalculate_affected("a", 3, None).await.expect("rescored");
        assert!((updated[0].total_score - 10.0 * (1.0 + RATED_BOOST_MAX)).abs() < EPS);
    }

    #[tokio::test]
    async fn invalid_rating_is_rejected_before_persisting() {
        let engine = engine_with(vec![article("a", &["ai"], 10.0)]);
        let err = engine.rate("a", 7, None).await.expect_err("out of range");
        assert!(matches!(err, NewsrankError::InvalidRating(7)));
    }

    #[tokio::test]
    async fn rejected_rating_blocks_recalculation() {
        let engine = engine_with(vec![article("a", &["ai"], 10.0)]);
        let err = engine.rate("missing", 3, None).await.expect_err("store rejects");
        assert!(matches!(err, NewsrankError::Persistence(_)));
        assert!(err.is_user_facing());
    }
}
