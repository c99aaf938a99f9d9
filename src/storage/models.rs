//! Storage row models.
//!
//! These types mirror the relational schema the dashboard reads from: snake_case
//! columns, keyword scores nested under `keyword_scores`, ratings keyed by
//! `article_id`. They are kept separate from the domain models so the wire shape
//! can differ from what the ranking core works with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{
    source_from_url, Article, ArticleRating, Competitor, CompetitorArticle, Keyword, KeywordComparison,
};
use crate::scoring::SubScores;

/// Current on-disk dataset format.
pub const DATASET_VERSION: u32 = 1;

/// Row of the article score view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRow {
    pub id: String,
    pub title: String,
    pub total_score: f64,
    pub average_score: f64,
    pub url: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub continent: String,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Self {
            source: source_from_url(&row.url),
            id: row.id,
            title: row.title,
            total_score: row.total_score,
            average_score: row.average_score,
            published_at: row.published_at,
            country: row.country,
            continent: row.continent,
            url: row.url,
            keywords: row.keywords,
        }
    }
}

impl From<&Article> for ArticleRow {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id.clone(),
            title: article.title.clone(),
            total_score: article.total_score,
            average_score: article.average_score,
            url: article.url.clone(),
            published_at: article.published_at,
            keywords: article.keywords.clone(),
            country: article.country.clone(),
            continent: article.continent.clone(),
        }
    }
}

/// Latest score calculation joined onto a keyword.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordScoresRow {
    pub overall_score: f64,
    pub quantity_score: f64,
    pub recency_score: f64,
    pub relevance_score: f64,
    pub trending_score: f64,
    pub calculated_at: Option<DateTime<Utc>>,
}

/// Row of the keywords table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRow {
    pub id: String,
    pub keyword_text: String,
    /// Missing when the keyword has never been scored; every score reads as zero.
    #[serde(default)]
    pub keyword_scores: Option<KeywordScoresRow>,
    #[serde(default)]
    pub average_article_rating: f64,
}

impl From<KeywordRow> for Keyword {
    /// The stored `overall_score` is not trusted; it is re-derived from the
    /// sub-scores and rating so both sides always agree.
    fn from(row: KeywordRow) -> Self {
        let scores = row.keyword_scores.unwrap_or_default();
        let keyword = Self::new(
            row.id,
            row.keyword_text,
            SubScores {
                quantity: scores.quantity_score,
                recency: scores.recency_score,
                relevance: scores.relevance_score,
                trend: scores.trending_score,
            },
            row.average_article_rating,
            scores.calculated_at,
        );
        if (keyword.overall_score - scores.overall_score).abs() > 1e-6 && scores.overall_score != 0.0 {
            tracing::trace!(
                keyword = %keyword.name,
                stored = scores.overall_score,
                derived = keyword.overall_score,
                "stored overall score differs from derived score"
            );
        }
        keyword
    }
}

impl From<&Keyword> for KeywordRow {
    fn from(keyword: &Keyword) -> Self {
        Self {
            id: keyword.id.clone(),
            keyword_text: keyword.name.clone(),
            keyword_scores: Some(KeywordScoresRow {
                overall_score: keyword.overall_score,
                quantity_score: keyword.quantity_score,
                recency_score: keyword.recency_score,
                relevance_score: keyword.relevance_score,
                trending_score: keyword.trend_score,
                calculated_at: keyword.calculated_at,
            }),
            average_article_rating: keyword.average_article_rating,
        }
    }
}

/// Row of the article ratings table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRow {
    pub id: String,
    pub article_id: String,
    pub rating: u8,
}

impl From<RatingRow> for ArticleRating {
    fn from(row: RatingRow) -> Self {
        Self {
            id: row.id,
            article_id: row.article_id,
            rating: row.rating,
        }
    }
}

impl From<&ArticleRating> for RatingRow {
    fn from(rating: &ArticleRating) -> Self {
        Self {
            id: rating.id.clone(),
            article_id: rating.article_id.clone(),
            rating: rating.rating,
        }
    }
}

/// Top-level structure of the dataset file.
///
/// Competitor data is stored in its domain shape since it arrives from the SEO
/// audit already in that form.
///
/// ```json
/// {
///   "version": 1,
///   "articles": [{ "id": "a1", "title": "...", "total_score": 30.0, "average_score": 15.0,
///                  "url": "https://www.tecmundo.com.br/x", "published_at": "2024-05-01T10:00:00Z",
///                  "keywords": ["ai", "chips"], "country": "Brasil", "continent": "América do Sul" }],
///   "keywords": [{ "id": "k1", "keyword_text": "ai",
///                  "keyword_scores": { "quantity_score": 2.0, "recency_score": 5.0,
///                                      "relevance_score": 3.0, "trending_score": -0.2,
///                                      "calculated_at": "2024-05-01T12:00:00Z" } }],
///   "ratings": [{ "id": "rating-1", "article_id": "a1", "rating": 4 }],
///   "seo_articles": [],
///   "competitors": [],
///   "keyword_comparisons": { "canaltech": [] }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetFile {
    pub version: u32,
    #[serde(default)]
    pub articles: Vec<ArticleRow>,
    #[serde(default)]
    pub keywords: Vec<KeywordRow>,
    #[serde(default)]
    pub ratings: Vec<RatingRow>,
    #[serde(default)]
    pub seo_articles: Vec<CompetitorArticle>,
    #[serde(default)]
    pub competitors: Vec<Competitor>,
    /// Keyword comparisons keyed by competitor id.
    #[serde(default)]
    pub keyword_comparisons: BTreeMap<String, Vec<KeywordComparison>>,
}

impl Default for DatasetFile {
    fn default() -> Self {
        Self {
            version: DATASET_VERSION,
            articles: Vec::new(),
            keywords: Vec::new(),
            ratings: Vec::new(),
            seo_articles: Vec::new(),
            competitors: Vec::new(),
            keyword_comparisons: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_row_derives_source_from_url() {
        let row: ArticleRow = serde_json::from_str(
            r#"{"id":"a1","title":"Chips","total_score":30.0,"average_score":15.0,
                "url":"https://www.tecmundo.com.br/mercado/1","published_at":"2024-05-01T10:00:00Z",
                "keywords":["ai","chips"],"country":"Brasil","continent":"América do Sul"}"#,
        )
        .expect("valid row");
        let article = Article::from(row);
        assert_eq!(article.source, "tecmundo");
        assert_eq!(article.keywords.len(), 2);
    }

    #[test]
    fn keyword_row_without_scores_reads_as_zero() {
        let row: KeywordRow = serde_json::from_str(r#"{"id":"k1","keyword_text":"5g"}"#).expect("valid row");
        let keyword = Keyword::from(row);
        assert_eq!(keyword.name, "5g");
        assert_eq!(keyword.quantity_score, 0.0);
        assert_eq!(keyword.trend_score, 0.0);
        assert!(keyword.calculated_at.is_none());
    }

    #[test]
    fn keyword_row_maps_trending_score_to_trend() {
        let row: KeywordRow = serde_json::from_str(
            r#"{"id":"k1","keyword_text":"ai","keyword_scores":{"trending_score":-0.4,"quantity_score":1.5}}"#,
        )
        .expect("valid row");
        let keyword = Keyword::from(row);
        assert!((keyword.trend_score + 0.4).abs() < 1e-12);
        assert!((keyword.quantity_score - 1.5).abs() < 1e-12);
    }
}
