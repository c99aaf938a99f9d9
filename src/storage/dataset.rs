//! In-memory dataset and the queries both local stores answer from it.

use std::collections::BTreeMap;

use crate::domain::{
    Article, ArticleRating, Competitor, CompetitorArticle, DateRange, Keyword, KeywordComparison,
    NewsrankError, Result,
};
use crate::pipeline::{sort_records, ArticleField, KeywordField, Record, SortDescriptor};
use crate::scoring::average_rating;
use crate::storage::backend::PageQuery;
use crate::storage::models::{DatasetFile, DATASET_VERSION};

/// Everything a local store holds, in domain form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub articles: Vec<Article>,
    pub keywords: Vec<Keyword>,
    pub ratings: Vec<ArticleRating>,
    pub seo_articles: Vec<CompetitorArticle>,
    pub competitors: Vec<Competitor>,
    pub keyword_comparisons: BTreeMap<String, Vec<KeywordComparison>>,
}

impl From<DatasetFile> for Dataset {
    fn from(file: DatasetFile) -> Self {
        Self {
            articles: file.articles.into_iter().map(Article::from).collect(),
            keywords: file.keywords.into_iter().map(Keyword::from).collect(),
            ratings: file.ratings.into_iter().map(ArticleRating::from).collect(),
            seo_articles: file.seo_articles,
            competitors: file.competitors,
            keyword_comparisons: file.keyword_comparisons,
        }
    }
}

impl From<&Dataset> for DatasetFile {
    fn from(data: &Dataset) -> Self {
        Self {
            version: DATASET_VERSION,
            articles: data.articles.iter().map(Into::into).collect(),
            keywords: data.keywords.iter().map(Into::into).collect(),
            ratings: data.ratings.iter().map(Into::into).collect(),
            seo_articles: data.seo_articles.clone(),
            competitors: data.competitors.clone(),
            keyword_comparisons: data.keyword_comparisons.clone(),
        }
    }
}

fn page<T>(records: Vec<T>, offset: usize, limit: usize) -> Vec<T> {
    records.into_iter().skip(offset).take(limit).collect()
}

fn ordered<T: Record>(mut records: Vec<T>, field: T::Field, query: &PageQuery) -> Vec<T> {
    sort_records(&mut records, &SortDescriptor::new(field, query.direction));
    page(records, query.offset, query.limit)
}

impl Dataset {
    /// Articles published inside the range, ordered by the query column.
    ///
    /// Columns without a matching field order by total score.
    #[must_use]
    pub fn articles_page(&self, query: &PageQuery) -> Vec<Article> {
        let field = query.order_by.parse().unwrap_or(ArticleField::TotalScore);
        let matching: Vec<Article> = self
            .articles
            .iter()
            .filter(|a| query.range.contains(&a.published_at))
            .cloned()
            .collect();
        ordered(matching, field, query)
    }

    /// Keywords whose latest calculation falls inside the range.
    ///
    /// Keywords never scored have no calculation time and are left out.
    #[must_use]
    pub fn keywords_page(&self, query: &PageQuery) -> Vec<Keyword> {
        let field = query.order_by.parse().unwrap_or(KeywordField::OverallScore);
        let matching: Vec<Keyword> = self
            .keywords
            .iter()
            .filter(|k| k.calculated_at.is_some_and(|at| query.range.contains(&at)))
            .cloned()
            .collect();
        ordered(matching, field, query)
    }

    #[must_use]
    pub fn articles_by_keyword(&self, keyword: &str, offset: usize, limit: usize) -> Vec<Article> {
        let matching: Vec<Article> = self
            .articles
            .iter()
            .filter(|a| a.keywords.iter().any(|k| k == keyword))
            .cloned()
            .collect();
        page(matching, offset, limit)
    }

    #[must_use]
    pub fn articles_by_keywords(
        &self,
        keywords: &[String],
        exclude_id: Option<&str>,
        range: Option<&DateRange>,
    ) -> Vec<Article> {
        self.articles
            .iter()
            .filter(|a| exclude_id != Some(a.id.as_str()))
            .filter(|a| range.map_or(true, |r| r.contains(&a.published_at)))
            .filter(|a| a.shared_keywords(keywords) > 0)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn article(&self, id: &str) -> Option<Article> {
        self.articles.iter().find(|a| a.id == id).cloned()
    }

    /// Appends a rating and refreshes the impact rating of the article's keywords.
    ///
    /// # Errors
    ///
    /// Returns [`NewsrankError::Persistence`] when the article is unknown or the
    /// rating is outside `1..=5`.
    pub fn add_rating(&mut self, article_id: &str, rating: u8) -> Result<ArticleRating> {
        if !(1..=5).contains(&rating) {
            return Err(NewsrankError::Persistence(format!("rating {rating} out of range")));
        }
        let keywords = self
            .articles
            .iter()
            .find(|a| a.id == article_id)
            .map(|a| a.keywords.clone())
            .ok_or_else(|| NewsrankError::Persistence(format!("unknown article {article_id}")))?;

        let saved = ArticleRating {
            id: format!("rating-{}", self.ratings.len() + 1),
            article_id: article_id.to_string(),
            rating,
        };
        self.ratings.push(saved.clone());

        for name in &keywords {
            self.refresh_keyword_rating(name);
        }
        Ok(saved)
    }

    /// Recomputes a keyword's average article rating and overall score.
    fn refresh_keyword_rating(&mut self, name: &str) {
        let rated_articles: Vec<&str> = self
            .articles
            .iter()
            .filter(|a| a.keywords.iter().any(|k| k == name))
            .map(|a| a.id.as_str())
            .collect();
        let ratings: Vec<ArticleRating> = self
            .ratings
            .iter()
            .filter(|r| rated_articles.contains(&r.article_id.as_str()))
            .cloned()
            .collect();
        let avg = average_rating(&ratings);

        for keyword in self.keywords.iter_mut().filter(|k| k.name == name) {
            keyword.average_article_rating = avg;
            keyword.recalculate();
            tracing::debug!(keyword = %keyword.name, avg, overall = keyword.overall_score, "keyword rating refreshed");
        }
    }

    #[must_use]
    pub fn seo_articles(&self, range: &DateRange) -> Vec<CompetitorArticle> {
        self.seo_articles
            .iter()
            .filter(|a| range.contains(&a.published_at))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn keyword_comparisons(&self, competitor_id: &str) -> Vec<KeywordComparison> {
        self.keyword_comparisons
            .get(competitor_id)
            .cloned()
            .unwrap_or_default()
    }
}
