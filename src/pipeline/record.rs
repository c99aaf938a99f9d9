//! Record abstraction shared by every paginated collection.
//!
//! The collection cache and the filter/sort pipeline are generic over [`Record`].
//! A record exposes its id, the text the search box matches against, an optional
//! country/continent location for the region filter, and a [`SortValue`] per
//! sortable field.

use std::fmt::Debug;
use std::str::FromStr;

use super::sort::{SortDescriptor, SortValue};
use crate::domain::{Article, Keyword, NewsrankError};

/// A sortable column of a record type.
pub trait SortField: Copy + Eq + Debug + Send + Sync + 'static {
    /// Backend column used when the store orders a page by this field.
    fn column(self) -> &'static str;

    /// Client-facing field name (`averageScore`, `publishedAt`, ...).
    fn name(self) -> &'static str;
}

/// A record that can live in a paged collection.
pub trait Record: Clone + Debug + Send + Sync + 'static {
    type Field: SortField;

    fn id(&self) -> &str;

    /// Main text matched by search (title or name).
    fn primary_text(&self) -> &str;

    /// Secondary terms matched by search, e.g. an article's keywords.
    fn tags(&self) -> &[String] {
        &[]
    }

    /// `(country, continent)` for region filtering. `None` opts out of the filter.
    fn location(&self) -> Option<(&str, &str)> {
        None
    }

    fn sort_value(&self, field: Self::Field) -> SortValue;

    fn default_sort() -> SortDescriptor<Self::Field>;

    /// Merges a recalculated copy of this record into the buffered one.
    fn absorb(&mut self, update: Self) {
        *self = update;
    }
}

/// Sortable article fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArticleField {
    Title,
    TotalScore,
    AverageScore,
    Source,
    PublishedAt,
    Country,
    Continent,
    Keywords,
}

impl SortField for ArticleField {
    fn column(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::AverageScore => "average_score",
            Self::Source => "source",
            Self::PublishedAt => "published_at",
            // No server-side ordering for these; the page is fetched by total score
            // and re-sorted client-side.
            Self::TotalScore | Self::Country | Self::Continent | Self::Keywords => "total_score",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::TotalScore => "totalScore",
            Self::AverageScore => "averageScore",
            Self::Source => "source",
            Self::PublishedAt => "publishedAt",
            Self::Country => "country",
            Self::Continent => "continent",
            Self::Keywords => "keywords",
        }
    }
}

impl FromStr for ArticleField {
    type Err = NewsrankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "totalScore" | "total_score" => Ok(Self::TotalScore),
            "averageScore" | "average_score" => Ok(Self::AverageScore),
            "source" => Ok(Self::Source),
            "publishedAt" | "published_at" => Ok(Self::PublishedAt),
            "country" => Ok(Self::Country),
            "continent" => Ok(Self::Continent),
            "keywords" => Ok(Self::Keywords),
            other => Err(NewsrankError::Config(format!("unknown article field: {other}"))),
        }
    }
}

impl Record for Article {
    type Field = ArticleField;

    fn id(&self) -> &str {
        &self.id
    }

    fn primary_text(&self) -> &str {
        &self.title
    }

    fn tags(&self) -> &[String] {
        &self.keywords
    }

    fn location(&self) -> Option<(&str, &str)> {
        Some((&self.country, &self.continent))
    }

    fn sort_value(&self, field: ArticleField) -> SortValue {
        match field {
            ArticleField::Title => SortValue::text(&self.title),
            ArticleField::TotalScore => SortValue::Number(self.total_score),
            ArticleField::AverageScore => SortValue::Number(self.average_score),
            ArticleField::Source => SortValue::text(&self.source),
            ArticleField::PublishedAt => SortValue::Timestamp(self.published_at.timestamp_millis()),
            ArticleField::Country => SortValue::text(&self.country),
            ArticleField::Continent => SortValue::text(&self.continent),
            ArticleField::Keywords => SortValue::Count(self.keywords.len()),
        }
    }

    fn default_sort() -> SortDescriptor<ArticleField> {
        SortDescriptor::desc(ArticleField::AverageScore)
    }

    /// Only the scores change on recalculation; everything else stays as buffered.
    fn absorb(&mut self, update: Self) {
        self.total_score = update.total_score;
        self.average_score = update.average_score;
    }
}

/// Sortable keyword fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordField {
    Name,
    OverallScore,
    QuantityScore,
    RecencyScore,
    RelevanceScore,
    TrendScore,
    CalculatedAt,
    AverageArticleRating,
}

impl SortField for KeywordField {
    fn column(self) -> &'static str {
        match self {
            Self::Name => "keyword_text",
            Self::QuantityScore => "quantity_score",
            Self::RecencyScore => "recency_score",
            Self::RelevanceScore => "relevance_score",
            Self::TrendScore => "trending_score",
            Self::CalculatedAt => "calculated_at",
            Self::OverallScore | Self::AverageArticleRating => "overall_score",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::OverallScore => "overallScore",
            Self::QuantityScore => "quantityScore",
            Self::RecencyScore => "recencyScore",
            Self::RelevanceScore => "relevanceScore",
            Self::TrendScore => "trendScore",
            Self::CalculatedAt => "calculatedAt",
            Self::AverageArticleRating => "averageArticleRating",
        }
    }
}

impl FromStr for KeywordField {
    type Err = NewsrankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" | "keyword_text" => Ok(Self::Name),
            "overallScore" | "overall_score" => Ok(Self::OverallScore),
            "quantityScore" | "quantity_score" => Ok(Self::QuantityScore),
            "recencyScore" | "recency_score" => Ok(Self::RecencyScore),
            "relevanceScore" | "relevance_score" => Ok(Self::RelevanceScore),
            "trendScore" | "trending_score" => Ok(Self::TrendScore),
            "calculatedAt" | "calculated_at" => Ok(Self::CalculatedAt),
            "averageArticleRating" => Ok(Self::AverageArticleRating),
            other => Err(NewsrankError::Config(format!("unknown keyword field: {other}"))),
        }
    }
}

impl Record for Keyword {
    type Field = KeywordField;

    fn id(&self) -> &str {
        &self.id
    }

    fn primary_text(&self) -> &str {
        &self.name
    }

    fn sort_value(&self, field: KeywordField) -> SortValue {
        match field {
            KeywordField::Name => SortValue::text(&self.name),
            KeywordField::OverallScore => SortValue::Number(self.overall_score),
            KeywordField::QuantityScore => SortValue::Number(self.quantity_score),
            KeywordField::RecencyScore => SortValue::Number(self.recency_score),
            KeywordField::RelevanceScore => SortValue::Number(self.relevance_score),
            KeywordField::TrendScore => SortValue::Number(self.trend_score),
            KeywordField::CalculatedAt => self
                .calculated_at
                .map_or_else(SortValue::missing, |at| SortValue::Timestamp(at.timestamp_millis())),
            KeywordField::AverageArticleRating => SortValue::Number(self.average_article_rating),
        }
    }

    fn default_sort() -> SortDescriptor<KeywordField> {
        SortDescriptor::desc(KeywordField::OverallScore)
    }
}
