//! Domain layer for the newsrank core.
//!
//! This module contains the records the dashboard ranks (articles, keywords,
//! competitor articles), the date ranges that scope them, and the crate-wide
//! error type. It has no knowledge of the backing store or of pagination.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`article`]: Articles, ratings and URL source extraction
//! - [`keyword`]: Keywords and their derived overall score
//! - [`competitor`]: Competitor SEO records and comparison views
//! - [`date_range`]: Inclusive UTC date ranges and picker presets

pub mod article;
pub mod competitor;
pub mod date_range;
pub mod error;
pub mod keyword;

pub use article::{source_from_url, Article, ArticleRating};
pub use competitor::{
    rank_competitors, split_keyword_comparison, top_competitor_articles, Competitor,
    CompetitorArticle, KeywordComparison,
};
pub use date_range::{DateRange, Preset};
pub use error::{NewsrankError, Result};
pub use keyword::Keyword;
