//! Keyword domain model.
//!
//! A keyword carries four raw sub-scores produced upstream and one derived
//! overall score. The overall score is never set independently: it is always
//! [`weighted_score`](crate::scoring::weighted_score) applied to the
//! sub-scores and the keyword's average article rating.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::{overall_score, weighted_score, SubScores};

/// A tracked search term and its scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyword {
    pub id: String,
    pub name: String,
    pub overall_score: f64,
    pub quantity_score: f64,
    pub recency_score: f64,
    pub relevance_score: f64,
    /// May be negative when the keyword is cooling down.
    pub trend_score: f64,
    /// Mean of all article ratings for this keyword, `0.0` when unrated.
    pub average_article_rating: f64,
    pub calculated_at: Option<DateTime<Utc>>,
}

impl Keyword {
    /// Creates a keyword and derives its overall score.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        sub: SubScores,
        average_article_rating: f64,
        calculated_at: Option<DateTime<Utc>>,
    ) -> Self {
        let mut keyword = Self {
            id: id.into(),
            name: name.into(),
            overall_score: 0.0,
            quantity_score: sub.quantity,
            recency_score: sub.recency,
            relevance_score: sub.relevance,
            trend_score: sub.trend,
            average_article_rating,
            calculated_at,
        };
        keyword.recalculate();
        keyword
    }

    #[must_use]
    pub const fn sub_scores(&self) -> SubScores {
        SubScores {
            quantity: self.quantity_score,
            recency: self.recency_score,
            relevance: self.relevance_score,
            trend: self.trend_score,
        }
    }

    /// The overall score this keyword should have, given its current inputs.
    #[must_use]
    pub fn derived_overall_score(&self) -> f64 {
        weighted_score(overall_score(&self.sub_scores()), self.average_article_rating)
    }

    /// Recomputes `overall_score` from the sub-scores and impact rating.
    pub fn recalculate(&mut self) {
        self.overall_score = self.derived_overall_score();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_keyword_derives_overall_score() {
        let sub = SubScores {
            quantity: 2.0,
            recency: 5.0,
            relevance: 3.0,
            trend: -0.2,
        };
        let keyword = Keyword::new("k1", "ai", sub, 5.0, None);
        let expected = overall_score(&sub) * 1.5;
        assert!((keyword.overall_score - expected).abs() < 1e-12);
    }

    #[test]
    fn recalculate_follows_rating_changes() {
        let sub = SubScores {
            quantity: 4.0,
            recency: 4.0,
            relevance: 4.0,
            trend: 4.0,
        };
        let mut keyword = Keyword::new("k2", "chips", sub, 0.0, None);
        assert!((keyword.overall_score - 4.0).abs() < 1e-12);

        keyword.average_article_rating = 1.0;
        keyword.recalculate();
        assert!((keyword.overall_score - 2.0).abs() < 1e-12);
    }
}
