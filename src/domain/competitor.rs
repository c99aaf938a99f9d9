//! Competitor SEO models and comparison views.
//!
//! Competitor data is produced by a third-party SEO audit upstream; this crate
//! only ranks and slices it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::date_range::DateRange;

/// An article published by a competitor, with its SEO audit output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorArticle {
    pub id: String,
    pub title: String,
    pub competitor_name: String,
    /// Audit score in `0..=100`.
    pub seo_score: u8,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub main_keywords: Vec<String>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub continent: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub total_score: f64,
    #[serde(default)]
    pub average_score: f64,
    /// Numeric audit metrics, e.g. `"wordCount" -> 1240`.
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
    /// Pass/fail audit checks, e.g. `"hasMetaDescription" -> true`.
    #[serde(default)]
    pub checks: BTreeMap<String, bool>,
}

impl CompetitorArticle {
    /// Fraction of audit checks that passed, `0.0` when there are none.
    #[must_use]
    pub fn passed_checks_ratio(&self) -> f64 {
        if self.checks.is_empty() {
            return 0.0;
        }
        let passed = self.checks.values().filter(|ok| **ok).count();
        #[allow(clippy::cast_precision_loss)]
        let ratio = passed as f64 / self.checks.len() as f64;
        ratio
    }
}

/// A named competitor and its keyword ranking summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competitor {
    pub id: String,
    pub name: String,
    /// Mean search position over ranked keywords. Lower is better.
    pub avg_keyword_position: f64,
    pub ranked_keywords_count: u32,
}

/// One keyword scored for us and for a competitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordComparison {
    pub keyword: String,
    pub own_score: f64,
    pub competitor_score: f64,
}

/// Competitor articles published inside `range`, best SEO score first.
///
/// Ties keep their input order.
#[must_use]
pub fn top_competitor_articles(articles: &[CompetitorArticle], range: &DateRange) -> Vec<CompetitorArticle> {
    let mut selected: Vec<CompetitorArticle> = articles
        .iter()
        .filter(|a| range.contains(&a.published_at))
        .cloned()
        .collect();
    selected.sort_by(|a, b| b.seo_score.cmp(&a.seo_score));
    selected
}

/// Competitors ordered by average keyword position, best (lowest) first.
#[must_use]
pub fn rank_competitors(competitors: &[Competitor]) -> Vec<Competitor> {
    let mut ranked = competitors.to_vec();
    ranked.sort_by(|a, b| {
        a.avg_keyword_position
            .partial_cmp(&b.avg_keyword_position)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}

/// Splits comparisons into keywords we lead on and keywords the competitor leads on.
///
/// Both lists are ordered by the size of the gap, widest first. Exact ties belong
/// to neither list.
#[must_use]
pub fn split_keyword_comparison(
    comparisons: &[KeywordComparison],
) -> (Vec<KeywordComparison>, Vec<KeywordComparison>) {
    let gap = |c: &KeywordComparison| (c.own_score - c.competitor_score).abs();

    let (mut leading, mut trailing): (Vec<_>, Vec<_>) = comparisons
        .iter()
        .filter(|c| c.own_score != c.competitor_score)
        .cloned()
        .partition(|c| c.own_score > c.competitor_score);

    for list in [&mut leading, &mut trailing] {
        list.sort_by(|a, b| gap(b).partial_cmp(&gap(a)).unwrap_or(std::cmp::Ordering::Equal));
    }
    (leading, trailing)
}
