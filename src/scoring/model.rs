//! Keyword and article score formulas.
//!
//! All functions here are pure and deterministic. Scores are real-valued; display
//! layers round them only for presentation.
//!
//! A keyword's ranking is built from four sub-scores:
//!
//! ```text
//! quantity  = Σ 1.25^(-days_ago_i)            over matching articles
//! recency   = 10 / 1.25^days_since_first_seen
//! relevance = log10(avg_search_volume)        0 when volume <= 0
//! trend     = (current_hour_pct - weekly_avg_pct) / 10
//! ```
//!
//! which are combined by [`overall_score`] into a weighted average and then scaled by
//! the rating impact multiplier (see [`crate::scoring::impact`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Base of the exponential decay applied per day of article age.
pub const DECAY_BASE: f64 = 1.25;

/// Recency score of a keyword first seen today.
pub const RECENCY_CEILING: f64 = 10.0;

/// Divisor turning a percentage-point trend delta into a score.
pub const TREND_DIVISOR: f64 = 10.0;

/// Weights used by [`overall_score`].
///
/// Not user-tunable; the weights are normalised by their sum, so only their ratios matter.
pub const OVERALL_WEIGHTS: ScoreWeights = ScoreWeights {
    quantity: 0.30,
    recency: 0.25,
    relevance: 0.30,
    trend: 0.15,
};

/// The four raw keyword sub-scores.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SubScores {
    pub quantity: f64,
    pub recency: f64,
    pub relevance: f64,
    pub trend: f64,
}

/// Relative weight of each sub-score in the overall score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub quantity: f64,
    pub recency: f64,
    pub relevance: f64,
    pub trend: f64,
}

impl ScoreWeights {
    const fn total(&self) -> f64 {
        self.quantity + self.recency + self.relevance + self.trend
    }
}

/// Raw upstream signal for one keyword.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeywordSignals {
    /// Age in whole days of every article matching the keyword.
    pub article_ages_days: Vec<i64>,
    pub days_since_first_seen: f64,
    pub avg_search_volume: f64,
    pub current_hour_pct: f64,
    pub weekly_avg_pct: f64,
}

impl KeywordSignals {
    /// Computes the four sub-scores from the raw signal.
    #[must_use]
    pub fn sub_scores(&self) -> SubScores {
        SubScores {
            quantity: quantity_score(self.article_ages_days.iter().copied()),
            recency: recency_score(self.days_since_first_seen),
            relevance: relevance_score(self.avg_search_volume),
            trend: trend_score(self.current_hour_pct, self.weekly_avg_pct),
        }
    }
}

/// Whole days elapsed between `published_at` and `now`, never negative.
#[must_use]
pub fn days_ago(published_at: &DateTime<Utc>, now: &DateTime<Utc>) -> i64 {
    (*now - *published_at).num_days().max(0)
}

/// Sum of `1.25^(-d)` over the ages of the articles matching a keyword.
///
/// Each article contributes at most `1.0` (published today); older articles
/// contribute exponentially less. Negative ages are treated as today.
///
/// ```
/// use newsrank::scoring::quantity_score;
///
/// assert_eq!(quantity_score([0, 0]), 2.0);
/// assert!(quantity_score([0, 1]) > quantity_score([0, 2]));
/// assert_eq!(quantity_score(Vec::<i64>::new()), 0.0);
/// ```
#[must_use]
pub fn quantity_score<I>(days_ago: I) -> f64
where
    I: IntoIterator<Item = i64>,
{
    days_ago
        .into_iter()
        .map(|d| {
            #[allow(clippy::cast_precision_loss)]
            let d = d.max(0) as f64;
            DECAY_BASE.powf(-d)
        })
        .sum()
}

/// `10 / 1.25^d`: equals 10 at `d = 0` and strictly decreases with `d`.
///
/// Negative or non-finite inputs are treated as `0`.
#[must_use]
pub fn recency_score(days_since_first_seen: f64) -> f64 {
    let d = if days_since_first_seen.is_finite() {
        days_since_first_seen.max(0.0)
    } else {
        0.0
    };
    RECENCY_CEILING / DECAY_BASE.powf(d)
}

/// `log10(avg_search_volume)`, guarded to `0.0` when the volume is not positive.
#[must_use]
pub fn relevance_score(avg_search_volume: f64) -> f64 {
    if avg_search_volume.is_finite() && avg_search_volume > 0.0 {
        avg_search_volume.log10()
    } else {
        0.0
    }
}

/// `(current_hour_pct - weekly_avg_pct) / 10`. Negative when interest is falling.
#[must_use]
pub fn trend_score(current_hour_pct: f64, weekly_avg_pct: f64) -> f64 {
    (current_hour_pct - weekly_avg_pct) / TREND_DIVISOR
}

/// Weighted average of the four sub-scores using [`OVERALL_WEIGHTS`].
#[must_use]
pub fn overall_score(sub: &SubScores) -> f64 {
    let w = OVERALL_WEIGHTS;
    (sub.quantity * w.quantity
        + sub.recency * w.recency
        + sub.relevance * w.relevance
        + sub.trend * w.trend)
        / w.total()
}

/// Article total score: the sum of its matched keyword scores.
#[must_use]
pub fn article_total_score(keyword_scores: &[f64]) -> f64 {
    keyword_scores.iter().sum()
}

/// Article average score: the mean of its matched keyword scores.
///
/// An article without keywords scores `0.0` rather than dividing by zero.
#[must_use]
pub fn article_average_score(keyword_scores: &[f64]) -> f64 {
    if keyword_scores.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = keyword_scores.len() as f64;
    article_total_score(keyword_scores) / count
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const EPS: f64 = 1e-12;

    #[test]
    fn quantity_decays_with_age() {
        assert!((quantity_score([0]) - 1.0).abs() < EPS);
        assert!((quantity_score([1]) - 0.8).abs() < EPS);
        assert!((quantity_score([0, 1, 2]) - (1.0 + 0.8 + 0.64)).abs() < EPS);
        assert!((quantity_score([-3]) - 1.0).abs() < EPS);
    }

    #[test]
    fn recency_starts_at_ten_and_decreases() {
        assert!((recency_score(0.0) - 10.0).abs() < EPS);
        assert!((recency_score(1.0) - 8.0).abs() < EPS);
        let mut last = recency_score(0.0);
        for d in 1..30 {
            let next = recency_score(f64::from(d));
            assert!(next < last);
            last = next;
        }
        assert!((recency_score(f64::NAN) - 10.0).abs() < EPS);
    }

    #[test]
    fn relevance_guards_non_positive_volume() {
        assert!((relevance_score(1000.0) - 3.0).abs() < EPS);
        assert_eq!(relevance_score(0.0), 0.0);
        assert_eq!(relevance_score(-5.0), 0.0);
        assert_eq!(relevance_score(f64::INFINITY), 0.0);
    }

    #[test]
    fn trend_can_be_negative() {
        assert!((trend_score(12.0, 4.0) - 0.8).abs() < EPS);
        assert!((trend_score(2.0, 4.0) + 0.2).abs() < EPS);
    }

    #[test]
    fn overall_is_deterministic_weighted_average() {
        let sub = SubScores {
            quantity: 2.0,
            recency: 5.0,
            relevance: 3.0,
            trend: -0.2,
        };
        let first = overall_score(&sub);
        for _ in 0..10 {
            assert_eq!(overall_score(&sub).to_bits(), first.to_bits());
        }
        let expected = (2.0 * 0.30 + 5.0 * 0.25 + 3.0 * 0.30 - 0.2 * 0.15) / 1.0;
        assert!((first - expected).abs() < EPS);

        let flat = SubScores {
            quantity: 7.0,
            recency: 7.0,
            relevance: 7.0,
            trend: 7.0,
        };
        assert!((overall_score(&flat) - 7.0).abs() < EPS);
    }

    #[test]
    fn article_scores_sum_and_average() {
        assert!((article_total_score(&[10.0, 20.0]) - 30.0).abs() < EPS);
        assert!((article_average_score(&[10.0, 20.0]) - 15.0).abs() < EPS);
        assert_eq!(article_average_score(&[]), 0.0);
        assert_eq!(article_total_score(&[]), 0.0);
    }

    #[test]
    fn signals_produce_sub_scores() {
        let signals = KeywordSignals {
            article_ages_days: vec![0, 1],
            days_since_first_seen: 0.0,
            avg_search_volume: 100.0,
            current_hour_pct: 5.0,
            weekly_avg_pct: 3.0,
        };
        let sub = signals.sub_scores();
        assert!((sub.quantity - 1.8).abs() < EPS);
        assert!((sub.recency - 10.0).abs() < EPS);
        assert!((sub.relevance - 2.0).abs() < EPS);
        assert!((sub.trend - 0.2).abs() < EPS);
    }

    #[test]
    fn days_ago_counts_whole_days() {
        let now = Utc::now();
        assert_eq!(days_ago(&(now - Duration::hours(47)), &now), 1);
        assert_eq!(days_ago(&(now + Duration::hours(5)), &now), 0);
    }
}
