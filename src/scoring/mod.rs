//! Keyword and article scoring.
//!
//! - [`model`]: Pure sub-score, overall and article score formulas
//! - [`impact`]: Rating impact multiplier and the rescoring engine

pub mod impact;
pub mod model;

pub use impact::{
    average_rating, impact_multiplier, weighted_score, BoostPolicy, RatingImpactEngine, RatingOutcome,
    RatingScaledBoost, RatingState, RATED_BOOST_MAX, RATED_BOOST_MIN, RELATED_BOOST_CAP,
};
pub use model::{
    article_average_score, article_total_score, days_ago, overall_score, quantity_score, recency_score,
    relevance_score, trend_score, KeywordSignals, ScoreWeights, SubScores, DECAY_BASE, OVERALL_WEIGHTS,
    RECENCY_CEILING, TREND_DIVISOR,
};
