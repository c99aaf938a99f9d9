//! Article and rating domain models.
//!
//! An [`Article`] carries the scores computed upstream from the keywords it matched.
//! Its `total_score` is the sum of those keyword scores and `average_score` their
//! mean, so both move together whenever a rating boost is applied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A news article ranked by the keywords it matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub total_score: f64,
    pub average_score: f64,
    /// Publisher name derived from `url` (see [`source_from_url`]).
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub country: String,
    pub continent: String,
    pub url: String,
    /// Matched keyword names, in display order.
    pub keywords: Vec<String>,
}

impl Article {
    /// Scales both scores by `1 + boost`.
    ///
    /// Scaling the sum and the mean by the same factor keeps
    /// `average_score == total_score / keywords.len()` intact.
    pub fn apply_boost(&mut self, boost: f64) {
        let factor = 1.0 + boost;
        self.total_score *= factor;
        self.average_score *= factor;
    }

    /// Number of this article's keywords that also appear in `others`.
    #[must_use]
    pub fn shared_keywords(&self, others: &[String]) -> usize {
        self.keywords
            .iter()
            .filter(|k| others.iter().any(|o| o == *k))
            .count()
    }
}

/// A user's 1-5 quality judgement on an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRating {
    pub id: String,
    pub article_id: String,
    pub rating: u8,
}

/// Extracts a short publisher name from an article URL.
///
/// `https://www.tecmundo.com.br/x` becomes `tecmundo` and
/// `https://news.example.org/a` becomes `news.example`. Inputs that are not
/// `http(s)` URLs are returned unchanged.
///
/// ```
/// use newsrank::domain::source_from_url;
///
/// assert_eq!(source_from_url("https://www.tecmundo.com.br/mercado/1"), "tecmundo");
/// assert_eq!(source_from_url("http://theverge.com/tech"), "theverge");
/// assert_eq!(source_from_url("not a url"), "not a url");
/// ```
#[must_use]
pub fn source_from_url(url: &str) -> String {
    let lower = url.to_ascii_lowercase();
    let rest = if lower.starts_with("https://") {
        &url[8..]
    } else if lower.starts_with("http://") {
        &url[7..]
    } else {
        return url.to_string();
    };

    let rest = if rest.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("www.")) {
        &rest[4..]
    } else {
        rest
    };

    let domain = rest.split('/').next().unwrap_or_default();
    if domain.is_empty() {
        return url.to_string();
    }

    let domain = domain.strip_suffix(".com.br").unwrap_or(domain);
    match domain.rfind('.') {
        Some(dot) => domain[..dot].to_string(),
        None => domain.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://www.tecmundo.com.br/produto/123", "tecmundo")]
    #[case("https://canaltech.com.br", "canaltech")]
    #[case("HTTPS://WWW.Olhardigital.com.br/a", "Olhardigital")]
    #[case("https://techcrunch.com/2024/01/01/x", "techcrunch")]
    #[case("https://blog.example.co.uk/post", "blog.example.co")]
    #[case("ftp://files.example.com", "ftp://files.example.com")]
    #[case("https:///broken", "https:///broken")]
    fn extracts_source_names(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(source_from_url(url), expected);
    }

    #[test]
    fn boost_preserves_average_invariant() {
        let mut article = Article {
            id: "a1".into(),
            title: "Chips".into(),
            total_score: 30.0,
            average_score: 15.0,
            source: "example".into(),
            published_at: Utc::now(),
            country: "Brazil".into(),
            continent: "South America".into(),
            url: "https://example.com".into(),
            keywords: vec!["ai".into(), "chips".into()],
        };
        article.apply_boost(0.1);
        assert!((article.total_score - 33.0).abs() < 1e-9);
        assert!((article.average_score - article.total_score / 2.0).abs() < 1e-9);
    }
}
