//! Client-side ordering of buffered records.
//!
//! The comparator mirrors what users expect from a sortable table header:
//!
//! - `asc` orders by strict `<`; values that are neither `<` nor `>` tie
//! - `desc` is the exact mirror of `asc`
//! - ties keep their buffer order because sorting is stable
//! - dates compare by epoch milliseconds, lists by their length
//! - missing values compare as the empty string
//!
//! Text is compared case-insensitively. Comparisons between a number and text
//! only succeed when the text is empty (a missing value), which then counts as
//! zero; any other mixed comparison ties.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

use super::record::Record;
use crate::domain::NewsrankError;

/// Direction of a sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    #[must_use]
    pub const fn is_ascending(self) -> bool {
        matches!(self, Self::Asc)
    }
}

impl FromStr for SortDirection {
    type Err = NewsrankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(NewsrankError::Config(format!("unknown sort direction: {other}"))),
        }
    }
}

/// Field plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortDescriptor<F> {
    pub field: F,
    pub direction: SortDirection,
}

impl<F: Copy + Eq> SortDescriptor<F> {
    #[must_use]
    pub const fn new(field: F, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    #[must_use]
    pub const fn desc(field: F) -> Self {
        Self::new(field, SortDirection::Desc)
    }

    /// The descriptor a header click on `field` produces.
    ///
    /// Clicking the field that is already sorted descending flips it to ascending;
    /// anything else sorts `field` descending.
    #[must_use]
    pub fn toggled(self, field: F) -> Self {
        if self.field == field && self.direction == SortDirection::Desc {
            Self::new(field, SortDirection::Asc)
        } else {
            Self::desc(field)
        }
    }
}

/// A single comparable value extracted from a record.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    /// Lower-cased text. Missing values are the empty string.
    Text(String),
    Number(f64),
    /// Epoch milliseconds.
    Timestamp(i64),
    /// Length of a list-valued field.
    Count(usize),
}

impl SortValue {
    /// The value used for absent fields.
    #[must_use]
    pub const fn missing() -> Self {
        Self::Text(String::new())
    }

    #[must_use]
    pub fn text(value: &str) -> Self {
        Self::Text(value.to_lowercase())
    }

    #[allow(clippy::cast_precision_loss)]
    fn numeric(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Timestamp(t) => Some(*t as f64),
            Self::Count(c) => Some(*c as f64),
            Self::Text(s) if s.is_empty() => Some(0.0),
            Self::Text(_) => None,
        }
    }

    /// Ascending comparison; incomparable values tie.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            (Self::Count(a), Self::Count(b)) => a.cmp(b),
            _ => match (self.numeric(), other.numeric()) {
                (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            },
        }
    }
}

/// Compares two records under `sort`.
pub fn compare<T: Record>(a: &T, b: &T, sort: &SortDescriptor<T::Field>) -> Ordering {
    let ordering = a.sort_value(sort.field).compare(&b.sort_value(sort.field));
    match sort.direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Stable in-place sort of `records` under `sort`.
pub fn sort_records<T: Record>(records: &mut [T], sort: &SortDescriptor<T::Field>) {
    records.sort_by(|a, b| compare(a, b, sort));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Article;
    use crate::pipeline::record::ArticleField;
    use chrono::{Duration, TimeZone, Utc};

    fn article(id: &str, title: &str, avg: f64, minutes: i64, keywords: &[&str]) -> Article {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).single().expect("valid");
        Article {
            id: id.into(),
            title: title.into(),
            total_score: avg * keywords.len() as f64,
            average_score: avg,
            source: "example".into(),
            published_at: base + Duration::minutes(minutes),
            country: "Brazil".into(),
            continent: "South America".into(),
            url: format!("https://example.com/{id}"),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        }
    }

    fn ids(records: &[Article]) -> Vec<&str> {
        records.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn date_sort_desc_is_reverse_of_asc() {
        let mut asc = vec![
            article("a", "x", 1.0, 30, &["k"]),
            article("b", "x", 1.0, 10, &["k"]),
            article("c", "x", 1.0, 50, &["k"]),
            article("d", "x", 1.0, 20, &["k"]),
        ];
        let mut desc = asc.clone();

        sort_records(&mut asc, &SortDescriptor::new(ArticleField::PublishedAt, SortDirection::Asc));
        sort_records(&mut desc, &SortDescriptor::desc(ArticleField::PublishedAt));

        asc.reverse();
        assert_eq!(ids(&asc), ids(&desc));
        assert_eq!(ids(&desc), vec!["c", "a", "d", "b"]);
    }

    #[test]
    fn keywords_sort_by_count_not_content() {
        let mut records = vec![
            article("a", "x", 1.0, 0, &["zzz"]),
            article("b", "x", 1.0, 0, &["a", "b", "c"]),
            article("c", "x", 1.0, 0, &["m", "n"]),
        ];
        sort_records(&mut records, &SortDescriptor::desc(ArticleField::Keywords));
        assert_eq!(ids(&records), vec!["b", "c", "a"]);
    }

    #[test]
    fn ties_keep_buffer_order() {
        let mut records = vec![
            article("first", "x", 2.0, 0, &["k"]),
            article("second", "x", 5.0, 0, &["k"]),
            article("third", "x", 2.0, 0, &["k"]),
        ];
        sort_records(&mut records, &SortDescriptor::new(ArticleField::AverageScore, SortDirection::Asc));
        assert_eq!(ids(&records), vec!["first", "third", "second"]);

        sort_records(&mut records, &SortDescriptor::desc(ArticleField::AverageScore));
        assert_eq!(ids(&records), vec!["second", "first", "third"]);
    }

    #[test]
    fn text_sort_ignores_case() {
        let mut records = vec![
            article("a", "banana", 1.0, 0, &["k"]),
            article("b", "Apple", 1.0, 0, &["k"]),
            article("c", "cherry", 1.0, 0, &["k"]),
        ];
        sort_records(&mut records, &SortDescriptor::new(ArticleField::Title, SortDirection::Asc));
        assert_eq!(ids(&records), vec!["b", "a", "c"]);
    }

    #[test]
    fn missing_values_compare_as_zero_against_numbers() {
        assert_eq!(SortValue::missing().compare(&SortValue::Number(3.0)), Ordering::Less);
        assert_eq!(SortValue::missing().compare(&SortValue::Timestamp(-5)), Ordering::Greater);
        assert_eq!(SortValue::text("abc").compare(&SortValue::Number(1.0)), Ordering::Equal);
        assert_eq!(SortValue::Number(f64::NAN).compare(&SortValue::Number(1.0)), Ordering::Equal);
    }

    #[test]
    fn toggling_same_desc_field_flips_to_asc() {
        let sort = SortDescriptor::desc(ArticleField::AverageScore);
        let flipped = sort.toggled(ArticleField::AverageScore);
        assert_eq!(flipped.direction, SortDirection::Asc);
        assert_eq!(flipped.toggled(ArticleField::AverageScore).direction, SortDirection::Desc);
        assert_eq!(sort.toggled(ArticleField::Title), SortDescriptor::desc(ArticleField::Title));
    }
}
