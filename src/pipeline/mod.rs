//! Pure filter, sort and paginate pipeline over buffered records.
//!
//! The pipeline never touches the backing store. Given the buffer and a
//! [`ViewCriteria`], [`derive_view`] returns the indices of the visible records in
//! display order; [`paginate`] then slices one page out of that view.
//!
//! # Organization
//!
//! - [`record`]: The [`Record`] trait and the article/keyword field enums
//! - [`filter`]: Search and accent-insensitive region predicates
//! - [`sort`]: Stable comparator and sort descriptors

pub mod filter;
pub mod record;
pub mod sort;

pub use filter::{fold, matches_region, matches_search, Region};
pub use record::{ArticleField, KeywordField, Record, SortField};
pub use sort::{compare, sort_records, SortDescriptor, SortDirection, SortValue};

use crate::domain::{NewsrankError, Result};

/// Client-side view criteria: everything except the date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewCriteria<F> {
    pub search: String,
    pub region: Region,
    pub sort: SortDescriptor<F>,
}

impl<F: Copy + Eq> ViewCriteria<F> {
    #[must_use]
    pub fn new(sort: SortDescriptor<F>) -> Self {
        Self {
            search: String::new(),
            region: Region::All,
            sort,
        }
    }
}

/// Default criteria for a record type: no search, all regions, its default sort.
#[must_use]
pub fn default_criteria<T: Record>() -> ViewCriteria<T::Field> {
    ViewCriteria::new(T::default_sort())
}

/// Indices into `records` of the visible records, in display order.
///
/// Filtering keeps buffer order; the sort is stable, so ties keep it too.
pub fn derive_view<T: Record>(records: &[T], criteria: &ViewCriteria<T::Field>) -> Vec<usize> {
    let mut view: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| matches_search(*r, &criteria.search) && matches_region(*r, criteria.region))
        .map(|(i, _)| i)
        .collect();
    view.sort_by(|&a, &b| compare(&records[a], &records[b], &criteria.sort));
    view
}

/// Owned copy of the visible records in display order.
pub fn apply<T: Record>(records: &[T], criteria: &ViewCriteria<T::Field>) -> Vec<T> {
    derive_view(records, criteria)
        .into_iter()
        .map(|i| records[i].clone())
        .collect()
}

/// `ceil(len / per_page)`. Zero when the view is empty.
#[must_use]
pub const fn total_pages(len: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    len.div_ceil(per_page)
}

/// One 1-indexed page of `view`.
///
/// Page 1 of an empty view is an empty slice; any other page outside
/// `1..=total_pages` is [`NewsrankError::InvalidPage`].
///
/// # Errors
///
/// Returns [`NewsrankError::InvalidPage`] for out-of-range pages.
///
/// # Examples
///
/// ```
/// use newsrank::pipeline::paginate;
///
/// let view: Vec<u32> = (1..=23).collect();
/// assert_eq!(paginate(&view, 3, 10).unwrap(), &[21, 22, 23]);
/// assert!(paginate(&view, 4, 10).is_err());
/// assert!(paginate::<u32>(&[], 1, 10).unwrap().is_empty());
/// ```
pub fn paginate<T>(view: &[T], page: usize, per_page: usize) -> Result<&[T]> {
    let pages = total_pages(view.len(), per_page);
    if page == 1 && pages == 0 {
        return Ok(&[]);
    }
    if page == 0 || page > pages {
        return Err(NewsrankError::InvalidPage {
            page,
            total_pages: pages,
        });
    }
    let start = (page - 1) * per_page;
    let end = (start + per_page).min(view.len());
    Ok(&view[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Article, Keyword};
    use crate::scoring::SubScores;
    use chrono::{TimeZone, Utc};

    fn article(id: &str, title: &str, avg: f64, country: &str, continent: &str) -> Article {
        Article {
            id: id.into(),
            title: title.into(),
            total_score: avg * 2.0,
            average_score: avg,
            source: "folha".into(),
            published_at: Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).single().expect("valid"),
            country: country.into(),
            continent: continent.into(),
            url: String::new(),
            keywords: vec!["economia".into(), "juros".into()],
        }
    }

    fn sample() -> Vec<Article> {
        vec![
            article("1", "Selic sobe", 40.0, "Brasil", "América do Sul"),
            article("2", "Fed holds rates", 75.0, "United States", "North America"),
            article("3", "Inflação recua", 60.0, "Brazil", "South America"),
            article("4", "BCE corta juros", 20.0, "Germany", "Europa"),
        ]
    }

    #[test]
    fn filter_and_sort_compose() {
        let records = sample();
        let mut criteria = default_criteria::<Article>();
        criteria.region = Region::Brasil;
        let ids: Vec<_> = apply(&records, &criteria).into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["3", "1"]);

        criteria.region = Region::Internacional;
        criteria.sort = SortDescriptor::new(ArticleField::AverageScore, SortDirection::Asc);
        let ids: Vec<_> = apply(&records, &criteria).into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["4", "2"]);
    }

    #[test]
    fn search_matches_title_and_keywords() {
        let records = sample();
        let mut criteria = default_criteria::<Article>();
        criteria.search = "  FED ".into();
        assert_eq!(derive_view(&records, &criteria), vec![1]);

        criteria.search = "juros".into();
        assert_eq!(derive_view(&records, &criteria).len(), 4);

        criteria.search = "   ".into();
        assert_eq!(derive_view(&records, &criteria).len(), 4);
    }

    #[test]
    fn keywords_ignore_region_and_search_by_name_only() {
        let keywords = vec![
            Keyword::new("k1", "inteligência artificial", SubScores::default(), 3.0, None),
            Keyword::new("k2", "eleições", SubScores::default(), 3.0, None),
        ];
        let mut criteria = default_criteria::<Keyword>();
        criteria.region = Region::Oceania;
        assert_eq!(derive_view(&keywords, &criteria).len(), 2);

        criteria.search = "ELEI".into();
        assert_eq!(derive_view(&keywords, &criteria), vec![1]);
    }

    #[test]
    fn pagination_covers_view_without_gaps() {
        let view: Vec<usize> = (0..23).collect();
        assert_eq!(total_pages(view.len(), 10), 3);

        let mut seen = Vec::new();
        for page in 1..=3 {
            seen.extend_from_slice(paginate(&view, page, 10).expect("page in range"));
        }
        assert_eq!(seen, view);
        assert_eq!(paginate(&view, 3, 10).expect("last page").len(), 3);
    }

    #[test]
    fn pages_outside_range_are_rejected() {
        let view: Vec<usize> = (0..5).collect();
        assert!(matches!(
            paginate(&view, 0, 10),
            Err(NewsrankError::InvalidPage { page: 0, total_pages: 1 })
        ));
        assert!(matches!(
            paginate(&view, 2, 10),
            Err(NewsrankError::InvalidPage { page: 2, total_pages: 1 })
        ));
        assert!(paginate::<usize>(&[], 2, 10).is_err());
    }
}
