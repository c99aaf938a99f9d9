//! Dashboard events and the notices they produce.
//!
//! Front-ends translate user input into [`Event`]s and hand them to
//! [`Dashboard::handle_event`](crate::app::Dashboard::handle_event). The
//! returned [`Notice`]s tell the front-end what to redraw or report.
//!
//! # Example
//!
//! ```rust
//! use newsrank::app::{Collection, Event};
//!
//! let event = Event::Search {
//!     collection: Collection::Articles,
//!     term: "eleição".into(),
//! };
//! assert_eq!(event.collection(), Some(Collection::Articles));
//! ```

use crate::domain::DateRange;
use crate::pipeline::{ArticleField, KeywordField, Region};
use crate::scoring::RatingOutcome;

/// The two paged collections on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Articles,
    Keywords,
}

impl Collection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Articles => "articles",
            Self::Keywords => "keywords",
        }
    }
}

/// User-driven changes to the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// New date range for both collections. Refetches only if it differs.
    SetDateRange(DateRange),
    /// Free-text filter on titles, keyword names and tags.
    Search { collection: Collection, term: String },
    /// Geographic filter. Keywords carry no location and ignore it.
    SetRegion { collection: Collection, region: Region },
    /// Header click on an article column.
    SortArticles(ArticleField),
    /// Header click on a keyword column.
    SortKeywords(KeywordField),
    /// Jump to a 1-indexed page of the filtered view.
    GoToPage { collection: Collection, page: usize },
    /// Explicit "load more" request.
    LoadMore(Collection),
    /// Drop the buffer and refetch the current range.
    Refresh(Collection),
    /// Star rating submitted for an article.
    RateArticle { article_id: String, rating: i64 },
}

impl Event {
    /// The collection this event targets, `None` when it targets both or neither.
    #[must_use]
    pub const fn collection(&self) -> Option<Collection> {
        match self {
            Self::Search { collection, .. }
            | Self::SetRegion { collection, .. }
            | Self::GoToPage { collection, .. } => Some(*collection),
            Self::LoadMore(collection) | Self::Refresh(collection) => Some(*collection),
            Self::SortArticles(_) | Self::RateArticle { .. } => Some(Collection::Articles),
            Self::SortKeywords(_) => Some(Collection::Keywords),
            Self::SetDateRange(_) => None,
        }
    }
}

/// What changed after an event was handled.
#[derive(Debug)]
pub enum Notice {
    /// The collection's view changed and should be redrawn.
    Redraw(Collection),
    /// A rating was persisted. Check [`RatingOutcome::is_stale`] before
    /// trusting the redrawn scores.
    RatingSaved(RatingOutcome),
    /// A fetch failed; the view keeps the records it already had.
    FetchFailed { collection: Collection, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_name_their_collection() {
        assert_eq!(Event::SortKeywords(KeywordField::Name).collection(), Some(Collection::Keywords));
        assert_eq!(
            Event::RateArticle {
                article_id: "a1".into(),
                rating: 4
            }
            .collection(),
            Some(Collection::Articles)
        );
        assert_eq!(Event::SetDateRange(DateRange::today()).collection(), None);
        assert_eq!(Collection::Keywords.as_str(), "keywords");
    }
}
