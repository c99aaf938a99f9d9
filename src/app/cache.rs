//! Incremental pagination over a backend that caps every query.
//!
//! This module defines [`PagedCollectionCache`], the state container behind both
//! the article and the keyword tables. It owns a buffer of everything fetched so
//! far for one date range, tracks how far into the backend that buffer reaches,
//! and derives the filtered, sorted and paginated view the UI renders.
//!
//! # Architecture
//!
//! The cache performs no I/O. Operations that need the backend return a
//! [`FetchRequest`]; the caller executes it and hands the outcome back through
//! [`apply_page`](PagedCollectionCache::apply_page), which may in turn return the
//! next request. [`CollectionDriver`](crate::app::CollectionDriver) runs that loop
//! asynchronously.
//!
//! ```text
//! set_criteria / set_current_page / update_records
//!         │
//!         ▼
//!   re-derive view ──▶ should_prefetch? ──yes──▶ FetchRequest ──▶ backend
//!         ▲                                                        │
//!         └──────────────────── apply_page ◀───────────────────────┘
//! ```
//!
//! # Invariants
//!
//! - The buffer never holds two records with the same id
//! - At most one request is in flight; while it is, no other is issued
//! - Nothing is requested once the backend returned a short page (exhausted)
//! - Results tagged with an older generation than the current one are discarded
//! - A date range change is the only criteria change that refetches
//!
//! # Example
//!
//! ```
//! use newsrank::app::{CacheConfig, PagedCollectionCache};
//! use newsrank::domain::{Article, DateRange};
//!
//! let mut cache: PagedCollectionCache<Article> = PagedCollectionCache::new("articles", CacheConfig::default());
//! let request = cache.set_date_range(DateRange::today()).expect("first range triggers a fetch");
//! assert_eq!(request.offset, 0);
//! assert!(cache.fetch_next().is_none(), "already in flight");
//!
//! assert!(cache.apply_page(&request, Ok(Vec::new())).is_none());
//! assert!(!cache.view().has_more);
//! ```

use std::collections::HashSet;

use crate::domain::{DateRange, NewsrankError, Result};
use crate::pipeline::{self, derive_view, Record, Region, SortDescriptor, ViewCriteria};

/// Sizing of one paged collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Records requested per backend query. A shorter page marks the end of data.
    pub backend_page_size: usize,

    /// Records per client-side page.
    pub items_per_page: usize,

    /// Prefetch once the current page is within this many pages of the last one.
    pub prefetch_threshold_pages: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend_page_size: 500,
            items_per_page: 10,
            prefetch_threshold_pages: 3,
        }
    }
}

/// Why a request was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// First page after a date range change.
    Initial,
    /// A further page appended to an existing buffer.
    More,
}

/// A backend query the cache wants executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest<F> {
    /// Buffer generation the result belongs to.
    pub generation: u64,
    pub offset: usize,
    pub limit: usize,
    pub range: DateRange,
    /// Backend ordering, fixed for the whole generation so offsets stay consistent.
    pub sort: SortDescriptor<F>,
    pub kind: FetchKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InFlight {
    generation: u64,
    offset: usize,
    kind: FetchKind,
}

/// One client-side page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSlice<T> {
    pub records: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    /// Records in the filtered view.
    pub total_count: usize,
}

/// Everything the UI needs to render a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView<T: Record> {
    pub records: Vec<T>,
    pub current_page: usize,
    pub total_pages: usize,
    /// Records in the filtered view.
    pub total_count: usize,
    /// Records fetched so far, before filtering.
    pub buffered_count: usize,
    pub is_loading: bool,
    pub is_loading_more: bool,
    /// `false` once the backend returned a short page.
    pub has_more: bool,
    pub sort: SortDescriptor<T::Field>,
    /// Message of the last failed fetch, cleared by the next success.
    pub last_error: Option<String>,
}

/// Buffered, filtered, sorted and paginated view over one logical collection.
///
/// See the [module documentation](self) for the request/apply protocol.
#[derive(Debug, Clone)]
pub struct PagedCollectionCache<T: Record> {
    /// Collection name used in log fields (`articles`, `keywords`).
    name: &'static str,

    config: CacheConfig,

    /// Every record fetched for the current range, in backend order.
    buffer: Vec<T>,

    /// Ids present in `buffer`.
    ids: HashSet<String>,

    /// Offset of the next backend page.
    next_offset: usize,

    /// Set when the backend returned fewer records than requested.
    exhausted: bool,

    in_flight: Option<InFlight>,

    /// Bumped on every buffer reset; results from older generations are dropped.
    generation: u64,

    /// Range the buffer belongs to. `None` until the first range is set.
    range: Option<DateRange>,

    /// Backend ordering for the current generation.
    backend_sort: SortDescriptor<T::Field>,

    criteria: ViewCriteria<T::Field>,

    /// Indices into `buffer` of the visible records, in display order.
    view: Vec<usize>,

    /// 1-indexed, always within `1..=max(total_pages, 1)`.
    current_page: usize,

    last_error: Option<String>,
}

impl<T: Record> PagedCollectionCache<T> {
    /// Creates an empty cache with the record type's default sort.
    ///
    /// Nothing is fetched until a date range is set.
    ///
    /// # Parameters
    ///
    /// * `name` - Collection name used in log fields
    /// * `config` - Backend page size, client page size and prefetch threshold
    #[must_use]
    pub fn new(name: &'static str, config: CacheConfig) -> Self {
        let criteria = pipeline::default_criteria::<T>();
        Self {
            name,
            config,
            buffer: Vec::new(),
            ids: HashSet::new(),
            next_offset: 0,
            exhausted: false,
            in_flight: None,
            generation: 0,
            range: None,
            backend_sort: criteria.sort,
            criteria,
            view: Vec::new(),
            current_page: 1,
            last_error: None,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }

    #[must_use]
    pub const fn range(&self) -> Option<&DateRange> {
        self.range.as_ref()
    }

    #[must_use]
    pub const fn criteria(&self) -> &ViewCriteria<T::Field> {
        &self.criteria
    }

    #[must_use]
    pub const fn current_page(&self) -> usize {
        self.current_page
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    #[must_use]
    pub const fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Every buffered record, in backend order.
    #[must_use]
    pub fn buffer(&self) -> &[T] {
        &self.buffer
    }

    /// Pages in the filtered view.
    #[must_use]
    pub fn total_pages(&self) -> usize {
        pipeline::total_pages(self.view.len(), self.config.items_per_page)
    }

    /// Applies a complete set of criteria.
    ///
    /// A date range different from the buffer's resets the buffer and returns the
    /// initial request for the new range. Otherwise only the view is re-derived;
    /// a sort change also returns to page 1. Either way the prefetch condition
    /// is re-evaluated.
    ///
    /// # Parameters
    ///
    /// * `range` - Date range the buffer must belong to
    /// * `view` - Search term, region and sort applied client-side
    ///
    /// # Returns
    ///
    /// The request to execute next, if any.
    pub fn set_criteria(&mut self, range: DateRange, view: ViewCriteria<T::Field>) -> Option<FetchRequest<T::Field>> {
        let _span = tracing::debug_span!("cache_set_criteria", collection = self.name).entered();

        if self.range != Some(range) {
            self.criteria = view;
            return Some(self.reset_for(range));
        }

        let sort_changed = self.criteria.sort != view.sort;
        self.criteria = view;
        if sort_changed {
            self.current_page = 1;
        }
        self.rederive();
        self.maybe_prefetch()
    }

    /// Changes only the date range.
    pub fn set_date_range(&mut self, range: DateRange) -> Option<FetchRequest<T::Field>> {
        let view = self.criteria.clone();
        self.set_criteria(range, view)
    }

    /// Changes only the search term.
    pub fn set_search(&mut self, search: impl Into<String>) -> Option<FetchRequest<T::Field>> {
        self.criteria.search = search.into();
        self.rederive();
        self.maybe_prefetch()
    }

    /// Changes only the region filter.
    pub fn set_region(&mut self, region: Region) -> Option<FetchRequest<T::Field>> {
        self.criteria.region = region;
        self.rederive();
        self.maybe_prefetch()
    }

    /// Header click on `field`: sorts it descending, or flips it to ascending when
    /// it already is. Always returns to page 1.
    pub fn set_sort(&mut self, field: T::Field) -> Option<FetchRequest<T::Field>> {
        self.criteria.sort = self.criteria.sort.toggled(field);
        self.current_page = 1;
        tracing::debug!(
            collection = self.name,
            field = ?self.criteria.sort.field,
            direction = self.criteria.sort.direction.as_str(),
            "sort changed"
        );
        self.rederive();
        self.maybe_prefetch()
    }

    /// Moves to page `page` of the filtered view.
    ///
    /// # Errors
    ///
    /// Returns [`NewsrankError::InvalidPage`] when `page` is outside
    /// `1..=total_pages` (page 1 is always accepted).
    pub fn set_current_page(&mut self, page: usize) -> Result<Option<FetchRequest<T::Field>>> {
        let total_pages = self.total_pages();
        if page == 0 || (page > total_pages && page != 1) {
            return Err(NewsrankError::InvalidPage { page, total_pages });
        }
        self.current_page = page;
        Ok(self.maybe_prefetch())
    }

    /// Clears the buffer and refetches the current range from offset 0.
    ///
    /// Returns `None` when no range has been set yet.
    pub fn reset(&mut self) -> Option<FetchRequest<T::Field>> {
        let range = self.range?;
        Some(self.reset_for(range))
    }

    fn reset_for(&mut self, range: DateRange) -> FetchRequest<T::Field> {
        self.generation += 1;
        self.range = Some(range);
        self.buffer.clear();
        self.ids.clear();
        self.view.clear();
        self.next_offset = 0;
        self.exhausted = false;
        self.in_flight = None;
        self.current_page = 1;
        self.last_error = None;
        self.backend_sort = self.criteria.sort;

        tracing::debug!(
            collection = self.name,
            generation = self.generation,
            from = %range.from,
            to = %range.to,
            "buffer reset for new range"
        );
        self.issue(FetchKind::Initial)
    }

    fn issue(&mut self, kind: FetchKind) -> FetchRequest<T::Field> {
        self.in_flight = Some(InFlight {
            generation: self.generation,
            offset: self.next_offset,
            kind,
        });
        FetchRequest {
            generation: self.generation,
            offset: self.next_offset,
            limit: self.config.backend_page_size,
            range: self.range.unwrap_or_else(DateRange::today),
            sort: self.backend_sort,
            kind,
        }
    }

    /// Requests the next backend page.
    ///
    /// Returns `None` when no range is set, the backend is exhausted, or a request
    /// is already in flight. The dropped call is not queued.
    pub fn fetch_next(&mut self) -> Option<FetchRequest<T::Field>> {
        if self.range.is_none() || self.exhausted {
            return None;
        }
        if let Some(pending) = self.in_flight {
            tracing::trace!(
                collection = self.name,
                offset = pending.offset,
                "fetch already in flight, dropping request"
            );
            return None;
        }
        // Retrying a failed first page is still the initial load.
        let kind = if self.buffer.is_empty() && self.next_offset == 0 {
            FetchKind::Initial
        } else {
            FetchKind::More
        };
        let request = self.issue(kind);
        tracing::debug!(collection = self.name, offset = request.offset, ?kind, "requesting next page");
        Some(request)
    }

    /// Releases `request` when its outcome will never be applied, e.g. because
    /// the future awaiting it was dropped.
    ///
    /// Only clears the in-flight mark when it still belongs to `request`, so a
    /// newer request issued in the meantime is left alone. Buffer, offset and
    /// exhausted state are untouched; the same offset is requested again by the
    /// next fetch.
    ///
    /// Returns whether the mark was cleared.
    pub fn abandon(&mut self, request: &FetchRequest<T::Field>) -> bool {
        let owned = self
            .in_flight
            .is_some_and(|f| f.generation == request.generation && f.offset == request.offset);
        if owned {
            self.in_flight = None;
            tracing::debug!(
                collection = self.name,
                generation = request.generation,
                offset = request.offset,
                "fetch abandoned before its result arrived"
            );
        }
        owned
    }

    /// `current_page >= total_pages - threshold`, with nothing in flight and more
    /// data upstream.
    #[must_use]
    pub fn should_prefetch(&self) -> bool {
        if self.range.is_none() || self.exhausted || self.in_flight.is_some() {
            return false;
        }
        self.current_page >= self.total_pages().saturating_sub(self.config.prefetch_threshold_pages)
    }

    /// Issues a prefetch request when [`should_prefetch`](Self::should_prefetch) holds.
    pub fn maybe_prefetch(&mut self) -> Option<FetchRequest<T::Field>> {
        if self.should_prefetch() {
            self.fetch_next()
        } else {
            None
        }
    }

    /// Hands the outcome of `request` back to the cache.
    ///
    /// Stale results (older generation) are dropped. A failure is logged, leaves
    /// the buffer and the exhausted flag untouched and issues nothing, so the same
    /// offset is retried on the next criteria, page or buffer change. A page
    /// shorter than requested marks the backend exhausted. New records are
    /// appended in backend order; ids already buffered are skipped.
    ///
    /// # Returns
    ///
    /// The next prefetch request, if the refreshed view still needs one.
    pub fn apply_page(
        &mut self,
        request: &FetchRequest<T::Field>,
        outcome: Result<Vec<T>>,
    ) -> Option<FetchRequest<T::Field>> {
        let _span = tracing::debug_span!(
            "cache_apply_page",
            collection = self.name,
            generation = request.generation,
            offset = request.offset
        )
        .entered();

        if request.generation != self.generation {
            tracing::debug!(current = self.generation, "discarding page from stale generation");
            return None;
        }
        if self
            .in_flight
            .is_some_and(|f| f.generation == request.generation && f.offset == request.offset)
        {
            self.in_flight = None;
        }

        let records = match outcome {
            Ok(records) => records,
            Err(error) => {
                tracing::warn!(collection = self.name, %error, "fetch failed, serving buffered records");
                self.last_error = Some(error.to_string());
                return None;
            }
        };
        self.last_error = None;

        let received = records.len();
        if received < request.limit {
            self.exhausted = true;
        }
        if received > 0 {
            self.next_offset = request.offset + request.limit;
        }

        let mut appended = 0usize;
        for record in records {
            if self.ids.insert(record.id().to_string()) {
                self.buffer.push(record);
                appended += 1;
            }
        }

        tracing::debug!(
            received,
            appended,
            buffered = self.buffer.len(),
            exhausted = self.exhausted,
            "page applied"
        );

        self.rederive();
        self.maybe_prefetch()
    }

    /// Merges externally recalculated records into the buffer.
    ///
    /// Buffered records absorb their update in place; unknown ids are appended.
    /// Offset and exhausted state are unchanged.
    pub fn update_records(&mut self, updates: Vec<T>) -> Option<FetchRequest<T::Field>> {
        let mut merged = 0usize;
        let mut appended = 0usize;
        for update in updates {
            if self.ids.contains(update.id()) {
                if let Some(existing) = self.buffer.iter_mut().find(|r| r.id() == update.id()) {
                    existing.absorb(update);
                    merged += 1;
                }
            } else {
                self.ids.insert(update.id().to_string());
                self.buffer.push(update);
                appended += 1;
            }
        }
        tracing::debug!(collection = self.name, merged, appended, "records updated");

        self.rederive();
        self.maybe_prefetch()
    }

    /// One page of the filtered view.
    ///
    /// # Errors
    ///
    /// Returns [`NewsrankError::InvalidPage`] when `page` is outside
    /// `1..=total_pages`; page 1 of an empty view is an empty slice.
    pub fn get_page(&self, page: usize) -> Result<PageSlice<T>> {
        let indices = pipeline::paginate(&self.view, page, self.config.items_per_page)?;
        Ok(PageSlice {
            records: indices.iter().map(|&i| self.buffer[i].clone()).collect(),
            page,
            total_pages: self.total_pages(),
            total_count: self.view.len(),
        })
    }

    /// Snapshot of the current page plus counters and loading flags.
    #[must_use]
    pub fn view(&self) -> PageView<T> {
        let records = self.get_page(self.current_page).map(|p| p.records).unwrap_or_default();
        PageView {
            records,
            current_page: self.current_page,
            total_pages: self.total_pages(),
            total_count: self.view.len(),
            buffered_count: self.buffer.len(),
            is_loading: self.in_flight.is_some_and(|f| f.kind == FetchKind::Initial),
            is_loading_more: self.in_flight.is_some_and(|f| f.kind == FetchKind::More),
            has_more: !self.exhausted,
            sort: self.criteria.sort,
            last_error: self.last_error.clone(),
        }
    }

    /// The whole filtered view in display order.
    #[must_use]
    pub fn visible(&self) -> Vec<T> {
        self.view.iter().map(|&i| self.buffer[i].clone()).collect()
    }

    fn rederive(&mut self) {
        self.view = derive_view(&self.buffer, &self.criteria);
        let total_pages = self.total_pages();
        self.current_page = self.current_page.clamp(1, total_pages.max(1));
    }
}
