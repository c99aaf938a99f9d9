//! Async execution of cache fetch requests.
//!
//! [`CollectionDriver`] wraps a [`PagedCollectionCache`] and a [`PageFetcher`].
//! Every operation locks the cache just long enough to mutate it, then executes
//! whatever request the cache returned, feeding the outcome back until the cache
//! stops asking. The lock is never held across a fetch, so a second operation
//! arriving mid-fetch sees the in-flight request and does not issue its own.
//!
//! Dropping an operation's future mid-fetch (a timeout, a `select!` branch that
//! lost) releases its request through [`PagedCollectionCache::abandon`], so the
//! next fetch for the same offset is issued normally.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::Instrument;

use crate::app::cache::{FetchRequest, PageSlice, PageView, PagedCollectionCache};
use crate::domain::{Article, DateRange, Keyword, Result};
use crate::pipeline::{Record, Region, SortField, ViewCriteria};
use crate::storage::{NewsStore, PageQuery};

/// Executes one backend page request for records of type `T`.
#[async_trait]
pub trait PageFetcher<T: Record>: Send + Sync {
    /// # Errors
    ///
    /// Returns the store error; the cache logs it and keeps its buffer.
    async fn fetch_page(&self, request: &FetchRequest<T::Field>) -> Result<Vec<T>>;
}

/// [`PageFetcher`] for articles and keywords backed by a [`NewsStore`].
#[derive(Clone)]
pub struct StorePages {
    store: Arc<dyn NewsStore>,
}

impl StorePages {
    #[must_use]
    pub fn new(store: Arc<dyn NewsStore>) -> Self {
        Self { store }
    }
}

impl std::fmt::Debug for StorePages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorePages").finish_non_exhaustive()
    }
}

fn page_query<F: SortField>(request: &FetchRequest<F>) -> PageQuery {
    PageQuery {
        range: request.range,
        order_by: request.sort.field.column(),
        direction: request.sort.direction,
        offset: request.offset,
        limit: request.limit,
    }
}

#[async_trait]
impl PageFetcher<Article> for StorePages {
    async fn fetch_page(&self, request: &FetchRequest<<Article as Record>::Field>) -> Result<Vec<Article>> {
        self.store.fetch_articles(&page_query(request)).await
    }
}

#[async_trait]
impl PageFetcher<Keyword> for StorePages {
    async fn fetch_page(&self, request: &FetchRequest<<Keyword as Record>::Field>) -> Result<Vec<Keyword>> {
        self.store.fetch_keywords(&page_query(request)).await
    }
}

/// Abandons `request` on drop unless its outcome was handed to the cache.
struct PendingFetch<'a, T: Record> {
    cache: &'a Mutex<PagedCollectionCache<T>>,
    request: &'a FetchRequest<T::Field>,
    settled: bool,
}

impl<T: Record> Drop for PendingFetch<'_, T> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .abandon(self.request);
    }
}

/// Shared handle driving one paged collection.
pub struct CollectionDriver<T: Record> {
    cache: Mutex<PagedCollectionCache<T>>,
    fetcher: Arc<dyn PageFetcher<T>>,
}

impl<T: Record> std::fmt::Debug for CollectionDriver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionDriver").finish_non_exhaustive()
    }
}

impl<T: Record> CollectionDriver<T> {
    #[must_use]
    pub fn new(cache: PagedCollectionCache<T>, fetcher: Arc<dyn PageFetcher<T>>) -> Self {
        Self {
            cache: Mutex::new(cache),
            fetcher,
        }
    }

    /// The lock is only ever held for synchronous cache mutations.
    fn lock(&self) -> MutexGuard<'_, PagedCollectionCache<T>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Executes `first` and every follow-up request the cache issues.
    ///
    /// Returns the number of fetches performed.
    async fn drive(&self, first: Option<FetchRequest<T::Field>>) -> usize {
        let mut next = first;
        let mut fetches = 0usize;
        while let Some(request) = next {
            let collection = self.lock().name();
            let span = tracing::debug_span!(
                "fetch_page",
                collection,
                generation = request.generation,
                offset = request.offset,
                limit = request.limit,
                kind = ?request.kind
            );
            let mut pending = PendingFetch {
                cache: &self.cache,
                request: &request,
                settled: false,
            };
            let outcome = self.fetcher.fetch_page(&request).instrument(span).await;
            fetches += 1;
            pending.settled = true;
            drop(pending);
            next = self.lock().apply_page(&request, outcome);
        }
        fetches
    }

    async fn run<F>(&self, op: F) -> PageView<T>
    where
        F: FnOnce(&mut PagedCollectionCache<T>) -> Option<FetchRequest<T::Field>> + Send,
    {
        let request = op(&mut self.lock());
        self.drive(request).await;
        self.view().await
    }

    /// See [`PagedCollectionCache::set_criteria`].
    pub async fn set_criteria(&self, range: DateRange, view: ViewCriteria<T::Field>) -> PageView<T> {
        self.run(|cache| cache.set_criteria(range, view)).await
    }

    pub async fn set_date_range(&self, range: DateRange) -> PageView<T> {
        self.run(|cache| cache.set_date_range(range)).await
    }

    pub async fn set_search(&self, search: String) -> PageView<T> {
        self.run(|cache| cache.set_search(search)).await
    }

    pub async fn set_region(&self, region: Region) -> PageView<T> {
        self.run(|cache| cache.set_region(region)).await
    }

    pub async fn set_sort(&self, field: T::Field) -> PageView<T> {
        self.run(|cache| cache.set_sort(field)).await
    }

    /// See [`PagedCollectionCache::set_current_page`].
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPage`](crate::NewsrankError::InvalidPage) for pages outside the view.
    pub async fn set_current_page(&self, page: usize) -> Result<PageView<T>> {
        let request = self.lock().set_current_page(page)?;
        self.drive(request).await;
        Ok(self.view().await)
    }

    /// Fetches one more backend page unless exhausted or already fetching.
    ///
    /// Returns the number of fetches this call performed; `0` when it was dropped.
    pub async fn fetch_next(&self) -> usize {
        let request = self.lock().fetch_next();
        self.drive(request).await
    }

    pub async fn update_records(&self, updates: Vec<T>) -> PageView<T> {
        self.run(|cache| cache.update_records(updates)).await
    }

    /// Clears the buffer and refetches the current range.
    pub async fn reset(&self) -> PageView<T> {
        self.run(PagedCollectionCache::reset).await
    }

    pub async fn view(&self) -> PageView<T> {
        self.lock().view()
    }

    /// # Errors
    ///
    /// Returns [`InvalidPage`](crate::NewsrankError::InvalidPage) for pages outside the view.
    pub async fn get_page(&self, page: usize) -> Result<PageSlice<T>> {
        self.lock().get_page(page)
    }

    /// Runs `f` against the cache under the lock.
    pub async fn inspect<R>(&self, f: impl FnOnce(&PagedCollectionCache<T>) -> R) -> R {
        f(&self.lock())
    }
}
