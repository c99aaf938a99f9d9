//! Application layer: paged collection caches and the dashboard built on them.
//!
//! This module sits between the front-end (main.rs) and the storage, pipeline
//! and scoring layers. State changes are synchronous and pure; I/O happens in
//! the drivers, which never hold a cache lock while a fetch is pending.
//!
//! # Architecture
//!
//! ```text
//! Event → Dashboard::handle_event → CollectionDriver → PagedCollectionCache
//!                                        │                     │
//!                                        │   FetchRequest ◄────┘
//!                                        ▼
//!                                   PageFetcher → NewsStore
//!                                        │
//!                                        └──── apply_page ────► cache
//! ```
//!
//! # Modules
//!
//! - [`cache`]: Buffer, fetch state machine and derived view of one collection
//! - [`driver`]: Executes fetch requests against a store
//! - [`dashboard`]: Both collections, rating submission, competitor views
//! - [`events`]: Events accepted by the dashboard and the notices it returns
//!
//! # Example
//!
//! ```rust
//! use newsrank::app::{Dashboard, Event};
//! use newsrank::storage::MemoryStore;
//! use newsrank::{Config, DateRange};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> newsrank::Result<()> {
//! let dashboard = Dashboard::new(Arc::new(MemoryStore::default()), &Config::default());
//! let notices = dashboard.handle_event(Event::SetDateRange(DateRange::today())).await?;
//! assert_eq!(notices.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod dashboard;
pub mod driver;
pub mod events;

pub use cache::{CacheConfig, FetchKind, FetchRequest, PageSlice, PageView, PagedCollectionCache};
pub use dashboard::Dashboard;
pub use driver::{CollectionDriver, PageFetcher, StorePages};
pub use events::{Collection, Event, Notice};
