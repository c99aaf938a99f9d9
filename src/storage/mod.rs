//! Storage layer for articles, keywords, ratings and competitor data.
//!
//! # Modules
//!
//! - `backend`: The [`NewsStore`] trait injected into the ranking core
//! - `models`: Row types mirroring the relational schema, and the dataset file format
//! - `dataset`: In-memory dataset plus the queries local stores answer from it
//! - `memory`: Lock-guarded in-process store, used as the test fake
//! - `json`: Dataset file store with atomic writes

pub mod backend;
pub mod dataset;
pub mod json;
pub mod memory;
pub mod models;

pub use backend::{NewsStore, PageQuery};
pub use dataset::Dataset;
pub use json::JsonStore;
pub use memory::MemoryStore;
pub use models::{ArticleRow, DatasetFile, KeywordRow, KeywordScoresRow, RatingRow, DATASET_VERSION};
