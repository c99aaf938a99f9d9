//! Error types for the newsrank core.
//!
//! This module defines the centralized error type [`NewsrankError`] and a type alias
//! [`Result`] used throughout the crate. Errors are derived with `thiserror`.
//!
//! # Propagation
//!
//! Storage failures never reach the steady-state pagination view as errors: the
//! collection cache logs them and serves the records it already holds. The only
//! user-facing failures are rating submission ([`NewsrankError::Persistence`]) and
//! its follow-up rescoring ([`NewsrankError::Recalculation`]).
//!
//! An article without keywords is not an error either. Its average score is
//! defined as `0.0` (see [`crate::scoring::article_average_score`]).

use thiserror::Error;

/// The main error type for newsrank operations.
#[derive(Debug, Error)]
pub enum NewsrankError {
    /// The backing store was unreachable or a query failed.
    ///
    /// Inside the collection cache this degrades to an empty page plus a log line.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A rating could not be saved.
    ///
    /// Blocks the recalculation step and must be shown to the user.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The rating was saved but rescoring the affected articles failed.
    ///
    /// Non-fatal; the displayed scores may be stale.
    #[error("Recalculation error: {0}")]
    Recalculation(String),

    /// The caller asked for a page outside `1..=total_pages`.
    ///
    /// Page 1 of an empty view is always valid.
    #[error("Invalid page {page}: view has {total_pages} page(s)")]
    InvalidPage {
        /// Requested 1-indexed page.
        page: usize,
        /// Pages available in the current filtered view.
        total_pages: usize,
    },

    /// A rating outside `1..=5` was submitted.
    #[error("Invalid rating {0}: expected a value between 1 and 5")]
    InvalidRating(i64),

    /// Local storage (dataset file, in-memory state) is corrupt or unusable.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl NewsrankError {
    /// Returns `true` for errors that must be surfaced to the user immediately.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::InvalidRating(_))
    }
}

/// A specialized `Result` type for newsrank operations.
pub type Result<T> = std::result::Result<T, NewsrankError>;
