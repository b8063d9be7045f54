//! PagedDataProvider Trait
//!
//! Abstraction a virtualized grid renders from: rows come from a cache that
//! is filled lazily as ranges are requested.

use crate::error::Result;
use std::ops::RangeInclusive;

/// Paged data provider for lazy loading
pub trait PagedDataProvider: Send + Sync + 'static {
    type Row: Clone + Send + Sync + 'static;

    /// Get the total number of rows (may be estimated)
    fn len(&self) -> usize;

    /// Check if empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a cached row by index (returns None if not yet loaded)
    fn cached_row(&self, index: usize) -> Option<Self::Row>;

    /// Request a range of rows to be loaded
    fn request_range(&self, range: RangeInclusive<usize>) -> Result<()>;

    /// Check if a range is loaded
    fn is_range_loaded(&self, range: RangeInclusive<usize>) -> bool;

    /// Get the cached rows of a range, `None` for rows not loaded yet
    fn rows(&self, range: RangeInclusive<usize>) -> Vec<Option<Self::Row>> {
        range.map(|index| self.cached_row(index)).collect()
    }
}
