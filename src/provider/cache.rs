//! Sparse Record Cache
//!
//! Rows loaded so far, keyed by absolute row index, plus the known row count.
//! A missing key means "not loaded", never "does not exist".

use ahash::AHashMap;

/// Sparse mapping from row index to record
#[derive(Clone, Debug)]
pub struct SparseRecordCache<R> {
    rows: AHashMap<usize, R>,
    length: usize,
}

impl<R> SparseRecordCache<R> {
    /// Create an empty cache with unknown length
    pub fn new() -> Self {
        Self {
            rows: AHashMap::new(),
            length: 0,
        }
    }

    /// Known total row count (0 when unknown)
    pub fn length(&self) -> usize {
        self.length
    }

    /// Set the known total row count
    pub fn set_length(&mut self, length: usize) {
        self.length = length;
    }

    /// Raise the known row count, never lowering it
    pub fn grow_length(&mut self, length: usize) {
        self.length = self.length.max(length);
    }

    /// Number of cached rows
    pub fn loaded_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if a row is cached
    pub fn contains(&self, index: usize) -> bool {
        self.rows.contains_key(&index)
    }

    /// Get a cached row
    pub fn get(&self, index: usize) -> Option<&R> {
        self.rows.get(&index)
    }

    /// Check that every index in `[from, to]` is cached
    pub fn is_range_loaded(&self, from: usize, to: usize) -> bool {
        (from..=to).all(|index| self.rows.contains_key(&index))
    }

    /// Store records at consecutive indices starting at `start`
    pub fn merge(&mut self, start: usize, records: impl IntoIterator<Item = R>) {
        for (offset, record) in records.into_iter().enumerate() {
            self.rows.insert(start + offset, record);
        }
    }

    /// Drop every row and forget the length
    pub fn clear(&mut self) {
        self.rows.clear();
        self.length = 0;
    }

    /// Drop rows in `[from, to]`, keeping the length
    pub fn clear_part(&mut self, from: usize, to: usize) {
        if from > to {
            return;
        }
        // Walk whichever side is smaller
        if to - from < self.rows.len() {
            for index in from..=to {
                self.rows.remove(&index);
            }
        } else {
            self.rows.retain(|index, _| *index < from || *index > to);
        }
    }

    /// Compute the sub-range of `[from, to]` that still needs fetching.
    ///
    /// Returns `None` when every row of the clamped range is already cached.
    pub fn missing_range(&self, from: i64, to: i64) -> Option<(usize, usize)> {
        let start = from.max(0);
        let end = if self.length > 0 {
            to.min(self.length as i64 - 1)
        } else {
            to
        };
        if end < start {
            return None;
        }

        let mut start = start as usize;
        let mut end = end as usize;
        while start < end && self.contains(start) {
            start += 1;
        }
        while start < end && self.contains(end) {
            end -= 1;
        }

        if start == end && self.contains(start) {
            return None;
        }
        Some((start, end))
    }
}

impl<R> Default for SparseRecordCache<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_with(indices: &[usize], length: usize) -> SparseRecordCache<usize> {
        let mut cache = SparseRecordCache::new();
        for &index in indices {
            cache.merge(index, [index]);
        }
        cache.set_length(length);
        cache
    }

    #[test]
    fn test_missing_range_trims_prefix_and_suffix() {
        let cache = cache_with(&[0, 1, 2, 8, 9], 10);
        assert_eq!(cache.missing_range(0, 9), Some((3, 7)));
    }

    #[test]
    fn test_missing_range_fully_loaded() {
        let cache = cache_with(&[0, 1, 2, 3], 4);
        assert_eq!(cache.missing_range(0, 3), None);
        assert_eq!(cache.missing_range(2, 2), None);
    }

    #[test]
    fn test_missing_range_clamps() {
        let cache = cache_with(&[], 10);
        assert_eq!(cache.missing_range(-5, 50), Some((0, 9)));

        // Unknown length leaves `to` as-is
        let cache = cache_with(&[], 0);
        assert_eq!(cache.missing_range(-5, 50), Some((0, 50)));
        assert_eq!(cache.missing_range(3, -1), None);
    }

    #[test]
    fn test_missing_range_keeps_interior_holes() {
        // Only the edges are trimmed; cached rows inside are refetched
        let cache = cache_with(&[0, 4, 9], 10);
        assert_eq!(cache.missing_range(0, 9), Some((1, 8)));
    }

    #[test]
    fn test_merge_and_range_loaded() {
        let mut cache = SparseRecordCache::new();
        cache.merge(5, ["r5", "r6", "r7"]);
        assert!(cache.is_range_loaded(5, 7));
        assert!(!cache.is_range_loaded(4, 8));
        assert_eq!(cache.get(6), Some(&"r6"));
    }

    #[test]
    fn test_clear_part_keeps_length() {
        let mut cache = cache_with(&(0..10).collect::<Vec<_>>(), 100);
        cache.clear_part(2, 4);
        assert_eq!(cache.length(), 100);
        assert!(!cache.contains(2));
        assert!(!cache.contains(3));
        assert!(!cache.contains(4));
        assert!(cache.is_range_loaded(0, 1));
        assert!(cache.is_range_loaded(5, 9));

        // Wide range goes through retain
        cache.clear_part(6, 1_000_000);
        assert_eq!(cache.loaded_count(), 3);
    }

    #[test]
    fn test_clear_resets_length() {
        let mut cache = cache_with(&[1, 2], 10);
        cache.clear();
        assert_eq!(cache.length(), 0);
        assert_eq!(cache.loaded_count(), 0);
    }
}
