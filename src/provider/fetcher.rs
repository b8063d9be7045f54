//! Record Fetchers
//!
//! The [`RecordFetcher`] trait is how the provider reaches the backend. Any
//! `Fn(from, to, signal) -> Future<Output = Result<RowBatch<R>>>` closure is a
//! fetcher; [`MemoryFetcher`] serves rows from a shared vector.

use crate::error::{Error, Result};
use crate::provider::CancellationSignal;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;

/// Rows returned for a fetched sub-range
#[derive(Clone, Debug, PartialEq)]
pub struct RowBatch<R> {
    /// Records in index order, starting at the requested `from`
    pub records: Vec<R>,
    /// Total row count reported by the backend, if known
    pub total: Option<usize>,
}

impl<R> RowBatch<R> {
    pub fn new(records: Vec<R>) -> Self {
        Self {
            records,
            total: None,
        }
    }

    /// Attach the backend's total row count
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }
}

impl<R> From<Vec<R>> for RowBatch<R> {
    fn from(records: Vec<R>) -> Self {
        Self::new(records)
    }
}

/// Source of records for an inclusive row range
pub trait RecordFetcher<R>: Send + Sync + 'static {
    /// Fetch rows `[from, to]`.
    ///
    /// Implementations should stop work and return [`Error::Cancelled`] once
    /// `signal` is cancelled.
    fn fetch(
        &self,
        from: usize,
        to: usize,
        signal: CancellationSignal,
    ) -> BoxFuture<'static, Result<RowBatch<R>>>;
}

impl<R, F, Fut> RecordFetcher<R> for F
where
    F: Fn(usize, usize, CancellationSignal) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<RowBatch<R>>> + Send + 'static,
{
    fn fetch(
        &self,
        from: usize,
        to: usize,
        signal: CancellationSignal,
    ) -> BoxFuture<'static, Result<RowBatch<R>>> {
        (self)(from, to, signal).boxed()
    }
}

/// Fetcher serving rows from an in-memory vector
pub struct MemoryFetcher<R> {
    rows: Arc<Vec<R>>,
}

impl<R: Clone + Send + Sync + 'static> MemoryFetcher<R> {
    /// Create a new MemoryFetcher
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            rows: Arc::new(rows),
        }
    }

    /// Create from a shared reference
    pub fn from_arc(rows: Arc<Vec<R>>) -> Self {
        Self { rows }
    }

    fn slice(&self, from: usize, to: usize) -> RowBatch<R> {
        let total = self.rows.len();
        let end = to.saturating_add(1).min(total);
        let records = if from < end {
            self.rows[from..end].to_vec()
        } else {
            Vec::new()
        };
        RowBatch::new(records).with_total(total)
    }
}

impl<R: Clone + Send + Sync + 'static> RecordFetcher<R> for MemoryFetcher<R> {
    fn fetch(
        &self,
        from: usize,
        to: usize,
        signal: CancellationSignal,
    ) -> BoxFuture<'static, Result<RowBatch<R>>> {
        let result = match signal.reason() {
            Some(reason) => Err(Error::cancelled(reason.as_ref())),
            None => Ok(self.slice(from, to)),
        };
        futures::future::ready(result).boxed()
    }
}
