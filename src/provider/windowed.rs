//! Windowed Remote Record Provider
//!
//! Keeps a sparse cache of rows fetched from a backend and makes sure the
//! range a grid is looking at gets loaded with as little traffic as possible.
//!
//! ## Flow
//!
//! ```text
//! ensure_range(from, to)
//!       │ trim cached prefix/suffix
//!       ├── nothing missing ──▶ Loaded
//!       ▼
//! cancel previous handle ──▶ Loading
//!       │ debounce (cancellable)
//!       ▼
//! fetcher.fetch(start, end, signal)
//!       │
//!       ├── Ok  ──▶ merge into cache ──▶ Loaded
//!       └── Err ──▶ LoadingError
//! ```
//!
//! At most one fetch is pending per provider. A newer request cancels the
//! previous handle before scheduling its own.

use crate::config::ProviderConfig;
use crate::constants::{REASON_CLEARED, REASON_SUPERSEDED, REASON_USER_CANCEL};
use crate::error::{Error, Result};
use crate::provider::{
    CancellationHandle, EventBus, FetchFailure, PagedDataProvider, RangeEvent, RecordFetcher,
    RowBatch, RowRange, SparseRecordCache,
};
use crate::services::runtime_handle;
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// The fetch currently owned by the provider
struct InFlight {
    generation: u64,
    handle: CancellationHandle,
}

struct ProviderState<R> {
    cache: SparseRecordCache<R>,
    events: EventBus,
    fetcher: Option<Arc<dyn RecordFetcher<R>>>,
    in_flight: Option<InFlight>,
    generation: u64,
}

impl<R> ProviderState<R> {
    fn cancel_in_flight(&mut self, reason: &str) -> bool {
        match self.in_flight.take() {
            Some(in_flight) => {
                debug!(generation = in_flight.generation, reason, "Cancelling pending fetch");
                in_flight.handle.cancel(reason)
            }
            None => false,
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.generation == generation)
    }
}

/// Provider of rows for a virtualized grid, backed by a remote fetcher
pub struct WindowedProvider<R> {
    state: Arc<Mutex<ProviderState<R>>>,
    config: ProviderConfig,
    runtime: Handle,
}

impl<R: Clone + Send + 'static> WindowedProvider<R> {
    /// Create a provider on the current tokio runtime, or the global one
    /// when called outside a runtime
    pub fn new(config: ProviderConfig) -> Self {
        let runtime = Handle::try_current().unwrap_or_else(|_| runtime_handle());
        Self::with_runtime(config, runtime)
    }

    /// Create a provider spawning its fetches on the given runtime
    pub fn with_runtime(config: ProviderConfig, runtime: Handle) -> Self {
        Self {
            state: Arc::new(Mutex::new(ProviderState {
                cache: SparseRecordCache::new(),
                events: EventBus::new(),
                fetcher: None,
                in_flight: None,
                generation: 0,
            })),
            config,
            runtime,
        }
    }

    /// Provider settings
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    // ==================== Configuration ====================

    /// Register the function used to fetch missing rows
    pub fn configure_fetcher(&self, fetcher: impl RecordFetcher<R>) {
        self.state.lock().fetcher = Some(Arc::new(fetcher));
    }

    /// Subscribe to loading notifications
    pub fn subscribe(&self) -> Receiver<RangeEvent> {
        self.state.lock().events.subscribe()
    }

    // ==================== Range Requests ====================

    /// Make sure rows `[from, to]` end up in the cache.
    ///
    /// Only fails when no fetcher is configured. Fetch outcomes are reported
    /// through [`RangeEvent`]s.
    pub fn ensure_range(&self, from: i64, to: i64) -> Result<()> {
        let range = RowRange::new(from, to);
        let mut state = self.state.lock();

        let Some(fetcher) = state.fetcher.clone() else {
            return Err(Error::Configuration {
                message: "ensure_range called before configure_fetcher".to_string(),
            });
        };

        let Some((start, end)) = state.cache.missing_range(from, to) else {
            debug!(%range, "Range already loaded");
            state.events.emit(RangeEvent::Loaded { range });
            return Ok(());
        };

        state.cancel_in_flight(REASON_SUPERSEDED);
        state.generation += 1;
        let generation = state.generation;
        let handle = CancellationHandle::new();
        let signal = handle.signal();
        state.in_flight = Some(InFlight { generation, handle });
        state.events.emit(RangeEvent::Loading { range });
        drop(state);

        debug!(%range, start, end, generation, "Scheduling fetch");

        let shared = self.state.clone();
        let debounce = self.config.debounce();
        let guard_stale = self.config.guard_stale_merges;
        self.runtime.spawn(async move {
            tokio::select! {
                biased;
                reason = signal.cancelled() => {
                    debug!(generation, %reason, "Fetch cancelled before start");
                    // A superseding request follows up with its own Loading
                    if &*reason != REASON_SUPERSEDED {
                        shared.lock().events.emit(RangeEvent::LoadingError {
                            range,
                            error: FetchFailure::Cancelled { reason },
                        });
                    }
                    return;
                }
                _ = tokio::time::sleep(debounce) => {}
            }

            let result = fetcher.fetch(start, end, signal).await;
            settle(&shared, generation, range, start, result, guard_stale);
        });

        Ok(())
    }

    /// Drop rows `[from, to]` and fetch them again
    pub fn reload_range(&self, from: i64, to: i64) -> Result<()> {
        if to >= 0 && to >= from {
            self.clear_part(from.max(0) as usize, to as usize);
        }
        self.ensure_range(from, to)
    }

    /// Cancel the pending fetch, if any
    pub fn cancel_pending(&self) -> bool {
        self.state.lock().cancel_in_flight(REASON_USER_CANCEL)
    }

    // ==================== Cache Access ====================

    /// Check that every row in `[from, to]` is cached
    pub fn is_range_loaded(&self, from: usize, to: usize) -> bool {
        self.state.lock().cache.is_range_loaded(from, to)
    }

    /// Get a cached row
    pub fn row(&self, index: usize) -> Option<R> {
        self.state.lock().cache.get(index).cloned()
    }

    /// Known total row count (0 when unknown)
    pub fn len(&self) -> usize {
        self.state.lock().cache.length()
    }

    /// Check if no rows are known
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Set the known total row count
    pub fn set_length(&self, length: usize) {
        self.state.lock().cache.set_length(length);
    }

    /// Whether a fetch is scheduled or running
    pub fn is_loading(&self) -> bool {
        self.state.lock().in_flight.is_some()
    }

    /// Empty the cache and forget the length.
    ///
    /// A fetch already in flight is left alone and its rows are merged into
    /// the emptied cache when they arrive, unless `guard_stale_merges` is set.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.cache.clear();
        if self.config.guard_stale_merges {
            state.cancel_in_flight(REASON_CLEARED);
        }
    }

    /// Drop rows `[from, to]`, keeping the length
    pub fn clear_part(&self, from: usize, to: usize) {
        self.state.lock().cache.clear_part(from, to);
    }
}

/// Apply a finished fetch to the shared state
fn settle<R>(
    shared: &Mutex<ProviderState<R>>,
    generation: u64,
    range: RowRange,
    start: usize,
    result: Result<RowBatch<R>>,
    guard_stale: bool,
) {
    let mut state = shared.lock();

    let current = state.is_current(generation);
    if current {
        if let Some(in_flight) = state.in_flight.take() {
            in_flight.handle.settle();
        }
    }

    match result {
        Ok(batch) => {
            if guard_stale && !current {
                debug!(%range, generation, "Dropping stale fetch result");
                return;
            }
            let count = batch.records.len();
            state.cache.merge(start, batch.records);
            if let Some(total) = batch.total {
                state.cache.grow_length(total);
            }
            debug!(%range, start, count, "Rows merged");
            state.events.emit(RangeEvent::Loaded { range });
        }
        Err(error) => {
            if error.is_cancelled() {
                debug!(%range, %error, "Fetch cancelled");
            } else {
                warn!(%range, %error, "Failed to load rows");
            }
            state.events.emit(RangeEvent::LoadingError {
                range,
                error: FetchFailure::from(&error),
            });
        }
    }
}

impl<R> Clone for WindowedProvider<R> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            config: self.config.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

impl<R> std::fmt::Debug for WindowedProvider<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("WindowedProvider")
            .field("length", &state.cache.length())
            .field("loaded", &state.cache.loaded_count())
            .field("loading", &state.in_flight.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl<R: Clone + Send + Sync + 'static> PagedDataProvider for WindowedProvider<R> {
    type Row = R;

    fn len(&self) -> usize {
        WindowedProvider::len(self)
    }

    fn cached_row(&self, index: usize) -> Option<R> {
        self.row(index)
    }

    fn request_range(&self, range: RangeInclusive<usize>) -> Result<()> {
        let from = i64::try_from(*range.start()).unwrap_or(i64::MAX);
        let to = i64::try_from(*range.end()).unwrap_or(i64::MAX);
        self.ensure_range(from, to)
    }

    fn is_range_loaded(&self, range: RangeInclusive<usize>) -> bool {
        WindowedProvider::is_range_loaded(self, *range.start(), *range.end())
    }
}
