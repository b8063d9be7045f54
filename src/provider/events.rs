//! Range Events
//!
//! Loading notifications emitted by the provider, fanned out to any number of
//! subscribers (grid, statistics recomputation, ...).

use crate::error::Error;
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;

/// A requested row range, inclusive on both ends, as passed by the caller
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RowRange {
    pub from: i64,
    pub to: i64,
}

impl RowRange {
    pub fn new(from: i64, to: i64) -> Self {
        Self { from, to }
    }
}

impl std::fmt::Display for RowRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.from, self.to)
    }
}

/// Cloneable summary of a failed fetch
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchFailure {
    /// Superseded or explicitly cancelled; consumers usually ignore it
    Cancelled { reason: Arc<str> },
    /// Any other failure
    Backend { message: Arc<str> },
}

impl FetchFailure {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchFailure::Cancelled { .. })
    }
}

impl From<&Error> for FetchFailure {
    fn from(error: &Error) -> Self {
        match error {
            Error::Cancelled { reason } => FetchFailure::Cancelled {
                reason: reason.as_str().into(),
            },
            other => FetchFailure::Backend {
                message: other.to_string().into(),
            },
        }
    }
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchFailure::Cancelled { reason } => write!(f, "cancelled: {reason}"),
            FetchFailure::Backend { message } => write!(f, "{message}"),
        }
    }
}

/// Events emitted by the provider
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RangeEvent {
    /// A fetch covering this range was scheduled
    Loading { range: RowRange },
    /// Every row of this range is now available
    Loaded { range: RowRange },
    /// The fetch for this range failed; the cache is unchanged
    LoadingError { range: RowRange, error: FetchFailure },
}

impl RangeEvent {
    /// The range this event refers to
    pub fn range(&self) -> RowRange {
        match self {
            RangeEvent::Loading { range }
            | RangeEvent::Loaded { range }
            | RangeEvent::LoadingError { range, .. } => *range,
        }
    }
}

/// Fan-out of range events to channel subscribers
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<RangeEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber
    pub fn subscribe(&mut self) -> Receiver<RangeEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver an event to every subscriber, dropping disconnected ones
    pub fn emit(&mut self, event: RangeEvent) {
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_fans_out_in_order() {
        let mut bus = EventBus::new();
        let grid = bus.subscribe();
        let stats = bus.subscribe();

        let range = RowRange::new(0, 9);
        bus.emit(RangeEvent::Loading { range });
        bus.emit(RangeEvent::Loaded { range });

        for rx in [grid, stats] {
            let events: Vec<_> = rx.try_iter().collect();
            assert_eq!(
                events,
                vec![RangeEvent::Loading { range }, RangeEvent::Loaded { range }]
            );
        }
    }

    #[test]
    fn test_disconnected_subscriber_is_dropped() {
        let mut bus = EventBus::new();
        let rx = bus.subscribe();
        drop(bus.subscribe());

        bus.emit(RangeEvent::Loaded {
            range: RowRange::new(1, 2),
        });
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn test_failure_from_error() {
        let cancelled = FetchFailure::from(&Error::Cancelled {
            reason: "superseded".to_string(),
        });
        assert!(cancelled.is_cancelled());

        let backend = FetchFailure::from(&Error::Backend {
            message: "HTTP 503".to_string(),
        });
        assert_eq!(
            backend,
            FetchFailure::Backend {
                message: "Backend error: HTTP 503".into()
            }
        );
    }
}
