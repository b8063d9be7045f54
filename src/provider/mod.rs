//! Windowed Remote Record Provider
//!
//! Sits between a virtualized grid, which asks for rows by index range while
//! scrolling, and a backend able to serve any sub-range of a larger dataset.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    WindowedProvider                      │
//! │  ┌──────────────────┐ ┌────────────┐ ┌───────────────┐  │
//! │  │SparseRecordCache │ │  debounce  │ │ Cancellation  │  │
//! │  │ (rows + length)  │ │  (tokio)   │ │ Handle/Signal │  │
//! │  └──────────────────┘ └────────────┘ └───────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//!          │ RecordFetcher                 ▲ RangeEvent
//!          ▼                               │
//!     HTTP / memory backend          grid, statistics, ...
//! ```

mod cache;
mod cancel;
mod data_provider;
mod events;
mod fetcher;
mod windowed;

pub use cache::*;
pub use cancel::*;
pub use data_provider::*;
pub use events::*;
pub use fetcher::*;
pub use windowed::*;
