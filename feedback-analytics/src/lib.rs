//! Feedback collection and effectiveness analytics for Tibb Engine
//!
//! Feedback events are immutable and append-only; everything else here is a
//! derivation. The analyzer aggregates events over a rolling window into
//! per-recommendation, per-condition and per-herb effectiveness snapshots,
//! caches them briefly, and recomputes on demand after appends invalidate a
//! scope. Recomputing the same window twice yields identical snapshots.

pub mod analyzer;
pub mod error;
pub mod events;
pub mod repository;
pub mod snapshot;

pub use analyzer::*;
pub use error::*;
pub use events::*;
pub use repository::*;
pub use snapshot::*;
