//! Real-time broadcast fabric for Tibb Engine
//!
//! A per-diagnosis topic bus. Subscribers get a bounded inbox with
//! drop-oldest backpressure; publishers fan out over a snapshot of the
//! roster so no lock is held during delivery. Topics with no subscribers
//! queue events into a bounded replay buffer that is flushed, once, to the
//! next subscriber. A failed delivery disconnects only that subscriber;
//! nothing here ever aborts the write that triggered the publish.

pub mod error;
pub mod events;
pub mod fabric;
pub mod inbox;

pub use error::*;
pub use events::*;
pub use fabric::*;
pub use inbox::*;
