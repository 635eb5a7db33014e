//! Coordinator service for Tibb Engine
//!
//! Orchestrates the two end-to-end flows over explicitly injected
//! collaborators: the analysis flow (extract, match, compose, rank,
//! persist, publish) and the feedback flow (append, invalidate, recompute,
//! re-rank, publish). Persistence always precedes publication, and a failed
//! publish never rolls back a completed write. The request API exposed here
//! is transport-neutral; HTTP adapters live with the host.

pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod pool;
pub mod repository;
pub mod service;

pub use config::*;
pub use context::*;
pub use error::*;
pub use models::*;
pub use pool::*;
pub use repository::*;
pub use service::*;
