//! Read-only knowledge base access for Tibb Engine
//!
//! Holds the three tradition schemas (Avicennan diseases and treatments, TCM
//! patterns, Ayurvedic diseases) in per-tradition in-memory indexes built
//! eagerly at startup. Nothing mutates the store at runtime, so reads take
//! no locks. Seed documents arrive as JSON; producing them is the seed
//! loader's problem, not ours.

pub mod error;
pub mod records;
pub mod seed;
pub mod store;

pub use error::*;
pub use records::*;
pub use store::*;
