//! Diagnostic matching engine for Tibb Engine
//!
//! Scores an extracted finding bag against every record of each tradition
//! and returns the top matches with supporting evidence. Matching is a pure
//! function of the bag, the knowledge snapshot and the fixed weight tables;
//! the only external seam is a sample-size lookup used to break score ties
//! in favor of records with more feedback behind them.

pub mod adjacency;
pub mod engine;
pub mod error;
pub mod result;
pub mod weights;

pub use engine::*;
pub use error::*;
pub use result::*;
