//! Database connection management for Tibb Engine
//!
//! A thin layer over sqlx: pool construction with tuned options and a health
//! check. Schema migration and seed loading are external concerns; the
//! repositories in the service crates consume the pool this crate hands out.

pub mod connection;
pub mod error;

pub use connection::*;
pub use error::*;
