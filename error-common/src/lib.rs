//! Common error handling utilities for Tibb Engine
//!
//! This module provides the shared error taxonomy used across all Tibb Engine
//! crates, together with stable error codes for transport adapters. Every
//! subsystem keeps its own `thiserror` enum and lowers into [`TibbError`] at
//! the crate boundary, so callers see one surface regardless of which
//! component failed.

pub mod codes;
pub mod types;

pub use types::*;
