//! Patient-data-safe logging for Tibb Engine
//!
//! Diagnostic flows handle patient identifiers and free-text feedback that
//! must never land in log files verbatim. This crate provides a regex-based
//! redactor for log text, hash-based correlation tokens so redacted values
//! can still be traced across log lines, and thin macros over `tracing`.
//!
//! # Detected data types
//!
//! - Email addresses
//! - Phone numbers
//! - National-id shapes (###-##-####)
//! - Medical record numbers (MRN...)
//! - Custom organization-specific patterns

pub mod config;
pub mod macros;
pub mod redactor;

pub use config::*;
pub use redactor::*;
