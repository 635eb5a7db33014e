//! Vision analysis adapter for Tibb Engine
//!
//! Wraps an external vision model behind the narrow [`VisionAnalyzer`] trait
//! and turns its free-form JSON into typed, closed-domain finding bags. The
//! contract with providers is deliberately loose: the response must parse as
//! JSON, unknown fields are ignored, and any attribute value outside its
//! kind's enumerated domain is lowered to absent rather than rejected. The
//! model's free-text suggestions survive only as advisory notes; they never
//! enter the matching pipeline.

pub mod config;
pub mod error;
pub mod extractor;
pub mod providers;
pub mod schema;

pub use config::*;
pub use error::*;
pub use extractor::*;
pub use providers::{create_provider, VisionAnalyzer};
