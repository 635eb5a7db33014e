//! Treatment recommendation composition and ranking for Tibb Engine
//!
//! The composer turns top matches into a tradition-grouped treatment plan,
//! deduplicated and filtered against the patient's contraindications. The
//! ranker then orders candidate plans for a specific patient by combining
//! the matching prior, accumulated effectiveness, and outcome history of
//! similar patients. A contraindicated plan is removed outright, never
//! merely demoted.

pub mod composer;
pub mod error;
pub mod models;
pub mod ranker;
pub mod similarity;

pub use composer::*;
pub use error::*;
pub use models::*;
pub use ranker::*;
