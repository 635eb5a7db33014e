use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate feedback event: {0}")]
    DuplicateEvent(String),

    /// Extraction failed but the diagnosis was persisted degraded; the
    /// caller may retry just the extraction against `diagnosis_id`
    #[error("Analyzer unavailable (diagnosis {diagnosis_id} persisted degraded): {reason}")]
    AnalyzerUnavailable { diagnosis_id: Uuid, reason: String },

    #[error("Empty knowledge base: {0}")]
    EmptyKnowledge(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

impl From<CoordinatorError> for error_common::TibbError {
    fn from(err: CoordinatorError) -> Self {
        match err {
            CoordinatorError::InvalidInput(msg) => error_common::TibbError::InvalidInput(msg),
            CoordinatorError::NotFound(msg) => error_common::TibbError::NotFound(msg),
            CoordinatorError::DuplicateEvent(msg) => error_common::TibbError::DuplicateEvent(msg),
            CoordinatorError::AnalyzerUnavailable { diagnosis_id, reason } => {
                error_common::TibbError::AnalyzerUnavailable(format!(
                    "{reason} (diagnosis {diagnosis_id})"
                ))
            }
            CoordinatorError::EmptyKnowledge(msg) => error_common::TibbError::EmptyKnowledge(msg),
            CoordinatorError::Database(msg) => error_common::TibbError::Database(msg),
            CoordinatorError::Config(msg) => error_common::TibbError::Config(msg),
            CoordinatorError::Internal(msg) => error_common::TibbError::Internal(msg),
        }
    }
}

impl From<sqlx::Error> for CoordinatorError {
    fn from(err: sqlx::Error) -> Self {
        CoordinatorError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for CoordinatorError {
    fn from(err: serde_json::Error) -> Self {
        CoordinatorError::Internal(format!("serialization: {err}"))
    }
}

impl From<matching_engine::MatchingError> for CoordinatorError {
    fn from(err: matching_engine::MatchingError) -> Self {
        CoordinatorError::EmptyKnowledge(err.to_string())
    }
}

impl From<recommendation_service::RecommendationError> for CoordinatorError {
    fn from(err: recommendation_service::RecommendationError) -> Self {
        CoordinatorError::NotFound(err.to_string())
    }
}

impl From<feedback_analytics::FeedbackError> for CoordinatorError {
    fn from(err: feedback_analytics::FeedbackError) -> Self {
        use feedback_analytics::FeedbackError;
        match err {
            FeedbackError::DuplicateEvent(msg) => CoordinatorError::DuplicateEvent(msg),
            FeedbackError::InvalidRating(msg) | FeedbackError::InvalidScope(msg) => {
                CoordinatorError::InvalidInput(msg)
            }
            FeedbackError::Database(e) => CoordinatorError::Database(e.to_string()),
            FeedbackError::Serialization(e) => {
                CoordinatorError::Internal(format!("serialization: {e}"))
            }
        }
    }
}
