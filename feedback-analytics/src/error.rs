use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedbackError {
    #[error("Duplicate feedback event: {0}")]
    DuplicateEvent(String),

    #[error("Invalid rating: {0}")]
    InvalidRating(String),

    #[error("Invalid scope id: {0}")]
    InvalidScope(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type FeedbackResult<T> = Result<T, FeedbackError>;

impl From<FeedbackError> for error_common::TibbError {
    fn from(err: FeedbackError) -> Self {
        match err {
            FeedbackError::DuplicateEvent(msg) => error_common::TibbError::DuplicateEvent(msg),
            FeedbackError::InvalidRating(msg) | FeedbackError::InvalidScope(msg) => {
                error_common::TibbError::InvalidInput(msg)
            }
            FeedbackError::Database(e) => error_common::TibbError::Database(e.to_string()),
            FeedbackError::Serialization(e) => {
                error_common::TibbError::Serialization(e.to_string())
            }
        }
    }
}
