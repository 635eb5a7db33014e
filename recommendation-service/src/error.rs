use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecommendationError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Empty match set; nothing to compose")]
    EmptyMatchSet,
}

pub type RecommendationResult<T> = Result<T, RecommendationError>;

impl From<RecommendationError> for error_common::TibbError {
    fn from(err: RecommendationError) -> Self {
        match err {
            RecommendationError::NotFound(msg) => error_common::TibbError::NotFound(msg),
            RecommendationError::EmptyMatchSet => {
                error_common::TibbError::NotFound("no matches to compose from".to_string())
            }
        }
    }
}
