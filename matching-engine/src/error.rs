use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatchingError {
    #[error("No knowledge records loaded for tradition: {0}")]
    EmptyKnowledge(String),
}

pub type MatchingResult<T> = Result<T, MatchingError>;

impl From<MatchingError> for error_common::TibbError {
    fn from(err: MatchingError) -> Self {
        match err {
            MatchingError::EmptyKnowledge(msg) => error_common::TibbError::EmptyKnowledge(msg),
        }
    }
}
