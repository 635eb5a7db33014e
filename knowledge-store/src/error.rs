use thiserror::Error;

#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate record id: {0}")]
    DuplicateRecord(String),

    #[error("Invalid seed document: {0}")]
    InvalidSeed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type KnowledgeResult<T> = Result<T, KnowledgeError>;

impl From<KnowledgeError> for error_common::TibbError {
    fn from(err: KnowledgeError) -> Self {
        match err {
            KnowledgeError::NotFound(msg) => error_common::TibbError::NotFound(msg),
            KnowledgeError::Serialization(e) => {
                error_common::TibbError::Serialization(e.to_string())
            }
            other => error_common::TibbError::Config(other.to_string()),
        }
    }
}
