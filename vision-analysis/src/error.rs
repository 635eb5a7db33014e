use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Vision provider disabled by configuration")]
    Disabled,

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider server error: {0}")]
    ServerError(String),

    #[error("Provider timed out: {0}")]
    Timeout(String),

    #[error("Unparseable provider response: {0}")]
    Unparseable(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VisionError {
    /// Upstream timeouts and vendor 5xx responses get one retry
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VisionError::Timeout(_) | VisionError::ServerError(_) | VisionError::Network(_)
        )
    }
}

pub type VisionResult<T> = Result<T, VisionError>;

impl From<VisionError> for error_common::TibbError {
    fn from(err: VisionError) -> Self {
        match err {
            VisionError::InvalidInput(msg) => error_common::TibbError::InvalidInput(msg),
            VisionError::Serialization(e) => error_common::TibbError::Serialization(e.to_string()),
            other => error_common::TibbError::AnalyzerUnavailable(other.to_string()),
        }
    }
}
