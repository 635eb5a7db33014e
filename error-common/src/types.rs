use thiserror::Error;

/// Shared error taxonomy for Tibb Engine subsystems
#[derive(Error, Debug)]
pub enum TibbError {
    /// Input violates declared constraints (bad image, unknown kind, out-of-range rating)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Addressed entity absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Idempotency collision on feedback submission
    #[error("Duplicate event: {0}")]
    DuplicateEvent(String),

    /// Vision provider disabled or retries exhausted
    #[error("Analyzer unavailable: {0}")]
    AnalyzerUnavailable(String),

    /// Knowledge store has no records for a tradition; hard configuration error
    #[error("Empty knowledge base: {0}")]
    EmptyKnowledge(String),

    /// A subscriber send failed; recovered locally, never surfaced to callers
    #[error("Transient broadcast failure: {0}")]
    TransientBroadcast(String),

    /// Database operation errors
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal system errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TibbError {
    /// Stable string code for transport adapters
    pub fn code(&self) -> &'static str {
        use crate::codes;
        match self {
            TibbError::InvalidInput(_) => codes::validation::INVALID_INPUT,
            TibbError::NotFound(_) => codes::lookup::NOT_FOUND,
            TibbError::DuplicateEvent(_) => codes::feedback::DUPLICATE_EVENT,
            TibbError::AnalyzerUnavailable(_) => codes::vision::ANALYZER_UNAVAILABLE,
            TibbError::EmptyKnowledge(_) => codes::knowledge::EMPTY_KNOWLEDGE,
            TibbError::TransientBroadcast(_) => codes::broadcast::TRANSIENT_FAILURE,
            TibbError::Database(_) => codes::database::QUERY_FAILED,
            TibbError::Serialization(_) => codes::validation::INVALID_FORMAT,
            TibbError::Config(_) => codes::system::CONFIG_INVALID,
            TibbError::Internal(_) | TibbError::Other(_) => codes::system::INTERNAL,
        }
    }

    /// Whether this error is caller-correctable rather than operational
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TibbError::InvalidInput(_) | TibbError::NotFound(_) | TibbError::DuplicateEvent(_)
        )
    }
}

/// Result type alias for Tibb Engine operations
pub type Result<T> = std::result::Result<T, TibbError>;

/// Async logging function for errors
///
/// `InvalidInput` is caller-correctable and is never logged at error level.
pub async fn log_error(context: &str, error: &TibbError) {
    if error.is_client_error() {
        tracing::debug!(
            context = context,
            code = error.code(),
            error = %error,
            "client error"
        );
    } else {
        tracing::error!(
            context = context,
            code = error.code(),
            error = %error,
            "Tibb Engine error occurred"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_per_variant() {
        assert_eq!(TibbError::InvalidInput("x".into()).code(), "VALIDATION_1001");
        assert_eq!(TibbError::NotFound("x".into()).code(), "LOOKUP_2001");
        assert_eq!(TibbError::DuplicateEvent("x".into()).code(), "FEEDBACK_5001");
        assert_eq!(
            TibbError::AnalyzerUnavailable("x".into()).code(),
            "VISION_3001"
        );
        assert_eq!(TibbError::EmptyKnowledge("x".into()).code(), "KNOWLEDGE_4001");
    }

    #[test]
    fn client_errors_are_distinguished() {
        assert!(TibbError::InvalidInput("x".into()).is_client_error());
        assert!(TibbError::DuplicateEvent("x".into()).is_client_error());
        assert!(!TibbError::Database("x".into()).is_client_error());
        assert!(!TibbError::TransientBroadcast("x".into()).is_client_error());
    }
}
