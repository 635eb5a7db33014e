use thiserror::Error;

#[derive(Error, Debug)]
pub enum BroadcastError {
    #[error("Subscriber inbox closed: {0}")]
    InboxClosed(String),

    #[error("Delivery timed out: {0}")]
    SendTimeout(String),
}

pub type BroadcastResult<T> = Result<T, BroadcastError>;

impl From<BroadcastError> for error_common::TibbError {
    fn from(err: BroadcastError) -> Self {
        error_common::TibbError::TransientBroadcast(err.to_string())
    }
}
