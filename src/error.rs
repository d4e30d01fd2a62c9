use crate::encoding::EncodingError;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the responder pipeline.
///
/// External-service variants are never retried in-process; the caller
/// decides what to do with a failed invocation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Inference error: {0}")]
    Inference(String),
    #[error("Malformed prediction: {0}")]
    MalformedPrediction(String),
    #[error("Delivery error: {0}")]
    Delivery(String),
    #[error("Notebook control error: {0}")]
    Notebook(String),
    #[error("Invalid storage event: {0}")]
    Event(String),
    #[error("Unusable email: {0}")]
    Message(String),
}

impl Error {
    /// True for failures that originate in an external collaborator.
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            Error::Storage(_) | Error::Inference(_) | Error::Delivery(_) | Error::Notebook(_)
        )
    }
}
