use thiserror::Error;

/// Errors that end an analysis run.
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    /// Empty or unreadable transcript. Nothing was sent for classification.
    #[error("Invalid transcript: {0}")]
    Input(String),
    /// Transport failure talking to the classification service.
    #[error("Classification request failed: {0}")]
    Network(String),
    /// The classification service answered with something other than the expected JSON.
    #[error("Malformed classification response: {0}")]
    Decode(String),
    /// No usable credential or endpoint for the classification service.
    #[error("Classifier not configured: {0}")]
    Configuration(String),
    #[error("Transcription failed: {0}")]
    Transcription(String),
    #[error("Failed to hand off report: {0}")]
    Persistence(String),
    #[error("Analysis cancelled")]
    Cancelled,
}

impl AnalysisError {
    /// Whether this error, raised by one segment, aborts the whole dispatch batch.
    pub fn is_batch_abort(&self) -> bool {
        matches!(self, AnalysisError::Network(_) | AnalysisError::Decode(_))
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AnalysisError::Decode(err.to_string())
        } else {
            AnalysisError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::Decode(err.to_string())
    }
}
