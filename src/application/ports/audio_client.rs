use async_trait::async_trait;

/// Submission to the asynchronous audio-generation service. The
/// service answers the callback address later, out of band.
#[derive(Debug, Clone)]
pub struct AudioSubmission {
    pub title: String,
    pub style: String,
    /// Generated lyrics, passed through as the audio prompt.
    pub prompt: String,
    /// Address the service will call on completion; embeds the job id.
    pub callback_url: String,
}

#[async_trait]
pub trait AudioClient: Send + Sync {
    /// Submit a generation request. On acceptance returns the external
    /// task id assigned by the service.
    async fn submit(&self, submission: AudioSubmission) -> Result<String, SubmitError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl SubmitError {
    /// Transient failures make the job re-claimable; permanent ones
    /// fail it with a refund.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SubmitError::Timeout | SubmitError::Connection(_) | SubmitError::Unavailable(_)
        )
    }
}
