use async_trait::async_trait;

/// Synchronous text-generation service: one bounded-timeout round
/// trip per call. Failures are not retried in-process.
#[async_trait]
pub trait LyricsClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("timed out")]
    Timeout,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("empty response")]
    EmptyResponse,
}
