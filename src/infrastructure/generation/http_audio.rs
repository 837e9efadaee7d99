use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::ports::{AudioClient, AudioSubmission, SubmitError};

/// Submission client for the asynchronous audio-generation service.
/// The service accepts a request, returns a task id, and later calls
/// the callback address embedded in the submission.
pub struct HttpAudioClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpAudioClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, SubmitError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SubmitError::Connection(format!("client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/v1/generate", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest<'a> {
    title: &'a str,
    style: &'a str,
    prompt: &'a str,
    call_back_url: &'a str,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct SubmitResponse {
    task_id: Option<String>,
    data: Option<SubmitResponseData>,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct SubmitResponseData {
    task_id: Option<String>,
}

#[async_trait]
impl AudioClient for HttpAudioClient {
    async fn submit(&self, submission: AudioSubmission) -> Result<String, SubmitError> {
        let body = SubmitRequest {
            title: &submission.title,
            style: &submission.style,
            prompt: &submission.prompt,
            call_back_url: &submission.callback_url,
        };

        tracing::debug!(endpoint = %self.endpoint, title = %submission.title, "Submitting audio request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SubmitError::Timeout
                } else if e.is_connect() {
                    SubmitError::Connection(e.to_string())
                } else {
                    SubmitError::Connection(format!("request: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            // Overload and server-side faults are retryable; anything
            // else is a rejection of this request.
            return if status.is_server_error() || status.as_u16() == 429 {
                Err(SubmitError::Unavailable(format!("status {}: {}", status, body)))
            } else {
                Err(SubmitError::Rejected(format!("status {}: {}", status, body)))
            };
        }

        let parsed: SubmitResponse = response
            .json()
            .await
            .map_err(|e| SubmitError::InvalidResponse(format!("parse response: {}", e)))?;

        let task_id = parsed
            .data
            .and_then(|d| d.task_id)
            .or(parsed.task_id)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                SubmitError::InvalidResponse("acceptance without task id".to_string())
            })?;

        tracing::info!(task_ref = %task_id, "Audio request accepted");
        Ok(task_id)
    }
}
