//! HTTP backend for OpenAI-compatible Chat Completions endpoints.
//!
//! Retries transport failures, 5xx and 429 with exponential backoff. A 429 that
//! outlives the retry budget, or whose `Retry-After` hint exceeds
//! `MAX_RETRY_AFTER`, surfaces as `RateLimited` with that hint. Schema problems
//! are never seen here; they are decoded one layer up in `LlmClient`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{ChatBackend, ChatCompletion, ChatRequest, LlmError, Usage};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Longest `Retry-After` hint the backend will sleep through before retrying.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Chat Completions client with retry and a per-call timeout.
#[derive(Clone)]
pub struct OpenAiBackend {
    client: Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
    max_retries: u32,
}

impl OpenAiBackend {
    pub fn new(
        base_url: &str,
        api_key: String,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            timeout,
            max_retries,
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Transport(format!(
                "request timed out after {}s",
                self.timeout.as_secs()
            ))
        } else {
            LlmError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, LlmError> {
        let mut last_error: Option<LlmError> = None;
        let mut retry_after: Option<Duration> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = retry_after.unwrap_or_else(|| backoff_delay(attempt));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(request)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(self.transport_error(e));
                    retry_after = None;
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 {
                retry_after = parse_retry_after(response.headers());
                warn!(retry_after = ?retry_after, "LLM API rate limited the request");
                if retry_after.is_some_and(|d| d > MAX_RETRY_AFTER) {
                    return Err(LlmError::RateLimited { retry_after });
                }
                last_error = Some(LlmError::RateLimited { retry_after });
                continue;
            }

            if status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                retry_after = None;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: api_error_message(body),
                });
            }

            let completion: CompletionResponse = response
                .json()
                .await
                .map_err(|e| self.transport_error(e))?;

            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                completion.usage.prompt_tokens, completion.usage.completion_tokens
            );

            let message = completion
                .choices
                .into_iter()
                .next()
                .map(|c| c.message)
                .ok_or(LlmError::EmptyContent)?;

            return Ok(ChatCompletion {
                content: message.content,
                refusal: message.refusal,
                usage: completion.usage,
            });
        }

        Err(last_error.unwrap_or(LlmError::RateLimited { retry_after }))
    }
}

/// Exponential backoff: 1s, 2s, 4s, ...
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(1000 * (1u64 << (attempt.saturating_sub(1)).min(6)))
}

/// Reads a delta-seconds `Retry-After` header. HTTP-date values are ignored.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn api_error_message(body: String) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}
