/// LLM Gateway: the single point of entry for all language-model calls.
///
/// ARCHITECTURAL RULE: the analyzer, synthesizer and critic never talk to a model
/// service directly. They build an `LlmRequest` and go through `LlmClient`, which
/// owns decoding settings, structured decoding and usage accounting.
///
/// Structured calls are validated here, at the boundary: the reply is parsed,
/// checked against the declared JSON Schema and deserialized. Any failure is a
/// `LlmError::SchemaViolation`; callers never see a half-parsed value.
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

pub mod backend;
pub mod prompts;
#[cfg(test)]
pub mod testing;

pub use backend::OpenAiBackend;

/// Default model when neither `--model` nor `TAILOR_MODEL` is given.
pub const DEFAULT_MODEL: &str = "gpt-4o";
const MAX_TOKENS: u32 = 4000;
const LOG_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rate limited by model service{}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("response violated schema `{schema}`: {reason}")]
    SchemaViolation { schema: String, reason: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(" (retry after {}s)", d.as_secs()),
        None => String::new(),
    }
}

impl LlmError {
    fn schema(schema: &str, reason: impl Into<String>) -> Self {
        LlmError::SchemaViolation {
            schema: schema.to_string(),
            reason: reason.into(),
        }
    }
}

/// Sampling variability for a call.
///
/// Scoring and extraction use `Deterministic` so repeated calls on the same input
/// differ only by upstream model variance. Synthesis uses `Creative`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variability {
    Deterministic,
    Creative,
}

impl Variability {
    pub fn temperature(self) -> f32 {
        match self {
            Variability::Deterministic => 0.0,
            Variability::Creative => 0.7,
        }
    }
}

/// A named JSON Schema the reply must conform to.
#[derive(Debug, Clone)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: Value,
}

impl ResponseSchema {
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// One gateway request: a system + user message pair and its decoding settings.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Short label used in logs only.
    pub label: String,
    pub system: String,
    pub prompt: String,
    pub variability: Variability,
    pub schema: Option<ResponseSchema>,
}

impl LlmRequest {
    pub fn text(label: &str, system: &str, prompt: String, variability: Variability) -> Self {
        Self {
            label: label.to_string(),
            system: system.to_string(),
            prompt,
            variability,
            schema: None,
        }
    }

    pub fn structured(
        label: &str,
        system: &str,
        prompt: String,
        variability: Variability,
        schema: ResponseSchema,
    ) -> Self {
        Self {
            label: label.to_string(),
            system: system.to_string(),
            prompt,
            variability,
            schema: Some(schema),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types shared by all backends
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// The backend-facing request: what actually goes over the wire.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Value>,
}

/// Token counts reported by the model service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// A raw completion as returned by a backend, before any decoding.
#[derive(Debug, Clone, Default)]
pub struct ChatCompletion {
    pub content: Option<String>,
    pub refusal: Option<String>,
    pub usage: Usage,
}

/// Transport seam. `OpenAiBackend` talks HTTP; tests plug in a scripted backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct UsageMeter {
    calls: AtomicU32,
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
    total_tokens: AtomicU64,
}

/// Totals accumulated over every call made through one client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageTotals {
    pub calls: u32,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// The LLM client used by every component.
/// Cheap to clone; clones share the backend and the usage meter.
#[derive(Clone)]
pub struct LlmClient {
    backend: Arc<dyn ChatBackend>,
    model: String,
    meter: Arc<UsageMeter>,
}

impl LlmClient {
    pub fn new(backend: Arc<dyn ChatBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            meter: Arc::new(UsageMeter::default()),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn usage(&self) -> UsageTotals {
        UsageTotals {
            calls: self.meter.calls.load(Ordering::Relaxed),
            prompt_tokens: self.meter.prompt_tokens.load(Ordering::Relaxed),
            completion_tokens: self.meter.completion_tokens.load(Ordering::Relaxed),
            total_tokens: self.meter.total_tokens.load(Ordering::Relaxed),
        }
    }

    /// Sends a request and returns the reply text.
    ///
    /// If the request declares a schema, the text is guaranteed to be a JSON
    /// document conforming to it; otherwise it is unconstrained.
    pub async fn call(&self, request: &LlmRequest) -> Result<String, LlmError> {
        let text = self.complete(request).await?;
        if let Some(schema) = &request.schema {
            decode_structured(&text, schema)?;
        }
        Ok(text)
    }

    /// Sends a schema-constrained request and deserializes the validated reply.
    pub async fn call_json<T: DeserializeOwned>(&self, request: &LlmRequest) -> Result<T, LlmError> {
        let schema = request.schema.as_ref().ok_or_else(|| {
            LlmError::schema("<none>", "call_json requires a declared response schema")
        })?;
        let text = self.complete(request).await?;
        let value = decode_structured(&text, schema)?;
        serde_json::from_value(value).map_err(|e| LlmError::schema(&schema.name, e.to_string()))
    }

    async fn complete(&self, request: &LlmRequest) -> Result<String, LlmError> {
        let chat_request = self.build_chat_request(request);

        debug!(
            label = %request.label,
            "LLM request: {}",
            preview(&request.prompt, LOG_PREVIEW_CHARS)
        );

        let completion = self.backend.complete(&chat_request).await?;
        self.record_usage(&request.label, request.variability, &completion.usage);

        let text = match (completion.content, completion.refusal, &request.schema) {
            (Some(text), _, _) if !text.trim().is_empty() => text,
            (_, Some(refusal), Some(schema)) => {
                return Err(LlmError::schema(
                    &schema.name,
                    format!("model refused: {refusal}"),
                ))
            }
            _ => return Err(LlmError::EmptyContent),
        };

        debug!(
            label = %request.label,
            "LLM response: {}",
            preview(&text, LOG_PREVIEW_CHARS)
        );

        Ok(text)
    }

    fn build_chat_request(&self, request: &LlmRequest) -> ChatRequest {
        let response_format = request.schema.as_ref().map(|s| {
            serde_json::json!({
                "type": "json_schema",
                "json_schema": {
                    "name": s.name,
                    "strict": true,
                    "schema": s.schema,
                }
            })
        });

        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.prompt.clone(),
                },
            ],
            temperature: request.variability.temperature(),
            max_tokens: MAX_TOKENS,
            response_format,
        }
    }

    fn record_usage(&self, label: &str, variability: Variability, usage: &Usage) {
        self.meter.calls.fetch_add(1, Ordering::Relaxed);
        self.meter
            .prompt_tokens
            .fetch_add(usage.prompt_tokens, Ordering::Relaxed);
        self.meter
            .completion_tokens
            .fetch_add(usage.completion_tokens, Ordering::Relaxed);
        self.meter
            .total_tokens
            .fetch_add(usage.total_tokens, Ordering::Relaxed);

        info!(
            label,
            model = %self.model,
            temperature = variability.temperature(),
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            total_tokens = usage.total_tokens,
            "LLM call complete"
        );
    }
}

/// Parses `text` as JSON and validates it against `schema`.
pub fn decode_structured(text: &str, schema: &ResponseSchema) -> Result<Value, LlmError> {
    let text = strip_json_fences(text);
    let value: Value = serde_json::from_str(text)
        .map_err(|e| LlmError::schema(&schema.name, format!("invalid JSON: {e}")))?;

    let compiled = jsonschema::JSONSchema::compile(&schema.schema)
        .map_err(|e| LlmError::schema(&schema.name, format!("schema does not compile: {e}")))?;

    let violations: Vec<String> = match compiled.validate(&value) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .map(|e| format!("{} (at '{}')", e, e.instance_path))
            .collect(),
    };

    if !violations.is_empty() {
        return Err(LlmError::schema(&schema.name, violations.join("; ")));
    }

    Ok(value)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// First `max_chars` characters of `text`, with an ellipsis when truncated.
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        text.chars().take(max_chars).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
