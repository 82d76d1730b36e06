//! Scripted in-memory backend for unit tests. Replays queued replies in order and
//! records every request it receives.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChatBackend, ChatCompletion, ChatRequest, LlmError, Usage};

pub const TOKENS_PER_CALL: u64 = 10;

#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<ChatCompletion, LlmError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&self, text: &str) {
        self.replies.lock().unwrap().push_back(Ok(ChatCompletion {
            content: Some(text.to_string()),
            refusal: None,
            usage: Usage {
                prompt_tokens: TOKENS_PER_CALL,
                completion_tokens: TOKENS_PER_CALL,
                total_tokens: 2 * TOKENS_PER_CALL,
            },
        }));
    }

    pub fn push_json(&self, value: serde_json::Value) {
        self.push_text(&value.to_string());
    }

    pub fn push_error(&self, error: LlmError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Transport("scripted backend exhausted".to_string())))
    }
}
