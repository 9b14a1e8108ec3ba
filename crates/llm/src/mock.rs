//! Mock LLM Service Implementation
//!
//! Used by `LlmServiceFactory` when provider is `"mock"` and by tests:
//! - queued replies are returned in order, then the fallback reply
//! - the default fallback answers decomposition prompts with a valid JSON body
//! - every request is recorded for assertions

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::{CompletionRequest, CompletionResponse, LlmError, LlmService};

/// What the mock replies with
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// Reply with this text
    Text(String),
    /// Fail the request with a response error
    Fail(String),
}

/// Mock LLM service for testing
#[derive(Debug, Clone, Default)]
pub struct MockLlmService {
    queued: Arc<Mutex<VecDeque<MockReply>>>,
    fallback: Arc<Mutex<Option<MockReply>>>,
    history: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockLlmService {
    /// Create a new mock LLM service
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that always answers with `text`
    pub fn with_reply(text: impl Into<String>) -> Self {
        let service = Self::new();
        service.set_fallback(MockReply::Text(text.into()));
        service
    }

    /// Queue a one-shot reply
    pub fn push_reply(&self, reply: MockReply) {
        self.queued.lock().unwrap().push_back(reply);
    }

    /// Reply used once the queue is empty
    pub fn set_fallback(&self, reply: MockReply) {
        *self.fallback.lock().unwrap() = Some(reply);
    }

    /// Recorded requests, oldest first
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.history.lock().unwrap().clone()
    }

    fn next_reply(&self, request: &CompletionRequest) -> MockReply {
        if let Some(reply) = self.queued.lock().unwrap().pop_front() {
            return reply;
        }
        if let Some(reply) = self.fallback.lock().unwrap().clone() {
            return reply;
        }
        MockReply::Text(default_reply(request))
    }
}

/// Deterministic decomposition-shaped reply for the last user message.
///
/// The requested count is read from the system prompt ("exactly N").
fn default_reply(request: &CompletionRequest) -> String {
    let count = request
        .system_prompt
        .as_deref()
        .and_then(|s| s.split("exactly ").nth(1))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|n| n.parse::<usize>().ok())
        .unwrap_or(3);

    let prompts: Vec<serde_json::Value> = (1..=count)
        .map(|i| {
            serde_json::json!({
                "subject": format!("figure {}", i),
                "action": "standing still",
            })
        })
        .collect();

    serde_json::json!({ "prompts": prompts }).to_string()
}

#[async_trait::async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        tracing::info!("Mock LLM service processing completion request");

        let reply = self.next_reply(&request);
        self.history.lock().unwrap().push(request.clone());

        let content = match reply {
            MockReply::Text(text) => text,
            MockReply::Fail(message) => return Err(LlmError::Response(message)),
        };

        let model = if request.model.is_empty() {
            "mock-model".to_string()
        } else {
            request.model
        };
        let input_tokens = request
            .messages
            .iter()
            .map(|m| m.content.len() as i32 / 4)
            .sum::<i32>();
        let output_tokens = content.len() as i32 / 4;

        Ok(CompletionResponse {
            content,
            model,
            input_tokens,
            output_tokens,
            stop_reason: "end_turn".to_string(),
        })
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }
}
