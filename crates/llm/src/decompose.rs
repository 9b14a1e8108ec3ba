//! Prompt decomposition
//!
//! Breaks one large creative prompt into `count` small, independent drawing
//! ideas of the form `"{subject} - {action}"`.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::{CompletionRequest, LlmMessage, LlmRole, LlmService};

#[derive(Error, Debug)]
pub enum DecomposeError {
    #[error("Decomposition upstream error: {0}")]
    Upstream(String),
}

/// Turns one prompt into independent, context-free sub-prompts
#[async_trait::async_trait]
pub trait PromptDecomposer: Send + Sync {
    /// Returns exactly `count` sub-prompts, in order
    async fn decompose(&self, prompt: &str, count: usize) -> Result<Vec<String>, DecomposeError>;
}

#[derive(Debug, Deserialize)]
struct BrokenPrompt {
    prompts: Vec<SubPrompt>,
}

#[derive(Debug, Deserialize)]
struct SubPrompt {
    subject: String,
    action: String,
}

/// Context handed to the model for every decomposition
fn system_prompt(count: usize) -> String {
    format!(
        "You are a teacher at an art school for young children. \
         Students bring you large, complex prompts that are too difficult for them to draw. \
         Break the student's prompt into exactly {count} easy, beginner-friendly drawing prompts.\n\
         Rules:\n\
         1. Each sub-prompt is independent and makes sense to draw without the others.\n\
         2. Each sub-prompt is one very short subject (1-2 words) doing one concise action (1-5 words).\n\
         3. Each sub-prompt is generic and context-free: no other entities, props, locations or \
         relationships, no prepositional phrases (with/at/on/next to/near).\n\
         Reply with JSON only, no prose: \
         {{\"prompts\": [{{\"subject\": \"...\", \"action\": \"...\"}}]}} \
         containing exactly {count} items."
    )
}

/// Pull the first JSON object out of a reply that may carry prose or code fences
fn extract_json(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

/// Parse and check a model reply
pub(crate) fn parse_sub_prompts(content: &str, count: usize) -> Result<Vec<String>, DecomposeError> {
    let json = extract_json(content).ok_or_else(|| {
        DecomposeError::Upstream("model reply carried no structured response".to_string())
    })?;

    let parsed: BrokenPrompt = serde_json::from_str(json)
        .map_err(|e| DecomposeError::Upstream(format!("malformed structured response: {}", e)))?;

    if parsed.prompts.len() != count {
        return Err(DecomposeError::Upstream(format!(
            "expected {} sub-prompts, got {}",
            count,
            parsed.prompts.len()
        )));
    }

    parsed
        .prompts
        .into_iter()
        .map(|p| {
            let subject = p.subject.trim();
            let action = p.action.trim();
            if subject.is_empty() || action.is_empty() {
                return Err(DecomposeError::Upstream(
                    "sub-prompt with blank subject or action".to_string(),
                ));
            }
            Ok(format!("{} - {}", subject, action))
        })
        .collect()
}

/// [`PromptDecomposer`] backed by any [`LlmService`]
pub struct LlmPromptDecomposer {
    llm: Arc<dyn LlmService>,
}

impl LlmPromptDecomposer {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self { llm }
    }
}

#[async_trait::async_trait]
impl PromptDecomposer for LlmPromptDecomposer {
    async fn decompose(&self, prompt: &str, count: usize) -> Result<Vec<String>, DecomposeError> {
        if count == 0 {
            return Err(DecomposeError::Upstream(
                "sub-prompt count must be positive".to_string(),
            ));
        }

        let request = CompletionRequest {
            model: String::new(),
            system_prompt: Some(system_prompt(count)),
            messages: vec![LlmMessage {
                role: LlmRole::User,
                content: prompt.to_string(),
            }],
            max_tokens: None,
        };

        let response = self
            .llm
            .complete(request)
            .await
            .map_err(|e| DecomposeError::Upstream(e.to_string()))?;

        let sub_prompts = parse_sub_prompts(&response.content, count)?;
        tracing::debug!(count = sub_prompts.len(), model = %response.model, "Prompt decomposed");
        Ok(sub_prompts)
    }
}
