//! OpenAI-compatible API provider.
//!
//! Works with OpenAI's API and any compatible endpoint.
//! Exports `pub(crate)` types reused by the OpenRouter provider.

use async_trait::async_trait;
use planner_core::{
    context::{ApiMessage, Context},
    error::PlannerError,
    message::{MessageMetadata, OutgoingMessage},
    traits::Provider,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::http_client;

/// OpenAI-compatible provider.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    /// Create from config values.
    pub fn from_config(
        base_url: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, PlannerError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url,
            api_key,
            model,
        })
    }
}

/// OpenAI-format messages from the context.
pub(crate) fn build_openai_messages(api_messages: &[ApiMessage]) -> Vec<ChatMessage> {
    api_messages
        .iter()
        .map(|m| ChatMessage {
            role: m.role.clone(),
            content: Some(m.content.clone()),
        })
        .collect()
}

#[derive(Serialize, Deserialize, Clone)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Option<Vec<ChatChoice>>,
}

#[derive(Deserialize)]
pub(crate) struct ChatChoice {
    pub message: Option<ChatMessage>,
}

impl ChatCompletionResponse {
    /// Content of the first choice, if non-blank.
    pub(crate) fn first_text(&self) -> Option<String> {
        self.choices
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.clone())
            .filter(|t| !t.trim().is_empty())
    }
}

/// One non-streaming chat completion against an OpenAI-compatible endpoint.
///
/// An empty completion is an error so callers fall back to plain text.
pub(crate) async fn chat_complete(
    client: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    model: &str,
    context: &Context,
    provider_name: &str,
) -> Result<OutgoingMessage, PlannerError> {
    let body = ChatCompletionRequest {
        model: model.to_string(),
        messages: build_openai_messages(&context.to_api_messages()),
    };

    let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
    debug!("{provider_name}: POST {url} model={model}");

    let resp = client
        .post(&url)
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&body)
        .send()
        .await
        .map_err(|e| PlannerError::Provider(format!("{provider_name} request failed: {e}")))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        return Err(PlannerError::Provider(format!(
            "{provider_name} returned {status}: {text}"
        )));
    }

    let parsed: ChatCompletionResponse = resp.json().await.map_err(|e| {
        PlannerError::Provider(format!("{provider_name}: failed to parse response: {e}"))
    })?;

    let text = parsed
        .first_text()
        .ok_or_else(|| PlannerError::Provider(format!("{provider_name}: empty completion")))?;

    Ok(OutgoingMessage {
        text,
        metadata: MessageMetadata {
            provider_used: provider_name.to_string(),
        },
        reply_target: None,
    })
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, context: &Context) -> Result<OutgoingMessage, PlannerError> {
        chat_complete(
            &self.client,
            &self.base_url,
            &self.api_key,
            &self.model,
            context,
            "openai",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_provider_name() {
        let p = OpenAiProvider::from_config(
            "https://api.openai.com/v1".into(),
            "sk-test".into(),
            "gpt-4o-mini".into(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(p.name(), "openai");
    }

    #[test]
    fn test_build_openai_messages() {
        let messages =
            build_openai_messages(&Context::new("List today's classes").to_api_messages());
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].content.as_deref(), Some("List today's classes"));
    }

    #[test]
    fn test_request_serialization() {
        let body = ChatCompletionRequest {
            model: "m".into(),
            messages: build_openai_messages(&Context::new("Hi").to_api_messages()),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][0]["content"], "Hi");
    }

    #[test]
    fn test_openai_response_parsing() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"Hello!"},"finish_reason":"stop"}],"model":"gpt-4o","usage":{"total_tokens":42,"prompt_tokens":10,"completion_tokens":32}}"#;
        let resp: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.first_text(), Some("Hello!".into()));
    }

    #[test]
    fn test_blank_or_null_content_is_no_text() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let resp: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.first_text(), None);

        let json = r#"{"choices":[{"message":{"role":"assistant","content":"  \n"}}]}"#;
        let resp: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.first_text(), None);

        let resp: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(resp.first_text(), None);
    }
}
