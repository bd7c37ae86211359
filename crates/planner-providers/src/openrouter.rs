//! OpenRouter proxy provider.
//!
//! Reuses OpenAI's request/response types. Only the base URL and provider
//! name differ.

use async_trait::async_trait;
use planner_core::{
    context::Context, error::PlannerError, message::OutgoingMessage, traits::Provider,
};
use std::time::Duration;

use crate::http_client;
use crate::openai::chat_complete;

const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// OpenRouter provider: routes requests to many models via the OpenAI-compatible API.
pub struct OpenRouterProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenRouterProvider {
    /// Create from config values.
    pub fn from_config(
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, PlannerError> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl Provider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, context: &Context) -> Result<OutgoingMessage, PlannerError> {
        chat_complete(
            &self.client,
            OPENROUTER_BASE_URL,
            &self.api_key,
            &self.model,
            context,
            "openrouter",
        )
        .await
    }
}
