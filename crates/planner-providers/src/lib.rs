//! # planner-providers
//!
//! Prose provider implementations for Planner.

pub mod openai;
pub mod openrouter;

use planner_core::{config::ProviderConfig, error::PlannerError, traits::Provider};
use std::time::Duration;
use tracing::info;

pub use openai::OpenAiProvider;
pub use openrouter::OpenRouterProvider;

/// Build the configured default provider.
///
/// Returns `Ok(None)` when prose formatting is off (`default = "none"`) or
/// the selected provider has no API key; callers then use plain text.
pub fn from_config(
    cfg: &ProviderConfig,
    timeout: Duration,
) -> Result<Option<Box<dyn Provider>>, PlannerError> {
    match cfg.default.as_str() {
        "openrouter" => match &cfg.openrouter {
            Some(or) if or.enabled && !or.api_key.is_empty() => {
                info!("provider: openrouter model={}", or.model);
                Ok(Some(Box::new(OpenRouterProvider::from_config(
                    or.api_key.clone(),
                    or.model.clone(),
                    timeout,
                )?)))
            }
            _ => {
                info!("provider: openrouter has no API key, formatting with plain text");
                Ok(None)
            }
        },
        "openai" => match &cfg.openai {
            Some(oa) if oa.enabled && !oa.api_key.is_empty() => {
                info!("provider: openai model={} base_url={}", oa.model, oa.base_url);
                Ok(Some(Box::new(OpenAiProvider::from_config(
                    oa.base_url.clone(),
                    oa.api_key.clone(),
                    oa.model.clone(),
                    timeout,
                )?)))
            }
            _ => {
                info!("provider: openai not enabled, formatting with plain text");
                Ok(None)
            }
        },
        "none" | "" => Ok(None),
        other => Err(PlannerError::Config(format!("unknown provider: {other}"))),
    }
}

/// Shared reqwest client with the configured timeout.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, PlannerError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| PlannerError::Provider(format!("failed to build http client: {e}")))
}
