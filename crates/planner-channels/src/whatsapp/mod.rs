//! WhatsApp Business Cloud API channel.
//!
//! Outbound only: text messages are POSTed to
//! `https://graph.facebook.com/{version}/{phone_number_id}/messages`.

mod channel;
pub(crate) mod send;

#[cfg(test)]
mod tests;

use planner_core::{config::WhatsAppConfig, error::PlannerError};
use std::time::Duration;

const GRAPH_BASE_URL: &str = "https://graph.facebook.com";

/// WhatsApp channel using the Cloud API.
pub struct WhatsAppChannel {
    config: WhatsAppConfig,
    client: reqwest::Client,
    base_url: String,
}

impl WhatsAppChannel {
    /// Create a new WhatsApp channel from config.
    pub fn new(config: WhatsAppConfig, timeout: Duration) -> Result<Self, PlannerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PlannerError::Channel(format!("failed to build http client: {e}")))?;
        Ok(Self {
            config,
            client,
            base_url: GRAPH_BASE_URL.to_string(),
        })
    }

    /// Point the channel at a different Graph API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub(crate) fn messages_url(&self) -> String {
        format!(
            "{}/{}/{}/messages",
            self.base_url.trim_end_matches('/'),
            self.config.api_version,
            self.config.phone_number_id
        )
    }
}
