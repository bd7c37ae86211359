use async_trait::async_trait;
use planner_core::{error::PlannerError, message::OutgoingMessage, traits::Channel};
use tracing::{debug, info};

use super::send::{
    digits_only, retry_send, sanitize_for_whatsapp, split_message, text_payload, MAX_TEXT_LEN,
};
use super::WhatsAppChannel;

impl WhatsAppChannel {
    /// Resolve the destination: explicit target, else the configured recipient.
    pub(crate) fn recipient_for(&self, message: &OutgoingMessage) -> Result<String, PlannerError> {
        let raw = message
            .reply_target
            .as_deref()
            .unwrap_or(&self.config.recipient);
        let to = digits_only(raw);
        if to.is_empty() {
            return Err(PlannerError::Channel(
                "whatsapp: no recipient phone number".to_string(),
            ));
        }
        Ok(to)
    }

    async fn send_text(&self, to: &str, text: &str) -> Result<(), PlannerError> {
        if self.config.access_token.trim().is_empty() {
            return Err(PlannerError::Channel("whatsapp: access token is empty".into()));
        }
        if self.config.phone_number_id.trim().is_empty() {
            return Err(PlannerError::Channel("whatsapp: phone_number_id is empty".into()));
        }

        let url = self.messages_url();
        let sanitized = sanitize_for_whatsapp(text);
        let chunks = split_message(&sanitized, MAX_TEXT_LEN);

        for chunk in chunks {
            let body = text_payload(to, chunk);
            let resp = retry_send(&self.client, &url, &self.config.access_token, &body).await?;
            let msg_id = resp
                .pointer("/messages/0/id")
                .and_then(|v| v.as_str())
                .unwrap_or("?");
            debug!("whatsapp: sent chunk id={msg_id}");
        }

        info!("whatsapp: delivered message to {to}");
        Ok(())
    }
}

#[async_trait]
impl Channel for WhatsAppChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), PlannerError> {
        let to = self.recipient_for(&message)?;
        self.send_text(&to, &message.text).await
    }
}
